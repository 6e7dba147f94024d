//! The wrapped descriptor graph.
//!
//! Every message, enum, extension and public-import alias lives in one arena
//! (`DescriptorSet`) and is addressed by a typed index. Parent/child links are
//! indices too, so walking up to the enclosing type never borrows the child.

use std::collections::HashMap;

use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::naming::{base_name, camel_case, camel_case_slice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportedId(pub usize);

/// Anything a type reference can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Object {
    Message(MessageId),
    Enum(EnumId),
    Extension(ExtensionId),
    Imported(ImportedId),
}

#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub proto:        FileDescriptorProto,
    /// Parallel to `proto.dependency`.
    pub dependencies: Vec<FileId>,
    /// Every message in the file, nested ones included, depth first.
    pub messages:     Vec<MessageId>,
    /// Top-level enums first, then nested ones in message order.
    pub enums:        Vec<EnumId>,
    /// Top-level extensions only.
    pub extensions:   Vec<ExtensionId>,
    /// Objects re-exported through `import public`.
    pub imported:     Vec<ImportedId>,
    /// Leading comments keyed by comma separated source path.
    pub comments:     HashMap<String, String>,
    /// Position among the files being generated; 0 for everything else.
    pub index:        usize,
    pub proto3:       bool,
}

impl FileDescriptor {
    pub fn name(&self) -> &str {
        self.proto.name()
    }

    /// Name of the variable holding this file's compressed descriptor.
    pub fn var_name(&self) -> String {
        format!("fileDescriptor{}", self.index)
    }

    /// Interprets the `go_package` option as `(import path, package name)`.
    /// - `name` gives no import path.
    /// - `a/b/name` implies the import path `a/b/name`.
    /// - `a/b/c;name` overrides the name after the semicolon.
    pub fn go_package_option(&self) -> Option<(Option<&str>, &str)> {
        let pkg = self.proto.options.as_ref()?.go_package.as_deref()?;
        if pkg.is_empty() {
            return None;
        }
        let slash = match pkg.rfind('/') {
            Some(i) => i,
            None => return Some((None, pkg)),
        };
        match pkg.find(';') {
            Some(sc) => Some((Some(&pkg[..sc]), &pkg[sc + 1..])),
            None => Some((Some(pkg), &pkg[slash + 1..])),
        }
    }

    /// The Go package this file asks for, and whether it asked explicitly.
    pub fn go_package_name(&self) -> (String, bool) {
        if let Some((_, pkg)) = self.go_package_option() {
            return (pkg.to_string(), true);
        }
        if !self.proto.package().is_empty() {
            return (self.proto.package().to_string(), false);
        }
        (base_name(self.name()).to_string(), false)
    }

    /// Output file name, relocated under the `go_package` import path when
    /// one is declared.
    pub fn go_file_name(&self) -> String {
        let mut name = self.name().to_string();
        for ext in [".proto", ".protodevel"] {
            if let Some(stem) = name.strip_suffix(ext) {
                name = stem.to_string();
                break;
            }
        }
        name.push_str(".pb.go");

        if let Some((Some(import_path), _)) = self.go_package_option() {
            if !import_path.is_empty() {
                let file = match name.rfind('/') {
                    Some(i) => &name[i + 1..],
                    None => name.as_str(),
                };
                return format!("{}/{}", import_path.trim_end_matches('/'), file);
            }
        }
        name
    }

    pub fn is_weak_dependency(&self, index: usize) -> bool {
        self.proto.weak_dependency.iter().any(|&i| i as usize == index)
    }

    pub fn is_public_dependency(&self, index: usize) -> bool {
        self.proto.public_dependency.iter().any(|&i| i as usize == index)
    }
}

#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    pub proto:      DescriptorProto,
    pub file:       FileId,
    pub parent:     Option<MessageId>,
    pub nested:     Vec<MessageId>,
    pub enums:      Vec<EnumId>,
    pub extensions: Vec<ExtensionId>,
    /// Scope chain from the outermost message down to this one.
    pub type_name:  Vec<String>,
    /// Index within the containing file or message.
    pub index:      usize,
    /// Source location path, e.g. `4,0,3,1`.
    pub path:       String,
    /// True when the parent declares a group field of this type.
    pub group:      bool,
    pub proto3:     bool,
}

impl MessageDescriptor {
    pub fn name(&self) -> &str {
        self.proto.name()
    }

    pub fn is_map_entry(&self) -> bool {
        self.proto.options.as_ref().map_or(false, |o| o.map_entry())
    }

    pub fn is_message_set(&self) -> bool {
        self.proto
            .options
            .as_ref()
            .map_or(false, |o| o.message_set_wire_format())
    }
}

#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub proto:     EnumDescriptorProto,
    pub file:      FileId,
    pub parent:    Option<MessageId>,
    pub type_name: Vec<String>,
    pub index:     usize,
    pub path:      String,
    pub proto3:    bool,
}

impl EnumDescriptor {
    pub fn name(&self) -> &str {
        self.proto.name()
    }

    /// Prefix for the value constants. Top-level enums use their own name,
    /// nested ones the name of the enclosing message chain.
    pub fn prefix(&self) -> String {
        match self.parent {
            None => format!("{}_", camel_case(self.name())),
            Some(_) => {
                let scope = &self.type_name[..self.type_name.len() - 1];
                format!("{}_", camel_case_slice(scope))
            }
        }
    }

    /// The number of the declared value called `name`, as Go source text.
    pub fn integer_value_as_string(&self, name: &str) -> Option<String> {
        self.proto
            .value
            .iter()
            .find(|v| v.name() == name)
            .map(|v| v.number().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ExtensionDescriptor {
    pub field:     FieldDescriptorProto,
    pub file:      FileId,
    pub parent:    Option<MessageId>,
    pub type_name: Vec<String>,
}

impl ExtensionDescriptor {
    /// `E_` followed by every scope segment camel cased and joined with `_`.
    pub fn desc_name(&self) -> String {
        let parts: Vec<String> = self.type_name.iter().map(|s| camel_case(s)).collect();
        format!("E_{}", parts.join("_"))
    }
}

/// An object owned by another file, re-exported by `file`.
#[derive(Debug, Clone)]
pub struct ImportedDescriptor {
    pub file:   FileId,
    pub target: Object,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    pub files:      Vec<FileDescriptor>,
    pub messages:   Vec<MessageDescriptor>,
    pub enums:      Vec<EnumDescriptor>,
    pub extensions: Vec<ExtensionDescriptor>,
    pub imported:   Vec<ImportedDescriptor>,
    pub by_name:    HashMap<String, FileId>,
}

impl DescriptorSet {
    pub fn file(&self, id: FileId) -> &FileDescriptor {
        &self.files[id.0]
    }

    pub fn message(&self, id: MessageId) -> &MessageDescriptor {
        &self.messages[id.0]
    }

    pub fn enumeration(&self, id: EnumId) -> &EnumDescriptor {
        &self.enums[id.0]
    }

    pub fn extension(&self, id: ExtensionId) -> &ExtensionDescriptor {
        &self.extensions[id.0]
    }

    pub fn imported(&self, id: ImportedId) -> &ImportedDescriptor {
        &self.imported[id.0]
    }

    pub fn file_by_name(&self, name: &str) -> Option<FileId> {
        self.by_name.get(name).copied()
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> {
        (0..self.files.len()).map(FileId)
    }

    /// The file an object is emitted into. For an alias that is the
    /// importing file, not the file declaring the target.
    pub fn file_of(&self, obj: Object) -> FileId {
        match obj {
            Object::Message(id) => self.message(id).file,
            Object::Enum(id) => self.enumeration(id).file,
            Object::Extension(id) => self.extension(id).file,
            Object::Imported(id) => self.imported(id).file,
        }
    }

    /// Scope-qualified name without the proto package.
    pub fn type_name(&self, obj: Object) -> &[String] {
        match obj {
            Object::Message(id) => &self.message(id).type_name,
            Object::Enum(id) => &self.enumeration(id).type_name,
            Object::Extension(id) => &self.extension(id).type_name,
            Object::Imported(id) => self.type_name(self.imported(id).target),
        }
    }

    /// Strips one level of public-import indirection.
    pub fn underlying(&self, obj: Object) -> Object {
        match obj {
            Object::Imported(id) => self.imported(id).target,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::FileOptions;

    fn file(name: &str, package: Option<&str>, go_package: Option<&str>) -> FileDescriptor {
        FileDescriptor {
            proto: FileDescriptorProto {
                name: Some(name.to_string()),
                package: package.map(str::to_string),
                options: go_package.map(|g| FileOptions {
                    go_package: Some(g.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            dependencies: vec![],
            messages: vec![],
            enums: vec![],
            extensions: vec![],
            imported: vec![],
            comments: HashMap::new(),
            index: 0,
            proto3: false,
        }
    }

    #[test]
    fn go_package_forms() {
        assert_eq!(file("a.proto", None, None).go_package_option(), None);
        assert_eq!(file("a.proto", None, Some("foo")).go_package_option(), Some((None, "foo")));
        assert_eq!(
            file("a.proto", None, Some("example.com/x/foo")).go_package_option(),
            Some((Some("example.com/x/foo"), "foo"))
        );
        assert_eq!(
            file("a.proto", None, Some("example.com/x/y;foo")).go_package_option(),
            Some((Some("example.com/x/y"), "foo"))
        );
    }

    #[test]
    fn package_name_fallbacks() {
        assert_eq!(file("a/b.proto", Some("pkg.v1"), Some("gp")).go_package_name(), ("gp".to_string(), true));
        assert_eq!(file("a/b.proto", Some("pkg.v1"), None).go_package_name(), ("pkg.v1".to_string(), false));
        assert_eq!(file("a/b.proto", None, None).go_package_name(), ("b".to_string(), false));
    }

    #[test]
    fn output_file_names() {
        assert_eq!(file("a/b.proto", None, None).go_file_name(), "a/b.pb.go");
        assert_eq!(file("a/b.protodevel", None, None).go_file_name(), "a/b.pb.go");
        assert_eq!(file("b.txt", None, None).go_file_name(), "b.txt.pb.go");
        assert_eq!(
            file("a/b.proto", None, Some("example.com/x;foo")).go_file_name(),
            "example.com/x/b.pb.go"
        );
        assert_eq!(file("a/b.proto", None, Some("foo")).go_file_name(), "a/b.pb.go");
    }
}
