use std::collections::HashMap;

use prost_types::{field_descriptor_proto::Type, DescriptorProto, FieldDescriptorProto, FileDescriptorProto};
use tracing::debug;

use crate::error::GeneratorError;
use crate::types::{
    DescriptorSet, EnumDescriptor, EnumId, ExtensionDescriptor, ExtensionId, FileDescriptor, FileId,
    ImportedDescriptor, ImportedId, MessageDescriptor, MessageId, Object,
};

// Field numbers used in SourceCodeInfo paths.
// FileDescriptorProto
pub const PACKAGE_PATH: i32 = 2;
pub const MESSAGE_PATH: i32 = 4;
pub const ENUM_PATH: i32 = 5;
// DescriptorProto
pub const MESSAGE_FIELD_PATH: i32 = 2;
pub const MESSAGE_MESSAGE_PATH: i32 = 3;
pub const MESSAGE_ENUM_PATH: i32 = 4;
pub const MESSAGE_ONEOF_PATH: i32 = 8;
// EnumDescriptorProto
pub const ENUM_VALUE_PATH: i32 = 2;

/// Builds the descriptor arena for every file in the request, in request
/// order. Dependencies and public-import aliases are linked once all files
/// are wrapped.
pub fn wrap_files(protos: Vec<FileDescriptorProto>) -> Result<DescriptorSet, GeneratorError> {
    let mut set = DescriptorSet::default();

    for proto in protos {
        let file = FileId(set.files.len());
        let proto3 = proto.syntax() == "proto3";

        let mut wrapper = Wrapper {
            set: &mut set,
            file,
            package: proto.package(),
            proto3,
        };

        let mut messages = Vec::new();
        for (i, desc) in proto.message_type.iter().enumerate() {
            wrapper.wrap_message(&mut messages, desc, None, i);
        }
        wrapper.build_nested_messages(&messages)?;

        let enums = wrapper.wrap_enums(&proto, &messages);
        wrapper.build_nested_enums(&messages, &enums)?;

        let extensions = proto
            .extension
            .iter()
            .map(|field| wrapper.push_extension(field, None))
            .collect();

        debug!(
            file = proto.name(),
            messages = messages.len(),
            enums = enums.len(),
            "wrapped file"
        );

        let comments = extract_comments(&proto);
        set.by_name.insert(proto.name().to_string(), file);
        set.files.push(FileDescriptor {
            proto,
            dependencies: Vec::new(),
            messages,
            enums,
            extensions,
            imported: Vec::new(),
            comments,
            index: 0,
            proto3,
        });
    }

    for id in set.file_ids().collect::<Vec<_>>() {
        link_dependencies(&mut set, id)?;
    }

    Ok(set)
}

struct Wrapper<'a> {
    set:     &'a mut DescriptorSet,
    file:    FileId,
    package: &'a str,
    proto3:  bool,
}

impl Wrapper<'_> {
    fn wrap_message(
        &mut self,
        out: &mut Vec<MessageId>,
        desc: &DescriptorProto,
        parent: Option<MessageId>,
        index: usize,
    ) {
        let (type_name, path) = match parent {
            None => (
                vec![desc.name().to_string()],
                format!("{},{}", MESSAGE_PATH, index),
            ),
            Some(p) => {
                let pm = self.set.message(p);
                let mut type_name = pm.type_name.clone();
                type_name.push(desc.name().to_string());
                (type_name, format!("{},{},{}", pm.path, MESSAGE_MESSAGE_PATH, index))
            }
        };

        // A group is only recognizable through the parent's field that uses it.
        let group = parent.map_or(false, |p| {
            let expected = self.qualified(&type_name);
            self.set.message(p).proto.field.iter().any(|f| {
                f.r#type == Some(Type::Group as i32) && f.type_name() == expected
            })
        });

        let id = MessageId(self.set.messages.len());
        self.set.messages.push(MessageDescriptor {
            proto: desc.clone(),
            file: self.file,
            parent,
            nested: Vec::new(),
            enums: Vec::new(),
            extensions: Vec::new(),
            type_name,
            index,
            path,
            group,
            proto3: self.proto3,
        });

        let extensions = desc
            .extension
            .iter()
            .map(|field| self.push_extension(field, Some(id)))
            .collect();
        self.set.messages[id.0].extensions = extensions;

        out.push(id);
        for (i, nested) in desc.nested_type.iter().enumerate() {
            self.wrap_message(out, nested, Some(id), i);
        }
    }

    fn qualified(&self, type_name: &[String]) -> String {
        if self.package.is_empty() {
            format!(".{}", type_name.join("."))
        } else {
            format!(".{}.{}", self.package, type_name.join("."))
        }
    }

    /// Rebuilds each message's nested list from the parent links and checks
    /// it against the declared count.
    fn build_nested_messages(&mut self, messages: &[MessageId]) -> Result<(), GeneratorError> {
        for &id in messages {
            let declared = self.set.message(id).proto.nested_type.len();
            if declared == 0 {
                continue;
            }
            let nested: Vec<MessageId> = messages
                .iter()
                .copied()
                .filter(|&m| self.set.message(m).parent == Some(id))
                .collect();
            if nested.len() != declared {
                return Err(GeneratorError::NestingMismatch {
                    message: self.set.message(id).name().to_string(),
                    kind:    "message",
                });
            }
            self.set.messages[id.0].nested = nested;
        }
        Ok(())
    }

    /// Top-level enums first, then the enums of each message in wrapping order.
    fn wrap_enums(&mut self, proto: &FileDescriptorProto, messages: &[MessageId]) -> Vec<EnumId> {
        let mut enums = Vec::new();

        for (i, desc) in proto.enum_type.iter().enumerate() {
            enums.push(self.push_enum(EnumDescriptor {
                proto: desc.clone(),
                file: self.file,
                parent: None,
                type_name: vec![desc.name().to_string()],
                index: i,
                path: format!("{},{}", ENUM_PATH, i),
                proto3: self.proto3,
            }));
        }

        for &id in messages {
            let message = self.set.message(id);
            let decls: Vec<EnumDescriptor> = message
                .proto
                .enum_type
                .iter()
                .enumerate()
                .map(|(i, desc)| {
                    let mut type_name = message.type_name.clone();
                    type_name.push(desc.name().to_string());
                    EnumDescriptor {
                        proto: desc.clone(),
                        file: self.file,
                        parent: Some(id),
                        type_name,
                        index: i,
                        path: format!("{},{},{}", message.path, MESSAGE_ENUM_PATH, i),
                        proto3: self.proto3,
                    }
                })
                .collect();
            for decl in decls {
                enums.push(self.push_enum(decl));
            }
        }

        enums
    }

    fn push_enum(&mut self, desc: EnumDescriptor) -> EnumId {
        let id = EnumId(self.set.enums.len());
        self.set.enums.push(desc);
        id
    }

    fn build_nested_enums(&mut self, messages: &[MessageId], enums: &[EnumId]) -> Result<(), GeneratorError> {
        for &id in messages {
            let declared = self.set.message(id).proto.enum_type.len();
            if declared == 0 {
                continue;
            }
            let nested: Vec<EnumId> = enums
                .iter()
                .copied()
                .filter(|&e| self.set.enumeration(e).parent == Some(id))
                .collect();
            if nested.len() != declared {
                return Err(GeneratorError::NestingMismatch {
                    message: self.set.message(id).name().to_string(),
                    kind:    "enum",
                });
            }
            self.set.messages[id.0].enums = nested;
        }
        Ok(())
    }

    fn push_extension(&mut self, field: &FieldDescriptorProto, parent: Option<MessageId>) -> ExtensionId {
        let mut type_name = match parent {
            Some(p) => self.set.message(p).type_name.clone(),
            None => Vec::new(),
        };
        type_name.push(field.name().to_string());

        let id = ExtensionId(self.set.extensions.len());
        self.set.extensions.push(ExtensionDescriptor {
            field: field.clone(),
            file: self.file,
            parent,
            type_name,
        });
        id
    }
}

fn extract_comments(proto: &FileDescriptorProto) -> HashMap<String, String> {
    let mut comments = HashMap::new();
    let locations = proto.source_code_info.iter().flat_map(|info| info.location.iter());
    for loc in locations {
        if let Some(text) = &loc.leading_comments {
            let path: Vec<String> = loc.path.iter().map(|n| n.to_string()).collect();
            comments.insert(path.join(","), text.clone());
        }
    }
    comments
}

/// Resolves dependency names to ids and wraps the top-level objects of every
/// public dependency as aliases owned by the importing file.
fn link_dependencies(set: &mut DescriptorSet, id: FileId) -> Result<(), GeneratorError> {
    let file = set.file(id);
    let dependencies = file
        .proto
        .dependency
        .iter()
        .map(|name| {
            set.file_by_name(name)
                .ok_or_else(|| GeneratorError::FileNotFound(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut targets = Vec::new();
    for &index in &file.proto.public_dependency {
        let dep = *dependencies.get(index as usize).ok_or_else(|| {
            GeneratorError::Internal(format!(
                "public dependency index {} out of range in {}",
                index,
                file.name()
            ))
        })?;
        let df = set.file(dep);
        for &m in &df.messages {
            if !set.message(m).is_map_entry() {
                targets.push(Object::Message(m));
            }
        }
        targets.extend(df.enums.iter().map(|&e| Object::Enum(e)));
        targets.extend(df.extensions.iter().map(|&x| Object::Extension(x)));
    }

    let mut imported = Vec::with_capacity(targets.len());
    for target in targets {
        imported.push(ImportedId(set.imported.len()));
        set.imported.push(ImportedDescriptor { file: id, target });
    }

    let file = &mut set.files[id.0];
    file.dependencies = dependencies;
    file.imported = imported;
    Ok(())
}
