use std::collections::HashMap;

use tracing::warn;

use crate::error::GeneratorError;
use crate::types::{DescriptorSet, FileId, Object};

/// Maps fully qualified proto type names (`.pkg.Outer.Inner`) to the wrapped
/// message or enum, over every file in the request.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    objects: HashMap<String, Object>,
}

impl TypeTable {
    pub fn build(set: &DescriptorSet) -> TypeTable {
        let mut objects = HashMap::new();
        for file in &set.files {
            // The package may be empty, in which case names look like ".X".
            let mut dotted_pkg = format!(".{}", file.proto.package());
            if dotted_pkg != "." {
                dotted_pkg.push('.');
            }
            for &id in &file.enums {
                let name = format!("{}{}", dotted_pkg, set.enumeration(id).type_name.join("."));
                objects.insert(name, Object::Enum(id));
            }
            for &id in &file.messages {
                let name = format!("{}{}", dotted_pkg, set.message(id).type_name.join("."));
                objects.insert(name, Object::Message(id));
            }
        }
        TypeTable { objects }
    }

    pub fn lookup(&self, type_name: &str) -> Option<Object> {
        self.objects.get(type_name).copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Resolves `type_name` as seen from `current`.
    ///
    /// An object whose file is neither `current` nor one of its direct
    /// dependencies can only have been reached through a public import in a
    /// dependency, so the alias that dependency re-exports is returned in its
    /// place. When no such alias exists the original object is returned and a
    /// warning is logged.
    pub fn resolve(&self, set: &DescriptorSet, type_name: &str, current: FileId) -> Result<Object, GeneratorError> {
        let obj = self
            .lookup(type_name)
            .ok_or_else(|| GeneratorError::UnknownObject(type_name.to_string()))?;

        if is_direct(set, set.file_of(obj), current) {
            return Ok(obj);
        }

        if let Some(alias) = self.alias_of(set, obj, current) {
            return Ok(alias);
        }

        warn!(
            type_name,
            file = set.file(current).name(),
            "failed finding publicly imported dependency"
        );
        Ok(obj)
    }

    /// The alias of `obj` re-exported by one of `current`'s direct
    /// dependencies, if any.
    pub fn alias_of(&self, set: &DescriptorSet, obj: Object, current: FileId) -> Option<Object> {
        for &dep in &set.file(current).dependencies {
            for &alias in &set.file(dep).imported {
                if set.imported(alias).target == obj {
                    return Some(Object::Imported(alias));
                }
            }
        }
        None
    }
}

/// Whether objects owned by `owner` can be named directly from `current`.
pub fn is_direct(set: &DescriptorSet, owner: FileId, current: FileId) -> bool {
    owner == current || set.file(current).dependencies.contains(&owner)
}
