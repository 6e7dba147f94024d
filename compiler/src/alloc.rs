use std::collections::HashSet;

/// Method names generated on every message. A field whose Go name matches
/// one of these gets an underscore appended.
pub const METHOD_NAMES: [&str; 8] = [
    "Reset",
    "String",
    "ProtoMessage",
    "Marshal",
    "Unmarshal",
    "ExtensionRangeArray",
    "ExtensionMap",
    "Descriptor",
];

/// Hands out member names for one emitted Go type.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl Default for NameAllocator {
    fn default() -> Self {
        NameAllocator::new()
    }
}

impl NameAllocator {
    pub fn new() -> NameAllocator {
        NameAllocator {
            used: METHOD_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Allocates a batch of names that must stay consistent with each other,
    /// such as a field and its getter. If any of them is taken, every name in
    /// the batch gets an underscore and the whole batch is tried again.
    pub fn allocate<const N: usize>(&mut self, mut batch: [String; N]) -> [String; N] {
        while batch.iter().any(|n| self.used.contains(n)) {
            for n in batch.iter_mut() {
                n.push('_');
            }
        }
        for n in &batch {
            self.used.insert(n.clone());
        }
        batch
    }

    pub fn allocate_one(&mut self, name: String) -> String {
        let [name] = self.allocate([name]);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names_are_taken() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate_one("Descriptor".to_string()), "Descriptor_");
        assert_eq!(names.allocate_one("Name".to_string()), "Name");
    }

    #[test]
    fn batches_rename_together() {
        let mut names = NameAllocator::new();
        let [f, g] = names.allocate(["Foo".to_string(), "GetFoo".to_string()]);
        assert_eq!((f.as_str(), g.as_str()), ("Foo", "GetFoo"));

        // only the getter collides, yet both are renamed
        names.allocate_one("GetBar".to_string());
        let [f, g] = names.allocate(["Bar".to_string(), "GetBar".to_string()]);
        assert_eq!((f.as_str(), g.as_str()), ("Bar_", "GetBar_"));

        // a field called get_foo meets the getter of foo
        let [f, g] = names.allocate(["GetFoo".to_string(), "GetGetFoo".to_string()]);
        assert_eq!((f.as_str(), g.as_str()), ("GetFoo_", "GetGetFoo_"));
    }

    #[test]
    fn allocated_names_are_distinct() {
        let mut names = NameAllocator::new();
        let mut seen = HashSet::new();
        for candidate in ["A", "A", "A_", "A", "String", "String_", "Reset"] {
            let [n, g] = names.allocate([candidate.to_string(), format!("Get{}", candidate)]);
            assert!(seen.insert(n.clone()), "{} handed out twice", n);
            assert!(seen.insert(g.clone()), "{} handed out twice", g);
            assert!(!METHOD_NAMES.contains(&n.as_str()));
        }
    }
}
