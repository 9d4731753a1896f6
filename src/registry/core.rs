use std::collections::BTreeSet;

/// Event types a portal tunnels from its relocated root.
///
/// Insert-only: once a type is handled it stays handled for the life of the
/// portal, and re-renders keep using the listener registered for it.
#[derive(Debug, Default, Clone)]
pub struct HandledEventRegistry {
    types: BTreeSet<String>,
}

impl HandledEventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `event_type` was not handled before.
    pub fn insert(&mut self, event_type: &str) -> bool {
        if self.types.contains(event_type) {
            return false;
        }
        self.types.insert(event_type.to_string())
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.types.contains(event_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_only_new_types() {
        let mut registry = HandledEventRegistry::new();
        assert!(registry.insert("saved"));
        assert!(!registry.insert("saved"));
        assert!(registry.insert("closed"));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("saved"));
    }

    #[test]
    fn iteration_is_sorted() {
        let mut registry = HandledEventRegistry::new();
        registry.insert("b");
        registry.insert("a");
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
