use dashmap::DashSet;
use fiberprobe_core::{ObjectId, ObjectRef};

/// Identity-keyed record of objects that have already been instrumented.
///
/// An explicit dependency rather than a process global: the registry
/// lives exactly as long as the `Arc` its owners hold, and is shared
/// between instrumentation sites and the search engine's skip check.
/// Identities are allocation addresses, so entries are only meaningful
/// while the inspected graph is alive.
#[derive(Debug, Default)]
pub struct PatchRegistry {
    patched: DashSet<ObjectId>,
}

impl PatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the object; returns false if it was already present.
    pub fn mark(&self, object: &ObjectRef) -> bool {
        self.patched.insert(ObjectId::of(object))
    }

    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.patched.contains(&ObjectId::of(object))
    }

    pub fn len(&self) -> usize {
        self.patched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patched.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiberprobe_core::Object;

    #[test]
    fn marking_is_idempotent_per_identity() {
        let registry = PatchRegistry::new();
        let object = Object::new();

        assert!(registry.mark(&object));
        assert!(!registry.mark(&object.clone()));
        assert!(registry.contains(&object));
        assert_eq!(registry.len(), 1);

        let other = Object::new();
        assert!(!registry.contains(&other));
    }
}
