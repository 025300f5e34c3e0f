use dashmap::DashMap;
use fiberprobe_core::ObjectRef;

/// Resolves a selector to the root element of a host page.
///
/// The host page owns element lookup; the engine only consumes this
/// seam. An unresolvable selector is a normal condition, not an error.
pub trait RootResolver: Send + Sync {
    fn resolve(&self, selector: &str) -> Option<ObjectRef>;
}

/// In-memory selector registry standing in for the host page's element
/// lookup.
#[derive(Debug, Default)]
pub struct PageHost {
    roots: DashMap<String, ObjectRef>,
}

impl PageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, selector: impl Into<String>, root: ObjectRef) {
        self.roots.insert(selector.into(), root);
    }

    pub fn remove(&self, selector: &str) -> Option<ObjectRef> {
        self.roots.remove(selector).map(|(_, root)| root)
    }
}

impl RootResolver for PageHost {
    fn resolve(&self, selector: &str) -> Option<ObjectRef> {
        self.roots.get(selector).map(|entry| entry.value().clone())
    }
}
