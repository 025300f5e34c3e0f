//! Dynamic value model for inspected object graphs.
//!
//! The graphs this crate inspects are externally owned, duck-typed and
//! possibly cyclic, so objects are reference counted with interior
//! mutability and are identified by allocation address rather than by
//! content.

use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::error::{ProbeError, Result};

/// Shared handle to an object in the inspected graph.
pub type ObjectRef = Arc<Object>;

/// Identity of a graph object, derived from its allocation address.
///
/// Two `ObjectId`s compare equal iff they were taken from clones of the
/// same `ObjectRef`. Valid only while the underlying object is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of(object: &ObjectRef) -> Self {
        Self(Arc::as_ptr(object) as usize)
    }
}

/// A dynamic value stored in an object slot.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Object(ObjectRef),
    Function(Callable),
}

impl Value {
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callable> {
        match self {
            Value::Function(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts a JSON document into a value graph.
    ///
    /// Objects become fresh `Object`s, arrays become objects with index
    /// keys (the host convention for indexed collections). Useful for
    /// building fixtures and config-driven graphs; cannot express cycles
    /// or functions.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                let object = Object::new();
                for (index, item) in items.iter().enumerate() {
                    object.insert(index.to_string(), Value::from_json(item));
                }
                Value::Object(object)
            }
            serde_json::Value::Object(map) => {
                let object = Object::new();
                for (key, item) in map {
                    object.insert(key.clone(), Value::from_json(item));
                }
                Value::Object(object)
            }
        }
    }
}

impl PartialEq for Value {
    /// Scalar equality; objects compare by identity, functions never
    /// compare equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s),
            // Shallow on purpose: the graph may be cyclic.
            Value::Object(o) => write!(f, "Object({:p})", Arc::as_ptr(o)),
            Value::Function(c) => write!(
                f,
                "Function({})",
                if c.is_instrumented() { "instrumented" } else { "plain" }
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl From<Callable> for Value {
    fn from(callable: Callable) -> Self {
        Value::Function(callable)
    }
}

enum Slot {
    Value(Value),
    /// Reading this slot raises a security-class access error on the host.
    Denied,
}

/// A bag of named property slots with interior mutability.
///
/// Slots keep insertion order, which makes traversal order over an
/// object's values deterministic. A slot may hold a clone of an
/// ancestor's `Arc`, so graphs built from objects can be cyclic.
pub struct Object {
    slots: RwLock<Vec<(String, Slot)>>,
}

impl Object {
    pub fn new() -> ObjectRef {
        Arc::new(Self {
            slots: RwLock::new(Vec::new()),
        })
    }

    /// Sets a property, replacing an existing slot in place.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut slots = self.slots.write();
        match slots.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = Slot::Value(value),
            None => slots.push((key, Slot::Value(value))),
        }
    }

    /// Marks a property as access-denied: reads report
    /// [`ProbeError::AccessDenied`] instead of a value.
    pub fn deny(&self, key: impl Into<String>) {
        let key = key.into();
        let mut slots = self.slots.write();
        match slots.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = Slot::Denied,
            None => slots.push((key, Slot::Denied)),
        }
    }

    /// Reads a property. Denied slots surface the access error.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let slots = self.slots.read();
        match slots.iter().find(|(name, _)| name == key) {
            Some((_, Slot::Value(value))) => Ok(Some(value.clone())),
            Some((_, Slot::Denied)) => Err(ProbeError::AccessDenied(key.to_string())),
            None => Ok(None),
        }
    }

    /// Reads a property, treating denied slots as absent.
    ///
    /// This is the access mode the search engine uses everywhere: the
    /// inspected graph is best-effort and a guarded property is simply
    /// not a candidate.
    pub fn probe(&self, key: &str) -> Option<Value> {
        self.get(key).ok().flatten()
    }

    pub fn keys(&self) -> Vec<String> {
        self.slots
            .read()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Readable (non-denied) properties in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.slots
            .read()
            .iter()
            .filter_map(|(name, slot)| match slot {
                Slot::Value(value) => Some((name.clone(), value.clone())),
                Slot::Denied => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("addr", &format_args!("{:p}", self))
            .field("keys", &self.keys())
            .finish()
    }
}

/// Outcome of invoking a [`Callable`].
pub enum CallOutcome {
    /// The call returned synchronously.
    Ready(Value),
    /// The call returned an awaitable; the value (or failure) arrives
    /// when the future resolves.
    Deferred(BoxFuture<'static, Result<Value>>),
}

impl fmt::Debug for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutcome::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            CallOutcome::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}

type NativeFn = Arc<dyn Fn(&[Value]) -> CallOutcome + Send + Sync>;

/// A function value stored in an object slot.
///
/// Carries the "already instrumented" marker used by the one-shot
/// instrumentation guard: a wrapper produced by instrumentation is
/// flagged so it is never wrapped a second time, even through a
/// different code path.
#[derive(Clone)]
pub struct Callable {
    func: NativeFn,
    instrumented: bool,
}

impl Callable {
    pub fn new(func: impl Fn(&[Value]) -> CallOutcome + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
            instrumented: false,
        }
    }

    /// Builds a callable carrying the instrumentation marker. Intended
    /// for instrumentation wrappers only.
    pub fn instrumented(func: impl Fn(&[Value]) -> CallOutcome + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
            instrumented: true,
        }
    }

    /// Convenience constructor for a callable that returns a fixed value.
    pub fn returning(value: Value) -> Self {
        Self::new(move |_| CallOutcome::Ready(value.clone()))
    }

    pub fn invoke(&self, args: &[Value]) -> CallOutcome {
        (self.func)(args)
    }

    pub fn is_instrumented(&self) -> bool {
        self.instrumented
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Callable({})",
            if self.instrumented { "instrumented" } else { "plain" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_replaces_in_place_and_keeps_order() {
        let object = Object::new();
        object.insert("a", 1i64);
        object.insert("b", 2i64);
        object.insert("a", 3i64);

        assert_eq!(object.keys(), vec!["a", "b"]);
        assert_eq!(object.probe("a"), Some(Value::Number(3.0)));
    }

    #[test]
    fn denied_slot_reports_access_error_but_probes_as_absent() {
        let object = Object::new();
        object.insert("open", true);
        object.deny("guarded");

        assert!(matches!(
            object.get("guarded"),
            Err(ProbeError::AccessDenied(_))
        ));
        assert_eq!(object.probe("guarded"), None);
        assert_eq!(object.probe("open"), Some(Value::Bool(true)));
    }

    #[test]
    fn identity_tracks_the_allocation_not_the_content() {
        let a = Object::new();
        let b = Object::new();
        a.insert("x", 1i64);
        b.insert("x", 1i64);

        assert_eq!(ObjectId::of(&a), ObjectId::of(&a.clone()));
        assert_ne!(ObjectId::of(&a), ObjectId::of(&b));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn from_json_builds_nested_graphs() {
        let value = Value::from_json(&json!({
            "userInfo": { "id": 1 },
            "tags": ["a", "b"],
            "active": true,
        }));

        let root = value.as_object().expect("object root");
        let user = root.probe("userInfo").and_then(|v| v.as_object().cloned());
        assert_eq!(
            user.expect("userInfo").probe("id"),
            Some(Value::Number(1.0))
        );
        let tags = root
            .probe("tags")
            .and_then(|v| v.as_object().cloned())
            .expect("tags");
        assert_eq!(tags.probe("0"), Some(Value::Str("a".into())));
        assert_eq!(tags.probe("1"), Some(Value::Str("b".into())));
    }

    #[test]
    fn cyclic_objects_are_expressible() {
        let root = Object::new();
        let child = Object::new();
        child.insert("parent", root.clone());
        root.insert("child", child.clone());

        let back = child
            .probe("parent")
            .and_then(|v| v.as_object().cloned())
            .expect("parent edge");
        assert!(Arc::ptr_eq(&back, &root));
        // Debug must not recurse into the cycle.
        let _ = format!("{:?}", root);
    }

    #[test]
    fn callable_invocation_and_marker() {
        let plain = Callable::returning(Value::Number(7.0));
        match plain.invoke(&[]) {
            CallOutcome::Ready(Value::Number(n)) => assert_eq!(n, 7.0),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!plain.is_instrumented());
        assert!(Callable::instrumented(|_| CallOutcome::Ready(Value::Null)).is_instrumented());
    }
}
