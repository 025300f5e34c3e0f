//! Node inspection helpers: event-handler collection, labelled-group
//! detection and refresh-handle lookup over the parent chain.

use std::collections::{HashMap, HashSet};

use fiberprobe_core::{Callable, CriteriaGroup, EngineOptions, ObjectId, ObjectRef, Value};

use crate::matcher::matches_criterion;

/// Summary of a single inspected node.
#[derive(Debug)]
pub struct NodeReport {
    /// Handler callables by prop name, ancestors overriding descendants.
    pub handlers: HashMap<String, Callable>,
    /// Labels of the criteria groups the node's props satisfy.
    pub labels: Vec<String>,
}

impl NodeReport {
    pub fn is_special(&self) -> bool {
        !self.labels.is_empty()
    }
}

/// Inspects a node: collects its event handlers and the labels of any
/// matching criteria groups.
pub fn inspect_node(
    node: &ObjectRef,
    props_key: &str,
    groups: &[CriteriaGroup],
    options: &EngineOptions,
) -> NodeReport {
    let labels = match node.probe(props_key) {
        Some(Value::Object(props)) => detect_groups(&props, groups),
        _ => Vec::new(),
    };
    NodeReport {
        handlers: collect_handlers(node, props_key, options),
        labels,
    }
}

/// Collects `on*`-named function props from the node and every ancestor
/// reachable over the parent edge. Ancestor handlers override ones
/// collected lower in the chain.
pub fn collect_handlers(
    node: &ObjectRef,
    props_key: &str,
    options: &EngineOptions,
) -> HashMap<String, Callable> {
    let mut handlers = HashMap::new();
    let mut visited: HashSet<ObjectId> = HashSet::new();
    let mut current = Some(node.clone());

    while let Some(node) = current {
        if !visited.insert(ObjectId::of(&node)) {
            break;
        }
        if let Some(Value::Object(props)) = node.probe(props_key) {
            for (name, value) in props.entries() {
                if !name.starts_with("on") {
                    continue;
                }
                if let Value::Function(callable) = value {
                    handlers.insert(name, callable);
                }
            }
        }
        current = node
            .probe(&options.parent_key)
            .and_then(|value| value.as_object().cloned());
    }
    handlers
}

/// Labels of the groups with at least one criterion the props satisfy.
pub fn detect_groups(props: &ObjectRef, groups: &[CriteriaGroup]) -> Vec<String> {
    groups
        .iter()
        .filter(|group| {
            group
                .criteria
                .iter()
                .any(|criterion| matches_criterion(props, criterion))
        })
        .map(|group| group.label.clone())
        .collect()
}

/// Walks the parent chain for the first node whose state holder exposes
/// the configured refresh method.
pub fn find_refresh_handle(node: &ObjectRef, options: &EngineOptions) -> Option<Callable> {
    let mut visited: HashSet<ObjectId> = HashSet::new();
    let mut current = Some(node.clone());

    while let Some(node) = current {
        if !visited.insert(ObjectId::of(&node)) {
            break;
        }
        if let Some(Value::Object(holder)) = node.probe(&options.state_holder_key) {
            if let Some(Value::Function(callable)) = holder.probe(&options.refresh_method) {
                return Some(callable);
            }
        }
        current = node
            .probe(&options.parent_key)
            .and_then(|value| value.as_object().cloned());
    }
    None
}

/// Invokes the nearest refresh handle, if any. Returns whether one was
/// found.
pub fn request_refresh(node: &ObjectRef, options: &EngineOptions) -> bool {
    match find_refresh_handle(node, options) {
        Some(callable) => {
            let _ = callable.invoke(&[]);
            true
        }
        None => false,
    }
}
