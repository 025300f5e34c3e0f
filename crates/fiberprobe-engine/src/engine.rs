//! The graph search engine: root resolution, depth-bounded cycle-safe
//! node traversal and the secondary deep value-graph search.
//!
//! Nothing here propagates errors to the caller. The inspected graph is
//! a best-effort view of third-party page internals that change shape
//! frequently, so every failure degrades to an empty result plus a log
//! line.

use std::collections::HashSet;
use std::sync::Arc;

use fiberprobe_core::{
    EngineOptions, ObjectId, ObjectRef, ProbeError, Result, SearchConfig, SearchResult, Value,
};
use tracing::{debug, error, warn};

use crate::host::RootResolver;
use crate::matcher::matches_any;
use crate::registry::PatchRegistry;

pub struct SearchEngine {
    resolver: Arc<dyn RootResolver>,
    registry: Arc<PatchRegistry>,
    options: EngineOptions,
}

impl SearchEngine {
    pub fn new(resolver: Arc<dyn RootResolver>, registry: Arc<PatchRegistry>) -> Self {
        Self {
            resolver,
            registry,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<PatchRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Runs one search over the graph behind `config.root_selector`.
    ///
    /// Results arrive in stack-pop order, first matching criterion index
    /// per candidate. The `on_result` callback, when present, is invoked
    /// exactly once with the full result set before it is returned.
    pub fn search(&self, config: &SearchConfig) -> Vec<SearchResult> {
        let mut results = Vec::new();

        if config.criteria.is_empty() {
            error!("{}", ProbeError::ConfigMissing);
            return results;
        }

        let root = match self.resolve_entry_point(config) {
            Ok(root) => root,
            Err(err) => {
                warn!("search skipped: {}", err);
                return results;
            }
        };

        self.traverse(&root, config, &mut results);
        debug!(matches = results.len(), "traversal finished");

        if let Some(callback) = &config.on_result {
            callback(&results);
        }
        results
    }

    /// Finds the root element and follows the dynamically-named entry
    /// property into the framework-internal graph.
    fn resolve_entry_point(&self, config: &SearchConfig) -> Result<ObjectRef> {
        let root_element = self
            .resolver
            .resolve(&config.root_selector)
            .ok_or_else(|| ProbeError::RootNotFound(config.root_selector.clone()))?;

        let entry_key = root_element
            .keys()
            .into_iter()
            .find(|key| {
                self.options
                    .entry_prefixes
                    .iter()
                    .any(|prefix| key.starts_with(prefix.as_str()))
            })
            .ok_or(ProbeError::EntryPointNotFound)?;

        match root_element.probe(&entry_key) {
            Some(Value::Object(node)) => Ok(node),
            _ => Err(ProbeError::EntryPointNotFound),
        }
    }

    fn traverse(&self, root: &ObjectRef, config: &SearchConfig, results: &mut Vec<SearchResult>) {
        // Explicit stack: the graph may be arbitrarily deep and cyclic.
        let mut stack: Vec<(ObjectRef, usize)> = vec![(root.clone(), 0)];
        let mut visited: HashSet<ObjectId> = HashSet::new();

        while let Some((node, depth)) = stack.pop() {
            // Once popped, never re-pushed, whatever the skip reason.
            if !visited.insert(ObjectId::of(&node)) {
                continue;
            }
            if depth > config.max_depth {
                continue;
            }
            if self.is_patched(&node) {
                debug!("skipping already instrumented node");
                continue;
            }

            for path in &config.search_paths {
                let Some(Value::Object(candidate)) = node.probe(path) else {
                    continue;
                };
                if let Some(index) = matches_any(&candidate, &config.criteria) {
                    results.push(SearchResult {
                        matched: candidate.clone(),
                        source: node.clone(),
                        criterion_index: index,
                    });
                    if config.stop_after_first {
                        return;
                    }
                }
                if config.deep_paths.iter().any(|deep| deep == path) {
                    self.search_value_graph(&candidate, &node, config, results);
                }
            }

            if let Some(Value::Object(child)) = node.probe(&self.options.child_key) {
                stack.push((child, depth + 1));
            }
            if let Some(Value::Object(sibling)) = node.probe(&self.options.sibling_key) {
                stack.push((sibling, depth));
            }
        }
    }

    /// A node already instrumented (directly or through its state
    /// holder) is not re-processed.
    fn is_patched(&self, node: &ObjectRef) -> bool {
        if self.registry.contains(node) {
            return true;
        }
        match node.probe(&self.options.state_holder_key) {
            Some(Value::Object(holder)) => self.registry.contains(&holder),
            _ => false,
        }
    }

    /// Unbounded sub-search over the value graph reachable from `start`.
    ///
    /// Independent of the node traversal: its own visited set, no depth
    /// bound, every reachable object is a candidate, and all hits are
    /// recorded against the originating node. `stop_after_first` stops
    /// only this sub-traversal.
    fn search_value_graph(
        &self,
        start: &ObjectRef,
        source: &ObjectRef,
        config: &SearchConfig,
        results: &mut Vec<SearchResult>,
    ) {
        let mut stack: Vec<ObjectRef> = vec![start.clone()];
        let mut visited: HashSet<ObjectId> = HashSet::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(ObjectId::of(&current)) {
                continue;
            }

            if let Some(index) = matches_any(&current, &config.criteria) {
                results.push(SearchResult {
                    matched: current.clone(),
                    source: source.clone(),
                    criterion_index: index,
                });
                if config.stop_after_first {
                    return;
                }
            }

            for (_, value) in current.entries() {
                if let Value::Object(nested) = value {
                    if !visited.contains(&ObjectId::of(&nested)) {
                        stack.push(nested);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PageHost;
    use fiberprobe_core::{Criterion, Object};

    fn engine_with(selector: &str, root_element: ObjectRef) -> SearchEngine {
        let host = PageHost::new();
        host.register(selector, root_element);
        SearchEngine::new(Arc::new(host), Arc::new(PatchRegistry::new()))
    }

    /// Root element whose `__react...` entry property points at `node`.
    fn page_root(node: &ObjectRef) -> ObjectRef {
        let element = Object::new();
        element.insert("id", "app");
        element.insert("__reactFiber$abc123", node.clone());
        element
    }

    fn user_info_config(selector: &str) -> SearchConfig {
        SearchConfig {
            criteria: vec![Criterion::new().present("userInfo")],
            search_paths: vec!["memoizedState".to_string()],
            deep_paths: Vec::new(),
            root_selector: selector.to_string(),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn missing_root_yields_empty_results() {
        let engine = engine_with("#app", page_root(&Object::new()));
        let results = engine.search(&user_info_config("#not-there"));
        assert!(results.is_empty());
    }

    #[test]
    fn missing_entry_point_yields_empty_results() {
        let element = Object::new();
        element.insert("id", "plain");
        let engine = engine_with("#app", element);
        let results = engine.search(&user_info_config("#app"));
        assert!(results.is_empty());
    }

    #[test]
    fn empty_criteria_yield_empty_results() {
        let node = Object::new();
        let engine = engine_with("#app", page_root(&node));
        let mut config = user_info_config("#app");
        config.criteria.clear();
        assert!(engine.search(&config).is_empty());
    }

    #[test]
    fn sibling_edges_are_traversed_at_the_same_depth() {
        let wanted = Object::new();
        wanted.insert("userInfo", Object::new());

        let sibling = Object::new();
        sibling.insert("memoizedState", wanted);

        let first = Object::new();
        first.insert("sibling", sibling);

        let engine = engine_with("#app", page_root(&first));
        let results = engine.search(&user_info_config("#app"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].criterion_index, 0);
    }

    #[test]
    fn instrumented_nodes_are_skipped_via_their_state_holder() {
        let holder = Object::new();
        let state = Object::new();
        state.insert("userInfo", Object::new());

        let node = Object::new();
        node.insert("stateNode", holder.clone());
        node.insert("memoizedState", state);

        let engine = engine_with("#app", page_root(&node));
        engine.registry().mark(&holder);

        let results = engine.search(&user_info_config("#app"));
        assert!(results.is_empty());
    }

    #[test]
    fn denied_search_path_is_treated_as_absent() {
        let child_state = Object::new();
        child_state.insert("userInfo", Object::new());
        let child = Object::new();
        child.insert("memoizedState", child_state);

        let node = Object::new();
        node.deny("memoizedState");
        node.insert("child", child);

        let engine = engine_with("#app", page_root(&node));
        let results = engine.search(&user_info_config("#app"));
        // The guarded node contributes nothing but traversal continues.
        assert_eq!(results.len(), 1);
    }
}
