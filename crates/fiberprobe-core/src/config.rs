use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::criteria::Criterion;
use crate::presets;
use crate::types::SearchResult;

/// Callback invoked exactly once with the full result set of a search.
pub type ResultCallback = Arc<dyn Fn(&[SearchResult]) + Send + Sync>;

/// Configuration for a single search over an inspected graph.
///
/// Immutable for the duration of a `search` call. `deep_paths` names the
/// subset of `search_paths` whose values additionally get the unbounded
/// value-graph sub-search; the two traversal tiers are deliberately
/// separate knobs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Ordered criteria; the reported index is the first that matches.
    pub criteria: Vec<Criterion>,
    /// Maximum node-traversal depth from the root (depth 0).
    pub max_depth: usize,
    /// Stop the whole traversal at the first match.
    pub stop_after_first: bool,
    /// Node properties inspected for candidate objects.
    pub search_paths: Vec<String>,
    /// Search paths whose values also get the deep value-graph search.
    pub deep_paths: Vec<String>,
    /// Locator for the root element on the host page.
    pub root_selector: String,
    /// Invoked once with the results after the traversal finishes.
    #[serde(skip)]
    pub on_result: Option<ResultCallback>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            criteria: Vec::new(),
            max_depth: 50,
            stop_after_first: true,
            search_paths: presets::default_search_paths(),
            deep_paths: presets::default_search_paths(),
            root_selector: String::new(),
            on_result: None,
        }
    }
}

impl SearchConfig {
    pub fn for_selector(selector: impl Into<String>) -> Self {
        Self {
            root_selector: selector.into(),
            ..Self::default()
        }
    }

    pub fn with_criteria(mut self, criteria: Vec<Criterion>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_callback(mut self, callback: ResultCallback) -> Self {
        self.on_result = Some(callback);
        self
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("criteria", &self.criteria.len())
            .field("max_depth", &self.max_depth)
            .field("stop_after_first", &self.stop_after_first)
            .field("search_paths", &self.search_paths)
            .field("deep_paths", &self.deep_paths)
            .field("root_selector", &self.root_selector)
            .field("on_result", &self.on_result.as_ref().map(|_| "Some(fn)"))
            .finish()
    }
}

/// Host-page conventions: the property names the engine uses to walk the
/// framework-internal graph. Defaults match the internals of the UI
/// framework the original target sites run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Root properties with one of these prefixes hold the graph entry
    /// point.
    pub entry_prefixes: Vec<String>,
    /// Edge to the first child node (depth + 1).
    pub child_key: String,
    /// Edge to the next sibling node (same depth).
    pub sibling_key: String,
    /// Edge back to the parent node.
    pub parent_key: String,
    /// Property holding the node's backing state object.
    pub state_holder_key: String,
    /// Method on a state holder that forces a re-render.
    pub refresh_method: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            entry_prefixes: vec![
                "__react".to_string(),
                "__reactInternalInstance$".to_string(),
            ],
            child_key: "child".to_string(),
            sibling_key: "sibling".to_string(),
            parent_key: "return".to_string(),
            state_holder_key: "stateNode".to_string(),
            refresh_method: "forceUpdate".to_string(),
        }
    }
}

/// Retry parameters for the search orchestrator: a fixed delay between
/// attempts, no backoff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (N retries = N + 1 attempts).
    pub max_retries: u32,
    /// Delay between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 30,
            delay: Duration::from_secs(2),
        }
    }
}
