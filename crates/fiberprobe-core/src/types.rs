use crate::value::ObjectRef;

/// A single hit produced by a search.
///
/// `matched` and `source` are shared handles into the inspected graph;
/// callers must treat them as snapshots of a live, externally owned
/// structure.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The object that satisfied a criterion.
    pub matched: ObjectRef,
    /// The graph node on which the match was found.
    pub source: ObjectRef,
    /// Index into the configured criteria list; first match wins.
    pub criterion_index: usize,
}
