//! Depth-bounded, cycle-safe search over framework-internal object
//! graphs, plus one-shot method instrumentation.
//!
//! - `engine`: root resolution and the two-tier traversal
//! - `matcher`: recursive criteria predicates
//! - `registry`: identity-keyed instrumentation tracking
//! - `instrument`: observe-once method wrapping
//! - `host`: the selector-to-root collaborator seam
//! - `inspect`: handler collection and labelled-group detection

pub mod engine;
pub mod host;
pub mod inspect;
pub mod instrument;
pub mod matcher;
pub mod registry;

pub use engine::SearchEngine;
pub use host::{PageHost, RootResolver};
pub use inspect::{
    collect_handlers, detect_groups, find_refresh_handle, inspect_node, request_refresh,
    NodeReport,
};
pub use instrument::{instrument_once, Observation, Observer};
pub use matcher::{matches_any, matches_criterion};
pub use registry::PatchRegistry;
