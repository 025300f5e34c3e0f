//! Core data model for fiberprobe.
//!
//! - `value`: dynamic, cycle-capable object graph values
//! - `criteria`: structural match predicates and their JSON wire shape
//! - `config`: search, engine and retry configuration
//! - `types`: search results
//! - `presets`: built-in criteria groups and defaults

pub mod config;
pub mod criteria;
pub mod error;
pub mod presets;
pub mod types;
pub mod value;

pub use config::*;
pub use criteria::*;
pub use error::*;
pub use types::*;
pub use value::*;
