//! FILENAME: pivot/src/lib.rs
//! Pivot transform for flat record collections.
//!
//! This crate reshapes a flat list of records into a grouped, optionally
//! cross-tabulated summary table. It is a pure in-memory transform: the
//! caller hands it data plus a serializable configuration and gets back
//! reshaped rows with column metadata.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the transform IS)
//! - `reduce`: Name-dispatched reducer registry (HOW cells aggregate)
//! - `view`: Output metadata for the grid renderer (WHAT we display)
//! - `engine`: Transform core (HOW we reshape)

pub mod definition;
pub mod engine;
pub mod reduce;
pub mod view;

pub use definition::*;
pub use engine::{transform_to_pivot, transform_to_pivot_with};
pub use reduce::{Reducer, ReducerRegistry};
pub use view::{humanize_title, PivotColumn, PivotResult};
