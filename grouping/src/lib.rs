//! FILENAME: grouping/src/lib.rs
//! Automatic column-header grouping for wide tables.
//!
//! Given a flat list of grid columns, this crate clusters related columns
//! under shared headers so that a wide table (typically the output of a
//! cross-tab pivot) renders with a two-level header. Detection is driven
//! by a serializable `GroupConfig` and is fully deterministic.
//!
//! Layers:
//! - `definition`: Serializable configuration and output types
//! - `engine`: The ordered rule chain that assigns columns to groups

pub mod definition;
pub mod engine;

pub use definition::{
    ColumnDef, ColumnGroup, ColumnGroupResult, GroupConfig, GroupedColumn, GroupingPattern,
    KeywordMapping,
};
pub use engine::auto_detect_column_groups;
