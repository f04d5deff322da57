//! FILENAME: record/src/lib.rs
//! Shared data model for the tabular transform crates.
//!
//! Source data is a flat collection of duck-typed rows (typically JSON
//! decoded from an API response). This crate provides the two types every
//! transform works over:
//! - `FieldValue`: the scalar a field can hold (null, number, text, boolean)
//! - `Record`: an ordered field → value mapping tolerant of absent keys
//!
//! Both transforms treat these as immutable inputs; nothing here carries
//! cross-call state.

pub mod record;
pub mod value;

pub use record::{records_from_json, Record};
pub use value::FieldValue;
