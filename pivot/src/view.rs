//! FILENAME: pivot/src/view.rs
//! Pivot output metadata - what a grid renderer needs to display the result.
//!
//! `PivotColumn` describes one output column; `PivotResult` bundles the
//! reshaped rows with the column list and the discovered cross-tab values.
//! Everything here is a plain value object derived deterministically from
//! config + data, never mutated after creation.

use record::Record;
use serde::{Deserialize, Serialize};

/// Describes one column of the pivot output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotColumn {
    /// Field key in the output records.
    pub key: String,

    /// Human-readable column title.
    pub title: String,

    /// True for row-grouping columns.
    #[serde(default)]
    pub is_pivot_row: bool,

    /// True for aggregated value columns (cross-tab or bare).
    #[serde(default)]
    pub is_pivot_value: bool,

    /// True for per-row total columns.
    #[serde(default)]
    pub is_pivot_total: bool,
}

impl PivotColumn {
    /// Column for a row-grouping field.
    pub fn row(field: &str) -> Self {
        PivotColumn {
            key: field.to_string(),
            title: humanize_title(field),
            is_pivot_row: true,
            is_pivot_value: false,
            is_pivot_total: false,
        }
    }

    /// Column for an aggregated value cell.
    pub fn value(key: impl Into<String>, title: impl Into<String>) -> Self {
        PivotColumn {
            key: key.into(),
            title: title.into(),
            is_pivot_row: false,
            is_pivot_value: true,
            is_pivot_total: false,
        }
    }

    /// Column for a per-row total of one value field.
    pub fn total(field: &str) -> Self {
        PivotColumn {
            key: format!("{}_total", field),
            title: format!("{} Total", humanize_title(field)),
            is_pivot_row: false,
            is_pivot_value: false,
            is_pivot_total: true,
        }
    }
}

/// The full transform output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotResult {
    /// Reshaped rows (or the input unchanged on pass-through).
    pub pivot_data: Vec<Record>,

    /// Column metadata, empty on pass-through.
    pub pivot_columns: Vec<PivotColumn>,

    /// Discovered cross-tab column values, in output order.
    pub column_values: Vec<String>,
}

impl PivotResult {
    /// Pass-through result: input unchanged, no metadata.
    pub fn pass_through(data: &[Record]) -> Self {
        PivotResult {
            pivot_data: data.to_vec(),
            pivot_columns: Vec::new(),
            column_values: Vec::new(),
        }
    }
}

/// Splits a camelCase field name into a capitalized title.
/// "serviceAmount" becomes "Service Amount"; acronym runs stay intact.
pub fn humanize_title(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    let mut prev_breaks = false;
    for (i, ch) in field.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else {
            if ch.is_uppercase() && prev_breaks {
                out.push(' ');
            }
            out.push(ch);
        }
        prev_breaks = ch.is_lowercase() || ch.is_ascii_digit();
    }
    out
}
