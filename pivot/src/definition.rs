//! FILENAME: pivot/src/definition.rs
//! Pivot Transform Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot transform.
//! These structures are designed to be:
//! - Serializable (so an external store can save/load them by key)
//! - Immutable snapshots of caller intent
//!
//! The transform itself never fails; `PivotConfig::validate` is an optional
//! strict mode for callers that want misconfiguration surfaced early.

use record::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reduce::ReducerRegistry;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Built-in aggregation functions for value fields.
///
/// Dispatch happens by name through the `ReducerRegistry`, so callers can
/// register additional reducers beyond this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Count,
    Average,
    Min,
    Max,
    First,
    Last,
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Sum
    }
}

impl Aggregation {
    /// The registry name this aggregation dispatches under.
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Count => "count",
            Aggregation::Average => "average",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::First => "first",
            Aggregation::Last => "last",
        }
    }

    /// All built-in aggregations, in registry insertion order.
    pub fn all() -> [Aggregation; 7] {
        [
            Aggregation::Sum,
            Aggregation::Count,
            Aggregation::Average,
            Aggregation::Min,
            Aggregation::Max,
            Aggregation::First,
            Aggregation::Last,
        ]
    }
}

/// One value field: which field to reduce and which reducer to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    /// Source field name.
    pub field: String,

    /// Reducer name, looked up in the registry at transform time.
    /// A name with no registered reducer is silently skipped.
    pub aggregation: String,
}

impl AggregationSpec {
    pub fn new(field: impl Into<String>, aggregation: Aggregation) -> Self {
        AggregationSpec {
            field: field.into(),
            aggregation: aggregation.as_str().to_string(),
        }
    }

    /// Spec dispatching to a caller-registered reducer by name.
    pub fn named(field: impl Into<String>, aggregation: impl Into<String>) -> Self {
        AggregationSpec {
            field: field.into(),
            aggregation: aggregation.into(),
        }
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// Comparison operators for number filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    NotBetween,
}

/// Text filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    BeginsWith,
    EndsWith,
}

/// The filter condition applied to one field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    /// Include only these specific values.
    ValueList(Vec<FieldValue>),

    /// Numeric comparison. Non-coercible values never match.
    NumberFilter {
        operator: ComparisonOperator,
        value: f64,
        /// Second bound for Between/NotBetween.
        value2: Option<f64>,
    },

    /// Text comparison against the value's display string.
    TextFilter {
        operator: TextOperator,
        value: String,
        case_sensitive: bool,
    },
}

impl FilterCondition {
    /// Tests one value against this condition.
    pub fn matches(&self, value: &FieldValue) -> bool {
        match self {
            FilterCondition::ValueList(allowed) => allowed.contains(value),
            FilterCondition::NumberFilter { operator, value: bound, value2 } => {
                let n = match value.as_number() {
                    Some(n) => n,
                    None => return false,
                };
                let upper = value2.unwrap_or(*bound);
                match operator {
                    ComparisonOperator::Equals => n == *bound,
                    ComparisonOperator::NotEquals => n != *bound,
                    ComparisonOperator::GreaterThan => n > *bound,
                    ComparisonOperator::GreaterThanOrEqual => n >= *bound,
                    ComparisonOperator::LessThan => n < *bound,
                    ComparisonOperator::LessThanOrEqual => n <= *bound,
                    ComparisonOperator::Between => n >= *bound && n <= upper,
                    ComparisonOperator::NotBetween => n < *bound || n > upper,
                }
            }
            FilterCondition::TextFilter { operator, value: needle, case_sensitive } => {
                let mut haystack = value.display();
                let mut needle = needle.clone();
                if !case_sensitive {
                    haystack = haystack.to_lowercase();
                    needle = needle.to_lowercase();
                }
                match operator {
                    TextOperator::Equals => haystack == needle,
                    TextOperator::NotEquals => haystack != needle,
                    TextOperator::Contains => haystack.contains(&needle),
                    TextOperator::NotContains => !haystack.contains(&needle),
                    TextOperator::BeginsWith => haystack.starts_with(&needle),
                    TextOperator::EndsWith => haystack.ends_with(&needle),
                }
            }
        }
    }
}

/// A filter applied to one field, pre-applied before grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field: String,
    pub condition: FilterCondition,
}

impl FilterSpec {
    pub fn new(field: impl Into<String>, condition: FilterCondition) -> Self {
        FilterSpec { field: field.into(), condition }
    }

    /// Tests a record. Absent fields read as null.
    pub fn matches(&self, record: &Record) -> bool {
        self.condition.matches(record.get_or_null(&self.field))
    }
}

// ============================================================================
// SORTING
// ============================================================================

/// Sort direction for discovered column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

/// The complete, serializable configuration of one pivot transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    /// Master switch. When false the transform passes input through.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Row-grouping field names, ordered outer to inner.
    #[serde(default)]
    pub rows: Vec<String>,

    /// Cross-tab field names.
    #[serde(default)]
    pub columns: Vec<String>,

    /// Value fields with their aggregations.
    #[serde(default)]
    pub values: Vec<AggregationSpec>,

    /// Filters pre-applied before grouping.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,

    /// Append a synthetic Grand Total row.
    #[serde(default)]
    pub show_grand_totals: bool,

    /// Emit an unfiltered `{field}_total` column per value field.
    #[serde(default)]
    pub show_row_totals: bool,

    /// Carried configuration; the flat-output transform assigns no behavior.
    #[serde(default)]
    pub show_column_totals: bool,

    /// Carried configuration; the flat-output transform assigns no behavior.
    #[serde(default)]
    pub show_sub_totals: bool,

    /// Sort discovered column values lexicographically.
    #[serde(default)]
    pub sort_columns: bool,

    #[serde(default)]
    pub sort_direction: SortDirection,

    /// Separator convention for compound column keys consumed by the
    /// companion grouping crate. Cross-tab cell keys themselves always use
    /// the single `_` join.
    #[serde(default = "default_field_separator")]
    pub field_separator: String,
}

fn default_true() -> bool {
    true
}

fn default_field_separator() -> String {
    "__".to_string()
}

impl Default for PivotConfig {
    fn default() -> Self {
        PivotConfig {
            enabled: true,
            rows: Vec::new(),
            columns: Vec::new(),
            values: Vec::new(),
            filters: Vec::new(),
            show_grand_totals: false,
            show_row_totals: false,
            show_column_totals: false,
            show_sub_totals: false,
            sort_columns: false,
            sort_direction: SortDirection::Ascending,
            field_separator: default_field_separator(),
        }
    }
}

impl PivotConfig {
    /// True when the config describes no reshaping at all.
    pub fn is_trivial(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty() && self.values.is_empty()
    }

    /// Optional strict validation.
    ///
    /// The transform itself degrades silently (unknown reducers skip their
    /// output field); this lets callers surface those cases as errors
    /// up front without changing transform semantics.
    pub fn validate(&self, registry: &ReducerRegistry) -> Result<(), PivotError> {
        for field in self.rows.iter().chain(self.columns.iter()) {
            if field.trim().is_empty() {
                return Err(PivotError::BlankField("rows/columns"));
            }
        }
        for spec in &self.values {
            if spec.field.trim().is_empty() {
                return Err(PivotError::BlankField("values"));
            }
            if !registry.contains(&spec.aggregation) {
                return Err(PivotError::UnknownAggregation(spec.aggregation.clone()));
            }
        }
        Ok(())
    }
}

/// Misconfiguration surfaced by the optional strict mode.
#[derive(Error, Debug)]
pub enum PivotError {
    #[error("no reducer registered for aggregation '{0}'")]
    UnknownAggregation(String),

    #[error("blank field name in {0} list")]
    BlankField(&'static str),
}
