//! FILENAME: pivot/src/engine.rs
//! Pivot Engine - transforms flat records into a grouped summary table.
//!
//! This module takes a PivotConfig (configuration) and a slice of Records
//! (data) and produces a PivotResult (reshaped rows + column metadata).
//!
//! Algorithm:
//! 1. Short-circuit pass-through when disabled, empty, or trivially configured
//! 2. Apply filters, then partition rows into groups keyed by the row fields
//! 3. Discover distinct cross-tab column values across the filtered rows
//! 4. Aggregate each group's cells (per column value when cross-tabbing)
//! 5. Append the Grand Total row when configured
//! 6. Emit deterministic column metadata for the grid renderer
//!
//! The transform is a pure function: no I/O, no cross-call state, and it
//! never fails — malformed configuration degrades to omitted fields.

use record::{FieldValue, Record};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::definition::{AggregationSpec, PivotConfig, SortDirection};
use crate::reduce::{Reducer, ReducerRegistry};
use crate::view::{humanize_title, PivotColumn, PivotResult};

/// Group key used when no row fields are configured.
const IMPLICIT_GROUP_KEY: &str = "all";

/// Label written into the row fields of the grand total row.
const GRAND_TOTAL_LABEL: &str = "Grand Total";

/// Output field flagging the grand total row. Kept in the source system's
/// camelCase so existing grid consumers recognize it.
const GRAND_TOTAL_FLAG: &str = "isGrandTotal";

// ============================================================================
// ROW GROUPS
// ============================================================================

/// One partition of the filtered rows, keyed by its row-field values.
/// Created fresh per transform invocation and discarded afterwards.
struct RowGroup<'a> {
    /// Composite key: row-field display values joined with `"|"`.
    /// The join is lossy — values containing `"|"` can collide. Kept as-is
    /// for output compatibility with the source system.
    #[allow(dead_code)]
    key: String,

    /// Row-field values in `config.rows` order, taken from the first record.
    group_values: SmallVec<[FieldValue; 4]>,

    /// Source records belonging to this group.
    rows: Vec<&'a Record>,
}

// ============================================================================
// PIVOT TRANSFORMER
// ============================================================================

/// The transform core. Borrows config and registry; owns nothing.
struct PivotTransformer<'a> {
    config: &'a PivotConfig,
    registry: &'a ReducerRegistry,
}

impl<'a> PivotTransformer<'a> {
    fn new(config: &'a PivotConfig, registry: &'a ReducerRegistry) -> Self {
        PivotTransformer { config, registry }
    }

    fn run(&self, data: &[Record]) -> PivotResult {
        // Disabled, empty, or nothing-to-do configs pass input through.
        if !self.config.enabled || data.is_empty() || self.config.is_trivial() {
            return PivotResult::pass_through(data);
        }

        let filtered = self.apply_filters(data);
        let groups = self.group_rows(&filtered);
        let column_values = self.discover_column_values(&filtered);
        let specs = self.active_values();

        let mut pivot_data = Vec::with_capacity(groups.len() + 1);
        for group in &groups {
            let mut out = Record::with_capacity(self.config.rows.len() + specs.len());
            for (field, value) in self.config.rows.iter().zip(group.group_values.iter()) {
                out.set(field.clone(), value.clone());
            }
            self.write_cells(&mut out, &group.rows, &column_values, &specs);
            pivot_data.push(out);
        }

        if self.config.show_grand_totals && !pivot_data.is_empty() {
            pivot_data.push(self.grand_total_row(&filtered, &column_values, &specs));
        }

        let pivot_columns = self.build_columns(&column_values, &specs);

        PivotResult { pivot_data, pivot_columns, column_values }
    }

    /// Keeps only records satisfying every configured filter.
    fn apply_filters<'b>(&self, data: &'b [Record]) -> Vec<&'b Record> {
        data.iter()
            .filter(|record| self.config.filters.iter().all(|f| f.matches(record)))
            .collect()
    }

    /// Partitions filtered rows into groups, preserving discovery order.
    fn group_rows<'b>(&self, filtered: &[&'b Record]) -> Vec<RowGroup<'b>> {
        let mut groups: Vec<RowGroup<'b>> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();

        for &record in filtered {
            let (key, group_values) = self.group_key(record);
            match index.get(&key) {
                Some(&i) => groups[i].rows.push(record),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(RowGroup {
                        key,
                        group_values,
                        rows: vec![record],
                    });
                }
            }
        }

        groups
    }

    /// Builds the composite group key and the row-field value tuple.
    fn group_key(&self, record: &Record) -> (String, SmallVec<[FieldValue; 4]>) {
        if self.config.rows.is_empty() {
            return (IMPLICIT_GROUP_KEY.to_string(), SmallVec::new());
        }

        let mut group_values: SmallVec<[FieldValue; 4]> =
            SmallVec::with_capacity(self.config.rows.len());
        let mut parts: Vec<String> = Vec::with_capacity(self.config.rows.len());
        for field in &self.config.rows {
            let value = record.get_or_null(field);
            parts.push(value.display());
            group_values.push(value.clone());
        }

        (parts.join("|"), group_values)
    }

    /// Collects distinct cross-tab values over the filtered rows.
    /// Discovery order is kept unless sorting is configured; nulls never
    /// become column values.
    fn discover_column_values(&self, filtered: &[&Record]) -> Vec<String> {
        if self.config.columns.is_empty() {
            return Vec::new();
        }

        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut values = Vec::new();
        for &record in filtered {
            for field in &self.config.columns {
                let value = record.get_or_null(field);
                if value.is_null() {
                    continue;
                }
                let display = value.display();
                if seen.insert(display.clone()) {
                    values.push(display);
                }
            }
        }

        if self.config.sort_columns {
            values.sort();
            if self.config.sort_direction == SortDirection::Descending {
                values.reverse();
            }
        }

        values
    }

    /// Value specs whose reducer exists. A spec naming an unregistered
    /// aggregation contributes neither cells nor column metadata.
    fn active_values(&self) -> Vec<(&'a AggregationSpec, &'a Reducer)> {
        self.config
            .values
            .iter()
            .filter_map(|spec| self.registry.get(&spec.aggregation).map(|r| (spec, r)))
            .collect()
    }

    /// Writes the aggregated cells for one output row.
    fn write_cells(
        &self,
        out: &mut Record,
        rows: &[&Record],
        column_values: &[String],
        specs: &[(&AggregationSpec, &Reducer)],
    ) {
        if column_values.is_empty() {
            for (spec, reducer) in specs {
                let values = field_values(rows, &spec.field);
                out.set(spec.field.clone(), reducer(&values));
            }
        } else {
            for col_value in column_values {
                let matching: Vec<&Record> = rows
                    .iter()
                    .copied()
                    .filter(|record| self.matches_column_value(record, col_value))
                    .collect();
                for (spec, reducer) in specs {
                    let values = field_values(&matching, &spec.field);
                    // An empty match set reduces to the reducer's default
                    // (0 for the numeric built-ins), never to null.
                    out.set(cell_key(col_value, &spec.field), reducer(&values));
                }
            }
        }

        if self.config.show_row_totals {
            for (spec, reducer) in specs {
                let values = field_values(rows, &spec.field);
                out.set(format!("{}_total", spec.field), reducer(&values));
            }
        }
    }

    /// True when any cross-tab field of the record displays as `col_value`.
    fn matches_column_value(&self, record: &Record, col_value: &str) -> bool {
        self.config
            .columns
            .iter()
            .any(|field| record.get_or_null(field).display() == col_value)
    }

    /// Synthetic final row aggregating the entire filtered dataset.
    fn grand_total_row(
        &self,
        filtered: &[&Record],
        column_values: &[String],
        specs: &[(&AggregationSpec, &Reducer)],
    ) -> Record {
        let mut out = Record::with_capacity(self.config.rows.len() + specs.len() + 1);
        for field in &self.config.rows {
            out.set(field.clone(), GRAND_TOTAL_LABEL);
        }
        self.write_cells(&mut out, filtered, column_values, specs);
        out.set(GRAND_TOTAL_FLAG, true);
        out
    }

    /// Emits column metadata: row columns, value columns (one per cross-tab
    /// value when cross-tabbing), and total columns when enabled.
    fn build_columns(
        &self,
        column_values: &[String],
        specs: &[(&AggregationSpec, &Reducer)],
    ) -> Vec<PivotColumn> {
        let mut columns = Vec::new();

        for field in &self.config.rows {
            columns.push(PivotColumn::row(field));
        }

        if column_values.is_empty() {
            for (spec, _) in specs {
                columns.push(PivotColumn::value(
                    spec.field.clone(),
                    format!("{} ({})", humanize_title(&spec.field), spec.aggregation),
                ));
            }
        } else {
            for col_value in column_values {
                for (spec, _) in specs {
                    columns.push(PivotColumn::value(
                        cell_key(col_value, &spec.field),
                        format!(
                            "{} - {} ({})",
                            col_value,
                            humanize_title(&spec.field),
                            spec.aggregation
                        ),
                    ));
                }
            }
        }

        if self.config.show_row_totals {
            for (spec, _) in specs {
                columns.push(PivotColumn::total(&spec.field));
            }
        }

        columns
    }
}

/// Key for one cross-tab cell. Always the single `_` join; the configurable
/// `field_separator` only governs compound source-column naming for the
/// grouping crate.
fn cell_key(col_value: &str, field: &str) -> String {
    format!("{}_{}", col_value, field)
}

/// Collects a field's non-null values across rows, in row order.
fn field_values<'r>(rows: &[&'r Record], field: &str) -> Vec<&'r FieldValue> {
    rows.iter()
        .filter_map(|record| record.get(field))
        .filter(|value| !value.is_null())
        .collect()
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Transforms flat records into a pivot summary using the built-in reducers.
/// This is the main entry point for the transform.
pub fn transform_to_pivot(data: &[Record], config: &PivotConfig) -> PivotResult {
    let registry = ReducerRegistry::builtin();
    transform_to_pivot_with(data, config, &registry)
}

/// Transform with a caller-supplied reducer registry (built-ins plus any
/// registered extensions).
pub fn transform_to_pivot_with(
    data: &[Record],
    config: &PivotConfig,
    registry: &ReducerRegistry,
) -> PivotResult {
    PivotTransformer::new(config, registry).run(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Aggregation;
    use record::records_from_json;
    use serde_json::json;

    fn sales_data() -> Vec<Record> {
        records_from_json(&json!([
            { "region": "A", "status": "open",   "amt": 10 },
            { "region": "A", "status": "open",   "amt": 20 },
            { "region": "B", "status": "closed", "amt": 5 }
        ]))
    }

    fn sum_config(rows: &[&str]) -> PivotConfig {
        PivotConfig {
            rows: rows.iter().map(|s| s.to_string()).collect(),
            values: vec![AggregationSpec::new("amt", Aggregation::Sum)],
            ..PivotConfig::default()
        }
    }

    #[test]
    fn disabled_config_passes_through() {
        let data = sales_data();
        let mut config = sum_config(&["region"]);
        config.enabled = false;

        let result = transform_to_pivot(&data, &config);
        assert_eq!(result.pivot_data, data);
        assert!(result.pivot_columns.is_empty());
        assert!(result.column_values.is_empty());
    }

    #[test]
    fn trivial_config_passes_through() {
        let data = sales_data();
        let config = PivotConfig::default();

        let result = transform_to_pivot(&data, &config);
        assert_eq!(result.pivot_data, data);
        assert!(result.pivot_columns.is_empty());
    }

    #[test]
    fn empty_data_passes_through() {
        let result = transform_to_pivot(&[], &sum_config(&["region"]));
        assert!(result.pivot_data.is_empty());
        assert!(result.pivot_columns.is_empty());
    }

    #[test]
    fn groups_rows_in_discovery_order() {
        let result = transform_to_pivot(&sales_data(), &sum_config(&["region"]));

        let expected = records_from_json(&json!([
            { "region": "A", "amt": 30 },
            { "region": "B", "amt": 5 }
        ]));
        assert_eq!(result.pivot_data, expected);

        let keys: Vec<&str> = result.pivot_columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["region", "amt"]);
        assert!(result.pivot_columns[0].is_pivot_row);
        assert!(result.pivot_columns[1].is_pivot_value);
        assert_eq!(result.pivot_columns[1].title, "Amt (sum)");
    }

    #[test]
    fn grand_total_row_is_appended_last() {
        let mut config = sum_config(&["region"]);
        config.show_grand_totals = true;

        let result = transform_to_pivot(&sales_data(), &config);
        assert_eq!(result.pivot_data.len(), 3);

        let total = result.pivot_data.last().unwrap();
        assert_eq!(total.get("region"), Some(&FieldValue::Text("Grand Total".to_string())));
        assert_eq!(total.get("amt"), Some(&FieldValue::Number(35.0)));
        assert_eq!(total.get("isGrandTotal"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn cross_tab_zero_fills_empty_cells() {
        let mut config = sum_config(&["region"]);
        config.columns = vec!["status".to_string()];

        let result = transform_to_pivot(&sales_data(), &config);
        assert_eq!(result.column_values, vec!["open", "closed"]);

        let region_a = &result.pivot_data[0];
        assert_eq!(region_a.get("open_amt"), Some(&FieldValue::Number(30.0)));
        // No "closed" rows in region A: the cell is 0, never absent.
        assert_eq!(region_a.get("closed_amt"), Some(&FieldValue::Number(0.0)));

        let region_b = &result.pivot_data[1];
        assert_eq!(region_b.get("open_amt"), Some(&FieldValue::Number(0.0)));
        assert_eq!(region_b.get("closed_amt"), Some(&FieldValue::Number(5.0)));
    }

    #[test]
    fn cross_tab_column_metadata_and_titles() {
        let mut config = sum_config(&["region"]);
        config.columns = vec!["status".to_string()];
        config.show_row_totals = true;

        let result = transform_to_pivot(&sales_data(), &config);
        let keys: Vec<&str> = result.pivot_columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["region", "open_amt", "closed_amt", "amt_total"]);

        assert_eq!(result.pivot_columns[1].title, "open - Amt (sum)");
        assert!(result.pivot_columns[3].is_pivot_total);

        let region_a = &result.pivot_data[0];
        assert_eq!(region_a.get("amt_total"), Some(&FieldValue::Number(30.0)));
    }

    #[test]
    fn sorted_column_values_descending() {
        let mut config = sum_config(&["region"]);
        config.columns = vec!["status".to_string()];
        config.sort_columns = true;
        config.sort_direction = SortDirection::Descending;

        let result = transform_to_pivot(&sales_data(), &config);
        assert_eq!(result.column_values, vec!["open", "closed"]);

        config.sort_direction = SortDirection::Ascending;
        let result = transform_to_pivot(&sales_data(), &config);
        assert_eq!(result.column_values, vec!["closed", "open"]);
    }

    #[test]
    fn unknown_aggregation_is_skipped() {
        let mut config = sum_config(&["region"]);
        config.values.push(AggregationSpec::named("amt", "median"));

        let result = transform_to_pivot(&sales_data(), &config);
        // The sum column survives; the unknown reducer contributes nothing.
        let keys: Vec<&str> = result.pivot_columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["region", "amt"]);
    }

    #[test]
    fn filters_apply_before_grouping() {
        use crate::definition::{FilterCondition, FilterSpec, TextOperator};

        let mut config = sum_config(&["region"]);
        config.filters.push(FilterSpec::new(
            "status",
            FilterCondition::TextFilter {
                operator: TextOperator::Equals,
                value: "open".to_string(),
                case_sensitive: true,
            },
        ));

        let result = transform_to_pivot(&sales_data(), &config);
        let expected = records_from_json(&json!([{ "region": "A", "amt": 30 }]));
        assert_eq!(result.pivot_data, expected);
    }

    #[test]
    fn implicit_all_group_without_row_fields() {
        let config = sum_config(&[]);
        let result = transform_to_pivot(&sales_data(), &config);

        let expected = records_from_json(&json!([{ "amt": 35 }]));
        assert_eq!(result.pivot_data, expected);
    }

    #[test]
    fn null_and_missing_values_are_excluded_from_aggregation() {
        let data = records_from_json(&json!([
            { "region": "A", "amt": 10 },
            { "region": "A", "amt": null },
            { "region": "A" }
        ]));
        let mut config = sum_config(&["region"]);
        config.values.push(AggregationSpec::new("amt", Aggregation::Count));

        // Both specs target "amt": the count overwrites the sum in the cell,
        // matching last-writer-wins field semantics of the source system.
        let result = transform_to_pivot(&data, &config);
        assert_eq!(result.pivot_data[0].get("amt"), Some(&FieldValue::Number(1.0)));
    }

    #[test]
    fn group_key_join_is_lossy() {
        // Known limitation carried over from the source: "|" inside a value
        // can collide with the tuple separator.
        let data = records_from_json(&json!([
            { "a": "x|y", "b": "z", "amt": 1 },
            { "a": "x", "b": "y|z", "amt": 2 }
        ]));
        let config = PivotConfig {
            rows: vec!["a".to_string(), "b".to_string()],
            values: vec![AggregationSpec::new("amt", Aggregation::Sum)],
            ..PivotConfig::default()
        };

        let result = transform_to_pivot(&data, &config);
        assert_eq!(result.pivot_data.len(), 1);
        assert_eq!(result.pivot_data[0].get("amt"), Some(&FieldValue::Number(3.0)));
    }

    #[test]
    fn string_values_coerce_during_sum() {
        let data = records_from_json(&json!([
            { "region": "A", "amt": "10" },
            { "region": "A", "amt": 5 }
        ]));
        let result = transform_to_pivot(&data, &sum_config(&["region"]));
        assert_eq!(result.pivot_data[0].get("amt"), Some(&FieldValue::Number(15.0)));
    }

    #[test]
    fn custom_reducer_via_registry() {
        let mut registry = ReducerRegistry::builtin();
        registry.register("distinct", |vals: &[&FieldValue]| {
            let mut seen: Vec<String> = Vec::new();
            for v in vals {
                let d = v.display();
                if !seen.contains(&d) {
                    seen.push(d);
                }
            }
            FieldValue::Number(seen.len() as f64)
        });

        let mut config = sum_config(&["region"]);
        config.values = vec![AggregationSpec::named("status", "distinct")];

        let result = transform_to_pivot_with(&sales_data(), &config, &registry);
        assert_eq!(result.pivot_data[0].get("status"), Some(&FieldValue::Number(1.0)));
    }

    #[test]
    fn transform_is_idempotent_across_calls() {
        let data = sales_data();
        let mut config = sum_config(&["region"]);
        config.columns = vec!["status".to_string()];
        config.show_grand_totals = true;
        config.show_row_totals = true;

        let first = transform_to_pivot(&data, &config);
        let second = transform_to_pivot(&data, &config);
        assert_eq!(first, second);
    }
}
