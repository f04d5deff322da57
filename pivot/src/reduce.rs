//! FILENAME: pivot/src/reduce.rs
//! Reducer registry - runtime-dispatched aggregation functions.
//!
//! Aggregations are selected by name at transform time so that callers can
//! extend the built-in set with their own reducers. A spec naming a reducer
//! that is not registered is silently skipped by the engine (no output
//! field, no column metadata).
//!
//! Reducers receive the group's values with nulls already excluded. The
//! numeric reducers coerce through `FieldValue::as_number` and skip values
//! that do not coerce, so aggregates never surface NaN.

use record::FieldValue;
use rustc_hash::FxHashMap;

/// A reduction over one group's non-null values.
pub type Reducer = Box<dyn Fn(&[&FieldValue]) -> FieldValue + Send + Sync>;

/// Name → reducer lookup table.
pub struct ReducerRegistry {
    reducers: FxHashMap<String, Reducer>,
}

impl ReducerRegistry {
    /// An empty registry with no reducers at all.
    pub fn empty() -> Self {
        ReducerRegistry { reducers: FxHashMap::default() }
    }

    /// A registry pre-loaded with the built-in reducers.
    pub fn builtin() -> Self {
        let mut registry = ReducerRegistry::empty();
        registry.register("sum", reduce_sum);
        registry.register("count", reduce_count);
        registry.register("average", reduce_average);
        registry.register("min", reduce_min);
        registry.register("max", reduce_max);
        registry.register("first", reduce_first);
        registry.register("last", reduce_last);
        registry
    }

    /// Registers (or replaces) a reducer under a name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        reducer: impl Fn(&[&FieldValue]) -> FieldValue + Send + Sync + 'static,
    ) {
        self.reducers.insert(name.into(), Box::new(reducer));
    }

    pub fn get(&self, name: &str) -> Option<&Reducer> {
        self.reducers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reducers.contains_key(name)
    }
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        ReducerRegistry::builtin()
    }
}

// ============================================================================
// BUILT-IN REDUCERS
// ============================================================================

fn numbers<'a>(values: &'a [&FieldValue]) -> impl Iterator<Item = f64> + 'a {
    values.iter().filter_map(|v| v.as_number())
}

fn reduce_sum(values: &[&FieldValue]) -> FieldValue {
    FieldValue::Number(numbers(values).sum())
}

fn reduce_count(values: &[&FieldValue]) -> FieldValue {
    FieldValue::Number(values.len() as f64)
}

fn reduce_average(values: &[&FieldValue]) -> FieldValue {
    let mut sum = 0.0;
    let mut count = 0u64;
    for n in numbers(values) {
        sum += n;
        count += 1;
    }
    if count > 0 {
        FieldValue::Number(sum / count as f64)
    } else {
        FieldValue::Number(0.0)
    }
}

fn reduce_min(values: &[&FieldValue]) -> FieldValue {
    FieldValue::Number(numbers(values).fold(None, |acc: Option<f64>, n| {
        Some(acc.map_or(n, |m| m.min(n)))
    }).unwrap_or(0.0))
}

fn reduce_max(values: &[&FieldValue]) -> FieldValue {
    FieldValue::Number(numbers(values).fold(None, |acc: Option<f64>, n| {
        Some(acc.map_or(n, |m| m.max(n)))
    }).unwrap_or(0.0))
}

fn reduce_first(values: &[&FieldValue]) -> FieldValue {
    values.first().map(|v| (*v).clone()).unwrap_or_else(|| FieldValue::Text(String::new()))
}

fn reduce_last(values: &[&FieldValue]) -> FieldValue {
    values.last().map(|v| (*v).clone()).unwrap_or_else(|| FieldValue::Text(String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(registry: &ReducerRegistry, name: &str, owned: &[FieldValue]) -> FieldValue {
        let refs: Vec<&FieldValue> = owned.iter().collect();
        registry.get(name).unwrap()(&refs)
    }

    #[test]
    fn sum_skips_non_coercible_and_defaults_to_zero() {
        let registry = ReducerRegistry::builtin();
        let vals = vec![
            FieldValue::Number(10.0),
            FieldValue::Text("5".to_string()),
            FieldValue::Text("abc".to_string()),
        ];
        assert_eq!(apply(&registry, "sum", &vals), FieldValue::Number(15.0));
        assert_eq!(apply(&registry, "sum", &[]), FieldValue::Number(0.0));
    }

    #[test]
    fn count_counts_every_entry() {
        let registry = ReducerRegistry::builtin();
        let vals = vec![
            FieldValue::Text("a".to_string()),
            FieldValue::Number(1.0),
            FieldValue::Boolean(false),
        ];
        assert_eq!(apply(&registry, "count", &vals), FieldValue::Number(3.0));
    }

    #[test]
    fn average_over_coercible_values() {
        let registry = ReducerRegistry::builtin();
        let vals = vec![
            FieldValue::Number(10.0),
            FieldValue::Number(20.0),
            FieldValue::Text("oops".to_string()),
        ];
        assert_eq!(apply(&registry, "average", &vals), FieldValue::Number(15.0));
        assert_eq!(apply(&registry, "average", &[]), FieldValue::Number(0.0));
    }

    #[test]
    fn min_max_with_empty_default() {
        let registry = ReducerRegistry::builtin();
        let vals = vec![
            FieldValue::Number(7.0),
            FieldValue::Number(-3.0),
            FieldValue::Number(4.0),
        ];
        assert_eq!(apply(&registry, "min", &vals), FieldValue::Number(-3.0));
        assert_eq!(apply(&registry, "max", &vals), FieldValue::Number(7.0));
        assert_eq!(apply(&registry, "min", &[]), FieldValue::Number(0.0));
        assert_eq!(apply(&registry, "max", &[]), FieldValue::Number(0.0));
    }

    #[test]
    fn first_last_fall_back_to_empty_text() {
        let registry = ReducerRegistry::builtin();
        let vals = vec![
            FieldValue::Text("a".to_string()),
            FieldValue::Text("b".to_string()),
        ];
        assert_eq!(apply(&registry, "first", &vals), FieldValue::Text("a".to_string()));
        assert_eq!(apply(&registry, "last", &vals), FieldValue::Text("b".to_string()));
        assert_eq!(apply(&registry, "first", &[]), FieldValue::Text(String::new()));
        assert_eq!(apply(&registry, "last", &[]), FieldValue::Text(String::new()));
    }

    #[test]
    fn custom_reducer_registration() {
        let mut registry = ReducerRegistry::builtin();
        registry.register("range", |vals: &[&FieldValue]| {
            let nums: Vec<f64> = vals.iter().filter_map(|v| v.as_number()).collect();
            match (nums.iter().cloned().reduce(f64::min), nums.iter().cloned().reduce(f64::max)) {
                (Some(lo), Some(hi)) => FieldValue::Number(hi - lo),
                _ => FieldValue::Number(0.0),
            }
        });
        assert!(registry.contains("range"));
        let vals = vec![FieldValue::Number(3.0), FieldValue::Number(10.0)];
        assert_eq!(apply(&registry, "range", &vals), FieldValue::Number(7.0));
    }
}
