//! FILENAME: grouping/src/engine.rs
//! Column group detection.
//!
//! Walks the column list through an ordered rule chain; every column is
//! claimed at most once and the first matching rule wins:
//!
//! 1. Explicit exclusions (`ungrouped_columns`)
//! 2. Keyword grouping over separator-free keys (custom mappings, then
//!    shared prefixes, then built-in fallback keywords)
//! 3. Separator splitting (`prefix__suffix`)
//! 4. Custom regex patterns
//! 5. Total folding into an existing group
//!
//! Whatever survives the chain lands in `ungrouped_columns` of the result,
//! so the output always accounts for every input column exactly once.

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::definition::{
    ColumnDef, ColumnGroup, ColumnGroupResult, GroupConfig, GroupedColumn,
};

/// Built-in keywords tried after custom mappings and prefix detection.
const FALLBACK_KEYWORDS: [&str; 5] = ["service", "support", "inventory", "empvisit", "drvisit"];

/// Leading alphabetic runs never treated as shared prefixes. These are
/// generic identifier words that would cluster unrelated columns.
const PREFIX_STOPLIST: [&str; 9] =
    ["dr", "date", "id", "name", "team", "hq", "location", "code", "salesteam"];

/// Keys containing this fragment stay out of keyword grouping so that
/// organizational columns never get pulled into a metric group.
const KEYWORD_EXCLUDED_FRAGMENT: &str = "salesteam";

/// Group name when a regex rule has neither an explicit name nor a
/// capture group.
const DEFAULT_PATTERN_GROUP: &str = "Group";

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Clusters `columns` into named header groups according to `config`.
///
/// Deterministic: the same inputs always produce the same groups in the
/// same order. Groups appear keyword-first, then separator-derived, then
/// regex-derived; group order within each family follows first claim.
pub fn auto_detect_column_groups(columns: &[ColumnDef], config: &GroupConfig) -> ColumnGroupResult {
    let detector = GroupDetector::new(columns, config);
    detector.run()
}

// ============================================================================
// DETECTOR
// ============================================================================

struct GroupDetector<'a> {
    columns: &'a [ColumnDef],
    config: &'a GroupConfig,
    claimed: Vec<bool>,
}

impl<'a> GroupDetector<'a> {
    fn new(columns: &'a [ColumnDef], config: &'a GroupConfig) -> Self {
        GroupDetector { columns, config, claimed: vec![false; columns.len()] }
    }

    fn run(mut self) -> ColumnGroupResult {
        let mut ungrouped = self.claim_excluded();

        let keyword_groups = self.claim_keyword_groups();
        let separator_groups = self.claim_separator_groups();
        let pattern_groups = self.claim_pattern_groups();

        let mut groups = Vec::new();
        groups.extend(assemble_keyword_groups(keyword_groups));
        groups.extend(assemble_separator_groups(separator_groups));
        groups.extend(pattern_groups.into_groups());

        self.fold_totals(&mut groups);

        for (i, col) in self.columns.iter().enumerate() {
            if !self.claimed[i] {
                ungrouped.push(col.clone());
            }
        }

        ColumnGroupResult { groups, ungrouped_columns: ungrouped }
    }

    /// Step 1: columns the caller pinned outside of grouping.
    fn claim_excluded(&mut self) -> Vec<ColumnDef> {
        let mut excluded = Vec::new();
        for (i, col) in self.columns.iter().enumerate() {
            if self.config.ungrouped_columns.iter().any(|key| key == &col.key) {
                self.claimed[i] = true;
                excluded.push(col.clone());
            }
        }
        excluded
    }

    /// Step 2: keyword grouping. Only separator-free keys participate;
    /// compound keys are reserved for the separator step.
    fn claim_keyword_groups(&mut self) -> GroupBuckets {
        let shared_prefixes = self.detect_shared_prefixes();
        let mut buckets = GroupBuckets::new();

        for (i, col) in self.columns.iter().enumerate() {
            if self.claimed[i] || self.has_separator(&col.key) {
                continue;
            }
            let key_lower = col.key.to_lowercase();
            if key_lower.contains(KEYWORD_EXCLUDED_FRAGMENT) {
                continue;
            }

            let group_name = self
                .custom_mapping_for(&key_lower)
                .or_else(|| {
                    let prefix = leading_alpha(&col.key).to_lowercase();
                    shared_prefixes.contains(&prefix).then(|| capitalize(&prefix))
                })
                .or_else(|| {
                    FALLBACK_KEYWORDS
                        .iter()
                        .find(|kw| key_lower.contains(*kw))
                        .map(|kw| capitalize(kw))
                });

            if let Some(name) = group_name {
                self.claimed[i] = true;
                buckets.push(name, GroupedColumn::plain(&col.key, &col.title));
            }
        }
        buckets
    }

    /// Step 3: compound keys split at the first separator occurrence.
    /// The suffix names the group (through custom mappings when one
    /// matches), the prefix becomes the sub-header.
    fn claim_separator_groups(&mut self) -> GroupBuckets {
        let mut buckets = GroupBuckets::new();

        for (i, col) in self.columns.iter().enumerate() {
            if self.claimed[i] || !self.has_separator(&col.key) {
                continue;
            }
            let separator = self.config.group_separator.as_str();
            let split = col.key.find(separator).expect("separator present");
            let prefix = &col.key[..split];
            let suffix = &col.key[split + separator.len()..];

            let name = self
                .custom_mapping_for(&suffix.to_lowercase())
                .unwrap_or_else(|| suffix.to_string());

            self.claimed[i] = true;
            buckets.push(name, GroupedColumn::prefixed(&col.key, prefix, suffix));
        }
        buckets
    }

    /// Step 4: caller-supplied regex rules, in list order. An invalid
    /// pattern compiles to nothing and never matches.
    fn claim_pattern_groups(&mut self) -> GroupBuckets {
        let compiled: Vec<_> = self
            .config
            .grouping_patterns
            .iter()
            .map(|rule| (Regex::new(&rule.pattern).ok(), rule))
            .collect();

        let mut buckets = GroupBuckets::new();
        for (i, col) in self.columns.iter().enumerate() {
            if self.claimed[i] {
                continue;
            }
            for (regex, rule) in &compiled {
                let Some(regex) = regex else { continue };
                let Some(captures) = regex.captures(&col.key) else { continue };

                let name = rule
                    .group_name
                    .clone()
                    .or_else(|| captures.get(1).map(|m| m.as_str().to_string()))
                    .unwrap_or_else(|| DEFAULT_PATTERN_GROUP.to_string());
                let sub_header = match rule.sub_header {
                    Some(extract) => extract(&col.key),
                    None => col.title.clone(),
                };

                self.claimed[i] = true;
                buckets.push(name, GroupedColumn::plain(&col.key, &sub_header));
                break;
            }
        }
        buckets
    }

    /// Step 5: unclaimed total columns attach to the first group whose
    /// header occurs in their key or title.
    fn fold_totals(&mut self, groups: &mut [ColumnGroup]) {
        for (i, col) in self.columns.iter().enumerate() {
            if self.claimed[i] || !self.is_total_column(col) {
                continue;
            }
            let key_lower = col.key.to_lowercase();
            let title_lower = col.title.to_lowercase();

            for group in groups.iter_mut() {
                let header_lower = group.header.to_lowercase();
                if header_lower.is_empty() {
                    continue;
                }
                if key_lower.contains(&header_lower) || title_lower.contains(&header_lower) {
                    self.claimed[i] = true;
                    group.columns.push(GroupedColumn::total(&col.key, &col.title));
                    break;
                }
            }
        }
    }

    /// Lowercased leading alphabetic runs shared by more than one
    /// unclaimed separator-free column, minus the stoplist.
    fn detect_shared_prefixes(&self) -> FxHashSet<String> {
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for (i, col) in self.columns.iter().enumerate() {
            if self.claimed[i] || self.has_separator(&col.key) {
                continue;
            }
            let prefix = leading_alpha(&col.key).to_lowercase();
            if prefix.is_empty() || PREFIX_STOPLIST.contains(&prefix.as_str()) {
                continue;
            }
            *counts.entry(prefix).or_insert(0) += 1;
        }
        counts.into_iter().filter(|(_, n)| *n > 1).map(|(p, _)| p).collect()
    }

    fn custom_mapping_for(&self, key_lower: &str) -> Option<String> {
        self.config
            .custom_group_mappings
            .iter()
            .find(|m| key_lower.contains(&m.keyword.to_lowercase()))
            .map(|m| m.group_name.clone())
    }

    fn has_separator(&self, key: &str) -> bool {
        let separator = self.config.group_separator.as_str();
        !separator.is_empty() && key.contains(separator)
    }

    fn is_total_column(&self, col: &ColumnDef) -> bool {
        self.config.total_columns.iter().any(|key| key == &col.key)
            || col.key.to_lowercase().contains("total")
            || col.title.to_lowercase().contains("total")
    }
}

// ============================================================================
// GROUP COLLECTION
// ============================================================================

/// Insertion-ordered name → columns buckets. Iteration order is the order
/// in which group names were first seen, which keeps detection stable.
struct GroupBuckets {
    order: Vec<String>,
    index: FxHashMap<String, usize>,
    buckets: Vec<Vec<GroupedColumn>>,
}

impl GroupBuckets {
    fn new() -> Self {
        GroupBuckets { order: Vec::new(), index: FxHashMap::default(), buckets: Vec::new() }
    }

    fn push(&mut self, name: String, column: GroupedColumn) {
        let slot = match self.index.get(&name) {
            Some(&slot) => slot,
            None => {
                let slot = self.buckets.len();
                self.index.insert(name.clone(), slot);
                self.order.push(name);
                self.buckets.push(Vec::new());
                slot
            }
        };
        self.buckets[slot].push(column);
    }

    fn into_iter(self) -> impl Iterator<Item = (String, Vec<GroupedColumn>)> {
        self.order.into_iter().zip(self.buckets)
    }

    fn into_groups(self) -> Vec<ColumnGroup> {
        self.into_iter()
            .map(|(header, columns)| ColumnGroup { header, columns })
            .collect()
    }
}

fn assemble_keyword_groups(buckets: GroupBuckets) -> Vec<ColumnGroup> {
    buckets
        .into_iter()
        .map(|(header, mut columns)| {
            columns.sort_by(|a, b| a.sub_header.cmp(&b.sub_header));
            ColumnGroup { header, columns }
        })
        .collect()
}

fn assemble_separator_groups(buckets: GroupBuckets) -> Vec<ColumnGroup> {
    buckets
        .into_iter()
        .map(|(header, mut columns)| {
            columns.sort_by(|a, b| {
                (&a.group_prefix, &a.group_suffix).cmp(&(&b.group_prefix, &b.group_suffix))
            });
            ColumnGroup { header, columns }
        })
        .collect()
}

// ============================================================================
// STRING HELPERS
// ============================================================================

/// The leading run of ASCII letters in `key`.
fn leading_alpha(key: &str) -> &str {
    let end = key
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(key.len());
    &key[..end]
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
