//! FILENAME: grouping/src/definition.rs
//! Column Grouping Definition - The serializable configuration.
//!
//! This module describes HOW a flat column list should be clustered into
//! named header groups: explicit exclusions, keyword mappings, the
//! separator naming convention, and custom regex rules. Rule order matters
//! (first match wins), so every rule collection here is an ordered list.

use serde::{Deserialize, Serialize};

/// A column of the source table, as the grid renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Field key in the data records.
    pub key: String,

    /// Display title.
    pub title: String,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        ColumnDef { key: key.into(), title: title.into() }
    }

    /// Column whose title is just its key.
    pub fn from_key(key: impl Into<String>) -> Self {
        let key = key.into();
        ColumnDef { title: key.clone(), key }
    }
}

/// Maps a keyword (substring, case-insensitive) to a group display name.
/// Entries are tried in list order; the first match claims the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMapping {
    pub keyword: String,
    pub group_name: String,
}

impl KeywordMapping {
    pub fn new(keyword: impl Into<String>, group_name: impl Into<String>) -> Self {
        KeywordMapping { keyword: keyword.into(), group_name: group_name.into() }
    }
}

/// A custom regex rule. The pattern travels as a source string so the
/// config stays serializable; it is compiled at detection time and an
/// invalid pattern simply never matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingPattern {
    /// Regex source tested against the column key.
    pub pattern: String,

    /// Group name. When absent, the first capture group names the group,
    /// falling back to the literal "Group".
    #[serde(default)]
    pub group_name: Option<String>,

    /// Optional sub-header extractor. Only settable in code; when absent
    /// the column title is used.
    #[serde(skip)]
    pub sub_header: Option<fn(&str) -> String>,
}

impl GroupingPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        GroupingPattern { pattern: pattern.into(), group_name: None, sub_header: None }
    }

    pub fn named(pattern: impl Into<String>, group_name: impl Into<String>) -> Self {
        GroupingPattern {
            pattern: pattern.into(),
            group_name: Some(group_name.into()),
            sub_header: None,
        }
    }
}

/// The complete, serializable grouping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Separator of compound column keys (`prefix__suffix`).
    #[serde(default = "default_separator")]
    pub group_separator: String,

    /// Keys excluded from grouping entirely.
    #[serde(default)]
    pub ungrouped_columns: Vec<String>,

    /// Keys treated as total columns during folding.
    #[serde(default)]
    pub total_columns: Vec<String>,

    /// Custom regex rules, tried in list order.
    #[serde(default)]
    pub grouping_patterns: Vec<GroupingPattern>,

    /// Keyword → group name mappings, tried in list order.
    #[serde(default)]
    pub custom_group_mappings: Vec<KeywordMapping>,
}

fn default_separator() -> String {
    "__".to_string()
}

impl Default for GroupConfig {
    fn default() -> Self {
        GroupConfig {
            group_separator: default_separator(),
            ungrouped_columns: Vec::new(),
            total_columns: Vec::new(),
            grouping_patterns: Vec::new(),
            custom_group_mappings: Vec::new(),
        }
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// One column placed inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedColumn {
    /// Key of the source column.
    pub original_key: String,

    /// Header shown under the group header. For separator groups this is
    /// the key prefix (the part that distinguishes columns in the group).
    pub sub_header: String,

    /// Prefix before the separator, for separator-derived groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_prefix: Option<String>,

    /// Suffix after the separator, for separator-derived groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_suffix: Option<String>,

    /// True when folded in as a total column.
    #[serde(default)]
    pub is_total: bool,
}

impl GroupedColumn {
    /// Column claimed by a keyword or regex rule.
    pub(crate) fn plain(key: &str, sub_header: &str) -> Self {
        GroupedColumn {
            original_key: key.to_string(),
            sub_header: sub_header.to_string(),
            group_prefix: None,
            group_suffix: None,
            is_total: false,
        }
    }

    /// Column claimed by the separator convention.
    pub(crate) fn prefixed(key: &str, prefix: &str, suffix: &str) -> Self {
        GroupedColumn {
            original_key: key.to_string(),
            sub_header: prefix.to_string(),
            group_prefix: Some(prefix.to_string()),
            group_suffix: Some(suffix.to_string()),
            is_total: false,
        }
    }

    /// Column folded in as a total.
    pub(crate) fn total(key: &str, sub_header: &str) -> Self {
        GroupedColumn {
            original_key: key.to_string(),
            sub_header: sub_header.to_string(),
            group_prefix: None,
            group_suffix: None,
            is_total: true,
        }
    }
}

/// A named cluster of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub header: String,
    pub columns: Vec<GroupedColumn>,
}

/// The full detection output: groups plus the complement set of columns
/// that matched no rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroupResult {
    pub groups: Vec<ColumnGroup>,
    pub ungrouped_columns: Vec<ColumnDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_from_empty_json() {
        let config: GroupConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.group_separator, "__");
        assert!(config.custom_group_mappings.is_empty());
    }

    #[test]
    fn pattern_extractor_is_skipped_by_serde() {
        let mut pattern = GroupingPattern::named("^x", "X");
        pattern.sub_header = Some(|key| key.to_uppercase());
        let json = serde_json::to_string(&pattern).unwrap();
        let back: GroupingPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pattern, "^x");
        assert_eq!(back.group_name.as_deref(), Some("X"));
        assert!(back.sub_header.is_none());
    }
}
