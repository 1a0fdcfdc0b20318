//! Records of applied edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of every flag column name.
pub const FLAG_PREFIX: &str = "Flag_";

/// Column name for a flag rule: `Flag_` followed by the trimmed rule text.
pub fn flag_column_name(rule: &str) -> String {
    format!("{}{}", FLAG_PREFIX, rule.trim())
}

/// A derived column added by formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumnRecord {
    /// Name of the column in the table.
    pub name: String,
    /// Formula the column was computed from.
    pub formula: String,
    /// Free-text explanation, usually from a suggestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the column was added.
    pub applied_at: DateTime<Utc>,
    /// Position in the overall edit order.
    pub sequence: u64,
}

/// A boolean flag rule added as a `Flag_` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagRuleRecord {
    /// The rule expression.
    pub rule: String,
    /// Free-text explanation, usually from a suggestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the rule was applied.
    pub applied_at: DateTime<Utc>,
    /// Position in the overall edit order.
    pub sequence: u64,
}

impl FlagRuleRecord {
    /// Name of the column holding this rule's results.
    pub fn column_name(&self) -> String {
        flag_column_name(&self.rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_column_name() {
        assert_eq!(flag_column_name("Total > 100"), "Flag_Total > 100");
        assert_eq!(flag_column_name("  Total > 100 "), "Flag_Total > 100");
        assert_eq!(flag_column_name("a, b"), "Flag_a, b");
    }
}
