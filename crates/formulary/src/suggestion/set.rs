//! Suggestion set types.

use serde::Serialize;

/// A proposed derived column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedColumnSuggestion {
    /// Name for the new column.
    pub name: String,
    /// Formula computing the column.
    pub formula: String,
    /// What the column represents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A proposed flag rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagRuleSuggestion {
    /// Boolean rule expression.
    pub rule: String,
    /// What the rule flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Validated suggestions, consumed entry by entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestionSet {
    pub derived_columns: Vec<DerivedColumnSuggestion>,
    pub flag_rules: Vec<FlagRuleSuggestion>,
}

impl SuggestionSet {
    /// A set with no suggestions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether there is nothing to suggest.
    pub fn is_empty(&self) -> bool {
        self.derived_columns.is_empty() && self.flag_rules.is_empty()
    }

    /// Total number of suggestions.
    pub fn len(&self) -> usize {
        self.derived_columns.len() + self.flag_rules.len()
    }

    pub fn derived_column(&self, index: usize) -> Option<&DerivedColumnSuggestion> {
        self.derived_columns.get(index)
    }

    pub fn flag_rule(&self, index: usize) -> Option<&FlagRuleSuggestion> {
        self.flag_rules.get(index)
    }
}
