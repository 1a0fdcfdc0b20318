//! Suggested derived columns and flag rules from an external source.
//!
//! Suggestion data is untrusted. [`validate`] turns it into a [`SuggestionSet`]
//! only when every entry is well formed; nothing is applied until the user picks
//! an entry by index.

mod set;
mod validate;

pub use set::{DerivedColumnSuggestion, FlagRuleSuggestion, SuggestionSet};
pub use validate::{extract_json, validate, validate_str};
