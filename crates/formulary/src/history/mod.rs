//! Edit history: the ordered record of derived columns and flag rules.
//!
//! The [`Ledger`] is the only way columns are added to or removed from a loaded
//! table. Every apply either succeeds completely (column and record are both
//! added) or leaves the table and ledger exactly as they were.

mod ledger;
mod record;

pub use ledger::{Divergence, EntryKind, Ledger, ReplayFailure, ReplayReport};
pub use record::{flag_column_name, DerivedColumnRecord, FlagRuleRecord, FLAG_PREFIX};
