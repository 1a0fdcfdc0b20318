//! The edit ledger and its apply/remove/replay operations.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FormularyError, Result};
use crate::expr::Expression;
use crate::table::{ColumnType, Table};

use super::record::{flag_column_name, DerivedColumnRecord, FlagRuleRecord, FLAG_PREFIX};

/// Ordered history of derived columns and flag rules applied to a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    derived_columns: Vec<DerivedColumnRecord>,
    flag_rules: Vec<FlagRuleRecord>,
    #[serde(default)]
    next_sequence: u64,
}

/// A way in which the ledger and the table disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Divergence {
    /// A derived column record has no column.
    MissingColumn { name: String },
    /// A flag rule record has no flag column.
    MissingFlagColumn { rule: String },
    /// A flag column holds non-boolean values.
    FlagNotBoolean { column: String },
    /// Two records claim the same column.
    DuplicateRecord { name: String },
    /// A `Flag_` column that no rule record accounts for, such as a flag
    /// carried in from a re-loaded export.
    UnrecordedFlagColumn { column: String },
}

/// Which kind of entry a replay failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    DerivedColumn,
    FlagRule,
}

/// An entry that could not be re-applied.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayFailure {
    pub kind: EntryKind,
    /// Column name or rule text.
    pub target: String,
    pub error: String,
}

/// Outcome of replaying a ledger onto a fresh table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub applied_columns: usize,
    pub applied_rules: usize,
    pub failures: Vec<ReplayFailure>,
}

impl ReplayReport {
    /// Whether every entry was re-applied.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived column records in the order they were applied.
    pub fn derived_columns(&self) -> &[DerivedColumnRecord] {
        &self.derived_columns
    }

    /// Flag rule records in the order they were applied.
    pub fn flag_rules(&self) -> &[FlagRuleRecord] {
        &self.flag_rules
    }

    /// Whether nothing has been applied.
    pub fn is_empty(&self) -> bool {
        self.derived_columns.is_empty() && self.flag_rules.is_empty()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.derived_columns.len() + self.flag_rules.len()
    }

    /// Whether a derived column with this name is recorded.
    pub fn has_derived_column(&self, name: &str) -> bool {
        self.derived_columns.iter().any(|r| r.name == name.trim())
    }

    /// Whether this flag rule is recorded.
    pub fn has_flag_rule(&self, rule: &str) -> bool {
        self.flag_rules.iter().any(|r| r.rule == rule.trim())
    }

    pub(crate) fn clear(&mut self) {
        self.derived_columns.clear();
        self.flag_rules.clear();
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Evaluate `formula` and add its result as column `name`.
    ///
    /// On any failure the table and the ledger are left unchanged.
    pub fn apply_derived_column(
        &mut self,
        table: &mut Table,
        name: &str,
        formula: &str,
        description: Option<String>,
    ) -> Result<&DerivedColumnRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FormularyError::InvalidName {
                name: name.to_string(),
                reason: "column name is empty".into(),
            });
        }
        if name.starts_with(FLAG_PREFIX) {
            return Err(FormularyError::InvalidName {
                name: name.to_string(),
                reason: format!("the '{}' prefix is reserved for flag rules", FLAG_PREFIX),
            });
        }
        if table.contains_column(name) {
            return Err(FormularyError::DuplicateName {
                name: name.to_string(),
            });
        }

        let expression = Expression::parse(formula)?;
        let series = expression.evaluate(table)?;
        table.add_column(series.into_column(name))?;

        let record = DerivedColumnRecord {
            name: name.to_string(),
            formula: expression.text().to_string(),
            description,
            applied_at: Utc::now(),
            sequence: self.take_sequence(),
        };
        info!(column = %record.name, formula = %record.formula, "applied derived column");
        self.derived_columns.push(record);
        Ok(&self.derived_columns[self.derived_columns.len() - 1])
    }

    /// Evaluate a boolean rule and add its result as column `Flag_<rule>`.
    ///
    /// On any failure the table and the ledger are left unchanged.
    pub fn apply_flag_rule(
        &mut self,
        table: &mut Table,
        rule: &str,
        description: Option<String>,
    ) -> Result<&FlagRuleRecord> {
        let rule = rule.trim();
        if self.has_flag_rule(rule) {
            return Err(FormularyError::DuplicateRule {
                rule: rule.to_string(),
            });
        }
        let column_name = flag_column_name(rule);
        if table.contains_column(&column_name) {
            return Err(FormularyError::DuplicateName { name: column_name });
        }

        let expression = Expression::parse(rule)?;
        let series = expression.evaluate(table)?;
        if !series.is_boolean() {
            return Err(FormularyError::type_mismatch(format!(
                "flag rule '{}' must produce boolean values, got {}",
                rule,
                series.column_type()
            )));
        }
        table.add_column(series.into_column(column_name.as_str()))?;

        let record = FlagRuleRecord {
            rule: rule.to_string(),
            description,
            applied_at: Utc::now(),
            sequence: self.take_sequence(),
        };
        info!(rule = %record.rule, column = %column_name, "applied flag rule");
        self.flag_rules.push(record);
        Ok(&self.flag_rules[self.flag_rules.len() - 1])
    }

    /// Drop a derived column and its record. Columns without a record are left alone.
    pub fn remove_derived_column(&mut self, table: &mut Table, name: &str) -> bool {
        let name = name.trim();
        let Some(index) = self.derived_columns.iter().position(|r| r.name == name) else {
            debug!(column = name, "no derived column to remove");
            return false;
        };
        table.drop_column(name);
        self.derived_columns.remove(index);
        info!(column = name, "removed derived column");
        true
    }

    /// Drop a flag rule and its column. Unknown rules are a no-op.
    pub fn remove_flag_rule(&mut self, table: &mut Table, rule: &str) -> bool {
        let rule = rule.trim();
        let Some(index) = self.flag_rules.iter().position(|r| r.rule == rule) else {
            debug!(rule, "no flag rule to remove");
            return false;
        };
        table.drop_column(&flag_column_name(rule));
        self.flag_rules.remove(index);
        info!(rule, "removed flag rule");
        true
    }

    /// Check that every record has its column in the table and that every
    /// flag column has its record.
    pub fn verify(&self, table: &Table) -> Vec<Divergence> {
        let mut divergences = Vec::new();
        let mut claimed: Vec<String> = Vec::with_capacity(self.len());

        for record in &self.derived_columns {
            if !table.contains_column(&record.name) {
                divergences.push(Divergence::MissingColumn {
                    name: record.name.clone(),
                });
            }
            if claimed.contains(&record.name) {
                divergences.push(Divergence::DuplicateRecord {
                    name: record.name.clone(),
                });
            }
            claimed.push(record.name.clone());
        }

        for record in &self.flag_rules {
            let column_name = record.column_name();
            match table.column(&column_name) {
                None => divergences.push(Divergence::MissingFlagColumn {
                    rule: record.rule.clone(),
                }),
                Some(column)
                    if !matches!(
                        column.column_type(),
                        ColumnType::Boolean | ColumnType::Unknown
                    ) =>
                {
                    divergences.push(Divergence::FlagNotBoolean {
                        column: column_name.clone(),
                    });
                }
                Some(_) => {}
            }
            if claimed.contains(&column_name) {
                divergences.push(Divergence::DuplicateRecord {
                    name: column_name.clone(),
                });
            }
            claimed.push(column_name);
        }

        for name in table.column_names() {
            if name.starts_with(FLAG_PREFIX) && !claimed.contains(&name) {
                divergences.push(Divergence::UnrecordedFlagColumn { column: name });
            }
        }

        divergences
    }

    /// Re-apply every record, in the original order, to a copy of `source`.
    ///
    /// Entries that no longer apply (a referenced column disappeared, a name now
    /// clashes with a source column) are skipped and listed in the report; the
    /// returned ledger holds only the entries that succeeded.
    pub fn replay(&self, source: &Table) -> (Table, Ledger, ReplayReport) {
        let mut table = source.clone();
        let mut ledger = Ledger::new();
        let mut report = ReplayReport::default();

        let mut steps: Vec<(u64, Step<'_>)> = self
            .derived_columns
            .iter()
            .map(|r| (r.sequence, Step::Derived(r)))
            .chain(self.flag_rules.iter().map(|r| (r.sequence, Step::Flag(r))))
            .collect();
        steps.sort_by_key(|(sequence, _)| *sequence);

        for (_, step) in steps {
            match step {
                Step::Derived(record) => {
                    match ledger.apply_derived_column(
                        &mut table,
                        &record.name,
                        &record.formula,
                        record.description.clone(),
                    ) {
                        Ok(_) => report.applied_columns += 1,
                        Err(e) => {
                            warn!(column = %record.name, error = %e, "derived column no longer applies");
                            report.failures.push(ReplayFailure {
                                kind: EntryKind::DerivedColumn,
                                target: record.name.clone(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
                Step::Flag(record) => {
                    match ledger.apply_flag_rule(&mut table, &record.rule, record.description.clone()) {
                        Ok(_) => report.applied_rules += 1,
                        Err(e) => {
                            warn!(rule = %record.rule, error = %e, "flag rule no longer applies");
                            report.failures.push(ReplayFailure {
                                kind: EntryKind::FlagRule,
                                target: record.rule.clone(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        (table, ledger, report)
    }
}

enum Step<'a> {
    Derived(&'a DerivedColumnRecord),
    Flag(&'a FlagRuleRecord),
}
