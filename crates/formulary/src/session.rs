//! Session: the loaded table, where it came from, and its edit history.

use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{FormularyError, Result};
use crate::expr::{self, Series};
use crate::history::{DerivedColumnRecord, FlagRuleRecord, Ledger, ReplayReport};
use crate::input::{self, content_hash, LoadOptions, SourceFormat, SourceMetadata};
use crate::llm::LlmProvider;
use crate::suggestion::{self, SuggestionSet};
use crate::table::Table;

/// Configuration for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// How sources are read.
    pub load: LoadOptions,
}

impl SessionConfig {
    /// Use the given load options.
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }
}

/// What a load call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A new table replaced the previous one and the history was cleared.
    Loaded,
    /// The source matched the loaded one; nothing changed.
    Unchanged,
}

/// A working session over one table.
///
/// The table is only ever changed through the session's ledger operations, so
/// the history always describes how the current columns came to be.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: SessionConfig,
    table: Option<Table>,
    source: Option<SourceMetadata>,
    ledger: Ledger,
}

impl Session {
    /// Create an empty session with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session with custom configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Load a file. Reloading the same content is a no-op.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<LoadOutcome> {
        let path = path.as_ref();
        let (file_name, bytes) = input::read_path(path)?;
        if self.is_loaded_source(&bytes) {
            debug!(path = %path.display(), "source unchanged, keeping session");
            return Ok(LoadOutcome::Unchanged);
        }

        let format = SourceFormat::from_name(&file_name);
        let (table, metadata) = input::load_bytes(&file_name, bytes, format, &self.config.load)?;
        self.replace(table, metadata.with_path(path));
        Ok(LoadOutcome::Loaded)
    }

    /// Load in-memory bytes. Reloading the same content is a no-op.
    pub fn load_bytes(
        &mut self,
        name: &str,
        bytes: Vec<u8>,
        format: SourceFormat,
    ) -> Result<LoadOutcome> {
        if self.is_loaded_source(&bytes) {
            debug!(source = name, "source unchanged, keeping session");
            return Ok(LoadOutcome::Unchanged);
        }

        let (table, metadata) = input::load_bytes(name, bytes, format, &self.config.load)?;
        self.replace(table, metadata);
        Ok(LoadOutcome::Loaded)
    }

    /// Re-read a source and re-apply the history to it.
    ///
    /// With no path the current source's path is used. Entries that no longer
    /// apply are dropped and listed in the report.
    pub fn reload_and_replay(&mut self, path: Option<&Path>) -> Result<ReplayReport> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self
                .source
                .as_ref()
                .and_then(|s| s.path.clone())
                .ok_or_else(|| {
                    FormularyError::Config("the loaded source has no path to reload".to_string())
                })?,
        };

        let (table, metadata) = input::load_path(&path, &self.config.load)?;
        let (table, ledger, report) = self.ledger.replay(&table);
        if !report.is_clean() {
            warn!(
                failures = report.failures.len(),
                "some history entries were dropped on reload"
            );
        }
        info!(
            path = %path.display(),
            columns = report.applied_columns,
            rules = report.applied_rules,
            "reloaded and replayed"
        );

        self.table = Some(table);
        self.source = Some(metadata);
        self.ledger = ledger;
        Ok(report)
    }

    fn is_loaded_source(&self, bytes: &[u8]) -> bool {
        self.table.is_some()
            && self
                .source
                .as_ref()
                .is_some_and(|s| s.hash == content_hash(bytes))
    }

    fn replace(&mut self, table: Table, metadata: SourceMetadata) {
        if !self.ledger.is_empty() {
            debug!(entries = self.ledger.len(), "clearing history for new source");
        }
        self.ledger.clear();
        self.table = Some(table);
        self.source = Some(metadata);
    }

    /// The loaded table.
    pub fn table(&self) -> Result<&Table> {
        self.table.as_ref().ok_or(FormularyError::NoTableLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// Where the loaded table came from.
    pub fn source(&self) -> Option<&SourceMetadata> {
        self.source.as_ref()
    }

    /// Column names in display order.
    pub fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.table()?.column_names())
    }

    /// Keep only rows `start..=end`.
    pub fn crop(&mut self, start: usize, end: usize) -> Result<&Table> {
        let cropped = self.table()?.crop(start, end)?;
        info!(start, end, rows = cropped.row_count(), "cropped table");
        let table = self.table.insert(cropped);
        Ok(table)
    }

    /// Evaluate an expression without changing anything.
    pub fn evaluate(&self, expression: &str) -> Result<Series> {
        expr::evaluate(self.table()?, expression)
    }

    /// Add a derived column computed from `formula`.
    pub fn apply_derived_column(
        &mut self,
        name: &str,
        formula: &str,
        description: Option<String>,
    ) -> Result<&DerivedColumnRecord> {
        let table = self.table.as_mut().ok_or(FormularyError::NoTableLoaded)?;
        self.ledger
            .apply_derived_column(table, name, formula, description)
    }

    /// Add a boolean flag column for `rule`.
    pub fn apply_flag_rule(
        &mut self,
        rule: &str,
        description: Option<String>,
    ) -> Result<&FlagRuleRecord> {
        let table = self.table.as_mut().ok_or(FormularyError::NoTableLoaded)?;
        self.ledger.apply_flag_rule(table, rule, description)
    }

    /// Apply the derived column at `index` of a validated suggestion set.
    pub fn apply_suggested_column(
        &mut self,
        suggestions: &SuggestionSet,
        index: usize,
    ) -> Result<&DerivedColumnRecord> {
        let suggestion =
            suggestions
                .derived_column(index)
                .ok_or(FormularyError::SuggestionIndex {
                    kind: "derived column",
                    index,
                    available: suggestions.derived_columns.len(),
                })?;
        self.apply_derived_column(
            &suggestion.name,
            &suggestion.formula,
            suggestion.description.clone(),
        )
    }

    /// Apply the flag rule at `index` of a validated suggestion set.
    pub fn apply_suggested_rule(
        &mut self,
        suggestions: &SuggestionSet,
        index: usize,
    ) -> Result<&FlagRuleRecord> {
        let suggestion = suggestions
            .flag_rule(index)
            .ok_or(FormularyError::SuggestionIndex {
                kind: "flag rule",
                index,
                available: suggestions.flag_rules.len(),
            })?;
        self.apply_flag_rule(&suggestion.rule, suggestion.description.clone())
    }

    /// Remove a derived column. Returns whether anything was removed.
    pub fn remove_derived_column(&mut self, name: &str) -> Result<bool> {
        let table = self.table.as_mut().ok_or(FormularyError::NoTableLoaded)?;
        Ok(self.ledger.remove_derived_column(table, name))
    }

    /// Remove a flag rule and its column. Returns whether anything was removed.
    pub fn remove_flag_rule(&mut self, rule: &str) -> Result<bool> {
        let table = self.table.as_mut().ok_or(FormularyError::NoTableLoaded)?;
        Ok(self.ledger.remove_flag_rule(table, rule))
    }

    /// Everything applied since the source was loaded.
    pub fn history(&self) -> &Ledger {
        &self.ledger
    }

    /// Ask a provider for suggestions and validate them.
    pub fn suggest(&self, provider: &dyn LlmProvider, query: &str) -> Result<SuggestionSet> {
        let columns = self.column_names()?;
        suggest_with(provider, query, &columns)
    }

    /// Write the table as CSV.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        self.table()?.write_csv(writer)
    }

    /// The table as a CSV string.
    pub fn export_csv_string(&self) -> Result<String> {
        self.table()?.to_csv_string()
    }

    /// Drop the table, its source and its history.
    pub fn clear(&mut self) {
        self.table = None;
        self.source = None;
        self.ledger.clear();
    }
}

/// Ask a provider for suggestions over the given columns and validate them.
///
/// Used directly by callers that must not hold the session while the provider
/// is working.
pub fn suggest_with(
    provider: &dyn LlmProvider,
    query: &str,
    columns: &[String],
) -> Result<SuggestionSet> {
    info!(provider = provider.name(), query, "requesting suggestions");
    let raw = provider.suggest_operations(query, columns)?;
    suggestion::validate(&raw)
}
