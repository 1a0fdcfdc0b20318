//! The in-memory table: ordered, equal-length, uniquely named columns.

use std::io::Write;

use indexmap::IndexMap;

use crate::error::{FormularyError, Result};

use super::column::Column;
use super::value::Value;

/// Tabular data held for an editing session.
///
/// Columns keep their insertion order, which is also the export order. Adding
/// and dropping columns is reserved to the crate so that every derived column
/// goes through the edit history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from columns of equal length with unique names.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut map = IndexMap::with_capacity(columns.len());

        for column in columns {
            if column.len() != row_count {
                return Err(FormularyError::Shape(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    row_count
                )));
            }
            if map.contains_key(column.name()) {
                return Err(FormularyError::Shape(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
            map.insert(column.name().to_string(), column);
        }

        Ok(Self {
            columns: map,
            row_count,
        })
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Whether a column with this name exists.
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Iterate over columns in order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.columns.get(column).and_then(|c| c.get(row))
    }

    /// Values of one row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        if row >= self.row_count {
            return None;
        }
        Some(self.columns.values().filter_map(|c| c.get(row)).collect())
    }

    /// The first `n` rows, in column order.
    pub fn head(&self, n: usize) -> Vec<Vec<&Value>> {
        (0..n.min(self.row_count))
            .filter_map(|r| self.row(r))
            .collect()
    }

    /// A new table holding rows `start..=end`.
    pub fn crop(&self, start: usize, end: usize) -> Result<Table> {
        if start > end || end >= self.row_count {
            return Err(FormularyError::Range {
                start,
                end,
                row_count: self.row_count,
            });
        }

        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), col.slice(start, end)))
            .collect();

        Ok(Table {
            columns,
            row_count: end - start + 1,
        })
    }

    /// Append a column.
    pub(crate) fn add_column(&mut self, column: Column) -> Result<()> {
        if self.columns.contains_key(column.name()) {
            return Err(FormularyError::DuplicateName {
                name: column.name().to_string(),
            });
        }
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(FormularyError::Shape(format!(
                "column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.row_count
            )));
        }
        if self.columns.is_empty() {
            self.row_count = column.len();
        }
        self.columns.insert(column.name().to_string(), column);
        Ok(())
    }

    /// Remove a column, keeping the order of the others. Absent names are a no-op.
    pub(crate) fn drop_column(&mut self, name: &str) -> bool {
        self.columns.shift_remove(name).is_some()
    }

    /// Write the table as CSV: a header of column names, then one record per row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);

        csv_writer.write_record(self.columns.keys())?;

        let mut record = Vec::with_capacity(self.columns.len());
        for row in 0..self.row_count {
            record.clear();
            record.extend(
                self.columns
                    .values()
                    .map(|c| c.get(row).map(Value::render).unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush().map_err(|e| FormularyError::Io {
            path: "<export>".into(),
            source: e,
        })?;
        Ok(())
    }

    /// Render the table as a CSV string.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| FormularyError::Config(format!("Export produced invalid UTF-8: {}", e)))
    }
}
