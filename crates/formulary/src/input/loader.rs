//! Loading tables from paths or in-memory bytes.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{FormularyError, Result};
use crate::table::Table;

use super::parser::{delimiter_format, Parser, ParserConfig};
use super::source::SourceMetadata;
use super::workbook::read_workbook;

/// Kind of source, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text (csv, tsv, psv, txt); the delimiter is detected.
    Delimited,
    /// Spreadsheet workbook read through calamine.
    Workbook,
}

impl SourceFormat {
    /// Format for a file name, by extension. Unknown extensions are treated as text.
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => SourceFormat::Workbook,
            _ => SourceFormat::Delimited,
        }
    }
}

/// Options controlling how a source is read.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Delimited-text parser settings. `max_rows` also bounds workbook reads.
    pub parser: ParserConfig,
    /// Worksheet to read, by name or 0-based index.
    pub sheet: Option<String>,
}

impl LoadOptions {
    /// Select a worksheet by name or index.
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Limit the number of data rows read.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.parser.max_rows = Some(max_rows);
        self
    }
}

/// Load a table from a file on disk.
pub fn load_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<(Table, SourceMetadata)> {
    let path = path.as_ref();
    let (file_name, bytes) = read_path(path)?;
    let format = SourceFormat::from_name(&file_name);

    let (table, metadata) = load_bytes(&file_name, bytes, format, options)?;
    Ok((table, metadata.with_path(path)))
}

/// Read a file, returning its display name and contents.
pub(crate) fn read_path(path: &Path) -> Result<(String, Vec<u8>)> {
    let bytes = std::fs::read(path).map_err(|e| FormularyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    Ok((file_name, bytes))
}

/// Load a table from bytes already in memory.
pub fn load_bytes(
    name: &str,
    bytes: Vec<u8>,
    format: SourceFormat,
    options: &LoadOptions,
) -> Result<(Table, SourceMetadata)> {
    debug!(source = name, size = bytes.len(), ?format, "loading source");

    match format {
        SourceFormat::Delimited => {
            let parser = Parser::with_config(options.parser.clone());
            let (table, delimiter) = parser.parse_bytes(name, &bytes)?;
            let metadata = SourceMetadata::new(
                name,
                &bytes,
                delimiter_format(delimiter),
                table.row_count(),
                table.column_count(),
            );
            info!(
                source = name,
                rows = table.row_count(),
                columns = table.column_count(),
                "loaded delimited source"
            );
            Ok((table, metadata))
        }
        SourceFormat::Workbook => {
            let ext = Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "xlsx".to_string());
            let metadata_bytes = bytes.clone();
            let (table, sheet) = read_workbook(
                name,
                bytes,
                options.sheet.as_deref(),
                options.parser.max_rows,
            )?;
            let metadata = SourceMetadata::new(
                name,
                &metadata_bytes,
                ext,
                table.row_count(),
                table.column_count(),
            )
            .with_sheet(&sheet);
            info!(
                source = name,
                sheet = %sheet,
                rows = table.row_count(),
                columns = table.column_count(),
                "loaded workbook"
            );
            Ok((table, metadata))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_source_format_from_name() {
        assert_eq!(SourceFormat::from_name("data.csv"), SourceFormat::Delimited);
        assert_eq!(SourceFormat::from_name("data.TSV"), SourceFormat::Delimited);
        assert_eq!(SourceFormat::from_name("book.xlsx"), SourceFormat::Workbook);
        assert_eq!(SourceFormat::from_name("book.ods"), SourceFormat::Workbook);
        assert_eq!(SourceFormat::from_name("noext"), SourceFormat::Delimited);
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "a\tb").unwrap();
        writeln!(file, "1\tx").unwrap();

        let (table, metadata) = load_path(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(metadata.format, "tsv");
        assert_eq!(metadata.row_count, 1);
        assert!(metadata.path.is_some());
        assert!(metadata.hash.starts_with("sha256:"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_path("/nonexistent/data.csv", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, FormularyError::Io { .. }));
    }

    #[test]
    fn test_load_bytes_semicolon() {
        let (table, metadata) = load_bytes(
            "euro.csv",
            b"a;b\n1;2\n".to_vec(),
            SourceFormat::Delimited,
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(metadata.format, "csv-semicolon");
    }
}
