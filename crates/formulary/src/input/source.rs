//! Source metadata for loaded tables.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata about the source a table was loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file, when loaded from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// SHA-256 hash of the source bytes.
    pub hash: String,
    /// Source size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, xlsx, etc.).
    pub format: String,
    /// Worksheet the table was read from, for workbooks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the source was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a source that has just been parsed.
    pub(crate) fn new(
        file: impl Into<String>,
        bytes: &[u8],
        format: impl Into<String>,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        Self {
            file: file.into(),
            path: None,
            hash: content_hash(bytes),
            size_bytes: bytes.len() as u64,
            format: format.into(),
            sheet: None,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }

    /// Record the path the bytes came from.
    pub(crate) fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    /// Record the worksheet the table was read from.
    pub(crate) fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Whether two sources have the same content and sheet selection.
    pub fn same_source(&self, other: &SourceMetadata) -> bool {
        self.hash == other.hash && self.sheet == other.sheet
    }
}

/// `sha256:<hex>` digest of the source bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash(b"a,b\n1,2\n"), content_hash(b"a,b\n1,2\n"));
        assert_ne!(content_hash(b"a,b\n1,2\n"), content_hash(b"a,b\n1,3\n"));
        assert!(content_hash(b"").starts_with("sha256:"));
    }

    #[test]
    fn test_same_source_considers_sheet() {
        let a = SourceMetadata::new("x.xlsx", b"bytes", "xlsx", 1, 1).with_sheet("One");
        let b = SourceMetadata::new("x.xlsx", b"bytes", "xlsx", 1, 1).with_sheet("Two");
        assert!(!a.same_source(&b));
        assert!(a.same_source(&a.clone()));
    }
}
