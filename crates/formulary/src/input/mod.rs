//! Input parsing and data source handling.

mod infer;
mod loader;
mod parser;
mod source;
mod workbook;

pub use infer::is_null_value;
pub(crate) use infer::{parse_date, parse_datetime};
pub use loader::{load_bytes, load_path, LoadOptions, SourceFormat};
pub(crate) use loader::read_path;
pub use parser::{Parser, ParserConfig};
pub use source::{content_hash, SourceMetadata};
