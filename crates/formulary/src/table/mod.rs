//! Table store: typed columns, cropping and CSV export.

mod column;
#[allow(clippy::module_inception)]
mod table;
mod value;

pub use column::Column;
pub use table::Table;
pub use value::{ColumnType, Value};
