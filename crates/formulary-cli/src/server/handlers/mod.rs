//! API request handlers.

mod columns;
mod export;
mod flags;
mod suggestions;
mod table;

pub use columns::*;
pub use export::*;
pub use flags::*;
pub use suggestions::*;
pub use table::*;
