pub mod table;
pub mod types;

pub use table::{Table, DEFAULT_PREVIEW_ROWS};
pub use types::*;
