//! In-memory tabular layer: Windows-1252 CSV decoding, set-membership row
//! filtering and per-kind canonical projection.

pub mod reader;
pub mod select;
pub mod table;

pub use reader::read_table;
pub use select::{canonical_columns, filter_in, project, SelectError, COMPLETE_EXPENSE_NATURE};
pub use table::{Table, TabularError};

pub const CRATE_NAME: &str = "verba-tabular";
