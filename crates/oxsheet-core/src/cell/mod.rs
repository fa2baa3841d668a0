//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`Cell`] - Value, resolved type and style of a stored cell
//! - [`SharedStringTable`] - Interned string payloads for serialization

mod address;
mod shared_strings;
mod storage;
mod value;

pub use address::{CellAddress, CellRange, RangeCells};
pub use shared_strings::SharedStringTable;
pub use storage::{CellStorage, RowMeta, DEFAULT_ROW_HEIGHT, MAX_ROW_HEIGHT};
pub use value::{Cell, CellType, CellValue, Number, SharedString};

pub(crate) use storage::{shift_range_cols, shift_range_rows};
