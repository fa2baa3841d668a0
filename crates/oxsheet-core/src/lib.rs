//! # oxsheet-core
//!
//! Core document model for the oxsheet spreadsheet library.
//!
//! This crate provides the types the OOXML codec reads and writes:
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`CellValue`] and [`Cell`] - Values and their resolved types
//! - [`Style`] and [`StyleRegistry`] - Value-equality styles with stable ids
//! - [`SharedStringTable`] - Interned string payloads
//! - [`Workbook`], [`Worksheet`] - The document structures
//!
//! ## Example
//!
//! ```rust
//! use oxsheet_core::{CellRange, Style, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.add_cell("Region", "A1", Some(&Style::new().bold(true))).unwrap();
//! sheet.add_next_cell("Total", None).unwrap();
//! sheet.add_cell(1250.5, "B2", None).unwrap();
//! sheet.merge_cells(&CellRange::parse("C1:D1").unwrap()).unwrap();
//!
//! assert_eq!(sheet.get_value("B1").unwrap().as_string(), Some("Total"));
//! ```

pub mod cell;
pub mod column;
pub mod date;
pub mod error;
pub mod protection;
pub mod style;
pub mod view;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{
    Cell, CellAddress, CellRange, CellType, CellValue, Number, RowMeta, SharedString,
    SharedStringTable,
};
pub use column::ColumnMeta;
pub use error::{Error, ErrorKind, Result};
pub use protection::{legacy_password_hash, ProtectionAction, SheetProtection, WorkbookProtection};
pub use view::{CellDirection, PaneState, SheetView, WorksheetPane};
pub use workbook::{Workbook, WorkbookMetadata, WorkbookSettings};
pub use worksheet::Worksheet;

// Re-export all style types for convenience
pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, CellXf, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Style, StyleRegistry, VerticalAlignment,
};

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
