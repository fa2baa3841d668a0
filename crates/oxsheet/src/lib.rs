//! # oxsheet
//!
//! A Rust library for creating and reading OOXML spreadsheets.
//!
//! Oxsheet keeps a typed document model (cells, styles, merged regions,
//! panes, protection) and converts it to and from `.xlsx` packages.
//!
//! ## Features
//!
//! - Typed cell values, including native integer widths, decimals, dates and times
//! - Value-equality styles deduplicated into the package style table
//! - Shared strings, merged cells, auto-filters, frozen and split panes
//! - Sheet and workbook protection, document properties
//! - Import-time type coercion through [`ReadOptions`]
//!
//! ## Example
//!
//! ```rust
//! use oxsheet::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.add_cell("Region", "A1", Some(&Style::new().bold(true))).unwrap();
//! sheet.add_next_cell("Total", None).unwrap();
//! sheet.add_cell(1250.5, "B2", None).unwrap();
//! sheet.add_cell_formula("SUM(B2:B9)", "B10", None).unwrap();
//!
//! // Save to file
//! // workbook.save("report.xlsx").unwrap();
//! ```

pub mod prelude;

use std::path::Path;

use thiserror::Error;

// Re-export core types
pub use oxsheet_core::{
    legacy_password_hash, Alignment, BorderEdge, BorderLineStyle, BorderStyle, Cell,
    CellAddress, CellDirection, CellRange, CellType, CellValue, CellXf, Color, ColumnMeta,
    ErrorKind, FillStyle, FontStyle, HorizontalAlignment, Number, NumberFormat, PaneState,
    PatternType, ProtectionAction, RowMeta, SharedString, SharedStringTable, SheetProtection,
    SheetView, Style, StyleRegistry, VerticalAlignment, Workbook, WorkbookMetadata,
    WorkbookProtection, WorkbookSettings, Worksheet, WorksheetPane, MAX_COLS, MAX_ROWS,
    MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use oxsheet_xlsx::{
    ColumnCoercion, GlobalCoercion, MemoryPackage, PartSink, PartSource, ReadOptions, XlsxError,
    XlsxReader, XlsxWriter,
};

/// Errors from file-level operations
#[derive(Debug, Error)]
pub enum Error {
    /// Document model error
    #[error(transparent)]
    Core(#[from] oxsheet_core::Error),

    /// Package read/write error
    #[error(transparent)]
    Xlsx(#[from] XlsxError),

    /// The path does not name a supported format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Map onto the document model's error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Core(e) => e.kind(),
            Error::Xlsx(e) => e.kind(),
            Error::UnsupportedFormat(_) => ErrorKind::Io,
        }
    }
}

/// Result type for file-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt: Sized {
    /// Open a workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &ReadOptions::default())
    }

    /// Open a workbook from a file, applying import options
    fn open_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self>;

    /// Save the workbook to a file
    ///
    /// Saving resolves merged regions and recalculates column and
    /// auto-filter metadata, hence `&mut self`.
    fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()>;
}

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") => Ok(()),
        _ => Err(Error::UnsupportedFormat(path.display().to_string())),
    }
}

impl WorkbookExt for Workbook {
    fn open_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Workbook> {
        let path = path.as_ref();
        check_extension(path)?;
        Ok(XlsxReader::read_file_with_options(path, options)?)
    }

    fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        check_extension(path)?;
        Ok(XlsxWriter::write_file(self, path)?)
    }
}
