//! Prelude module - common imports for oxsheet users
//!
//! ```rust
//! use oxsheet::prelude::*;
//! ```

pub use crate::{
    // Style types
    Alignment,
    BorderEdge,
    BorderLineStyle,
    BorderStyle,
    // Cell types
    CellAddress,
    CellRange,
    CellType,
    CellValue,
    Color,
    // Import options
    ColumnCoercion,
    // Error types
    Error,
    ErrorKind,
    FillStyle,
    FontStyle,
    GlobalCoercion,
    HorizontalAlignment,
    Number,
    NumberFormat,
    ProtectionAction,
    ReadOptions,
    Result,
    Style,
    VerticalAlignment,
    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    WorkbookMetadata,
    WorkbookProtection,
    Worksheet,
    WorksheetPane,
    // I/O types
    XlsxReader,
    XlsxWriter,
};
