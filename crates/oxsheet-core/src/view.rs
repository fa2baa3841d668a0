//! Worksheet view state: panes, splits and display options

use std::fmt;
use std::str::FromStr;

use crate::cell::CellAddress;
use crate::error::Error;

/// Smallest zoom factor in percent
pub const MIN_ZOOM: u16 = 10;

/// Largest zoom factor in percent
pub const MAX_ZOOM: u16 = 400;

/// Pane of a split window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorksheetPane {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

impl WorksheetPane {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorksheetPane::BottomLeft => "bottomLeft",
            WorksheetPane::BottomRight => "bottomRight",
            WorksheetPane::TopLeft => "topLeft",
            WorksheetPane::TopRight => "topRight",
        }
    }
}

impl fmt::Display for WorksheetPane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorksheetPane {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "bottomLeft" => Ok(WorksheetPane::BottomLeft),
            "bottomRight" => Ok(WorksheetPane::BottomRight),
            "topLeft" => Ok(WorksheetPane::TopLeft),
            "topRight" => Ok(WorksheetPane::TopRight),
            other => Err(Error::worksheet(format!("unknown pane '{}'", other))),
        }
    }
}

/// Split and freeze state of a worksheet window
///
/// Two mutually exclusive encodings exist:
/// - a length split, with explicit `split_left_width`/`split_top_height`
///   in points, and `split_address`/`freeze` unset;
/// - a cell split, with `split_address` holding the column/row counts and
///   `freeze` set, and both lengths unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaneState {
    pub split_top_height: Option<f32>,
    pub split_left_width: Option<f32>,
    pub split_address: Option<CellAddress>,
    pub freeze: Option<bool>,
    /// First visible cell of the bottom-right pane
    pub top_left_cell: Option<CellAddress>,
    pub active_pane: Option<WorksheetPane>,
}

impl PaneState {
    /// Check if any split is defined
    pub fn has_split(&self) -> bool {
        self.split_top_height.is_some()
            || self.split_left_width.is_some()
            || self.split_address.is_some()
    }

    /// Check if the split is a frozen one
    pub fn is_frozen(&self) -> bool {
        self.freeze == Some(true)
    }
}

/// Display options of the worksheet window
#[derive(Debug, Clone, PartialEq)]
pub struct SheetView {
    pub pane: PaneState,
    pub show_grid_lines: bool,
    pub show_row_col_headers: bool,
    /// Zoom factor in percent
    pub zoom: u16,
}

impl Default for SheetView {
    fn default() -> Self {
        Self {
            pane: PaneState::default(),
            show_grid_lines: true,
            show_row_col_headers: true,
            zoom: 100,
        }
    }
}

impl SheetView {
    /// Whether anything differs from a plain default view
    pub fn is_default(&self) -> bool {
        *self == SheetView::default()
    }
}

/// Direction the cell cursor advances after a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellDirection {
    /// Move to the next column in the same row
    #[default]
    ColumnToColumn,
    /// Move to the next row in the same column
    RowToRow,
    /// Leave the cursor in place
    Disabled,
}
