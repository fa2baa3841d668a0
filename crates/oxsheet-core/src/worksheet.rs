//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{
    shift_range_cols, shift_range_rows, Cell, CellAddress, CellRange, CellStorage, CellType,
    CellValue, RowMeta, MAX_ROW_HEIGHT,
};
use crate::column::{column_width_to_pixels, ColumnMeta, MAX_COLUMN_WIDTH};
use crate::error::{Error, Result};
use crate::protection::SheetProtection;
use crate::style::{Style, StyleRegistry};
use crate::view::{CellDirection, PaneState, SheetView, WorksheetPane, MAX_ZOOM, MIN_ZOOM};
use crate::{MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN};

/// Characters a sheet name may not contain
const INVALID_NAME_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// A worksheet (single sheet in a workbook)
///
/// Besides the sparse cell map, a worksheet carries a write cursor: cells
/// added without an address go to the cursor, which then advances in the
/// configured [`CellDirection`].
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Sheet id (1-based, unique within the workbook)
    sheet_id: u32,
    /// Sheet is hidden
    hidden: bool,
    /// Cell storage
    cells: CellStorage,
    /// Selected ranges in the sheet view
    selected_ranges: Vec<CellRange>,
    /// Auto-filter range
    auto_filter_range: Option<CellRange>,
    /// Window settings
    view: SheetView,
    /// Sheet protection settings
    protection: SheetProtection,
    /// Next cell written by `add_next_cell`
    cursor: CellAddress,
    /// How the cursor advances
    direction: CellDirection,
    /// Style merged under every explicitly styled cell
    active_style: Option<Style>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    ///
    /// The name is not validated here; [`Workbook`](crate::Workbook)
    /// checks it when the sheet is added.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            sheet_id: 1,
            hidden: false,
            cells: CellStorage::new(),
            selected_ranges: Vec::new(),
            auto_filter_range: None,
            view: SheetView::default(),
            protection: SheetProtection::default(),
            cursor: CellAddress::default(),
            direction: CellDirection::default(),
            active_style: None,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    ///
    /// Uniqueness within a workbook is checked by
    /// [`Workbook::rename_worksheet`](crate::Workbook::rename_worksheet).
    pub fn set_name<S: Into<String>>(&mut self, name: S) -> Result<()> {
        let name = name.into();
        Self::validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// Get the sheet id
    pub fn sheet_id(&self) -> u32 {
        self.sheet_id
    }

    pub(crate) fn set_sheet_id(&mut self, sheet_id: u32) {
        self.sheet_id = sheet_id;
    }

    /// Check if the sheet is hidden
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Check a sheet name against the format's rules
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| INVALID_NAME_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(Error::InvalidSheetName(
                "Sheet name cannot start or end with an apostrophe".into(),
            ));
        }
        Ok(())
    }

    /// Turn an arbitrary string into a valid sheet name that is unique
    /// among `existing` (case-insensitive)
    ///
    /// Forbidden characters become `_`, the name is cut to 31 characters,
    /// and `_2`, `_3`, ... is appended until no collision remains.
    pub fn sanitize_name<S: AsRef<str>>(candidate: &str, existing: &[S]) -> String {
        let mut base: String = candidate
            .chars()
            .map(|c| if INVALID_NAME_CHARS.contains(&c) { '_' } else { c })
            .take(MAX_SHEET_NAME_LEN)
            .collect();
        if base.starts_with('\'') {
            base.replace_range(..1, "_");
        }
        if base.ends_with('\'') {
            base.pop();
            base.push('_');
        }
        if base.is_empty() {
            base = "Sheet1".into();
        }

        let taken = |name: &str| {
            existing
                .iter()
                .any(|e| e.as_ref().to_lowercase() == name.to_lowercase())
        };
        if !taken(&base) {
            return base;
        }

        let mut n = 2u32;
        loop {
            let suffix = format!("_{}", n);
            let keep = MAX_SHEET_NAME_LEN - suffix.len();
            let stem: String = base.chars().take(keep).collect();
            let name = format!("{}{}", stem, suffix);
            if !taken(&name) {
                return name;
            }
            n += 1;
        }
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&Cell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cells.get(addr.row, addr.col))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(row, col)
    }

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Get the non-default style applied to a cell, if any
    pub fn cell_style_at(&self, row: u32, col: u16) -> Option<&Style> {
        let idx = self.cells.get(row, col).map(|c| c.style_index)?;
        if idx == 0 {
            return None;
        }
        self.cells.styles().style(idx).ok()
    }

    /// Get the non-default style applied to a cell by address, if any
    pub fn cell_style(&self, address: &str) -> Result<Option<&Style>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_style_at(addr.row, addr.col))
    }

    /// The registry holding every style used on this sheet
    pub fn styles(&self) -> &StyleRegistry {
        self.cells.styles()
    }

    // === Cell Modification ===

    /// Add a cell at an address string
    ///
    /// The stored style is `merge(active_style, style)`; fields set on
    /// `style` win. The cursor moves past the written cell.
    pub fn add_cell<V: Into<CellValue>>(
        &mut self,
        value: V,
        address: &str,
        style: Option<&Style>,
    ) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.add_cell_with_type(value, CellType::Default, addr.row, addr.col, style)
    }

    /// Add a cell by row and column indices
    pub fn add_cell_at<V: Into<CellValue>>(
        &mut self,
        value: V,
        row: u32,
        col: u16,
        style: Option<&Style>,
    ) -> Result<()> {
        self.add_cell_with_type(value, CellType::Default, row, col, style)
    }

    /// Add a cell with an explicit type tag
    ///
    /// See [`Cell::with_type`] for how the tag is reconciled with the value.
    pub fn add_cell_with_type<V: Into<CellValue>>(
        &mut self,
        value: V,
        cell_type: CellType,
        row: u32,
        col: u16,
        style: Option<&Style>,
    ) -> Result<()> {
        self.store_cell(value.into(), cell_type, row, col, style)?;
        self.cursor = self.advance(CellAddress::new(row, col), 1);
        Ok(())
    }

    /// Add a cell at the cursor, then advance the cursor
    pub fn add_next_cell<V: Into<CellValue>>(&mut self, value: V, style: Option<&Style>) -> Result<()> {
        let CellAddress { row, col, .. } = self.cursor;
        self.add_cell_with_type(value, CellType::Default, row, col, style)
    }

    /// Add a formula cell; a leading `=` is dropped
    pub fn add_cell_formula<S: Into<String>>(
        &mut self,
        formula: S,
        address: &str,
        style: Option<&Style>,
    ) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.add_cell_with_type(
            CellValue::formula(formula),
            CellType::Formula,
            addr.row,
            addr.col,
            style,
        )
    }

    /// Fill a range in row-major order
    ///
    /// The number of values must equal the number of cells in the range.
    pub fn add_cell_range<I, V>(
        &mut self,
        values: I,
        range: &CellRange,
        style: Option<&Style>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let values: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        let expected = range.cell_count();
        if values.len() as u64 != expected {
            return Err(Error::RangeMismatch {
                expected,
                actual: values.len(),
            });
        }
        self.validate_cell_position(range.end.row, range.end.col)?;

        for (addr, value) in range.cells().zip(values) {
            self.store_cell(value, CellType::Default, addr.row, addr.col, style)?;
        }
        self.cursor = self.advance(range.end.relative(), 1);
        Ok(())
    }

    /// Remove a cell by address string
    ///
    /// Returns whether a cell was present.
    pub fn remove_cell(&mut self, address: &str) -> Result<bool> {
        let addr = CellAddress::parse(address)?;
        Ok(self.remove_cell_at(addr.row, addr.col))
    }

    /// Remove a cell by indices
    pub fn remove_cell_at(&mut self, row: u32, col: u16) -> bool {
        self.cells.remove(row, col).is_some()
    }

    fn store_cell(
        &mut self,
        value: CellValue,
        cell_type: CellType,
        row: u32,
        col: u16,
        style: Option<&Style>,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        if let CellValue::Number(n) = &value {
            if !n.is_finite() {
                return Err(Error::out_of_range(format!(
                    "{} cannot be stored in cell {}",
                    n,
                    CellAddress::new(row, col)
                )));
            }
        }

        let mut cell = Cell::with_type(value, cell_type)?;

        let mut effective = match (&self.active_style, style) {
            (Some(active), Some(explicit)) => Style::merge(active, explicit),
            (Some(active), None) => active.clone(),
            (None, Some(explicit)) => explicit.clone(),
            (None, None) => Style::default(),
        };
        if effective.number_format.is_general() {
            match cell.cell_type {
                CellType::Date => effective = Style::merge(&Style::date_format(), &effective),
                CellType::Time => effective = Style::merge(&Style::time_format(), &effective),
                _ => {}
            }
        }
        cell.style_index = self.cells.styles.intern_style(&effective)?;

        self.cells.set(row, col, cell);
        Ok(())
    }

    // === Cursor ===

    /// The cell the next `add_next_cell` writes to
    pub fn current_cell_address(&self) -> CellAddress {
        self.cursor
    }

    /// Move the cursor
    pub fn set_current_cell_address(&mut self, address: CellAddress) -> Result<()> {
        self.validate_cell_position(address.row, address.col)?;
        self.cursor = address.relative();
        Ok(())
    }

    /// Get the cursor direction
    pub fn cell_direction(&self) -> CellDirection {
        self.direction
    }

    /// Set the cursor direction
    pub fn set_cell_direction(&mut self, direction: CellDirection) {
        self.direction = direction;
    }

    /// Move the cursor `n` columns right; unless `keep_row`, the row
    /// resets to the first one
    pub fn go_to_next_column(&mut self, n: u32, keep_row: bool) -> Result<()> {
        let col = self.cursor.col as u32 + n;
        if col >= MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS as u32 - 1));
        }
        let row = if keep_row { self.cursor.row } else { 0 };
        self.cursor = CellAddress::new(row, col as u16);
        Ok(())
    }

    /// Move the cursor `n` rows down; unless `keep_column`, the column
    /// resets to the first one
    pub fn go_to_next_row(&mut self, n: u32, keep_column: bool) -> Result<()> {
        let row = self.cursor.row as u64 + n as u64;
        if row >= MAX_ROWS as u64 {
            return Err(Error::RowOutOfBounds(
                row.min(u32::MAX as u64) as u32,
                MAX_ROWS - 1,
            ));
        }
        let col = if keep_column { self.cursor.col } else { 0 };
        self.cursor = CellAddress::new(row as u32, col);
        Ok(())
    }

    /// Cursor position `n` steps past `from`
    ///
    /// May land one past the sheet edge; the next write then fails.
    fn advance(&self, from: CellAddress, n: u32) -> CellAddress {
        match self.direction {
            CellDirection::ColumnToColumn => {
                let col = (from.col as u32 + n).min(MAX_COLS as u32) as u16;
                CellAddress::new(from.row, col)
            }
            CellDirection::RowToRow => CellAddress::new(from.row.saturating_add(n).min(MAX_ROWS), from.col),
            CellDirection::Disabled => self.cursor,
        }
    }

    // === Active Style ===

    /// Style merged under every cell added from now on
    pub fn set_active_style(&mut self, style: Style) {
        self.active_style = Some(style);
    }

    /// Stop applying the active style
    pub fn clear_active_style(&mut self) {
        self.active_style = None;
    }

    /// Get the active style
    pub fn active_style(&self) -> Option<&Style> {
        self.active_style.as_ref()
    }

    // === Row/Column Operations ===

    /// Get row height
    pub fn row_height(&self, row: u32) -> f64 {
        self.cells.row_height(row)
    }

    /// Set row height in points (0 to 409.5)
    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        self.validate_cell_position(row, 0)?;
        if !(0.0..=MAX_ROW_HEIGHT).contains(&height) {
            return Err(Error::out_of_range(format!(
                "row height {} outside 0..={}",
                height, MAX_ROW_HEIGHT
            )));
        }
        self.cells.set_row_height(row, height);
        Ok(())
    }

    /// Check if row is hidden
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.cells.is_row_hidden(row)
    }

    /// Set row hidden state
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) -> Result<()> {
        self.validate_cell_position(row, 0)?;
        self.cells.set_row_hidden(row, hidden);
        Ok(())
    }

    /// Get column width
    pub fn column_width(&self, col: u16) -> f64 {
        self.cells.column_width(col)
    }

    /// Set column width in characters (0 to 255)
    pub fn set_column_width(&mut self, col: u16, width: f64) -> Result<()> {
        self.validate_cell_position(0, col)?;
        if !(0.0..=MAX_COLUMN_WIDTH).contains(&width) {
            return Err(Error::out_of_range(format!(
                "column width {} outside 0..={}",
                width, MAX_COLUMN_WIDTH
            )));
        }
        self.cells.column_mut(col).width = Some(width);
        Ok(())
    }

    /// Check if column is hidden
    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.cells.column(col).is_some_and(|c| c.hidden)
    }

    /// Set column hidden state
    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) -> Result<()> {
        self.validate_cell_position(0, col)?;
        self.cells.column_mut(col).hidden = hidden;
        Ok(())
    }

    /// Get all column settings
    pub fn columns(&self) -> &BTreeMap<u16, ColumnMeta> {
        self.cells.columns()
    }

    /// Rows with a custom height or hidden flag
    pub fn row_settings(&self) -> &BTreeMap<u32, RowMeta> {
        self.cells.row_settings()
    }

    /// Drop column entries that would serialize as defaults
    pub fn recalculate_columns(&mut self) {
        self.cells.prune_default_columns();
    }

    /// Insert `count` empty rows before row `at`
    ///
    /// Cells, row settings, merges, the selection and the auto-filter move
    /// down. Missing rows stay missing.
    pub fn insert_row(&mut self, at: u32, count: u32) -> Result<()> {
        self.validate_cell_position(at, 0)?;
        self.cells.insert_rows(at, count)?;
        for range in &mut self.selected_ranges {
            *range = shift_range_rows(*range, at, count);
        }
        if let Some(range) = &mut self.auto_filter_range {
            *range = shift_range_rows(*range, at, count);
        }
        Ok(())
    }

    /// Insert `count` empty columns before column `at`
    pub fn insert_column(&mut self, at: u16, count: u16) -> Result<()> {
        self.validate_cell_position(0, at)?;
        self.cells.insert_columns(at, count)?;
        for range in &mut self.selected_ranges {
            *range = shift_range_cols(*range, at, count);
        }
        if let Some(range) = &mut self.auto_filter_range {
            *range = shift_range_cols(*range, at, count);
        }
        Ok(())
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_cells(&self) -> &[CellRange] {
        self.cells.merged_regions()
    }

    /// Merge cells
    ///
    /// Fails if the range overlaps an existing merged region.
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        self.validate_cell_position(range.end.row, range.end.col)?;
        self.cells.add_merged_region(*range)
    }

    /// Unmerge cells
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        self.cells.remove_merged_region(range)
    }

    /// Turn every non-anchor cell of each merged region into an empty cell
    /// carrying the merge marker style
    ///
    /// Runs once before saving. Covered values stay in the cells but are
    /// no longer written; unmerging afterwards does not restore them.
    pub fn resolve_merged_cells(&mut self) -> Result<()> {
        let marker = Style::merge_marker();
        let regions = self.cells.merged_regions().to_vec();

        for range in regions {
            let anchor = range.start.relative();
            for addr in range.cells() {
                if addr.relative() == anchor {
                    continue;
                }
                let existing = match self.cells.get(addr.row, addr.col) {
                    Some(cell) => self.cells.styles().style(cell.style_index)?.clone(),
                    None => Style::default(),
                };
                let style_index = self
                    .cells
                    .styles
                    .intern_style(&Style::merge(&existing, &marker))?;

                match self.cells.get_mut(addr.row, addr.col) {
                    Some(cell) => {
                        cell.cell_type = CellType::Empty;
                        cell.style_index = style_index;
                    }
                    None => self
                        .cells
                        .set(addr.row, addr.col, Cell::empty().with_style(style_index)),
                }
            }
        }
        Ok(())
    }

    // === Auto-filter ===

    /// Get the auto-filter range
    pub fn auto_filter_range(&self) -> Option<CellRange> {
        self.auto_filter_range
    }

    /// Put filter buttons on the header row of columns `start..=end`
    pub fn set_auto_filter(&mut self, start_col: u16, end_col: u16) -> Result<()> {
        let (start, end) = (start_col.min(end_col), start_col.max(end_col));
        self.validate_cell_position(0, end)?;
        self.set_auto_filter_range(CellRange::from_indices(0, start, 0, end))
    }

    /// Set the auto-filter to an explicit range
    pub fn set_auto_filter_range(&mut self, range: CellRange) -> Result<()> {
        self.validate_cell_position(range.end.row, range.end.col)?;
        self.clear_auto_filter_markers();
        for col in range.start.col..=range.end.col {
            self.cells.column_mut(col).has_auto_filter = true;
        }
        self.auto_filter_range = Some(range);
        Ok(())
    }

    /// Remove the auto-filter
    pub fn remove_auto_filter(&mut self) {
        self.clear_auto_filter_markers();
        self.auto_filter_range = None;
    }

    /// Extend the auto-filter down to the last row holding a cell in the
    /// filtered columns
    pub fn recalculate_auto_filter(&mut self) {
        let Some(range) = self.auto_filter_range.as_mut() else {
            return;
        };
        if let Some(last) = self.cells.last_row_in_columns(range.start.col, range.end.col) {
            if last > range.end.row {
                range.end.row = last;
            }
        }
    }

    fn clear_auto_filter_markers(&mut self) {
        let marked: Vec<u16> = self
            .cells
            .columns()
            .iter()
            .filter(|(_, meta)| meta.has_auto_filter)
            .map(|(&col, _)| col)
            .collect();
        for col in marked {
            self.cells.column_mut(col).has_auto_filter = false;
        }
    }

    // === Selection ===

    /// Get the selected ranges
    pub fn selected_ranges(&self) -> &[CellRange] {
        &self.selected_ranges
    }

    /// Add a range to the selection
    pub fn add_selected_cells(&mut self, range: CellRange) -> Result<()> {
        self.validate_cell_position(range.end.row, range.end.col)?;
        self.selected_ranges.push(range);
        Ok(())
    }

    /// Replace the selection with a single range
    pub fn set_selected_cells(&mut self, range: CellRange) -> Result<()> {
        self.clear_selected_cells();
        self.add_selected_cells(range)
    }

    /// Clear the selection
    pub fn clear_selected_cells(&mut self) {
        self.selected_ranges.clear();
    }

    // === Panes ===

    /// Get the window settings
    pub fn view(&self) -> &SheetView {
        &self.view
    }

    /// Get mutable window settings
    pub fn view_mut(&mut self) -> &mut SheetView {
        &mut self.view
    }

    /// Get the pane state
    pub fn pane(&self) -> &PaneState {
        &self.view.pane
    }

    /// Split the window horizontally at `height` points from the top
    pub fn set_horizontal_split_pixels(
        &mut self,
        height: f32,
        top_left: CellAddress,
        active_pane: WorksheetPane,
    ) {
        self.set_split_pixels(None, Some(height), top_left, active_pane);
    }

    /// Split the window vertically at `width` points from the left
    pub fn set_vertical_split_pixels(
        &mut self,
        width: f32,
        top_left: CellAddress,
        active_pane: WorksheetPane,
    ) {
        self.set_split_pixels(Some(width), None, top_left, active_pane);
    }

    /// Split the window at explicit lengths in points
    pub fn set_split_pixels(
        &mut self,
        left_width: Option<f32>,
        top_height: Option<f32>,
        top_left: CellAddress,
        active_pane: WorksheetPane,
    ) {
        self.view.pane = PaneState {
            split_top_height: top_height,
            split_left_width: left_width,
            split_address: None,
            freeze: None,
            top_left_cell: Some(top_left.relative()),
            active_pane: Some(active_pane),
        };
    }

    /// Split the window below the first `rows` rows
    pub fn set_horizontal_split(
        &mut self,
        rows: u32,
        freeze: bool,
        top_left: CellAddress,
        active_pane: WorksheetPane,
    ) -> Result<()> {
        self.set_split(None, Some(rows), freeze, top_left, active_pane)
    }

    /// Split the window right of the first `columns` columns
    pub fn set_vertical_split(
        &mut self,
        columns: u16,
        freeze: bool,
        top_left: CellAddress,
        active_pane: WorksheetPane,
    ) -> Result<()> {
        self.set_split(Some(columns), None, freeze, top_left, active_pane)
    }

    /// Split the window by column and row counts
    ///
    /// A frozen split needs at least one nonzero count; an unfrozen split
    /// with no nonzero count removes the pane. An unfrozen split is written as the equivalent lengths, see
    /// [`Worksheet::pane_split_pixel_lengths`].
    pub fn set_split(
        &mut self,
        columns: Option<u16>,
        rows: Option<u32>,
        freeze: bool,
        top_left: CellAddress,
        active_pane: WorksheetPane,
    ) -> Result<()> {
        let cols = columns.unwrap_or(0);
        let rows = rows.unwrap_or(0);
        if cols == 0 && rows == 0 {
            if freeze {
                return Err(Error::worksheet(
                    "a frozen split needs a row or column count",
                ));
            }
            // nothing to split
            self.reset_split();
            return Ok(());
        }
        let split = CellAddress::try_new(rows, cols as u32)?;

        self.view.pane = PaneState {
            split_top_height: None,
            split_left_width: None,
            split_address: Some(split),
            freeze: Some(freeze),
            top_left_cell: Some(top_left.relative()),
            active_pane: Some(active_pane),
        };
        Ok(())
    }

    /// Remove any split or freeze
    pub fn reset_split(&mut self) {
        self.view.pane = PaneState::default();
    }

    /// Split lengths in points as `(left_width, top_height)`
    ///
    /// Explicit lengths are returned as stored. A count split sums the
    /// widths/heights of every column/row before the split point, using
    /// defaults where nothing is set.
    pub fn pane_split_pixel_lengths(&self) -> (Option<f32>, Option<f32>) {
        let pane = &self.view.pane;
        let Some(split) = pane.split_address else {
            return (pane.split_left_width, pane.split_top_height);
        };

        let width = (split.col > 0).then(|| {
            let pixels: f64 = (0..split.col)
                .map(|c| column_width_to_pixels(self.cells.column_width(c)))
                .sum();
            (pixels * 0.75) as f32
        });
        let height = (split.row > 0).then(|| {
            (0..split.row).map(|r| self.cells.row_height(r)).sum::<f64>() as f32
        });
        (width, height)
    }

    // === View Options ===

    /// Show or hide grid lines
    pub fn set_show_grid_lines(&mut self, show: bool) {
        self.view.show_grid_lines = show;
    }

    /// Show or hide row and column headers
    pub fn set_show_row_col_headers(&mut self, show: bool) {
        self.view.show_row_col_headers = show;
    }

    /// Get the zoom factor in percent
    pub fn zoom_factor(&self) -> u16 {
        self.view.zoom
    }

    /// Set the zoom factor in percent (10 to 400)
    pub fn set_zoom_factor(&mut self, zoom: u16) -> Result<()> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            return Err(Error::out_of_range(format!(
                "zoom {} outside {}..={}",
                zoom, MIN_ZOOM, MAX_ZOOM
            )));
        }
        self.view.zoom = zoom;
        Ok(())
    }

    // === Protection ===

    /// Get sheet protection settings
    pub fn protection(&self) -> &SheetProtection {
        &self.protection
    }

    /// Get mutable sheet protection settings
    pub fn protection_mut(&mut self) -> &mut SheetProtection {
        &mut self.protection
    }

    /// Enable or disable sheet protection
    pub fn set_protected(&mut self, enabled: bool) {
        self.protection.enabled = enabled;
    }

    /// Store the legacy hash of `password`; an empty password clears it
    pub fn set_sheet_protection_password(&mut self, password: &str) {
        self.protection.set_password(password);
    }

    // === Iteration ===

    /// Get the used range (bounds of all stored cells)
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(min_row, min_col, max_row, max_col)| {
                CellRange::from_indices(min_row, min_col, max_row, max_col)
            })
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Check if the worksheet is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all cells in row order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.cells.iter()
    }

    /// Iterate over the cells of one row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells.iter_row(row)
    }

    /// Row indices holding at least one cell
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.row_indices()
    }

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS as u32 - 1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, NumberFormat};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_add_cell_and_read_back() {
        let mut ws = Worksheet::new("Test");
        ws.add_cell(42, "A1", None).unwrap();
        ws.add_cell("Hello", "B1", None).unwrap();
        ws.add_cell(true, "C1", None).unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_number(), Some(42.0));
        assert_eq!(ws.get_value("B1").unwrap().as_string(), Some("Hello"));
        assert_eq!(ws.cell_at(0, 2).unwrap().cell_type, CellType::Bool);
        assert_eq!(ws.get_value("Z99").unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_cursor_column_to_column() {
        let mut ws = Worksheet::new("Test");
        ws.add_next_cell(1, None).unwrap();
        ws.add_next_cell(2, None).unwrap();
        assert_eq!(ws.current_cell_address(), addr("C1"));

        ws.add_cell("x", "D5", None).unwrap();
        assert_eq!(ws.current_cell_address(), addr("E5"));

        ws.go_to_next_row(1, false).unwrap();
        assert_eq!(ws.current_cell_address(), addr("A6"));
    }

    #[test]
    fn test_cursor_row_to_row_and_disabled() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_direction(CellDirection::RowToRow);
        ws.add_next_cell(1, None).unwrap();
        ws.add_next_cell(2, None).unwrap();
        assert_eq!(ws.current_cell_address(), addr("A3"));
        assert_eq!(ws.get_value_at(1, 0).as_number(), Some(2.0));

        ws.set_cell_direction(CellDirection::Disabled);
        ws.add_cell(3, "F10", None).unwrap();
        assert_eq!(ws.current_cell_address(), addr("A3"));

        ws.go_to_next_column(2, true).unwrap();
        assert_eq!(ws.current_cell_address(), addr("C3"));
        assert!(ws.go_to_next_column(MAX_COLS as u32, true).is_err());
    }

    #[test]
    fn test_cursor_past_last_column_fails_on_write() {
        let mut ws = Worksheet::new("Test");
        ws.add_cell(1, "XFD1", None).unwrap();
        let err = ws.add_next_cell(2, None).unwrap_err();
        assert!(matches!(err, Error::ColumnOutOfBounds(..)));
    }

    #[test]
    fn test_active_style_merge() {
        let mut ws = Worksheet::new("Test");
        ws.set_active_style(Style::new().bold(true).fill_color(Color::YELLOW));
        ws.add_cell("a", "A1", Some(&Style::new().italic(true))).unwrap();
        ws.add_cell("b", "A2", Some(&Style::new().fill_color(Color::RED))).unwrap();

        let first = ws.cell_style_at(0, 0).unwrap();
        assert!(first.font.bold && first.font.italic);
        let second = ws.cell_style_at(1, 0).unwrap();
        assert!(second.font.bold);
        assert_eq!(second.fill, crate::style::FillStyle::solid(Color::RED));

        ws.clear_active_style();
        ws.add_cell("c", "A3", None).unwrap();
        assert!(ws.cell_style_at(2, 0).is_none());
    }

    #[test]
    fn test_equal_styles_share_an_index() {
        let mut ws = Worksheet::new("Test");
        let style = Style::new().bold(true);
        ws.add_cell(1, "A1", Some(&style)).unwrap();
        ws.add_cell(2, "B7", Some(&Style::new().bold(true))).unwrap();
        assert_eq!(
            ws.cell_at(0, 0).unwrap().style_index,
            ws.cell_at(6, 1).unwrap().style_index
        );
    }

    #[test]
    fn test_date_cells_get_date_format() {
        let mut ws = Worksheet::new("Test");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        ws.add_cell(date, "A1", None).unwrap();
        assert_eq!(
            ws.cell_style_at(0, 0).unwrap().number_format,
            NumberFormat::date_short()
        );

        let custom = Style::new().number_format("yyyy-mm-dd");
        ws.add_cell(date, "A2", Some(&custom)).unwrap();
        assert_eq!(
            ws.cell_style_at(1, 0).unwrap().number_format,
            NumberFormat::Custom("yyyy-mm-dd".into())
        );
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let mut ws = Worksheet::new("Test");
        assert!(ws.add_cell(f64::NAN, "A1", None).is_err());
        assert!(ws.add_cell(f32::INFINITY, "A1", None).is_err());
        assert!(ws.is_empty());
    }

    #[test]
    fn test_formula_cells() {
        let mut ws = Worksheet::new("Test");
        ws.add_cell_formula("=SUM(A1:A3)", "A4", None).unwrap();
        let cell = ws.cell("A4").unwrap().unwrap();
        assert_eq!(cell.cell_type, CellType::Formula);
        assert_eq!(cell.value.formula_text(), Some("SUM(A1:A3)"));

        ws.add_cell("=SUM(A1:A3)", "A5", None).unwrap();
        assert_eq!(ws.cell_at(4, 0).unwrap().cell_type, CellType::String);
    }

    #[test]
    fn test_add_cell_range() {
        let mut ws = Worksheet::new("Test");
        let values: Vec<CellValue> = (0..12).map(|i| CellValue::from(i * 10)).collect();
        let range = CellRange::parse("A1:A12").unwrap();
        ws.add_cell_range(values.clone(), &range, None).unwrap();

        for (row, expected) in values.iter().enumerate() {
            let cell = ws.cell_at(row as u32, 0).unwrap();
            assert_eq!(&cell.value, expected);
            assert_eq!(cell.cell_type, CellType::Number);
        }

        let err = ws
            .add_cell_range(values[..11].to_vec(), &range, None)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RangeMismatch {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn test_add_cell_range_row_major() {
        let mut ws = Worksheet::new("Test");
        let range = CellRange::parse("B2:C3").unwrap();
        ws.add_cell_range(vec!["a", "b", "c", "d"], &range, None).unwrap();
        assert_eq!(ws.get_value("C2").unwrap().as_string(), Some("b"));
        assert_eq!(ws.get_value("B3").unwrap().as_string(), Some("c"));
    }

    #[test]
    fn test_merge_conflicts() {
        let mut ws = Worksheet::new("Test");
        let range = CellRange::parse("A1:C3").unwrap();
        ws.merge_cells(&range).unwrap();
        assert!(ws.merge_cells(&range).is_err());
        assert!(ws
            .merge_cells(&CellRange::parse("B2:D4").unwrap())
            .is_err());
        assert!(ws.unmerge_cells(&range));
        assert!(ws.merged_cells().is_empty());
    }

    #[test]
    fn test_resolve_merged_cells() {
        let mut ws = Worksheet::new("Test");
        let anchor_style = Style::new().bold(true);
        ws.add_cell("anchor", "A1", Some(&anchor_style)).unwrap();
        ws.add_cell("covered", "B2", None).unwrap();
        ws.merge_cells(&CellRange::parse("A1:C3").unwrap()).unwrap();

        ws.resolve_merged_cells().unwrap();

        let anchor = ws.cell("A1").unwrap().unwrap();
        assert_eq!(anchor.cell_type, CellType::String);
        assert_eq!(ws.cell_style_at(0, 0), Some(&anchor_style));

        let marker_index = ws.cell_at(0, 1).unwrap().style_index;
        for a in ["B1", "C1", "A2", "B2", "C2", "A3", "B3", "C3"] {
            let cell = ws.cell(a).unwrap().unwrap();
            assert_eq!(cell.cell_type, CellType::Empty, "{}", a);
            assert_eq!(cell.style_index, marker_index, "{}", a);
        }
        assert_eq!(ws.get_value("B2").unwrap().as_string(), Some("covered"));
        assert!(ws.cell_style_at(0, 1).unwrap().cell_xf.force_apply_alignment);
    }

    #[test]
    fn test_insert_row_with_gap() {
        let mut ws = Worksheet::new("Test");
        for row in 0..4u32 {
            ws.add_cell_at(row, row, 0, None).unwrap();
        }
        ws.add_cell_at("gap", 5, 1, None).unwrap();

        ws.insert_row(1, 2).unwrap();

        assert_eq!(ws.get_value_at(0, 0).as_number(), Some(0.0));
        assert!(ws.cell_at(1, 0).is_none());
        assert!(ws.cell_at(2, 0).is_none());
        assert_eq!(ws.get_value_at(3, 0).as_number(), Some(1.0));
        assert_eq!(ws.get_value_at(5, 0).as_number(), Some(3.0));
        assert!(ws.cell_at(5, 1).is_none());
        assert_eq!(ws.get_value_at(7, 1).as_string(), Some("gap"));
        assert_eq!(ws.cell_count(), 5);
    }

    #[test]
    fn test_insert_column_moves_filter() {
        let mut ws = Worksheet::new("Test");
        ws.add_cell("h", "B1", None).unwrap();
        ws.set_auto_filter(1, 2).unwrap();
        ws.insert_column(0, 1).unwrap();

        assert_eq!(ws.get_value("C1").unwrap().as_string(), Some("h"));
        assert_eq!(ws.auto_filter_range().unwrap().to_string(), "C1:D1");
        assert!(ws.columns()[&2].has_auto_filter);
        assert!(!ws.columns().contains_key(&1));
    }

    #[test]
    fn test_recalculate_columns() {
        let mut ws = Worksheet::new("Test");
        ws.set_column_width(0, 8.43).unwrap();
        ws.set_column_width(1, 20.0).unwrap();
        ws.set_column_hidden(2, true).unwrap();
        ws.set_column_hidden(3, false).unwrap();
        ws.recalculate_columns();

        let kept: Vec<u16> = ws.columns().keys().copied().collect();
        assert_eq!(kept, vec![1, 2]);
        assert!(ws.set_column_width(0, 256.0).is_err());
        assert!(ws.set_row_height(0, 410.0).is_err());
    }

    #[test]
    fn test_auto_filter_recalculation() {
        let mut ws = Worksheet::new("Test");
        ws.add_cell("Name", "A1", None).unwrap();
        ws.add_cell("Age", "B1", None).unwrap();
        ws.add_cell("x", "B9", None).unwrap();
        ws.add_cell("outside", "D20", None).unwrap();
        ws.set_auto_filter(0, 1).unwrap();
        assert_eq!(ws.auto_filter_range().unwrap().to_string(), "A1:B1");

        ws.recalculate_auto_filter();
        assert_eq!(ws.auto_filter_range().unwrap().to_string(), "A1:B9");

        ws.remove_auto_filter();
        assert!(ws.auto_filter_range().is_none());
        assert!(ws.columns().values().all(|c| !c.has_auto_filter));
    }

    #[test]
    fn test_horizontal_split_pixels() {
        let mut ws = Worksheet::new("Test");
        ws.set_horizontal_split_pixels(22.2, addr("A2"), WorksheetPane::BottomLeft);

        let pane = ws.pane();
        assert_eq!(pane.split_top_height, Some(22.2));
        assert_eq!(pane.split_left_width, None);
        assert_eq!(pane.split_address, None);
        assert_eq!(pane.freeze, None);
        assert_eq!(pane.active_pane, Some(WorksheetPane::BottomLeft));
    }

    #[test]
    fn test_horizontal_split_frozen() {
        let mut ws = Worksheet::new("Test");
        ws.set_horizontal_split(3, true, addr("D1"), WorksheetPane::BottomLeft)
            .unwrap();

        let pane = ws.pane();
        assert_eq!(pane.split_address, Some(CellAddress::new(3, 0)));
        assert_eq!(pane.freeze, Some(true));
        assert_eq!(pane.split_top_height, None);
        assert_eq!(pane.top_left_cell, Some(addr("D1")));
    }

    #[test]
    fn test_split_clears_other_encoding() {
        let mut ws = Worksheet::new("Test");
        ws.set_vertical_split(2, true, addr("C1"), WorksheetPane::TopRight)
            .unwrap();
        ws.set_vertical_split_pixels(40.0, addr("C1"), WorksheetPane::TopRight);
        assert_eq!(ws.pane().split_address, None);
        assert_eq!(ws.pane().split_left_width, Some(40.0));

        ws.reset_split();
        assert!(!ws.pane().has_split());
    }

    #[test]
    fn test_frozen_split_needs_counts() {
        let mut ws = Worksheet::new("Test");
        let err = ws
            .set_split(None, Some(0), true, addr("A1"), WorksheetPane::BottomRight)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Worksheet);
    }

    #[test]
    fn test_empty_unfrozen_split_removes_pane() {
        let mut ws = Worksheet::new("Test");
        ws.set_split(Some(2), Some(3), false, addr("C4"), WorksheetPane::BottomRight)
            .unwrap();
        ws.set_split(Some(0), Some(0), false, addr("A1"), WorksheetPane::BottomRight)
            .unwrap();
        assert_eq!(ws.view().pane, PaneState::default());

        ws.set_split(None, None, false, addr("A1"), WorksheetPane::TopLeft)
            .unwrap();
        assert_eq!(ws.view().pane, PaneState::default());
        assert_eq!(ws.pane_split_pixel_lengths(), (None, None));
    }

    #[test]
    fn test_unfrozen_split_lengths() {
        let mut ws = Worksheet::new("Test");
        ws.set_row_height(1, 30.0).unwrap();
        ws.set_column_width(0, 10.0).unwrap();
        ws.set_split(Some(2), Some(3), false, addr("C4"), WorksheetPane::BottomRight)
            .unwrap();

        let (width, height) = ws.pane_split_pixel_lengths();
        // 70px + 59px at 0.75 points per pixel
        assert_eq!(width, Some(96.75));
        assert_eq!(height, Some(60.0));
    }

    #[test]
    fn test_zoom_bounds() {
        let mut ws = Worksheet::new("Test");
        ws.set_zoom_factor(150).unwrap();
        assert_eq!(ws.zoom_factor(), 150);
        assert!(ws.set_zoom_factor(9).is_err());
        assert!(ws.set_zoom_factor(401).is_err());
    }

    #[test]
    fn test_sheet_names() {
        assert!(Worksheet::validate_name("Data 2024").is_ok());
        assert!(Worksheet::validate_name("").is_err());
        assert!(Worksheet::validate_name("a/b").is_err());
        assert!(Worksheet::validate_name("'quoted").is_err());
        assert!(Worksheet::validate_name(&"x".repeat(32)).is_err());

        let mut ws = Worksheet::new("Test");
        assert!(ws.set_name("Bad?Name").is_err());
        assert_eq!(ws.name(), "Test");
    }

    #[test]
    fn test_sanitize_name() {
        let existing = ["Sheet1", "Data"];
        assert_eq!(Worksheet::sanitize_name("", &existing), "Sheet1_2");
        assert_eq!(Worksheet::sanitize_name("a/b*c", &existing), "a_b_c");
        assert_eq!(Worksheet::sanitize_name("DATA", &existing), "DATA_2");
        assert_eq!(Worksheet::sanitize_name("'x'", &existing), "_x_");

        let long = "L".repeat(40);
        let clean = Worksheet::sanitize_name(&long, &[long[..31].to_string()]);
        assert_eq!(clean.chars().count(), 31);
        assert!(clean.ends_with("_2"));
    }

    #[test]
    fn test_sheet_protection_password() {
        let mut ws = Worksheet::new("Test");
        ws.set_protected(true);
        ws.set_sheet_protection_password("test");
        assert!(ws.protection().enabled);
        assert_eq!(ws.protection().password_hash.as_deref(), Some("CBEB"));
    }
}
