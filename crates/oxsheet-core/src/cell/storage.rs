//! Sparse cell grid
//!
//! Cells live in a two-level ordered map keyed by row, then column, so
//! the writer can stream them in document order. Row and column metadata
//! and merged regions sit next to the grid because row and column
//! insertion has to move all of them together.

use std::collections::BTreeMap;

use super::{Cell, CellAddress, CellRange};
use crate::column::{ColumnMeta, DEFAULT_COLUMN_WIDTH};
use crate::error::{Error, Result};
use crate::style::StyleRegistry;
use crate::{MAX_COLS, MAX_ROWS};

/// Default row height in points
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Largest row height the format accepts
pub const MAX_ROW_HEIGHT: f64 = 409.5;

/// Per-row settings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowMeta {
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    pub hidden: bool,
}

impl RowMeta {
    fn is_default(&self) -> bool {
        self.height.is_none() && !self.hidden
    }
}

type Grid = BTreeMap<u32, BTreeMap<u16, Cell>>;

#[derive(Debug, Clone)]
pub struct CellStorage {
    grid: Grid,
    /// Styles referenced by `Cell::style_index` (0 = default style)
    pub(crate) styles: StyleRegistry,
    row_meta: BTreeMap<u32, RowMeta>,
    columns: BTreeMap<u16, ColumnMeta>,
    /// Merged regions, kept in the order they were added
    merges: Vec<CellRange>,
}

impl Default for CellStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl CellStorage {
    pub fn new() -> Self {
        Self {
            grid: Grid::new(),
            styles: StyleRegistry::for_package(),
            row_meta: BTreeMap::new(),
            columns: BTreeMap::new(),
            merges: Vec::new(),
        }
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&Cell> {
        self.grid.get(&row)?.get(&col)
    }

    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut Cell> {
        self.grid.get_mut(&row)?.get_mut(&col)
    }

    /// Store or overwrite a cell
    pub fn set(&mut self, row: u32, col: u16, cell: Cell) {
        self.grid.entry(row).or_default().insert(col, cell);
    }

    /// Remove a cell, dropping its row once the row holds nothing
    pub fn remove(&mut self, row: u32, col: u16) -> Option<Cell> {
        let line = self.grid.get_mut(&row)?;
        let removed = line.remove(&col);
        if line.is_empty() {
            self.grid.remove(&row);
        }
        removed
    }

    /// Number of stored cells, including explicitly empty ones
    pub fn cell_count(&self) -> usize {
        self.grid.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Smallest range covering every stored cell
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let (&first_row, _) = self.grid.first_key_value()?;
        let (&last_row, _) = self.grid.last_key_value()?;
        let (first_col, last_col) = self
            .grid
            .values()
            .filter_map(|line| Some((*line.keys().next()?, *line.keys().next_back()?)))
            .fold((u16::MAX, 0), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
        Some((first_row, first_col, last_row, last_col))
    }

    /// Last row holding a cell in any of the columns `first..=last`
    pub fn last_row_in_columns(&self, first: u16, last: u16) -> Option<u32> {
        self.grid
            .iter()
            .rev()
            .find(|(_, line)| line.range(first..=last).next().is_some())
            .map(|(&row, _)| row)
    }

    /// Every stored cell in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.grid
            .iter()
            .flat_map(|(&row, line)| line.iter().map(move |(&col, cell)| (row, col, cell)))
    }

    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &Cell)> {
        self.grid
            .get(&row)
            .into_iter()
            .flat_map(|line| line.iter().map(|(&col, cell)| (col, cell)))
    }

    /// Rows that hold at least one cell
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.grid.keys().copied()
    }

    // === Rows ===

    pub fn row_height(&self, row: u32) -> f64 {
        self.row_meta
            .get(&row)
            .and_then(|meta| meta.height)
            .unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_meta.entry(row).or_default().height = Some(height);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.row_meta.get(&row).is_some_and(|meta| meta.hidden)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        let meta = self.row_meta.entry(row).or_default();
        meta.hidden = hidden;
        if meta.is_default() {
            self.row_meta.remove(&row);
        }
    }

    /// Rows with a custom height or hidden flag
    pub fn row_settings(&self) -> &BTreeMap<u32, RowMeta> {
        &self.row_meta
    }

    // === Columns ===

    pub fn column_width(&self, col: u16) -> f64 {
        self.columns
            .get(&col)
            .map_or(DEFAULT_COLUMN_WIDTH, |meta| meta.width_or(DEFAULT_COLUMN_WIDTH))
    }

    pub fn column(&self, col: u16) -> Option<&ColumnMeta> {
        self.columns.get(&col)
    }

    /// Settings of one column, created on first access
    pub fn column_mut(&mut self, col: u16) -> &mut ColumnMeta {
        self.columns.entry(col).or_default()
    }

    pub fn columns(&self) -> &BTreeMap<u16, ColumnMeta> {
        &self.columns
    }

    /// Drop column entries that carry nothing but defaults
    pub fn prune_default_columns(&mut self) {
        self.columns
            .retain(|_, meta| !meta.is_default(DEFAULT_COLUMN_WIDTH));
    }

    // === Merged regions ===

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merges
    }

    /// Add a merged region; overlapping an existing one is a conflict
    pub fn add_merged_region(&mut self, range: CellRange) -> Result<()> {
        match self.merges.iter().find(|m| m.overlaps(&range)) {
            Some(existing) => Err(Error::MergedCellConflict(format!(
                "{range} (overlaps {existing})"
            ))),
            None => {
                self.merges.push(range);
                Ok(())
            }
        }
    }

    /// Remove a merged region, ignoring `$` markers
    pub fn remove_merged_region(&mut self, range: &CellRange) -> bool {
        let target = range.relative();
        match self.merges.iter().position(|m| m.relative() == target) {
            Some(i) => {
                self.merges.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn is_merged(&self, row: u32, col: u16) -> bool {
        let addr = CellAddress::new(row, col);
        self.merges.iter().any(|m| m.contains(&addr))
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    // === Structural edits ===

    /// Shift every row at or after `at` down by `count`
    ///
    /// Cells, row settings and merged regions move together. Absent rows
    /// stay absent.
    pub fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let last = self
            .grid
            .keys()
            .next_back()
            .max(self.row_meta.keys().next_back())
            .copied();
        if let Some(last) = last.filter(|&l| l >= at) {
            let moved = u64::from(last) + u64::from(count);
            if moved >= u64::from(MAX_ROWS) {
                let moved = u32::try_from(moved).unwrap_or(u32::MAX);
                return Err(Error::RowOutOfBounds(moved, MAX_ROWS - 1));
            }
        }

        shift_keys(&mut self.grid, at, count);
        shift_keys(&mut self.row_meta, at, count);
        for range in &mut self.merges {
            *range = shift_range_rows(*range, at, count);
        }
        Ok(())
    }

    /// Shift every column at or after `at` right by `count`
    pub fn insert_columns(&mut self, at: u16, count: u16) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let last = self
            .grid
            .values()
            .filter_map(|line| line.keys().next_back())
            .chain(self.columns.keys().next_back())
            .max()
            .copied();
        if let Some(last) = last.filter(|&l| l >= at) {
            let moved = u32::from(last) + u32::from(count);
            if moved >= MAX_COLS as u32 {
                return Err(Error::ColumnOutOfBounds(moved, MAX_COLS as u32 - 1));
            }
        }

        for line in self.grid.values_mut() {
            shift_keys(line, at, count);
        }
        shift_keys(&mut self.columns, at, count);
        for range in &mut self.merges {
            *range = shift_range_cols(*range, at, count);
        }
        Ok(())
    }
}

/// Re-key every entry at or after `at` by `+count`
///
/// Callers check bounds first, so the additions cannot overflow.
fn shift_keys<K, V>(map: &mut BTreeMap<K, V>, at: K, count: K)
where
    K: Ord + Copy + std::ops::Add<Output = K>,
{
    let tail = map.split_off(&at);
    map.extend(tail.into_iter().map(|(k, v)| (k + count, v)));
}

/// Move a range for a row insertion; a range spanning `at` grows
pub(crate) fn shift_range_rows(range: CellRange, at: u32, count: u32) -> CellRange {
    let mut out = range;
    if range.start.row >= at {
        out.start.row += count;
    }
    if range.end.row >= at {
        out.end.row += count;
    }
    out
}

/// Move a range for a column insertion; a range spanning `at` grows
pub(crate) fn shift_range_cols(range: CellRange, at: u16, count: u16) -> CellRange {
    let mut out = range;
    if range.start.col >= at {
        out.start.col += count;
    }
    if range.end.col >= at {
        out.end.col += count;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    #[test]
    fn set_get_remove() {
        let mut grid = CellStorage::new();
        grid.set(0, 0, Cell::new(42));
        assert_eq!(grid.get(0, 0).unwrap().value.as_number(), Some(42.0));
        assert!(grid.get(1, 1).is_none());

        assert!(grid.remove(0, 0).is_some());
        assert!(grid.is_empty());
        assert!(grid.remove(0, 0).is_none());
    }

    #[test]
    fn explicit_empty_cells_are_stored() {
        let mut grid = CellStorage::new();
        grid.set(3, 3, Cell::empty());
        assert_eq!(grid.cell_count(), 1);
        assert_eq!(grid.get(3, 3).unwrap().value, CellValue::Empty);
    }

    #[test]
    fn bounds_cover_every_cell() {
        let mut grid = CellStorage::new();
        assert_eq!(grid.used_bounds(), None);

        grid.set(5, 3, Cell::new(1));
        grid.set(10, 7, Cell::new(2));
        grid.set(2, 1, Cell::new(3));

        assert_eq!(grid.used_bounds(), Some((2, 1, 10, 7)));
        assert_eq!(grid.last_row_in_columns(1, 3), Some(5));
        assert_eq!(grid.last_row_in_columns(8, 9), None);
    }

    #[test]
    fn row_and_column_settings() {
        let mut grid = CellStorage::new();
        assert_eq!(grid.row_height(0), DEFAULT_ROW_HEIGHT);
        assert_eq!(grid.column_width(0), DEFAULT_COLUMN_WIDTH);
        assert!(!grid.is_row_hidden(0));

        grid.set_row_height(5, 30.0);
        grid.column_mut(3).width = Some(20.0);
        grid.set_row_hidden(10, true);

        assert_eq!(grid.row_height(5), 30.0);
        assert_eq!(grid.column_width(3), 20.0);
        assert!(grid.is_row_hidden(10));

        grid.set_row_hidden(10, false);
        let rows: Vec<u32> = grid.row_settings().keys().copied().collect();
        assert_eq!(rows, vec![5]);
    }

    #[test]
    fn default_columns_are_pruned() {
        let mut grid = CellStorage::new();
        grid.column_mut(0);
        grid.column_mut(1).width = Some(DEFAULT_COLUMN_WIDTH);
        grid.column_mut(2).hidden = true;
        grid.column_mut(3).has_auto_filter = true;

        grid.prune_default_columns();
        let kept: Vec<u16> = grid.columns().keys().copied().collect();
        assert_eq!(kept, vec![2, 3]);
    }

    #[test]
    fn overlapping_merges_conflict() {
        let mut grid = CellStorage::new();
        let range = CellRange::parse("A1:C3").unwrap();
        grid.add_merged_region(range).unwrap();

        assert!(grid.add_merged_region(range).is_err());
        assert!(grid
            .add_merged_region(CellRange::parse("C3:D4").unwrap())
            .is_err());
        grid.add_merged_region(CellRange::parse("D1:E2").unwrap())
            .unwrap();

        assert!(grid.is_merged(1, 1));
        assert!(grid.remove_merged_region(&CellRange::parse("$A$1:$C$3").unwrap()));
        assert!(!grid.is_merged(1, 1));
    }

    #[test]
    fn row_insert_keeps_gaps() {
        let mut grid = CellStorage::new();
        for row in 0..4 {
            grid.set(row, 0, Cell::new(row));
        }
        grid.set(5, 1, Cell::new("gap"));
        grid.set_row_height(2, 30.0);

        grid.insert_rows(1, 2).unwrap();

        let positions: Vec<(u32, u16)> = grid.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(positions, vec![(0, 0), (3, 0), (4, 0), (5, 0), (7, 1)]);
        assert_eq!(grid.row_height(4), 30.0);
        assert_eq!(grid.row_height(2), DEFAULT_ROW_HEIGHT);
    }

    #[test]
    fn column_insert_moves_merges() {
        let mut grid = CellStorage::new();
        grid.set(0, 0, Cell::new(1));
        grid.set(0, 2, Cell::new(2));
        grid.add_merged_region(CellRange::parse("B2:C3").unwrap())
            .unwrap();
        grid.column_mut(2).width = Some(12.0);

        grid.insert_columns(1, 1).unwrap();

        assert!(grid.get(0, 0).is_some());
        assert!(grid.get(0, 3).is_some());
        assert_eq!(grid.merged_regions()[0].to_string(), "C2:D3");
        assert_eq!(grid.column_width(3), 12.0);
    }

    #[test]
    fn row_insert_past_the_last_row_fails() {
        let mut grid = CellStorage::new();
        grid.set(MAX_ROWS - 1, 0, Cell::new(1));
        assert!(grid.insert_rows(0, 1).is_err());
        assert!(grid.get(MAX_ROWS - 1, 0).is_some());
    }
}
