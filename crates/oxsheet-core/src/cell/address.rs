//! A1-style cell addresses and rectangular ranges

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Longest column label ("XFD")
const MAX_COLUMN_LETTERS: usize = 3;

/// Longest row label ("1048576")
const MAX_ROW_DIGITS: usize = 7;

/// A cell position with optional `$` markers
///
/// Rows and columns are stored 0-based and written 1-based with letters for
/// the column, so `row: 2, col: 27` is `AB3`. Equality includes the
/// markers; compare [`CellAddress::relative`] forms to test for the same
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

/// The pieces of an address label before any numeric decoding
struct Label<'a> {
    col_absolute: bool,
    letters: &'a str,
    row_absolute: bool,
    digits: &'a str,
}

impl<'a> Label<'a> {
    fn split(s: &'a str) -> Result<Self> {
        let invalid = |what: &str| Error::InvalidAddress(format!("{} in '{}'", what, s));

        let (col_absolute, rest) = match s.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let letters_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(letters_end);
        let (row_absolute, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };

        if letters.is_empty() {
            return Err(invalid("no column letters"));
        }
        if letters.len() > MAX_COLUMN_LETTERS {
            return Err(invalid("too many column letters"));
        }
        if digits.is_empty() {
            return Err(invalid("no row number"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("invalid row number"));
        }
        if digits.len() > MAX_ROW_DIGITS {
            return Err(invalid("too many row digits"));
        }

        Ok(Label {
            col_absolute,
            letters,
            row_absolute,
            digits,
        })
    }
}

impl CellAddress {
    /// Relative address at the given 0-based indices
    ///
    /// Indices are not checked; use [`CellAddress::try_new`] for values
    /// that come from outside.
    pub fn new(row: u32, col: u16) -> Self {
        Self::with_absolute(row, col, false, false)
    }

    /// Address at the given indices, or a range error past the sheet limits
    pub fn try_new(row: u32, col: u32) -> Result<Self> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        let col = u16::try_from(col)
            .ok()
            .filter(|c| *c < MAX_COLS)
            .ok_or(Error::ColumnOutOfBounds(col, u32::from(MAX_COLS) - 1))?;
        Ok(Self::new(row, col))
    }

    pub fn with_absolute(row: u32, col: u16, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// `$A$1` style address
    pub fn absolute(row: u32, col: u16) -> Self {
        Self::with_absolute(row, col, true, true)
    }

    /// Same position with both absolute markers cleared
    pub fn relative(&self) -> Self {
        Self::new(self.row, self.col)
    }

    /// Parse an A1-style label
    ///
    /// Letters are case-insensitive. Malformed labels are format errors;
    /// well-formed labels beyond `XFD1048576` are range errors.
    ///
    /// ```
    /// use oxsheet_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$c$12").unwrap();
    /// assert_eq!((addr.row, addr.col), (11, 2));
    /// assert!(addr.row_absolute && addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let label = Label::split(s)?;
        let col = Self::letters_to_column(label.letters)?;
        // at most seven digits, so this cannot overflow
        let row_number: u32 = label
            .digits
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;
        let row = row_number
            .checked_sub(1)
            .ok_or_else(|| Error::InvalidAddress(format!("row 0 in '{}'", s)))?;
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }

        Ok(Self::with_absolute(
            row,
            col,
            label.row_absolute,
            label.col_absolute,
        ))
    }

    /// Column label for a 0-based index (0 → `A`, 26 → `AA`)
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = Vec::with_capacity(MAX_COLUMN_LETTERS);
        let mut n = u32::from(col) + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        letters.iter().rev().map(|&b| char::from(b)).collect()
    }

    /// 0-based index for a column label, case-insensitive
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() || letters.len() > MAX_COLUMN_LETTERS {
            return Err(Error::InvalidAddress(format!(
                "column label '{}' must have 1 to {} letters",
                letters, MAX_COLUMN_LETTERS
            )));
        }

        let number = letters.bytes().try_fold(0u32, |acc, b| {
            if b.is_ascii_alphabetic() {
                Ok(acc * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1)
            } else {
                Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    char::from(b)
                )))
            }
        })?;

        let col = number - 1;
        if col >= u32::from(MAX_COLS) {
            return Err(Error::ColumnOutOfBounds(col, u32::from(MAX_COLS) - 1));
        }
        Ok(col as u16)
    }

    /// Label including any `$` markers
    pub fn to_a1_string(&self) -> String {
        self.to_string()
    }
}

impl Default for CellAddress {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = |absolute: bool| if absolute { "$" } else { "" };
        write!(
            f,
            "{}{}{}{}",
            marker(self.col_absolute),
            Self::column_to_letters(self.col),
            marker(self.row_absolute),
            u64::from(self.row) + 1
        )
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// An inclusive rectangle of cells, always stored top-left to bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Range spanned by two corners given in any order
    ///
    /// Each corner keeps its own `$` markers.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        let start = CellAddress {
            row: a.row.min(b.row),
            col: a.col.min(b.col),
            ..a
        };
        let end = CellAddress {
            row: a.row.max(b.row),
            col: a.col.max(b.col),
            ..b
        };
        Self { start, end }
    }

    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// One-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse `Start:End`
    ///
    /// A bare address is rejected; use [`CellRange::parse_reference`]
    /// where a single cell is acceptable.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut corners = s.split(':');
        match (corners.next(), corners.next(), corners.next()) {
            (Some(start), Some(end), None) => {
                Ok(Self::new(CellAddress::parse(start)?, CellAddress::parse(end)?))
            }
            (_, None, _) => Err(Error::InvalidRange(format!(
                "expected 'Start:End' but got '{}'",
                s
            ))),
            _ => Err(Error::InvalidRange(format!("too many ':' in '{}'", s))),
        }
    }

    /// Parse either `Start:End` or a single address
    ///
    /// Reference attributes written by other producers (`sqref`, merge
    /// `ref`) use the short form for single cells.
    pub fn parse_reference(s: &str) -> Result<Self> {
        if s.contains(':') {
            Self::parse(s)
        } else {
            CellAddress::parse(s).map(Self::single)
        }
    }

    pub fn contains(&self, addr: &CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&addr.row)
            && (self.start.col..=self.end.col).contains(&addr.col)
    }

    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.col_count())
    }

    /// True when the two rectangles share at least one cell
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.intersect(other).is_some()
    }

    /// The shared rectangle, if any
    pub fn intersect(&self, other: &CellRange) -> Option<CellRange> {
        let top = self.start.row.max(other.start.row);
        let left = self.start.col.max(other.start.col);
        let bottom = self.end.row.min(other.end.row);
        let right = self.end.col.min(other.end.col);
        (top <= bottom && left <= right).then(|| CellRange::from_indices(top, left, bottom, right))
    }

    /// Every address in row-major order
    pub fn cells(&self) -> RangeCells {
        RangeCells {
            range: self.relative(),
            index: 0,
            total: self.cell_count(),
        }
    }

    /// Same rectangle with all `$` markers cleared
    pub fn relative(&self) -> CellRange {
        CellRange {
            start: self.start.relative(),
            end: self.end.relative(),
        }
    }

    /// `Start:End` with markers, even when both corners are the same cell
    pub fn to_a1_string(&self) -> String {
        self.to_string()
    }

    /// `Start:End` without markers, the form used in XML attributes
    pub fn to_relative_string(&self) -> String {
        self.relative().to_string()
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Row-major walk over a [`CellRange`]
#[derive(Debug, Clone)]
pub struct RangeCells {
    range: CellRange,
    index: u64,
    total: u64,
}

impl Iterator for RangeCells {
    type Item = CellAddress;

    fn next(&mut self) -> Option<CellAddress> {
        if self.index >= self.total {
            return None;
        }
        let width = u64::from(self.range.col_count());
        let row = self.range.start.row + (self.index / width) as u32;
        let col = self.range.start.col + (self.index % width) as u16;
        self.index += 1;
        Some(CellAddress::new(row, col))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.total - self.index).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

impl ExactSizeIterator for RangeCells {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn column_labels_at_the_boundaries() {
        for (col, label) in [(0, "A"), (25, "Z"), (26, "AA"), (701, "ZZ"), (702, "AAA"), (16383, "XFD")] {
            assert_eq!(CellAddress::column_to_letters(col), label);
            assert_eq!(CellAddress::letters_to_column(label).unwrap(), col);
        }
        assert_eq!(CellAddress::letters_to_column("xfd").unwrap(), 16383);
    }

    #[test]
    fn column_label_errors() {
        assert_eq!(
            CellAddress::letters_to_column("XFE").unwrap_err().kind(),
            ErrorKind::Range
        );
        assert_eq!(
            CellAddress::letters_to_column("AAAA").unwrap_err().kind(),
            ErrorKind::Format
        );
        assert_eq!(
            CellAddress::letters_to_column("A1").unwrap_err().kind(),
            ErrorKind::Format
        );
    }

    #[test]
    fn parse_markers_and_limits() {
        let addr = CellAddress::parse("d7").unwrap();
        assert_eq!((addr.row, addr.col), (6, 3));
        assert!(!addr.row_absolute && !addr.col_absolute);

        let addr = CellAddress::parse("$D7").unwrap();
        assert!(addr.col_absolute && !addr.row_absolute);

        let addr = CellAddress::parse(" D$7 ").unwrap();
        assert!(!addr.col_absolute && addr.row_absolute);

        let addr = CellAddress::parse("XFD1048576").unwrap();
        assert_eq!((addr.row, addr.col), (1_048_575, 16_383));
    }

    #[test]
    fn parse_errors_by_kind() {
        for input in ["", "Q", "42", "B0", "B2C", "$$B2", "WXYZ1", "B12345678", "B-2", "B$"] {
            assert_eq!(
                CellAddress::parse(input).unwrap_err().kind(),
                ErrorKind::Format,
                "{:?}",
                input
            );
        }
        for input in ["B1048577", "XFE1", "ZZZ9"] {
            assert_eq!(
                CellAddress::parse(input).unwrap_err().kind(),
                ErrorKind::Range,
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn try_new_rejects_out_of_sheet() {
        assert!(CellAddress::try_new(1_048_575, 16_383).is_ok());
        assert!(matches!(
            CellAddress::try_new(1_048_576, 0),
            Err(Error::RowOutOfBounds(..))
        ));
        assert!(matches!(
            CellAddress::try_new(0, 70_000),
            Err(Error::ColumnOutOfBounds(..))
        ));
    }

    #[test]
    fn display_keeps_markers() {
        assert_eq!(CellAddress::new(99, 2).to_string(), "C100");
        assert_eq!(CellAddress::absolute(4, 27).to_string(), "$AB$5");
        assert_eq!(CellAddress::with_absolute(0, 0, true, false).to_string(), "A$1");
    }

    #[test]
    fn ranges_normalize_corners() {
        let range = CellRange::parse("E9:b2").unwrap();
        assert_eq!(range.start, CellAddress::new(1, 1));
        assert_eq!(range.end, CellAddress::new(8, 4));
        assert_eq!(CellRange::parse("E2:B9").unwrap().to_string(), "B2:E9");
        assert_eq!((range.row_count(), range.col_count(), range.cell_count()), (8, 4, 32));
    }

    #[test]
    fn range_forms() {
        assert_eq!(CellRange::parse("F6").unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(
            CellRange::parse("A1:B2:C3").unwrap_err().kind(),
            ErrorKind::Format
        );

        let single = CellRange::parse_reference("F6").unwrap();
        assert_eq!(single.cell_count(), 1);
        assert_eq!(single.to_string(), "F6:F6");

        let marked = CellRange::parse("$A$1:B$4").unwrap();
        assert_eq!(marked.to_a1_string(), "$A$1:B$4");
        assert_eq!(marked.to_relative_string(), "A1:B4");
    }

    #[test]
    fn containment_and_intersection() {
        let block = CellRange::parse("B2:D4").unwrap();
        assert!(block.contains(&CellAddress::parse("C3").unwrap()));
        assert!(block.contains(&CellAddress::parse("$D$4").unwrap()));
        assert!(!block.contains(&CellAddress::parse("B5").unwrap()));

        assert!(block.overlaps(&CellRange::parse("D4:F6").unwrap()));
        assert!(!block.overlaps(&CellRange::parse("E1:E9").unwrap()));
        assert_eq!(
            block.intersect(&CellRange::parse("A3:Z3").unwrap()),
            Some(CellRange::parse("B3:D3").unwrap())
        );
    }

    #[test]
    fn cells_walk_row_major() {
        let cells: Vec<String> = CellRange::parse("B2:C3")
            .unwrap()
            .cells()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(cells, ["B2", "C2", "B3", "C3"]);

        let edge = CellRange::from_indices(0, 16383, 1, 16383).cells();
        assert_eq!(edge.len(), 2);
        assert_eq!(edge.last(), Some(CellAddress::new(1, 16383)));
    }

    proptest! {
        #[test]
        fn column_labels_are_bijective(col in 0u16..16384) {
            let letters = CellAddress::column_to_letters(col);
            prop_assert!(letters.len() <= MAX_COLUMN_LETTERS);
            prop_assert_eq!(CellAddress::letters_to_column(&letters).unwrap(), col);
        }

        #[test]
        fn labels_round_trip(row in 0u32..1_048_576, col in 0u16..16384, ra: bool, ca: bool) {
            let addr = CellAddress::with_absolute(row, col, ra, ca);
            prop_assert_eq!(CellAddress::parse(&addr.to_string()).unwrap(), addr);
        }
    }
}
