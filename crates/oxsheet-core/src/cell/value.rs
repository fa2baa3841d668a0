//! Cell value types

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{Error, Result};

/// A numeric cell payload, kept at its native width
///
/// The serialized literal is produced from the native type, so an `f32`
/// written as `22.2` is not widened to `22.200000762939453`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Single precision float
    Float32(f32),
    /// Double precision float
    Float(f64),
    /// Fixed-point decimal
    Decimal(Decimal),
}

impl Number {
    /// Lossy conversion to `f64`
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::UInt(n) => *n as f64,
            Number::Float32(n) => *n as f64,
            Number::Float(n) => *n,
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Integer value, if the number has no fractional part and fits in `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(n) => Some(*n),
            Number::UInt(n) => i64::try_from(*n).ok(),
            Number::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            other => {
                let f = other.as_f64();
                (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .then_some(f as i64)
            }
        }
    }

    /// Decimal value, if representable
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Number::Int(n) => Some(Decimal::from(*n)),
            Number::UInt(n) => Some(Decimal::from(*n)),
            Number::Float32(n) => Decimal::from_f32_retain(*n),
            Number::Float(n) => Decimal::from_f64_retain(*n),
            Number::Decimal(d) => Some(*d),
        }
    }

    /// Whether the value can be written as a finite XML number
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Float32(n) => n.is_finite(),
            Number::Float(n) => n.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::UInt(n) => write!(f, "{}", n),
            Number::Float32(n) => write!(f, "{}", n),
            Number::Float(n) => write!(f, "{}", n),
            Number::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// The value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Bool(bool),

    /// Numeric value
    Number(Number),

    /// Calendar date or timestamp
    Date(NaiveDateTime),

    /// Time of day or elapsed duration
    Time(Duration),

    /// String value
    String(SharedString),

    /// Formula text without the leading `=`, never evaluated
    Formula(String),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: AsRef<str>>(s: S) -> Self {
        CellValue::String(SharedString::new(s))
    }

    /// Create a new formula value; a leading `=` is dropped
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        match text.strip_prefix('=') {
            Some(body) => CellValue::Formula(body.to_string()),
            None => CellValue::Formula(text),
        }
    }

    /// Stringify any displayable value
    ///
    /// This is the fallback for values with no dedicated cell type: the
    /// textual representation is stored as a plain string.
    pub fn from_display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        CellValue::string(value.to_string())
    }

    /// The cell type this value resolves to
    pub fn resolve_type(&self) -> CellType {
        match self {
            CellValue::Empty => CellType::Empty,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Number(_) => CellType::Number,
            CellValue::Date(_) => CellType::Date,
            CellValue::Time(_) => CellType::Time,
            CellValue::String(_) => CellType::String,
            CellValue::Formula(_) => CellType::Formula,
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as a date
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get the value as a time
    pub fn as_time(&self) -> Option<Duration> {
        match self {
            CellValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Get the formula text if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula(text) => Some(text),
            _ => None,
        }
    }

    /// Formulas are kept without their leading `=` so that what a cell
    /// holds is exactly what the sheet XML stores
    fn normalize_formula(self) -> Self {
        match self {
            CellValue::Formula(text) if text.starts_with('=') => CellValue::formula(text),
            other => other,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.resolve_type().name()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d),
            CellValue::Time(t) => {
                let secs = t.num_seconds();
                write!(f, "{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
            }
            CellValue::String(s) => write!(f, "{}", s.as_str()),
            CellValue::Formula(text) => write!(f, "{}", text),
        }
    }
}

macro_rules! impl_from_number {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for CellValue {
                fn from(n: $t) -> Self {
                    CellValue::Number(Number::$variant(n as $target))
                }
            }
        )*
    };
}

impl_from_number!(Int as i64: i8, i16, i32, i64, isize);
impl_from_number!(UInt as u64: u8, u16, u32, u64, usize);

impl From<f32> for CellValue {
    fn from(n: f32) -> Self {
        CellValue::Number(Number::Float32(n))
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(Number::Float(n))
    }
}

impl From<Decimal> for CellValue {
    fn from(d: Decimal) -> Self {
        CellValue::Number(Number::Decimal(d))
    }
}

impl From<Number> for CellValue {
    fn from(n: Number) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl From<SharedString> for CellValue {
    fn from(s: SharedString) -> Self {
        CellValue::String(s)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(d: NaiveDateTime) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d.and_time(NaiveTime::MIN))
    }
}

impl From<NaiveTime> for CellValue {
    fn from(t: NaiveTime) -> Self {
        CellValue::Time(
            Duration::seconds(t.num_seconds_from_midnight() as i64)
                + Duration::nanoseconds(t.nanosecond() as i64),
        )
    }
}

impl From<Duration> for CellValue {
    fn from(d: Duration) -> Self {
        CellValue::Time(d)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

/// Cell type tag
///
/// `Default` is a transient tag meaning "derive from the value"; it is
/// resolved again before every read or write of the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellType {
    Empty,
    Bool,
    Number,
    Date,
    Time,
    String,
    Formula,
    #[default]
    Default,
}

impl CellType {
    /// Lowercase name of the type
    pub fn name(&self) -> &'static str {
        match self {
            CellType::Empty => "empty",
            CellType::Bool => "bool",
            CellType::Number => "number",
            CellType::Date => "date",
            CellType::Time => "time",
            CellType::String => "string",
            CellType::Formula => "formula",
            CellType::Default => "default",
        }
    }
}

/// A stored cell: value, resolved type and style reference
///
/// `style_index` refers to the owning worksheet's style registry
/// (0 = default style).
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// The cell's value
    pub value: CellValue,
    /// The cell's type tag
    pub cell_type: CellType,
    /// Index into the worksheet style registry
    pub style_index: u32,
}

impl Cell {
    /// Create a cell, resolving its type from the value
    pub fn new<V: Into<CellValue>>(value: V) -> Self {
        let value = value.into().normalize_formula();
        Self {
            cell_type: value.resolve_type(),
            value,
            style_index: 0,
        }
    }

    /// Create a cell with an explicit type tag
    ///
    /// - `Default` resolves from the value.
    /// - `Empty` keeps the payload but marks the cell as empty.
    /// - `Formula` accepts formula values and plain strings (caller intent).
    /// - Any other tag must match the value's resolved type.
    pub fn with_type<V: Into<CellValue>>(value: V, cell_type: CellType) -> Result<Self> {
        let value = value.into();
        let resolved = value.resolve_type();

        let (value, cell_type) = match (cell_type, value) {
            (CellType::Default, value) => (value, resolved),
            (CellType::Empty, value) => (value, CellType::Empty),
            (CellType::Formula, CellValue::String(s)) => {
                (CellValue::formula(s.as_str()), CellType::Formula)
            }
            (requested, value) if requested == resolved => (value, requested),
            (requested, _) => {
                return Err(Error::InvalidValueType {
                    expected: requested.name(),
                    actual: resolved.name(),
                })
            }
        };

        Ok(Self {
            value: value.normalize_formula(),
            cell_type,
            style_index: 0,
        })
    }

    /// Create an empty cell
    pub fn empty() -> Self {
        Self::new(CellValue::Empty)
    }

    /// Set the style index
    pub fn with_style(mut self, style_index: u32) -> Self {
        self.style_index = style_index;
        self
    }

    /// The type used for serialization, re-resolving a `Default` tag
    pub fn effective_type(&self) -> CellType {
        match self.cell_type {
            CellType::Default => self.value.resolve_type(),
            other => other,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

/// Reference-counted immutable string
///
/// Strings are often repeated across cells; `Arc<str>` lets the cell map,
/// the shared-string table and readers share the same allocation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both handles share one allocation
    pub fn ptr_eq(&self, other: &SharedString) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SharedString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString(Arc::from(s))
    }
}
