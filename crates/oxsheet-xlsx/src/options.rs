//! Import options for the reader

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use oxsheet_core::{CellValue, Number};
use rust_decimal::Decimal;

/// Conversion applied to every cell of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlobalCoercion {
    /// Keep resolved types
    #[default]
    None,
    /// Numbers become `f64`
    AllNumbersToFloat,
    /// Numbers become `i64` (rounded half away from zero)
    AllNumbersToInt,
    /// Numbers become decimals
    AllNumbersToDecimal,
    /// Every value becomes its text
    EverythingToString,
}

/// Conversion applied to a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCoercion {
    /// Parse text as a number, keep numbers
    Numeric,
    Float,
    Int,
    Decimal,
    Bool,
    Date,
    Time,
    String,
}

/// Options controlling how a workbook is imported
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    /// Sheet-wide conversion
    pub global_coercion: GlobalCoercion,
    /// Per-column conversions; these win over the global rule
    pub column_coercions: BTreeMap<u16, ColumnCoercion>,
    /// First row (0-based) that conversions apply to
    pub coercion_start_row: u32,
    /// Keep date/time formatted numbers as numbers
    pub dates_as_numbers: bool,
    /// Turn empty cells into empty strings when a conversion applies
    pub empty_as_string: bool,
    /// `chrono` format for parsing dates out of text
    pub date_format: String,
    /// `chrono` format for parsing times out of text
    pub time_format: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            global_coercion: GlobalCoercion::None,
            column_coercions: BTreeMap::new(),
            coercion_start_row: 0,
            dates_as_numbers: false,
            empty_as_string: false,
            date_format: "%Y-%m-%d".to_string(),
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

impl ReadOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global_coercion(mut self, coercion: GlobalCoercion) -> Self {
        self.global_coercion = coercion;
        self
    }

    pub fn with_column_coercion(mut self, col: u16, coercion: ColumnCoercion) -> Self {
        self.column_coercions.insert(col, coercion);
        self
    }

    /// Leave rows before `row` untouched (header rows)
    pub fn with_coercion_start_row(mut self, row: u32) -> Self {
        self.coercion_start_row = row;
        self
    }

    pub fn with_dates_as_numbers(mut self, enabled: bool) -> Self {
        self.dates_as_numbers = enabled;
        self
    }

    pub fn with_empty_as_string(mut self, enabled: bool) -> Self {
        self.empty_as_string = enabled;
        self
    }

    pub fn with_date_format<S: Into<String>>(mut self, format: S) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_time_format<S: Into<String>>(mut self, format: S) -> Self {
        self.time_format = format.into();
        self
    }

    /// Check if any conversion is configured
    pub fn has_coercion(&self) -> bool {
        self.global_coercion != GlobalCoercion::None || !self.column_coercions.is_empty()
    }

    /// Apply the configured conversion to a resolved value
    ///
    /// A value that cannot be converted is returned unchanged.
    pub fn coerce(&self, value: CellValue, row: u32, col: u16) -> CellValue {
        if row < self.coercion_start_row {
            return value;
        }
        if let Some(&rule) = self.column_coercions.get(&col) {
            return self.coerce_column(value, rule);
        }
        self.coerce_global(value)
    }

    fn coerce_global(&self, value: CellValue) -> CellValue {
        let value = match value {
            CellValue::Empty if self.empty_as_string && self.global_coercion != GlobalCoercion::None => {
                return CellValue::string("");
            }
            other => other,
        };
        match self.global_coercion {
            GlobalCoercion::None => value,
            GlobalCoercion::AllNumbersToFloat => match &value {
                CellValue::Number(n) => CellValue::Number(Number::Float(n.as_f64())),
                _ => value,
            },
            GlobalCoercion::AllNumbersToInt => match &value {
                CellValue::Number(n) => float_to_int(n.as_f64()).map_or(value, Into::into),
                _ => value,
            },
            GlobalCoercion::AllNumbersToDecimal => match &value {
                CellValue::Number(n) => n.as_decimal().map_or(value, Into::into),
                _ => value,
            },
            GlobalCoercion::EverythingToString => match &value {
                CellValue::Empty | CellValue::String(_) => value,
                other => CellValue::string(value_text(other, self)),
            },
        }
    }

    fn coerce_column(&self, value: CellValue, rule: ColumnCoercion) -> CellValue {
        if value.is_empty() {
            return if self.empty_as_string {
                CellValue::string("")
            } else {
                value
            };
        }
        let converted = match rule {
            ColumnCoercion::Numeric => match &value {
                CellValue::Number(_) => None,
                other => text_of(other).and_then(parse_number).map(CellValue::Number),
            },
            ColumnCoercion::Float => as_float(&value).map(|f| CellValue::Number(Number::Float(f))),
            ColumnCoercion::Int => as_float(&value).and_then(float_to_int).map(Into::into),
            ColumnCoercion::Decimal => match &value {
                CellValue::Number(n) => n.as_decimal().map(Into::into),
                other => text_of(other)
                    .and_then(|s| s.trim().parse::<Decimal>().ok())
                    .map(Into::into),
            },
            ColumnCoercion::Bool => match &value {
                CellValue::Bool(_) => None,
                CellValue::Number(n) => Some(CellValue::Bool(n.as_f64() != 0.0)),
                other => text_of(other).and_then(parse_bool).map(CellValue::Bool),
            },
            ColumnCoercion::Date => match &value {
                CellValue::Date(_) => None,
                CellValue::Number(n) => {
                    oxsheet_core::date::serial_to_date(n.as_f64(), false).map(CellValue::Date)
                }
                other => text_of(other)
                    .and_then(|s| self.parse_date(s))
                    .map(CellValue::Date),
            },
            ColumnCoercion::Time => match &value {
                CellValue::Time(_) => None,
                CellValue::Number(n) => {
                    oxsheet_core::date::serial_to_time(n.as_f64()).map(CellValue::Time)
                }
                other => text_of(other)
                    .and_then(|s| NaiveTime::parse_from_str(s.trim(), &self.time_format).ok())
                    .map(|t| CellValue::Time(t - NaiveTime::MIN)),
            },
            ColumnCoercion::String => match &value {
                CellValue::String(_) => None,
                other => Some(CellValue::string(value_text(other, self))),
            },
        };
        converted.unwrap_or(value)
    }

    fn parse_date(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        NaiveDateTime::parse_from_str(text, &self.date_format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, &self.date_format)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    }
}

fn text_of(value: &CellValue) -> Option<&str> {
    match value {
        CellValue::String(s) => Some(s.as_str()),
        CellValue::Formula(f) => Some(f.as_str()),
        _ => None,
    }
}

fn as_float(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => Some(n.as_f64()),
        CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => text_of(other).and_then(|s| s.trim().parse::<f64>().ok()),
    }
    .filter(|f| f.is_finite())
}

fn float_to_int(f: f64) -> Option<i64> {
    let rounded = f.round();
    (rounded.is_finite() && rounded.abs() < i64::MAX as f64).then_some(rounded as i64)
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::Int(i));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Number::Float)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn value_text(value: &CellValue, options: &ReadOptions) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Number(n) => n.to_string(),
        CellValue::Date(d) => d.format(&options.date_format).to_string(),
        CellValue::Time(t) => (NaiveTime::MIN + *t).format(&options.time_format).to_string(),
        CellValue::String(s) => s.as_str().to_string(),
        CellValue::Formula(f) => f.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_header_rows_are_not_coerced() {
        let options = ReadOptions::new()
            .with_global_coercion(GlobalCoercion::EverythingToString)
            .with_coercion_start_row(1);

        assert_eq!(options.coerce(CellValue::from(5), 0, 0), CellValue::from(5));
        assert_eq!(options.coerce(CellValue::from(5), 1, 0), CellValue::string("5"));
    }

    #[test]
    fn test_column_rule_wins() {
        let options = ReadOptions::new()
            .with_global_coercion(GlobalCoercion::AllNumbersToFloat)
            .with_column_coercion(1, ColumnCoercion::Int);

        assert_eq!(
            options.coerce(CellValue::from(2.6), 0, 1),
            CellValue::Number(Number::Int(3))
        );
        assert_eq!(
            options.coerce(CellValue::from(2_i64), 0, 0),
            CellValue::Number(Number::Float(2.0))
        );
    }

    #[test]
    fn test_unconvertible_value_is_kept() {
        let options = ReadOptions::new().with_column_coercion(0, ColumnCoercion::Numeric);
        assert_eq!(
            options.coerce(CellValue::string("n/a"), 3, 0),
            CellValue::string("n/a")
        );
        assert_eq!(
            options.coerce(CellValue::string(" 42 "), 3, 0),
            CellValue::Number(Number::Int(42))
        );
    }

    #[test]
    fn test_text_to_date_and_time() {
        let options = ReadOptions::new()
            .with_column_coercion(0, ColumnCoercion::Date)
            .with_column_coercion(1, ColumnCoercion::Time);

        let date = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            options.coerce(CellValue::string("2024-03-15"), 0, 0),
            CellValue::Date(date)
        );
        assert_eq!(
            options.coerce(CellValue::string("12:30:00"), 0, 1),
            CellValue::Time(Duration::minutes(750))
        );
    }

    #[test]
    fn test_empty_as_string() {
        let options = ReadOptions::new()
            .with_column_coercion(0, ColumnCoercion::Bool)
            .with_empty_as_string(true);
        assert_eq!(options.coerce(CellValue::Empty, 0, 0), CellValue::string(""));
        assert_eq!(
            options.coerce(CellValue::string("yes"), 0, 0),
            CellValue::Bool(true)
        );
    }
}
