//! Number format types and date/time classification

use once_cell::sync::Lazy;
use regex::Regex;

/// First id available for custom format codes
pub const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

/// What kind of value a number format renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCategory {
    /// Plain numbers, text, percentages...
    Number,
    /// Calendar dates, with or without a time part
    Date,
    /// Times of day and elapsed durations
    Time,
}

impl NumberFormat {
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 21 - h:mm:ss
    pub const ID_TIME_24H_SEC: u32 = 21;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// Create a number format from a format string
    pub fn from_string<S: Into<String>>(format: S) -> Self {
        NumberFormat::Custom(format.into())
    }

    /// Map a numFmtId to a format, given the custom codes declared in a package
    ///
    /// Unknown ids fall back to [`NumberFormat::General`].
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => NumberFormat::General,
            id if builtin_format_code(id).is_some() => NumberFormat::BuiltIn(id),
            _ => NumberFormat::General,
        }
    }

    /// Short date (mm-dd-yy)
    pub fn date_short() -> Self {
        NumberFormat::BuiltIn(Self::ID_DATE_SHORT)
    }

    /// Time (h:mm:ss)
    pub fn time() -> Self {
        NumberFormat::BuiltIn(Self::ID_TIME_24H_SEC)
    }

    /// Text format (@)
    pub fn text() -> Self {
        NumberFormat::BuiltIn(Self::ID_TEXT)
    }

    /// Check if this is the General format
    pub fn is_general(&self) -> bool {
        matches!(self, NumberFormat::General | NumberFormat::BuiltIn(0))
    }

    /// Get the format string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => builtin_format_code(*id).unwrap_or("General"),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Classify what this format renders
    pub fn category(&self) -> FormatCategory {
        match self {
            NumberFormat::General => FormatCategory::Number,
            NumberFormat::BuiltIn(id) => builtin_category(*id),
            NumberFormat::Custom(code) => classify_format_code(code),
        }
    }

    /// Check if this is a date format
    pub fn is_date_format(&self) -> bool {
        self.category() == FormatCategory::Date
    }

    /// Check if this is a time format
    pub fn is_time_format(&self) -> bool {
        self.category() == FormatCategory::Time
    }

    /// Merge helper: a non-General overlay wins
    pub fn merge(&self, overlay: &NumberFormat) -> NumberFormat {
        if overlay.is_general() {
            self.clone()
        } else {
            overlay.clone()
        }
    }
}

fn builtin_category(id: u32) -> FormatCategory {
    match id {
        14..=17 | 22 | 27..=36 | 50..=58 => FormatCategory::Date,
        18..=21 | 45..=47 => FormatCategory::Time,
        _ => FormatCategory::Number,
    }
}

/// Format code of a built-in id, if the id is defined
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        // Locale-dependent East Asian date formats
        27..=36 | 50..=58 => "m/d/yy",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Quoted literals, escaped characters, fill/space markers and bracketed
/// sections (colors, conditions, locales).
static LITERALS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""[^"]*"|\\.|_.|\*.|\[[^\]]*\]"#).expect("literal pattern is valid")
});

/// Elapsed-time sections such as `[h]` or `[mm]`
static ELAPSED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[(h+|m+|s+)\]").expect("elapsed pattern is valid"));

/// Classify a custom format code
///
/// Only the first (positive) section is inspected. Literal text is
/// stripped first so that e.g. `0 "days"` is not mistaken for a date.
pub fn classify_format_code(code: &str) -> FormatCategory {
    let section = first_section(code);
    if ELAPSED.is_match(section) {
        return FormatCategory::Time;
    }

    let stripped = LITERALS.replace_all(section, "").to_ascii_lowercase();
    let has = |c: char| stripped.contains(c);

    if has('y') || has('d') {
        FormatCategory::Date
    } else if has('h') || has('s') {
        FormatCategory::Time
    } else if has('m') && !stripped.contains("am/pm") {
        // A lone month token ("mmm")
        FormatCategory::Date
    } else {
        FormatCategory::Number
    }
}

fn first_section(code: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in code.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return &code[..i],
            _ => {}
        }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_categories() {
        assert!(NumberFormat::BuiltIn(14).is_date_format());
        assert!(NumberFormat::BuiltIn(22).is_date_format());
        assert!(NumberFormat::BuiltIn(21).is_time_format());
        assert!(NumberFormat::BuiltIn(46).is_time_format());
        assert_eq!(NumberFormat::BuiltIn(4).category(), FormatCategory::Number);
        assert_eq!(NumberFormat::General.category(), FormatCategory::Number);
    }

    #[test]
    fn test_custom_code_classification() {
        let cases = [
            ("yyyy-mm-dd", FormatCategory::Date),
            ("dd/mm/yyyy hh:mm", FormatCategory::Date),
            ("mmm", FormatCategory::Date),
            ("hh:mm:ss", FormatCategory::Time),
            ("h:mm AM/PM", FormatCategory::Time),
            ("[h]:mm", FormatCategory::Time),
            ("[mm]:ss", FormatCategory::Time),
            ("0.00", FormatCategory::Number),
            ("0 \"days\"", FormatCategory::Number),
            ("[Red]#,##0", FormatCategory::Number),
            ("#,##0.00 \\d", FormatCategory::Number),
            ("0;[Red]\"-\"0", FormatCategory::Number),
            ("@", FormatCategory::Number),
            ("General", FormatCategory::Number),
        ];
        for (code, expected) in cases {
            assert_eq!(classify_format_code(code), expected, "code {:?}", code);
        }
    }

    #[test]
    fn test_first_section() {
        assert_eq!(first_section("0.00;[Red]-0.00"), "0.00");
        assert_eq!(first_section("\"a;b\"0;0"), "\"a;b\"0");
        assert_eq!(first_section("0\\;0;x"), "0\\;0");
    }

    #[test]
    fn test_from_id_unknown_is_general() {
        assert_eq!(NumberFormat::from_id(14), NumberFormat::BuiltIn(14));
        assert_eq!(NumberFormat::from_id(0), NumberFormat::General);
        assert_eq!(NumberFormat::from_id(163), NumberFormat::General);
    }

    #[test]
    fn test_merge() {
        let base = NumberFormat::from_string("0.000");
        assert_eq!(base.merge(&NumberFormat::General), base);
        assert_eq!(
            base.merge(&NumberFormat::date_short()),
            NumberFormat::BuiltIn(14)
        );
    }
}
