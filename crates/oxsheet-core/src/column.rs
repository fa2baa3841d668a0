//! Column metadata

/// Default column width in characters
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Largest column width the format accepts
pub const MAX_COLUMN_WIDTH: f64 = 255.0;

/// Per-column settings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnMeta {
    /// Custom width in characters (None = default)
    pub width: Option<f64>,
    /// Column is hidden
    pub hidden: bool,
    /// Column carries an auto-filter button
    pub has_auto_filter: bool,
}

impl ColumnMeta {
    /// Create default column settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set width
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set hidden
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Width in characters, falling back to `default_width`
    pub fn width_or(&self, default_width: f64) -> f64 {
        self.width.unwrap_or(default_width)
    }

    /// Whether this entry carries nothing worth serializing
    pub fn is_default(&self, default_width: f64) -> bool {
        let default_width = self
            .width
            .map_or(true, |w| (w - default_width).abs() < 0.001);
        default_width && !self.hidden && !self.has_auto_filter
    }
}

/// Column width in characters to on-screen pixels
///
/// Uses the 7-pixel maximum digit width of the default font with the
/// rounding the format's column model prescribes.
pub fn column_width_to_pixels(width: f64) -> f64 {
    const MAX_DIGIT_WIDTH: f64 = 7.0;
    let padding = (128.0 / MAX_DIGIT_WIDTH).trunc();
    (((256.0 * width + padding) / 256.0) * MAX_DIGIT_WIDTH).trunc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_default() {
        assert!(ColumnMeta::new().is_default(DEFAULT_COLUMN_WIDTH));
        assert!(ColumnMeta::new()
            .with_width(DEFAULT_COLUMN_WIDTH)
            .is_default(DEFAULT_COLUMN_WIDTH));
        assert!(!ColumnMeta::new().with_width(20.0).is_default(DEFAULT_COLUMN_WIDTH));
        assert!(!ColumnMeta::new().with_hidden(true).is_default(DEFAULT_COLUMN_WIDTH));

        let filtered = ColumnMeta {
            has_auto_filter: true,
            ..ColumnMeta::default()
        };
        assert!(!filtered.is_default(DEFAULT_COLUMN_WIDTH));
    }

    #[test]
    fn test_width_to_pixels() {
        assert_eq!(column_width_to_pixels(DEFAULT_COLUMN_WIDTH), 59.0);
        assert_eq!(column_width_to_pixels(10.0), 70.0);
        assert_eq!(column_width_to_pixels(0.0), 0.0);
    }
}
