//! Cell styling types
//!
//! A [`Style`] is a plain value made of five components:
//! - [`FontStyle`] - Font settings
//! - [`FillStyle`] - Background fill
//! - [`BorderStyle`] - Cell borders
//! - [`NumberFormat`] - Display format
//! - [`CellXf`] - Alignment, protection and apply flags
//!
//! Styles are compared by value and deduplicated by the [`StyleRegistry`].

/// Fieldless enum whose variants carry their attribute value in the
/// styles part
macro_rules! ooxml_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $xml:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Attribute value in the styles part
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $xml,)+
                }
            }

            /// Variant for an attribute value, `None` when unknown
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($xml => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

mod alignment;
mod border;
mod color;
mod fill;
mod font;
mod number_format;
mod registry;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{BorderEdge, BorderLineStyle, BorderStyle, DiagonalDirection};
pub use color::Color;
pub use fill::{FillStyle, PatternType};
pub use font::{FontScheme, FontStyle, FontVerticalAlign, Underline};
pub use number_format::{
    builtin_format_code, classify_format_code, FormatCategory, NumberFormat,
    FIRST_CUSTOM_FORMAT_ID,
};
pub use registry::{ComponentKind, StyleComponent, StyleRegistry, XfRecord};

/// Complete cell style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Font settings
    pub font: FontStyle,
    /// Fill/background settings
    pub fill: FillStyle,
    /// Border settings
    pub border: BorderStyle,
    /// Number format
    pub number_format: NumberFormat,
    /// Alignment, protection and apply flags
    pub cell_xf: CellXf,
}

impl Style {
    /// Create a new default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Number format 14 (short date)
    pub fn date_format() -> Self {
        Self::new().with_number_format(NumberFormat::date_short())
    }

    /// Number format 21 (h:mm:ss)
    pub fn time_format() -> Self {
        Self::new().with_number_format(NumberFormat::time())
    }

    /// Marker merged into the hidden cells of a merged region
    pub fn merge_marker() -> Self {
        let mut style = Self::new();
        style.cell_xf.force_apply_alignment = true;
        style
    }

    /// Set font to bold
    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    /// Set font to italic
    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    /// Set font size in points
    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    /// Set font name
    pub fn font_name<S: Into<String>>(mut self, name: S) -> Self {
        self.font.name = name.into();
        self
    }

    /// Set font color
    pub fn font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Set fill color (solid fill)
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = FillStyle::Solid { color };
        self
    }

    /// Set the border
    pub fn with_border(mut self, border: BorderStyle) -> Self {
        self.border = border;
        self
    }

    /// Set a custom number format string
    pub fn number_format<S: Into<String>>(self, format: S) -> Self {
        self.with_number_format(NumberFormat::Custom(format.into()))
    }

    /// Set the number format
    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }

    /// Set horizontal alignment
    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.cell_xf.alignment.horizontal = align;
        self
    }

    /// Set vertical alignment
    pub fn vertical_alignment(mut self, align: VerticalAlignment) -> Self {
        self.cell_xf.alignment.vertical = align;
        self
    }

    /// Enable text wrapping
    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.cell_xf.alignment.wrap_text = wrap;
        self
    }

    /// Set the cell lock flag
    pub fn locked(mut self, locked: bool) -> Self {
        self.cell_xf.locked = locked;
        self
    }

    /// Hide formulas when the sheet is protected
    pub fn formula_hidden(mut self, hidden: bool) -> Self {
        self.cell_xf.hidden = hidden;
        self
    }

    /// Combine two styles; fields set on `overlay` win, unset ones fall
    /// through to `base`
    ///
    /// A field counts as set when it differs from the default style.
    pub fn merge(base: &Style, overlay: &Style) -> Style {
        Style {
            font: base.font.merge(&overlay.font),
            fill: base.fill.merge(&overlay.fill),
            border: base.border.merge(&overlay.border),
            number_format: base.number_format.merge(&overlay.number_format),
            cell_xf: base.cell_xf.merge(&overlay.cell_xf),
        }
    }

    /// Check if this is the default style
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }
}

/// Composite cell format record: alignment, protection and apply flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellXf {
    /// Text alignment
    pub alignment: Alignment,
    /// Cell is locked when the sheet is protected
    pub locked: bool,
    /// Formula is hidden when the sheet is protected
    pub hidden: bool,
    /// Write `applyAlignment` even when the alignment is default
    pub force_apply_alignment: bool,
}

impl Default for CellXf {
    fn default() -> Self {
        Self {
            alignment: Alignment::default(),
            locked: true,
            hidden: false,
            force_apply_alignment: false,
        }
    }
}

impl CellXf {
    /// Create the default record
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the protection flags differ from the defaults
    pub fn has_protection(&self) -> bool {
        !self.locked || self.hidden
    }

    /// Overlay every non-default field of `overlay`
    pub fn merge(&self, overlay: &CellXf) -> CellXf {
        let d = CellXf::default();
        CellXf {
            alignment: self.alignment.merge(&overlay.alignment),
            locked: if overlay.locked != d.locked {
                overlay.locked
            } else {
                self.locked
            },
            hidden: overlay.hidden || self.hidden,
            force_apply_alignment: overlay.force_apply_alignment || self.force_apply_alignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attribute_names_round_trip() {
        for &p in PatternType::ALL {
            assert_eq!(PatternType::from_name(p.as_str()), Some(p));
        }
        for &b in BorderLineStyle::ALL {
            assert_eq!(BorderLineStyle::from_name(b.as_str()), Some(b));
        }
        for &h in HorizontalAlignment::ALL {
            assert_eq!(HorizontalAlignment::from_name(h.as_str()), Some(h));
        }
        assert_eq!(PatternType::ALL.len(), 19);
        assert_eq!(BorderLineStyle::SlantDashDot.as_str(), "slantDashDot");
        assert_eq!(Underline::from_name("doubleAccounting"), Some(Underline::DoubleAccounting));
        assert_eq!(VerticalAlignment::default(), VerticalAlignment::Bottom);
        assert_eq!(FontScheme::default(), FontScheme::Minor);
        assert_eq!(PatternType::from_name("zigzag"), None);
    }

    #[test]
    fn test_merge_overlay_wins() {
        let active = Style::new().bold(true).fill_color(Color::YELLOW);
        let explicit = Style::new().italic(true).fill_color(Color::RED);

        let merged = Style::merge(&active, &explicit);
        assert!(merged.font.bold);
        assert!(merged.font.italic);
        assert_eq!(merged.fill, FillStyle::solid(Color::RED));
    }

    #[test]
    fn test_merge_unset_falls_through() {
        let base = Style::new()
            .font_name("Arial")
            .number_format("0.000")
            .horizontal_alignment(HorizontalAlignment::Center);
        let merged = Style::merge(&base, &Style::new());
        assert_eq!(merged, base);

        let merged = Style::merge(&Style::new(), &base);
        assert_eq!(merged, base);
    }

    #[test]
    fn test_merge_marker_survives_merge() {
        let existing = Style::new().bold(true);
        let merged = Style::merge(&existing, &Style::merge_marker());
        assert!(merged.font.bold);
        assert!(merged.cell_xf.force_apply_alignment);
    }

    #[test]
    fn test_presets() {
        assert!(Style::date_format().number_format.is_date_format());
        assert!(Style::time_format().number_format.is_time_format());
        assert!(!Style::merge_marker().is_default());
        assert!(Style::new().is_default());
    }

    #[test]
    fn test_unlock_via_merge() {
        let merged = Style::merge(&Style::new(), &Style::new().locked(false));
        assert!(!merged.cell_xf.locked);
        assert!(merged.cell_xf.has_protection());
    }
}
