//! Font component

use std::hash::{Hash, Hasher};

use super::Color;

/// One entry of the `fonts` table
///
/// The default is the package body font: Calibri 11, theme text color,
/// swiss family, minor scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct FontStyle {
    pub name: String,
    /// Size in points
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strikethrough: bool,
    pub color: Color,
    pub vertical_align: FontVerticalAlign,
    /// Family class (2 = swiss)
    pub family: u8,
    pub scheme: FontScheme,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
            italic: false,
            underline: Underline::None,
            strikethrough: false,
            color: Color::theme(1, 0),
            vertical_align: FontVerticalAlign::Baseline,
            family: 2,
            scheme: FontScheme::Minor,
        }
    }
}

impl FontStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name<S: Into<String>>(self, name: S) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn with_size(self, size: f64) -> Self {
        Self { size, ..self }
    }

    pub fn with_bold(self, bold: bool) -> Self {
        Self { bold, ..self }
    }

    pub fn with_italic(self, italic: bool) -> Self {
        Self { italic, ..self }
    }

    pub fn with_underline(self, underline: Underline) -> Self {
        Self { underline, ..self }
    }

    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }

    /// Field-by-field overlay: a field of `overlay` that differs from the
    /// default font replaces the matching field of `self`
    pub fn merge(&self, overlay: &FontStyle) -> FontStyle {
        fn pick<T: PartialEq + Clone>(base: &T, over: &T, default: &T) -> T {
            if over != default { over.clone() } else { base.clone() }
        }

        let d = FontStyle::default();
        FontStyle {
            name: pick(&self.name, &overlay.name, &d.name),
            size: pick(&self.size, &overlay.size, &d.size),
            bold: pick(&self.bold, &overlay.bold, &d.bold),
            italic: pick(&self.italic, &overlay.italic, &d.italic),
            underline: pick(&self.underline, &overlay.underline, &d.underline),
            strikethrough: pick(&self.strikethrough, &overlay.strikethrough, &d.strikethrough),
            color: pick(&self.color, &overlay.color, &d.color),
            vertical_align: pick(&self.vertical_align, &overlay.vertical_align, &d.vertical_align),
            family: pick(&self.family, &overlay.family, &d.family),
            scheme: pick(&self.scheme, &overlay.scheme, &d.scheme),
        }
    }
}

// `size` is compared bitwise so equal fonts hash equally
impl Hash for FontStyle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (
            &self.name,
            self.size.to_bits(),
            self.bold,
            self.italic,
            self.underline,
            self.strikethrough,
        )
            .hash(state);
        (self.color, self.vertical_align, self.family, self.scheme).hash(state);
    }
}

impl Eq for FontStyle {}

ooxml_enum! {
    pub enum Underline {
        #[default]
        None = "none",
        Single = "single",
        Double = "double",
        SingleAccounting = "singleAccounting",
        DoubleAccounting = "doubleAccounting",
    }
}

ooxml_enum! {
    /// Superscript/subscript
    pub enum FontVerticalAlign {
        #[default]
        Baseline = "baseline",
        Superscript = "superscript",
        Subscript = "subscript",
    }
}

ooxml_enum! {
    /// Theme font binding
    pub enum FontScheme {
        /// Not bound to the theme
        None = "none",
        /// Heading font
        Major = "major",
        /// Body font
        #[default]
        Minor = "minor",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_keeps_base_where_unset() {
        let base = FontStyle::new().with_name("Arial").with_italic(true);
        let overlay = FontStyle::new().with_bold(true).with_size(14.0);
        let merged = base.merge(&overlay);

        assert_eq!(merged.name, "Arial");
        assert!(merged.italic && merged.bold);
        assert_eq!(merged.size, 14.0);
        assert_eq!(merged.scheme, FontScheme::Minor);
    }
}
