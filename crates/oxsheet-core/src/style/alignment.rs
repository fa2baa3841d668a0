//! Alignment component of a cell format

/// The `alignment` child of a `cellXfs` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
    /// Indent level (0-250)
    pub indent: u8,
    /// Text rotation in degrees (0-180, or 255 for stacked text)
    pub rotation: u8,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_horizontal(mut self, align: HorizontalAlignment) -> Self {
        self.horizontal = align;
        self
    }

    pub fn with_vertical(mut self, align: VerticalAlignment) -> Self {
        self.vertical = align;
        self
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap_text = wrap;
        self
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// General/bottom, no wrap, shrink, indent or rotation
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay every non-default field of `overlay`
    ///
    /// Flags are sticky: a flag set on either side stays set.
    pub fn merge(&self, overlay: &Alignment) -> Alignment {
        let d = Alignment::default();
        let pick = |over: u8, base: u8, default: u8| if over != default { over } else { base };
        Alignment {
            horizontal: if overlay.horizontal != d.horizontal {
                overlay.horizontal
            } else {
                self.horizontal
            },
            vertical: if overlay.vertical != d.vertical {
                overlay.vertical
            } else {
                self.vertical
            },
            wrap_text: overlay.wrap_text || self.wrap_text,
            shrink_to_fit: overlay.shrink_to_fit || self.shrink_to_fit,
            indent: pick(overlay.indent, self.indent, d.indent),
            rotation: pick(overlay.rotation, self.rotation, d.rotation),
        }
    }
}

ooxml_enum! {
    pub enum HorizontalAlignment {
        /// Text left, numbers right
        #[default]
        General = "general",
        Left = "left",
        Center = "center",
        Right = "right",
        Fill = "fill",
        Justify = "justify",
        CenterContinuous = "centerContinuous",
        Distributed = "distributed",
    }
}

ooxml_enum! {
    pub enum VerticalAlignment {
        Top = "top",
        Center = "center",
        #[default]
        Bottom = "bottom",
        Justify = "justify",
        Distributed = "distributed",
    }
}
