//! Fill/background style types

use super::Color;

/// Fill style for cell background
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FillStyle {
    /// No fill (transparent)
    #[default]
    None,

    /// Solid color fill
    Solid { color: Color },

    /// Pattern fill
    Pattern {
        pattern: PatternType,
        foreground: Color,
        background: Color,
    },
}

impl FillStyle {
    /// Create a solid fill with the given color
    pub fn solid(color: Color) -> Self {
        FillStyle::Solid { color }
    }

    /// Create a pattern fill
    pub fn pattern(pattern: PatternType, foreground: Color, background: Color) -> Self {
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        }
    }

    /// The reserved 12.5% gray fill every package carries at index 1
    pub fn gray125() -> Self {
        FillStyle::Pattern {
            pattern: PatternType::Gray125,
            foreground: Color::Auto,
            background: Color::Auto,
        }
    }

    /// Check if this is a "no fill"
    pub fn is_none(&self) -> bool {
        matches!(self, FillStyle::None)
    }

    /// A set overlay fill replaces the base fill
    pub fn merge(&self, overlay: &FillStyle) -> FillStyle {
        if overlay.is_none() {
            self.clone()
        } else {
            overlay.clone()
        }
    }
}

ooxml_enum! {
    /// `patternType` of a pattern fill
    pub enum PatternType {
        #[default]
        None = "none",
        Solid = "solid",
        MediumGray = "mediumGray",
        DarkGray = "darkGray",
        LightGray = "lightGray",
        DarkHorizontal = "darkHorizontal",
        DarkVertical = "darkVertical",
        DarkDown = "darkDown",
        DarkUp = "darkUp",
        DarkGrid = "darkGrid",
        DarkTrellis = "darkTrellis",
        LightHorizontal = "lightHorizontal",
        LightVertical = "lightVertical",
        LightDown = "lightDown",
        LightUp = "lightUp",
        LightGrid = "lightGrid",
        LightTrellis = "lightTrellis",
        Gray125 = "gray125",
        Gray0625 = "gray0625",
    }
}
