//! Border style types

use super::Color;

/// Border style for a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BorderStyle {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
    pub diagonal: Option<BorderEdge>,
    pub diagonal_direction: DiagonalDirection,
}

impl BorderStyle {
    /// Create a new border style with no borders
    pub fn new() -> Self {
        Self::default()
    }

    /// Same line on all four outer edges
    pub fn outline(style: BorderLineStyle, color: Color) -> Self {
        let edge = Some(BorderEdge::new(style, color));
        Self {
            left: edge,
            right: edge,
            top: edge,
            bottom: edge,
            ..Self::default()
        }
    }

    pub fn with_left(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.left = Some(BorderEdge::new(style, color));
        self
    }

    pub fn with_right(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.right = Some(BorderEdge::new(style, color));
        self
    }

    pub fn with_top(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.top = Some(BorderEdge::new(style, color));
        self
    }

    pub fn with_bottom(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.bottom = Some(BorderEdge::new(style, color));
        self
    }

    /// Set a diagonal line
    pub fn with_diagonal(
        mut self,
        style: BorderLineStyle,
        color: Color,
        direction: DiagonalDirection,
    ) -> Self {
        self.diagonal = Some(BorderEdge::new(style, color));
        self.diagonal_direction = direction;
        self
    }

    /// Check if all borders are empty
    pub fn is_empty(&self) -> bool {
        self.left.is_none()
            && self.right.is_none()
            && self.top.is_none()
            && self.bottom.is_none()
            && self.diagonal.is_none()
    }

    /// Edges set on `overlay` replace the matching base edges
    pub fn merge(&self, overlay: &BorderStyle) -> BorderStyle {
        BorderStyle {
            left: overlay.left.or(self.left),
            right: overlay.right.or(self.right),
            top: overlay.top.or(self.top),
            bottom: overlay.bottom.or(self.bottom),
            diagonal: overlay.diagonal.or(self.diagonal),
            diagonal_direction: if overlay.diagonal_direction != DiagonalDirection::None {
                overlay.diagonal_direction
            } else {
                self.diagonal_direction
            },
        }
    }
}

/// A single border edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Color,
}

impl BorderEdge {
    /// Create a new border edge
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }

    /// Thin black line
    pub fn thin() -> Self {
        Self::new(BorderLineStyle::Thin, Color::BLACK)
    }
}

ooxml_enum! {
    /// `style` of a border edge
    pub enum BorderLineStyle {
        #[default]
        None = "none",
        Thin = "thin",
        Medium = "medium",
        Thick = "thick",
        Dashed = "dashed",
        Dotted = "dotted",
        Double = "double",
        Hair = "hair",
        MediumDashed = "mediumDashed",
        DashDot = "dashDot",
        MediumDashDot = "mediumDashDot",
        DashDotDot = "dashDotDot",
        MediumDashDotDot = "mediumDashDotDot",
        SlantDashDot = "slantDashDot",
    }
}

/// Diagonal border direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagonalDirection {
    #[default]
    None,
    /// Top-left to bottom-right
    Down,
    /// Bottom-left to top-right
    Up,
    Both,
}
