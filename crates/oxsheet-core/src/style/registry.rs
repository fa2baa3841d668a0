//! Value-equality style registry
//!
//! Each component kind has its own dense id space. Interning an equal value
//! twice returns the same id, and ids depend only on the order of first
//! insertion, so replaying the same operations yields the same ids.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use ahash::AHashMap;

use super::{
    BorderStyle, CellXf, FillStyle, FontStyle, NumberFormat, Style, FIRST_CUSTOM_FORMAT_ID,
};
use crate::error::{Error, Result};

/// A style component of any kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleComponent {
    Font(FontStyle),
    Fill(FillStyle),
    Border(BorderStyle),
    NumberFormat(NumberFormat),
    CellXf(CellXf),
    Style(Style),
}

impl StyleComponent {
    /// The component's kind
    pub fn kind(&self) -> ComponentKind {
        match self {
            StyleComponent::Font(_) => ComponentKind::Font,
            StyleComponent::Fill(_) => ComponentKind::Fill,
            StyleComponent::Border(_) => ComponentKind::Border,
            StyleComponent::NumberFormat(_) => ComponentKind::NumberFormat,
            StyleComponent::CellXf(_) => ComponentKind::CellXf,
            StyleComponent::Style(_) => ComponentKind::Style,
        }
    }
}

/// Style component kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Font,
    Fill,
    Border,
    NumberFormat,
    CellXf,
    Style,
}

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Font => "font",
            ComponentKind::Fill => "fill",
            ComponentKind::Border => "border",
            ComponentKind::NumberFormat => "numberFormat",
            ComponentKind::CellXf => "cellXf",
            ComponentKind::Style => "style",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "font" => Ok(ComponentKind::Font),
            "fill" => Ok(ComponentKind::Fill),
            "border" => Ok(ComponentKind::Border),
            "numberformat" | "numfmt" => Ok(ComponentKind::NumberFormat),
            "cellxf" | "xf" => Ok(ComponentKind::CellXf),
            "style" => Ok(ComponentKind::Style),
            _ => Err(Error::UnknownStyleComponent(s.to_string())),
        }
    }
}

/// Insertion-ordered set with dense ids
#[derive(Debug, Clone)]
struct Interner<T> {
    items: Vec<T>,
    index: AHashMap<T, u32>,
}

impl<T> Default for Interner<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: AHashMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> Interner<T> {
    fn intern(&mut self, item: &T) -> u32 {
        if let Some(&id) = self.index.get(item) {
            return id;
        }
        let id = self.items.len() as u32;
        self.items.push(item.clone());
        self.index.insert(item.clone(), id);
        id
    }

    fn id_of(&self, item: &T) -> Option<u32> {
        self.index.get(item).copied()
    }

    fn get(&self, id: u32) -> Option<&T> {
        self.items.get(id as usize)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Resolved component ids of an interned style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XfRecord {
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    /// Id as written in `numFmtId` (built-in id or 164+)
    pub num_fmt_id: u32,
    pub cell_xf: CellXf,
}

/// Deduplicating store for styles and their components
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    fonts: Interner<FontStyle>,
    fills: Interner<FillStyle>,
    borders: Interner<BorderStyle>,
    number_formats: Interner<NumberFormat>,
    custom_codes: Interner<String>,
    cell_xfs: Interner<CellXf>,
    styles: Interner<Style>,
    frozen: bool,
}

impl StyleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the entries every package must start with
    ///
    /// Fill 0 is `none` and fill 1 is `gray125`; font, border, cell format
    /// and style 0 are the defaults.
    pub fn for_package() -> Self {
        let mut registry = Self::new();
        registry.fills.intern(&FillStyle::None);
        registry.fills.intern(&FillStyle::gray125());
        registry.fonts.intern(&FontStyle::default());
        registry.borders.intern(&BorderStyle::default());
        registry.number_formats.intern(&NumberFormat::General);
        registry.cell_xfs.intern(&CellXf::default());
        registry.styles.intern(&Style::default());
        registry
    }

    /// Stop accepting new entries
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Check if the registry is frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_open(&self) -> Result<()> {
        if self.frozen {
            Err(Error::RegistryFrozen)
        } else {
            Ok(())
        }
    }

    /// Intern a component of any kind, returning its id within that kind
    pub fn intern(&mut self, component: &StyleComponent) -> Result<u32> {
        match component {
            StyleComponent::Font(font) => self.intern_font(font),
            StyleComponent::Fill(fill) => self.intern_fill(fill),
            StyleComponent::Border(border) => self.intern_border(border),
            StyleComponent::NumberFormat(format) => self.intern_number_format(format),
            StyleComponent::CellXf(xf) => self.intern_cell_xf(xf),
            StyleComponent::Style(style) => self.intern_style(style),
        }
    }

    pub fn intern_font(&mut self, font: &FontStyle) -> Result<u32> {
        self.ensure_open()?;
        Ok(self.fonts.intern(font))
    }

    pub fn intern_fill(&mut self, fill: &FillStyle) -> Result<u32> {
        self.ensure_open()?;
        Ok(self.fills.intern(fill))
    }

    pub fn intern_border(&mut self, border: &BorderStyle) -> Result<u32> {
        self.ensure_open()?;
        Ok(self.borders.intern(border))
    }

    pub fn intern_number_format(&mut self, format: &NumberFormat) -> Result<u32> {
        self.ensure_open()?;
        if let NumberFormat::Custom(code) = format {
            self.custom_codes.intern(code);
        }
        Ok(self.number_formats.intern(format))
    }

    pub fn intern_cell_xf(&mut self, xf: &CellXf) -> Result<u32> {
        self.ensure_open()?;
        Ok(self.cell_xfs.intern(xf))
    }

    /// Intern a complete style along with each of its components
    pub fn intern_style(&mut self, style: &Style) -> Result<u32> {
        self.ensure_open()?;
        if let Some(id) = self.styles.id_of(style) {
            return Ok(id);
        }
        self.intern_font(&style.font)?;
        self.intern_fill(&style.fill)?;
        self.intern_border(&style.border)?;
        self.intern_number_format(&style.number_format)?;
        self.intern_cell_xf(&style.cell_xf)?;
        Ok(self.styles.intern(style))
    }

    /// The id the next new entry of `kind` would receive
    pub fn next_id(&self, kind: ComponentKind) -> u32 {
        self.len(kind) as u32
    }

    /// Number of entries of `kind`
    pub fn len(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Font => self.fonts.len(),
            ComponentKind::Fill => self.fills.len(),
            ComponentKind::Border => self.borders.len(),
            ComponentKind::NumberFormat => self.number_formats.len(),
            ComponentKind::CellXf => self.cell_xfs.len(),
            ComponentKind::Style => self.styles.len(),
        }
    }

    /// Check if no style has been interned
    pub fn is_empty(&self) -> bool {
        self.styles.len() == 0
    }

    fn missing(kind: ComponentKind, id: u32) -> Error {
        Error::MissingStyle {
            kind: kind.name(),
            id,
        }
    }

    pub fn font(&self, id: u32) -> Result<&FontStyle> {
        self.fonts
            .get(id)
            .ok_or_else(|| Self::missing(ComponentKind::Font, id))
    }

    pub fn fill(&self, id: u32) -> Result<&FillStyle> {
        self.fills
            .get(id)
            .ok_or_else(|| Self::missing(ComponentKind::Fill, id))
    }

    pub fn border(&self, id: u32) -> Result<&BorderStyle> {
        self.borders
            .get(id)
            .ok_or_else(|| Self::missing(ComponentKind::Border, id))
    }

    pub fn number_format(&self, id: u32) -> Result<&NumberFormat> {
        self.number_formats
            .get(id)
            .ok_or_else(|| Self::missing(ComponentKind::NumberFormat, id))
    }

    pub fn cell_xf(&self, id: u32) -> Result<&CellXf> {
        self.cell_xfs
            .get(id)
            .ok_or_else(|| Self::missing(ComponentKind::CellXf, id))
    }

    pub fn style(&self, id: u32) -> Result<&Style> {
        self.styles
            .get(id)
            .ok_or_else(|| Self::missing(ComponentKind::Style, id))
    }

    /// Id of an interned style, if present
    pub fn style_id(&self, style: &Style) -> Option<u32> {
        self.styles.id_of(style)
    }

    /// The `numFmtId` written for a format
    ///
    /// Custom codes are numbered from 164 in interning order; `None` if a
    /// custom code was never interned.
    pub fn num_fmt_id(&self, format: &NumberFormat) -> Option<u32> {
        match format {
            NumberFormat::General => Some(0),
            NumberFormat::BuiltIn(id) => Some(*id),
            NumberFormat::Custom(code) => self
                .custom_codes
                .id_of(code)
                .map(|idx| FIRST_CUSTOM_FORMAT_ID + idx),
        }
    }

    /// Custom format codes with their `numFmtId`
    pub fn custom_number_formats(&self) -> impl Iterator<Item = (u32, &str)> {
        self.custom_codes
            .items
            .iter()
            .enumerate()
            .map(|(i, code)| (FIRST_CUSTOM_FORMAT_ID + i as u32, code.as_str()))
    }

    /// Component ids for an interned style
    pub fn xf_record(&self, style_id: u32) -> Result<XfRecord> {
        let style = self.style(style_id)?;
        let lookup = |kind: ComponentKind, id: Option<u32>| {
            id.ok_or_else(|| Self::missing(kind, style_id))
        };

        Ok(XfRecord {
            font_id: lookup(ComponentKind::Font, self.fonts.id_of(&style.font))?,
            fill_id: lookup(ComponentKind::Fill, self.fills.id_of(&style.fill))?,
            border_id: lookup(ComponentKind::Border, self.borders.id_of(&style.border))?,
            num_fmt_id: lookup(
                ComponentKind::NumberFormat,
                self.num_fmt_id(&style.number_format),
            )?,
            cell_xf: style.cell_xf,
        })
    }

    pub fn fonts(&self) -> impl Iterator<Item = &FontStyle> {
        self.fonts.items.iter()
    }

    pub fn fills(&self) -> impl Iterator<Item = &FillStyle> {
        self.fills.items.iter()
    }

    pub fn borders(&self) -> impl Iterator<Item = &BorderStyle> {
        self.borders.items.iter()
    }

    /// Iterate over all styles with their ids
    pub fn styles(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles
            .items
            .iter()
            .enumerate()
            .map(|(i, s)| (i as u32, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::style::Color;

    #[test]
    fn test_package_defaults() {
        let registry = StyleRegistry::for_package();
        assert_eq!(registry.len(ComponentKind::Fill), 2);
        assert_eq!(registry.len(ComponentKind::Font), 1);
        assert_eq!(registry.len(ComponentKind::Border), 1);
        assert_eq!(registry.len(ComponentKind::Style), 1);
        assert_eq!(registry.fill(1).unwrap(), &FillStyle::gray125());
        assert_eq!(registry.style(0).unwrap(), &Style::default());
    }

    #[test]
    fn test_intern_by_value() {
        let mut registry = StyleRegistry::new();

        let a = registry.intern_style(&Style::new().bold(true)).unwrap();
        let b = registry.intern_style(&Style::new().bold(true)).unwrap();
        let c = registry.intern_style(&Style::new().italic(true)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.len(ComponentKind::Style), 2);
        assert_eq!(registry.next_id(ComponentKind::Style), 2);
    }

    #[test]
    fn test_components_shared_between_styles() {
        let mut registry = StyleRegistry::new();
        let red = Style::new().fill_color(Color::RED);
        registry.intern_style(&red.clone().bold(true)).unwrap();
        registry.intern_style(&red.italic(true)).unwrap();

        assert_eq!(registry.len(ComponentKind::Style), 2);
        assert_eq!(registry.len(ComponentKind::Fill), 1);
        assert_eq!(registry.len(ComponentKind::Font), 2);
    }

    #[test]
    fn test_ids_are_replay_deterministic() {
        let styles = [
            Style::new().bold(true),
            Style::new().number_format("0.0"),
            Style::new().bold(true),
            Style::date_format(),
        ];
        let run = || {
            let mut registry = StyleRegistry::for_package();
            styles
                .iter()
                .map(|s| registry.intern_style(s).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
        assert_eq!(run(), vec![1, 2, 1, 3]);
    }

    #[test]
    fn test_generic_intern() {
        let mut registry = StyleRegistry::new();
        let component = StyleComponent::Fill(FillStyle::solid(Color::BLUE));
        assert_eq!(component.kind(), ComponentKind::Fill);
        assert_eq!(registry.intern(&component).unwrap(), 0);
        assert_eq!(registry.intern(&component).unwrap(), 0);
    }

    #[test]
    fn test_unknown_component_kind() {
        assert_eq!("Font".parse::<ComponentKind>().unwrap(), ComponentKind::Font);
        let err = "gradient".parse::<ComponentKind>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Style);
    }

    #[test]
    fn test_missing_lookup() {
        let registry = StyleRegistry::new();
        let err = registry.style(3).unwrap_err();
        assert!(matches!(err, Error::MissingStyle { kind: "style", id: 3 }));
        assert_eq!(err.kind(), ErrorKind::Style);
    }

    #[test]
    fn test_frozen_registry_rejects_new_entries() {
        let mut registry = StyleRegistry::for_package();
        registry.freeze();

        assert!(registry.is_frozen());
        assert!(matches!(
            registry.intern_style(&Style::new().bold(true)),
            Err(Error::RegistryFrozen)
        ));
        // Lookups still work
        assert!(registry.style(0).is_ok());
    }

    #[test]
    fn test_custom_number_format_ids() {
        let mut registry = StyleRegistry::for_package();
        let a = Style::new().number_format("0.000");
        let b = Style::new().number_format("yyyy-mm-dd");
        let a_id = registry.intern_style(&a).unwrap();
        let b_id = registry.intern_style(&b).unwrap();
        registry.intern_style(&Style::date_format()).unwrap();

        assert_eq!(registry.xf_record(a_id).unwrap().num_fmt_id, 164);
        assert_eq!(registry.xf_record(b_id).unwrap().num_fmt_id, 165);
        assert_eq!(
            registry.num_fmt_id(&NumberFormat::date_short()),
            Some(14)
        );

        let customs: Vec<_> = registry.custom_number_formats().collect();
        assert_eq!(customs, vec![(164, "0.000"), (165, "yyyy-mm-dd")]);
    }
}
