//! Styles part (`xl/styles.xml`)
//!
//! Each worksheet interns its own styles. On save, every style a cell uses
//! is re-interned into one package-wide registry, which then supplies the
//! `fonts`, `fills`, `borders`, `numFmts` and `cellXfs` tables. The reader
//! turns `cellXfs` back into full [`Style`] values indexed by xf id.

use std::collections::HashMap;

use oxsheet_core::style::{
    builtin_format_code, Alignment, BorderEdge, BorderLineStyle, BorderStyle, CellXf, Color,
    DiagonalDirection, FillStyle, FontScheme, FontStyle, FontVerticalAlign, HorizontalAlignment,
    NumberFormat, PatternType, Style, StyleRegistry, Underline, VerticalAlignment, XfRecord,
};
use oxsheet_core::Workbook;
use quick_xml::events::{BytesStart, Event};

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{
    attr_bool, attr_parse, attr_str, escape_xml, part_reader, toggle_value, NS_MAIN, XML_HEADER,
};

pub(crate) const STYLES_PART: &str = "xl/styles.xml";

/// Package-wide style table built at save time
pub(crate) struct XlsxStyleTable {
    registry: StyleRegistry,
    /// Per sheet: worksheet style id -> package xf id
    sheet_maps: Vec<HashMap<u32, u32>>,
}

impl XlsxStyleTable {
    /// Collect the styles used by every cell of every sheet
    ///
    /// The registry is frozen once all styles are in; the xf ids handed out
    /// here are the ones written to the cells.
    pub(crate) fn build(workbook: &Workbook) -> XlsxResult<Self> {
        let mut registry = StyleRegistry::for_package();
        let mut sheet_maps = Vec::with_capacity(workbook.sheet_count());

        for sheet in workbook.worksheets() {
            let mut map = HashMap::new();
            for (_, _, cell) in sheet.iter_cells() {
                if cell.style_index == 0 || map.contains_key(&cell.style_index) {
                    continue;
                }
                let style = sheet.styles().style(cell.style_index)?;
                let xf_id = registry.intern_style(style)?;
                map.insert(cell.style_index, xf_id);
            }
            sheet_maps.push(map);
        }

        registry.freeze();
        log::debug!(
            "style table: {} xfs, {} fonts, {} fills, {} borders",
            registry.styles().count(),
            registry.fonts().count(),
            registry.fills().count(),
            registry.borders().count()
        );
        Ok(Self {
            registry,
            sheet_maps,
        })
    }

    /// The package xf id for a worksheet-local style id
    pub(crate) fn xf_id_for(&self, sheet_index: usize, local_style_index: u32) -> u32 {
        self.sheet_maps
            .get(sheet_index)
            .and_then(|map| map.get(&local_style_index))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> XlsxResult<String> {
        let mut xml = String::with_capacity(4096);
        xml.push_str(XML_HEADER);
        xml.push_str(&format!("\n<styleSheet xmlns=\"{}\">", NS_MAIN));

        let numfmts: Vec<(u32, &str)> = self.registry.custom_number_formats().collect();
        if !numfmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", numfmts.len()));
            for (id, code) in &numfmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        let fonts: Vec<&FontStyle> = self.registry.fonts().collect();
        xml.push_str(&format!("\n  <fonts count=\"{}\">", fonts.len()));
        for font in fonts {
            xml.push_str("\n    ");
            xml.push_str(&write_font(font));
        }
        xml.push_str("\n  </fonts>");

        let fills: Vec<&FillStyle> = self.registry.fills().collect();
        xml.push_str(&format!("\n  <fills count=\"{}\">", fills.len()));
        for fill in fills {
            xml.push_str("\n    ");
            xml.push_str(&write_fill(fill));
        }
        xml.push_str("\n  </fills>");

        let borders: Vec<&BorderStyle> = self.registry.borders().collect();
        xml.push_str(&format!("\n  <borders count=\"{}\">", borders.len()));
        for border in borders {
            xml.push_str("\n    ");
            xml.push_str(&write_border(border));
        }
        xml.push_str("\n  </borders>");

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        let styles: Vec<u32> = self.registry.styles().map(|(id, _)| id).collect();
        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", styles.len()));
        for id in styles {
            let record = self.registry.xf_record(id)?;
            xml.push_str("\n    ");
            xml.push_str(&write_xf(&record));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
        );
        Ok(xml)
    }
}

// === Writing ===

fn color_attrs(color: &Color) -> String {
    match color {
        Color::Auto => " auto=\"1\"".to_string(),
        Color::Argb { a, r, g, b } => format!(" rgb=\"{:02X}{:02X}{:02X}{:02X}\"", a, r, g, b),
        Color::Indexed(i) => format!(" indexed=\"{}\"", i),
        Color::Theme { index, tint: 0 } => format!(" theme=\"{}\"", index),
        Color::Theme { index, tint } => {
            format!(" theme=\"{}\" tint=\"{}\"", index, *tint as f64 / 100.0)
        }
    }
}

fn write_color(tag: &str, color: &Color) -> String {
    format!("<{}{}/>", tag, color_attrs(color))
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {}
        Underline::Single => s.push_str("<u/>"),
        other => s.push_str(&format!("<u val=\"{}\"/>", other.as_str())),
    }
    if font.vertical_align != FontVerticalAlign::Baseline {
        s.push_str(&format!("<vertAlign val=\"{}\"/>", font.vertical_align.as_str()));
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !font.color.is_auto() {
        s.push_str(&write_color("color", &font.color));
    }
    if !font.name.is_empty() {
        s.push_str(&format!("<name val=\"{}\"/>", escape_xml(&font.name)));
    }
    if font.family != 0 {
        s.push_str(&format!("<family val=\"{}\"/>", font.family));
    }
    if font.scheme != FontScheme::None {
        s.push_str(&format!("<scheme val=\"{}\"/>", font.scheme.as_str()));
    }
    s.push_str("</font>");
    s
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        FillStyle::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\">{}<bgColor indexed=\"64\"/></patternFill></fill>",
            write_color("fgColor", color)
        ),
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        } => {
            let mut s = format!(
                "<fill><patternFill patternType=\"{}\"",
                pattern.as_str()
            );
            if foreground.is_auto() && background.is_auto() {
                s.push_str("/></fill>");
                return s;
            }
            s.push('>');
            if !foreground.is_auto() {
                s.push_str(&write_color("fgColor", foreground));
            }
            if !background.is_auto() {
                s.push_str(&write_color("bgColor", background));
            }
            s.push_str("</patternFill></fill>");
            s
        }
    }
}

fn write_border_edge(tag: &str, edge: &Option<BorderEdge>) -> String {
    match edge {
        Some(edge) if edge.style != BorderLineStyle::None => format!(
            "<{tag} style=\"{}\">{}</{tag}>",
            edge.style.as_str(),
            write_color("color", &edge.color),
        ),
        _ => format!("<{tag}/>"),
    }
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border");
    match border.diagonal_direction {
        DiagonalDirection::None => {}
        DiagonalDirection::Up => s.push_str(" diagonalUp=\"1\""),
        DiagonalDirection::Down => s.push_str(" diagonalDown=\"1\""),
        DiagonalDirection::Both => s.push_str(" diagonalUp=\"1\" diagonalDown=\"1\""),
    }
    s.push('>');
    s.push_str(&write_border_edge("left", &border.left));
    s.push_str(&write_border_edge("right", &border.right));
    s.push_str(&write_border_edge("top", &border.top));
    s.push_str(&write_border_edge("bottom", &border.bottom));
    s.push_str(&write_border_edge("diagonal", &border.diagonal));
    s.push_str("</border>");
    s
}

fn write_alignment(al: &Alignment) -> String {
    if al.is_default() {
        return String::new();
    }
    let mut s = String::from("<alignment");
    if al.horizontal != HorizontalAlignment::General {
        s.push_str(&format!(" horizontal=\"{}\"", al.horizontal.as_str()));
    }
    if al.vertical != VerticalAlignment::Bottom {
        s.push_str(&format!(" vertical=\"{}\"", al.vertical.as_str()));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    s.push_str("/>");
    s
}

fn write_protection(xf: &CellXf) -> String {
    if !xf.has_protection() {
        return String::new();
    }
    let mut s = String::from("<protection");
    if !xf.locked {
        s.push_str(" locked=\"0\"");
    }
    if xf.hidden {
        s.push_str(" hidden=\"1\"");
    }
    s.push_str("/>");
    s
}

fn write_xf(record: &XfRecord) -> String {
    let xf = &record.cell_xf;
    let mut attrs = String::new();
    if record.num_fmt_id != 0 {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if record.font_id != 0 {
        attrs.push_str(" applyFont=\"1\"");
    }
    if record.fill_id != 0 {
        attrs.push_str(" applyFill=\"1\"");
    }
    if record.border_id != 0 {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if !xf.alignment.is_default() || xf.force_apply_alignment {
        attrs.push_str(" applyAlignment=\"1\"");
    }
    if xf.has_protection() {
        attrs.push_str(" applyProtection=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        record.num_fmt_id, record.font_id, record.fill_id, record.border_id, attrs
    );

    let alignment_xml = write_alignment(&xf.alignment);
    let protection_xml = write_protection(xf);
    if alignment_xml.is_empty() && protection_xml.is_empty() {
        s.push_str("/>");
        return s;
    }
    s.push('>');
    s.push_str(&alignment_xml);
    s.push_str(&protection_xml);
    s.push_str("</xf>");
    s
}

// === Reading ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    /// Tables we do not read (`cellStyleXfs`, `dxfs`, ...)
    Skipped,
}

#[derive(Debug, Default)]
struct PendingFill {
    pattern: Option<PatternType>,
    foreground: Color,
    background: Color,
}

#[derive(Debug, Default)]
struct PendingXf {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    apply_alignment: bool,
    cell_xf: CellXf,
}

#[derive(Default)]
struct StylesParser {
    section: Option<Section>,
    numfmts: HashMap<u32, String>,
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    xfs: Vec<PendingXf>,

    font: Option<FontStyle>,
    fill: Option<PendingFill>,
    border: Option<BorderStyle>,
    border_edge: Option<&'static str>,
    xf: Option<PendingXf>,
}

/// Parse `xl/styles.xml` into one [`Style`] per `cellXfs` entry
pub(crate) fn read_styles_xml(data: &[u8]) -> XlsxResult<Vec<Style>> {
    let mut reader = part_reader(data);
    let mut buf = Vec::new();
    let mut parser = StylesParser::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.open(&e, false),
            Ok(Event::Empty(e)) => parser.open(&e, true),
            Ok(Event::End(e)) => parser.close(e.local_name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(STYLES_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.finish())
}

impl StylesParser {
    fn current_section(&self) -> Section {
        self.section.unwrap_or(Section::None)
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let name = e.local_name();
        let name = name.as_ref();
        let section = self.current_section();

        match (section, name) {
            (_, b"numFmts") => self.enter(Section::NumFmts, empty),
            (_, b"fonts") => self.enter(Section::Fonts, empty),
            (_, b"fills") => self.enter(Section::Fills, empty),
            (_, b"borders") => self.enter(Section::Borders, empty),
            (_, b"cellXfs") => self.enter(Section::CellXfs, empty),
            (Section::None, b"cellStyleXfs" | b"cellStyles" | b"dxfs" | b"colors" | b"extLst") => {
                self.enter(Section::Skipped, empty)
            }

            (Section::NumFmts, b"numFmt") => {
                if let (Some(id), Some(code)) =
                    (attr_parse::<u32>(e, b"numFmtId"), attr_str(e, b"formatCode"))
                {
                    self.numfmts.insert(id, code);
                }
            }

            (Section::Fonts, b"font") => {
                self.font = Some(bare_font());
                if empty {
                    self.close(b"font");
                }
            }
            (Section::Fonts, _) => {
                if let Some(font) = self.font.as_mut() {
                    read_font_property(font, name, e);
                }
            }

            (Section::Fills, b"fill") => {
                self.fill = Some(PendingFill::default());
                if empty {
                    self.close(b"fill");
                }
            }
            (Section::Fills, b"patternFill") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.pattern = attr_str(e, b"patternType")
                        .map(|v| PatternType::from_name(&v).unwrap_or(PatternType::None));
                }
            }
            (Section::Fills, b"fgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.foreground = parse_color_attrs(e);
                }
            }
            (Section::Fills, b"bgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.background = parse_color_attrs(e);
                }
            }

            (Section::Borders, b"border") => {
                let up = attr_bool(e, b"diagonalUp").unwrap_or(false);
                let down = attr_bool(e, b"diagonalDown").unwrap_or(false);
                let diagonal_direction = match (up, down) {
                    (true, true) => DiagonalDirection::Both,
                    (true, false) => DiagonalDirection::Up,
                    (false, true) => DiagonalDirection::Down,
                    (false, false) => DiagonalDirection::None,
                };
                self.border = Some(BorderStyle {
                    diagonal_direction,
                    ..BorderStyle::default()
                });
                if empty {
                    self.close(b"border");
                }
            }
            (Section::Borders, b"left" | b"right" | b"top" | b"bottom" | b"diagonal") => {
                let edge_name = edge_name(name);
                let style = attr_str(e, b"style")
                    .and_then(|v| BorderLineStyle::from_name(&v))
                    .unwrap_or(BorderLineStyle::None);
                if let (Some(border), Some(edge_name)) = (self.border.as_mut(), edge_name) {
                    if style != BorderLineStyle::None {
                        set_border_edge(border, edge_name, Some(BorderEdge::new(style, Color::Auto)));
                    }
                    if !empty {
                        self.border_edge = Some(edge_name);
                    }
                }
            }
            (Section::Borders, b"color") => {
                if let (Some(border), Some(edge_name)) = (self.border.as_mut(), self.border_edge) {
                    if let Some(edge) = get_border_edge_mut(border, edge_name) {
                        edge.color = parse_color_attrs(e);
                    }
                }
            }

            (Section::CellXfs, b"xf") => {
                let mut xf = PendingXf {
                    num_fmt_id: attr_parse(e, b"numFmtId").unwrap_or(0),
                    font_id: attr_parse(e, b"fontId").unwrap_or(0),
                    fill_id: attr_parse(e, b"fillId").unwrap_or(0),
                    border_id: attr_parse(e, b"borderId").unwrap_or(0),
                    apply_alignment: attr_bool(e, b"applyAlignment").unwrap_or(false),
                    cell_xf: CellXf::default(),
                };
                if empty {
                    xf.cell_xf.force_apply_alignment = xf.apply_alignment;
                    self.xfs.push(xf);
                } else {
                    self.xf = Some(xf);
                }
            }
            (Section::CellXfs, b"alignment") => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.cell_xf.alignment = parse_alignment(e);
                }
            }
            (Section::CellXfs, b"protection") => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.cell_xf.locked = attr_bool(e, b"locked").unwrap_or(true);
                    xf.cell_xf.hidden = attr_bool(e, b"hidden").unwrap_or(false);
                }
            }

            _ => {}
        }
    }

    fn enter(&mut self, section: Section, empty: bool) {
        if !empty {
            self.section = Some(section);
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" | b"cellStyleXfs"
            | b"cellStyles" | b"dxfs" | b"colors" | b"extLst" => {
                self.section = None;
            }
            b"font" if self.current_section() == Section::Fonts => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            }
            b"fill" if self.current_section() == Section::Fills => {
                if let Some(fill) = self.fill.take() {
                    self.fills.push(finalize_fill(fill));
                }
            }
            b"border" if self.current_section() == Section::Borders => {
                self.border_edge = None;
                if let Some(border) = self.border.take() {
                    self.borders.push(border);
                }
            }
            b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => {
                self.border_edge = None;
            }
            b"xf" if self.current_section() == Section::CellXfs => {
                if let Some(mut xf) = self.xf.take() {
                    xf.cell_xf.force_apply_alignment =
                        xf.apply_alignment && xf.cell_xf.alignment.is_default();
                    self.xfs.push(xf);
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Vec<Style> {
        log::debug!(
            "read styles: {} xfs, {} fonts, {} fills, {} borders, {} custom formats",
            self.xfs.len(),
            self.fonts.len(),
            self.fills.len(),
            self.borders.len(),
            self.numfmts.len()
        );
        self.xfs
            .iter()
            .map(|xf| resolve_style(xf, &self.numfmts, &self.fonts, &self.fills, &self.borders))
            .collect()
    }
}

fn resolve_style(
    xf: &PendingXf,
    numfmts: &HashMap<u32, String>,
    fonts: &[FontStyle],
    fills: &[FillStyle],
    borders: &[BorderStyle],
) -> Style {
    let font = fonts.get(xf.font_id as usize).cloned().unwrap_or_else(|| {
        log::warn!("cell format references missing font {}", xf.font_id);
        FontStyle::default()
    });
    let fill = fills.get(xf.fill_id as usize).cloned().unwrap_or_else(|| {
        log::warn!("cell format references missing fill {}", xf.fill_id);
        FillStyle::None
    });
    let border = borders.get(xf.border_id as usize).cloned().unwrap_or_else(|| {
        log::warn!("cell format references missing border {}", xf.border_id);
        BorderStyle::default()
    });

    Style {
        font,
        fill,
        border,
        number_format: resolve_number_format(xf.num_fmt_id, numfmts),
        cell_xf: xf.cell_xf,
    }
}

/// Map a `numFmtId` to a format; ids that are neither built in nor
/// defined in the part fall back to General
fn resolve_number_format(id: u32, numfmts: &HashMap<u32, String>) -> NumberFormat {
    if id == 0 {
        return NumberFormat::General;
    }
    if builtin_format_code(id).is_some() {
        return NumberFormat::BuiltIn(id);
    }
    match numfmts.get(&id) {
        Some(code) => NumberFormat::Custom(code.clone()),
        None => {
            log::warn!("unknown number format id {}, using General", id);
            NumberFormat::General
        }
    }
}

/// Font with every optional property unset, so absent elements read back
/// as absent
fn bare_font() -> FontStyle {
    FontStyle {
        name: String::new(),
        size: 11.0,
        bold: false,
        italic: false,
        underline: Underline::None,
        strikethrough: false,
        color: Color::Auto,
        vertical_align: FontVerticalAlign::Baseline,
        family: 0,
        scheme: FontScheme::None,
    }
}

fn read_font_property(font: &mut FontStyle, name: &[u8], e: &BytesStart<'_>) {
    match name {
        b"b" => font.bold = toggle_value(e),
        b"i" => font.italic = toggle_value(e),
        b"strike" => font.strikethrough = toggle_value(e),
        b"u" => {
            font.underline = attr_str(e, b"val")
                .and_then(|v| Underline::from_name(&v))
                .unwrap_or(Underline::Single)
        }
        b"vertAlign" => {
            font.vertical_align = attr_str(e, b"val")
                .and_then(|v| FontVerticalAlign::from_name(&v))
                .unwrap_or_default()
        }
        b"sz" => {
            if let Some(size) = attr_parse::<f64>(e, b"val") {
                font.size = size;
            }
        }
        b"color" => font.color = parse_color_attrs(e),
        b"name" | b"rFont" => {
            if let Some(v) = attr_str(e, b"val") {
                font.name = v;
            }
        }
        b"family" => font.family = attr_parse(e, b"val").unwrap_or(0),
        b"scheme" => {
            font.scheme = attr_str(e, b"val")
                .and_then(|v| FontScheme::from_name(&v))
                .unwrap_or(FontScheme::None)
        }
        _ => {}
    }
}

fn parse_alignment(e: &BytesStart<'_>) -> Alignment {
    Alignment {
        horizontal: attr_str(e, b"horizontal")
            .and_then(|v| HorizontalAlignment::from_name(&v))
            .unwrap_or_default(),
        vertical: attr_str(e, b"vertical")
            .and_then(|v| VerticalAlignment::from_name(&v))
            .unwrap_or_default(),
        wrap_text: attr_bool(e, b"wrapText").unwrap_or(false),
        shrink_to_fit: attr_bool(e, b"shrinkToFit").unwrap_or(false),
        indent: attr_parse(e, b"indent").unwrap_or(0),
        rotation: attr_parse(e, b"textRotation").unwrap_or(0),
    }
}

fn finalize_fill(fill: PendingFill) -> FillStyle {
    match fill.pattern.unwrap_or(PatternType::None) {
        PatternType::None => FillStyle::None,
        PatternType::Solid => FillStyle::Solid {
            color: fill.foreground,
        },
        pattern => FillStyle::Pattern {
            pattern,
            foreground: fill.foreground,
            background: fill.background,
        },
    }
}

/// Color from `rgb`, `theme`/`tint`, `indexed` or `auto` attributes, in
/// that order of preference
fn parse_color_attrs(e: &BytesStart<'_>) -> Color {
    if let Some(color) = attr_str(e, b"rgb").and_then(|v| Color::from_hex(v.trim_start_matches('#'))) {
        return color;
    }
    if let Some(index) = attr_parse::<u8>(e, b"theme") {
        let tint = attr_parse::<f64>(e, b"tint")
            .map(|t| (t * 100.0).round().clamp(-100.0, 100.0) as i8)
            .unwrap_or(0);
        return Color::Theme { index, tint };
    }
    if let Some(index) = attr_parse::<u8>(e, b"indexed") {
        return Color::Indexed(index);
    }
    Color::Auto
}

fn edge_name(name: &[u8]) -> Option<&'static str> {
    match name {
        b"left" => Some("left"),
        b"right" => Some("right"),
        b"top" => Some("top"),
        b"bottom" => Some("bottom"),
        b"diagonal" => Some("diagonal"),
        _ => None,
    }
}

fn set_border_edge(border: &mut BorderStyle, edge: &str, value: Option<BorderEdge>) {
    match edge {
        "left" => border.left = value,
        "right" => border.right = value,
        "top" => border.top = value,
        "bottom" => border.bottom = value,
        "diagonal" => border.diagonal = value,
        _ => {}
    }
}

fn get_border_edge_mut<'a>(border: &'a mut BorderStyle, edge: &str) -> Option<&'a mut BorderEdge> {
    match edge {
        "left" => border.left.as_mut(),
        "right" => border.right.as_mut(),
        "top" => border.top.as_mut(),
        "bottom" => border.bottom.as_mut(),
        "diagonal" => border.diagonal.as_mut(),
        _ => None,
    }
}
