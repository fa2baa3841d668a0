//! Worksheet part parsing

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quick_xml::events::{BytesStart, Event};

use oxsheet_core::cell::MAX_ROW_HEIGHT;
use oxsheet_core::column::{DEFAULT_COLUMN_WIDTH, MAX_COLUMN_WIDTH};
use oxsheet_core::date::{serial_to_date, serial_to_time};
use oxsheet_core::{
    CellAddress, CellRange, CellType, CellValue, Number, PaneState, ProtectionAction,
    SharedStringTable, Style, Worksheet, WorksheetPane, MAX_COLS, MAX_ROWS,
};

use crate::error::{XlsxError, XlsxResult};
use crate::options::ReadOptions;
use crate::writer::sheet::{HORIZONTAL_SPLIT_OFFSET, VERTICAL_SPLIT_OFFSET};
use crate::xml::{attr_bool, attr_parse, attr_str, decode_escapes, part_reader};

/// Everything a worksheet needs from the rest of the package
pub(crate) struct SheetContext<'a> {
    pub part: &'a str,
    pub strings: &'a SharedStringTable,
    pub styles: &'a [Style],
    pub date_1904: bool,
    pub options: &'a ReadOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    Value,
    Formula,
    Inline,
}

#[derive(Debug, Default)]
struct PendingCell {
    row: u32,
    col: u16,
    kind: Option<String>,
    style: u32,
    value: Option<String>,
    formula: Option<String>,
    has_formula: bool,
    inline: Option<String>,
}

struct SheetParser<'a, 'c> {
    ctx: &'a SheetContext<'c>,
    cell: Option<PendingCell>,
    target: Option<TextTarget>,
    in_inline: bool,
    in_phonetic: bool,
    next_row: u32,
    current_row: u32,
    next_col: u16,
    /// `(pane, sqref)` of every `<selection>`
    selections: Vec<(Option<String>, String)>,
}

/// Parse a worksheet part into `worksheet`
pub(crate) fn read_worksheet(
    data: &[u8],
    worksheet: &mut Worksheet,
    ctx: &SheetContext<'_>,
) -> XlsxResult<()> {
    let mut reader = part_reader(data);
    let mut buf = Vec::new();
    let mut parser = SheetParser {
        ctx,
        cell: None,
        target: None,
        in_inline: false,
        in_phonetic: false,
        next_row: 0,
        current_row: 0,
        next_col: 0,
        selections: Vec::new(),
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.open(&e, false, worksheet)?,
            Ok(Event::Empty(e)) => parser.open(&e, true, worksheet)?,
            Ok(Event::End(e)) => parser.close(e.local_name().as_ref(), worksheet)?,
            Ok(Event::Text(t)) if parser.target.is_some() => {
                let text = t.unescape().map_err(|e| XlsxError::xml(ctx.part, e))?;
                parser.text(&text);
            }
            Ok(Event::CData(t)) if parser.target.is_some() => {
                parser.text(&String::from_utf8_lossy(&t));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(ctx.part, e)),
            _ => {}
        }
        buf.clear();
    }

    parser.apply_selection(worksheet)?;
    worksheet.set_current_cell_address(CellAddress::new(0, 0))?;
    Ok(())
}

impl<'a, 'c> SheetParser<'a, 'c> {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool, ws: &mut Worksheet) -> XlsxResult<()> {
        match e.local_name().as_ref() {
            b"row" => self.open_row(e, ws)?,
            b"c" => {
                let cell = self.open_cell(e)?;
                if empty {
                    self.store_cell(cell, ws)?;
                } else {
                    self.cell = Some(cell);
                }
            }
            b"v" if self.cell.is_some() && !empty => self.target = Some(TextTarget::Value),
            b"f" => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.has_formula = true;
                    if !empty {
                        self.target = Some(TextTarget::Formula);
                    }
                }
            }
            b"is" if self.cell.is_some() && !empty => self.in_inline = true,
            b"rPh" if !empty => self.in_phonetic = true,
            b"t" if self.in_inline && !self.in_phonetic && !empty => {
                self.target = Some(TextTarget::Inline)
            }
            b"sheetView" => read_sheet_view(e, ws),
            b"pane" => read_pane(e, ws),
            b"selection" => {
                let sqref = attr_str(e, b"sqref").or_else(|| attr_str(e, b"activeCell"));
                if let Some(sqref) = sqref {
                    self.selections.push((attr_str(e, b"pane"), sqref));
                }
            }
            b"col" => read_column(e, ws)?,
            b"sheetProtection" => read_sheet_protection(e, ws),
            b"autoFilter" => {
                if let Some(range) = self.range_attr(e) {
                    if let Err(err) = ws.set_auto_filter_range(range) {
                        log::warn!("{}: ignoring auto-filter: {}", self.ctx.part, err);
                    }
                }
            }
            b"mergeCell" => {
                if let Some(range) = self.range_attr(e).filter(|r| r.cell_count() > 1) {
                    if let Err(err) = ws.merge_cells(&range) {
                        log::warn!("{}: ignoring merge {}: {}", self.ctx.part, range, err);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8], ws: &mut Worksheet) -> XlsxResult<()> {
        match name {
            b"v" | b"f" | b"t" => self.target = None,
            b"is" => self.in_inline = false,
            b"rPh" => self.in_phonetic = false,
            b"c" => {
                self.target = None;
                self.in_inline = false;
                if let Some(cell) = self.cell.take() {
                    self.store_cell(cell, ws)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let (Some(cell), Some(target)) = (self.cell.as_mut(), self.target) else {
            return;
        };
        let slot = match target {
            TextTarget::Value => &mut cell.value,
            TextTarget::Formula => &mut cell.formula,
            TextTarget::Inline => &mut cell.inline,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn range_attr(&self, e: &BytesStart<'_>) -> Option<CellRange> {
        let reference = attr_str(e, b"ref")?;
        match CellRange::parse_reference(&reference) {
            Ok(range) => Some(range),
            Err(err) => {
                log::warn!("{}: bad range {:?}: {}", self.ctx.part, reference, err);
                None
            }
        }
    }

    fn open_row(&mut self, e: &BytesStart<'_>, ws: &mut Worksheet) -> XlsxResult<()> {
        let row = match attr_parse::<u32>(e, b"r") {
            Some(r) => r
                .checked_sub(1)
                .filter(|&row| row < MAX_ROWS)
                .ok_or_else(|| XlsxError::parse(self.ctx.part, format!("invalid row number {}", r)))?,
            None => self.next_row,
        };
        self.current_row = row;
        self.next_row = row.saturating_add(1);
        self.next_col = 0;

        if attr_bool(e, b"customHeight").unwrap_or(false) {
            if let Some(height) = attr_parse::<f64>(e, b"ht").filter(|h| h.is_finite()) {
                ws.set_row_height(row, height.clamp(0.0, MAX_ROW_HEIGHT))?;
            }
        }
        if attr_bool(e, b"hidden").unwrap_or(false) {
            ws.set_row_hidden(row, true)?;
        }
        Ok(())
    }

    fn open_cell(&mut self, e: &BytesStart<'_>) -> XlsxResult<PendingCell> {
        let (row, col) = match attr_str(e, b"r") {
            Some(reference) => {
                let addr = CellAddress::parse(&reference).map_err(|err| {
                    XlsxError::parse(
                        self.ctx.part,
                        format!("invalid cell reference {:?}: {}", reference, err),
                    )
                })?;
                (addr.row, addr.col)
            }
            None => (self.current_row, self.next_col),
        };
        self.next_col = col.saturating_add(1);

        Ok(PendingCell {
            row,
            col,
            kind: attr_str(e, b"t"),
            style: attr_parse(e, b"s").unwrap_or(0),
            ..PendingCell::default()
        })
    }

    fn store_cell(&self, cell: PendingCell, ws: &mut Worksheet) -> XlsxResult<()> {
        let style = self.ctx.styles.get(cell.style as usize);
        if style.is_none() && cell.style != 0 {
            log::warn!(
                "{}: cell {} uses unknown style {}",
                self.ctx.part,
                CellAddress::new(cell.row, cell.col),
                cell.style
            );
        }

        let value = self.resolve_value(&cell, style);
        let value = self.ctx.options.coerce(value, cell.row, cell.col);
        if value.is_empty() && cell.style == 0 {
            return Ok(());
        }
        let style = style.filter(|s| !s.is_default());
        ws.add_cell_with_type(value, CellType::Default, cell.row, cell.col, style)?;
        Ok(())
    }

    fn resolve_value(&self, cell: &PendingCell, style: Option<&Style>) -> CellValue {
        if cell.has_formula {
            if let Some(text) = cell.formula.as_deref().filter(|f| !f.is_empty()) {
                return CellValue::formula(text);
            }
            // shared formula followers carry no text; keep the cached value
        }

        let kind = cell.kind.as_deref();
        let raw = match kind {
            Some("inlineStr") => cell.inline.as_deref().or(cell.value.as_deref()),
            _ => cell.value.as_deref(),
        };
        let Some(raw) = raw else {
            return CellValue::Empty;
        };

        match kind {
            Some("s") => {
                let shared = raw
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .and_then(|index| self.ctx.strings.get(index));
                match shared {
                    Some(s) => CellValue::String(s.clone()),
                    None => self.fallback(cell, raw, "shared string index"),
                }
            }
            Some("b") => match raw.trim() {
                "1" => CellValue::Bool(true),
                "0" => CellValue::Bool(false),
                other if other.eq_ignore_ascii_case("true") => CellValue::Bool(true),
                other if other.eq_ignore_ascii_case("false") => CellValue::Bool(false),
                _ => self.fallback(cell, raw, "boolean"),
            },
            Some("str") | Some("inlineStr") => CellValue::string(decode_escapes(raw)),
            Some("e") => CellValue::string(raw),
            Some("d") => {
                let date = parse_iso_datetime(raw).or_else(|| {
                    raw.trim()
                        .parse::<f64>()
                        .ok()
                        .and_then(|serial| serial_to_date(serial, self.ctx.date_1904))
                });
                match date {
                    Some(date) => CellValue::Date(date),
                    None => self.fallback(cell, raw, "date"),
                }
            }
            None | Some("n") => match parse_number(raw) {
                Some(number) => self.promote_number(cell, number, style),
                None => self.fallback(cell, raw, "number"),
            },
            Some(other) => {
                log::warn!(
                    "{}: cell {} has unknown type {:?}",
                    self.ctx.part,
                    CellAddress::new(cell.row, cell.col),
                    other
                );
                CellValue::string(raw)
            }
        }
    }

    /// Numbers shown through a date or time format become dates or times
    fn promote_number(&self, cell: &PendingCell, number: Number, style: Option<&Style>) -> CellValue {
        if self.ctx.options.dates_as_numbers {
            return CellValue::Number(number);
        }
        let Some(format) = style.map(|s| &s.number_format) else {
            return CellValue::Number(number);
        };

        let serial = number.as_f64();
        if format.is_time_format() {
            if let Some(time) = serial_to_time(serial) {
                return CellValue::Time(time);
            }
        } else if format.is_date_format() {
            match serial_to_date(serial, self.ctx.date_1904) {
                Some(date) => return CellValue::Date(date),
                None => log::warn!(
                    "{}: serial {} in {} is outside the date range",
                    self.ctx.part,
                    serial,
                    CellAddress::new(cell.row, cell.col)
                ),
            }
        }
        CellValue::Number(number)
    }

    fn fallback(&self, cell: &PendingCell, raw: &str, what: &str) -> CellValue {
        log::warn!(
            "{}: cell {} has an invalid {} {:?}, keeping the text",
            self.ctx.part,
            CellAddress::new(cell.row, cell.col),
            what,
            raw
        );
        CellValue::string(raw)
    }

    /// Keep the selection of the active pane, or the first one
    fn apply_selection(&mut self, ws: &mut Worksheet) -> XlsxResult<()> {
        let active = ws.pane().active_pane.map(|pane| pane.as_str());
        let chosen = self
            .selections
            .iter()
            .find(|(pane, _)| pane.as_deref() == active)
            .or_else(|| self.selections.first());
        let Some((_, sqref)) = chosen else {
            return Ok(());
        };

        for reference in sqref.split_whitespace() {
            match CellRange::parse_reference(reference) {
                Ok(range) => ws.add_selected_cells(range)?,
                Err(err) => log::warn!("{}: bad selection {:?}: {}", self.ctx.part, reference, err),
            }
        }
        Ok(())
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    let raw = raw.trim();
    if !raw.contains(|c| matches!(c, '.' | 'e' | 'E')) {
        if let Ok(i) = raw.parse::<i64>() {
            return Some(Number::Int(i));
        }
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Number::Float)
}

fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn read_sheet_view(e: &BytesStart<'_>, ws: &mut Worksheet) {
    let view = ws.view_mut();
    view.show_grid_lines = attr_bool(e, b"showGridLines").unwrap_or(true);
    view.show_row_col_headers = attr_bool(e, b"showRowColHeaders").unwrap_or(true);
    if let Some(zoom) = attr_parse::<u16>(e, b"zoomScale").filter(|&z| z != 0) {
        if let Err(err) = ws.set_zoom_factor(zoom) {
            log::warn!("ignoring zoom: {}", err);
        }
    }
}

fn read_pane(e: &BytesStart<'_>, ws: &mut Worksheet) {
    let x = attr_parse::<f64>(e, b"xSplit").filter(|v| v.is_finite() && *v > 0.0);
    let y = attr_parse::<f64>(e, b"ySplit").filter(|v| v.is_finite() && *v > 0.0);
    if x.is_none() && y.is_none() {
        return;
    }
    let top_left_cell = attr_str(e, b"topLeftCell").and_then(|s| CellAddress::parse(&s).ok());
    let active_pane = attr_str(e, b"activePane").and_then(|s| s.parse::<WorksheetPane>().ok());
    let frozen = matches!(
        attr_str(e, b"state").as_deref(),
        Some("frozen") | Some("frozenSplit")
    );

    let pane = if frozen {
        let cols = x.map_or(0.0, f64::floor).min(f64::from(MAX_COLS - 1)) as u16;
        let rows = y.map_or(0.0, f64::floor).min(f64::from(MAX_ROWS - 1)) as u32;
        PaneState {
            split_address: Some(CellAddress::new(rows, cols)),
            freeze: Some(true),
            top_left_cell,
            active_pane,
            ..PaneState::default()
        }
    } else {
        PaneState {
            split_left_width: x.map(|v| ((v - HORIZONTAL_SPLIT_OFFSET) / 20.0).max(0.0) as f32),
            split_top_height: y.map(|v| ((v - VERTICAL_SPLIT_OFFSET) / 20.0).max(0.0) as f32),
            top_left_cell,
            active_pane,
            ..PaneState::default()
        }
    };
    ws.view_mut().pane = pane;
}

fn read_column(e: &BytesStart<'_>, ws: &mut Worksheet) -> XlsxResult<()> {
    let min = attr_parse::<u32>(e, b"min").unwrap_or(1).max(1);
    let max = attr_parse::<u32>(e, b"max")
        .unwrap_or(min)
        .max(min)
        .min(u32::from(MAX_COLS));
    let width = attr_parse::<f64>(e, b"width")
        .filter(|w| w.is_finite() && *w >= 0.0)
        .filter(|w| {
            attr_bool(e, b"customWidth").unwrap_or(false)
                || (w - DEFAULT_COLUMN_WIDTH).abs() > f64::EPSILON
        })
        .map(|w| w.min(MAX_COLUMN_WIDTH));
    let hidden = attr_bool(e, b"hidden").unwrap_or(false);
    if width.is_none() && !hidden {
        return Ok(());
    }

    for col in (min - 1)..max {
        let col = col as u16;
        if let Some(width) = width {
            ws.set_column_width(col, width)?;
        }
        if hidden {
            ws.set_column_hidden(col, true)?;
        }
    }
    Ok(())
}

fn read_sheet_protection(e: &BytesStart<'_>, ws: &mut Worksheet) {
    let protection = ws.protection_mut();
    protection.enabled = attr_bool(e, b"sheet").unwrap_or(false);
    protection.password_hash = attr_str(e, b"password").filter(|hash| !hash.is_empty());
    for action in ProtectionAction::ALL {
        // the attributes name what is locked
        let allowed = match attr_bool(e, action.attribute().as_bytes()) {
            Some(locked) => !locked,
            None => action.allowed_by_default(),
        };
        protection.set_allowed(action, allowed);
    }
}
