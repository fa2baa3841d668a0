//! Worksheet part (`xl/worksheets/sheetN.xml`)

use std::collections::BTreeSet;

use oxsheet_core::date::{date_to_serial, time_to_serial};
use oxsheet_core::protection::ProtectionAction;
use oxsheet_core::cell::DEFAULT_ROW_HEIGHT;
use oxsheet_core::{Cell, CellAddress, CellType, CellValue, SharedStringTable, Worksheet};

use crate::error::XlsxResult;
use crate::styles::XlsxStyleTable;
use crate::xml::{escape_xml, NS_MAIN, NS_REL, XML_HEADER};

/// Offsets added to split lengths (in twentieths of a point) for the
/// row and column header areas
pub(crate) const HORIZONTAL_SPLIT_OFFSET: f64 = 390.0;
pub(crate) const VERTICAL_SPLIT_OFFSET: f64 = 300.0;

pub(crate) struct SheetContext<'a> {
    pub index: usize,
    pub selected: bool,
    pub date_1904: bool,
    pub styles: &'a XlsxStyleTable,
}

pub(crate) fn write_worksheet_xml(
    sheet: &Worksheet,
    context: &SheetContext<'_>,
    strings: &mut SharedStringTable,
) -> XlsxResult<String> {
    let mut content = String::with_capacity(1024 + sheet.cell_count() * 48);
    content.push_str(XML_HEADER);
    content.push_str(&format!(
        "\n<worksheet xmlns=\"{}\" xmlns:r=\"{}\">",
        NS_MAIN, NS_REL
    ));

    let dimension = sheet
        .used_range()
        .map(|range| range.to_relative_string())
        .unwrap_or_else(|| "A1".to_string());
    content.push_str(&format!("\n    <dimension ref=\"{}\"/>", dimension));

    write_sheet_views(&mut content, sheet, context.selected);
    content.push_str(&format!(
        "\n    <sheetFormatPr defaultRowHeight=\"{}\"/>",
        DEFAULT_ROW_HEIGHT
    ));
    write_columns(&mut content, sheet);
    write_sheet_data(&mut content, sheet, context, strings)?;
    write_sheet_protection(&mut content, sheet);

    if let Some(range) = sheet.auto_filter_range() {
        content.push_str(&format!(
            "\n    <autoFilter ref=\"{}\"/>",
            range.to_relative_string()
        ));
    }

    let merged = sheet.merged_cells();
    if !merged.is_empty() {
        content.push_str(&format!("\n    <mergeCells count=\"{}\">", merged.len()));
        for range in merged {
            content.push_str(&format!(
                "\n        <mergeCell ref=\"{}\"/>",
                range.to_relative_string()
            ));
        }
        content.push_str("\n    </mergeCells>");
    }

    content.push_str("\n</worksheet>");
    Ok(content)
}

fn write_sheet_views(content: &mut String, sheet: &Worksheet, selected: bool) {
    let view = sheet.view();
    let mut attrs = String::new();
    if selected {
        attrs.push_str(" tabSelected=\"1\"");
    }
    if !view.show_grid_lines {
        attrs.push_str(" showGridLines=\"0\"");
    }
    if !view.show_row_col_headers {
        attrs.push_str(" showRowColHeaders=\"0\"");
    }
    if view.zoom != 100 {
        attrs.push_str(&format!(
            " zoomScale=\"{}\" zoomScaleNormal=\"{}\"",
            view.zoom, view.zoom
        ));
    }

    content.push_str(&format!(
        "\n    <sheetViews>\n        <sheetView{} workbookViewId=\"0\"",
        attrs
    ));

    let pane = pane_xml(sheet);
    let selection = selection_xml(sheet);
    if pane.is_none() && selection.is_none() {
        content.push_str("/>\n    </sheetViews>");
        return;
    }
    content.push('>');
    if let Some(pane) = pane {
        content.push_str("\n            ");
        content.push_str(&pane);
    }
    if let Some(selection) = selection {
        content.push_str("\n            ");
        content.push_str(&selection);
    }
    content.push_str("\n        </sheetView>\n    </sheetViews>");
}

/// Split lengths in points to the twentieths written in `xSplit`/`ySplit`
pub(crate) fn split_to_twips(length: f32, offset: f64) -> u32 {
    (20.0 * length as f64 + offset).floor().max(0.0) as u32
}

fn pane_xml(sheet: &Worksheet) -> Option<String> {
    let pane = sheet.pane();
    if !pane.has_split() {
        return None;
    }

    let mut s = String::from("<pane");
    let state = if pane.is_frozen() {
        let split = pane.split_address.unwrap_or_default();
        if split.col > 0 {
            s.push_str(&format!(" xSplit=\"{}\"", split.col));
        }
        if split.row > 0 {
            s.push_str(&format!(" ySplit=\"{}\"", split.row));
        }
        let top_left = pane
            .top_left_cell
            .unwrap_or_else(|| CellAddress::new(split.row, split.col));
        s.push_str(&format!(" topLeftCell=\"{}\"", top_left.relative()));
        "frozen"
    } else {
        let (width, height) = sheet.pane_split_pixel_lengths();
        if let Some(width) = width {
            s.push_str(&format!(
                " xSplit=\"{}\"",
                split_to_twips(width, HORIZONTAL_SPLIT_OFFSET)
            ));
        }
        if let Some(height) = height {
            s.push_str(&format!(
                " ySplit=\"{}\"",
                split_to_twips(height, VERTICAL_SPLIT_OFFSET)
            ));
        }
        if let Some(top_left) = pane.top_left_cell {
            s.push_str(&format!(" topLeftCell=\"{}\"", top_left.relative()));
        }
        "split"
    };
    if let Some(active) = pane.active_pane {
        s.push_str(&format!(" activePane=\"{}\"", active));
    }
    s.push_str(&format!(" state=\"{}\"/>", state));
    Some(s)
}

fn selection_xml(sheet: &Worksheet) -> Option<String> {
    let ranges = sheet.selected_ranges();
    let first = ranges.first()?;
    let sqref: Vec<String> = ranges
        .iter()
        .map(|range| {
            if range.cell_count() == 1 {
                range.start.relative().to_string()
            } else {
                range.to_relative_string()
            }
        })
        .collect();

    let mut s = String::from("<selection");
    if let Some(active) = sheet.pane().active_pane.filter(|_| sheet.pane().has_split()) {
        s.push_str(&format!(" pane=\"{}\"", active));
    }
    s.push_str(&format!(
        " activeCell=\"{}\" sqref=\"{}\"/>",
        first.start.relative(),
        sqref.join(" ")
    ));
    Some(s)
}

fn write_columns(content: &mut String, sheet: &Worksheet) {
    let columns = sheet.columns();
    if columns.is_empty() {
        return;
    }
    content.push_str("\n    <cols>");
    for (&col, meta) in columns {
        let mut attrs = format!(" width=\"{}\"", sheet.column_width(col));
        if meta.width.is_some() {
            attrs.push_str(" customWidth=\"1\"");
        }
        if meta.hidden {
            attrs.push_str(" hidden=\"1\"");
        }
        content.push_str(&format!(
            "\n        <col min=\"{}\" max=\"{}\"{}/>",
            col + 1,
            col + 1,
            attrs
        ));
    }
    content.push_str("\n    </cols>");
}

fn write_sheet_data(
    content: &mut String,
    sheet: &Worksheet,
    context: &SheetContext<'_>,
    strings: &mut SharedStringTable,
) -> XlsxResult<()> {
    let rows: BTreeSet<u32> = sheet
        .row_indices()
        .chain(sheet.row_settings().keys().copied())
        .collect();

    if rows.is_empty() {
        content.push_str("\n    <sheetData/>");
        return Ok(());
    }

    content.push_str("\n    <sheetData>");
    for row in rows {
        let mut attrs = format!(" r=\"{}\"", row + 1);
        if let Some(height) = sheet.row_settings().get(&row).and_then(|meta| meta.height) {
            attrs.push_str(&format!(" ht=\"{}\" customHeight=\"1\"", height));
        }
        if sheet.is_row_hidden(row) {
            attrs.push_str(" hidden=\"1\"");
        }

        let mut cells = sheet.iter_row(row).peekable();
        if cells.peek().is_none() {
            content.push_str(&format!("\n        <row{}/>", attrs));
            continue;
        }
        content.push_str(&format!("\n        <row{}>", attrs));
        for (col, cell) in cells {
            content.push_str("\n            ");
            write_cell(content, row, col, cell, context, strings)?;
        }
        content.push_str("\n        </row>");
    }
    content.push_str("\n    </sheetData>");
    Ok(())
}

fn write_cell(
    content: &mut String,
    row: u32,
    col: u16,
    cell: &Cell,
    context: &SheetContext<'_>,
    strings: &mut SharedStringTable,
) -> XlsxResult<()> {
    let cell_ref = CellAddress::new(row, col).to_a1_string();
    let xf_id = context.styles.xf_id_for(context.index, cell.style_index);
    let style_attr = if xf_id != 0 {
        format!(" s=\"{}\"", xf_id)
    } else {
        String::new()
    };

    if cell.cell_type == CellType::Empty {
        content.push_str(&format!("<c r=\"{}\"{}/>", cell_ref, style_attr));
        return Ok(());
    }

    let (kind, body) = match &cell.value {
        CellValue::Empty => {
            content.push_str(&format!("<c r=\"{}\"{}/>", cell_ref, style_attr));
            return Ok(());
        }
        CellValue::Bool(b) => ("b", format!("<v>{}</v>", u8::from(*b))),
        CellValue::Number(n) => ("n", format!("<v>{}</v>", n)),
        CellValue::Date(d) => ("n", format!("<v>{}</v>", date_to_serial(*d, context.date_1904)?)),
        CellValue::Time(t) => ("n", format!("<v>{}</v>", time_to_serial(*t)?)),
        CellValue::String(s) => ("s", format!("<v>{}</v>", strings.intern(s.as_str()))),
        CellValue::Formula(text) => ("str", format!("<f>{}</f>", escape_xml(text))),
    };

    content.push_str(&format!(
        "<c r=\"{}\"{} t=\"{}\">{}</c>",
        cell_ref, style_attr, kind, body
    ));
    Ok(())
}

fn write_sheet_protection(content: &mut String, sheet: &Worksheet) {
    let protection = sheet.protection();
    if !protection.enabled {
        return;
    }
    content.push_str("\n    <sheetProtection");
    if let Some(hash) = &protection.password_hash {
        content.push_str(&format!(" password=\"{}\"", hash));
    }
    content.push_str(" sheet=\"1\"");
    for action in ProtectionAction::ALL {
        let locked = if protection.is_allowed(action) { 0 } else { 1 };
        content.push_str(&format!(" {}=\"{}\"", action.attribute(), locked));
    }
    content.push_str("/>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::MemoryPackage;
    use crate::writer::XlsxWriter;
    use chrono::NaiveDate;
    use oxsheet_core::{CellRange, Style, Workbook, WorksheetPane};

    fn sheet_xml(workbook: &mut Workbook) -> String {
        let mut package = MemoryPackage::new();
        XlsxWriter::write_to(workbook, &mut package).unwrap();
        let id = workbook.worksheet(0).unwrap().sheet_id();
        package
            .part_str(&crate::writer::worksheet_part(id))
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_cell_encodings() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.add_cell(true, "A1", None).unwrap();
        sheet.add_cell(22.2_f32, "B1", None).unwrap();
        sheet.add_cell(-7_i64, "C1", None).unwrap();
        sheet.add_cell("text", "D1", None).unwrap();
        sheet.add_cell_formula("SUM(B1:C1)", "E1", None).unwrap();
        sheet
            .add_cell(
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                "F1",
                None,
            )
            .unwrap();

        let xml = sheet_xml(&mut workbook);
        assert!(xml.contains("<c r=\"A1\" t=\"b\"><v>1</v></c>"));
        assert!(xml.contains("<c r=\"B1\" t=\"n\"><v>22.2</v></c>"));
        assert!(xml.contains("<c r=\"C1\" t=\"n\"><v>-7</v></c>"));
        assert!(xml.contains("<c r=\"D1\" t=\"s\"><v>0</v></c>"));
        assert!(xml.contains("<c r=\"E1\" t=\"str\"><f>SUM(B1:C1)</f></c>"));
        assert!(xml.contains("t=\"n\"><v>45306</v></c>"));
        assert!(xml.contains("<dimension ref=\"A1:F1\"/>"));
    }

    #[test]
    fn test_element_order() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.add_cell("h", "A1", None).unwrap();
        sheet.set_column_width(0, 20.0).unwrap();
        sheet.merge_cells(&CellRange::parse("A1:B1").unwrap()).unwrap();
        sheet.set_auto_filter(0, 1).unwrap();
        sheet.set_protected(true);

        let xml = sheet_xml(&mut workbook);
        let order = [
            "<dimension",
            "<sheetViews>",
            "<sheetFormatPr",
            "<cols>",
            "<sheetData>",
            "<sheetProtection",
            "<autoFilter",
            "<mergeCells",
        ];
        let positions: Vec<usize> = order.iter().map(|tag| xml.find(tag).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", xml);
    }

    #[test]
    fn test_merge_interior_written_empty() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.add_cell("anchor", "A1", None).unwrap();
        sheet.add_cell("covered", "B1", None).unwrap();
        sheet.merge_cells(&CellRange::parse("A1:B2").unwrap()).unwrap();

        let xml = sheet_xml(&mut workbook);
        assert!(xml.contains("<c r=\"A1\" t=\"s\"><v>0</v></c>"));
        assert!(xml.contains("<c r=\"B1\" s=\"1\"/>"));
        assert!(xml.contains("<c r=\"A2\" s=\"1\"/>"));
        assert!(xml.contains("<mergeCell ref=\"A1:B2\"/>"));
        assert!(!xml.contains("covered"));
    }

    #[test]
    fn test_frozen_pane() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet
            .set_horizontal_split(3, true, CellAddress::parse("D1").unwrap(), WorksheetPane::BottomLeft)
            .unwrap();

        let xml = sheet_xml(&mut workbook);
        assert!(xml.contains(
            "<pane ySplit=\"3\" topLeftCell=\"D1\" activePane=\"bottomLeft\" state=\"frozen\"/>"
        ));
    }

    #[test]
    fn test_unfrozen_split_in_twips() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_horizontal_split_pixels(22.2, CellAddress::parse("A2").unwrap(), WorksheetPane::BottomLeft);

        let xml = sheet_xml(&mut workbook);
        assert!(xml.contains("<pane ySplit=\"744\" topLeftCell=\"A2\" activePane=\"bottomLeft\" state=\"split\"/>"));
    }

    #[test]
    fn test_counted_split_uses_row_heights() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_row_height(0, 30.0).unwrap();
        sheet
            .set_horizontal_split(2, false, CellAddress::parse("A3").unwrap(), WorksheetPane::BottomLeft)
            .unwrap();

        // 30 + 15 points
        let xml = sheet_xml(&mut workbook);
        assert!(xml.contains("ySplit=\"1200\""));
        assert!(xml.contains("<row r=\"1\" ht=\"30\" customHeight=\"1\"/>"));
    }

    #[test]
    fn test_sheet_protection_attributes() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_protected(true);
        sheet.set_sheet_protection_password("test");
        sheet.protection_mut().set_allowed(ProtectionAction::Sort, true);

        let xml = sheet_xml(&mut workbook);
        let hash = oxsheet_core::legacy_password_hash("test");
        assert!(xml.contains(&format!("<sheetProtection password=\"{}\" sheet=\"1\"", hash)));
        assert!(xml.contains(" sort=\"0\""));
        assert!(xml.contains(" formatCells=\"1\""));
        assert!(xml.contains(" selectLockedCells=\"0\""));
    }

    #[test]
    fn test_date_out_of_range_fails() {
        let mut workbook = Workbook::new();
        workbook
            .worksheet_mut(0)
            .unwrap()
            .add_cell(NaiveDate::from_ymd_opt(1850, 6, 1).unwrap(), "A1", None)
            .unwrap();

        let mut package = MemoryPackage::new();
        let err = XlsxWriter::write_to(&mut workbook, &mut package).unwrap_err();
        assert_eq!(err.kind(), oxsheet_core::ErrorKind::Range);
    }

    #[test]
    fn test_styled_empty_cell_keeps_style() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet
            .add_cell(CellValue::Empty, "C3", Some(&Style::new().bold(true)))
            .unwrap();

        let xml = sheet_xml(&mut workbook);
        assert!(xml.contains("<c r=\"C3\" s=\"1\"/>"));
    }
}
