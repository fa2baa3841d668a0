//! XLSX writer
//!
//! Saving happens in two steps: every part is rendered to bytes first, then
//! the finished parts are handed to a [`PartSink`]. A failure while
//! rendering therefore never leaves a half-written archive behind.

pub(crate) mod sheet;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use oxsheet_core::{SharedStringTable, Workbook, WorkbookMetadata};

use crate::error::{XlsxError, XlsxResult};
use crate::package::{PartSink, ZipPackageWriter};
use crate::styles::{XlsxStyleTable, STYLES_PART};
use crate::xml::{encode_escapes, escape_xml, NS_MAIN, NS_PKG_REL, NS_REL, XML_HEADER};

pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub(crate) const ROOT_RELS_PART: &str = "_rels/.rels";
pub(crate) const CORE_PROPS_PART: &str = "docProps/core.xml";
pub(crate) const APP_PROPS_PART: &str = "docProps/app.xml";
pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub(crate) const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(crate) const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub(crate) const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_APP_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";

const DEFAULT_APPLICATION: &str = "oxsheet";

/// Path of a worksheet part, numbered by sheet id
pub(crate) fn worksheet_part(sheet_id: u32) -> String {
    format!("xl/worksheets/sheet{}.xml", sheet_id)
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    ///
    /// The file is only created once every part has been rendered.
    pub fn write_file<P: AsRef<Path>>(workbook: &mut Workbook, path: P) -> XlsxResult<()> {
        let parts = Self::build_parts(workbook)?;
        let file = File::create(path)?;
        Self::emit(parts, ZipPackageWriter::new(BufWriter::new(file)))
    }

    /// Write a workbook as a zip archive to a seekable stream
    pub fn write<W: Write + Seek>(workbook: &mut Workbook, writer: W) -> XlsxResult<()> {
        Self::write_to(workbook, ZipPackageWriter::new(writer))
    }

    /// Write a workbook to any part sink
    pub fn write_to<S: PartSink>(workbook: &mut Workbook, sink: S) -> XlsxResult<()> {
        let parts = Self::build_parts(workbook)?;
        Self::emit(parts, sink)
    }

    /// Render every part of the package
    ///
    /// This runs the save-time fixups on each worksheet first: merged
    /// regions are resolved, default column entries are pruned and the
    /// auto-filter is extended over the data.
    pub fn build_parts(workbook: &mut Workbook) -> XlsxResult<Vec<(String, Vec<u8>)>> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "a workbook needs at least one worksheet".into(),
            ));
        }
        check_unique_names(workbook)?;

        for sheet in workbook.worksheets_mut() {
            sheet.resolve_merged_cells()?;
            sheet.recalculate_columns();
            sheet.recalculate_auto_filter();
        }
        let workbook: &Workbook = workbook;

        let style_table = XlsxStyleTable::build(workbook)?;
        let mut strings = SharedStringTable::new();
        let date_1904 = workbook.settings().date_1904;

        let mut sheet_parts = Vec::with_capacity(workbook.sheet_count());
        for (index, sheet) in workbook.worksheets().enumerate() {
            let context = sheet::SheetContext {
                index,
                selected: index == workbook.selected_sheet(),
                date_1904,
                styles: &style_table,
            };
            let xml = sheet::write_worksheet_xml(sheet, &context, &mut strings)?;
            sheet_parts.push((worksheet_part(sheet.sheet_id()), xml.into_bytes()));
        }

        let has_strings = !strings.is_empty();
        let mut parts = Vec::with_capacity(sheet_parts.len() + 8);
        let mut push = |path: &str, xml: String| parts.push((path.to_string(), xml.into_bytes()));
        push(CONTENT_TYPES_PART, content_types_xml(workbook, has_strings));
        push(ROOT_RELS_PART, root_rels_xml());
        push(CORE_PROPS_PART, core_props_xml(workbook.metadata()));
        push(APP_PROPS_PART, app_props_xml(workbook));
        push(WORKBOOK_PART, workbook_xml(workbook));
        push(WORKBOOK_RELS_PART, workbook_rels_xml(workbook, has_strings));
        push(STYLES_PART, style_table.to_styles_xml()?);
        if has_strings {
            push(SHARED_STRINGS_PART, shared_strings_xml(&strings));
        }
        parts.extend(sheet_parts);

        log::debug!(
            "rendered {} parts for {} sheets ({} unique strings)",
            parts.len(),
            workbook.sheet_count(),
            strings.unique_count()
        );
        Ok(parts)
    }

    fn emit<S: PartSink>(parts: Vec<(String, Vec<u8>)>, mut sink: S) -> XlsxResult<()> {
        for (path, data) in &parts {
            sink.write_part(path, data)?;
        }
        sink.finish()
    }
}

fn check_unique_names(workbook: &Workbook) -> XlsxResult<()> {
    let mut seen = HashSet::new();
    for sheet in workbook.worksheets() {
        if !seen.insert(sheet.name().to_lowercase()) {
            return Err(oxsheet_core::Error::DuplicateSheetName(sheet.name().to_string()).into());
        }
    }
    Ok(())
}

fn content_types_xml(workbook: &Workbook, has_strings: bool) -> String {
    let mut content = String::from(XML_HEADER);
    content.push_str(
        r#"
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    if has_strings {
        content.push_str(
            r#"
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );
    }
    for sheet in workbook.worksheets() {
        content.push_str(&format!(
            r#"
    <Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            worksheet_part(sheet.sheet_id())
        ));
    }
    content.push_str(
        r#"
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#,
    );
    content
}

fn root_rels_xml() -> String {
    format!(
        r#"{}
<Relationships xmlns="{}">
    <Relationship Id="rId1" Type="{}" Target="{}"/>
    <Relationship Id="rId2" Type="{}" Target="{}"/>
    <Relationship Id="rId3" Type="{}" Target="{}"/>
</Relationships>"#,
        XML_HEADER,
        NS_PKG_REL,
        REL_OFFICE_DOCUMENT,
        WORKBOOK_PART,
        REL_CORE_PROPS,
        CORE_PROPS_PART,
        REL_APP_PROPS,
        APP_PROPS_PART
    )
}

fn optional_element(content: &mut String, tag: &str, value: &Option<String>) {
    if let Some(value) = value {
        content.push_str(&format!("\n    <{tag}>{}</{tag}>", escape_xml(value)));
    }
}

fn core_props_xml(metadata: &WorkbookMetadata) -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut content = String::from(XML_HEADER);
    content.push_str(
        r#"
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    );
    optional_element(&mut content, "dc:title", &metadata.title);
    optional_element(&mut content, "dc:subject", &metadata.subject);
    optional_element(&mut content, "dc:creator", &metadata.creator);
    optional_element(&mut content, "cp:keywords", &metadata.keywords);
    optional_element(&mut content, "dc:description", &metadata.description);
    optional_element(&mut content, "cp:lastModifiedBy", &metadata.last_modified_by);
    optional_element(&mut content, "cp:category", &metadata.category);
    content.push_str(&format!(
        r#"
    <dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>
    <dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>
</cp:coreProperties>"#
    ));
    content
}

fn app_props_xml(workbook: &Workbook) -> String {
    let metadata = workbook.metadata();
    let mut content = String::from(XML_HEADER);
    content.push_str(
        r#"
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
    );
    content.push_str(&format!(
        "\n    <Application>{}</Application>",
        escape_xml(metadata.application.as_deref().unwrap_or(DEFAULT_APPLICATION))
    ));
    content.push_str("\n    <DocSecurity>0</DocSecurity>\n    <ScaleCrop>false</ScaleCrop>");
    optional_element(&mut content, "Manager", &metadata.manager);
    optional_element(&mut content, "Company", &metadata.company);
    content.push_str(&format!(
        r#"
    <TitlesOfParts>
        <vt:vector size="{}" baseType="lpstr">"#,
        workbook.sheet_count()
    ));
    for sheet in workbook.worksheets() {
        content.push_str(&format!(
            "\n            <vt:lpstr>{}</vt:lpstr>",
            escape_xml(sheet.name())
        ));
    }
    content.push_str("\n        </vt:vector>\n    </TitlesOfParts>");
    optional_element(&mut content, "AppVersion", &metadata.app_version);
    content.push_str("\n</Properties>");
    content
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut content = String::from(XML_HEADER);
    content.push_str(&format!(
        "\n<workbook xmlns=\"{}\" xmlns:r=\"{}\">",
        NS_MAIN, NS_REL
    ));

    if workbook.settings().date_1904 {
        content.push_str("\n    <workbookPr date1904=\"1\"/>");
    } else {
        content.push_str("\n    <workbookPr/>");
    }

    if let Some(protection) = workbook.protection().filter(|p| p.is_active()) {
        content.push_str("\n    <workbookProtection");
        if let Some(hash) = &protection.password_hash {
            content.push_str(&format!(" workbookPassword=\"{}\"", hash));
        }
        if protection.lock_structure {
            content.push_str(" lockStructure=\"1\"");
        }
        if protection.lock_windows {
            content.push_str(" lockWindows=\"1\"");
        }
        content.push_str("/>");
    }

    content.push_str(&format!(
        "\n    <bookViews>\n        <workbookView activeTab=\"{}\"/>\n    </bookViews>",
        workbook.selected_sheet()
    ));

    content.push_str("\n    <sheets>");
    for (i, sheet) in workbook.worksheets().enumerate() {
        let state = if sheet.is_hidden() {
            " state=\"hidden\""
        } else {
            ""
        };
        content.push_str(&format!(
            "\n        <sheet name=\"{}\" sheetId=\"{}\"{} r:id=\"rId{}\"/>",
            escape_xml(sheet.name()),
            sheet.sheet_id(),
            state,
            i + 1
        ));
    }
    content.push_str("\n    </sheets>\n</workbook>");
    content
}

fn workbook_rels_xml(workbook: &Workbook, has_strings: bool) -> String {
    let mut content = String::from(XML_HEADER);
    content.push_str(&format!("\n<Relationships xmlns=\"{}\">", NS_PKG_REL));

    for (i, sheet) in workbook.worksheets().enumerate() {
        content.push_str(&format!(
            "\n    <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"worksheets/sheet{}.xml\"/>",
            i + 1,
            REL_WORKSHEET,
            sheet.sheet_id()
        ));
    }

    let styles_rid = workbook.sheet_count() + 1;
    content.push_str(&format!(
        "\n    <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"styles.xml\"/>",
        styles_rid, REL_STYLES
    ));
    if has_strings {
        content.push_str(&format!(
            "\n    <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"sharedStrings.xml\"/>",
            styles_rid + 1,
            REL_SHARED_STRINGS
        ));
    }

    content.push_str("\n</Relationships>");
    content
}

fn shared_strings_xml(strings: &SharedStringTable) -> String {
    let mut content = String::from(XML_HEADER);
    content.push_str(&format!(
        "\n<sst xmlns=\"{}\" count=\"{}\" uniqueCount=\"{}\">",
        NS_MAIN,
        strings.total_count(),
        strings.unique_count()
    ));
    for text in strings.iter() {
        let text = text.as_str();
        let space = if text.trim() != text {
            " xml:space=\"preserve\""
        } else {
            ""
        };
        content.push_str(&format!(
            "\n    <si><t{}>{}</t></si>",
            space,
            escape_xml(&encode_escapes(text))
        ));
    }
    content.push_str("\n</sst>");
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::MemoryPackage;
    use oxsheet_core::{CellRange, WorkbookProtection, Worksheet};

    fn render(workbook: &mut Workbook) -> MemoryPackage {
        let mut package = MemoryPackage::new();
        XlsxWriter::write_to(workbook, &mut package).unwrap();
        package
    }

    #[test]
    fn test_package_layout() {
        let mut workbook = Workbook::new();
        workbook
            .worksheet_mut(0)
            .unwrap()
            .add_cell("hello", "A1", None)
            .unwrap();
        let package = render(&mut workbook);

        for part in [
            CONTENT_TYPES_PART,
            ROOT_RELS_PART,
            CORE_PROPS_PART,
            APP_PROPS_PART,
            WORKBOOK_PART,
            WORKBOOK_RELS_PART,
            STYLES_PART,
            SHARED_STRINGS_PART,
            "xl/worksheets/sheet1.xml",
        ] {
            assert!(package.part(part).is_some(), "missing {}", part);
        }
    }

    #[test]
    fn test_no_shared_strings_without_strings() {
        let mut workbook = Workbook::new();
        workbook
            .worksheet_mut(0)
            .unwrap()
            .add_cell(42, "A1", None)
            .unwrap();
        let package = render(&mut workbook);

        assert!(package.part(SHARED_STRINGS_PART).is_none());
        assert!(!package
            .part_str(CONTENT_TYPES_PART)
            .unwrap()
            .contains("sharedStrings"));
    }

    #[test]
    fn test_shared_string_counts() {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.add_cell("north", "A1", None).unwrap();
        sheet.add_cell("south", "A2", None).unwrap();
        sheet.add_cell("north", "A3", None).unwrap();
        sheet.add_cell("  padded", "A4", None).unwrap();
        let package = render(&mut workbook);

        let sst = package.part_str(SHARED_STRINGS_PART).unwrap();
        assert!(sst.contains("count=\"4\" uniqueCount=\"3\""));
        assert!(sst.contains("<t xml:space=\"preserve\">  padded</t>"));
    }

    #[test]
    fn test_sheet_parts_follow_sheet_ids() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet_with_name("Second").unwrap();
        workbook.add_worksheet_with_name("Third").unwrap();
        workbook.remove_worksheet(1).unwrap();
        let package = render(&mut workbook);

        assert!(package.part("xl/worksheets/sheet1.xml").is_some());
        assert!(package.part("xl/worksheets/sheet3.xml").is_some());
        let rels = package.part_str(WORKBOOK_RELS_PART).unwrap();
        assert!(rels.contains("Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet3.xml\""));
    }

    #[test]
    fn test_workbook_part() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet_with_name("Hidden").unwrap();
        workbook.add_worksheet_with_name("Last").unwrap();
        workbook.set_sheet_hidden(1, true).unwrap();
        workbook.set_selected_sheet(2).unwrap();
        workbook.set_protection(Some(WorkbookProtection::new(true, false, Some("secret"))));
        let package = render(&mut workbook);

        let xml = package.part_str(WORKBOOK_PART).unwrap();
        assert!(xml.contains("<workbookView activeTab=\"2\"/>"));
        assert!(xml.contains("<sheet name=\"Hidden\" sheetId=\"2\" state=\"hidden\" r:id=\"rId2\"/>"));
        assert!(xml.contains("lockStructure=\"1\""));
        assert!(!xml.contains("lockWindows"));
        assert!(xml.contains("workbookPassword=\""));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut workbook = Workbook::empty();
        workbook.add_existing_worksheet(Worksheet::new("Data")).unwrap();
        let mut other = Worksheet::new("Other");
        other.add_cell(1, "A1", None).unwrap();
        workbook.add_existing_worksheet(other).unwrap();
        workbook.worksheet_mut(1).unwrap().set_name("DATA").unwrap();

        let mut package = MemoryPackage::new();
        let err = XlsxWriter::write_to(&mut workbook, &mut package).unwrap_err();
        assert!(matches!(
            err,
            XlsxError::Core(oxsheet_core::Error::DuplicateSheetName(_))
        ));
        assert!(package.is_empty());
    }

    #[test]
    fn test_empty_workbook_rejected() {
        let mut workbook = Workbook::empty();
        let mut package = MemoryPackage::new();
        assert!(matches!(
            XlsxWriter::write_to(&mut workbook, &mut package),
            Err(XlsxError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_metadata_parts() {
        let mut workbook = Workbook::new();
        *workbook.metadata_mut() = WorkbookMetadata::default()
            .with_title("Q3 <draft>")
            .with_company("Acme");
        let package = render(&mut workbook);

        let core = package.part_str(CORE_PROPS_PART).unwrap();
        assert!(core.contains("<dc:title>Q3 &lt;draft&gt;</dc:title>"));
        assert!(core.contains("<dcterms:created xsi:type=\"dcterms:W3CDTF\">"));
        let app = package.part_str(APP_PROPS_PART).unwrap();
        assert!(app.contains("<Company>Acme</Company>"));
        assert!(app.contains("<Application>oxsheet</Application>"));
    }

    #[test]
    fn test_zip_output_is_readable() {
        let mut workbook = Workbook::new();
        workbook
            .worksheet_mut(0)
            .unwrap()
            .merge_cells(&CellRange::parse("A1:B1").unwrap())
            .unwrap();
        let mut buffer = std::io::Cursor::new(Vec::new());
        XlsxWriter::write(&mut workbook, &mut buffer).unwrap();

        buffer.set_position(0);
        let archive = zip::ZipArchive::new(buffer).unwrap();
        assert!(archive.file_names().any(|n| n == "xl/worksheets/sheet1.xml"));
    }
}
