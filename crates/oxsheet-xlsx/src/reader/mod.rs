//! XLSX reader

mod sheet;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;

use oxsheet_core::{
    SharedString, SharedStringTable, Style, Workbook, WorkbookMetadata, WorkbookProtection,
    Worksheet,
};

use crate::error::{XlsxError, XlsxResult};
use crate::options::ReadOptions;
use crate::package::{PartSource, ZipPackageReader};
use crate::styles::{read_styles_xml, STYLES_PART};
use crate::writer::{
    worksheet_part, APP_PROPS_PART, CONTENT_TYPES_PART, CORE_PROPS_PART, ROOT_RELS_PART,
    SHARED_STRINGS_PART, WORKBOOK_PART,
};
use crate::xml::{attr_bool, attr_parse, attr_str, decode_escapes, part_reader};

/// One entry of a `.rels` part, with the target resolved to a package path
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

impl Relationship {
    /// Relationship types are compared by their last segment so the
    /// transitional and strict namespaces both match
    fn is(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit('/')
            .next()
            .is_some_and(|last| last == kind)
    }
}

#[derive(Debug)]
struct SheetEntry {
    name: String,
    sheet_id: Option<u32>,
    rel_id: Option<String>,
    hidden: bool,
}

#[derive(Debug, Default)]
struct WorkbookInfo {
    sheets: Vec<SheetEntry>,
    active_tab: Option<usize>,
    date_1904: bool,
    protection: Option<WorkbookProtection>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        Self::read_file_with_options(path, &ReadOptions::default())
    }

    /// Read a workbook from a file path with import options
    pub fn read_file_with_options<P: AsRef<Path>>(
        path: P,
        options: &ReadOptions,
    ) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read_with_options(BufReader::new(file), options)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        Self::read_with_options(reader, &ReadOptions::default())
    }

    /// Read a workbook from a reader with import options
    pub fn read_with_options<R: Read + Seek>(
        reader: R,
        options: &ReadOptions,
    ) -> XlsxResult<Workbook> {
        let mut package = ZipPackageReader::new(reader)?;
        Self::read_from(&mut package, options)
    }

    /// Read a workbook out of any part source
    ///
    /// Shared strings and styles are loaded before any worksheet so every
    /// cell can be resolved in one pass.
    pub fn read_from<S: PartSource>(source: &mut S, options: &ReadOptions) -> XlsxResult<Workbook> {
        if !source.has_part(CONTENT_TYPES_PART) {
            return Err(XlsxError::InvalidFormat(format!(
                "missing {}",
                CONTENT_TYPES_PART
            )));
        }

        let root_rels = match source.read_part(ROOT_RELS_PART)? {
            Some(data) => read_relationships(&data, ROOT_RELS_PART, "")?,
            None => Vec::new(),
        };
        let workbook_path = root_rels
            .iter()
            .find(|rel| rel.is("officeDocument"))
            .map_or_else(|| WORKBOOK_PART.to_string(), |rel| rel.target.clone());

        let workbook_rels_path = rels_part_for(&workbook_path);
        let workbook_rels = match source.read_part(&workbook_rels_path)? {
            Some(data) => read_relationships(&data, &workbook_rels_path, part_dir(&workbook_path))?,
            None => {
                log::warn!("{} not found, using conventional part paths", workbook_rels_path);
                Vec::new()
            }
        };
        let related = |kind: &str, fallback: &str| {
            workbook_rels
                .iter()
                .find(|rel| rel.is(kind))
                .map_or_else(|| fallback.to_string(), |rel| rel.target.clone())
        };

        let strings_path = related("sharedStrings", SHARED_STRINGS_PART);
        let strings = match source.read_part(&strings_path)? {
            Some(data) => read_shared_strings(&data, &strings_path)?,
            None => SharedStringTable::new(),
        };

        let styles_path = related("styles", STYLES_PART);
        let styles = match source.read_part(&styles_path)? {
            Some(data) => read_styles_xml(&data)?,
            None => vec![Style::default()],
        };
        log::debug!(
            "loaded {} shared strings and {} cell formats",
            strings.unique_count(),
            styles.len()
        );

        let workbook_data = source
            .read_part(&workbook_path)?
            .ok_or_else(|| XlsxError::MissingPart(workbook_path.clone()))?;
        let info = read_workbook_xml(&workbook_data, &workbook_path)?;

        let mut workbook = Workbook::empty();
        workbook.settings_mut().date_1904 = info.date_1904;
        workbook.set_protection(info.protection.clone());

        let sheet_paths: HashMap<&str, &str> = workbook_rels
            .iter()
            .filter(|rel| rel.is("worksheet"))
            .map(|rel| (rel.id.as_str(), rel.target.as_str()))
            .collect();

        let mut hidden = Vec::new();
        for (position, entry) in info.sheets.iter().enumerate() {
            let path = match entry.rel_id.as_deref().and_then(|id| sheet_paths.get(id)) {
                Some(path) => path.to_string(),
                None => {
                    let fallback = worksheet_part(entry.sheet_id.unwrap_or(position as u32 + 1));
                    log::warn!(
                        "no worksheet relationship for sheet {:?}, trying {}",
                        entry.name,
                        fallback
                    );
                    fallback
                }
            };
            let data = source
                .read_part(&path)?
                .ok_or_else(|| XlsxError::MissingPart(path.clone()))?;

            let index = add_named_sheet(&mut workbook, &entry.name)?;
            let worksheet = workbook.worksheet_mut(index).ok_or_else(|| {
                XlsxError::InvalidFormat(format!("sheet {} vanished while loading", index))
            })?;
            let context = sheet::SheetContext {
                part: &path,
                strings: &strings,
                styles: &styles,
                date_1904: info.date_1904,
                options,
            };
            sheet::read_worksheet(&data, worksheet, &context)?;
            log::debug!("read {} ({} cells)", path, worksheet.cell_count());

            if entry.hidden {
                hidden.push(index);
            }
        }

        if workbook.is_empty() {
            workbook.add_worksheet()?;
        }

        for index in hidden {
            if let Err(e) = workbook.set_sheet_hidden(index, true) {
                log::warn!("keeping sheet {} visible: {}", index, e);
            }
        }
        if let Some(tab) = info.active_tab {
            if let Err(e) = workbook.set_selected_sheet(tab) {
                log::warn!("ignoring active tab {}: {}", tab, e);
            }
        }

        let core_path = root_rels
            .iter()
            .find(|rel| rel.is("core-properties"))
            .map_or_else(|| CORE_PROPS_PART.to_string(), |rel| rel.target.clone());
        let app_path = root_rels
            .iter()
            .find(|rel| rel.is("extended-properties"))
            .map_or_else(|| APP_PROPS_PART.to_string(), |rel| rel.target.clone());
        for path in [core_path, app_path] {
            if let Some(data) = source.read_part(&path)? {
                read_properties(&data, &path, workbook.metadata_mut())?;
            }
        }

        Ok(workbook)
    }
}

/// Add a sheet, renaming it when the stored name is not acceptable
fn add_named_sheet(workbook: &mut Workbook, name: &str) -> XlsxResult<usize> {
    match workbook.add_worksheet_with_name(name) {
        Ok(index) => Ok(index),
        Err(e) => {
            let existing: Vec<String> = workbook
                .worksheets()
                .map(|sheet| sheet.name().to_string())
                .collect();
            let sanitized = Worksheet::sanitize_name(name, &existing);
            log::warn!("sheet name {:?} rejected ({}), using {:?}", name, e, sanitized);
            Ok(workbook.add_worksheet_with_name(&sanitized)?)
        }
    }
}

/// Directory of a part path, without the trailing slash
fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn read_relationships(data: &[u8], part: &str, base_dir: &str) -> XlsxResult<Vec<Relationship>> {
    let mut reader = part_reader(data);
    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship"
                    && attr_str(&e, b"TargetMode").as_deref() != Some("External") =>
            {
                match (
                    attr_str(&e, b"Id"),
                    attr_str(&e, b"Type"),
                    attr_str(&e, b"Target"),
                ) {
                    (Some(id), Some(rel_type), Some(target)) => rels.push(Relationship {
                        id,
                        rel_type,
                        target: resolve_target(base_dir, &target),
                    }),
                    _ => log::warn!("incomplete relationship in {}", part),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Read the shared string table, concatenating rich text runs
fn read_shared_strings(data: &[u8], part: &str) -> XlsxResult<SharedStringTable> {
    let mut reader = part_reader(data);
    let mut buf = Vec::new();
    let mut table = SharedStringTable::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    // phonetic runs are not part of the value
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                table.push_loaded(SharedString::new(""));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => {
                    table.push_loaded(SharedString::new(decode_escapes(&current)));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_t => {
                let text = t.unescape().map_err(|e| XlsxError::xml(part, e))?;
                current.push_str(&text);
            }
            Ok(Event::CData(t)) if in_t => current.push_str(&String::from_utf8_lossy(&t)),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(table)
}

fn read_workbook_xml(data: &[u8], part: &str) -> XlsxResult<WorkbookInfo> {
    let mut reader = part_reader(data);
    let mut buf = Vec::new();
    let mut info = WorkbookInfo::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    info.date_1904 = attr_bool(&e, b"date1904").unwrap_or(false);
                }
                b"workbookProtection" => {
                    info.protection = Some(WorkbookProtection {
                        lock_structure: attr_bool(&e, b"lockStructure").unwrap_or(false),
                        lock_windows: attr_bool(&e, b"lockWindows").unwrap_or(false),
                        password_hash: attr_str(&e, b"workbookPassword")
                            .filter(|hash| !hash.is_empty()),
                    });
                }
                // only the first window counts
                b"workbookView" if info.active_tab.is_none() => {
                    info.active_tab = Some(attr_parse(&e, b"activeTab").unwrap_or(0));
                }
                b"sheet" => {
                    let name = attr_str(&e, b"name")
                        .ok_or_else(|| XlsxError::parse(part, "sheet without a name"))?;
                    let state = attr_str(&e, b"state");
                    info.sheets.push(SheetEntry {
                        name,
                        sheet_id: attr_parse(&e, b"sheetId"),
                        rel_id: attr_str(&e, b"id"),
                        hidden: matches!(state.as_deref(), Some("hidden") | Some("veryHidden")),
                    });
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(info)
}

fn property_slot<'m>(
    metadata: &'m mut WorkbookMetadata,
    name: &[u8],
) -> Option<&'m mut Option<String>> {
    let slot = match name {
        b"title" => &mut metadata.title,
        b"subject" => &mut metadata.subject,
        b"creator" => &mut metadata.creator,
        b"keywords" => &mut metadata.keywords,
        b"description" => &mut metadata.description,
        b"category" => &mut metadata.category,
        b"lastModifiedBy" => &mut metadata.last_modified_by,
        b"Application" => &mut metadata.application,
        b"Company" => &mut metadata.company,
        b"Manager" => &mut metadata.manager,
        b"AppVersion" => &mut metadata.app_version,
        _ => return None,
    };
    Some(slot)
}

/// Read `docProps/core.xml` or `docProps/app.xml` into the metadata
fn read_properties(data: &[u8], part: &str, metadata: &mut WorkbookMetadata) -> XlsxResult<()> {
    let mut reader = part_reader(data);
    let mut buf = Vec::new();
    let mut open: Option<Vec<u8>> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                open = Some(e.local_name().as_ref().to_vec());
                text.clear();
            }
            Ok(Event::Text(t)) if open.is_some() => {
                text.push_str(&t.unescape().map_err(|e| XlsxError::xml(part, e))?);
            }
            Ok(Event::End(e)) => {
                if open.as_deref() == Some(e.local_name().as_ref()) && !text.is_empty() {
                    if let Some(slot) = property_slot(metadata, e.local_name().as_ref()) {
                        *slot = Some(std::mem::take(&mut text));
                    }
                }
                open = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}
