//! Workbook: ordered sheets plus package-wide settings

use crate::error::{Error, Result};
use crate::protection::WorkbookProtection;
use crate::worksheet::Worksheet;

/// A spreadsheet document
///
/// A workbook owns its worksheets. Sheet-level rules that span sheets
/// (unique names, at least one visible sheet) are enforced here.
#[derive(Debug, Clone)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    settings: WorkbookSettings,
    metadata: WorkbookMetadata,
    protection: Option<WorkbookProtection>,
    /// Index of the active tab
    selected_sheet: usize,
    /// Id handed to the next added sheet
    next_sheet_id: u32,
}

impl Workbook {
    /// Create a new workbook with one worksheet named "Sheet1"
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb.next_sheet_id = 2;
        wb
    }

    /// A workbook without sheets; the reader starts from this
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            settings: WorkbookSettings::default(),
            metadata: WorkbookMetadata::default(),
            protection: None,
            selected_sheet: 0,
            next_sheet_id: 1,
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Sheet lookup ignores case, like sheet name uniqueness
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| same_name(ws.name(), name))
    }

    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| same_name(ws.name(), name))
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| same_name(ws.name(), name))
    }

    /// Sheets in tab order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    pub fn worksheets_mut(&mut self) -> impl Iterator<Item = &mut Worksheet> {
        self.worksheets.iter_mut()
    }

    /// Append a sheet named `SheetN`, with the first free `N`
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.next_default_name();
        self.add_worksheet_with_name(&name)
    }

    /// Append an empty sheet; the name must be valid and unused
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.add_existing_worksheet(Worksheet::new(name))
    }

    /// Add a worksheet built elsewhere; it receives a fresh sheet id
    pub fn add_existing_worksheet(&mut self, mut worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name(), None)?;
        worksheet.set_sheet_id(self.next_sheet_id);
        self.next_sheet_id += 1;

        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        log::debug!("added worksheet {} at index {}", self.worksheets[index].name(), index);
        Ok(index)
    }

    /// Remove a sheet and return it
    ///
    /// The last visible sheet cannot be removed while other sheets are
    /// hidden.
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        let ws = self.checked_sheet(index)?;
        if !ws.is_hidden() && self.visible_count() == 1 && self.worksheets.len() > 1 {
            return Err(Error::worksheet(
                "cannot remove the last visible worksheet",
            ));
        }

        let worksheet = self.worksheets.remove(index);

        if self.selected_sheet > index
            || (self.selected_sheet == index && self.selected_sheet >= self.worksheets.len())
        {
            self.selected_sheet = self.selected_sheet.saturating_sub(1);
        }
        if self
            .worksheets
            .get(self.selected_sheet)
            .is_some_and(Worksheet::is_hidden)
        {
            self.selected_sheet = self.first_visible().unwrap_or(0);
        }

        Ok(worksheet)
    }

    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        self.checked_sheet(index)?;
        self.validate_sheet_name(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name)
    }

    // === Visibility and selection ===

    /// Hide or show a worksheet
    ///
    /// At least one sheet must stay visible. Hiding the selected sheet
    /// moves the selection to the first visible one.
    pub fn set_sheet_hidden(&mut self, index: usize, hidden: bool) -> Result<()> {
        let ws = self.checked_sheet(index)?;
        if hidden && !ws.is_hidden() && self.visible_count() == 1 {
            return Err(Error::worksheet(format!(
                "cannot hide '{}': a workbook needs at least one visible worksheet",
                ws.name()
            )));
        }

        self.worksheets[index].set_hidden(hidden);
        if hidden && self.selected_sheet == index {
            self.selected_sheet = self.first_visible().unwrap_or(0);
        }
        Ok(())
    }

    pub fn selected_sheet(&self) -> usize {
        self.selected_sheet
    }

    /// Make a sheet the active tab; hidden sheets cannot be selected
    pub fn set_selected_sheet(&mut self, index: usize) -> Result<()> {
        let ws = self.checked_sheet(index)?;
        if ws.is_hidden() {
            return Err(Error::worksheet(format!(
                "cannot select hidden worksheet '{}'",
                ws.name()
            )));
        }
        self.selected_sheet = index;
        Ok(())
    }

    fn visible_count(&self) -> usize {
        self.worksheets.iter().filter(|ws| !ws.is_hidden()).count()
    }

    fn first_visible(&self) -> Option<usize> {
        self.worksheets.iter().position(|ws| !ws.is_hidden())
    }

    // === Settings ===

    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    /// Document properties
    pub fn metadata(&self) -> &WorkbookMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut WorkbookMetadata {
        &mut self.metadata
    }

    /// Structure and window protection, if any
    pub fn protection(&self) -> Option<&WorkbookProtection> {
        self.protection.as_ref()
    }

    pub fn set_protection(&mut self, protection: Option<WorkbookProtection>) {
        self.protection = protection;
    }

    // === Internal ===

    fn checked_sheet(&self, index: usize) -> Result<&Worksheet> {
        self.worksheets
            .get(index)
            .ok_or(Error::SheetOutOfBounds(index, self.worksheets.len()))
    }

    /// Check `name` for validity and for a clash with any sheet other
    /// than `skip`
    fn validate_sheet_name(&self, name: &str, skip: Option<usize>) -> Result<()> {
        Worksheet::validate_name(name)?;
        let clash = self
            .worksheets
            .iter()
            .enumerate()
            .any(|(i, ws)| Some(i) != skip && same_name(ws.name(), name));
        if clash {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }

    fn next_default_name(&self) -> String {
        (self.worksheets.len() + 1..)
            .map(|n| format!("Sheet{n}"))
            .find(|name| self.sheet_index(name).is_none())
            .unwrap_or_default()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings stored in `workbookPr`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookSettings {
    /// Date system: false = 1900, true = 1904
    pub date_1904: bool,
}

impl WorkbookSettings {
    /// Use the 1904 date system
    pub fn with_date_1904(mut self, date_1904: bool) -> Self {
        self.date_1904 = date_1904;
        self
    }
}

/// Document properties written to `docProps/core.xml` and `docProps/app.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookMetadata {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub last_modified_by: Option<String>,
    pub application: Option<String>,
    pub company: Option<String>,
    pub manager: Option<String>,
    /// Application version, e.g. "16.0300"
    pub app_version: Option<String>,
}

impl WorkbookMetadata {
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the author
    pub fn with_creator<S: Into<String>>(mut self, creator: S) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Set the company
    pub fn with_company<S: Into<String>>(mut self, company: S) -> Self {
        self.company = Some(company.into());
        self
    }
}
