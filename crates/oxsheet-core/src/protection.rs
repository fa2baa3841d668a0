//! Sheet and workbook protection

use std::collections::BTreeSet;

/// Legacy 16-bit password hash used by `sheetProtection` and
/// `workbookProtection`
///
/// Returns the hash as 4 uppercase hex digits, or an empty string for an
/// empty password.
pub fn legacy_password_hash(password: &str) -> String {
    let units: Vec<u16> = password.encode_utf16().collect();
    if units.is_empty() {
        return String::new();
    }

    fn rotate(hash: u16) -> u16 {
        ((hash >> 14) & 0x01) | ((hash << 1) & 0x7FFF)
    }

    let mut hash: u16 = 0;
    for &unit in units.iter().rev() {
        hash = rotate(hash) ^ unit;
    }
    hash = rotate(hash);
    hash ^= 0x8000 | (u16::from(b'N') << 8) | u16::from(b'K');
    hash ^= units.len() as u16;

    format!("{:04X}", hash)
}

/// Actions a user may still perform on a protected sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtectionAction {
    Objects,
    Scenarios,
    FormatCells,
    FormatColumns,
    FormatRows,
    InsertColumns,
    InsertRows,
    InsertHyperlinks,
    DeleteColumns,
    DeleteRows,
    SelectLockedCells,
    Sort,
    AutoFilter,
    PivotTables,
    SelectUnlockedCells,
}

impl ProtectionAction {
    /// All actions in attribute order
    pub const ALL: [ProtectionAction; 15] = [
        ProtectionAction::Objects,
        ProtectionAction::Scenarios,
        ProtectionAction::FormatCells,
        ProtectionAction::FormatColumns,
        ProtectionAction::FormatRows,
        ProtectionAction::InsertColumns,
        ProtectionAction::InsertRows,
        ProtectionAction::InsertHyperlinks,
        ProtectionAction::DeleteColumns,
        ProtectionAction::DeleteRows,
        ProtectionAction::SelectLockedCells,
        ProtectionAction::Sort,
        ProtectionAction::AutoFilter,
        ProtectionAction::PivotTables,
        ProtectionAction::SelectUnlockedCells,
    ];

    /// Attribute name on `sheetProtection`
    pub fn attribute(&self) -> &'static str {
        match self {
            ProtectionAction::Objects => "objects",
            ProtectionAction::Scenarios => "scenarios",
            ProtectionAction::FormatCells => "formatCells",
            ProtectionAction::FormatColumns => "formatColumns",
            ProtectionAction::FormatRows => "formatRows",
            ProtectionAction::InsertColumns => "insertColumns",
            ProtectionAction::InsertRows => "insertRows",
            ProtectionAction::InsertHyperlinks => "insertHyperlinks",
            ProtectionAction::DeleteColumns => "deleteColumns",
            ProtectionAction::DeleteRows => "deleteRows",
            ProtectionAction::SelectLockedCells => "selectLockedCells",
            ProtectionAction::Sort => "sort",
            ProtectionAction::AutoFilter => "autoFilter",
            ProtectionAction::PivotTables => "pivotTables",
            ProtectionAction::SelectUnlockedCells => "selectUnlockedCells",
        }
    }

    /// Look up an action by attribute name
    pub fn from_attribute(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.attribute() == name)
    }

    /// Whether the action is allowed when its attribute is absent
    pub fn allowed_by_default(&self) -> bool {
        matches!(
            self,
            ProtectionAction::Objects
                | ProtectionAction::Scenarios
                | ProtectionAction::SelectLockedCells
                | ProtectionAction::SelectUnlockedCells
        )
    }
}

/// Sheet protection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProtection {
    /// Protection is active
    pub enabled: bool,
    /// Actions still allowed while protected
    pub allowed: BTreeSet<ProtectionAction>,
    /// Legacy password hash (4 hex digits)
    pub password_hash: Option<String>,
}

impl Default for SheetProtection {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed: [
                ProtectionAction::SelectLockedCells,
                ProtectionAction::SelectUnlockedCells,
            ]
            .into_iter()
            .collect(),
            password_hash: None,
        }
    }
}

impl SheetProtection {
    /// Check if an action is allowed
    pub fn is_allowed(&self, action: ProtectionAction) -> bool {
        self.allowed.contains(&action)
    }

    /// Allow or forbid an action
    pub fn set_allowed(&mut self, action: ProtectionAction, allowed: bool) {
        if allowed {
            self.allowed.insert(action);
        } else {
            self.allowed.remove(&action);
        }
    }

    /// Store the hash of `password`; an empty password clears it
    pub fn set_password(&mut self, password: &str) {
        let hash = legacy_password_hash(password);
        self.password_hash = (!hash.is_empty()).then_some(hash);
    }
}

/// Workbook-level protection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookProtection {
    /// Sheets cannot be added, removed, moved or renamed
    pub lock_structure: bool,
    /// Window size and position are fixed
    pub lock_windows: bool,
    /// Legacy password hash (4 hex digits)
    pub password_hash: Option<String>,
}

impl WorkbookProtection {
    /// Protection with the given locks and an optional password
    pub fn new(lock_structure: bool, lock_windows: bool, password: Option<&str>) -> Self {
        let password_hash = password
            .map(legacy_password_hash)
            .filter(|hash| !hash.is_empty());
        Self {
            lock_structure,
            lock_windows,
            password_hash,
        }
    }

    /// Whether anything is protected
    pub fn is_active(&self) -> bool {
        self.lock_structure || self.lock_windows
    }
}
