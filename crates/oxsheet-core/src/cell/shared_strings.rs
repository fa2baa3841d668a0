//! Shared string table

use ahash::AHashMap;

use super::SharedString;

/// Interns string cell values in first-seen order
///
/// `unique_count` grows only when a new string is seen; `total_count` grows
/// on every [`intern`](Self::intern) call. Both are reported in the
/// `count`/`uniqueCount` attributes of the shared strings part.
#[derive(Debug, Default, Clone)]
pub struct SharedStringTable {
    strings: Vec<SharedString>,
    index: AHashMap<SharedString, u32>,
    total_count: u64,
}

impl SharedStringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `text` and return its stable index
    pub fn intern<S: AsRef<str>>(&mut self, text: S) -> u32 {
        let text = text.as_ref();
        self.total_count += 1;

        if let Some(&idx) = self.index.get(text) {
            return idx;
        }

        let idx = self.strings.len() as u32;
        let shared = SharedString::new(text);
        self.strings.push(shared.clone());
        self.index.insert(shared, idx);
        idx
    }

    /// Append a string read from a package without counting an occurrence
    ///
    /// Duplicates are kept so that indices stay aligned with the source part.
    pub fn push_loaded(&mut self, text: SharedString) -> u32 {
        let idx = self.strings.len() as u32;
        self.index.entry(text.clone()).or_insert(idx);
        self.strings.push(text);
        idx
    }

    /// Get a string by index
    pub fn get(&self, index: u32) -> Option<&SharedString> {
        self.strings.get(index as usize)
    }

    /// Index of an already-interned string
    pub fn index_of(&self, text: &str) -> Option<u32> {
        self.index.get(text).copied()
    }

    /// Number of distinct strings
    pub fn unique_count(&self) -> usize {
        self.strings.len()
    }

    /// Number of recorded occurrences
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate strings in index order
    pub fn iter(&self) -> impl Iterator<Item = &SharedString> {
        self.strings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let mut table = SharedStringTable::new();

        assert_eq!(table.intern("alpha"), 0);
        assert_eq!(table.intern("beta"), 1);
        assert_eq!(table.intern("alpha"), 0);
        assert_eq!(table.intern("alpha"), 0);

        assert_eq!(table.unique_count(), 2);
        assert_eq!(table.total_count(), 4);
        assert_eq!(table.get(1).map(|s| s.as_str()), Some("beta"));
        assert_eq!(table.index_of("alpha"), Some(0));
        assert_eq!(table.index_of("gamma"), None);
    }

    #[test]
    fn test_intern_is_case_sensitive() {
        let mut table = SharedStringTable::new();
        assert_ne!(table.intern("Yes"), table.intern("yes"));
        assert_eq!(table.unique_count(), 2);
    }

    #[test]
    fn test_push_loaded_keeps_positions() {
        let mut table = SharedStringTable::new();
        table.push_loaded("a".into());
        table.push_loaded("a".into());
        table.push_loaded("b".into());

        assert_eq!(table.unique_count(), 3);
        assert_eq!(table.total_count(), 0);
        assert_eq!(table.get(2).map(|s| s.as_str()), Some("b"));
        assert_eq!(table.index_of("a"), Some(0));
    }

    #[test]
    fn test_iteration_order() {
        let mut table = SharedStringTable::new();
        for s in ["z", "y", "z", "x"] {
            table.intern(s);
        }
        let all: Vec<&str> = table.iter().map(|s| s.as_str()).collect();
        assert_eq!(all, vec!["z", "y", "x"]);
    }
}
