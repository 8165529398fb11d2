//! Derived page view
//!
//! Maps page number to the marks and zones visible on that page. Never the
//! source of truth for existence: every mutation of a `ParagraphEntry` is
//! mirrored here by the same registry method, so the two can never drift.

use std::collections::BTreeMap;

use crate::marks::MarkKind;

/// Key of a mark inside the index: (paragraph id, boundary kind)
pub type MarkKey = (String, MarkKind);

/// Key of a zone inside the index: (paragraph id, zone id)
pub type ZoneKey = (String, String);

/// Marks and zones visible on one page
#[derive(Debug, Clone, Default)]
pub struct PageEntry {
    pub marks: Vec<MarkKey>,
    pub zones: Vec<ZoneKey>,
}

impl PageEntry {
    fn is_empty(&self) -> bool {
        self.marks.is_empty() && self.zones.is_empty()
    }
}

/// Page number to visible-content mapping, 1-based pages
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    pages: BTreeMap<u32, PageEntry>,
}

impl PageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_mark(&mut self, page: u32, key: MarkKey) {
        let entry = self.pages.entry(page).or_default();
        if !entry.marks.contains(&key) {
            entry.marks.push(key);
        }
    }

    pub fn remove_mark(&mut self, page: u32, key: &MarkKey) {
        if let Some(entry) = self.pages.get_mut(&page) {
            entry.marks.retain(|k| k != key);
            if entry.is_empty() {
                self.pages.remove(&page);
            }
        }
    }

    pub fn insert_zone(&mut self, page: u32, key: ZoneKey) {
        let entry = self.pages.entry(page).or_default();
        if !entry.zones.contains(&key) {
            entry.zones.push(key);
        }
    }

    pub fn remove_zone(&mut self, page: u32, key: &ZoneKey) {
        if let Some(entry) = self.pages.get_mut(&page) {
            entry.zones.retain(|k| k != key);
            if entry.is_empty() {
                self.pages.remove(&page);
            }
        }
    }

    /// Drop a zone's keys from every page
    pub fn remove_zone_everywhere(&mut self, key: &ZoneKey) {
        self.pages.retain(|_, entry| {
            entry.zones.retain(|k| k != key);
            !entry.is_empty()
        });
    }

    pub fn page(&self, page: u32) -> Option<&PageEntry> {
        self.pages.get(&page)
    }

    pub fn marks_on(&self, page: u32) -> &[MarkKey] {
        self.pages.get(&page).map(|e| e.marks.as_slice()).unwrap_or(&[])
    }

    pub fn zones_on(&self, page: u32) -> &[ZoneKey] {
        self.pages.get(&page).map(|e| e.zones.as_slice()).unwrap_or(&[])
    }

    /// Pages that currently have any visible content
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_deduplicated() {
        let mut index = PageIndex::new();
        let key = ("p1".to_string(), MarkKind::Start);
        index.insert_mark(5, key.clone());
        index.insert_mark(5, key.clone());
        assert_eq!(index.marks_on(5).len(), 1);
    }

    #[test]
    fn test_empty_pages_are_pruned() {
        let mut index = PageIndex::new();
        let key = ("p1".to_string(), MarkKind::Start);
        index.insert_mark(5, key.clone());
        index.remove_mark(5, &key);
        assert!(index.is_empty());
        assert!(index.page(5).is_none());
    }

    #[test]
    fn test_remove_zone_everywhere() {
        let mut index = PageIndex::new();
        let key = ("p1".to_string(), "dic".to_string());
        for page in 5..=8 {
            index.insert_zone(page, key.clone());
        }
        index.remove_zone_everywhere(&key);
        assert!(index.is_empty());
    }
}
