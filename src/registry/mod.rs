//! Paragraph registry
//!
//! Owns, per paragraph identity, the (start, end) mark pair and its ordered
//! zone list, and keeps the derived [`PageIndex`] in step within the same
//! call that mutates an entry. Access is serialized by the caller; see
//! `state` for the shared wrapper.

mod entry;
mod page_index;

pub use entry::ParagraphEntry;
pub use page_index::{MarkKey, PageEntry, PageIndex, ZoneKey};

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{MarkupError, Result};
use crate::marks::{
    derive_zone_id, Mark, MarkKind, Point, SourceObject, Zone, ZoneEdge, ZonePlacement,
    PROXIMITY_TOLERANCE,
};
use crate::placement::PlacementPlan;
use crate::validate;

/// Placement request consumed by [`ParagraphRegistry::add_zone`]
#[derive(Debug, Clone)]
pub struct ZoneSpec {
    pub paragraph_id: String,
    pub rubric: String,
    pub source_objects: Vec<SourceObject>,
    pub request: ZoneRequest,
    pub is_auto: bool,
}

/// Requested binding for a new zone
///
/// Pass-through carries no pages of its own; the registry derives the page
/// set from the paragraph's current span.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneRequest {
    Manual { page: u32, offset: f64 },
    AutoEdge { edge: ZoneEdge, stack_index: usize, offset: f64 },
    Passthrough,
}

/// A selected mark or zone, as returned by hit testing
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Mark { paragraph_id: String, kind: MarkKind },
    Zone { paragraph_id: String, zone_id: String },
}

/// The annotation state engine
#[derive(Debug, Default)]
pub struct ParagraphRegistry {
    entries: BTreeMap<String, ParagraphEntry>,
    index: PageIndex,
}

impl ParagraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Marks
    // ========================================================================

    /// Add a boundary mark
    ///
    /// Rejects without mutation when a mark of that kind already exists
    /// (`DuplicateMark`) or when an end mark precedes any start mark
    /// (`MissingStart`).
    pub fn add_mark(
        &mut self,
        paragraph_id: &str,
        kind: MarkKind,
        page: u32,
        offset: f64,
    ) -> Result<Mark> {
        let existing = self.entries.get(paragraph_id);
        if existing.and_then(|e| e.mark(kind)).is_some() {
            return Err(MarkupError::DuplicateMark {
                paragraph_id: paragraph_id.to_string(),
                kind: kind.to_string(),
            });
        }
        if kind == MarkKind::End && existing.and_then(|e| e.start.as_ref()).is_none() {
            return Err(MarkupError::MissingStart(paragraph_id.to_string()));
        }

        let mark = Mark::new(kind, paragraph_id, page, offset);
        let entry = self.entries.entry(paragraph_id.to_string()).or_default();
        entry.set_mark(mark.clone());
        self.index.insert_mark(page, (paragraph_id.to_string(), kind));

        tracing::info!(paragraph_id, %kind, page, offset, "Added mark");
        self.reevaluate(paragraph_id);
        Ok(mark)
    }

    /// Move a mark to a new page/offset, re-mirroring the index
    ///
    /// Edge zones follow their bound mark (their placement is relative);
    /// pass-through page maps are clamped to the new span and removed when
    /// they empty. Returns `None` when the mark does not exist.
    pub fn move_mark(
        &mut self,
        paragraph_id: &str,
        kind: MarkKind,
        page: u32,
        offset: f64,
    ) -> Option<Mark> {
        let entries = &mut self.entries;
        let index = &mut self.index;

        let entry = entries.get_mut(paragraph_id)?;
        let old_page = {
            let mark = entry.mark_mut(kind)?;
            let old_page = mark.page;
            mark.page = page;
            mark.offset = offset;
            old_page
        };
        let key = (paragraph_id.to_string(), kind);
        index.remove_mark(old_page, &key);
        index.insert_mark(page, key);

        // Re-mirror this paragraph's zones against the updated span.
        if let Some((start_page, end_page)) = entry.span() {
            let mut dropped = Vec::new();
            for zone in entry.zones.iter_mut() {
                let zone_key = (paragraph_id.to_string(), zone.zone_id.clone());
                if let ZonePlacement::AutoPassthrough { pages_to_offset } = &mut zone.placement {
                    pages_to_offset.retain(|p, _| *p >= start_page && *p <= end_page);
                    index.remove_zone_everywhere(&zone_key);
                    if pages_to_offset.is_empty() {
                        dropped.push(zone.zone_id.clone());
                    } else {
                        for p in pages_to_offset.keys() {
                            index.insert_zone(*p, zone_key.clone());
                        }
                    }
                } else if matches!(zone.placement, ZonePlacement::AutoEdge { .. }) {
                    index.remove_zone_everywhere(&zone_key);
                    for p in zone.placement.pages(start_page, end_page) {
                        index.insert_zone(p, zone_key.clone());
                    }
                }
            }
            entry.zones.retain(|z| !dropped.contains(&z.zone_id));
        }

        let moved = entry.mark(kind).cloned();
        tracing::info!(paragraph_id, %kind, page, offset, "Moved mark");
        self.reevaluate(paragraph_id);
        moved
    }

    // ========================================================================
    // Zones
    // ========================================================================

    /// Add a zone; rejected with `IncompletePair` unless both marks exist
    ///
    /// A pass-through zone spans `[start.page, end.page]` with the offset
    /// carried from the start mark, so it reads at a consistent height on
    /// every spanned page.
    pub fn add_zone(&mut self, spec: ZoneSpec) -> Result<Zone> {
        let entry = self.entries.get(&spec.paragraph_id);
        let (start, end) = match entry.and_then(|e| e.start.as_ref().zip(e.end.as_ref())) {
            Some(pair) => pair,
            None => {
                return Err(MarkupError::IncompletePair {
                    paragraphs: vec![spec.paragraph_id.clone()],
                })
            }
        };
        let (start_page, end_page, start_offset) = (start.page, end.page, start.offset);

        let placement = match spec.request {
            ZoneRequest::Manual { page, offset } => ZonePlacement::Manual { page, offset },
            ZoneRequest::AutoEdge { edge, stack_index, offset } => {
                ZonePlacement::AutoEdge { edge, stack_index, offset }
            }
            ZoneRequest::Passthrough => {
                // A reversed pair yields no pages; refuse rather than keep a
                // zone that appears nowhere.
                if start_page > end_page {
                    return Err(MarkupError::IncompletePair {
                        paragraphs: vec![spec.paragraph_id.clone()],
                    });
                }
                ZonePlacement::AutoPassthrough {
                    pages_to_offset: (start_page..=end_page).map(|p| (p, start_offset)).collect(),
                }
            }
        };
        let zone_id = derive_zone_id(&spec.rubric, &placement, spec.is_auto);
        let zone = Zone {
            paragraph_id: spec.paragraph_id.clone(),
            zone_id: zone_id.clone(),
            rubric: spec.rubric,
            source_objects: spec.source_objects,
            placement,
            selected: false,
            is_auto: spec.is_auto,
        };

        let entry = self.entries.entry(spec.paragraph_id.clone()).or_default();
        let key = (spec.paragraph_id.clone(), zone_id.clone());

        // Re-placing an existing zone id overwrites the previous placement.
        if entry.zone(&zone_id).is_some() {
            tracing::debug!(paragraph_id = %spec.paragraph_id, %zone_id, "Replacing existing zone");
            entry.zones.retain(|z| z.zone_id != zone_id);
            self.index.remove_zone_everywhere(&key);
        }

        for page in zone.placement.pages(start_page, end_page) {
            self.index.insert_zone(page, key.clone());
        }
        entry.zones.push(zone.clone());

        tracing::info!(
            paragraph_id = %spec.paragraph_id,
            zone_id = %zone_id,
            rubric = %zone.rubric,
            is_auto = zone.is_auto,
            "Added zone"
        );
        self.reevaluate(&spec.paragraph_id);
        Ok(zone)
    }

    /// Apply a placement plan: record the required rubrics, then add every
    /// planned zone
    pub fn apply_plan(&mut self, plan: &PlacementPlan) -> Result<Vec<Zone>> {
        if let Some(entry) = self.entries.get_mut(&plan.paragraph_id) {
            entry.required_rubrics.extend(plan.required_rubrics.iter().cloned());
        }
        let mut placed = Vec::with_capacity(plan.specs.len());
        for spec in plan.specs.iter() {
            placed.push(self.add_zone(spec.clone())?);
        }
        Ok(placed)
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete the selected marks and zones
    ///
    /// Removing a boundary mark cascades: manual and edge zones of the
    /// paragraph go with it; a pass-through zone only loses the removed
    /// mark's page and survives while other pages remain, unless `forced`.
    /// A directly selected zone is removed with no cascade. Mark slots are
    /// left empty, not absent-paragraph.
    pub fn delete_marks(&mut self, selection: &[Selection], forced: bool) {
        let mut affected = BTreeSet::new();

        for item in selection {
            match item {
                Selection::Zone { paragraph_id, zone_id } => {
                    self.remove_zone(paragraph_id, zone_id);
                    affected.insert(paragraph_id.clone());
                }
                Selection::Mark { paragraph_id, kind } => {
                    let entries = &mut self.entries;
                    let index = &mut self.index;
                    let Some(entry) = entries.get_mut(paragraph_id) else {
                        continue;
                    };
                    let Some(mark) = entry.take_mark(*kind) else {
                        continue;
                    };
                    index.remove_mark(mark.page, &(paragraph_id.clone(), *kind));

                    let mut kept = Vec::new();
                    for mut zone in entry.zones.drain(..) {
                        let key = (paragraph_id.clone(), zone.zone_id.clone());
                        match &mut zone.placement {
                            ZonePlacement::AutoPassthrough { pages_to_offset } if !forced => {
                                pages_to_offset.remove(&mark.page);
                                index.remove_zone(mark.page, &key);
                                if pages_to_offset.is_empty() {
                                    index.remove_zone_everywhere(&key);
                                } else {
                                    kept.push(zone);
                                }
                            }
                            _ => {
                                // Manual and edge zones have no meaning
                                // without the boundary; forced removes all.
                                index.remove_zone_everywhere(&key);
                            }
                        }
                    }
                    entry.zones = kept;

                    tracing::info!(paragraph_id = %paragraph_id, kind = %kind, forced, "Deleted mark");
                    affected.insert(paragraph_id.clone());
                }
            }
        }

        for paragraph_id in affected {
            self.reevaluate(&paragraph_id);
        }
    }

    fn remove_zone(&mut self, paragraph_id: &str, zone_id: &str) {
        if let Some(entry) = self.entries.get_mut(paragraph_id) {
            let before = entry.zones.len();
            entry.zones.retain(|z| z.zone_id != zone_id);
            if entry.zones.len() != before {
                self.index
                    .remove_zone_everywhere(&(paragraph_id.to_string(), zone_id.to_string()));
                tracing::info!(paragraph_id, zone_id, "Deleted zone");
            }
        }
    }

    /// Clear every entry and the whole index; idempotent
    pub fn delete_all(&mut self) {
        self.entries.clear();
        self.index.clear();
        tracing::info!("Cleared registry");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// First candidate on `page` whose band contains `point`; when none
    /// contains it exactly, the nearest candidate within the proximity
    /// tolerance
    pub fn find_at_point(&self, point: Point, page: u32) -> Option<Selection> {
        let page_entry = self.index.page(page)?;

        for (paragraph_id, kind) in page_entry.marks.iter() {
            if let Some(mark) = self.resolve_mark(paragraph_id, *kind) {
                if mark.contains(point) {
                    return Some(Selection::Mark {
                        paragraph_id: paragraph_id.clone(),
                        kind: *kind,
                    });
                }
            }
        }
        for (paragraph_id, zone_id) in page_entry.zones.iter() {
            if let Some((zone, anchor)) = self.resolve_zone(paragraph_id, zone_id) {
                if let Some((top, bottom)) = zone.band_on(page, anchor) {
                    if point.y >= top && point.y < bottom {
                        return Some(Selection::Zone {
                            paragraph_id: paragraph_id.clone(),
                            zone_id: zone_id.clone(),
                        });
                    }
                }
            }
        }

        // Near misses, closest first.
        let mut best: Option<(f64, Selection)> = None;
        let mut consider = |distance: f64, candidate: Selection| {
            if distance <= PROXIMITY_TOLERANCE
                && best.as_ref().map(|(d, _)| distance < *d).unwrap_or(true)
            {
                best = Some((distance, candidate));
            }
        };
        for (paragraph_id, kind) in page_entry.marks.iter() {
            if let Some(mark) = self.resolve_mark(paragraph_id, *kind) {
                consider(
                    mark.distance_to(point),
                    Selection::Mark {
                        paragraph_id: paragraph_id.clone(),
                        kind: *kind,
                    },
                );
            }
        }
        for (paragraph_id, zone_id) in page_entry.zones.iter() {
            if let Some((zone, anchor)) = self.resolve_zone(paragraph_id, zone_id) {
                if let Some((top, bottom)) = zone.band_on(page, anchor) {
                    let distance = if point.y < top {
                        top - point.y
                    } else if point.y >= bottom {
                        point.y - bottom
                    } else {
                        0.0
                    };
                    consider(
                        distance,
                        Selection::Zone {
                            paragraph_id: paragraph_id.clone(),
                            zone_id: zone_id.clone(),
                        },
                    );
                }
            }
        }
        best.map(|(_, selection)| selection)
    }

    /// Whether `current_page` is a legal placement site for the paragraph
    ///
    /// Unrestricted mode always allows placement (boundary marks may land on
    /// any page). Restricted mode, used for zones, requires a complete pair
    /// and a page inside the paragraph's span.
    pub fn is_in_viewport(&self, paragraph_id: &str, current_page: u32, restricted: bool) -> bool {
        if !restricted {
            return true;
        }
        match self.entries.get(paragraph_id).and_then(|e| e.span()) {
            Some((start_page, end_page)) => {
                current_page >= start_page && current_page <= end_page
            }
            None => false,
        }
    }

    pub fn entry(&self, paragraph_id: &str) -> Option<&ParagraphEntry> {
        self.entries.get(paragraph_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &ParagraphEntry)> {
        self.entries.iter()
    }

    pub fn index(&self) -> &PageIndex {
        &self.index
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks visible on a page, resolved from the index
    pub fn marks_on(&self, page: u32) -> Vec<Mark> {
        self.index
            .marks_on(page)
            .iter()
            .filter_map(|(pid, kind)| self.resolve_mark(pid, *kind).cloned())
            .collect()
    }

    /// Zones visible on a page, resolved from the index
    pub fn zones_on(&self, page: u32) -> Vec<Zone> {
        self.index
            .zones_on(page)
            .iter()
            .filter_map(|(pid, zid)| self.resolve_zone(pid, zid).map(|(z, _)| z.clone()))
            .collect()
    }

    fn resolve_mark(&self, paragraph_id: &str, kind: MarkKind) -> Option<&Mark> {
        self.entries.get(paragraph_id)?.mark(kind)
    }

    fn resolve_zone(&self, paragraph_id: &str, zone_id: &str) -> Option<(&Zone, f64)> {
        let entry = self.entries.get(paragraph_id)?;
        let zone = entry.zone(zone_id)?;
        Some((zone, entry.anchor_offset(zone)))
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Reclassify the mutated paragraph and every paragraph whose span
    /// overlaps it; bracket status can change at a distance
    fn reevaluate(&mut self, paragraph_id: &str) {
        let mut affected: BTreeSet<String> = BTreeSet::new();
        affected.insert(paragraph_id.to_string());

        match self.entries.get(paragraph_id).and_then(|e| e.span()) {
            Some(span) => {
                for (pid, entry) in self.entries.iter() {
                    if let Some(other) = entry.span() {
                        if span.0 <= other.1 && other.0 <= span.1 {
                            affected.insert(pid.clone());
                        }
                    }
                }
            }
            None => {
                // A boundary went away; any paired paragraph may have gained
                // or lost a bracket conflict.
                for (pid, entry) in self.entries.iter() {
                    if entry.is_paired() {
                        affected.insert(pid.clone());
                    }
                }
            }
        }

        // One registry-wide bracket scan, shared by every reclassification.
        let violations = validate::bracket_violations(self);
        let updates: Vec<_> = affected
            .into_iter()
            .map(|pid| {
                let health = validate::classify_with(self, &pid, &violations);
                (pid, health)
            })
            .collect();
        for (pid, health) in updates {
            if let Some(entry) = self.entries.get_mut(&pid) {
                entry.health = health;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ParagraphHealth;

    fn paired_registry(paragraph_id: &str, start: (u32, f64), end: (u32, f64)) -> ParagraphRegistry {
        let mut registry = ParagraphRegistry::new();
        registry
            .add_mark(paragraph_id, MarkKind::Start, start.0, start.1)
            .unwrap();
        registry
            .add_mark(paragraph_id, MarkKind::End, end.0, end.1)
            .unwrap();
        registry
    }

    fn passthrough_spec(paragraph_id: &str, rubric: &str) -> ZoneSpec {
        ZoneSpec {
            paragraph_id: paragraph_id.to_string(),
            rubric: rubric.to_string(),
            source_objects: vec![],
            request: ZoneRequest::Passthrough,
            is_auto: true,
        }
    }

    #[test]
    fn test_duplicate_start_is_rejected_without_mutation() {
        let mut registry = ParagraphRegistry::new();
        registry.add_mark("p1", MarkKind::Start, 5, 10.0).unwrap();
        let err = registry.add_mark("p1", MarkKind::Start, 7, 20.0).unwrap_err();
        assert!(matches!(err, MarkupError::DuplicateMark { .. }));

        let mark = registry.entry("p1").unwrap().start.clone().unwrap();
        assert_eq!((mark.page, mark.offset), (5, 10.0));
        assert_eq!(registry.index().marks_on(5).len(), 1);
        assert!(registry.index().marks_on(7).is_empty());
    }

    #[test]
    fn test_end_before_start_does_not_touch_index() {
        let mut registry = ParagraphRegistry::new();
        let err = registry.add_mark("p1", MarkKind::End, 9, 50.0).unwrap_err();
        assert!(matches!(err, MarkupError::MissingStart(_)));
        assert!(registry.index().is_empty());
        assert!(registry.entry("p1").is_none());
    }

    #[test]
    fn test_zone_rejected_while_pair_incomplete() {
        let mut registry = ParagraphRegistry::new();
        registry.add_mark("p1", MarkKind::Start, 5, 10.0).unwrap();
        let err = registry.add_zone(passthrough_spec("p1", "dic")).unwrap_err();
        assert!(matches!(err, MarkupError::IncompletePair { .. }));
        assert!(registry.entry("p1").unwrap().zones.is_empty());
    }

    #[test]
    fn test_passthrough_rejected_for_reversed_pair() {
        let mut registry = paired_registry("p1", (10, 50.0), (5, 0.0));
        assert_eq!(registry.entry("p1").unwrap().health, ParagraphHealth::WrongOrder);

        let err = registry.add_zone(passthrough_spec("p1", "dic")).unwrap_err();
        assert!(matches!(err, MarkupError::IncompletePair { .. }));

        // No empty-paged zone may linger in the entry or the index.
        assert!(registry.entry("p1").unwrap().zones.is_empty());
        for page in 5..=10 {
            assert!(registry.index().zones_on(page).is_empty());
        }
    }

    #[test]
    fn test_passthrough_spans_whole_paragraph_with_carried_offset() {
        let mut registry = paired_registry("p1", (5, 10.0), (25, 190.0));
        let zone = registry.add_zone(passthrough_spec("p1", "dic")).unwrap();

        match &zone.placement {
            ZonePlacement::AutoPassthrough { pages_to_offset } => {
                assert_eq!(pages_to_offset.len(), 21);
                assert_eq!(pages_to_offset.get(&5), Some(&10.0));
                // Carried from page 5, not recomputed per page.
                assert_eq!(pages_to_offset.get(&25), Some(&10.0));
                // Typical geometry keeps it above the end mark on the last page.
                assert!(pages_to_offset[&25] < 190.0);
            }
            other => panic!("expected pass-through placement, got {:?}", other),
        }
        for page in 5..=25 {
            assert_eq!(registry.index().zones_on(page).len(), 1);
        }
        assert!(registry.index().zones_on(26).is_empty());
    }

    #[test]
    fn test_unforced_mark_delete_cascades_but_keeps_passthrough() {
        let mut registry = paired_registry("p1", (5, 10.0), (25, 190.0));
        registry.add_zone(passthrough_spec("p1", "dic")).unwrap();
        registry
            .add_zone(ZoneSpec {
                paragraph_id: "p1".into(),
                rubric: "exr".into(),
                source_objects: vec![],
                request: ZoneRequest::AutoEdge {
                    edge: ZoneEdge::StartEdge,
                    stack_index: 0,
                    offset: 0.0,
                },
                is_auto: true,
            })
            .unwrap();
        registry
            .add_zone(ZoneSpec {
                paragraph_id: "p1".into(),
                rubric: "note".into(),
                source_objects: vec![],
                request: ZoneRequest::Manual { page: 12, offset: 44.0 },
                is_auto: false,
            })
            .unwrap();

        registry.delete_marks(
            &[Selection::Mark { paragraph_id: "p1".into(), kind: MarkKind::Start }],
            false,
        );

        let entry = registry.entry("p1").unwrap();
        assert!(entry.start.is_none());
        assert!(entry.end.is_some());
        // Only the pass-through survives, minus the start page.
        assert_eq!(entry.zones.len(), 1);
        match &entry.zones[0].placement {
            ZonePlacement::AutoPassthrough { pages_to_offset } => {
                assert!(!pages_to_offset.contains_key(&5));
                assert!(pages_to_offset.contains_key(&25));
                assert_eq!(pages_to_offset.len(), 20);
            }
            other => panic!("expected pass-through placement, got {:?}", other),
        }
        assert!(registry.index().zones_on(5).is_empty());
        assert!(registry.index().zones_on(12).is_empty());
    }

    #[test]
    fn test_forced_mark_delete_removes_passthrough_too() {
        let mut registry = paired_registry("p1", (5, 10.0), (25, 190.0));
        registry.add_zone(passthrough_spec("p1", "dic")).unwrap();

        registry.delete_marks(
            &[Selection::Mark { paragraph_id: "p1".into(), kind: MarkKind::Start }],
            true,
        );

        let entry = registry.entry("p1").unwrap();
        assert!(entry.zones.is_empty());
        for page in 5..=25 {
            assert!(registry.index().zones_on(page).is_empty());
        }
    }

    #[test]
    fn test_directly_selected_zone_delete_has_no_cascade() {
        let mut registry = paired_registry("p1", (5, 10.0), (25, 190.0));
        registry.add_zone(passthrough_spec("p1", "dic")).unwrap();

        registry.delete_marks(
            &[Selection::Zone { paragraph_id: "p1".into(), zone_id: "dic".into() }],
            false,
        );

        let entry = registry.entry("p1").unwrap();
        assert!(entry.zones.is_empty());
        assert!(entry.is_paired());
        assert_eq!(registry.index().marks_on(5).len(), 1);
    }

    #[test]
    fn test_delete_all_is_idempotent() {
        let mut registry = paired_registry("p1", (5, 10.0), (25, 190.0));
        registry.add_zone(passthrough_spec("p1", "dic")).unwrap();

        registry.delete_all();
        assert!(registry.is_empty());
        assert!(registry.index().is_empty());

        registry.delete_all();
        assert!(registry.is_empty());
        assert!(registry.index().is_empty());
    }

    #[test]
    fn test_move_mark_clamps_passthrough_pages() {
        let mut registry = paired_registry("p1", (5, 10.0), (25, 190.0));
        registry.add_zone(passthrough_spec("p1", "dic")).unwrap();

        let moved = registry.move_mark("p1", MarkKind::End, 10, 150.0).unwrap();
        assert_eq!(moved.page, 10);

        let entry = registry.entry("p1").unwrap();
        match &entry.zones[0].placement {
            ZonePlacement::AutoPassthrough { pages_to_offset } => {
                assert_eq!(pages_to_offset.keys().copied().collect::<Vec<_>>(),
                           (5..=10).collect::<Vec<_>>());
            }
            other => panic!("expected pass-through placement, got {:?}", other),
        }
        assert!(registry.index().zones_on(11).is_empty());
        assert!(registry.index().marks_on(25).is_empty());
        assert_eq!(registry.index().marks_on(10).len(), 1);
    }

    #[test]
    fn test_viewport_restriction() {
        let mut registry = ParagraphRegistry::new();
        registry.add_mark("p1", MarkKind::Start, 5, 10.0).unwrap();

        // Unrestricted: boundary marks can go anywhere.
        assert!(registry.is_in_viewport("p1", 99, false));
        // Restricted: pair incomplete.
        assert!(!registry.is_in_viewport("p1", 5, true));

        registry.add_mark("p1", MarkKind::End, 25, 190.0).unwrap();
        assert!(registry.is_in_viewport("p1", 5, true));
        assert!(registry.is_in_viewport("p1", 25, true));
        assert!(!registry.is_in_viewport("p1", 26, true));
    }

    #[test]
    fn test_find_at_point_exact_then_nearest() {
        let mut registry = paired_registry("p1", (5, 100.0), (25, 190.0));

        // Inside the start mark's band.
        let hit = registry.find_at_point(Point::new(10.0, 105.0), 5);
        assert_eq!(
            hit,
            Some(Selection::Mark { paragraph_id: "p1".into(), kind: MarkKind::Start })
        );

        // Near miss within tolerance.
        let near = registry.find_at_point(Point::new(10.0, 95.0), 5);
        assert!(near.is_some());

        // Far away.
        assert!(registry.find_at_point(Point::new(10.0, 400.0), 5).is_none());
        // Wrong page entirely.
        assert!(registry.find_at_point(Point::new(10.0, 105.0), 6).is_none());
    }

    #[test]
    fn test_health_refreshes_after_mutations() {
        let mut registry = ParagraphRegistry::new();
        registry.add_mark("p1", MarkKind::Start, 5, 10.0).unwrap();
        assert_eq!(registry.entry("p1").unwrap().health, ParagraphHealth::Incomplete);

        registry.add_mark("p1", MarkKind::End, 25, 190.0).unwrap();
        assert_eq!(registry.entry("p1").unwrap().health, ParagraphHealth::Finished);

        registry.delete_marks(
            &[Selection::Mark { paragraph_id: "p1".into(), kind: MarkKind::End }],
            false,
        );
        assert_eq!(registry.entry("p1").unwrap().health, ParagraphHealth::Incomplete);
    }
}
