//! Per-paragraph markup state

use std::collections::BTreeSet;

use crate::marks::{Mark, MarkKind, Zone};
use crate::validate::ParagraphHealth;

/// Everything the registry owns for one paragraph identity
///
/// A paragraph may exist with zero, one or two marks; zones are admitted
/// only once both marks are present.
#[derive(Debug, Clone, Default)]
pub struct ParagraphEntry {
    pub start: Option<Mark>,
    pub end: Option<Mark>,
    /// Zones in placement order
    pub zones: Vec<Zone>,
    /// Rubrics the site configuration expects this paragraph to carry,
    /// recorded when a placement plan is applied
    pub required_rubrics: BTreeSet<String>,
    /// Cached health classification, refreshed after every mutation
    pub health: ParagraphHealth,
}

impl ParagraphEntry {
    pub fn mark(&self, kind: MarkKind) -> Option<&Mark> {
        match kind {
            MarkKind::Start => self.start.as_ref(),
            MarkKind::End => self.end.as_ref(),
        }
    }

    pub fn mark_mut(&mut self, kind: MarkKind) -> Option<&mut Mark> {
        match kind {
            MarkKind::Start => self.start.as_mut(),
            MarkKind::End => self.end.as_mut(),
        }
    }

    pub fn take_mark(&mut self, kind: MarkKind) -> Option<Mark> {
        match kind {
            MarkKind::Start => self.start.take(),
            MarkKind::End => self.end.take(),
        }
    }

    pub fn set_mark(&mut self, mark: Mark) {
        match mark.kind {
            MarkKind::Start => self.start = Some(mark),
            MarkKind::End => self.end = Some(mark),
        }
    }

    /// Both boundary marks are present
    pub fn is_paired(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Whether the entry holds any marks or zones at all
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.zones.is_empty()
    }

    /// The paragraph's page span, when both marks exist
    pub fn span(&self) -> Option<(u32, u32)> {
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => Some((s.page, e.page)),
            _ => None,
        }
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.zone_id == zone_id)
    }

    /// Offset of the mark a zone placement resolves against
    ///
    /// Edge zones anchor to their bound mark; everything else anchors to the
    /// start mark (pass-through offsets are absolute anyway).
    pub fn anchor_offset(&self, zone: &Zone) -> f64 {
        use crate::marks::{ZoneEdge, ZonePlacement};
        match &zone.placement {
            ZonePlacement::AutoEdge { edge: ZoneEdge::EndEdge, .. } => {
                self.end.as_ref().map(|m| m.offset).unwrap_or(0.0)
            }
            _ => self.start.as_ref().map(|m| m.offset).unwrap_or(0.0),
        }
    }
}
