//! Mark and zone types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Vertical extent of a boundary mark's hit band, in page units
pub const MARK_BAND_HEIGHT: f64 = 14.0;

/// Vertical extent of a zone's hit band, in page units
pub const ZONE_BAND_HEIGHT: f64 = 18.0;

/// Tolerance for near-miss hit testing, in page units
pub const PROXIMITY_TOLERANCE: f64 = 12.0;

// ============================================================================
// Geometry
// ============================================================================

/// A point in page coordinates (origin top-left, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Marks
// ============================================================================

/// Which paragraph boundary a mark delimits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Start,
    End,
}

impl std::fmt::Display for MarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkKind::Start => write!(f, "start"),
            MarkKind::End => write!(f, "end"),
        }
    }
}

/// A single paragraph boundary marker
///
/// Identity is `(kind, paragraph_id)` and never changes once created;
/// `page` and `offset` mutate on move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub kind: MarkKind,
    pub paragraph_id: String,
    /// 1-based page number
    pub page: u32,
    /// Vertical offset on the page, in page units
    pub offset: f64,
    #[serde(default)]
    pub selected: bool,
}

impl Mark {
    pub fn new(kind: MarkKind, paragraph_id: &str, page: u32, offset: f64) -> Self {
        Self {
            kind,
            paragraph_id: paragraph_id.to_string(),
            page,
            offset,
            selected: false,
        }
    }

    /// Vertical hit band `[top, bottom)` of this mark on its page
    pub fn band(&self) -> (f64, f64) {
        (self.offset, self.offset + MARK_BAND_HEIGHT)
    }

    /// Whether `point` falls inside the mark's band
    pub fn contains(&self, point: Point) -> bool {
        let (top, bottom) = self.band();
        point.y >= top && point.y < bottom
    }

    /// Vertical distance from `point` to the mark's band (0 when inside)
    pub fn distance_to(&self, point: Point) -> f64 {
        let (top, bottom) = self.band();
        if point.y < top {
            top - point.y
        } else if point.y >= bottom {
            point.y - bottom
        } else {
            0.0
        }
    }
}

// ============================================================================
// Zones
// ============================================================================

/// Which paragraph edge an auto zone binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoneEdge {
    StartEdge,
    EndEdge,
}

/// How a zone is bound to pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ZonePlacement {
    /// Explicitly placed by the operator on one page
    Manual { page: u32, offset: f64 },
    /// Bound to the paragraph's start or end page
    ///
    /// `offset` is relative to the bound mark's offset, so the zone follows
    /// the mark when it moves.
    AutoEdge {
        edge: ZoneEdge,
        stack_index: usize,
        offset: f64,
    },
    /// Bound to every page the paragraph spans; offsets are absolute and
    /// carried from the start mark
    AutoPassthrough {
        pages_to_offset: BTreeMap<u32, f64>,
    },
}

impl ZonePlacement {
    /// Pages this placement occupies, given the paragraph's boundary pages
    pub fn pages(&self, start_page: u32, end_page: u32) -> Vec<u32> {
        match self {
            ZonePlacement::Manual { page, .. } => vec![*page],
            ZonePlacement::AutoEdge { edge, .. } => match edge {
                ZoneEdge::StartEdge => vec![start_page],
                ZoneEdge::EndEdge => vec![end_page],
            },
            ZonePlacement::AutoPassthrough { pages_to_offset } => {
                pages_to_offset.keys().copied().collect()
            }
        }
    }

    /// Absolute vertical offset on `page`, given the bound mark's offset
    pub fn offset_on(&self, page: u32, anchor_offset: f64) -> Option<f64> {
        match self {
            ZonePlacement::Manual { page: p, offset } => (*p == page).then_some(*offset),
            ZonePlacement::AutoEdge { offset, .. } => Some(anchor_offset + offset),
            ZonePlacement::AutoPassthrough { pages_to_offset } => {
                pages_to_offset.get(&page).copied()
            }
        }
    }
}

/// An object from the course table of contents that a zone covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceObject {
    pub object_id: String,
    pub block_id: String,
}

/// A classified annotation bound to one or more pages of a paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub paragraph_id: String,
    /// Identity within the paragraph, derived from the rubric
    pub zone_id: String,
    pub rubric: String,
    pub source_objects: Vec<SourceObject>,
    pub placement: ZonePlacement,
    #[serde(default)]
    pub selected: bool,
    pub is_auto: bool,
}

impl Zone {
    /// Vertical hit band of this zone on `page`, if it occupies that page
    pub fn band_on(&self, page: u32, anchor_offset: f64) -> Option<(f64, f64)> {
        self.placement
            .offset_on(page, anchor_offset)
            .map(|top| (top, top + ZONE_BAND_HEIGHT))
    }
}

/// Derive a zone's identity from its rubric and placement
///
/// Auto zones use the rubric itself; an operator may type several manual
/// zones of one rubric into a paragraph, so those get a position suffix.
pub fn derive_zone_id(rubric: &str, placement: &ZonePlacement, is_auto: bool) -> String {
    if is_auto {
        return rubric.to_string();
    }
    match placement {
        ZonePlacement::Manual { page, offset } => {
            format!("{}-p{}-{}", rubric, page, *offset as i64)
        }
        _ => rubric.to_string(),
    }
}
