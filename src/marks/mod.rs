//! Mark and zone domain types
//!
//! Pure domain data: boundary marks, classified zones and their placement
//! variants. Rendering is a collaborator concern and never lives on these
//! types.

mod types;

pub use types::{
    derive_zone_id, Mark, MarkKind, Point, SourceObject, Zone, ZoneEdge, ZonePlacement,
    MARK_BAND_HEIGHT, PROXIMITY_TOLERANCE, ZONE_BAND_HEIGHT,
};
