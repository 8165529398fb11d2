//! Markup validation and paragraph health
//!
//! Pure, read-only checks over a [`ParagraphRegistry`]. Ordering and bracket
//! problems are classifications queried by the caller, never raised by the
//! operation that introduced them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::marks::Mark;
use crate::registry::ParagraphRegistry;

/// Markup health of one paragraph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParagraphHealth {
    /// No marks exist
    #[default]
    NotStarted,
    /// Exactly one boundary mark exists, or required zones are still missing
    Incomplete,
    /// Both marks exist but the end precedes (or coincides with) the start
    WrongOrder,
    /// The paragraph is implicated in an illegal overlap
    BracketsError,
    /// Paired, ordered, conflict-free, all required zones placed
    Finished,
}

/// An illegal overlap: `inner` opens inside `outer`'s span but closes
/// outside it
#[derive(Debug, Clone, PartialEq)]
pub struct BracketViolation {
    pub outer: String,
    pub inner: String,
    /// The mark that escapes the enclosing span
    pub conflicting: Mark,
}

/// Document position of a mark, ordered by page then offset
fn position(mark: &Mark) -> (u32, f64) {
    (mark.page, mark.offset)
}

fn position_lt(a: (u32, f64), b: (u32, f64)) -> bool {
    a.0 < b.0 || (a.0 == b.0 && a.1 < b.1)
}

/// True iff the end mark lies strictly after the start mark
pub fn verify_start_end(start: &Mark, end: &Mark) -> bool {
    position_lt(position(start), position(end))
}

/// True iff every paragraph with at least one mark has both
///
/// Paragraphs with zero marks do not count against this check.
pub fn verify_mark_pairs(registry: &ParagraphRegistry) -> bool {
    registry.entries().all(|(_, entry)| {
        let marks = entry.start.is_some() as u8 + entry.end.is_some() as u8;
        marks != 1
    })
}

/// All bracket violations, in registry order
///
/// For each paragraph P with a valid ordered pair and every other paired
/// paragraph Q: Q violates P when Q's start lies strictly inside P's span
/// while Q's end lies outside it.
pub fn bracket_violations(registry: &ParagraphRegistry) -> Vec<BracketViolation> {
    let mut violations = Vec::new();

    for (outer_id, outer) in registry.entries() {
        let (Some(outer_start), Some(outer_end)) = (&outer.start, &outer.end) else {
            continue;
        };
        if !verify_start_end(outer_start, outer_end) {
            continue;
        }
        let range = (position(outer_start), position(outer_end));

        for (inner_id, inner) in registry.entries() {
            if inner_id == outer_id {
                continue;
            }
            let (Some(inner_start), Some(inner_end)) = (&inner.start, &inner.end) else {
                continue;
            };
            let start_pos = position(inner_start);
            let end_pos = position(inner_end);

            let opens_inside = position_lt(range.0, start_pos) && position_lt(start_pos, range.1);
            let closes_outside = position_lt(end_pos, range.0) || position_lt(range.1, end_pos);
            if opens_inside && closes_outside {
                violations.push(BracketViolation {
                    outer: outer_id.clone(),
                    inner: inner_id.clone(),
                    conflicting: inner_end.clone(),
                });
            }
        }
    }
    violations
}

/// First offending mark, or `None` when the registry nests cleanly
pub fn bracket_conflict(registry: &ParagraphRegistry) -> Option<Mark> {
    bracket_violations(registry).into_iter().next().map(|v| v.conflicting)
}

/// Classify the markup health of one paragraph
pub fn classify(registry: &ParagraphRegistry, paragraph_id: &str) -> ParagraphHealth {
    classify_with(registry, paragraph_id, &bracket_violations(registry))
}

/// Classify against a precomputed violation list
///
/// Lets a caller reclassifying many paragraphs after one mutation compute
/// the registry-wide bracket scan once and reuse it.
pub fn classify_with(
    registry: &ParagraphRegistry,
    paragraph_id: &str,
    violations: &[BracketViolation],
) -> ParagraphHealth {
    let Some(entry) = registry.entry(paragraph_id) else {
        return ParagraphHealth::NotStarted;
    };
    let (start, end) = match (&entry.start, &entry.end) {
        (None, None) => return ParagraphHealth::NotStarted,
        (Some(_), None) | (None, Some(_)) => return ParagraphHealth::Incomplete,
        (Some(start), Some(end)) => (start, end),
    };
    if !verify_start_end(start, end) {
        return ParagraphHealth::WrongOrder;
    }
    let implicated = violations
        .iter()
        .any(|v| v.outer == paragraph_id || v.inner == paragraph_id);
    if implicated {
        return ParagraphHealth::BracketsError;
    }

    let placed: BTreeSet<&str> = entry.zones.iter().map(|z| z.rubric.as_str()).collect();
    let all_required_placed = entry
        .required_rubrics
        .iter()
        .all(|rubric| placed.contains(rubric.as_str()));
    if all_required_placed {
        ParagraphHealth::Finished
    } else {
        ParagraphHealth::Incomplete
    }
}
