//! Automatic zone placement
//!
//! Computes where configured zones land relative to a paragraph's boundary
//! marks. Deterministic and side-effect free: the output is a plan of
//! [`ZoneSpec`]s consumed by `ParagraphRegistry::add_zone`, plus diagnostics
//! for rubrics the site configuration forgot to mention.

use std::collections::BTreeSet;

use crate::config::Config;
use crate::marks::{SourceObject, ZoneEdge};
use crate::registry::{ZoneRequest, ZoneSpec};

/// Input for one paragraph's placement pass
///
/// `objects` come from the course table of contents in reading order, each
/// tagged with its rubric.
#[derive(Debug, Clone, Copy)]
pub struct PlacementInput<'a> {
    pub paragraph_id: &'a str,
    pub start_page: u32,
    pub end_page: u32,
    pub objects: &'a [(String, SourceObject)],
}

/// A rubric present in the source but absent from the site configuration
///
/// Recoverable: the zone is placed anyway at the bottom of the start-edge
/// stack.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementDiagnostic {
    pub rubric: String,
    pub detail: String,
}

/// The result of a placement pass
#[derive(Debug, Clone)]
pub struct PlacementPlan {
    pub paragraph_id: String,
    pub specs: Vec<ZoneSpec>,
    /// Configured edge rubrics present in the source; a paragraph is not
    /// finished until each of these has a zone
    pub required_rubrics: BTreeSet<String>,
    pub diagnostics: Vec<PlacementDiagnostic>,
}

/// Plans automatically bound zones for completed mark pairs
pub struct AutoZonePlacer<'a> {
    config: &'a Config,
}

impl<'a> AutoZonePlacer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Compute the placement plan for one paragraph
    pub fn plan(&self, input: PlacementInput<'_>) -> PlacementPlan {
        // Partition objects by rubric, preserving first-appearance order.
        let mut rubric_order: Vec<String> = Vec::new();
        let mut groups: Vec<(String, Vec<SourceObject>)> = Vec::new();
        for (rubric, object) in input.objects.iter() {
            match groups.iter_mut().find(|(r, _)| r == rubric) {
                Some((_, objects)) => objects.push(object.clone()),
                None => {
                    rubric_order.push(rubric.clone());
                    groups.push((rubric.clone(), vec![object.clone()]));
                }
            }
        }
        let objects_of = |rubric: &str| -> Vec<SourceObject> {
            groups
                .iter()
                .find(|(r, _)| r == rubric)
                .map(|(_, objects)| objects.clone())
                .unwrap_or_default()
        };
        let mut specs = Vec::new();
        let mut placed: BTreeSet<String> = BTreeSet::new();

        // Pass-through rubrics span every page of the paragraph.
        let passthrough_present: Vec<String> = self
            .config
            .passthrough_rubrics
            .iter()
            .filter(|r| rubric_order.contains(*r))
            .cloned()
            .collect();
        for rubric in passthrough_present {
            specs.push(ZoneSpec {
                paragraph_id: input.paragraph_id.to_string(),
                rubric: rubric.clone(),
                source_objects: objects_of(&rubric),
                request: ZoneRequest::Passthrough,
                is_auto: true,
            });
            placed.insert(rubric);
        }

        // Start-edge stack grows downward from the start anchor; later
        // rubrics render further from the boundary.
        let start_present: Vec<String> = self
            .config
            .start_autozone_order
            .iter()
            .filter(|r| rubric_order.contains(*r) && !placed.contains(*r))
            .cloned()
            .collect();
        for (stack_index, rubric) in start_present.iter().enumerate() {
            specs.push(ZoneSpec {
                paragraph_id: input.paragraph_id.to_string(),
                rubric: rubric.clone(),
                source_objects: objects_of(rubric),
                request: ZoneRequest::AutoEdge {
                    edge: ZoneEdge::StartEdge,
                    stack_index,
                    offset: stack_index as f64 * self.config.unit_height(rubric),
                },
                is_auto: true,
            });
            placed.insert(rubric.clone());
        }

        // End-edge stack grows upward: the first-listed rubric sits farthest
        // from the end boundary, the last-listed closest to it.
        let end_present: Vec<String> = self
            .config
            .end_autozone_order
            .iter()
            .filter(|r| rubric_order.contains(*r) && !placed.contains(*r))
            .cloned()
            .collect();
        let end_count = end_present.len();
        for (stack_index, rubric) in end_present.iter().enumerate() {
            let mult = (end_count - stack_index) as f64;
            specs.push(ZoneSpec {
                paragraph_id: input.paragraph_id.to_string(),
                rubric: rubric.clone(),
                source_objects: objects_of(rubric),
                request: ZoneRequest::AutoEdge {
                    edge: ZoneEdge::EndEdge,
                    stack_index,
                    offset: -mult * self.config.unit_height(rubric),
                },
                is_auto: true,
            });
            placed.insert(rubric.clone());
        }

        // Rubrics the configuration does not know are still placed, at the
        // bottom of the start-edge stack, and reported.
        let mut diagnostics = Vec::new();
        let mut fallback_index = start_present.len();
        for rubric in rubric_order.iter().filter(|r| !placed.contains(*r)) {
            tracing::warn!(
                paragraph_id = input.paragraph_id,
                rubric = %rubric,
                "Rubric missing from site configuration; placing at start edge"
            );
            diagnostics.push(PlacementDiagnostic {
                rubric: rubric.clone(),
                detail: "rubric not listed in site configuration".to_string(),
            });
            specs.push(ZoneSpec {
                paragraph_id: input.paragraph_id.to_string(),
                rubric: rubric.clone(),
                source_objects: objects_of(rubric),
                request: ZoneRequest::AutoEdge {
                    edge: ZoneEdge::StartEdge,
                    stack_index: fallback_index,
                    offset: fallback_index as f64 * self.config.unit_height(rubric),
                },
                is_auto: true,
            });
            fallback_index += 1;
        }

        let required_rubrics = rubric_order
            .iter()
            .filter(|r| {
                self.config.start_autozone_order.contains(*r)
                    || self.config.end_autozone_order.contains(*r)
            })
            .cloned()
            .collect();

        PlacementPlan {
            paragraph_id: input.paragraph_id.to_string(),
            specs,
            required_rubrics,
            diagnostics,
        }
    }
}
