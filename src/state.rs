//! Shared session state
//!
//! The registry and its page index are one shared mutable resource. The
//! engine itself is single-threaded and synchronous, but callers with an
//! event loop on another thread go through this wrapper, which holds a
//! single lock across each paired registry+index mutation so the index
//! never drifts under concurrent callers.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::marks::{Mark, MarkKind, Point, SourceObject, Zone};
use crate::placement::{AutoZonePlacer, PlacementDiagnostic, PlacementInput, PlacementPlan};
use crate::registry::{ParagraphRegistry, Selection, ZoneSpec};
use crate::validate::ParagraphHealth;

/// A markup session: read-only site configuration plus the locked registry
#[derive(Clone)]
pub struct MarkupSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: Config,
    registry: Mutex<ParagraphRegistry>,
}

impl MarkupSession {
    /// Create a session; the configuration must already be validated
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                registry: Mutex::new(ParagraphRegistry::new()),
            }),
        })
    }

    /// Create a session over an imported registry
    pub fn with_imported(config: Config, registry: ParagraphRegistry) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                registry: Mutex::new(registry),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn add_mark(&self, paragraph_id: &str, kind: MarkKind, page: u32, offset: f64) -> Result<Mark> {
        self.inner.registry.lock().add_mark(paragraph_id, kind, page, offset)
    }

    pub fn move_mark(&self, paragraph_id: &str, kind: MarkKind, page: u32, offset: f64) -> Option<Mark> {
        self.inner.registry.lock().move_mark(paragraph_id, kind, page, offset)
    }

    pub fn add_zone(&self, spec: ZoneSpec) -> Result<Zone> {
        self.inner.registry.lock().add_zone(spec)
    }

    /// Plan and place every automatic zone for a paragraph in one locked
    /// region, so the plan is computed against the same span it is applied to
    pub fn place_auto_zones(
        &self,
        paragraph_id: &str,
        objects: &[(String, SourceObject)],
    ) -> Result<(Vec<Zone>, Vec<PlacementDiagnostic>)> {
        let mut registry = self.inner.registry.lock();
        let (start_page, end_page) = registry
            .entry(paragraph_id)
            .and_then(|e| e.span())
            .ok_or_else(|| crate::error::MarkupError::IncompletePair {
                paragraphs: vec![paragraph_id.to_string()],
            })?;

        let plan: PlacementPlan = AutoZonePlacer::new(&self.inner.config).plan(PlacementInput {
            paragraph_id,
            start_page,
            end_page,
            objects,
        });
        let placed = registry.apply_plan(&plan)?;
        Ok((placed, plan.diagnostics))
    }

    pub fn delete(&self, selection: &[Selection], forced: bool) {
        self.inner.registry.lock().delete_marks(selection, forced);
    }

    pub fn delete_all(&self) {
        self.inner.registry.lock().delete_all();
    }

    pub fn find_at_point(&self, point: Point, page: u32) -> Option<Selection> {
        self.inner.registry.lock().find_at_point(point, page)
    }

    pub fn is_in_viewport(&self, paragraph_id: &str, current_page: u32, restricted: bool) -> bool {
        self.inner.registry.lock().is_in_viewport(paragraph_id, current_page, restricted)
    }

    pub fn health(&self, paragraph_id: &str) -> ParagraphHealth {
        self.inner
            .registry
            .lock()
            .entry(paragraph_id)
            .map(|e| e.health)
            .unwrap_or_default()
    }

    /// Serialize the current markup, refusing on half-marked paragraphs
    pub fn export(&self) -> Result<String> {
        let registry = self.inner.registry.lock();
        crate::export::export_markup(&registry)
    }

    /// Run a closure against the locked registry
    pub fn with_registry<T>(&self, f: impl FnOnce(&ParagraphRegistry) -> T) -> T {
        f(&self.inner.registry.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config() -> Config {
        Config {
            start_autozone_order: vec!["exr".into()],
            end_autozone_order: vec!["con".into()],
            passthrough_rubrics: ["dic".to_string()].into_iter().collect(),
            unit_heights: BTreeMap::new(),
            margin: 0.0,
            first_page: 1,
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_at_session_start() {
        let mut bad = config();
        bad.first_page = 0;
        assert!(MarkupSession::new(bad).is_err());
    }

    #[test]
    fn test_place_auto_zones_end_to_end() {
        let session = MarkupSession::new(config()).unwrap();
        session.add_mark("p1", MarkKind::Start, 5, 10.0).unwrap();
        session.add_mark("p1", MarkKind::End, 25, 190.0).unwrap();

        let objects = vec![
            ("dic".to_string(), SourceObject { object_id: "o1".into(), block_id: "b1".into() }),
            ("exr".to_string(), SourceObject { object_id: "o2".into(), block_id: "b2".into() }),
            ("con".to_string(), SourceObject { object_id: "o3".into(), block_id: "b3".into() }),
        ];
        let (placed, diagnostics) = session.place_auto_zones("p1", &objects).unwrap();

        assert_eq!(placed.len(), 3);
        assert!(diagnostics.is_empty());
        assert_eq!(session.health("p1"), ParagraphHealth::Finished);
        // Page 5 shows the pass-through and the start-edge zone.
        assert_eq!(session.with_registry(|r| r.zones_on(5).len()), 2);
    }

    #[test]
    fn test_place_auto_zones_requires_pair() {
        let session = MarkupSession::new(config()).unwrap();
        session.add_mark("p1", MarkKind::Start, 5, 10.0).unwrap();
        let err = session.place_auto_zones("p1", &[]).unwrap_err();
        assert!(matches!(err, crate::error::MarkupError::IncompletePair { .. }));
    }
}
