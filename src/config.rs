//! Site configuration for automatic zone placement
//!
//! The configuration is collaborator-provided and read-only: the engine never
//! mutates it. Missing required keys are fatal at startup, before any
//! registry operation is possible.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MarkupError, Result};

/// Default rendered height of a stacked auto zone, in page units
pub const DEFAULT_UNIT_HEIGHT: f64 = 20.0;

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Rubrics stacked below the paragraph's start boundary, in stacking order
    pub start_autozone_order: Vec<String>,
    /// Rubrics stacked above the paragraph's end boundary, in stacking order
    pub end_autozone_order: Vec<String>,
    /// Rubrics placed on every page the paragraph spans
    pub passthrough_rubrics: BTreeSet<String>,
    /// Per-rubric zone heights; rubrics not listed fall back to the default
    #[serde(default)]
    pub unit_heights: BTreeMap<String, f64>,
    /// Horizontal margin reserved for mark handles, in page units
    #[serde(default)]
    pub margin: f64,
    /// First annotatable page (front matter is skipped before it)
    #[serde(default = "default_first_page")]
    pub first_page: u32,
}

fn default_first_page() -> u32 {
    1
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MarkupError::Config(format!("cannot read config file: {}", e)))?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| MarkupError::Config(format!("invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the environment
    ///
    /// Rubric lists are comma-separated, e.g. `PAGEMARK_START_ZONES=dic,exr`.
    pub fn from_env() -> Result<Self> {
        let config = Config {
            start_autozone_order: split_list(&env_required("PAGEMARK_START_ZONES")?),
            end_autozone_order: split_list(&env_required("PAGEMARK_END_ZONES")?),
            passthrough_rubrics: split_list(&env::var("PAGEMARK_PASSTHROUGH_ZONES").unwrap_or_default())
                .into_iter()
                .collect(),
            unit_heights: BTreeMap::new(),
            margin: env::var("PAGEMARK_MARGIN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0),
            first_page: env::var("PAGEMARK_FIRST_PAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency; fatal before any registry operation
    pub fn validate(&self) -> Result<()> {
        if self.first_page == 0 {
            return Err(MarkupError::Config("firstPage must be 1-based".into()));
        }
        for rubric in self.start_autozone_order.iter() {
            if self.end_autozone_order.contains(rubric) {
                return Err(MarkupError::Config(format!(
                    "rubric {} is bound to both edges",
                    rubric
                )));
            }
        }
        for (rubric, height) in self.unit_heights.iter() {
            if *height <= 0.0 {
                return Err(MarkupError::Config(format!(
                    "unit height for rubric {} must be positive",
                    rubric
                )));
            }
        }
        Ok(())
    }

    /// Rendered height of one stacked zone of the given rubric
    pub fn unit_height(&self, rubric: &str) -> f64 {
        self.unit_heights
            .get(rubric)
            .copied()
            .unwrap_or(DEFAULT_UNIT_HEIGHT)
    }
}

fn env_required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| MarkupError::Config(format!("missing required key {}", key)))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
