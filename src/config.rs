//! # Engine Configuration
//!
//! Constants that used to be re-declared at every call site (confidence
//! thresholds, the stage list, the seed verb set, chart colours) live in one
//! [`EngineConfig`] that is handed to the aggregators.
//!
//! - Loads from TOML.
//! - Lookup order: `$ENGINE_CONFIG_PATH` → `config/engine.toml` → built-in defaults.
//! - Missing or invalid files fall back to defaults with a warning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::taxonomy::{normalize_stage_name, ActionVerb, ConfidenceBucket};

pub const DEFAULT_ENGINE_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_ENGINE_CONFIG_PATH: &str = "ENGINE_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub confidence: ConfidenceThresholds,
    #[serde(default)]
    pub stages: StageConfig,
    #[serde(default)]
    pub verbs: VerbConfig,
    /// Bucket name → chart colour.
    #[serde(default = "default_palette")]
    pub palette: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    #[serde(default = "default_high_min")]
    pub high_min: f64,
    #[serde(default = "default_medium_min")]
    pub medium_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default = "default_stage_names")]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbConfig {
    #[serde(default = "default_known_verbs")]
    pub known: Vec<String>,
}

fn default_high_min() -> f64 {
    70.0
}
fn default_medium_min() -> f64 {
    40.0
}
fn default_stage_names() -> Vec<String> {
    ["Discovery", "Qualification", "Implementation"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_known_verbs() -> Vec<String> {
    ActionVerb::SEED.iter().map(|s| s.to_string()).collect()
}
fn default_palette() -> BTreeMap<String, String> {
    [
        ("High", "#16a34a"),
        ("Medium", "#f59e0b"),
        ("Low", "#dc2626"),
        ("Resolved", "#16a34a"),
        ("Partially Resolved", "#84cc16"),
        ("In Progress", "#f59e0b"),
        ("Not Resolved", "#dc2626"),
        ("Discovery", "#3b82f6"),
        ("Qualification", "#8b5cf6"),
        ("Implementation", "#14b8a6"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high_min: default_high_min(),
            medium_min: default_medium_min(),
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            names: default_stage_names(),
        }
    }
}

impl Default for VerbConfig {
    fn default() -> Self {
        Self {
            known: default_known_verbs(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence: ConfidenceThresholds::default(),
            stages: StageConfig::default(),
            verbs: VerbConfig::default(),
            palette: default_palette(),
        }
    }
}

impl ConfidenceThresholds {
    /// ≥ high_min → High, ≥ medium_min → Medium, else Low.
    pub fn bucket(&self, confidence: f64) -> ConfidenceBucket {
        if confidence >= self.high_min {
            ConfidenceBucket::High
        } else if confidence >= self.medium_min {
            ConfidenceBucket::Medium
        } else {
            ConfidenceBucket::Low
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string and sanitize.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(s).context("parsing engine config TOML")?;
        Ok(cfg.sanitized())
    }

    /// Parse from an explicit file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Resolve the configured path (env var first, then the default location).
    pub fn config_path() -> PathBuf {
        std::env::var(ENV_ENGINE_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENGINE_CONFIG_PATH))
    }

    /// Load from `$ENGINE_CONFIG_PATH` or `config/engine.toml`.
    /// Falls back to defaults when the file is missing or invalid.
    pub fn load_default() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            info!(target: "config", path = %path.display(), "no engine config file, using defaults");
            return Self::default();
        }
        match Self::from_path(&path) {
            Ok(cfg) => {
                info!(target: "config", path = %path.display(), "engine config loaded");
                cfg
            }
            Err(e) => {
                warn!(target: "config", error = ?e, "engine config invalid, using defaults");
                Self::default()
            }
        }
    }

    /// Canonical configured stage for a free-text stage label, if any.
    pub fn match_stage(&self, raw: &str) -> Option<&str> {
        let normalized = normalize_stage_name(raw);
        self.stages
            .names
            .iter()
            .find(|s| **s == normalized)
            .map(String::as_str)
    }

    pub fn color_for(&self, bucket: &str) -> Option<&str> {
        self.palette.get(bucket).map(String::as_str)
    }

    fn sanitized(mut self) -> Self {
        let t = &mut self.confidence;
        if !t.high_min.is_finite() {
            t.high_min = default_high_min();
        }
        if !t.medium_min.is_finite() {
            t.medium_min = default_medium_min();
        }
        if t.medium_min > t.high_min {
            // swap to keep a valid interval
            std::mem::swap(&mut t.medium_min, &mut t.high_min);
        }

        // Stage names are compared after case normalization; store them that way.
        self.stages.names = self
            .stages
            .names
            .iter()
            .map(|s| normalize_stage_name(s))
            .filter(|s| !s.is_empty())
            .collect();
        if self.stages.names.is_empty() {
            self.stages.names = default_stage_names();
        }

        // Seed matching is case-insensitive, so keep the first spelling only.
        let mut seen = std::collections::HashSet::new();
        self.verbs
            .known
            .retain(|v| !v.trim().is_empty() && seen.insert(v.trim().to_lowercase()));
        if self.verbs.known.is_empty() {
            self.verbs.known = default_known_verbs();
        }
        self
    }
}
