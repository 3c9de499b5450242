//! YAML configuration for the pipeline and the batch orchestrator.
//!
//! One file carries every stage's settings. Missing sections and missing
//! fields take their defaults, so an empty file (apart from `version`) is a
//! valid configuration.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "nightly"
//!
//! ingest:
//!   version: 1
//!   strip_control_chars: true
//!   require_title: false
//!   max_markup_bytes: 33554432
//!
//! normalize:
//!   version: 1
//!   min_retained_ratio: 0.2
//!   min_measured_chars: 100
//!
//! parse:
//!   version: 1
//!   max_depth: 16
//!
//! render:
//!   version: 1
//!   preserve_line_breaks: false
//!   include_anchors: false
//!   max_heading_level: 6
//!
//! batch:
//!   workers: 4
//!   chunk_size: 50
//!   checkpoint_dir: ".checkpoints"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use canonical::ParseConfig;
use ingest::IngestConfig;
use normalize::NormalizeConfig;
use render::RenderConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Settings for every pipeline stage plus the batch orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Configuration format version
    pub version: String,

    pub name: Option<String>,

    pub ingest: IngestConfig,
    pub normalize: NormalizeConfig,
    pub parse: ParseConfig,
    pub render: RenderConfig,
    pub batch: BatchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            ingest: IngestConfig::default(),
            normalize: NormalizeConfig::default(),
            parse: ParseConfig::default(),
            render: RenderConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.ingest.validate().map_err(stage_error("ingest"))?;
        self.normalize.validate().map_err(stage_error("normalize"))?;
        self.parse.validate().map_err(stage_error("parse"))?;
        self.render.validate().map_err(stage_error("render"))?;
        self.batch.validate()?;
        Ok(())
    }
}

fn stage_error<E: std::fmt::Display>(stage: &'static str) -> impl Fn(E) -> ConfigLoadError {
    move |err| ConfigLoadError::Validation(format!("{stage}: {err}"))
}

/// Orchestrator defaults; CLI flags override them per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Size of the rayon pool.
    pub workers: usize,

    /// Documents per chunk. The checkpoint is written after each chunk.
    pub chunk_size: usize,

    /// Where per-phase checkpoint files live. Defaults to `.checkpoints`
    /// inside the store directory.
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            chunk_size: 50,
            checkpoint_dir: None,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.workers == 0 {
            return Err(ConfigLoadError::Validation(
                "batch.workers must be >= 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ConfigLoadError::Validation(
                "batch.chunk_size must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
