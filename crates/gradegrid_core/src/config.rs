//! Engine and logging configuration.
//!
//! # Responsibility
//! - Describe the per-deployment score scale and comment limits.
//! - Describe the rolling-file logging setup.
//! - Parse both from JSON documents and validate them.
//!
//! # Invariants
//! - One score scale per deployment; presets cover the two observed scales.
//! - A validated config always yields a valid `ScoreScale`.

use crate::model::scale::{ScaleError, ScoreScale};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_COMMENT_MAX_CHARS: usize = 500;
const DEFAULT_MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_LOG_FILES: usize = 5;

/// Invalid configuration document or value.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Scale(ScaleError),
    ZeroCommentLimit,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Scale(err) => write!(f, "invalid score scale: {err}"),
            Self::ZeroCommentLimit => write!(f, "comment_max_chars must be greater than zero"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Scale(err) => Some(err),
            Self::ZeroCommentLimit => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<ScaleError> for ConfigError {
    fn from(value: ScaleError) -> Self {
        Self::Scale(value)
    }
}

/// Score scale selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleConfig {
    /// `[1, 10]`.
    TenPoint,
    /// `[0, 100]`.
    Percent,
    Custom {
        min: f64,
        max: f64,
        #[serde(default)]
        integer_only: bool,
    },
}

impl ScaleConfig {
    pub fn to_scale(self) -> ScoreScale {
        match self {
            Self::TenPoint => ScoreScale::ten_point(),
            Self::Percent => ScoreScale::percent(),
            Self::Custom {
                min,
                max,
                integer_only,
            } => ScoreScale {
                min,
                max,
                integer_only,
            },
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self::TenPoint
    }
}

/// Grade engine settings for one deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scale: ScaleConfig,
    /// Comments longer than this are truncated on edit.
    #[serde(default = "default_comment_max_chars")]
    pub comment_max_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scale: ScaleConfig::default(),
            comment_max_chars: DEFAULT_COMMENT_MAX_CHARS,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scale.to_scale().validate()?;
        if self.comment_max_chars == 0 {
            return Err(ConfigError::ZeroCommentLimit);
        }
        Ok(())
    }

    pub fn score_scale(&self) -> ScoreScale {
        self.scale.to_scale()
    }
}

fn default_comment_max_chars() -> usize {
    DEFAULT_COMMENT_MAX_CHARS
}

/// Rolling file logger settings consumed by `init_logging`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for log files.
    pub log_dir: String,
    #[serde(default = "default_max_log_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl LoggingConfig {
    /// Config with default rotation limits.
    pub fn new(level: impl Into<String>, log_dir: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            log_dir: log_dir.into(),
            max_file_bytes: DEFAULT_MAX_LOG_FILE_BYTES,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

fn default_max_log_file_bytes() -> u64 {
    DEFAULT_MAX_LOG_FILE_BYTES
}

fn default_max_log_files() -> usize {
    DEFAULT_MAX_LOG_FILES
}
