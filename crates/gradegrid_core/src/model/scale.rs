//! Score scale: closed interval, input normalization and severity bands.
//!
//! # Responsibility
//! - Normalize raw score input into an optional clamped score.
//! - Classify scores into display bands relative to the interval width.
//!
//! # Invariants
//! - `min < max` and both bounds are finite (enforced by `validate`).
//! - Out-of-range numbers are clamped, never rejected.
//! - Non-numeric input normalizes to `None` (no entry), never to zero.
//! - Rounding only happens on `integer_only` scales.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static DECIMAL_INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:[.,]\d*)?|[.,]\d+)$").expect("valid decimal input regex")
});

const EXCELLENT_FROM: f64 = 0.9;
const GOOD_FROM: f64 = 0.5;
const FAIR_FROM: f64 = 0.2;

/// Display severity of a score, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    /// Top 10% of the interval width.
    Excellent,
    /// Next 40%.
    Good,
    /// Next 30%.
    Fair,
    /// Bottom 20%.
    Poor,
}

impl SeverityBand {
    /// Stable style key for presentation layers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl Display for SeverityBand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid scale definition.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleError {
    NonFiniteBound,
    EmptyInterval { min: f64, max: f64 },
    FractionalBound { min: f64, max: f64 },
}

impl Display for ScaleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteBound => write!(f, "score bounds must be finite"),
            Self::EmptyInterval { min, max } => {
                write!(f, "score interval [{min}, {max}] must satisfy min < max")
            }
            Self::FractionalBound { min, max } => write!(
                f,
                "integer-only score interval [{min}, {max}] must have whole-number bounds"
            ),
        }
    }
}

impl Error for ScaleError {}

/// Closed score interval used by one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
    /// When set, normalized scores are rounded to the nearest whole number.
    #[serde(default)]
    pub integer_only: bool,
}

impl ScoreScale {
    /// `[1, 10]` scale used by the commented grade matrix.
    pub fn ten_point() -> Self {
        Self {
            min: 1.0,
            max: 10.0,
            integer_only: false,
        }
    }

    /// `[0, 100]` percentage scale.
    pub fn percent() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            integer_only: false,
        }
    }

    /// Validates interval invariants.
    pub fn validate(&self) -> Result<(), ScaleError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ScaleError::NonFiniteBound);
        }
        if self.min >= self.max {
            return Err(ScaleError::EmptyInterval {
                min: self.min,
                max: self.max,
            });
        }
        if self.integer_only && (self.min.fract() != 0.0 || self.max.fract() != 0.0) {
            return Err(ScaleError::FractionalBound {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Clamps a number into the interval, rounding on integer-only scales.
    pub fn clamp(&self, value: f64) -> f64 {
        let clamped = value.max(self.min).min(self.max);
        if self.integer_only {
            clamped.round()
        } else {
            clamped
        }
    }

    /// Parses raw cell input into a clamped score.
    ///
    /// Accepts an optional sign and `.` or `,` as decimal separator. Anything
    /// else (blank, words, exponents, `NaN`) yields `None`.
    pub fn normalize_input(&self, raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if !DECIMAL_INPUT_RE.is_match(trimmed) {
            return None;
        }
        let value = trimmed.replace(',', ".").parse::<f64>().ok()?;
        if value.is_nan() {
            return None;
        }
        Some(self.clamp(value))
    }

    /// Classifies a score by its position within the interval.
    pub fn band(&self, score: f64) -> SeverityBand {
        let position = ((score - self.min) / self.width()).clamp(0.0, 1.0);
        if position >= EXCELLENT_FROM {
            SeverityBand::Excellent
        } else if position >= GOOD_FROM {
            SeverityBand::Good
        } else if position >= FAIR_FROM {
            SeverityBand::Fair
        } else {
            SeverityBand::Poor
        }
    }
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self::ten_point()
    }
}
