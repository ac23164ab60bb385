//! Settings of a distance field run.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::distance_field::Normalization;
use crate::error::PipelineError;


/// Configuration of the mask threshold, output normalization and chunking.
///
/// Every field falls back to its default when missing from a serialized config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Pixels with a luminance below this value are inside the shape.
    /// Must be within `0.0..=1.0`.
    pub threshold: f32,

    /// How many pixel units of distance span the whole output range.
    /// Must be finite and positive.
    pub spread: f32,

    /// Whether output values are clamped to `0.0..=1.0` before encoding.
    /// When disabled, the byte conversion saturates them instead.
    pub clamp: bool,

    /// How many rows a single tick processes in the per-pixel phases.
    /// `None` processes a whole phase per tick.
    pub chunk_rows: Option<NonZeroU32>,
}

impl GeneratorConfig {
    pub const DEFAULT_THRESHOLD: f32 = 0.5;
    pub const DEFAULT_SPREAD: f32 = 128.0;

    /// Check the value ranges of all fields.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "threshold must be within 0..=1, got {}", self.threshold
            )));
        }

        if !self.spread.is_finite() || self.spread <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "spread must be finite and positive, got {}", self.spread
            )));
        }

        Ok(())
    }

    /// Parse a JSON config. Missing fields use their defaults.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|error| PipelineError::InvalidConfig(error.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn normalization(&self) -> Normalization {
        Normalization { spread: self.spread, clamp: self.clamp }
    }

    /// The number of rows one tick may process.
    pub fn rows_per_tick(&self) -> u32 {
        self.chunk_rows.map_or(u32::MAX, NonZeroU32::get)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            spread: Self::DEFAULT_SPREAD,
            clamp: true,
            chunk_rows: None,
        }
    }
}
