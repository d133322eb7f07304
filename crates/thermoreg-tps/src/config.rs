use std::path::Path;

use serde::{Deserialize, Serialize};
use thermoreg_imgproc::parallel::ExecutionStrategy;

use crate::error::TpsError;

/// Configuration of a [`crate::TpsWarper`].
///
/// Missing fields fall back to their defaults when deserialized.
///
/// # Example
///
/// ```
/// use thermoreg_tps::WarpConfig;
///
/// let config = WarpConfig::from_json_str(r#"{ "strategy": "Serial" }"#).unwrap();
/// assert_eq!(config.residual_tolerance, 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Relative residual above which a fit is reported as ill-conditioned.
    pub residual_tolerance: f64,
    /// Singular values below `cutoff * sigma_max` are dropped by the SVD solver.
    pub singular_value_cutoff: f64,
    /// How output rows are scheduled during evaluation.
    pub strategy: ExecutionStrategy,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            residual_tolerance: 1e-6,
            singular_value_cutoff: 1e-12,
            strategy: ExecutionStrategy::default(),
        }
    }
}

impl WarpConfig {
    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, TpsError> {
        let config: WarpConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TpsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::InvalidConfig`] for a negative or non-finite
    /// tolerance, a cutoff outside `[0, 1)` or a zero-sized execution strategy.
    pub fn validate(&self) -> Result<(), TpsError> {
        if !self.residual_tolerance.is_finite() || self.residual_tolerance < 0.0 {
            return Err(TpsError::InvalidConfig(format!(
                "residual_tolerance must be finite and >= 0, got {}",
                self.residual_tolerance
            )));
        }

        if !(0.0..1.0).contains(&self.singular_value_cutoff) {
            return Err(TpsError::InvalidConfig(format!(
                "singular_value_cutoff must be in [0, 1), got {}",
                self.singular_value_cutoff
            )));
        }

        match self.strategy {
            ExecutionStrategy::RowChunks(0) | ExecutionStrategy::Fixed(0) => Err(
                TpsError::InvalidConfig(format!("{:?} must be > 0", self.strategy)),
            ),
            _ => Ok(()),
        }
    }
}
