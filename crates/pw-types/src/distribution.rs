use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Bounded continuous uniform distribution `[low, high]`.
///
/// Every tunable parameter in an invocation shares one of these; bounds are
/// validated at construction and never silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatDistribution {
    pub low: f64,
    pub high: f64,
}

impl FloatDistribution {
    pub fn new(low: f64, high: f64) -> Result<Self, ConfigError> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(ConfigError::InvalidBounds {
                lower: low,
                upper: high,
            });
        }
        Ok(Self { low, high })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}
