use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::distribution::FloatDistribution;
use crate::errors::{ConfigError, PwResult};

/// Per-invocation run configuration.
///
/// Carries the values collected by the external configuration surface; this
/// crate only consumes them. Defaults mirror the configuration surface's
/// defaults: two trials per iteration, suggestion bounds `[0.5, 2.0]`, a
/// local `./artifact` directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Source prompt with emphasis markup (prompt-weight variant) or the
    /// plain prompt rendered unchanged (conditioning-scale variant).
    pub prompt: String,

    /// Number of candidates to produce this invocation, including the
    /// baseline when the study is fresh.
    pub n_trials_per_iter: u32,

    /// Lower bound of suggested weights.
    pub lower: f64,

    /// Upper bound of suggested weights.
    pub upper: f64,

    /// Study storage URL. Empty means the default local file-backed store.
    pub storage_url: String,

    /// Study name. Empty means a generated default name.
    pub study_name: String,

    /// Directory the feedback surface stores artifacts under; created if
    /// absent.
    pub artifact_dir: PathBuf,

    /// Comma-separated keywords excluded from weight optimization.
    pub excluded_keywords: String,

    /// Base seed shared by every candidate in the batch.
    pub base_seed: u64,
}

impl RunConfig {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            n_trials_per_iter: 2,
            lower: 0.5,
            upper: 2.0,
            storage_url: String::new(),
            study_name: String::new(),
            artifact_dir: PathBuf::from("./artifact"),
            excluded_keywords: String::new(),
            base_seed: 0,
        }
    }

    pub fn with_batch_size(mut self, n: u32) -> Self {
        self.n_trials_per_iter = n;
        self
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = url.into();
        self
    }

    pub fn with_study_name(mut self, name: impl Into<String>) -> Self {
        self.study_name = name.into();
        self
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    pub fn with_excluded_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.excluded_keywords = keywords.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    /// Validate the configuration before any trial is asked.
    pub fn validate(&self) -> PwResult<()> {
        if self.n_trials_per_iter < 1 {
            return Err(ConfigError::ZeroBatchSize.into());
        }
        // Also rejects inverted or non-finite bounds.
        self.distribution()?;
        Ok(())
    }

    /// The shared suggestion distribution for every tunable parameter.
    pub fn distribution(&self) -> Result<FloatDistribution, ConfigError> {
        FloatDistribution::new(self.lower, self.upper)
    }

    /// Exclusion keywords, split on commas with empty entries stripped.
    /// Matching is exact and case-sensitive.
    pub fn excluded_set(&self) -> HashSet<String> {
        self.excluded_keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}
