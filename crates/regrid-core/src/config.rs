//! Configuration for the regridding engine.

use serde::{Deserialize, Serialize};

/// Process-wide tunables for a regrid call.
///
/// Worker count, the vertical-recompute threshold, and the radius-squared
/// clamp used by Nearest/Weighted all vary by deployment and don't belong
/// hardcoded into the regrid loop itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegridConfig {
    /// Number of worker threads for the rayon thread pool driving
    /// point/cell parallel loops. `None` uses rayon's default (available
    /// parallelism).
    pub workers: Option<usize>,

    /// Surface-elevation delta (meters) above which the per-point vertical
    /// edge cache is recomputed. Default 40.0.
    pub vertical_recompute_threshold_m: f64,

    /// Minimum squared-radius used to clamp Nearest/Weighted's ranking
    /// metric, avoiding division by zero on exact cell-center hits.
    /// Default 1e-10.
    pub radius_sq_tolerance: f64,
}

impl Default for RegridConfig {
    fn default() -> Self {
        Self {
            workers: None,
            vertical_recompute_threshold_m: 40.0,
            radius_sq_tolerance: 1e-10,
        }
    }
}

impl RegridConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REGRID_WORKERS") {
            if let Ok(workers) = val.parse() {
                config.workers = Some(workers);
            }
        }

        if let Ok(val) = std::env::var("REGRID_VERTICAL_RECOMPUTE_THRESHOLD_M") {
            if let Ok(threshold) = val.parse() {
                config.vertical_recompute_threshold_m = threshold;
            }
        }

        if let Ok(val) = std::env::var("REGRID_RADIUS_SQ_TOLERANCE") {
            if let Ok(tolerance) = val.parse() {
                config.radius_sq_tolerance = tolerance;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if matches!(self.workers, Some(0)) {
            return Err("workers must be > 0 when set".to_string());
        }
        if !self.vertical_recompute_threshold_m.is_finite()
            || self.vertical_recompute_threshold_m < 0.0
        {
            return Err("vertical_recompute_threshold_m must be finite and >= 0".to_string());
        }
        if !self.radius_sq_tolerance.is_finite() || self.radius_sq_tolerance <= 0.0 {
            return Err("radius_sq_tolerance must be finite and > 0".to_string());
        }
        Ok(())
    }

    /// Build (or reuse the global) rayon thread pool for this configuration.
    pub fn build_thread_pool(
        &self,
    ) -> std::result::Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.workers {
            builder = builder.num_threads(workers);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RegridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vertical_recompute_threshold_m, 40.0);
        assert_eq!(config.radius_sq_tolerance, 1e-10);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = RegridConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config = RegridConfig::default();
        config.vertical_recompute_threshold_m = -1.0;
        assert!(config.validate().is_err());

        config = RegridConfig::default();
        config.radius_sq_tolerance = 0.0;
        assert!(config.validate().is_err());
    }
}
