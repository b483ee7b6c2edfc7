use crate::constants::{
    DEFAULT_CACHED_FAST_THRESHOLD, DEFAULT_CACHED_STANDARD_THRESHOLD, DEFAULT_FAST_PATH_GRADING,
    DEFAULT_STANDARD_PATH_GRADING,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// When false every request takes the full path.
    pub enabled: bool,
    /// Cache-hit similarity for [`ExecutionPath::CachedFast`](super::ExecutionPath::CachedFast).
    pub cached_fast_threshold: f32,
    pub cached_standard_threshold: f32,
    /// Grading score (0-10) for skipping the verifier on simple queries.
    pub fast_path_grading: f32,
    pub standard_path_grading: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cached_fast_threshold: DEFAULT_CACHED_FAST_THRESHOLD,
            cached_standard_threshold: DEFAULT_CACHED_STANDARD_THRESHOLD,
            fast_path_grading: DEFAULT_FAST_PATH_GRADING,
            standard_path_grading: DEFAULT_STANDARD_PATH_GRADING,
        }
    }
}

impl RouterConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("cached_fast_threshold", self.cached_fast_threshold),
            ("cached_standard_threshold", self.cached_standard_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        if self.cached_standard_threshold > self.cached_fast_threshold {
            return Err(format!(
                "cached_standard_threshold ({}) must not exceed cached_fast_threshold ({})",
                self.cached_standard_threshold, self.cached_fast_threshold
            ));
        }
        if !self.fast_path_grading.is_finite() || !self.standard_path_grading.is_finite() {
            return Err("grading thresholds must be finite".to_string());
        }
        if self.standard_path_grading > self.fast_path_grading {
            return Err(format!(
                "standard_path_grading ({}) must not exceed fast_path_grading ({})",
                self.standard_path_grading, self.fast_path_grading
            ));
        }
        Ok(())
    }
}
