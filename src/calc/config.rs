use std::path::Path;

use crate::foundation::error::{PixelflowError, PixelflowResult};

/// Tuning knobs of the calculation engine.
///
/// Every heuristic that decides how work is split is a default here rather than a fixed
/// rule: `None` means "derive from the worker count".
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Worker threads; `None` uses one per core.
    pub threads: Option<usize>,
    /// Slices per picture; `None` uses `1 + workers / pictures`.
    pub slices_per_picture: Option<usize>,
    /// Progress reports per slice; `None` uses `max(2, 50 / workers)`.
    pub progress_steps: Option<usize>,
    pub preview_scale: f64,
    /// Previews smaller than this on either side are skipped.
    pub preview_min_size: usize,
    /// Count preview pixels toward run progress.
    pub track_preview_progress: bool,
    /// Upper bound on freshly allocated picture and preview bytes per run.
    pub memory_budget_bytes: Option<u64>,
    /// Compiled templates kept by the default compiler; 0 disables the cache.
    pub compile_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: None,
            slices_per_picture: None,
            progress_steps: None,
            preview_scale: 0.1,
            preview_min_size: 8,
            track_preview_progress: false,
            memory_budget_bytes: None,
            compile_cache_capacity: crate::compile::DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> PixelflowResult<Self> {
        let cfg: EngineConfig = serde_json::from_str(s)
            .map_err(|e| PixelflowError::config(format!("invalid engine config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> PixelflowResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            PixelflowError::config(format!("read engine config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> PixelflowResult<()> {
        if self.threads == Some(0) {
            return Err(PixelflowError::config("'threads' must be >= 1 when set"));
        }
        if self.slices_per_picture == Some(0) {
            return Err(PixelflowError::config("'slices_per_picture' must be >= 1 when set"));
        }
        let scale = self.preview_scale;
        if !(scale.is_finite() && scale > 0.0 && scale <= 1.0) {
            return Err(PixelflowError::config("'preview_scale' must be in (0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/calc/config.rs"]
mod tests;
