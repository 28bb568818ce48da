//! Slice context containing configuration and paths for a run.

use crate::config::{SheetConfig, SliceConfig};
use std::path::{Path, PathBuf};

/// Slice context containing configuration and paths for a run.
///
/// Relative paths in the configuration (sources and the output directory)
/// resolve against `project_root`, the directory holding `islice.toml`.
#[derive(Debug, Clone)]
pub struct SliceContext {
    /// The loaded configuration
    config: SliceConfig,
    /// Project root directory (where islice.toml is located)
    project_root: PathBuf,
}

impl SliceContext {
    /// Create a new slice context.
    pub fn new(config: SliceConfig, project_root: PathBuf) -> Self {
        Self { config, project_root }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.output.dir)
    }

    /// Get a sheet's source image path.
    pub fn source_path(&self, sheet: &SheetConfig) -> PathBuf {
        sheet.resolved_source(&self.project_root)
    }

    /// Whether strict mode is enabled.
    pub fn is_strict(&self) -> bool {
        self.config.quality.strict
    }

    /// Number of worker threads to use for sheets.
    pub fn jobs(&self) -> usize {
        match self.config.defaults.jobs {
            0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
