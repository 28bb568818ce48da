//! Configuration schema types for `islice.toml`
//!
//! Defines the sheets to slice, where icons go, and the validation rules
//! applied before anything is cropped.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::crop::DEFAULT_INSET_PERCENT;
use crate::grid::{GridDescriptor, GridError};

/// Output section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory icons are written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir() }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Default settings applied to every sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Inset removed from every cell edge, percent of the cell dimension
    #[serde(default = "default_inset")]
    pub inset_percent: u32,
    /// Worker threads for independent sheets (0 = available parallelism)
    #[serde(default)]
    pub jobs: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { inset_percent: default_inset(), jobs: 0 }
    }
}

fn default_inset() -> u32 {
    DEFAULT_INSET_PERCENT
}

/// Quality check settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Run the size check after slicing
    #[serde(default = "default_true")]
    pub check: bool,
    /// Fail the run on insufficient icons or missing sources
    #[serde(default)]
    pub strict: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self { check: true, strict: false }
    }
}

fn default_true() -> bool {
    true
}

/// One composite image and its name grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Sheet label; defaults to the source file stem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Path of the composite image
    pub source: PathBuf,
    /// Per-sheet inset (overrides defaults)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inset_percent: Option<u32>,
    /// Icon names, one inner array per row
    pub grid: Vec<Vec<String>>,
}

impl SheetConfig {
    /// Label used in progress output and errors.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.source.display().to_string()),
        }
    }

    /// Validate and build the grid descriptor.
    pub fn grid_descriptor(&self) -> Result<GridDescriptor, GridError> {
        GridDescriptor::new(self.grid.clone())
    }

    /// Source path resolved against `root` when relative.
    pub fn resolved_source(&self, root: &Path) -> PathBuf {
        if self.source.is_absolute() {
            self.source.clone()
        } else {
            root.join(&self.source)
        }
    }
}

/// Complete `islice.toml`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SliceConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub sheets: Vec<SheetConfig>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "sheets[1].grid")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "islice.toml: '{}' {}", self.field, self.message)
    }
}

impl SliceConfig {
    /// Validate the configuration and return every problem found
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: String| {
            errors.push(ConfigValidationError { field, message });
        };

        if self.sheets.is_empty() {
            push("sheets".to_string(), "must contain at least one sheet".to_string());
        }

        if self.defaults.inset_percent > 100 {
            push("defaults.inset_percent".to_string(), "must be between 0 and 100".to_string());
        }

        let mut sheet_names: HashMap<String, usize> = HashMap::new();
        let mut icon_owner: HashMap<String, usize> = HashMap::new();

        for (i, sheet) in self.sheets.iter().enumerate() {
            if sheet.source.as_os_str().is_empty() {
                push(format!("sheets[{}].source", i), "must be a non-empty path".to_string());
            }

            if let Some(inset) = sheet.inset_percent {
                if inset > 100 {
                    push(
                        format!("sheets[{}].inset_percent", i),
                        "must be between 0 and 100".to_string(),
                    );
                }
            }

            let label = sheet.display_name();
            if let Some(first) = sheet_names.insert(label.clone(), i) {
                push(
                    format!("sheets[{}].name", i),
                    format!("'{}' is already used by sheets[{}]", label, first),
                );
            }

            match sheet.grid_descriptor() {
                Ok(grid) => {
                    for name in grid.names() {
                        match icon_owner.get(name) {
                            Some(&owner) => push(
                                format!("sheets[{}].grid", i),
                                format!(
                                    "icon '{}' is also produced by sheets[{}] and would overwrite it",
                                    name, owner
                                ),
                            ),
                            None => {
                                icon_owner.insert(name.to_string(), i);
                            }
                        }
                    }
                }
                Err(e) => push(format!("sheets[{}].grid", i), e.to_string()),
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Inset for a sheet (sheet-specific or default)
    pub fn effective_inset(&self, sheet: &SheetConfig) -> u32 {
        sheet.inset_percent.unwrap_or(self.defaults.inset_percent)
    }
}
