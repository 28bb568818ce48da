//! PNG output for named icons and rescanning of persisted icons

use glob::glob;
use image::RgbaImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::grid::is_file_stem;

/// Extension of every persisted icon.
pub const ICON_EXTENSION: &str = "png";

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Image encoding or decoding error
    #[error("Image error at {}: {source}", path.display())]
    Image { path: PathBuf, source: image::ImageError },
    /// Icon name would leave the sink's directory
    #[error("Invalid icon name '{0}'")]
    InvalidName(String),
    /// Invalid glob pattern built from the directory path
    #[error("Invalid icon directory {}: {source}", path.display())]
    Pattern { path: PathBuf, source: glob::PatternError },
}

/// Destination for named icons.
///
/// Sinks take `&self` so that independent sheets can write concurrently.
/// A sink does no deduplication: writing the same name twice replaces the
/// earlier icon.
pub trait IconSink: Sync {
    /// Persist `image` under `name` and return where it went.
    fn write_icon(&self, name: &str, image: &RgbaImage) -> Result<PathBuf, OutputError>;
}

/// Writes each icon as `<dir>/<name>.png`.
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    /// Use an existing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create `dir` (and parents) if needed, then use it.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, OutputError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an icon named `name` is written to.
    pub fn icon_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, ICON_EXTENSION))
    }
}

impl IconSink for DirSink {
    fn write_icon(&self, name: &str, image: &RgbaImage) -> Result<PathBuf, OutputError> {
        if name.is_empty() || !is_file_stem(name) {
            return Err(OutputError::InvalidName(name.to_string()));
        }
        let path = self.icon_path(name);
        save_png(image, &path)?;
        Ok(path)
    }
}

/// Keeps icons in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemorySink {
    icons: Mutex<BTreeMap<String, RgbaImage>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything written so far.
    pub fn into_icons(self) -> BTreeMap<String, RgbaImage> {
        self.icons.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.icons.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IconSink for MemorySink {
    fn write_icon(&self, name: &str, image: &RgbaImage) -> Result<PathBuf, OutputError> {
        self.icons
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), image.clone());
        Ok(PathBuf::from(format!("{}.{}", name, ICON_EXTENSION)))
    }
}

/// Save an RGBA image as PNG.
///
/// The format is always PNG regardless of the extension of `path`.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| OutputError::Image { path: path.to_path_buf(), source })
}

/// A persisted icon found by [`scan_icons`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedIcon {
    /// File stem, i.e. the icon name
    pub name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Find every `*.png` directly inside `dir` and read its dimensions.
///
/// Only image headers are decoded. Results are sorted by file name. A
/// missing directory yields an IO error.
pub fn scan_icons(dir: &Path) -> Result<Vec<PersistedIcon>, OutputError> {
    // Surface "not found" as an IO error instead of an empty glob
    std::fs::read_dir(dir)?;

    let escaped = glob::Pattern::escape(&dir.display().to_string());
    let pattern = format!("{}/*.{}", escaped, ICON_EXTENSION);
    let paths = glob(&pattern)
        .map_err(|source| OutputError::Pattern { path: dir.to_path_buf(), source })?;

    read_icons(paths)
}

/// Read dimensions for every globbed path. An unreadable entry is an error.
fn read_icons<I, E>(paths: I) -> Result<Vec<PersistedIcon>, OutputError>
where
    I: IntoIterator<Item = Result<PathBuf, E>>,
    E: Into<std::io::Error>,
{
    let mut icons = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| OutputError::Io(e.into()))?;
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let (width, height) = image::image_dimensions(&path)
            .map_err(|source| OutputError::Image { path: path.clone(), source })?;
        icons.push(PersistedIcon { name, path, width, height });
    }

    icons.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(icons)
}
