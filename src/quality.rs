//! Size-based quality tiers for extracted icons
//!
//! Classification looks only at pixel dimensions, so it can run over fresh
//! in-memory icons or over icons re-read from disk.

use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

use crate::crop::NamedIcon;

/// Below this on either axis an icon is insufficient.
pub const MIN_ACCEPTABLE: u32 = 200;
/// At or above this on both axes an icon is good.
pub const MIN_GOOD: u32 = 300;

/// Quality tier, ordered from least to most acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Width or height below 200
    Insufficient,
    /// Width or height below 300
    Moderate,
    /// Both sides at least 300
    Good,
}

impl QualityTier {
    /// Classify an icon of `width` × `height` pixels.
    pub fn classify(width: u32, height: u32) -> Self {
        if width < MIN_ACCEPTABLE || height < MIN_ACCEPTABLE {
            QualityTier::Insufficient
        } else if width < MIN_GOOD || height < MIN_GOOD {
            QualityTier::Moderate
        } else {
            QualityTier::Good
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTier::Insufficient => write!(f, "insufficient"),
            QualityTier::Moderate => write!(f, "moderate"),
            QualityTier::Good => write!(f, "good"),
        }
    }
}

/// Anything whose pixel dimensions can be inspected.
pub trait Dimensions {
    fn dimensions(&self) -> (u32, u32);
}

impl Dimensions for (u32, u32) {
    fn dimensions(&self) -> (u32, u32) {
        *self
    }
}

impl Dimensions for NamedIcon {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl Dimensions for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }
}

impl<P, C> Dimensions for ImageBuffer<P, C>
where
    P: Pixel,
    C: Deref<Target = [P::Subpixel]>,
{
    fn dimensions(&self) -> (u32, u32) {
        ImageBuffer::dimensions(self)
    }
}

impl<T: Dimensions + ?Sized> Dimensions for &T {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }
}

/// Error raised by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualityError {
    /// Nothing to validate
    #[error("No icons to validate")]
    NoIcons,
}

/// Tier and size of one icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityEntry {
    pub width: u32,
    pub height: u32,
    pub tier: QualityTier,
}

/// Result of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    /// Entries keyed by icon name, sorted by name
    pub entries: BTreeMap<String, QualityEntry>,
    /// True iff no entry is insufficient
    pub all_good: bool,
}

impl QualityReport {
    pub fn tier(&self, name: &str) -> Option<QualityTier> {
        self.entries.get(name).map(|e| e.tier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries in `tier`.
    pub fn count(&self, tier: QualityTier) -> usize {
        self.entries.values().filter(|e| e.tier == tier).count()
    }

    /// Names of entries below `tier`, sorted.
    pub fn below(&self, tier: QualityTier) -> Vec<&str> {
        self.entries.iter().filter(|(_, e)| e.tier < tier).map(|(n, _)| n.as_str()).collect()
    }
}

/// Classify every icon and aggregate the result.
///
/// An input where every icon is insufficient is a valid report with
/// `all_good == false`; only an empty input is an error. If a name occurs
/// more than once the last occurrence wins.
///
/// # Examples
///
/// ```
/// use iconslice::quality::{validate, QualityTier};
///
/// let icons: [(&str, (u32, u32)); 2] = [("big", (300, 300)), ("small", (199, 500))];
/// let report = validate(icons).unwrap();
/// assert_eq!(report.tier("big"), Some(QualityTier::Good));
/// assert_eq!(report.tier("small"), Some(QualityTier::Insufficient));
/// assert!(!report.all_good);
/// ```
pub fn validate<K, D, I>(icons: I) -> Result<QualityReport, QualityError>
where
    I: IntoIterator<Item = (K, D)>,
    K: Into<String>,
    D: Dimensions,
{
    let entries: BTreeMap<String, QualityEntry> = icons
        .into_iter()
        .map(|(name, icon)| {
            let (width, height) = icon.dimensions();
            (name.into(), QualityEntry { width, height, tier: QualityTier::classify(width, height) })
        })
        .collect();

    if entries.is_empty() {
        return Err(QualityError::NoIcons);
    }

    let all_good = entries.values().all(|e| e.tier != QualityTier::Insufficient);
    Ok(QualityReport { entries, all_good })
}

/// Validate a cropped icon set (or any collection of named icons).
pub fn validate_icons<'a, I>(icons: I) -> Result<QualityReport, QualityError>
where
    I: IntoIterator<Item = &'a NamedIcon>,
{
    validate(icons.into_iter().map(|icon| (icon.name.as_str(), icon)))
}
