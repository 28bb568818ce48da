//! Cropping engine - cuts one composite image into named icons along a grid
//!
//! Geometry is integer-only:
//! - cell size is `floor(image_dim / grid_dim)` per axis; the trailing
//!   remainder is never redistributed
//! - the inset is `floor(cell_dim * inset_percent / 100)` per axis, removed
//!   from both sides of every cell
//!
//! Cropping is all-or-nothing: either every cell yields an icon or the call
//! fails and no icon is returned.

use image::{GenericImageView, Rgba, RgbaImage};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::grid::GridDescriptor;

/// Reference inset used when a sheet does not specify one.
pub const DEFAULT_INSET_PERCENT: u32 = 5;

/// A crop rectangle in source-image pixels, `right`/`bottom` exclusive.
///
/// Coordinates are signed so that a rectangle collapsed by an oversized
/// inset can still be reported exactly as computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct CellRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl CellRect {
    /// Horizontal extent (may be zero or negative for degenerate rects).
    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    /// Vertical extent (may be zero or negative for degenerate rects).
    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    /// True when the rectangle covers no pixels.
    pub fn is_degenerate(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &CellRect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }
}

impl fmt::Display for CellRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.left, self.top, self.right, self.bottom)
    }
}

/// Error raised while slicing a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CropError {
    /// A cell's rectangle has zero or negative extent
    #[error("Cell '{name}' at ({row}, {col}) has degenerate rectangle {rect} ({w}x{h})", w = rect.width(), h = rect.height())]
    DegenerateCell { name: String, row: usize, col: usize, rect: CellRect },
}

/// Per-sheet cell geometry derived from image size, grid shape and inset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CellGeometry {
    pub image_width: u32,
    pub image_height: u32,
    pub rows: u32,
    pub cols: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub inset_percent: u32,
}

impl CellGeometry {
    /// Compute the geometry for an image of `width` × `height` pixels.
    pub fn compute(width: u32, height: u32, grid: &GridDescriptor, inset_percent: u32) -> Self {
        let rows = grid.row_count() as u32;
        let cols = grid.col_count() as u32;
        let cell_width = width / cols;
        let cell_height = height / rows;

        Self {
            image_width: width,
            image_height: height,
            rows,
            cols,
            cell_width,
            cell_height,
            pad_x: inset_of(cell_width, inset_percent),
            pad_y: inset_of(cell_height, inset_percent),
            inset_percent,
        }
    }

    /// Rectangle of the cell at `(row, col)` after the inset is applied.
    pub fn rect(&self, row: usize, col: usize) -> CellRect {
        let (row, col) = (row as i64, col as i64);
        let (cw, ch) = (self.cell_width as i64, self.cell_height as i64);
        let (px, py) = (self.pad_x as i64, self.pad_y as i64);

        CellRect {
            left: col * cw + px,
            top: row * ch + py,
            right: (col + 1) * cw - px,
            bottom: (row + 1) * ch - py,
        }
    }

    /// Pixels left unused on the right and bottom edges by floor division.
    pub fn discarded(&self) -> (u32, u32) {
        (
            self.image_width - self.cell_width * self.cols,
            self.image_height - self.cell_height * self.rows,
        )
    }
}

/// Saturates so an oversized inset always collapses the cell.
fn inset_of(cell: u32, inset_percent: u32) -> u32 {
    u32::try_from(u64::from(cell) * u64::from(inset_percent) / 100).unwrap_or(u32::MAX)
}

/// A cell whose rectangle has been computed and checked.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PlannedCell {
    pub name: String,
    pub row: usize,
    pub col: usize,
    pub rect: CellRect,
}

/// Compute every cell rectangle without touching pixels.
///
/// Fails on the first degenerate cell in row-major order.
pub fn plan_cells(
    width: u32,
    height: u32,
    grid: &GridDescriptor,
    inset_percent: u32,
) -> Result<Vec<PlannedCell>, CropError> {
    let geometry = CellGeometry::compute(width, height, grid, inset_percent);

    grid.cells()
        .map(|(row, col, name)| {
            let rect = geometry.rect(row, col);
            if rect.is_degenerate() {
                return Err(CropError::DegenerateCell { name: name.to_string(), row, col, rect });
            }
            Ok(PlannedCell { name: name.to_string(), row, col, rect })
        })
        .collect()
}

/// One icon cut from a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedIcon {
    pub name: String,
    pub image: RgbaImage,
}

impl NamedIcon {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Icons cut from one sheet, in grid order, addressable by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconSet {
    icons: Vec<NamedIcon>,
    index: HashMap<String, usize>,
}

impl IconSet {
    fn with_capacity(capacity: usize) -> Self {
        Self { icons: Vec::with_capacity(capacity), index: HashMap::with_capacity(capacity) }
    }

    fn push(&mut self, icon: NamedIcon) {
        self.index.insert(icon.name.clone(), self.icons.len());
        self.icons.push(icon);
    }

    /// Look up an icon by name.
    pub fn get(&self, name: &str) -> Option<&NamedIcon> {
        self.index.get(name).map(|&i| &self.icons[i])
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Icon names in grid order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.icons.iter().map(|icon| icon.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedIcon> {
        self.icons.iter()
    }
}

impl IntoIterator for IconSet {
    type Item = NamedIcon;
    type IntoIter = std::vec::IntoIter<NamedIcon>;

    fn into_iter(self) -> Self::IntoIter {
        self.icons.into_iter()
    }
}

impl<'a> IntoIterator for &'a IconSet {
    type Item = &'a NamedIcon;
    type IntoIter = std::slice::Iter<'a, NamedIcon>;

    fn into_iter(self) -> Self::IntoIter {
        self.icons.iter()
    }
}

/// Cut `image` into one icon per grid cell.
///
/// The source image is only read. Every rectangle is validated before any
/// pixel is copied, so a degenerate cell anywhere in the grid fails the
/// whole call.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use iconslice::crop::crop_grid;
/// use iconslice::grid::GridDescriptor;
///
/// let sheet = RgbaImage::from_pixel(600, 900, Rgba([0, 128, 255, 255]));
/// let grid = GridDescriptor::from_rows([["a", "b"], ["c", "d"], ["e", "f"]]).unwrap();
///
/// let icons = crop_grid(&sheet, &grid, 5).unwrap();
/// assert_eq!(icons.len(), 6);
/// assert_eq!(icons.get("f").unwrap().image.dimensions(), (270, 270));
/// ```
pub fn crop_grid<I>(
    image: &I,
    grid: &GridDescriptor,
    inset_percent: u32,
) -> Result<IconSet, CropError>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let (width, height) = image.dimensions();
    let cells = plan_cells(width, height, grid, inset_percent)?;

    let mut icons = IconSet::with_capacity(cells.len());
    for cell in cells {
        icons.push(NamedIcon { image: copy_rect(image, &cell.rect), name: cell.name });
    }
    Ok(icons)
}

/// Copy a validated, in-bounds rectangle into a new buffer.
fn copy_rect<I>(image: &I, rect: &CellRect) -> RgbaImage
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let (left, top) = (rect.left as u32, rect.top as u32);
    RgbaImage::from_fn(rect.width() as u32, rect.height() as u32, |x, y| {
        image.get_pixel(left + x, top + y)
    })
}
