//! Grid descriptors - the rows × columns table of icon names for one sheet

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Error raised when a name table cannot describe a rectangular grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// No rows were supplied
    #[error("Grid has no rows")]
    Empty,
    /// The first row has no columns
    #[error("Grid row 0 has no columns")]
    EmptyRow,
    /// A row's length differs from the first row
    #[error("Grid row {row} has {found} column(s), expected {expected}")]
    Jagged { row: usize, expected: usize, found: usize },
    /// A cell holds an empty (or whitespace-only) name
    #[error("Grid cell ({row}, {col}) has an empty name")]
    EmptyName { row: usize, col: usize },
    /// A name that cannot be used as a file stem
    #[error("Grid cell ({row}, {col}) name '{name}' is not a valid file name")]
    InvalidName { row: usize, col: usize, name: String },
    /// The same name appears in two cells
    #[error("Name '{name}' appears at ({}, {}) and ({}, {})", first.0, first.1, second.0, second.1)]
    DuplicateName { name: String, first: (usize, usize), second: (usize, usize) },
}

/// A validated, immutable rows × columns table of unique icon names.
///
/// Construction is the only place validation happens: once a descriptor
/// exists, every row has the same number of columns and every name is
/// non-empty and unique across the whole grid.
///
/// # Examples
///
/// ```
/// use iconslice::grid::GridDescriptor;
///
/// let grid = GridDescriptor::new(vec![
///     vec!["口腔科".to_string(), "眼科".to_string()],
///     vec!["耳鼻喉科".to_string(), "皮肤科".to_string()],
/// ])
/// .unwrap();
///
/// assert_eq!(grid.row_count(), 2);
/// assert_eq!(grid.col_count(), 2);
/// assert_eq!(grid.name_at(1, 0), Some("耳鼻喉科"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct GridDescriptor {
    rows: Vec<Vec<String>>,
}

impl GridDescriptor {
    /// Validate `name_rows` and wrap it in a descriptor.
    pub fn new(name_rows: Vec<Vec<String>>) -> Result<Self, GridError> {
        let cols = match name_rows.first() {
            None => return Err(GridError::Empty),
            Some(first) if first.is_empty() => return Err(GridError::EmptyRow),
            Some(first) => first.len(),
        };

        let mut seen: HashMap<&str, (usize, usize)> = HashMap::new();
        for (row, names) in name_rows.iter().enumerate() {
            if names.len() != cols {
                return Err(GridError::Jagged { row, expected: cols, found: names.len() });
            }
            for (col, name) in names.iter().enumerate() {
                if name.trim().is_empty() {
                    return Err(GridError::EmptyName { row, col });
                }
                if !is_file_stem(name) {
                    return Err(GridError::InvalidName { row, col, name: name.clone() });
                }
                if let Some(&first) = seen.get(name.as_str()) {
                    return Err(GridError::DuplicateName {
                        name: name.clone(),
                        first,
                        second: (row, col),
                    });
                }
                seen.insert(name, (row, col));
            }
        }

        Ok(Self { rows: name_rows })
    }

    /// Build a descriptor from string slices.
    pub fn from_rows<R, S>(rows: R) -> Result<Self, GridError>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(rows.into_iter().map(|row| row.into_iter().map(Into::into).collect()).collect())
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (identical for every row).
    pub fn col_count(&self) -> usize {
        self.rows[0].len()
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.row_count() * self.col_count()
    }

    /// Always false; a descriptor has at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Name of the cell at `(row, col)`, if in range.
    pub fn name_at(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Whether any cell carries `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Iterate `(row, col, name)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, names)| {
            names.iter().enumerate().map(move |(col, name)| (row, col, name.as_str()))
        })
    }

    /// Iterate names in row-major order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().flatten().map(String::as_str)
    }

    /// Borrow the underlying rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Whether `name` stays a single path component once `.png` is appended.
pub fn is_file_stem(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

impl TryFrom<Vec<Vec<String>>> for GridDescriptor {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<GridDescriptor> for Vec<Vec<String>> {
    fn from(grid: GridDescriptor) -> Self {
        grid.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(table: &[&[&str]]) -> Vec<Vec<String>> {
        table.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect()
    }

    #[test]
    fn test_valid_grid() {
        let grid = GridDescriptor::new(rows(&[
            &["口腔科", "眼科"],
            &["耳鼻喉科", "皮肤科"],
            &["心血管内科", "骨科"],
        ]))
        .unwrap();

        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.col_count(), 2);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.name_at(0, 1), Some("眼科"));
        assert_eq!(grid.name_at(2, 0), Some("心血管内科"));
        assert_eq!(grid.name_at(3, 0), None);
        assert_eq!(grid.name_at(0, 2), None);
        assert!(grid.contains("骨科"));
        assert!(!grid.contains("外科"));
    }

    #[test]
    fn test_cells_row_major() {
        let grid = GridDescriptor::from_rows([["a", "b"], ["c", "d"]]).unwrap();
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells, vec![(0, 0, "a"), (0, 1, "b"), (1, 0, "c"), (1, 1, "d")]);
        assert_eq!(grid.names().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_path_like_names_rejected() {
        for bad in ["../escaped", "a/b", "a\\b", ".", "..", "nul\0byte"] {
            let err = GridDescriptor::from_rows([["ok", bad]]).unwrap_err();
            assert_eq!(err, GridError::InvalidName { row: 0, col: 1, name: bad.to_string() });
        }
        // dots inside a name are fine
        assert!(GridDescriptor::from_rows([["v1.2", "...x"]]).is_ok());
    }

    #[test]
    fn test_single_cell() {
        let grid = GridDescriptor::from_rows([["only"]]).unwrap();
        assert_eq!(grid.len(), 1);
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_empty_grid() {
        assert_eq!(GridDescriptor::new(vec![]), Err(GridError::Empty));
    }

    #[test]
    fn test_empty_first_row() {
        assert_eq!(GridDescriptor::new(vec![vec![]]), Err(GridError::EmptyRow));
    }

    #[test]
    fn test_jagged_rows() {
        let err = GridDescriptor::new(rows(&[&["a", "b"], &["c"]])).unwrap_err();
        assert_eq!(err, GridError::Jagged { row: 1, expected: 2, found: 1 });
        assert_eq!(err.to_string(), "Grid row 1 has 1 column(s), expected 2");
    }

    #[test]
    fn test_empty_name() {
        let err = GridDescriptor::new(rows(&[&["a", " "]])).unwrap_err();
        assert_eq!(err, GridError::EmptyName { row: 0, col: 1 });
    }

    #[test]
    fn test_duplicate_name() {
        let err = GridDescriptor::new(rows(&[&["a", "b"], &["c", "a"]])).unwrap_err();
        assert_eq!(
            err,
            GridError::DuplicateName { name: "a".to_string(), first: (0, 0), second: (1, 1) }
        );
        assert_eq!(err.to_string(), "Name 'a' appears at (0, 0) and (1, 1)");
    }

    #[test]
    fn test_deserialize_validates() {
        let grid: GridDescriptor = serde_json::from_str(r#"[["a","b"],["c","d"]]"#).unwrap();
        assert_eq!(grid.col_count(), 2);

        let err = serde_json::from_str::<GridDescriptor>(r#"[["a","b"],["c"]]"#).unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_serialize_as_table() {
        let grid = GridDescriptor::from_rows([["a", "b"]]).unwrap();
        assert_eq!(serde_json::to_string(&grid).unwrap(), r#"[["a","b"]]"#);
    }
}
