//! Slice result types.
//!
//! Contains types for representing the outcome of a slicing run.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::quality::QualityReport;

/// Status of a single sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SheetStatus {
    /// Every icon was cut and written
    Success,
    /// Sheet was not processed (e.g. source image missing)
    Skipped(String),
    /// Sheet failed; none of its icons were cut
    Failed(String),
}

impl SheetStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, SheetStatus::Success | SheetStatus::Skipped(_))
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, SheetStatus::Failed(_))
    }

    /// Short label used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            SheetStatus::Success => "ok",
            SheetStatus::Skipped(_) => "skipped",
            SheetStatus::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetStatus::Success => write!(f, "success"),
            SheetStatus::Skipped(reason) => write!(f, "skipped: {}", reason),
            SheetStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Size of one written icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconSummary {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

/// Result of slicing one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct SheetResult {
    /// Sheet label
    pub sheet: String,
    /// Sheet status
    #[serde(flatten)]
    pub status: SheetStatus,
    /// Icons written, in grid order
    pub icons: Vec<IconSummary>,
    /// Time spent on the sheet
    #[serde(skip)]
    pub duration: Duration,
}

impl SheetResult {
    /// Create a successful result.
    pub fn success(sheet: String, icons: Vec<IconSummary>, duration: Duration) -> Self {
        Self { sheet, status: SheetStatus::Success, icons, duration }
    }

    /// Create a skipped result.
    pub fn skipped(sheet: String, reason: String) -> Self {
        Self { sheet, status: SheetStatus::Skipped(reason), icons: vec![], duration: Duration::ZERO }
    }

    /// Create a failed result.
    pub fn failed(sheet: String, error: String, duration: Duration) -> Self {
        Self { sheet, status: SheetStatus::Failed(error), icons: vec![], duration }
    }

    /// Check if this result is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete slicing run.
#[derive(Debug, Default, Serialize)]
pub struct SliceResult {
    /// Results for each sheet, in configuration order
    pub sheets: Vec<SheetResult>,
    /// Quality report over every icon written (None if skipped or nothing was cut)
    pub quality: Option<QualityReport>,
    /// Total run duration
    #[serde(skip)]
    pub total_duration: Duration,
}

impl SliceResult {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet result.
    pub fn add_result(&mut self, result: SheetResult) {
        self.sheets.push(result);
    }

    /// Check if no sheet failed.
    pub fn is_success(&self) -> bool {
        self.sheets.iter().all(|s| s.is_success())
    }

    /// Check if the quality check ran and found no insufficient icon.
    pub fn all_good(&self) -> bool {
        self.quality.as_ref().map(|q| q.all_good).unwrap_or(false)
    }

    /// Number of sheets that were sliced.
    pub fn success_count(&self) -> usize {
        self.sheets.iter().filter(|s| s.status == SheetStatus::Success).count()
    }

    /// Number of skipped sheets.
    pub fn skipped_count(&self) -> usize {
        self.sheets.iter().filter(|s| matches!(s.status, SheetStatus::Skipped(_))).count()
    }

    /// Number of failed sheets.
    pub fn failed_count(&self) -> usize {
        self.sheets.iter().filter(|s| s.status.is_failure()).count()
    }

    /// Total icons written across all sheets.
    pub fn icon_count(&self) -> usize {
        self.sheets.iter().map(|s| s.icons.len()).sum()
    }

    /// Every written icon, in sheet then grid order.
    pub fn icons(&self) -> impl Iterator<Item = &IconSummary> + '_ {
        self.sheets.iter().flat_map(|s| s.icons.iter())
    }

    /// Failed sheets with their error messages.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.sheets
            .iter()
            .filter_map(|s| match &s.status {
                SheetStatus::Failed(e) => Some((s.sheet.as_str(), e.as_str())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icon(name: &str) -> IconSummary {
        IconSummary { name: name.to_string(), width: 10, height: 10, path: PathBuf::from(name) }
    }

    #[test]
    fn test_sheet_status() {
        assert!(SheetStatus::Success.is_success());
        assert!(SheetStatus::Skipped("missing".to_string()).is_success());
        assert!(SheetStatus::Failed("bad".to_string()).is_failure());
        assert_eq!(SheetStatus::Failed("bad".to_string()).to_string(), "failed: bad");
    }

    #[test]
    fn test_slice_result_counts() {
        let mut result = SliceResult::new();
        result.add_result(SheetResult::success(
            "a".to_string(),
            vec![icon("x"), icon("y")],
            Duration::from_millis(5),
        ));
        result.add_result(SheetResult::skipped("b".to_string(), "missing".to_string()));

        assert!(result.is_success());
        assert_eq!(result.success_count(), 1);
        assert_eq!(result.skipped_count(), 1);
        assert_eq!(result.failed_count(), 0);
        assert_eq!(result.icon_count(), 2);
        assert!(!result.all_good());

        result.add_result(SheetResult::failed(
            "c".to_string(),
            "degenerate".to_string(),
            Duration::ZERO,
        ));
        assert!(!result.is_success());
        assert_eq!(result.failures(), vec![("c", "degenerate")]);
    }

    #[test]
    fn test_sheet_result_json() {
        let result = SheetResult::skipped("b".to_string(), "missing".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sheet"], "b");
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "missing");
    }
}
