//! Slice execution.
//!
//! Sheets are independent: each one is opened, cut and written without
//! looking at any other. With more than one job they run on a rayon thread
//! pool; results always come back in configuration order.

use image::GenericImageView;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use super::context::SliceContext;
use super::progress::{NullProgress, ProgressEvent, ProgressReporter};
use super::result::{IconSummary, SheetResult, SliceResult};
use crate::config::SheetConfig;
use crate::crop::{crop_grid, CellGeometry, CropError};
use crate::grid::{GridDescriptor, GridError};
use crate::output::{IconSink, OutputError};
use crate::quality::{self, QualityError};

/// Error that stops a run before any sheet is processed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A sheet's name table is malformed
    #[error("Sheet '{sheet}': {source}")]
    Grid { sheet: String, source: GridError },
    /// The configuration lists no sheets
    #[error("No sheets configured")]
    NoSheets,
    /// Worker pool could not be created
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Error that fails a single sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Source image could not be opened or decoded
    #[error("Failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: image::ImageError },
    /// Cropping failed
    #[error(transparent)]
    Crop(#[from] CropError),
    /// Writing an icon failed
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Runs every configured sheet through crop, write and quality check.
pub struct SlicePipeline {
    context: SliceContext,
    reporter: Arc<dyn ProgressReporter>,
}

impl SlicePipeline {
    /// Create a pipeline that reports nothing.
    pub fn new(context: SliceContext) -> Self {
        Self { context, reporter: Arc::new(NullProgress::new()) }
    }

    /// Set the progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Slice every sheet into `sink`, then validate what was written.
    ///
    /// A sheet that fails to open or crop is marked failed and writes
    /// nothing; remaining sheets still run. A missing source is skipped with
    /// a warning, or fails the sheet in strict mode.
    pub fn run(&self, sink: &dyn IconSink) -> Result<SliceResult, PipelineError> {
        let start = Instant::now();
        let sheets = self.prepare()?;

        self.reporter.report(ProgressEvent::RunStarted { total_sheets: sheets.len() });

        let jobs = self.context.jobs();
        let sheet_results: Vec<SheetResult> = if jobs <= 1 || sheets.len() <= 1 {
            sheets.iter().map(|(sheet, grid)| self.run_sheet(sheet, grid, sink)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| {
                sheets
                    .par_iter()
                    .map(|(sheet, grid)| self.run_sheet(sheet, grid, sink))
                    .collect::<Vec<_>>()
            })
        };

        let mut result = SliceResult::new();
        for sheet_result in sheet_results {
            result.add_result(sheet_result);
        }

        if self.context.config().quality.check {
            result.quality = self.check_quality(&result);
        }

        result.total_duration = start.elapsed();
        self.reporter.report(ProgressEvent::RunCompleted {
            success: result.is_success(),
            all_good: result.quality.as_ref().map(|q| q.all_good),
            duration_ms: result.total_duration.as_millis() as u64,
            succeeded: result.success_count(),
            skipped: result.skipped_count(),
            failed: result.failed_count(),
            icons: result.icon_count(),
        });

        Ok(result)
    }

    /// Build every grid up front so a malformed table stops the run early.
    fn prepare(&self) -> Result<Vec<(SheetConfig, GridDescriptor)>, PipelineError> {
        let sheets = &self.context.config().sheets;
        if sheets.is_empty() {
            return Err(PipelineError::NoSheets);
        }

        sheets
            .iter()
            .map(|sheet| {
                let grid = sheet.grid_descriptor().map_err(|source| PipelineError::Grid {
                    sheet: sheet.display_name(),
                    source,
                })?;
                Ok((sheet.clone(), grid))
            })
            .collect()
    }

    fn run_sheet(
        &self,
        sheet: &SheetConfig,
        grid: &GridDescriptor,
        sink: &dyn IconSink,
    ) -> SheetResult {
        let label = sheet.display_name();
        let source = self.context.source_path(sheet);

        if !source.exists() {
            let reason = format!("source image not found: {}", source.display());
            let result = if self.context.is_strict() {
                SheetResult::failed(label.clone(), reason.clone(), Default::default())
            } else {
                self.reporter.report(ProgressEvent::Warning {
                    sheet: Some(label.clone()),
                    message: reason.clone(),
                });
                SheetResult::skipped(label.clone(), reason)
            };
            self.report_completed(&result);
            return result;
        }

        self.reporter
            .report(ProgressEvent::SheetStarted { sheet: label.clone(), source: source.clone() });

        let start = Instant::now();
        let result = match self.slice_sheet(&label, &source, sheet, grid, sink) {
            Ok(icons) => SheetResult::success(label, icons, start.elapsed()),
            Err(e) => SheetResult::failed(label, e.to_string(), start.elapsed()),
        };
        self.report_completed(&result);
        result
    }

    fn slice_sheet(
        &self,
        label: &str,
        source: &std::path::Path,
        sheet: &SheetConfig,
        grid: &GridDescriptor,
        sink: &dyn IconSink,
    ) -> Result<Vec<IconSummary>, SheetError> {
        let image = image::open(source)
            .map_err(|e| SheetError::Open { path: source.to_path_buf(), source: e })?;
        let inset = self.context.config().effective_inset(sheet);

        let (width, height) = image.dimensions();
        let geometry = CellGeometry::compute(width, height, grid, inset);
        self.reporter.report(ProgressEvent::SheetGeometry {
            sheet: label.to_string(),
            image_size: (geometry.image_width, geometry.image_height),
            grid: (geometry.rows, geometry.cols),
            cell_size: (geometry.cell_width, geometry.cell_height),
            padding: (geometry.pad_x, geometry.pad_y),
        });

        let icons = crop_grid(&image, grid, inset)?;

        let mut written = Vec::with_capacity(icons.len());
        for icon in &icons {
            let path = sink.write_icon(&icon.name, &icon.image)?;
            self.reporter.report(ProgressEvent::IconWritten {
                sheet: label.to_string(),
                name: icon.name.clone(),
                width: icon.width(),
                height: icon.height(),
                path: path.clone(),
            });
            written.push(IconSummary {
                name: icon.name.clone(),
                width: icon.width(),
                height: icon.height(),
                path,
            });
        }
        Ok(written)
    }

    fn report_completed(&self, result: &SheetResult) {
        self.reporter.report(ProgressEvent::SheetCompleted {
            sheet: result.sheet.clone(),
            status: result.status.clone(),
            icons: result.icons.len(),
            duration_ms: result.duration.as_millis() as u64,
        });
    }

    fn check_quality(&self, result: &SliceResult) -> Option<quality::QualityReport> {
        let sizes = result.icons().map(|icon| (icon.name.as_str(), (icon.width, icon.height)));
        match quality::validate(sizes) {
            Ok(report) => {
                for (name, entry) in &report.entries {
                    self.reporter.report(ProgressEvent::QualityChecked {
                        name: name.clone(),
                        width: entry.width,
                        height: entry.height,
                        tier: entry.tier,
                    });
                }
                Some(report)
            }
            Err(QualityError::NoIcons) => {
                self.reporter.report(ProgressEvent::Warning {
                    sheet: None,
                    message: "no icons were produced, quality check skipped".to_string(),
                });
                None
            }
        }
    }
}

/// Whether a finished run should count as a failure for the caller.
///
/// Failed sheets always fail the run; in strict mode an insufficient icon
/// does too.
pub fn run_failed(result: &SliceResult, strict: bool) -> bool {
    if !result.is_success() {
        return true;
    }
    strict && result.quality.as_ref().is_some_and(|q| !q.all_good)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SheetConfig, SliceConfig};
    use crate::output::MemorySink;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_sheet(dir: &std::path::Path, name: &str, width: u32, height: u32) {
        let image = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        image.save(dir.join(name)).unwrap();
    }

    fn sheet(source: &str, grid: &[&[&str]]) -> SheetConfig {
        SheetConfig {
            name: None,
            source: PathBuf::from(source),
            inset_percent: None,
            grid: grid.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        }
    }

    fn pipeline(root: &std::path::Path, sheets: Vec<SheetConfig>) -> SlicePipeline {
        let config = SliceConfig { sheets, ..Default::default() };
        SlicePipeline::new(SliceContext::new(config, root.to_path_buf()))
    }

    #[test]
    fn test_run_single_sheet() {
        let temp = TempDir::new().unwrap();
        write_sheet(temp.path(), "a.png", 40, 20);

        let sink = MemorySink::new();
        let result = pipeline(temp.path(), vec![sheet("a.png", &[&["left", "right"]])])
            .run(&sink)
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.icon_count(), 2);
        // cell 20x20, inset 5% -> 1px per side
        let icons = sink.into_icons();
        assert_eq!(icons["left"].dimensions(), (18, 18));
        let quality = result.quality.unwrap();
        assert!(!quality.all_good);
    }

    #[test]
    fn test_missing_source_skipped() {
        let temp = TempDir::new().unwrap();
        write_sheet(temp.path(), "a.png", 10, 10);

        let sink = MemorySink::new();
        let result = pipeline(
            temp.path(),
            vec![sheet("a.png", &[&["x"]]), sheet("missing.png", &[&["y"]])],
        )
        .run(&sink)
        .unwrap();

        assert!(result.is_success());
        assert_eq!(result.skipped_count(), 1);
        assert_eq!(result.sheets[1].status.label(), "skipped");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_missing_source_fails_in_strict_mode() {
        let temp = TempDir::new().unwrap();
        let mut config =
            SliceConfig { sheets: vec![sheet("missing.png", &[&["y"]])], ..Default::default() };
        config.quality.strict = true;

        let result = SlicePipeline::new(SliceContext::new(config, temp.path().to_path_buf()))
            .run(&MemorySink::new())
            .unwrap();

        assert_eq!(result.failed_count(), 1);
        assert!(run_failed(&result, true));
        assert!(result.quality.is_none());
    }

    #[test]
    fn test_degenerate_sheet_writes_nothing() {
        let temp = TempDir::new().unwrap();
        write_sheet(temp.path(), "a.png", 200, 100);
        write_sheet(temp.path(), "b.png", 200, 100);

        let mut bad = sheet("a.png", &[&["a1", "a2"]]);
        bad.inset_percent = Some(60);
        let sink = MemorySink::new();
        let result = pipeline(temp.path(), vec![bad, sheet("b.png", &[&["b1", "b2"]])])
            .run(&sink)
            .unwrap();

        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.failures()[0].0, "a");
        assert!(result.failures()[0].1.contains("degenerate"));
        let icons = sink.into_icons();
        assert_eq!(icons.keys().collect::<Vec<_>>(), vec!["b1", "b2"]);
    }

    #[test]
    fn test_malformed_grid_stops_run() {
        let temp = TempDir::new().unwrap();
        let err = pipeline(temp.path(), vec![sheet("a.png", &[&["a", "b"], &["c"]])])
            .run(&MemorySink::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Grid { ref sheet, .. } if sheet == "a"));
    }

    #[test]
    fn test_no_sheets() {
        let temp = TempDir::new().unwrap();
        let err = pipeline(temp.path(), vec![]).run(&MemorySink::new()).unwrap_err();
        assert!(matches!(err, PipelineError::NoSheets));
    }

    #[test]
    fn test_unreadable_source_fails_sheet() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.png"), b"garbage").unwrap();
        let result = pipeline(temp.path(), vec![sheet("a.png", &[&["x"]])])
            .run(&MemorySink::new())
            .unwrap();
        assert_eq!(result.failed_count(), 1);
        assert!(result.failures()[0].1.starts_with("Failed to open"));
    }

    #[test]
    fn test_quality_check_disabled() {
        let temp = TempDir::new().unwrap();
        write_sheet(temp.path(), "a.png", 10, 10);
        let mut config =
            SliceConfig { sheets: vec![sheet("a.png", &[&["x"]])], ..Default::default() };
        config.quality.check = false;

        let result = SlicePipeline::new(SliceContext::new(config, temp.path().to_path_buf()))
            .run(&MemorySink::new())
            .unwrap();
        assert!(result.quality.is_none());
        assert!(!run_failed(&result, true));
    }

    #[test]
    fn test_run_failed_strict_quality() {
        let temp = TempDir::new().unwrap();
        write_sheet(temp.path(), "a.png", 10, 10);
        let result = pipeline(temp.path(), vec![sheet("a.png", &[&["x"]])])
            .run(&MemorySink::new())
            .unwrap();
        assert!(!run_failed(&result, false));
        assert!(run_failed(&result, true));
    }
}
