//! Slice progress reporting.
//!
//! All user-facing progress output goes through a [`ProgressReporter`]. The
//! cropping and validation core never writes anything itself; the pipeline
//! emits [`ProgressEvent`]s and the reporter decides how to render them.
//!
//! # Example
//!
//! ```
//! use iconslice::pipeline::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::with_output(Vec::new());
//! reporter.report(ProgressEvent::RunStarted { total_sheets: 2 });
//! reporter.report(ProgressEvent::Warning {
//!     sheet: Some("departments2".to_string()),
//!     message: "source not found".to_string(),
//! });
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use super::result::SheetStatus;
use crate::quality::QualityTier;

/// Events that can be reported during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    RunStarted {
        /// Number of configured sheets
        total_sheets: usize,
    },
    /// A sheet started
    SheetStarted {
        sheet: String,
        /// Source image path
        source: PathBuf,
    },
    /// A sheet's geometry was computed
    SheetGeometry {
        sheet: String,
        image_size: (u32, u32),
        grid: (u32, u32),
        cell_size: (u32, u32),
        padding: (u32, u32),
    },
    /// One icon was written
    IconWritten { sheet: String, name: String, width: u32, height: u32, path: PathBuf },
    /// A sheet completed
    SheetCompleted {
        sheet: String,
        status: SheetStatus,
        /// Icons written for this sheet
        icons: usize,
        duration_ms: u64,
    },
    /// One icon was classified
    QualityChecked { name: String, width: u32, height: u32, tier: QualityTier },
    /// Run completed
    RunCompleted {
        /// Whether no sheet failed
        success: bool,
        /// Quality verdict, None when the check did not run
        all_good: Option<bool>,
        duration_ms: u64,
        succeeded: usize,
        skipped: usize,
        failed: usize,
        icons: usize,
    },
    /// A warning was generated
    Warning { sheet: Option<String>, message: String },
}

/// Receives [`ProgressEvent`]s from a run.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards every event. Used by library callers and tests.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// ANSI styles used by [`ConsoleProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paint {
    Ok,
    Note,
    Bad,
    Label,
    Strong,
}

impl Paint {
    fn code(self) -> &'static str {
        match self {
            Paint::Ok => "\x1b[32m",
            Paint::Note => "\x1b[33m",
            Paint::Bad => "\x1b[31m",
            Paint::Label => "\x1b[36m",
            Paint::Strong => "\x1b[1m",
        }
    }
}

type SharedWriter = Mutex<Box<dyn Write + Send>>;

/// Human-readable progress on stderr, colored when attached to a terminal.
pub struct ConsoleProgress {
    colors: bool,
    verbose: bool,
    sink: SharedWriter,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("colors", &self.colors)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl ConsoleProgress {
    /// Reporter on stderr; colors only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            sink: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Reporter writing plain text to `writer`.
    pub fn with_output<W: Write + Send + 'static>(writer: W) -> Self {
        Self { colors: false, verbose: false, sink: Mutex::new(Box::new(writer)) }
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Show per-sheet geometry and per-icon lines.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn paint(&self, style: Paint, text: &str) -> String {
        if self.colors {
            format!("{}{}\x1b[0m", style.code(), text)
        } else {
            text.to_owned()
        }
    }

    fn line(&self, text: String) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "{}", text);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { total_sheets } => {
                self.line(format!(
                    "{} Slicing {}...",
                    self.paint(Paint::Label, "[slice]"),
                    plural(total_sheets, "sheet", "sheets")
                ));
            }
            ProgressEvent::SheetStarted { sheet, source } => {
                if self.verbose {
                    self.line(format!(
                        "{} {} <- {}",
                        self.paint(Paint::Label, "[slice]"),
                        sheet,
                        source.display()
                    ));
                }
            }
            ProgressEvent::SheetGeometry { sheet, image_size, grid, cell_size, padding } => {
                if self.verbose {
                    self.line(format!(
                        "        {}: image {}x{}, grid {}x{} (rows x cols), cell {}x{}, inset {}px/{}px",
                        sheet,
                        image_size.0,
                        image_size.1,
                        grid.0,
                        grid.1,
                        cell_size.0,
                        cell_size.1,
                        padding.0,
                        padding.1
                    ));
                }
            }
            ProgressEvent::IconWritten { name, width, height, path, .. } => {
                if self.verbose {
                    self.line(format!(
                        "        {} {} ({}x{}) -> {}",
                        self.paint(Paint::Ok, "saved"),
                        name,
                        width,
                        height,
                        path.display()
                    ));
                }
            }
            ProgressEvent::SheetCompleted { sheet, status, icons, duration_ms } => {
                let status_str = match &status {
                    SheetStatus::Success => self.paint(Paint::Ok, "ok"),
                    SheetStatus::Skipped(_) => self.paint(Paint::Note, "skipped"),
                    SheetStatus::Failed(_) => self.paint(Paint::Bad, "FAILED"),
                };

                self.line(format!(
                    "{} {} {} ({}, {})",
                    self.paint(Paint::Label, "[slice]"),
                    status_str,
                    sheet,
                    plural(icons, "icon", "icons"),
                    format_duration(duration_ms)
                ));

                match status {
                    SheetStatus::Failed(err) => self.line(format!("        {}", self.paint(Paint::Bad, &err))),
                    SheetStatus::Skipped(reason) => {
                        self.line(format!("        {}", self.paint(Paint::Note, &reason)))
                    }
                    SheetStatus::Success => {}
                }
            }
            ProgressEvent::QualityChecked { name, width, height, tier } => {
                let label = match tier {
                    QualityTier::Good => self.paint(Paint::Ok, "[ok]   "),
                    QualityTier::Moderate => self.paint(Paint::Note, "[note] "),
                    QualityTier::Insufficient => self.paint(Paint::Bad, "[warn] "),
                };
                self.line(format!("{}{}: {} ({}x{})", label, name, tier, width, height));
            }
            ProgressEvent::RunCompleted {
                success,
                all_good,
                duration_ms,
                succeeded,
                skipped,
                failed,
                icons,
            } => {
                if success {
                    self.line(format!(
                        "\n{} {} from {}, {} skipped in {}",
                        self.paint(Paint::Ok, "[done]"),
                        self.paint(Paint::Strong, &plural(icons, "icon", "icons")),
                        plural(succeeded, "sheet", "sheets"),
                        skipped,
                        format_duration(duration_ms)
                    ));
                } else {
                    self.line(format!(
                        "\n{} Slicing failed: {} succeeded, {} skipped, {} in {}",
                        self.paint(Paint::Bad, "[error]"),
                        succeeded,
                        skipped,
                        plural(failed, "failure", "failures"),
                        format_duration(duration_ms)
                    ));
                }

                match all_good {
                    Some(true) => self.line(format!(
                        "{} All icons passed the quality check",
                        self.paint(Paint::Ok, "[quality]")
                    )),
                    Some(false) => self.line(format!(
                        "{} Some icons are below {}px and need adjusting",
                        self.paint(Paint::Note, "[quality]"),
                        crate::quality::MIN_ACCEPTABLE
                    )),
                    None => {}
                }
            }
            ProgressEvent::Warning { sheet, message } => {
                let prefix = sheet.map(|s| format!("{}: ", s)).unwrap_or_default();
                self.line(format!("{} {}{}", self.paint(Paint::Note, "[warn]"), prefix, message));
            }
        }
    }
}

/// Machine-readable progress: one JSON object per event, one event per line.
pub struct JsonProgress {
    sink: SharedWriter,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonProgress")
    }
}

impl JsonProgress {
    /// Reporter on stderr, leaving stdout for the final result.
    pub fn new() -> Self {
        Self::with_output(std::io::stderr())
    }

    pub fn with_output<W: Write + Send + 'static>(writer: W) -> Self {
        Self { sink: Mutex::new(Box::new(writer)) }
    }

    fn emit(&self, value: serde_json::Value) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "{}", value);
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        use serde_json::json;

        let value = match event {
            ProgressEvent::RunStarted { total_sheets } => {
                json!({ "event": "run_started", "total_sheets": total_sheets })
            }
            ProgressEvent::SheetStarted { sheet, source } => {
                json!({ "event": "sheet_started", "sheet": sheet, "source": source })
            }
            ProgressEvent::SheetGeometry { sheet, image_size, grid, cell_size, padding } => json!({
                "event": "sheet_geometry",
                "sheet": sheet,
                "image_size": [image_size.0, image_size.1],
                "grid": [grid.0, grid.1],
                "cell_size": [cell_size.0, cell_size.1],
                "padding": [padding.0, padding.1],
            }),
            ProgressEvent::IconWritten { sheet, name, width, height, path } => json!({
                "event": "icon_written",
                "sheet": sheet,
                "name": name,
                "width": width,
                "height": height,
                "path": path,
            }),
            ProgressEvent::SheetCompleted { sheet, status, icons, duration_ms } => {
                let mut value = json!({
                    "event": "sheet_completed",
                    "sheet": sheet,
                    "icons": icons,
                    "duration_ms": duration_ms,
                });
                let (label, detail) = match &status {
                    SheetStatus::Success => ("success", None),
                    SheetStatus::Skipped(reason) => ("skipped", Some(("reason", reason))),
                    SheetStatus::Failed(err) => ("failed", Some(("error", err))),
                };
                value["status"] = json!(label);
                if let Some((key, text)) = detail {
                    value[key] = json!(text);
                }
                value
            }
            ProgressEvent::QualityChecked { name, width, height, tier } => json!({
                "event": "quality_checked",
                "name": name,
                "width": width,
                "height": height,
                "tier": tier,
            }),
            ProgressEvent::RunCompleted {
                success,
                all_good,
                duration_ms,
                succeeded,
                skipped,
                failed,
                icons,
            } => json!({
                "event": "run_completed",
                "success": success,
                "all_good": all_good,
                "duration_ms": duration_ms,
                "succeeded": succeeded,
                "skipped": skipped,
                "failed": failed,
                "icons": icons,
            }),
            ProgressEvent::Warning { sheet, message } => {
                json!({ "event": "warning", "message": message, "sheet": sheet })
            }
        };
        self.emit(value);
    }
}

fn format_duration(ms: u64) -> String {
    match ms {
        0..=999 => format!("{}ms", ms),
        1_000..=59_999 => format!("{:.1}s", ms as f64 / 1000.0),
        _ => format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Clonable in-memory writer so tests can read what a reporter wrote.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(bytes)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn console(verbose: bool) -> (ConsoleProgress, Captured) {
        let captured = Captured::default();
        let reporter = ConsoleProgress::with_output(captured.clone()).with_verbose(verbose);
        (reporter, captured)
    }

    fn icon_written() -> ProgressEvent {
        ProgressEvent::IconWritten {
            sheet: "departments1".to_string(),
            name: "眼科".to_string(),
            width: 270,
            height: 270,
            path: PathBuf::from("output/眼科.png"),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(150), "150ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(125_000), "2m 5s");
    }

    #[test]
    fn test_null_progress() {
        let reporter = NullProgress::new();
        reporter.report(ProgressEvent::RunStarted { total_sheets: 10 });
    }

    #[test]
    fn test_console_run_started() {
        let (reporter, output) = console(false);
        reporter.report(ProgressEvent::RunStarted { total_sheets: 2 });
        assert!(output.text().contains("Slicing 2 sheets"));
    }

    #[test]
    fn test_console_icon_lines_only_when_verbose() {
        let (quiet, quiet_out) = console(false);
        quiet.report(icon_written());
        assert!(quiet_out.text().is_empty());

        let (verbose, verbose_out) = console(true);
        verbose.report(icon_written());
        let out = verbose_out.text();
        assert!(out.contains("眼科 (270x270)"));
    }

    #[test]
    fn test_console_sheet_failed() {
        let (reporter, output) = console(false);
        reporter.report(ProgressEvent::SheetCompleted {
            sheet: "departments1".to_string(),
            status: SheetStatus::Failed("degenerate rectangle".to_string()),
            icons: 0,
            duration_ms: 3,
        });
        let out = output.text();
        assert!(out.contains("FAILED departments1"));
        assert!(out.contains("degenerate rectangle"));
    }

    #[test]
    fn test_console_quality_lines() {
        let (reporter, output) = console(false);
        reporter.report(ProgressEvent::QualityChecked {
            name: "骨科".to_string(),
            width: 150,
            height: 270,
            tier: QualityTier::Insufficient,
        });
        assert!(output.text().contains("[warn] 骨科: insufficient (150x270)"));
    }

    #[test]
    fn test_console_run_completed() {
        let (reporter, output) = console(false);
        reporter.report(ProgressEvent::RunCompleted {
            success: true,
            all_good: Some(false),
            duration_ms: 20,
            succeeded: 2,
            skipped: 0,
            failed: 0,
            icons: 12,
        });
        let out = output.text();
        assert!(out.contains("[done] 12 icons from 2 sheets"));
        assert!(out.contains("need adjusting"));
    }

    #[test]
    fn test_console_run_failed() {
        let (reporter, output) = console(false);
        reporter.report(ProgressEvent::RunCompleted {
            success: false,
            all_good: None,
            duration_ms: 20,
            succeeded: 1,
            skipped: 0,
            failed: 1,
            icons: 6,
        });
        let out = output.text();
        assert!(out.contains("1 failure"));
        assert!(!out.contains("[quality]"));
    }

    #[test]
    fn test_console_warning() {
        let (reporter, output) = console(false);
        reporter.report(ProgressEvent::Warning {
            sheet: Some("departments2".to_string()),
            message: "source not found".to_string(),
        });
        assert!(output.text().contains("[warn] departments2: source not found"));
    }

    #[test]
    fn test_console_colors() {
        let (reporter, output) = console(false);
        let reporter = reporter.with_colors(true);
        reporter.report(ProgressEvent::RunStarted { total_sheets: 1 });
        assert!(output.text().contains("\x1b[36m[slice]\x1b[0m"));
    }

    #[test]
    fn test_json_progress_lines() {
        let output = Captured::default();
        let reporter = JsonProgress::with_output(output.clone());

        reporter.report(ProgressEvent::RunStarted { total_sheets: 1 });
        reporter.report(icon_written());
        reporter.report(ProgressEvent::SheetCompleted {
            sheet: "b".to_string(),
            status: SheetStatus::Skipped("source \"b.png\" not found".to_string()),
            icons: 0,
            duration_ms: 0,
        });

        let out = output.text();
        let lines: Vec<serde_json::Value> =
            out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event"], "run_started");
        assert_eq!(lines[1]["name"], "眼科");
        assert_eq!(lines[2]["status"], "skipped");
        assert_eq!(lines[2]["reason"], "source \"b.png\" not found");
    }
}
