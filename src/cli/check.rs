//! Check command implementation - re-validates icons already on disk

use std::path::Path;
use std::process::ExitCode;

use crate::output::scan_icons;
use crate::pipeline::{ConsoleProgress, ProgressEvent, ProgressReporter};
use crate::quality::{validate, QualityError, QualityTier};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the check command
pub fn run_check(dir: &Path, strict: bool, json: bool) -> ExitCode {
    let icons = match scan_icons(dir) {
        Ok(icons) => icons,
        Err(e) => {
            eprintln!("Error: Failed to read '{}': {}", dir.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let report = match validate(icons.iter().map(|i| (i.name.as_str(), (i.width, i.height)))) {
        Ok(report) => report,
        Err(QualityError::NoIcons) => {
            eprintln!("Error: No PNG icons found in {}", dir.display());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        let reporter = ConsoleProgress::new();
        for (name, entry) in &report.entries {
            reporter.report(ProgressEvent::QualityChecked {
                name: name.clone(),
                width: entry.width,
                height: entry.height,
                tier: entry.tier,
            });
        }
        println!(
            "{} icons checked: {} good, {} moderate, {} insufficient",
            report.len(),
            report.count(QualityTier::Good),
            report.count(QualityTier::Moderate),
            report.count(QualityTier::Insufficient)
        );
        if report.all_good {
            println!("All icons passed the quality check");
        } else {
            println!("Some icons need adjusting: {}", report.below(QualityTier::Moderate).join(", "));
        }
    }

    if strict && !report.all_good {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
