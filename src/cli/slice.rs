//! Slice and cut command implementations

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::{merge_cli_overrides, CliOverrides, SheetConfig, SliceConfig};
use crate::output::DirSink;
use crate::pipeline::{
    run_failed, ConsoleProgress, JsonProgress, ProgressReporter, SliceContext, SlicePipeline,
};

use super::{load_project, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the slice command
pub fn run_slice(
    config_path: Option<&Path>,
    out: Option<&Path>,
    inset: Option<u32>,
    jobs: Option<usize>,
    strict: bool,
    no_check: bool,
    json: bool,
    verbose: bool,
) -> ExitCode {
    let (mut config, root, found) = match load_project(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if verbose && !json {
        match &found {
            Some(path) => eprintln!("Using config: {}", path.display()),
            None => eprintln!("No islice.toml found, using built-in department sheets"),
        }
    }

    let overrides = CliOverrides {
        out: out.map(Path::to_path_buf),
        inset,
        jobs,
        strict: strict.then_some(true),
        skip_check: no_check,
    };
    merge_cli_overrides(&mut config, &overrides);

    execute(config, root, json, verbose)
}

/// Execute the cut command
pub fn run_cut(
    image: &Path,
    rows: &[String],
    inset: u32,
    out: &Path,
    strict: bool,
    json: bool,
    verbose: bool,
) -> ExitCode {
    let grid: Vec<Vec<String>> = rows.iter().map(|row| parse_row(row)).collect();

    let mut config = SliceConfig {
        sheets: vec![SheetConfig {
            name: None,
            source: image.to_path_buf(),
            inset_percent: Some(inset),
            grid,
        }],
        ..Default::default()
    };
    config.output.dir = out.to_path_buf();
    config.quality.strict = strict;

    let errors = config.validate();
    if !errors.is_empty() {
        for error in errors {
            eprintln!("Error: {}", error.message);
        }
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    // A missing image is an error here, not a skipped sheet
    if !image.exists() {
        eprintln!("Error: Image not found: {}", image.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let root = match std::env::current_dir() {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: Cannot determine current directory: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    execute(config, root, json, verbose)
}

/// Split a `--row` value into names.
fn parse_row(row: &str) -> Vec<String> {
    row.split(',').map(|name| name.trim().to_string()).collect()
}

fn execute(config: SliceConfig, root: PathBuf, json: bool, verbose: bool) -> ExitCode {
    let strict = config.quality.strict;
    let context = SliceContext::new(config, root);

    let sink = match DirSink::create(context.out_dir()) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!(
                "Error: Failed to create output directory '{}': {}",
                context.out_dir().display(),
                e
            );
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let reporter: Arc<dyn ProgressReporter> = if json {
        Arc::new(JsonProgress::new())
    } else {
        Arc::new(ConsoleProgress::new().with_verbose(verbose))
    };

    let out_dir = sink.dir().to_path_buf();
    let result = match SlicePipeline::new(context).with_reporter(reporter).run(&sink) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        println!("Output directory: {}", out_dir.display());
        println!("Icons written: {}", result.icon_count());
    }

    if run_failed(&result, strict) {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_row_trims() {
        assert_eq!(parse_row("口腔科, 眼科"), vec!["口腔科", "眼科"]);
        assert_eq!(parse_row("single"), vec!["single"]);
    }

    #[test]
    fn test_parse_row_keeps_empty_names_for_validation() {
        assert_eq!(parse_row("a,,b"), vec!["a", "", "b"]);
    }
}
