//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod check;
mod plan;
mod slice;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{self, ConfigError, SliceConfig};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// iconslice - cut grid sprite sheets into named icons
#[derive(Parser)]
#[command(name = "islice")]
#[command(about = "Cut grid sprite sheets into named PNG icons and check their size")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Slice every sheet listed in islice.toml (or the built-in department sheets)
    Slice {
        /// Config file (default: islice.toml found by walking up from the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Inset percent applied to every sheet (overrides config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        inset: Option<u32>,

        /// Worker threads for independent sheets (0 = all cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Fail on missing sources and on insufficient icons
        #[arg(long)]
        strict: bool,

        /// Skip the quality check
        #[arg(long)]
        no_check: bool,

        /// Print the result as JSON on stdout (progress as JSON lines on stderr)
        #[arg(long)]
        json: bool,

        /// Show per-icon output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Slice a single image with a grid given on the command line
    Cut {
        /// Composite image to slice
        image: PathBuf,

        /// One grid row as comma-separated names; repeat for each row, top to bottom
        #[arg(short, long = "row", required = true, value_name = "NAMES")]
        rows: Vec<String>,

        /// Inset percent removed from each cell edge
        #[arg(long, default_value_t = crate::crop::DEFAULT_INSET_PERCENT, value_parser = clap::value_parser!(u32).range(0..=100))]
        inset: u32,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        out: PathBuf,

        /// Exit with an error if any icon is insufficient
        #[arg(long)]
        strict: bool,

        /// Print the result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Show per-icon output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Re-check the size of icons already written to a directory
    Check {
        /// Directory containing .png icons
        dir: PathBuf,

        /// Exit with an error if any icon is insufficient
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show crop geometry for every configured sheet without writing anything
    Plan {
        /// Config file (default: islice.toml found by walking up from the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Inset percent applied to every sheet (overrides config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        inset: Option<u32>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Load the config and the directory its relative paths resolve against.
///
/// Without an explicit path, walks up from the current directory; with no
/// config found, uses the built-in defaults rooted at the current directory.
pub(crate) fn load_project(
    path: Option<&Path>,
) -> Result<(SliceConfig, PathBuf, Option<PathBuf>), ConfigError> {
    let cwd = std::env::current_dir()?;
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => config::find_config(),
    };

    match config_path {
        Some(p) => {
            let config = config::load_config_file(&p)?;
            let root = p
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or(cwd);
            Ok((config, root, Some(p)))
        }
        None => Ok((config::default_config(), cwd, None)),
    }
}

/// Parse the CLI and run the selected command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Slice { config, out, inset, jobs, strict, no_check, json, verbose } => {
            slice::run_slice(
                config.as_deref(),
                out.as_deref(),
                inset,
                jobs,
                strict,
                no_check,
                json,
                verbose,
            )
        }
        Commands::Cut { image, rows, inset, out, strict, json, verbose } => {
            slice::run_cut(&image, &rows, inset, &out, strict, json, verbose)
        }
        Commands::Check { dir, strict, json } => check::run_check(&dir, strict, json),
        Commands::Plan { config, inset, json } => plan::run_plan(config.as_deref(), inset, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cut_rows() {
        let cli = Cli::try_parse_from([
            "islice", "cut", "sheet.png", "--row", "口腔科,眼科", "--row", "耳鼻喉科,皮肤科",
        ])
        .unwrap();
        match cli.command {
            Commands::Cut { rows, inset, out, .. } => {
                assert_eq!(rows, vec!["口腔科,眼科", "耳鼻喉科,皮肤科"]);
                assert_eq!(inset, 5);
                assert_eq!(out, PathBuf::from("output"));
            }
            _ => panic!("expected cut"),
        }
    }

    #[test]
    fn test_inset_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["islice", "slice", "--inset", "101"]).is_err());
        assert!(Cli::try_parse_from(["islice", "cut", "a.png", "--row", "a", "--inset", "150"])
            .is_err());
    }

    #[test]
    fn test_cut_requires_rows() {
        assert!(Cli::try_parse_from(["islice", "cut", "a.png"]).is_err());
    }
}
