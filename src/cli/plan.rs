//! Plan command implementation - prints crop geometry without cutting

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{merge_cli_overrides, CliOverrides, SliceConfig};
use crate::crop::{plan_cells, CellGeometry, PlannedCell};

use super::{load_project, EXIT_ERROR, EXIT_SUCCESS};

/// Geometry of one sheet, or why it could not be computed.
#[derive(Debug, Serialize)]
struct SheetPlan {
    sheet: String,
    source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    geometry: Option<CellGeometry>,
    /// Unused pixels on the right and bottom edges
    #[serde(skip_serializing_if = "Option::is_none")]
    discarded: Option<(u32, u32)>,
    cells: Vec<PlannedCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn plan_sheets(config: &SliceConfig, root: &Path) -> Vec<SheetPlan> {
    config
        .sheets
        .iter()
        .map(|sheet| {
            let source = sheet.resolved_source(root);
            let mut plan = SheetPlan {
                sheet: sheet.display_name(),
                source: source.clone(),
                geometry: None,
                discarded: None,
                cells: vec![],
                error: None,
            };

            let grid = match sheet.grid_descriptor() {
                Ok(grid) => grid,
                Err(e) => {
                    plan.error = Some(e.to_string());
                    return plan;
                }
            };
            let (width, height) = match image::image_dimensions(&source) {
                Ok(dims) => dims,
                Err(e) => {
                    plan.error = Some(format!("cannot read {}: {}", source.display(), e));
                    return plan;
                }
            };

            let inset = config.effective_inset(sheet);
            let geometry = CellGeometry::compute(width, height, &grid, inset);
            plan.discarded = Some(geometry.discarded());
            plan.geometry = Some(geometry);
            match plan_cells(width, height, &grid, inset) {
                Ok(cells) => plan.cells = cells,
                Err(e) => plan.error = Some(e.to_string()),
            }
            plan
        })
        .collect()
}

/// Execute the plan command
pub fn run_plan(config_path: Option<&Path>, inset: Option<u32>, json: bool) -> ExitCode {
    let (mut config, root, _) = match load_project(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    merge_cli_overrides(&mut config, &CliOverrides { inset, ..Default::default() });

    let plans = plan_sheets(&config, &root);
    let failed = plans.iter().any(|p| p.error.is_some());

    if json {
        match serde_json::to_string_pretty(&plans) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        for plan in &plans {
            println!("{} ({})", plan.sheet, plan.source.display());
            if let Some(g) = &plan.geometry {
                println!(
                    "  image {}x{}, grid {}x{} (rows x cols)",
                    g.image_width, g.image_height, g.rows, g.cols
                );
                println!(
                    "  cell {}x{}, inset {}% = {}px/{}px",
                    g.cell_width, g.cell_height, g.inset_percent, g.pad_x, g.pad_y
                );
            }
            if let Some((dx, dy)) = plan.discarded {
                if dx > 0 || dy > 0 {
                    println!("  discarded margin: {}px right, {}px bottom", dx, dy);
                }
            }
            for cell in &plan.cells {
                println!(
                    "  [{},{}] {} {} -> {}x{}",
                    cell.row,
                    cell.col,
                    cell.name,
                    cell.rect,
                    cell.rect.width(),
                    cell.rect.height()
                );
            }
            if let Some(error) = &plan.error {
                println!("  error: {}", error);
            }
        }
    }

    if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
