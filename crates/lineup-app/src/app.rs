// Application flow: load players, optimize every shape, write the results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use lineup_core::{GoodLpSolver, Solver};
use tracing::{info, warn};

use crate::config::Config;
use crate::input;
use crate::output::{self, MergedRecord, RunSummary, ShapeSummary};
use crate::runner::{self, DeadlineSolver, RunContext, ShapeResult};

/// Everything a run produced, for the caller to display.
#[derive(Debug)]
pub struct RunOutput {
    pub shapes: Vec<ShapeResult>,
    pub merged: Vec<MergedRecord>,
    pub files: Vec<PathBuf>,
}

/// Build the solver stack from config: good_lp, optionally behind a deadline.
pub fn build_solver(config: &Config) -> Arc<dyn Solver> {
    match config.optimizer.solve_timeout() {
        Some(timeout) => Arc::new(DeadlineSolver::new(GoodLpSolver, timeout)),
        None => Arc::new(GoodLpSolver),
    }
}

/// Run the whole pipeline with paths relative to `base_dir`.
pub async fn run(config: &Config, base_dir: &Path) -> anyhow::Result<RunOutput> {
    let input_path = base_dir.join(&config.input.path);
    let pool = input::load_pool(&input_path)
        .with_context(|| format!("failed to load players from {}", input_path.display()))?;
    info!("Loaded {} players from {}", pool.len(), input_path.display());

    let ctx = RunContext {
        pool: Arc::new(pool),
        policy: Arc::new(config.filter.clone()),
        settings: Arc::new(config.optimizer.settings()),
        solver: build_solver(config),
    };
    let shapes = runner::run_shapes(&ctx, &config.shapes).await;

    let out_dir = base_dir.join(&config.output.dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut files = Vec::new();
    for shape in &shapes {
        if let Ok(report) = &shape.outcome {
            let path = output::write_shape_csv(&out_dir, &shape.name, &report.rosters)?;
            files.push(path);
        }
    }

    let merged = output::merge_sorted(shapes.iter().filter_map(|s| {
        s.outcome
            .as_ref()
            .ok()
            .map(|r| (s.name.as_str(), r.rosters.as_slice()))
    }));
    if merged.is_empty() {
        warn!("no lineups were produced");
    }
    let combined = out_dir.join(&config.output.combined_file);
    output::write_combined_csv(&combined, &merged)?;
    files.push(combined);

    if let Some(json_file) = &config.output.json_file {
        let path = out_dir.join(json_file);
        output::write_json(&path, &summarize(config, &shapes))?;
        files.push(path);
    }

    info!("Wrote {} output files", files.len());
    Ok(RunOutput {
        shapes,
        merged,
        files,
    })
}

fn summarize<'a>(config: &Config, shapes: &'a [ShapeResult]) -> RunSummary<'a> {
    RunSummary {
        generated_at: Utc::now(),
        budget: config.optimizer.budget,
        shapes: shapes
            .iter()
            .map(|s| match &s.outcome {
                Ok(report) => ShapeSummary {
                    name: &s.name,
                    termination: Some(&report.termination),
                    error: None,
                    warnings: &report.warnings,
                    rosters: &report.rosters,
                },
                Err(e) => ShapeSummary {
                    name: &s.name,
                    termination: None,
                    error: Some(e.to_string()),
                    warnings: &[],
                    rosters: &[],
                },
            })
            .collect(),
    }
}
