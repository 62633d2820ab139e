// Shape runner: one diversification loop per roster shape, run in parallel on
// the blocking pool, with an optional per-solve deadline.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use lineup_core::filter::{self, FilterOutcome};
use lineup_core::model::Model;
use lineup_core::{
    CandidatePool, Diversifier, FilterPolicy, LoopReport, OptimizeError, OptimizerSettings,
    RosterShape, SolveOutcome, Solver, SolverError,
};
use thiserror::Error;
use tracing::{error, info, info_span, warn};

// ---------------------------------------------------------------------------
// Deadline wrapper
// ---------------------------------------------------------------------------

/// Runs each solve on a worker thread and gives up after `timeout`.
///
/// A solve that overruns is reported as `SolveOutcome::TimedOut`. The worker
/// is detached and its late result discarded.
pub struct DeadlineSolver<S> {
    inner: Arc<S>,
    timeout: Duration,
}

impl<S> DeadlineSolver<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        DeadlineSolver {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

impl<S: Solver + 'static> Solver for DeadlineSolver<S> {
    fn solve(&self, model: &Model) -> Result<SolveOutcome, SolverError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let model = model.clone();
        std::thread::Builder::new()
            .name("lineup-solve".into())
            .spawn(move || {
                // The receiver is gone if the deadline already passed.
                let _ = tx.send(inner.solve(&model));
            })
            .map_err(|e| SolverError::Backend(format!("failed to spawn solver thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!("solve exceeded {:?}", self.timeout);
                Ok(SolveOutcome::TimedOut)
            }
            Err(RecvTimeoutError::Disconnected) => Err(SolverError::WorkerLost),
        }
    }
}

// ---------------------------------------------------------------------------
// Parallel shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error("shape worker failed: {0}")]
    Worker(String),
}

/// What one shape produced, or why it produced nothing.
#[derive(Debug)]
pub struct ShapeResult {
    pub name: String,
    pub outcome: Result<LoopReport, ShapeError>,
}

/// Read-only inputs shared by every shape's loop.
#[derive(Clone)]
pub struct RunContext {
    pub pool: Arc<CandidatePool>,
    pub policy: Arc<FilterPolicy>,
    pub settings: Arc<OptimizerSettings>,
    pub solver: Arc<dyn Solver>,
}

/// Run every shape concurrently. Results come back in shape-name order; a
/// failing shape never affects the others.
///
/// The filter policy is applied once up front. Its warnings are logged once
/// and copied into every shape's report.
pub async fn run_shapes(ctx: &RunContext, shapes: &BTreeMap<String, RosterShape>) -> Vec<ShapeResult> {
    let filtered = match filter::apply(&ctx.pool, &ctx.policy) {
        Ok(outcome) => Arc::new(outcome),
        Err(e) => {
            warn!("no shapes run: {}", e);
            return shapes
                .keys()
                .map(|name| ShapeResult {
                    name: name.clone(),
                    outcome: Err(ShapeError::Optimize(e.clone())),
                })
                .collect();
        }
    };

    let mut handles = Vec::with_capacity(shapes.len());
    for (name, shape) in shapes {
        let ctx = ctx.clone();
        let filtered = Arc::clone(&filtered);
        let shape = shape.clone();
        let span_name = name.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _span = info_span!("shape", name = %span_name).entered();
            run_one(&ctx, &filtered, &shape)
        });
        handles.push((name.clone(), handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let outcome = match handle.await {
            Ok(Ok(report)) => {
                info!(
                    "shape '{}': {} rosters ({:?})",
                    name,
                    report.rosters.len(),
                    report.termination
                );
                Ok(report)
            }
            Ok(Err(e)) => {
                warn!("shape '{}' skipped: {}", name, e);
                Err(ShapeError::Optimize(e))
            }
            Err(e) => {
                error!("shape '{}' worker failed: {}", name, e);
                Err(ShapeError::Worker(e.to_string()))
            }
        };
        results.push(ShapeResult { name, outcome });
    }
    results
}

fn run_one(
    ctx: &RunContext,
    filtered: &FilterOutcome,
    shape: &RosterShape,
) -> Result<LoopReport, OptimizeError> {
    shape.validate()?;
    let mut report = Diversifier::new(&ctx.settings, ctx.solver.as_ref()).run_filtered(
        &filtered.pool,
        shape,
        &ctx.policy.must_include,
    )?;
    let mut warnings = filtered.warnings.clone();
    warnings.append(&mut report.warnings);
    report.warnings = warnings;
    Ok(report)
}
