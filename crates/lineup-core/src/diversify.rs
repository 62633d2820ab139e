// Diversification loop: repeatedly solve, forbidding each roster already
// produced, until the candidate space runs out or the roster cap is hit.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::builder::ModelBuilder;
use crate::error::{OptimizeError, Warning};
use crate::filter::{self, FilterPolicy};
use crate::model::RosterShape;
use crate::pool::CandidatePool;
use crate::roster::{ExclusionHistory, Roster};
use crate::solver::{SolveOutcome, Solver};

pub const DEFAULT_MAX_ROSTERS: usize = 10;

/// Margin below the lowest prior score in `ScoreCeiling` mode.
pub const SCORE_CEILING_EPSILON: f64 = 0.001;

/// How successive rosters are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityMode {
    /// Forbid each prior roster's exact set of picks.
    #[default]
    ExcludeRoster,
    /// Require every new roster to score strictly below all prior ones.
    /// Equal-scoring alternatives are skipped.
    ScoreCeiling,
}

/// Per-invocation optimizer knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    pub budget: u32,
    pub max_rosters: usize,
    pub diversity: DiversityMode,
    /// Cap on picks sharing a real-world team. `None` disables the limit.
    pub max_per_team: Option<u32>,
}

impl OptimizerSettings {
    pub fn new(budget: u32) -> Self {
        OptimizerSettings {
            budget,
            max_rosters: DEFAULT_MAX_ROSTERS,
            diversity: DiversityMode::default(),
            max_per_team: None,
        }
    }
}

/// Why a loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Termination {
    /// The solver found no further feasible roster.
    Exhausted,
    /// `max_rosters` rosters were produced.
    IterationCap,
    /// A solve exceeded the caller's deadline.
    TimedOut,
    /// The solver backend errored; rosters found before it are kept.
    SolverFailed(String),
}

/// Everything one loop produced.
#[derive(Debug, Clone)]
pub struct LoopReport {
    /// In production order. Not sorted by score.
    pub rosters: Vec<Roster>,
    pub warnings: Vec<Warning>,
    pub termination: Termination,
}

pub struct Diversifier<'a, S: Solver + ?Sized> {
    settings: &'a OptimizerSettings,
    solver: &'a S,
}

impl<'a, S: Solver + ?Sized> Diversifier<'a, S> {
    pub fn new(settings: &'a OptimizerSettings, solver: &'a S) -> Self {
        Diversifier { settings, solver }
    }

    /// Filter the pool with `policy`, then run the loop for `shape`.
    pub fn run(
        &self,
        pool: &CandidatePool,
        shape: &RosterShape,
        policy: &FilterPolicy,
    ) -> Result<LoopReport, OptimizeError> {
        shape.validate()?;
        let filtered = filter::apply(pool, policy)?;
        let mut report = self.run_filtered(&filtered.pool, shape, &policy.must_include)?;

        let mut warnings = filtered.warnings;
        warnings.append(&mut report.warnings);
        report.warnings = warnings;
        Ok(report)
    }

    /// Run the loop on an already-filtered pool.
    ///
    /// Shape problems surface as errors before the first solve. Solver
    /// infeasibility is the normal exit, not an error.
    pub fn run_filtered(
        &self,
        pool: &CandidatePool,
        shape: &RosterShape,
        must_include: &[String],
    ) -> Result<LoopReport, OptimizeError> {
        let builder = ModelBuilder::new(self.settings);
        let mut history = ExclusionHistory::default();
        let mut rosters: Vec<Roster> = Vec::new();
        let mut warnings = Vec::new();
        let mut iteration = 1;

        let termination = loop {
            if iteration > self.settings.max_rosters {
                break Termination::IterationCap;
            }

            let built = builder.build(pool, shape, must_include, &history)?;
            if iteration == 1 {
                for w in &built.warnings {
                    warn!("{}", w);
                }
                warnings = built.warnings;
            }
            let model = built.model;

            match self.solver.solve(&model) {
                Ok(SolveOutcome::Optimal(assignment)) if !assignment.is_empty() => {
                    let roster = Roster::from_assignment(iteration, &model, &assignment);
                    debug!(
                        "roster {}: cost {} score {:.2}",
                        iteration, roster.total_cost, roster.total_score
                    );
                    history.push(&roster);
                    rosters.push(roster);
                    iteration += 1;
                }
                Ok(SolveOutcome::Optimal(_)) | Ok(SolveOutcome::Infeasible) => {
                    break Termination::Exhausted;
                }
                Ok(SolveOutcome::TimedOut) => {
                    warn!("solve {} timed out; stopping this shape", iteration);
                    break Termination::TimedOut;
                }
                Err(e) => {
                    warn!("solve {} failed: {}", iteration, e);
                    break Termination::SolverFailed(e.to_string());
                }
            }
        };

        info!("produced {} rosters ({:?})", rosters.len(), termination);

        Ok(LoopReport {
            rosters,
            warnings,
            termination,
        })
    }
}
