// Solver adapter: the contract to a 0/1 integer program solver and its
// good_lp implementation.

use good_lp::{
    microlp, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable as LpVariable,
};
use thiserror::Error;
use tracing::debug;

use crate::model::{Model, Relation, VarId};

/// Which variables a solver set to 1, indexed by `VarId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    selected: Vec<bool>,
}

impl Assignment {
    pub fn new(selected: Vec<bool>) -> Self {
        Assignment { selected }
    }

    /// Round relaxed solver values to 0/1.
    pub fn from_values(values: &[f64]) -> Self {
        Assignment {
            selected: values.iter().map(|&v| v > 0.5).collect(),
        }
    }

    pub fn is_selected(&self, id: VarId) -> bool {
        self.selected.get(id.0).copied().unwrap_or(false)
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = VarId> + '_ {
        self.selected
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| VarId(i))
    }

    /// True when no variable is set.
    pub fn is_empty(&self) -> bool {
        !self.selected.iter().any(|&on| on)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.selected
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Optimal(Assignment),
    Infeasible,
    /// The caller's deadline passed; treated like `Infeasible` by the loop.
    TimedOut,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("solver backend failed: {0}")]
    Backend(String),

    #[error("solver worker exited without a result")]
    WorkerLost,
}

/// Maximize a model over binary variables.
///
/// Ties between equally good assignments are broken however the
/// implementation likes; callers must not rely on a particular choice.
pub trait Solver: Send + Sync {
    fn solve(&self, model: &Model) -> Result<SolveOutcome, SolverError>;
}

/// Branch-and-bound through good_lp's pure-Rust microlp backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl Solver for GoodLpSolver {
    fn solve(&self, model: &Model) -> Result<SolveOutcome, SolverError> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<LpVariable> = model
            .variables()
            .iter()
            .map(|_| vars.add(variable().binary()))
            .collect();

        let mut objective = Expression::with_capacity(model.objective().len());
        for &(id, coeff) in model.objective() {
            objective.add_mul(coeff, handles[id.0]);
        }

        let mut problem = vars.maximise(objective).using(microlp);
        for c in model.constraints() {
            let mut lhs = Expression::with_capacity(c.terms.len());
            for &(id, coeff) in &c.terms {
                lhs.add_mul(coeff, handles[id.0]);
            }
            let row = match c.relation {
                Relation::LessEq => lhs.leq(c.rhs),
                Relation::Equal => lhs.eq(c.rhs),
                Relation::GreaterEq => lhs.geq(c.rhs),
            };
            problem = problem.with(row);
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = handles.iter().map(|&v| solution.value(v)).collect();
                Ok(SolveOutcome::Optimal(Assignment::from_values(&values)))
            }
            Err(ResolutionError::Infeasible) => {
                debug!("model infeasible");
                Ok(SolveOutcome::Infeasible)
            }
            Err(e) => Err(SolverError::Backend(e.to_string())),
        }
    }
}
