// Library root: the constrained lineup optimizer.
//
// Pipeline per roster shape: filter the candidate pool, then run the
// diversification loop (build model -> solve -> extract roster) until the
// candidate space is exhausted or the roster cap is reached.

pub mod builder;
pub mod diversify;
pub mod error;
pub mod filter;
pub mod model;
pub mod pool;
pub mod roster;
pub mod solver;

pub use builder::{check_shape, BuildOutput, ModelBuilder};
pub use diversify::{
    DiversityMode, Diversifier, LoopReport, OptimizerSettings, Termination, DEFAULT_MAX_ROSTERS,
};
pub use error::{IneligibleReason, NameList, OptimizeError, Warning};
pub use filter::{FilterOutcome, FilterPolicy};
pub use model::{Constraint, ConstraintKind, Model, Relation, RosterShape, VarId};
pub use pool::{CandidatePool, Entity, PoolError};
pub use roster::{ExclusionHistory, Pick, Roster};
pub use solver::{Assignment, GoodLpSolver, SolveOutcome, Solver, SolverError};
