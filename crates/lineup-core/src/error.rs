// Shape-level failures and the non-fatal warnings surfaced before solving.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Conditions that stop optimization for one roster shape. None of these are
/// fatal to sibling shapes; the caller logs them and moves on.
///
/// `PinnedOverflow` is raised while building the model rather than left for
/// the solver to report as infeasible. The shape is skipped outright, so no
/// per-shape output is written for it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("candidate pool is empty after filtering")]
    EmptyPool,

    #[error("category `{category}` requires {required} players but only {available} are eligible")]
    UnsatisfiableShape {
        category: String,
        required: u32,
        available: usize,
    },

    #[error("must-include pins {pinned} players in `{category}` but the shape only allows {allowed}")]
    PinnedOverflow {
        category: String,
        pinned: usize,
        allowed: u32,
    },

    #[error("invalid roster shape: {0}")]
    InvalidShape(String),
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Which filter list a name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameList {
    MustInclude,
    OnlyUse,
    Exclude,
}

impl fmt::Display for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NameList::MustInclude => "must-include",
            NameList::OnlyUse => "only-use",
            NameList::Exclude => "exclude",
        };
        f.write_str(label)
    }
}

/// Informational findings. They are reported to the caller and never halt
/// processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A requested name does not exist in the original pool.
    NameNotFound { list: NameList, name: String },
    /// A must-include name existed in the pool but was removed by only-use or
    /// exclude.
    MustIncludeFiltered { name: String },
    /// A must-include name is listed under several categories; only the
    /// first is pinned.
    AmbiguousMustInclude {
        name: String,
        categories: Vec<String>,
        pinned: String,
    },
    /// A must-include name survived the filter but cannot fill any slot in
    /// this shape, so it is not pinned.
    MustIncludeIneligible {
        name: String,
        reason: IneligibleReason,
    },
}

/// Why a pooled entity got no decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    CategoryNotInShape,
    OverBudget,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::CategoryNotInShape => f.write_str("its category is not in the shape"),
            IneligibleReason::OverBudget => f.write_str("its cost exceeds the budget"),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NameNotFound { list, name } => {
                write!(f, "{list} player '{name}' not found in the player pool")
            }
            Warning::MustIncludeFiltered { name } => {
                write!(f, "must-include player '{name}' was removed by the filter")
            }
            Warning::AmbiguousMustInclude {
                name,
                categories,
                pinned,
            } => write!(
                f,
                "must-include player '{name}' is listed at {}; pinning at {pinned}",
                categories.join("/")
            ),
            Warning::MustIncludeIneligible { name, reason } => {
                write!(f, "must-include player '{name}' cannot be pinned: {reason}")
            }
        }
    }
}
