// Player filter: only-use / exclude / must-include policy applied before
// any model is built.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{NameList, OptimizeError, Warning};
use crate::pool::{CandidatePool, Entity};

/// Name lists that restrict the candidate pool. All default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPolicy {
    #[serde(default)]
    pub must_include: Vec<String>,
    #[serde(default)]
    pub only_use: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl FilterPolicy {
    pub fn is_empty(&self) -> bool {
        self.must_include.is_empty() && self.only_use.is_empty() && self.exclude.is_empty()
    }
}

/// The filtered pool plus everything worth telling the user about it.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub pool: CandidatePool,
    pub warnings: Vec<Warning>,
}

/// Apply `policy` to `pool`.
///
/// Order is fixed: restrict to only-use (when non-empty), then drop excluded
/// names, then check that must-include names survived. Missing names are
/// warnings; only an empty result is an error.
pub fn apply(pool: &CandidatePool, policy: &FilterPolicy) -> Result<FilterOutcome, OptimizeError> {
    let mut warnings = Vec::new();

    let lists = [
        (NameList::MustInclude, &policy.must_include),
        (NameList::OnlyUse, &policy.only_use),
        (NameList::Exclude, &policy.exclude),
    ];
    for (list, names) in lists {
        for name in unique(names) {
            if !pool.contains_name(name) {
                push_warning(
                    &mut warnings,
                    Warning::NameNotFound {
                        list,
                        name: name.to_string(),
                    },
                );
            }
        }
    }

    let only_use: HashSet<&str> = policy.only_use.iter().map(String::as_str).collect();
    let exclude: HashSet<&str> = policy.exclude.iter().map(String::as_str).collect();

    let kept: Vec<Entity> = pool
        .iter()
        .filter(|e| only_use.is_empty() || only_use.contains(e.name.as_str()))
        .filter(|e| !exclude.contains(e.name.as_str()))
        .cloned()
        .collect();
    let filtered = CandidatePool::from_validated(kept);

    // Names absent from the original pool were already reported above.
    for name in unique(&policy.must_include) {
        if pool.contains_name(name) && !filtered.contains_name(name) {
            push_warning(
                &mut warnings,
                Warning::MustIncludeFiltered {
                    name: name.to_string(),
                },
            );
        }
    }

    if filtered.is_empty() {
        warn!("player pool is empty after filtering ({} candidates before)", pool.len());
        return Err(OptimizeError::EmptyPool);
    }

    Ok(FilterOutcome {
        pool: filtered,
        warnings,
    })
}

/// Names in first-seen order with duplicates dropped.
pub(crate) fn unique(names: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .filter(|n| seen.insert(*n))
        .collect()
}

fn push_warning(warnings: &mut Vec<Warning>, warning: Warning) {
    warn!("{}", warning);
    warnings.push(warning);
}
