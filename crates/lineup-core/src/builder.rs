// Constraint model builder: candidate pool + roster shape + exclusion history
// -> linear model.

use std::collections::BTreeMap;

use tracing::debug;

use crate::diversify::{DiversityMode, OptimizerSettings, SCORE_CEILING_EPSILON};
use crate::error::{IneligibleReason, OptimizeError, Warning};
use crate::filter::unique;
use crate::model::{ConstraintKind, Model, Relation, RosterShape, VarId, Variable};
use crate::pool::{CandidatePool, Entity};
use crate::roster::ExclusionHistory;

/// A built model plus warnings discovered while building it.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub model: Model,
    pub warnings: Vec<Warning>,
}

/// Whether an entity can fill a slot at all: its category is required and it
/// fits under the budget on its own.
fn is_eligible(e: &Entity, shape: &RosterShape, budget: u32) -> bool {
    shape.get(&e.category) > 0 && e.cost <= budget
}

/// Fail fast when a required category has fewer eligible candidates than
/// slots. Runs before any solver call.
pub fn check_shape(
    pool: &CandidatePool,
    shape: &RosterShape,
    budget: u32,
) -> Result<(), OptimizeError> {
    shape.validate()?;
    for (category, required) in shape.required() {
        let available = pool
            .iter()
            .filter(|e| e.category == category && is_eligible(e, shape, budget))
            .count();
        if available < required as usize {
            return Err(OptimizeError::UnsatisfiableShape {
                category: category.to_string(),
                required,
                available,
            });
        }
    }
    Ok(())
}

pub struct ModelBuilder<'a> {
    settings: &'a OptimizerSettings,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(settings: &'a OptimizerSettings) -> Self {
        ModelBuilder { settings }
    }

    /// Build the model for one iteration.
    ///
    /// Variables are created category by category in shape order, and in
    /// pool order within a category. That order decides which category a
    /// multi-listed must-include name is pinned to.
    pub fn build(
        &self,
        pool: &CandidatePool,
        shape: &RosterShape,
        must_include: &[String],
        history: &ExclusionHistory,
    ) -> Result<BuildOutput, OptimizeError> {
        let budget = self.settings.budget;
        check_shape(pool, shape, budget)?;

        let mut model = Model::default();
        let mut warnings = Vec::new();

        // Variables, grouped by category for the quota rows.
        let mut by_category: Vec<(&str, u32, Vec<VarId>)> = Vec::new();
        for (category, required) in shape.required() {
            let mut ids = Vec::new();
            for e in pool
                .iter()
                .filter(|e| e.category == category && is_eligible(e, shape, budget))
            {
                ids.push(model.add_variable(Variable {
                    category: e.category.clone(),
                    name: e.name.clone(),
                    cost: e.cost,
                    score: e.score,
                    team: e.team.clone(),
                }));
            }
            by_category.push((category, required, ids));
        }
        let skipped = pool.len() - model.variables().len();
        if skipped > 0 {
            debug!("{} candidates outside the shape or over budget", skipped);
        }

        let objective: Vec<(VarId, f64)> = (0..model.variables().len())
            .map(|i| (VarId(i), model.variables()[i].score))
            .collect();
        model.set_objective(objective.clone());

        let costs: Vec<(VarId, f64)> = (0..model.variables().len())
            .map(|i| (VarId(i), f64::from(model.variables()[i].cost)))
            .collect();
        model.add_constraint(ConstraintKind::Budget, costs, Relation::LessEq, f64::from(budget));

        for (category, required, ids) in &by_category {
            model.add_constraint(
                ConstraintKind::Quota {
                    category: category.to_string(),
                },
                ids.iter().map(|&id| (id, 1.0)).collect(),
                Relation::Equal,
                f64::from(*required),
            );
        }

        self.pin_must_include(&mut model, pool, shape, must_include, &mut warnings)?;
        add_single_use(&mut model);
        if let Some(limit) = self.settings.max_per_team {
            add_team_limits(&mut model, limit);
        }

        match self.settings.diversity {
            DiversityMode::ExcludeRoster => add_uniqueness(&mut model, history),
            DiversityMode::ScoreCeiling => {
                if let Some(lowest) = history.lowest_score() {
                    model.add_constraint(
                        ConstraintKind::ScoreCeiling,
                        objective,
                        Relation::LessEq,
                        lowest - SCORE_CEILING_EPSILON,
                    );
                }
            }
        }

        debug!(
            "model built: {} variables, {} constraints, {} prior rosters",
            model.variables().len(),
            model.constraints().len(),
            history.len()
        );

        Ok(BuildOutput { model, warnings })
    }

    fn pin_must_include(
        &self,
        model: &mut Model,
        pool: &CandidatePool,
        shape: &RosterShape,
        must_include: &[String],
        warnings: &mut Vec<Warning>,
    ) -> Result<(), OptimizeError> {
        let mut pinned_per_category: BTreeMap<String, usize> = BTreeMap::new();

        for name in unique(must_include) {
            let ids = model.find_name(name);
            let Some(&first) = ids.first() else {
                // Names missing from the filtered pool were reported by the filter.
                if pool.contains_name(name) {
                    warnings.push(Warning::MustIncludeIneligible {
                        name: name.to_string(),
                        reason: ineligible_reason(pool, shape, name),
                    });
                }
                continue;
            };
            let pinned_category = model.variable(first).category.clone();
            if ids.len() > 1 {
                let warning = Warning::AmbiguousMustInclude {
                    name: name.to_string(),
                    categories: ids
                        .iter()
                        .map(|&id| model.variable(id).category.clone())
                        .collect(),
                    pinned: pinned_category.clone(),
                };
                warnings.push(warning);
            }

            *pinned_per_category.entry(pinned_category).or_default() += 1;
            model.add_constraint(
                ConstraintKind::MustInclude {
                    name: name.to_string(),
                },
                vec![(first, 1.0)],
                Relation::Equal,
                1.0,
            );
        }

        for (category, pinned) in pinned_per_category {
            let allowed = shape.get(&category);
            if pinned > allowed as usize {
                return Err(OptimizeError::PinnedOverflow {
                    category,
                    pinned,
                    allowed,
                });
            }
        }
        Ok(())
    }
}

/// Over budget wins when some listing of `name` is in a required category.
fn ineligible_reason(pool: &CandidatePool, shape: &RosterShape, name: &str) -> IneligibleReason {
    let in_shape = pool
        .iter()
        .any(|e| e.name == name && shape.get(&e.category) > 0);
    if in_shape {
        IneligibleReason::OverBudget
    } else {
        IneligibleReason::CategoryNotInShape
    }
}

fn add_single_use(model: &mut Model) {
    let mut by_name: BTreeMap<String, Vec<VarId>> = BTreeMap::new();
    for (i, v) in model.variables().iter().enumerate() {
        by_name.entry(v.name.clone()).or_default().push(VarId(i));
    }
    for (name, ids) in by_name.into_iter().filter(|(_, ids)| ids.len() > 1) {
        model.add_constraint(
            ConstraintKind::SingleUse { name },
            ids.into_iter().map(|id| (id, 1.0)).collect(),
            Relation::LessEq,
            1.0,
        );
    }
}

fn add_team_limits(model: &mut Model, limit: u32) {
    let mut by_team: BTreeMap<String, Vec<VarId>> = BTreeMap::new();
    for (i, v) in model.variables().iter().enumerate() {
        if let Some(team) = &v.team {
            by_team.entry(team.clone()).or_default().push(VarId(i));
        }
    }
    for (team, ids) in by_team
        .into_iter()
        .filter(|(_, ids)| ids.len() > limit as usize)
    {
        model.add_constraint(
            ConstraintKind::TeamLimit { team },
            ids.into_iter().map(|id| (id, 1.0)).collect(),
            Relation::LessEq,
            f64::from(limit),
        );
    }
}

/// Σ x over a prior roster's picks ≤ |roster| − 1. Partial overlap stays
/// allowed; only the exact roster is cut off.
fn add_uniqueness(model: &mut Model, history: &ExclusionHistory) {
    for (index, prior) in history.iter().enumerate() {
        let terms: Vec<(VarId, f64)> = prior
            .iter()
            .filter_map(|(category, name)| model.find(category, name))
            .map(|id| (id, 1.0))
            .collect();
        if terms.len() < prior.len() {
            // Some pick no longer has a variable, so the roster cannot recur.
            continue;
        }
        let rhs = (prior.len() as f64) - 1.0;
        model.add_constraint(
            ConstraintKind::Uniqueness { roster: index },
            terms,
            Relation::LessEq,
            rhs,
        );
    }
}
