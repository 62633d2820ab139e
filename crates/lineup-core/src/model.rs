// Linear model handed from the builder to a solver.
//
// The model is plain data: binary variables, a linear objective to maximize,
// and labelled linear constraints. Each iteration of the diversification
// loop builds a fresh one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;

// ---------------------------------------------------------------------------
// Roster shape
// ---------------------------------------------------------------------------

/// Required player count per category, iterated in category-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterShape(BTreeMap<String, u32>);

impl RosterShape {
    pub fn new(counts: BTreeMap<String, u32>) -> Self {
        RosterShape(counts)
    }

    pub fn get(&self, category: &str) -> u32 {
        self.0.get(category).copied().unwrap_or(0)
    }

    /// Categories with a positive requirement.
    pub fn required(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.0
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(c, n)| (c.as_str(), *n))
    }

    /// Total slots, or `None` when the counts overflow `u32`.
    pub fn total(&self) -> Option<u32> {
        self.0.values().try_fold(0u32, |acc, &n| acc.checked_add(n))
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        match self.total() {
            None => Err(OptimizeError::InvalidShape(
                "category counts add up to more than a roster can hold".into(),
            )),
            Some(0) => Err(OptimizeError::InvalidShape(
                "at least one category needs a positive count".into(),
            )),
            Some(_) => Ok(()),
        }
    }
}

impl<'a> FromIterator<(&'a str, u32)> for RosterShape {
    fn from_iter<I: IntoIterator<Item = (&'a str, u32)>>(iter: I) -> Self {
        RosterShape(iter.into_iter().map(|(c, n)| (c.to_string(), n)).collect())
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Index of a decision variable within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// One binary decision: pick `name` for a `category` slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub category: String,
    pub name: String,
    pub cost: u32,
    pub score: f64,
    pub team: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    Equal,
    GreaterEq,
}

/// What a constraint row enforces. Used for logging and tests only; solvers
/// treat every row the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    Budget,
    Quota { category: String },
    MustInclude { name: String },
    /// Forbids the exact roster at this position in the exclusion history.
    Uniqueness { roster: usize },
    ScoreCeiling,
    TeamLimit { team: String },
    /// A name listed under several categories is picked at most once.
    SingleUse { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub terms: Vec<(VarId, f64)>,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    /// Evaluate the row against a 0/1 selection indexed by variable.
    pub fn is_satisfied_by(&self, selected: &[bool]) -> bool {
        const TOL: f64 = 1e-6;
        let lhs: f64 = self
            .terms
            .iter()
            .filter(|(id, _)| selected.get(id.0).copied().unwrap_or(false))
            .map(|(_, coeff)| coeff)
            .sum();
        match self.relation {
            Relation::LessEq => lhs <= self.rhs + TOL,
            Relation::Equal => (lhs - self.rhs).abs() <= TOL,
            Relation::GreaterEq => lhs + TOL >= self.rhs,
        }
    }
}

/// A maximization problem over binary variables.
#[derive(Debug, Clone, Default)]
pub struct Model {
    variables: Vec<Variable>,
    objective: Vec<(VarId, f64)>,
    constraints: Vec<Constraint>,
}

impl Model {
    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    pub fn set_objective(&mut self, terms: Vec<(VarId, f64)>) {
        self.objective = terms;
    }

    pub fn add_constraint(
        &mut self,
        kind: ConstraintKind,
        terms: Vec<(VarId, f64)>,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            kind,
            terms,
            relation,
            rhs,
        });
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The variable for a `(category, name)` pair, if it exists.
    pub fn find(&self, category: &str, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.category == category && v.name == name)
            .map(VarId)
    }

    /// All variables carrying `name`, in variable order.
    pub fn find_name(&self, name: &str) -> Vec<VarId> {
        self.variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.name == name)
            .map(|(i, _)| VarId(i))
            .collect()
    }

    pub fn constraints_where<F>(&self, pred: F) -> impl Iterator<Item = &Constraint>
    where
        F: Fn(&ConstraintKind) -> bool,
    {
        self.constraints.iter().filter(move |c| pred(&c.kind))
    }

    /// True when `selected` satisfies every constraint.
    pub fn is_feasible(&self, selected: &[bool]) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied_by(selected))
    }

    pub fn objective_value(&self, selected: &[bool]) -> f64 {
        self.objective
            .iter()
            .filter(|(id, _)| selected.get(id.0).copied().unwrap_or(false))
            .map(|(_, coeff)| coeff)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_iterates_in_category_order_and_skips_zero() {
        let shape: RosterShape = [("WR", 3), ("QB", 1), ("K", 0), ("DST", 1)]
            .into_iter()
            .collect();
        let required: Vec<_> = shape.required().collect();
        assert_eq!(required, vec![("DST", 1), ("QB", 1), ("WR", 3)]);
        assert_eq!(shape.total(), Some(5));
        assert_eq!(shape.get("K"), 0);
        assert_eq!(shape.get("TE"), 0);
    }

    #[test]
    fn all_zero_shape_is_invalid() {
        let shape: RosterShape = [("QB", 0)].into_iter().collect();
        assert!(matches!(shape.validate(), Err(OptimizeError::InvalidShape(_))));
    }

    #[test]
    fn overflowing_shape_is_invalid() {
        let shape: RosterShape = [("QB", u32::MAX), ("RB", 1)].into_iter().collect();
        assert_eq!(shape.total(), None);
        assert!(matches!(shape.validate(), Err(OptimizeError::InvalidShape(_))));
    }

    #[test]
    fn constraint_evaluation() {
        let c = Constraint {
            kind: ConstraintKind::Budget,
            terms: vec![(VarId(0), 6000.0), (VarId(1), 7000.0)],
            relation: Relation::LessEq,
            rhs: 12000.0,
        };
        assert!(c.is_satisfied_by(&[true, false]));
        assert!(!c.is_satisfied_by(&[true, true]));

        let q = Constraint {
            kind: ConstraintKind::Quota {
                category: "QB".into(),
            },
            terms: vec![(VarId(0), 1.0), (VarId(1), 1.0)],
            relation: Relation::Equal,
            rhs: 1.0,
        };
        assert!(q.is_satisfied_by(&[false, true]));
        assert!(!q.is_satisfied_by(&[false, false]));
    }

    #[test]
    fn find_by_category_and_name() {
        let mut m = Model::default();
        let a = m.add_variable(Variable {
            category: "QB".into(),
            name: "Taysom Hill".into(),
            cost: 4000,
            score: 9.0,
            team: None,
        });
        let b = m.add_variable(Variable {
            category: "TE".into(),
            name: "Taysom Hill".into(),
            cost: 4000,
            score: 9.0,
            team: None,
        });
        assert_eq!(m.find("TE", "Taysom Hill"), Some(b));
        assert_eq!(m.find_name("Taysom Hill"), vec![a, b]);
        assert_eq!(m.find("RB", "Taysom Hill"), None);
    }
}
