// Rosters produced by the optimizer and the exclusion history built from them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::solver::Assignment;

/// One chosen player in a roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub category: String,
    pub name: String,
    pub cost: u32,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// The result of one successful solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// 1-based iteration that produced this roster.
    pub index: usize,
    /// Picks ordered by category, then by pool order.
    pub picks: Vec<Pick>,
    pub total_cost: u32,
    pub total_score: f64,
}

impl Roster {
    /// Materialize the picks selected in `assignment`. Totals are summed from
    /// the model's typed variable data.
    pub fn from_assignment(index: usize, model: &Model, assignment: &Assignment) -> Self {
        let picks: Vec<Pick> = assignment
            .selected_ids()
            .map(|id| {
                let v = model.variable(id);
                Pick {
                    category: v.category.clone(),
                    name: v.name.clone(),
                    cost: v.cost,
                    score: v.score,
                    team: v.team.clone(),
                }
            })
            .collect();
        Roster::from_picks(index, picks)
    }

    pub fn from_picks(index: usize, picks: Vec<Pick>) -> Self {
        let total_cost = picks.iter().map(|p| p.cost).sum();
        let total_score = picks.iter().map(|p| p.score).sum();
        Roster {
            index,
            picks,
            total_cost,
            total_score,
        }
    }

    /// The roster's identity: its set of `(category, name)` pairs.
    pub fn key(&self) -> BTreeSet<(String, String)> {
        self.picks
            .iter()
            .map(|p| (p.category.clone(), p.name.clone()))
            .collect()
    }

    pub fn count_in(&self, category: &str) -> usize {
        self.picks.iter().filter(|p| p.category == category).count()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.picks.iter().any(|p| p.name == name)
    }
}

/// Rosters already produced for one shape, in production order. Only grows.
#[derive(Debug, Clone, Default)]
pub struct ExclusionHistory {
    rosters: Vec<BTreeSet<(String, String)>>,
    lowest_score: Option<f64>,
}

impl ExclusionHistory {
    pub fn push(&mut self, roster: &Roster) {
        self.rosters.push(roster.key());
        self.lowest_score = Some(match self.lowest_score {
            Some(s) => s.min(roster.total_score),
            None => roster.total_score,
        });
    }

    pub fn len(&self) -> usize {
        self.rosters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rosters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BTreeSet<(String, String)>> {
        self.rosters.iter()
    }

    pub fn lowest_score(&self) -> Option<f64> {
        self.lowest_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(category: &str, name: &str, cost: u32, score: f64) -> Pick {
        Pick {
            category: category.into(),
            name: name.into(),
            cost,
            score,
            team: None,
        }
    }

    #[test]
    fn totals_are_summed_from_picks() {
        let r = Roster::from_picks(
            1,
            vec![
                pick("DST", "DST1", 3000, 7.0),
                pick("QB", "QB1", 6000, 20.0),
                pick("RB", "RB1", 7000, 22.0),
            ],
        );
        assert_eq!(r.total_cost, 16000);
        assert!((r.total_score - 49.0).abs() < 1e-9);
        assert_eq!(r.count_in("QB"), 1);
        assert!(r.contains_name("RB1"));
    }

    #[test]
    fn history_tracks_lowest_score() {
        let mut h = ExclusionHistory::default();
        assert!(h.lowest_score().is_none());
        h.push(&Roster::from_picks(1, vec![pick("QB", "A", 1, 20.0)]));
        h.push(&Roster::from_picks(2, vec![pick("QB", "B", 1, 18.0)]));
        h.push(&Roster::from_picks(3, vec![pick("QB", "C", 1, 19.0)]));
        assert_eq!(h.len(), 3);
        assert_eq!(h.lowest_score(), Some(18.0));
    }
}
