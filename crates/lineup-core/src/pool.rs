// Candidate pool: validated, immutable entities for one run.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A selectable player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    /// Roster category (e.g. "QB", "DST").
    pub category: String,
    /// Salary in whole currency units.
    pub cost: u32,
    /// Projected points.
    pub score: f64,
    /// Real-world team, used only by the per-team limit.
    #[serde(default)]
    pub team: Option<String>,
}

impl Entity {
    pub fn new(name: &str, category: &str, cost: u32, score: f64) -> Self {
        Entity {
            name: name.to_string(),
            category: category.to_string(),
            cost,
            score,
            team: None,
        }
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoolError {
    #[error("player '{name}' has an invalid score {score}")]
    InvalidScore { name: String, score: f64 },

    #[error("player '{name}' is listed twice at {category}")]
    DuplicateEntity { category: String, name: String },
}

/// The set of candidates a solve may choose from.
///
/// The same name may appear under several categories (multi-position
/// listings), but each `(category, name)` pair is unique.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    entities: Vec<Entity>,
}

impl CandidatePool {
    pub fn new(entities: Vec<Entity>) -> Result<Self, PoolError> {
        validate(&entities)?;
        Ok(CandidatePool { entities })
    }

    /// Build a pool from entities already known to be valid (a subset of a
    /// validated pool).
    pub(crate) fn from_validated(entities: Vec<Entity>) -> Self {
        CandidatePool { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.entities.iter().any(|e| e.name == name)
    }

    /// Distinct categories in first-appearance order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for e in &self.entities {
            if !out.contains(&e.category.as_str()) {
                out.push(&e.category);
            }
        }
        out
    }

    pub fn count_in(&self, category: &str) -> usize {
        self.entities.iter().filter(|e| e.category == category).count()
    }
}

fn validate(entities: &[Entity]) -> Result<(), PoolError> {
    let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(entities.len());
    for e in entities {
        if !e.score.is_finite() || e.score < 0.0 {
            return Err(PoolError::InvalidScore {
                name: e.name.clone(),
                score: e.score,
            });
        }
        if !seen.insert((e.category.as_str(), e.name.as_str())) {
            return Err(PoolError::DuplicateEntity {
                category: e.category.clone(),
                name: e.name.clone(),
            });
        }
    }
    Ok(())
}
