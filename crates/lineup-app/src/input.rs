// Player CSV loading and normalization.
//
// Accepts both the DraftKings export layout (Player, DK Position, DK Salary,
// DK Projection) and the plain playoff layout (Player, Team, Position,
// Points). Salaries may be currency-formatted ("$6,300").

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use lineup_core::{CandidatePool, Entity, PoolError};
use serde::Deserialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

const SALARY_HEADERS: [&str; 2] = ["DK Salary", "Salary"];

#[derive(Debug, Deserialize)]
struct RawPlayer {
    #[serde(rename = "Player", alias = "Name")]
    name: String,
    #[serde(rename = "DK Position", alias = "Position", alias = "Pos")]
    position: String,
    #[serde(rename = "DK Salary", alias = "Salary", default)]
    salary: Option<String>,
    #[serde(rename = "DK Projection", alias = "Projection", alias = "Points")]
    projection: String,
    #[serde(rename = "Team", default)]
    team: Option<String>,
}

// ---------------------------------------------------------------------------
// Field normalization
// ---------------------------------------------------------------------------

/// Parse a salary such as `$6,300`, `6300` or `6300.0` into whole units.
pub fn parse_cost(text: &str) -> Option<u32> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    Some(value.round() as u32)
}

/// Parse a projection; it must be finite and non-negative.
pub fn parse_score(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

fn load_entities_from_reader<R: Read>(rdr: R) -> Result<Vec<Entity>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let has_salary = reader
        .headers()?
        .iter()
        .any(|h| SALARY_HEADERS.contains(&h));
    if !has_salary {
        info!("no salary column; every player costs 0");
    }

    let mut entities = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for result in reader.deserialize::<RawPlayer>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };

        let cost = if has_salary {
            match raw.salary.as_deref().and_then(parse_cost) {
                Some(cost) => cost,
                None => {
                    warn!(
                        "skipping player '{}': unparsable salary {:?}",
                        raw.name, raw.salary
                    );
                    continue;
                }
            }
        } else {
            0
        };
        let Some(score) = parse_score(&raw.projection) else {
            warn!(
                "skipping player '{}': unparsable projection '{}'",
                raw.name, raw.projection
            );
            continue;
        };
        if raw.name.is_empty() || raw.position.is_empty() {
            warn!("skipping row with empty name or position");
            continue;
        }
        if !seen.insert((raw.position.clone(), raw.name.clone())) {
            warn!(
                "duplicate entry for '{}' at {}, keeping the first",
                raw.name, raw.position
            );
            continue;
        }

        let mut entity = Entity::new(&raw.name, &raw.position, cost, score);
        entity.team = raw.team.filter(|t| !t.is_empty());
        entities.push(entity);
    }
    Ok(entities)
}

/// Build a candidate pool from any CSV reader.
pub fn load_pool_from_reader<R: Read>(rdr: R) -> Result<CandidatePool, InputError> {
    let entities = load_entities_from_reader(rdr).map_err(|e| InputError::Csv {
        path: "<reader>".into(),
        source: e,
    })?;
    finish(entities)
}

/// Load the candidate pool from a CSV file.
pub fn load_pool(path: &Path) -> Result<CandidatePool, InputError> {
    let file = std::fs::File::open(path).map_err(|e| InputError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let entities = load_entities_from_reader(file).map_err(|e| InputError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    finish(entities)
}

fn finish(entities: Vec<Entity>) -> Result<CandidatePool, InputError> {
    if entities.is_empty() {
        return Err(InputError::Validation(
            "player CSV produced zero valid rows".into(),
        ));
    }
    Ok(CandidatePool::new(entities)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draftkings_layout() {
        let csv_data = "\
Player,DK Position,DK Projection,DK Salary
Dak Prescott,QB,19.5,\"$6,300\"
Cardinals,DST,7.1,$2600";

        let pool = load_pool_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 2);
        let dak = &pool.entities()[0];
        assert_eq!(dak.name, "Dak Prescott");
        assert_eq!(dak.category, "QB");
        assert_eq!(dak.cost, 6300);
        assert!((dak.score - 19.5).abs() < f64::EPSILON);
        assert!(dak.team.is_none());
        assert_eq!(pool.entities()[1].cost, 2600);
    }

    #[test]
    fn playoff_layout_without_salary() {
        let csv_data = "\
Player,Team,Position,Points
Josh Allen,BUF,QB,24.1
James Cook,BUF,RB,15.0";

        let pool = load_pool_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.entities()[0].team.as_deref(), Some("BUF"));
        assert!(pool.iter().all(|e| e.cost == 0));
    }

    #[test]
    fn whitespace_trimmed() {
        let csv_data = "\
Player , DK Position ,DK Projection,DK Salary
  Drake London  , WR ,20.0, 6700 ";

        let pool = load_pool_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.entities()[0].name, "Drake London");
        assert_eq!(pool.entities()[0].category, "WR");
        assert_eq!(pool.entities()[0].cost, 6700);
    }

    #[test]
    fn bad_rows_dropped() {
        let csv_data = "\
Player,DK Position,DK Projection,DK Salary
Good,QB,19.5,6300
Bad Salary,QB,19.5,TBD
Bad Score,QB,n/a,5000
Negative,DST,-2.0,2000
Good,QB,19.5,6300
Also Good,RB,10.0,4000";

        let pool = load_pool_from_reader(csv_data.as_bytes()).unwrap();
        let names: Vec<_> = pool.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Also Good"]);
    }

    #[test]
    fn empty_csv_is_validation_error() {
        let csv_data = "Player,DK Position,DK Projection,DK Salary";
        assert!(matches!(
            load_pool_from_reader(csv_data.as_bytes()),
            Err(InputError::Validation(_))
        ));
    }

    #[test]
    fn cost_normalization() {
        assert_eq!(parse_cost("$6,300"), Some(6300));
        assert_eq!(parse_cost(" 6300.0 "), Some(6300));
        assert_eq!(parse_cost("$ 2,600"), Some(2600));
        assert_eq!(parse_cost("-100"), None);
        assert_eq!(parse_cost("free"), None);
        assert_eq!(parse_cost(""), None);
    }

    #[test]
    fn score_normalization() {
        assert_eq!(parse_score("17.4"), Some(17.4));
        assert_eq!(parse_score("NaN"), None);
        assert_eq!(parse_score("-1"), None);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_pool(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }
}
