// Output rendering: per-shape CSV files, the combined score-sorted CSV, an
// optional JSON export, and the console table.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lineup_core::{Roster, Termination, Warning};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One output row: lineup number, then category/name/cost/score per pick,
/// then total cost and total score (one decimal).
pub fn render_record(roster: &Roster) -> Vec<String> {
    let mut fields = Vec::with_capacity(3 + roster.picks.len() * 4);
    fields.push(roster.index.to_string());
    for pick in &roster.picks {
        fields.push(pick.category.clone());
        fields.push(pick.name.clone());
        fields.push(pick.cost.to_string());
        // Debug keeps full precision and always shows a decimal point.
        fields.push(format!("{:?}", pick.score));
    }
    fields.push(roster.total_cost.to_string());
    fields.push(format!("{:.1}", roster.total_score));
    fields
}

/// Header row for a shape with `picks` players per lineup.
pub fn header(picks: usize) -> Vec<String> {
    let mut fields = vec!["Lineup #".to_string()];
    for i in 1..=picks {
        fields.push(format!("Player {i} Position"));
        fields.push(format!("Player {i} Name"));
        fields.push(format!("Player {i} Salary"));
        fields.push(format!("Player {i} Projected Points"));
    }
    fields.push("Total Salary".into());
    fields.push("Total Score".into());
    fields
}

/// Read total cost and total score back from a rendered record.
pub fn parse_totals(fields: &[String]) -> Option<(u32, f64)> {
    let [.., cost, score] = fields else {
        return None;
    };
    Some((cost.parse().ok()?, score.parse().ok()?))
}

/// A rendered roster tagged with the shape that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub shape: String,
    pub total_score: f64,
    pub fields: Vec<String>,
}

/// Concatenate every shape's records and sort by total score, highest first.
/// Equal scores keep their concatenation order.
pub fn merge_sorted<'a, I>(shapes: I) -> Vec<MergedRecord>
where
    I: IntoIterator<Item = (&'a str, &'a [Roster])>,
{
    let mut merged: Vec<MergedRecord> = shapes
        .into_iter()
        .flat_map(|(shape, rosters)| {
            rosters.iter().map(move |r| MergedRecord {
                shape: shape.to_string(),
                total_score: r.total_score,
                fields: render_record(r),
            })
        })
        .collect();
    merged.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    merged
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

fn create(path: &Path) -> Result<File, OutputError> {
    File::create(path).map_err(|e| OutputError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> OutputError + '_ {
    move |e| OutputError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Write `<dir>/<shape>.csv` with a header row. Returns the path written.
pub fn write_shape_csv(dir: &Path, shape: &str, rosters: &[Roster]) -> Result<PathBuf, OutputError> {
    let path = dir.join(format!("{shape}.csv"));
    let picks = rosters.iter().map(|r| r.picks.len()).max().unwrap_or(0);

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(create(&path)?);
    writer.write_record(header(picks)).map_err(csv_err(&path))?;
    for roster in rosters {
        writer.write_record(render_record(roster)).map_err(csv_err(&path))?;
    }
    writer.flush().map_err(|e| OutputError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(path)
}

/// Write the merged records without a header.
pub fn write_combined_csv(path: &Path, records: &[MergedRecord]) -> Result<(), OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_writer(create(path)?);
    for record in records {
        writer.write_record(&record.fields).map_err(csv_err(path))?;
    }
    writer.flush().map_err(|e| OutputError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// JSON export of a whole run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub generated_at: DateTime<Utc>,
    pub budget: u32,
    pub shapes: Vec<ShapeSummary<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ShapeSummary<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<&'a Termination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub warnings: &'a [Warning],
    pub rosters: &'a [Roster],
}

pub fn write_json(path: &Path, summary: &RunSummary<'_>) -> Result<(), OutputError> {
    let file = create(path)?;
    serde_json::to_writer_pretty(file, summary).map_err(|e| OutputError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Render merged records as aligned columns. Text fields are cut to
/// `name_width` characters; numbers are left alone.
pub fn console_table(records: &[MergedRecord], name_width: usize) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            r.fields
                .iter()
                .map(|f| {
                    if f.parse::<f64>().is_ok() {
                        f.clone()
                    } else {
                        f.chars().take(name_width).collect()
                    }
                })
                .collect()
        })
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(|f| f.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(c, f)| format!("{:<width$}", f, width = widths[c]))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineup_core::Pick;

    fn pick(category: &str, name: &str, cost: u32, score: f64) -> Pick {
        Pick {
            category: category.into(),
            name: name.into(),
            cost,
            score,
            team: None,
        }
    }

    fn roster(index: usize, picks: Vec<Pick>) -> Roster {
        Roster::from_picks(index, picks)
    }

    fn scenario() -> Roster {
        roster(
            1,
            vec![
                pick("DST", "DST1", 3000, 7.0),
                pick("QB", "QB1", 6000, 20.0),
                pick("RB", "RB1", 7000, 22.0),
            ],
        )
    }

    #[test]
    fn record_layout() {
        let fields = render_record(&scenario());
        assert_eq!(
            fields.join(","),
            "1,DST,DST1,3000,7.0,QB,QB1,6000,20.0,RB,RB1,7000,22.0,16000,49.0"
        );
    }

    #[test]
    fn totals_survive_rendering() {
        let r = roster(
            3,
            vec![pick("QB", "A", 5400, 17.4), pick("RB", "B", 5900, 17.9)],
        );
        let (cost, score) = parse_totals(&render_record(&r)).unwrap();
        assert_eq!(cost, r.total_cost);
        assert!((score - r.total_score).abs() <= 0.05);
    }

    #[test]
    fn pick_scores_keep_source_precision() {
        let r = roster(1, vec![pick("QB", "A", 5400, 17.35), pick("K", "B", 4000, 8.0)]);
        let fields = render_record(&r);
        assert_eq!(fields[4], "17.35");
        assert_eq!(fields[8], "8.0");
    }

    #[test]
    fn header_matches_pick_count() {
        let h = header(2);
        assert_eq!(h.len(), 1 + 2 * 4 + 2);
        assert_eq!(h[0], "Lineup #");
        assert_eq!(h[5], "Player 2 Position");
        assert_eq!(h.last().unwrap(), "Total Score");
    }

    #[test]
    fn merge_sorts_across_shapes_descending() {
        let a = vec![
            roster(1, vec![pick("QB", "A", 1, 30.0)]),
            roster(2, vec![pick("QB", "B", 1, 10.0)]),
        ];
        let b = vec![roster(1, vec![pick("QB", "C", 1, 20.0)])];
        let merged = merge_sorted([("alpha", a.as_slice()), ("beta", b.as_slice())]);
        let order: Vec<_> = merged
            .iter()
            .map(|m| (m.shape.as_str(), m.total_score))
            .collect();
        assert_eq!(order, vec![("alpha", 30.0), ("beta", 20.0), ("alpha", 10.0)]);
    }

    #[test]
    fn console_truncates_names() {
        let r = roster(1, vec![pick("RB", "Alvin and the Chipmunks", 7800, 22.9)]);
        let merged = merge_sorted([("s", std::slice::from_ref(&r))]);
        let table = console_table(&merged, 12);
        assert!(table.contains("Alvin and th"));
        assert!(!table.contains("Chipmunks"));
        assert!(table.contains("7800"));
        assert!(table.contains("22.9"));
    }

    #[test]
    fn shape_csv_written_with_header() {
        let dir = std::env::temp_dir().join("lineup_output_shape_csv");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let path = write_shape_csv(&dir, "small", &[scenario()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Lineup #,Player 1 Position"));
        assert_eq!(
            lines.next().unwrap(),
            "1,DST,DST1,3000,7.0,QB,QB1,6000,20.0,RB,RB1,7000,22.0,16000,49.0"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
