// Configuration loading and validation (config/lineup.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use lineup_core::{DiversityMode, FilterPolicy, OptimizerSettings, RosterShape, DEFAULT_MAX_ROSTERS};

pub const CONFIG_FILE: &str = "lineup.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterPolicy,
    /// Named roster shapes, each run as its own diversification loop.
    pub shapes: BTreeMap<String, RosterShape>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    pub budget: u32,
    #[serde(default = "default_max_rosters")]
    pub max_rosters: usize,
    #[serde(default)]
    pub diversity: DiversityMode,
    #[serde(default)]
    pub max_per_team: Option<u32>,
    /// Per-solve deadline. A solve that runs past it ends its shape's loop.
    #[serde(default)]
    pub solve_timeout_secs: Option<u64>,
}

impl OptimizerConfig {
    pub fn settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            budget: self.budget,
            max_rosters: self.max_rosters,
            diversity: self.diversity,
            max_per_team: self.max_per_team,
        }
    }

    pub fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Player CSV path.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_combined_file")]
    pub combined_file: String,
    #[serde(default)]
    pub json_file: Option<String>,
    /// Console column width for player names.
    #[serde(default = "default_name_width")]
    pub name_width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: default_output_dir(),
            combined_file: default_combined_file(),
            json_file: None,
            name_width: default_name_width(),
        }
    }
}

fn default_max_rosters() -> usize {
    DEFAULT_MAX_ROSTERS
}

fn default_output_dir() -> String {
    ".".into()
}

fn default_combined_file() -> String {
    "combined_lineups.csv".into()
}

fn default_name_width() -> usize {
    12
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/lineup.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Copy `defaults/lineup.toml` into `config/` when it is missing there.
/// Returns the copied paths.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let source = defaults_dir.join(CONFIG_FILE);
    let target = config_dir.join(CONFIG_FILE);
    if !source.is_file() || target.exists() {
        return Ok(vec![]);
    }

    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", source.display()),
    })?;
    Ok(vec![target])
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let opt = &config.optimizer;
    if opt.budget == 0 {
        return Err(invalid("optimizer.budget", "must be greater than 0"));
    }
    if opt.max_rosters == 0 {
        return Err(invalid("optimizer.max_rosters", "must be greater than 0"));
    }
    if opt.max_per_team == Some(0) {
        return Err(invalid("optimizer.max_per_team", "must be greater than 0"));
    }
    if opt.solve_timeout_secs == Some(0) {
        return Err(invalid("optimizer.solve_timeout_secs", "must be greater than 0"));
    }
    if config.input.path.trim().is_empty() {
        return Err(invalid("input.path", "must not be empty"));
    }
    if config.output.name_width == 0 {
        return Err(invalid("output.name_width", "must be greater than 0"));
    }

    if config.shapes.is_empty() {
        return Err(invalid("shapes", "at least one roster shape is required"));
    }
    for (name, shape) in &config.shapes {
        if let Err(e) = shape.validate() {
            return Err(invalid(&format!("shapes.{name}"), &e.to_string()));
        }
    }

    Ok(())
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Path to the lineup-app crate root (works from the crate or the
    /// workspace root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/lineup-app/defaults").exists() {
            cwd.join("crates/lineup-app")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    fn write_config(dir_name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(dir_name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), text).unwrap();
        tmp
    }

    const MINIMAL: &str = r#"
[optimizer]
budget = 20000

[input]
path = "players.csv"

[shapes.small]
QB = 1
RB = 1
DST = 1
"#;

    #[test]
    fn default_config_loads() {
        let root = project_root();
        let text = fs::read_to_string(root.join("defaults").join(CONFIG_FILE)).unwrap();
        let config = parse_config(&text).expect("defaults should parse");
        validate(&config).expect("defaults should validate");

        assert_eq!(config.optimizer.budget, 50000);
        assert_eq!(config.optimizer.max_rosters, 10);
        assert_eq!(config.optimizer.diversity, DiversityMode::ExcludeRoster);
        assert!(config.optimizer.solve_timeout().is_none());
        assert_eq!(config.output.name_width, 12);
        assert_eq!(config.shapes.len(), 3);
        assert_eq!(config.shapes["four_wr"].get("WR"), 4);
        assert_eq!(config.shapes["three_rb"].get("RB"), 3);
        assert_eq!(config.shapes["two_te"].get("TE"), 2);
        assert!(config.filter.is_empty());
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let tmp = write_config("lineup_config_minimal", MINIMAL);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.optimizer.max_rosters, DEFAULT_MAX_ROSTERS);
        assert_eq!(config.output.combined_file, "combined_lineups.csv");
        assert!(config.output.json_file.is_none());
        assert!(config.optimizer.max_per_team.is_none());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn filter_and_timeout_parsed() {
        let text = format!(
            "{MINIMAL}\n[filter]\nmust_include = [\"QB1\"]\nexclude = [\"RB2\"]\n"
        )
        .replace("budget = 20000", "budget = 20000\nsolve_timeout_secs = 5\ndiversity = \"score_ceiling\"");
        let config = parse_config(&text).unwrap();
        assert_eq!(config.filter.must_include, vec!["QB1"]);
        assert_eq!(config.filter.exclude, vec!["RB2"]);
        assert!(config.filter.only_use.is_empty());
        assert_eq!(config.optimizer.solve_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.optimizer.diversity, DiversityMode::ScoreCeiling);
    }

    #[test]
    fn rejects_zero_budget() {
        let tmp = write_config(
            "lineup_config_zero_budget",
            &MINIMAL.replace("budget = 20000", "budget = 0"),
        );
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "optimizer.budget")
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_all_zero_shape() {
        let text = MINIMAL
            .replace("QB = 1", "QB = 0")
            .replace("RB = 1", "RB = 0")
            .replace("DST = 1", "DST = 0");
        let config = parse_config(&text).unwrap();
        match validate(&config) {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "shapes.small"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_shape_counts_that_overflow() {
        let text = MINIMAL.replace("QB = 1", "QB = 4294967295");
        let config = parse_config(&text).unwrap();
        match validate(&config) {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "shapes.small"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = std::env::temp_dir().join("lineup_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let tmp = write_config("lineup_config_malformed", "[optimizer\nbudget = ");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_once() {
        let tmp = std::env::temp_dir().join("lineup_config_defaults_copy");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), MINIMAL).unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config").join(CONFIG_FILE)]);
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert!(load_config_from(&tmp).is_ok());

        let _ = fs::remove_dir_all(&tmp);
    }
}
