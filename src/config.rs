use std::path::PathBuf;

use thiserror::Error;

use crate::sheets::{ColumnMapping, DEFAULT_IDENTITY_FRAGMENT};
use crate::validation::DEFAULT_ACCURACY_THRESHOLD;

/// Application-level constants
pub const APP_NAME: &str = "Labsheet";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,labsheet_lib=info"
}

/// ~/Labsheet/ when a home directory exists.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

pub const ENV_THRESHOLD: &str = "LABSHEET_THRESHOLD";
pub const ENV_EXPECTED_DIR: &str = "LABSHEET_EXPECTED_DIR";
pub const ENV_REPORT_DIR: &str = "LABSHEET_REPORT_DIR";
pub const ENV_RESULTS: &str = "LABSHEET_RESULTS";
pub const ENV_WORKBOOK: &str = "LABSHEET_WORKBOOK";
pub const ENV_IDENTITY_COLUMN: &str = "LABSHEET_IDENTITY_COLUMN";
pub const ENV_MAPPING: &str = "LABSHEET_MAPPING";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be a number between 0 and 100, got '{value}'")]
    InvalidThreshold { var: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Cannot read column mapping {path}: {source}")]
    MappingIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid column mapping {path}: {source}")]
    MappingJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Everything the engine needs to run one batch.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub accuracy_threshold: f64,
    /// Directory of `<document>.json` ground-truth files.
    pub expected_data_dir: PathBuf,
    /// Directory (or explicit `.json` path) for validation reports.
    pub report_dir: PathBuf,
    /// Extraction results file to validate and reconcile.
    pub results_path: Option<PathBuf>,
    /// Workbook snapshot to reconcile against. Reconciliation is skipped if unset.
    pub workbook_path: Option<PathBuf>,
    pub identity_fragment: String,
    pub column_mapping: ColumnMapping,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let base = app_data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD,
            expected_data_dir: PathBuf::from("blood_tests/json_data"),
            report_dir: base.join("reports"),
            results_path: None,
            workbook_path: None,
            identity_fragment: DEFAULT_IDENTITY_FRAGMENT.to_string(),
            column_mapping: ColumnMapping::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns. Unset and blank
    /// variables keep the default; malformed values are fatal.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_THRESHOLD) {
            config.accuracy_threshold = parse_threshold(&raw)?;
        }
        if let Some(dir) = get(ENV_EXPECTED_DIR) {
            config.expected_data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(ENV_REPORT_DIR) {
            config.report_dir = PathBuf::from(dir);
        }
        config.results_path = get(ENV_RESULTS).map(PathBuf::from);
        config.workbook_path = get(ENV_WORKBOOK).map(PathBuf::from);
        if let Some(raw) = lookup(ENV_IDENTITY_COLUMN) {
            let fragment = raw.trim();
            if fragment.is_empty() {
                return Err(ConfigError::Empty(ENV_IDENTITY_COLUMN));
            }
            config.identity_fragment = fragment.to_string();
        }
        if let Some(path) = get(ENV_MAPPING) {
            config.column_mapping = load_mapping(PathBuf::from(path))?;
        }

        Ok(config)
    }

    pub fn require_results_path(&self) -> Result<&PathBuf, ConfigError> {
        self.results_path
            .as_ref()
            .ok_or(ConfigError::Missing(ENV_RESULTS))
    }
}

fn parse_threshold(raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| (0.0..=100.0).contains(t))
        .ok_or_else(|| ConfigError::InvalidThreshold {
            var: ENV_THRESHOLD,
            value: raw.to_string(),
        })
}

fn load_mapping(path: PathBuf) -> Result<ColumnMapping, ConfigError> {
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) => return Err(ConfigError::MappingIo { path, source }),
    };
    match serde_json::from_str(&raw) {
        Ok(mapping) => Ok(mapping),
        Err(source) => Err(ConfigError::MappingJson { path, source }),
    }
}
