//! Runtime configuration.
//!
//! Values come from the process environment, after an optional `.env` file
//! has been loaded. Every key has a default so the dashboard runs against a
//! local `data/` directory out of the box.
//!
//! | Variable                    | Default        |
//! |-----------------------------|----------------|
//! | `TBDASH_DATA_DIR`           | `data`         |
//! | `TBDASH_COVERAGE_FILE`      | `visual3.csv`  |
//! | `TBDASH_BURDEN_FILE`        | `visual1.csv`  |
//! | `TBDASH_REDUCTION_FILE`     | `visual2.csv`  |
//! | `TBDASH_RESISTANCE_FILE`    | `visual4.csv`  |
//! | `TBDASH_COINFECTION_FILE`   | `visual5.csv`  |
//! | `TBDASH_TOP_N`              | `10`           |
//! | `TBDASH_COMPARISON_MEASURE` | `incidence`    |
//! | `TBDASH_PORT`               | `3000`         |

pub mod countries;

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

pub use countries::{CountryReference, DEVELOPED_COUNTRIES};

/// File names of the five source datasets, relative to the data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetFiles {
    pub coverage: PathBuf,
    pub burden: PathBuf,
    pub reduction: PathBuf,
    pub resistance: PathBuf,
    pub coinfection: PathBuf,
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            coverage: PathBuf::from("visual3.csv"),
            burden: PathBuf::from("visual1.csv"),
            reduction: PathBuf::from("visual2.csv"),
            resistance: PathBuf::from("visual4.csv"),
            coinfection: PathBuf::from("visual5.csv"),
        }
    }
}

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Directory holding the dataset files
    pub data_dir: PathBuf,
    /// Dataset file names (absolute paths are used as-is)
    pub files: DatasetFiles,
    /// Bars in the coverage ranking
    pub top_n: usize,
    /// Burden measure joined against resistance in the regional comparison
    pub comparison_measure: String,
    /// HTTP port
    pub port: u16,
    /// Skip the output contract check
    pub skip_validation: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            files: DatasetFiles::default(),
            top_n: 10,
            comparison_measure: "incidence".to_string(),
            port: 3000,
            skip_validation: false,
        }
    }
}

impl DashboardConfig {
    /// Load from the environment, reading `.env` first if present.
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        let top_n = parse_var(&lookup, "TBDASH_TOP_N", defaults.top_n)?;
        if top_n == 0 {
            return Err(ConfigError::Invalid {
                key: "TBDASH_TOP_N".into(),
                value: "0".into(),
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            data_dir: path("TBDASH_DATA_DIR", defaults.data_dir),
            files: DatasetFiles {
                coverage: path("TBDASH_COVERAGE_FILE", defaults.files.coverage),
                burden: path("TBDASH_BURDEN_FILE", defaults.files.burden),
                reduction: path("TBDASH_REDUCTION_FILE", defaults.files.reduction),
                resistance: path("TBDASH_RESISTANCE_FILE", defaults.files.resistance),
                coinfection: path("TBDASH_COINFECTION_FILE", defaults.files.coinfection),
            },
            top_n,
            comparison_measure: lookup("TBDASH_COMPARISON_MEASURE")
                .unwrap_or(defaults.comparison_measure),
            port: parse_var(&lookup, "TBDASH_PORT", defaults.port)?,
            skip_validation: parse_var(&lookup, "TBDASH_SKIP_VALIDATION", false)?,
        })
    }

    /// Full path of a dataset file.
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }

    pub fn coverage_path(&self) -> PathBuf {
        self.resolve(&self.files.coverage)
    }

    pub fn burden_path(&self) -> PathBuf {
        self.resolve(&self.files.burden)
    }

    pub fn reduction_path(&self) -> PathBuf {
        self.resolve(&self.files.reduction)
    }

    pub fn resistance_path(&self) -> PathBuf {
        self.resolve(&self.files.resistance)
    }

    pub fn coinfection_path(&self) -> PathBuf {
        self.resolve(&self.files.coinfection)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            message: e.to_string(),
        }),
    }
}
