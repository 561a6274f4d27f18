use std::path::PathBuf;

use anyhow::Context;

use crate::reporting::DEFAULT_TOP_N;

/// Default location of the library document
pub const DEFAULT_DB_PATH: &str = "library_db.json";

/// Default tracing filter when `LIBRARY_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "warn,library_ledger=info";

/// Runtime settings for the console application
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Path of the JSON document
    pub db_path: PathBuf,
    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
    /// How many titles the most-borrowed report shows
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, applying defaults where appropriate.
    ///
    /// # Errors
    /// Returns an error if `LIBRARY_TOP_N` is set but is not a positive integer.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup
    ///
    /// # Errors
    /// Returns an error if `LIBRARY_TOP_N` is set but is not a positive integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let db_path = lookup("LIBRARY_DB_PATH").map_or(defaults.db_path, PathBuf::from);
        let log_filter = lookup("LIBRARY_LOG").unwrap_or(defaults.log_filter);
        let top_n = match lookup("LIBRARY_TOP_N") {
            Some(raw) => {
                let n: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("LIBRARY_TOP_N must be a number, got {raw:?}"))?;
                anyhow::ensure!(n > 0, "LIBRARY_TOP_N must be at least 1");
                n
            }
            None => defaults.top_n,
        };

        Ok(Self { db_path, log_filter, top_n })
    }

    /// Apply command-line overrides
    #[must_use]
    pub fn with_overrides(mut self, db_path: Option<PathBuf>, verbose: bool) -> Self {
        if let Some(path) = db_path {
            self.db_path = path;
        }
        if verbose {
            self.log_filter = "debug".to_string();
        }
        self
    }
}
