//! Compiler configuration
//!
//! Reads `criteria-sql.toml`:
//!
//! ```toml
//! dialect = "postgresql"
//! empty_in_list = "always_false"
//!
//! [[functions]]
//! name = "median"
//! sql_name = "percentile_cont_median"
//! returns = "double"
//! ```
//!
//! ## Environment Variables
//!
//! - `CRITERIA_DIALECT` - Dialect name, overrides the file
//!
//! These can be set in a `.env` file next to the configuration.

use crate::error::{AppError, AppResult};
use criteria_core::{Dialect, EmptyInList, SqlFunction};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "criteria-sql.toml";

/// Environment variable names
pub const ENV_DIALECT: &str = "CRITERIA_DIALECT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Dialect name (`generic`, `postgresql`, `mysql`, `h2`, `hsql`, `oracle`, `sqlserver`)
    #[serde(default = "default_dialect")]
    pub dialect: String,
    /// Rendering of `in` with no values
    #[serde(default)]
    pub empty_in_list: EmptyInList,
    /// Extra aggregate functions registered on top of the dialect's own
    #[serde(default)]
    pub functions: Vec<SqlFunction>,
}

fn default_dialect() -> String {
    "generic".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            empty_in_list: EmptyInList::default(),
            functions: Vec::new(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) {
        self.override_dialect(std::env::var(ENV_DIALECT).ok());
    }

    pub fn override_dialect(&mut self, dialect: Option<String>) {
        if let Some(dialect) = dialect.filter(|d| !d.is_empty()) {
            self.dialect = dialect;
        }
    }

    /// Build the dialect this configuration describes.
    pub fn build_dialect(&self) -> AppResult<Dialect> {
        let mut dialect = Dialect::from_name(&self.dialect)
            .map_err(|_| AppError::ConfigError(format!("unknown dialect: {}", self.dialect)))?
            .with_empty_in_list(self.empty_in_list);
        for function in &self.functions {
            if function.name.is_empty() || function.sql_name.is_empty() {
                return Err(AppError::ConfigError(
                    "function entries need both name and sql_name".to_string(),
                ));
            }
            dialect.register_function(function.clone());
        }
        Ok(dialect)
    }
}
