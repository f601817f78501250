use criteria_core::CriteriaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Criteria error: {0}")]
    CriteriaError(#[from] CriteriaError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_compiler_errors() {
        let err: AppError = CriteriaError::Query("duplicate alias: pc".to_string()).into();
        assert_eq!(err.to_string(), "Criteria error: Query error: duplicate alias: pc");
    }

    #[test]
    fn test_serializes_as_message() {
        let err = AppError::ConfigError("unknown dialect: db2".to_string());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!("Configuration error: unknown dialect: db2")
        );
    }
}
