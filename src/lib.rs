//! criteria-sql - criteria query compiler front end.
//!
//! Wraps [`criteria_core`] with a TOML compiler configuration, schema files
//! and a [`Context`] that binds the two into a compilation session.

pub mod config;
pub mod error;
pub mod schema;

pub use config::CompilerConfig;
pub use criteria_core;
pub use error::{AppError, AppResult};
pub use schema::SchemaFile;

use criteria_core::{CompiledQuery, DetachedCriteria, Dialect, InMemoryMetadata, Metadata, Session};
use std::path::Path;

/// Schema metadata plus dialect, shared by every compilation
#[derive(Debug, Clone)]
pub struct Context {
    metadata: InMemoryMetadata,
    dialect: Dialect,
}

impl Context {
    pub fn new(metadata: InMemoryMetadata, dialect: Dialect) -> Self {
        Self { metadata, dialect }
    }

    /// Load a schema file and build the configured dialect.
    pub fn load(schema: &Path, config: &CompilerConfig) -> AppResult<Self> {
        let metadata = schema::load_metadata(schema)?;
        let dialect = config.build_dialect()?;
        tracing::info!(
            "Compiling against {} entities with the {} dialect",
            metadata.entity_names().len(),
            dialect.kind
        );
        Ok(Self::new(metadata, dialect))
    }

    pub fn compile(&self, criteria: &mut DetachedCriteria) -> AppResult<CompiledQuery> {
        Ok(criteria.executable(self).compile()?)
    }

    /// Compile a criteria tree given as a JSON document.
    pub fn compile_json(&self, document: &str) -> AppResult<CompiledQuery> {
        let mut criteria: DetachedCriteria = serde_json::from_str(document)?;
        self.compile(&mut criteria)
    }
}

impl Session for Context {
    fn metadata(&self) -> &dyn Metadata {
        &self.metadata
    }

    fn dialect(&self) -> &Dialect {
        &self.dialect
    }
}
