//! Schema files
//!
//! A schema file lists entity and collection mappings and is loaded into an
//! [`InMemoryMetadata`]. JSON and TOML are accepted, chosen by extension.

use crate::error::{AppError, AppResult};
use criteria_core::{CollectionMapping, EntityMapping, InMemoryMetadata, Type};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub entities: Vec<EntityMapping>,
    #[serde(default)]
    pub collections: Vec<CollectionMapping>,
}

impl SchemaFile {
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            other => Err(AppError::UnsupportedFormat(format!(
                "{} (expected .json or .toml, got {})",
                path.display(),
                other.unwrap_or("no extension")
            ))),
        }
    }

    pub fn from_json(content: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check that every association points at a declared entity or collection role.
    pub fn validate(&self) -> AppResult<()> {
        let entities: HashSet<&str> = self.entities.iter().map(|e| e.name.as_str()).collect();
        let roles: HashSet<&str> = self.collections.iter().map(|c| c.role.as_str()).collect();

        for entity in &self.entities {
            for property in std::iter::once(&entity.identifier).chain(&entity.properties) {
                match &property.ty {
                    Type::ManyToOne { entity: target } if !entities.contains(target.as_str()) => {
                        return Err(AppError::ConfigError(format!(
                            "{}.{} references unknown entity {}",
                            entity.name, property.name, target
                        )));
                    }
                    Type::Collection { role } if !roles.contains(role.as_str()) => {
                        return Err(AppError::ConfigError(format!(
                            "{}.{} references unknown collection role {}",
                            entity.name, property.name, role
                        )));
                    }
                    _ => {}
                }
            }
            if let Some(version) = &entity.version {
                if entity.property(version).is_none() {
                    return Err(AppError::ConfigError(format!(
                        "{} declares unknown version property {}",
                        entity.name, version
                    )));
                }
            }
        }

        for collection in &self.collections {
            if let Some(element) = &collection.element {
                if !entities.contains(element.as_str()) {
                    return Err(AppError::ConfigError(format!(
                        "collection {} has unknown element entity {}",
                        collection.role, element
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn into_metadata(self) -> AppResult<InMemoryMetadata> {
        self.validate()?;
        tracing::debug!(
            "Loaded schema with {} entities and {} collections",
            self.entities.len(),
            self.collections.len()
        );
        Ok(InMemoryMetadata::from_parts(self.entities, self.collections))
    }
}

/// Load a schema file straight into metadata.
pub fn load_metadata(path: &Path) -> AppResult<InMemoryMetadata> {
    SchemaFile::load(path)?.into_metadata()
}
