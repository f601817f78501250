//! Schema metadata consumed by the compiler.
//!
//! The compiler never owns mapping information. It asks a [`Metadata`]
//! implementation for entity and collection descriptors and resolves
//! property paths against them.

use crate::error::{CriteriaError, CriteriaResult};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of entity and collection mappings.
///
/// Implementations may cache or compute descriptors, but lookups must be
/// side-effect free: the compiler calls them repeatedly during a single pass.
pub trait Metadata {
    /// Look up an entity mapping by entity name.
    fn entity(&self, name: &str) -> Option<&EntityMapping>;

    /// Look up a collection mapping by role (`Owner.property`).
    fn collection(&self, role: &str) -> Option<&CollectionMapping>;

    fn require_entity(&self, name: &str) -> CriteriaResult<&EntityMapping> {
        self.entity(name)
            .ok_or_else(|| CriteriaError::EntityNotFound(name.to_string()))
    }
}

/// A mapped property: name, physical columns and semantic type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMapping {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl PropertyMapping {
    pub fn new(name: &str, columns: &[&str], ty: Type) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ty,
        }
    }
}

/// Mapping of an entity onto its table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub name: String,
    pub table: String,
    pub identifier: PropertyMapping,
    /// Name of the optimistic-lock version property, if any
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyMapping>,
}

/// Result of resolving a property path within one entity
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProperty {
    /// Unqualified column names
    pub columns: Vec<String>,
    pub ty: Type,
}

impl EntityMapping {
    pub fn new(name: &str, table: &str, identifier: PropertyMapping) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            identifier,
            version: None,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyMapping) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_version(mut self, name: &str) -> Self {
        self.version = Some(name.to_string());
        self
    }

    /// Find a top-level property. The identifier answers to its own name and to `id`.
    pub fn property(&self, name: &str) -> Option<&PropertyMapping> {
        if name == self.identifier.name || name == "id" {
            return Some(&self.identifier);
        }
        self.properties.iter().find(|p| p.name == name)
    }

    /// Every column selected when the whole entity is loaded.
    pub fn all_columns(&self) -> Vec<&str> {
        std::iter::once(&self.identifier)
            .chain(self.properties.iter())
            .flat_map(|p| p.columns.iter().map(String::as_str))
            .collect()
    }

    /// Resolve a dotted property path to its columns and type.
    ///
    /// Paths may descend into components (`cityState.city`) and may name the
    /// identifier of a referenced entity (`course.courseCode`), which maps to
    /// the foreign-key columns without a join.
    pub fn resolve(&self, path: &str, metadata: &dyn Metadata) -> CriteriaResult<ResolvedProperty> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let property = self
            .property(head)
            .ok_or_else(|| CriteriaError::property_not_found(path, &self.name))?;
        let mut resolved = ResolvedProperty {
            columns: property.columns.clone(),
            ty: property.ty.clone(),
        };
        let mut remaining = rest;
        while let Some(sub_path) = remaining {
            let (segment, next) = match sub_path.split_once('.') {
                Some((segment, next)) => (segment, Some(next)),
                None => (sub_path, None),
            };
            resolved = match &resolved.ty {
                Type::Component(component) => {
                    let mut offset = 0;
                    let mut found = None;
                    for sub in &component.properties {
                        let span = sub.ty.column_span(metadata)?;
                        if sub.name == segment {
                            found = Some((sub, span));
                            break;
                        }
                        offset += span;
                    }
                    let (sub, span) =
                        found.ok_or_else(|| CriteriaError::property_not_found(path, &self.name))?;
                    let columns = resolved
                        .columns
                        .get(offset..offset + span)
                        .ok_or_else(|| {
                            CriteriaError::Query(format!(
                                "component {} of {} maps fewer columns than its properties",
                                path, self.name
                            ))
                        })?
                        .to_vec();
                    ResolvedProperty {
                        columns,
                        ty: sub.ty.clone(),
                    }
                }
                Type::ManyToOne { entity } => {
                    let target = metadata.require_entity(entity)?;
                    if segment != target.identifier.name && segment != "id" {
                        return Err(CriteriaError::property_not_found(path, &self.name));
                    }
                    ResolvedProperty {
                        columns: resolved.columns.clone(),
                        ty: target.identifier.ty.clone(),
                    }
                }
                _ => return Err(CriteriaError::property_not_found(path, &self.name)),
            };
            remaining = next;
        }
        Ok(resolved)
    }
}

/// Mapping of a collection role onto its table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMapping {
    /// `Owner.property`
    pub role: String,
    pub table: String,
    /// Foreign-key columns referencing the owner's identifier
    pub key_columns: Vec<String>,
    /// Element entity for one-to-many collections; `None` for value collections
    #[serde(default)]
    pub element: Option<String>,
    /// Whether the collection can be referenced from queries
    #[serde(default = "default_queryable")]
    pub queryable: bool,
}

fn default_queryable() -> bool {
    true
}

impl CollectionMapping {
    pub fn new(role: &str, table: &str, key_columns: &[&str]) -> Self {
        Self {
            role: role.to_string(),
            table: table.to_string(),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            element: None,
            queryable: true,
        }
    }

    pub fn with_element(mut self, entity: &str) -> Self {
        self.element = Some(entity.to_string());
        self
    }

    pub fn not_queryable(mut self) -> Self {
        self.queryable = false;
        self
    }
}

/// In-memory metadata for tests and schema files
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    entities: HashMap<String, EntityMapping>,
    collections: HashMap<String, CollectionMapping>,
}

impl InMemoryMetadata {
    /// Create an empty metadata set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(entities: Vec<EntityMapping>, collections: Vec<CollectionMapping>) -> Self {
        let mut metadata = Self::new();
        for entity in entities {
            metadata.add_entity(entity);
        }
        for collection in collections {
            metadata.add_collection(collection);
        }
        metadata
    }

    pub fn add_entity(&mut self, entity: EntityMapping) {
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn add_collection(&mut self, collection: CollectionMapping) {
        self.collections.insert(collection.role.clone(), collection);
    }

    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entities.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Metadata for InMemoryMetadata {
    fn entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.get(name)
    }

    fn collection(&self, role: &str) -> Option<&CollectionMapping> {
        self.collections.get(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::school;

    #[test]
    fn test_resolve_simple_property() {
        let md = school();
        let student = md.entity("Student").unwrap();
        let resolved = student.resolve("name", &md).unwrap();
        assert_eq!(resolved.columns, vec!["name"]);
        assert_eq!(resolved.ty, Type::String);
    }

    #[test]
    fn test_resolve_identifier_alias() {
        let md = school();
        let student = md.entity("Student").unwrap();
        assert_eq!(student.resolve("id", &md).unwrap().columns, vec!["studentId"]);
        assert_eq!(
            student.resolve("studentNumber", &md).unwrap().columns,
            vec!["studentId"]
        );
    }

    #[test]
    fn test_resolve_component_sub_property() {
        let md = school();
        let student = md.entity("Student").unwrap();
        let whole = student.resolve("cityState", &md).unwrap();
        assert_eq!(whole.columns, vec!["cityName", "stateCode"]);
        let state = student.resolve("cityState.state", &md).unwrap();
        assert_eq!(state.columns, vec!["stateCode"]);
        assert_eq!(state.ty, Type::String);
    }

    #[test]
    fn test_resolve_association_identifier() {
        let md = school();
        let student = md.entity("Student").unwrap();
        let resolved = student.resolve("preferredCourse.courseCode", &md).unwrap();
        assert_eq!(resolved.columns, vec!["preferredCourseCode"]);
        assert!(matches!(
            student.resolve("preferredCourse.description", &md),
            Err(CriteriaError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_unknown_property() {
        let md = school();
        let student = md.entity("Student").unwrap();
        let err = student.resolve("nickname", &md).unwrap_err();
        assert_eq!(err.to_string(), "could not resolve property: nickname of: Student");
    }

    #[test]
    fn test_all_columns_skip_collections() {
        let md = school();
        let student = md.entity("Student").unwrap();
        assert_eq!(
            student.all_columns(),
            vec![
                "studentId",
                "name",
                "cityName",
                "stateCode",
                "preferredCourseCode",
                "credits",
                "version"
            ]
        );
    }

    #[test]
    fn test_require_entity() {
        let md = school();
        assert!(md.require_entity("Student").is_ok());
        assert_eq!(
            md.require_entity("Professor").unwrap_err(),
            CriteriaError::EntityNotFound("Professor".to_string())
        );
        assert_eq!(md.entity_names(), vec!["Course", "Enrolment", "Student"]);
    }
}
