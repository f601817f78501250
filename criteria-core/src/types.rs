//! Semantic types and typed bind values.
//!
//! A [`Type`] describes what a mapped property holds. Basic types map to a
//! single column; components and entity references span several columns and
//! are flattened into one [`TypedValue`] per column before binding.

use crate::error::{CriteriaError, CriteriaResult};
use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Semantic type of a mapped property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Boolean,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigDecimal,
    Character,
    String,
    Text,
    Date,
    Time,
    Timestamp,
    Binary,
    /// Embedded value spanning the columns of its properties, in order
    Component(ComponentType),
    /// Reference to another entity, mapped by foreign-key columns
    ManyToOne { entity: String },
    /// Collection-valued association, identified by its role
    Collection { role: String },
}

/// Ordered properties of an embedded value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentType {
    pub properties: Vec<ComponentProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl ComponentType {
    pub fn new(properties: Vec<(&str, Type)>) -> Self {
        Self {
            properties: properties
                .into_iter()
                .map(|(name, ty)| ComponentProperty {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&ComponentProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

impl Type {
    pub fn component(properties: Vec<(&str, Type)>) -> Self {
        Type::Component(ComponentType::new(properties))
    }

    pub fn many_to_one(entity: impl Into<String>) -> Self {
        Type::ManyToOne {
            entity: entity.into(),
        }
    }

    pub fn collection(role: impl Into<String>) -> Self {
        Type::Collection { role: role.into() }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Type::Component(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Type::Collection { .. })
    }

    /// Entity references and collections
    pub fn is_association(&self) -> bool {
        matches!(self, Type::ManyToOne { .. } | Type::Collection { .. })
    }

    /// Types stored in CHAR/VARCHAR columns
    pub fn is_character(&self) -> bool {
        matches!(self, Type::Character | Type::String | Type::Text)
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Type::Short | Type::Integer | Type::Long)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }

    /// Number of physical columns a value of this type occupies.
    pub fn column_span(&self, metadata: &dyn Metadata) -> CriteriaResult<usize> {
        match self {
            Type::Component(component) => component
                .properties
                .iter()
                .map(|p| p.ty.column_span(metadata))
                .sum(),
            Type::ManyToOne { entity } => metadata
                .require_entity(entity)?
                .identifier
                .ty
                .column_span(metadata),
            Type::Collection { .. } => Ok(0),
            _ => Ok(1),
        }
    }

    /// Leaf type of every column, in column order.
    pub fn column_types(&self, metadata: &dyn Metadata) -> CriteriaResult<Vec<Type>> {
        match self {
            Type::Component(component) => {
                let mut types = Vec::new();
                for property in &component.properties {
                    types.extend(property.ty.column_types(metadata)?);
                }
                Ok(types)
            }
            Type::ManyToOne { entity } => metadata
                .require_entity(entity)?
                .identifier
                .ty
                .column_types(metadata),
            Type::Collection { .. } => Ok(Vec::new()),
            other => Ok(vec![other.clone()]),
        }
    }

    /// Split a value into one typed bind value per column.
    ///
    /// Components read their properties by name from a JSON object; an entity
    /// reference accepts either the identifier value itself or an object
    /// carrying the identifier property. A null composite yields nulls.
    pub fn disassemble(&self, value: &Value, metadata: &dyn Metadata) -> CriteriaResult<Vec<TypedValue>> {
        match self {
            Type::Component(component) => {
                let object = match value {
                    Value::Null => None,
                    Value::Object(map) => Some(map),
                    other => {
                        return Err(CriteriaError::Query(format!(
                            "expected a component value, found {}",
                            other
                        )))
                    }
                };
                let mut values = Vec::new();
                for property in &component.properties {
                    let part = object
                        .and_then(|map| map.get(&property.name))
                        .unwrap_or(&Value::Null);
                    values.extend(property.ty.disassemble(part, metadata)?);
                }
                Ok(values)
            }
            Type::ManyToOne { entity } => {
                let target = metadata.require_entity(entity)?;
                let id = match value {
                    Value::Object(map) => map.get(&target.identifier.name).unwrap_or(&Value::Null),
                    other => other,
                };
                target.identifier.ty.disassemble(id, metadata)
            }
            Type::Collection { role } => Err(CriteriaError::Query(format!(
                "cannot bind a value for collection {}",
                role
            ))),
            basic => Ok(vec![TypedValue::new(basic.clone(), value.clone())]),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Component(component) => {
                let names: Vec<&str> = component.properties.iter().map(|p| p.name.as_str()).collect();
                write!(f, "component({})", names.join(", "))
            }
            Type::ManyToOne { entity } => write!(f, "many_to_one({})", entity),
            Type::Collection { role } => write!(f, "collection({})", role),
            basic => {
                let name = serde_json::to_value(basic)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                f.write_str(&name)
            }
        }
    }
}

/// A bind value together with the column type it is bound as
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    #[serde(rename = "type")]
    pub ty: Type,
    pub value: Value,
}

impl TypedValue {
    pub fn new(ty: Type, value: Value) -> Self {
        Self { ty, value }
    }
}
