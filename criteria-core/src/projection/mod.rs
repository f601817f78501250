//! Select-list nodes.
//!
//! Each projection knows how many physical columns it contributes, so a list
//! can hand every child the running column index its `y<N>_` aliases start at.

pub mod projections;


use crate::alias::column_alias;
use crate::criteria::CriteriaId;
use crate::criterion::ALIAS_PLACEHOLDER;
use crate::error::{CriteriaError, CriteriaResult};
use crate::translator::CriteriaQuery;
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// Result-column producing node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Projection {
    Property {
        property: String,
        #[serde(default)]
        grouped: bool,
    },
    Identifier {
        #[serde(default)]
        grouped: bool,
    },
    /// Aggregate function resolved through the dialect's function registry
    Aggregate {
        function: String,
        property: String,
        #[serde(default)]
        distinct: bool,
    },
    RowCount,
    /// Author-supplied select fragment with explicit aliases and types
    Sql {
        sql: String,
        column_aliases: Vec<String>,
        types: Vec<Type>,
        #[serde(default)]
        group_by: Option<String>,
    },
    Alias {
        projection: Box<Projection>,
        alias: String,
    },
    List {
        #[serde(default)]
        projections: Vec<Projection>,
    },
    Distinct {
        projection: Box<Projection>,
    },
}

impl Projection {
    /// Append to a projection list; any other projection becomes the first list entry.
    pub fn add(self, projection: Projection) -> Self {
        match self {
            Projection::List { mut projections } => {
                projections.push(projection);
                Projection::List { projections }
            }
            other => Projection::List {
                projections: vec![other, projection],
            },
        }
    }

    /// Wrap under a user-visible alias.
    pub fn with_alias(self, alias: &str) -> Self {
        Projection::Alias {
            projection: Box::new(self),
            alias: alias.to_string(),
        }
    }

    pub fn is_grouped(&self) -> bool {
        match self {
            Projection::Property { grouped, .. } | Projection::Identifier { grouped } => *grouped,
            Projection::Sql { group_by, .. } => group_by.is_some(),
            Projection::Aggregate { .. } | Projection::RowCount => false,
            Projection::Alias { projection, .. } | Projection::Distinct { projection } => projection.is_grouped(),
            Projection::List { projections } => projections.iter().any(Projection::is_grouped),
        }
    }

    /// Number of physical select-list columns.
    pub fn column_span(&self, query: &CriteriaQuery<'_>) -> CriteriaResult<usize> {
        match self {
            Projection::Property { property, .. } => Ok(query.mapped_columns(CriteriaId::ROOT, property)?.len()),
            Projection::Identifier { .. } => Ok(query.identifier_columns(CriteriaId::ROOT)?.len()),
            Projection::Aggregate { .. } | Projection::RowCount => Ok(1),
            Projection::Sql { column_aliases, .. } => Ok(column_aliases.len()),
            Projection::Alias { projection, .. } | Projection::Distinct { projection } => {
                projection.column_span(query)
            }
            Projection::List { projections } => {
                let mut span = 0;
                for projection in projections {
                    span += projection.column_span(query)?;
                }
                Ok(span)
            }
        }
    }

    /// Select-list fragment whose first column is aliased `y<position>_`.
    pub fn render_select(&self, query: &CriteriaQuery<'_>, position: usize) -> CriteriaResult<String> {
        match self {
            Projection::Property { property, .. } => {
                let columns = query.mapped_columns(CriteriaId::ROOT, property)?;
                Ok(aliased_columns(&columns, position))
            }
            Projection::Identifier { .. } => {
                let columns = query.identifier_columns(CriteriaId::ROOT)?;
                Ok(aliased_columns(&columns, position))
            }
            Projection::Aggregate {
                function,
                property,
                distinct,
            } => {
                let column = aggregate_column(query, function, property)?;
                let function = query.dialect().function(function)?;
                Ok(format!(
                    "{} as {}",
                    function.render(&column, *distinct),
                    column_alias(position)
                ))
            }
            Projection::RowCount => {
                let function = query.dialect().function("count")?;
                Ok(format!("{} as {}", function.render("*", false), column_alias(position)))
            }
            Projection::Sql { sql, .. } => {
                let alias = query.sql_alias(CriteriaId::ROOT, "")?;
                Ok(sql.replace(ALIAS_PLACEHOLDER, alias))
            }
            Projection::Alias { projection, .. } => projection.render_select(query, position),
            Projection::Distinct { projection } => {
                Ok(format!("distinct {}", projection.render_select(query, position)?))
            }
            Projection::List { projections } => {
                let mut position = position;
                let mut parts = Vec::with_capacity(projections.len());
                for projection in projections {
                    parts.push(projection.render_select(query, position)?);
                    position += projection.column_span(query)?;
                }
                Ok(parts.join(", "))
            }
        }
    }

    /// `GROUP BY` fragment; empty when nothing is grouped.
    pub fn render_group_by(&self, query: &CriteriaQuery<'_>) -> CriteriaResult<String> {
        match self {
            Projection::Property { property, grouped: true } => {
                Ok(query.mapped_columns(CriteriaId::ROOT, property)?.join(", "))
            }
            Projection::Identifier { grouped: true } => Ok(query.identifier_columns(CriteriaId::ROOT)?.join(", ")),
            Projection::Sql {
                group_by: Some(group_by),
                ..
            } => {
                let alias = query.sql_alias(CriteriaId::ROOT, "")?;
                Ok(group_by.replace(ALIAS_PLACEHOLDER, alias))
            }
            Projection::Alias { projection, .. } | Projection::Distinct { projection } => {
                projection.render_group_by(query)
            }
            Projection::List { projections } => {
                let mut parts = Vec::new();
                for projection in projections {
                    let part = projection.render_group_by(query)?;
                    if !part.is_empty() {
                        parts.push(part);
                    }
                }
                Ok(parts.join(", "))
            }
            _ => Ok(String::new()),
        }
    }

    /// One semantic type per result value.
    pub fn result_types(&self, query: &CriteriaQuery<'_>) -> CriteriaResult<Vec<Type>> {
        match self {
            Projection::Property { property, .. } => Ok(vec![query.mapped_type(CriteriaId::ROOT, property)?]),
            Projection::Identifier { .. } => Ok(vec![query.identifier_type(CriteriaId::ROOT)?]),
            Projection::Aggregate { function, property, .. } => {
                let argument = query.mapped_type(CriteriaId::ROOT, property)?;
                Ok(vec![query.dialect().function(function)?.return_type(&argument)])
            }
            Projection::RowCount => Ok(vec![query.dialect().function("count")?.return_type(&Type::Long)]),
            Projection::Sql { types, .. } => Ok(types.clone()),
            Projection::Alias { projection, .. } | Projection::Distinct { projection } => {
                projection.result_types(query)
            }
            Projection::List { projections } => {
                let mut types = Vec::new();
                for projection in projections {
                    types.extend(projection.result_types(query)?);
                }
                Ok(types)
            }
        }
    }

    /// One `y<N>_` alias per physical column, starting at `position`.
    pub fn column_aliases(&self, query: &CriteriaQuery<'_>, position: usize) -> CriteriaResult<Vec<String>> {
        match self {
            Projection::Sql { column_aliases, .. } => Ok(column_aliases.clone()),
            Projection::Alias { projection, .. } | Projection::Distinct { projection } => {
                projection.column_aliases(query, position)
            }
            Projection::List { projections } => {
                let mut position = position;
                let mut aliases = Vec::new();
                for projection in projections {
                    let child = projection.column_aliases(query, position)?;
                    position += child.len();
                    aliases.extend(child);
                }
                Ok(aliases)
            }
            _ => Ok((position..position + self.column_span(query)?)
                .map(column_alias)
                .collect()),
        }
    }

    /// User-visible alias of every result value, `None` where unaliased.
    pub fn user_aliases(&self) -> Vec<Option<String>> {
        match self {
            Projection::Sql { column_aliases, .. } => column_aliases.iter().cloned().map(Some).collect(),
            Projection::Alias { projection, alias } => {
                let mut aliases = projection.user_aliases();
                match aliases.first_mut() {
                    Some(first) => *first = Some(alias.clone()),
                    None => aliases.push(Some(alias.clone())),
                }
                aliases
            }
            Projection::Distinct { projection } => projection.user_aliases(),
            Projection::List { projections } => projections.iter().flat_map(Projection::user_aliases).collect(),
            _ => vec![None],
        }
    }

    /// Result types of the projection aliased `alias`, if any.
    pub fn types_for_alias(&self, query: &CriteriaQuery<'_>, alias: &str) -> CriteriaResult<Option<Vec<Type>>> {
        match self {
            Projection::Alias {
                projection,
                alias: own,
            } if own == alias => projection.result_types(query).map(Some),
            Projection::Sql {
                column_aliases, types, ..
            } => Ok(column_aliases
                .iter()
                .position(|a| a == alias)
                .and_then(|i| types.get(i))
                .map(|t| vec![t.clone()])),
            Projection::Distinct { projection } => projection.types_for_alias(query, alias),
            Projection::List { projections } => {
                for projection in projections {
                    if let Some(types) = projection.types_for_alias(query, alias)? {
                        return Ok(Some(types));
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Select-list aliases of the projection aliased `alias`, if any.
    pub fn column_aliases_for_alias(
        &self,
        query: &CriteriaQuery<'_>,
        alias: &str,
        position: usize,
    ) -> CriteriaResult<Option<Vec<String>>> {
        match self {
            Projection::Alias {
                projection,
                alias: own,
            } if own == alias => projection.column_aliases(query, position).map(Some),
            Projection::Sql { column_aliases, .. } => {
                Ok(column_aliases.iter().find(|a| *a == alias).map(|a| vec![a.clone()]))
            }
            Projection::Distinct { projection } => projection.column_aliases_for_alias(query, alias, position),
            Projection::List { projections } => {
                let mut position = position;
                for projection in projections {
                    if let Some(aliases) = projection.column_aliases_for_alias(query, alias, position)? {
                        return Ok(Some(aliases));
                    }
                    position += projection.column_span(query)?;
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

fn aliased_columns(columns: &[String], position: usize) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} as {}", column, column_alias(position + i)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn aggregate_column(query: &CriteriaQuery<'_>, function: &str, property: &str) -> CriteriaResult<String> {
    let mut columns = query.mapped_columns(CriteriaId::ROOT, property)?;
    if columns.len() != 1 {
        return Err(CriteriaError::Query(format!(
            "aggregate {} requires a single-column property: {}",
            function, property
        )));
    }
    Ok(columns.remove(0))
}
