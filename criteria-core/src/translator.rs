//! Per-compilation resolution scope and statement assembly.
//!
//! A [`CriteriaQuery`] is created for one compilation of one criteria tree.
//! It maps every criteria of the tree to its entity and SQL alias, resolves
//! property paths to qualified columns, and owns the alias allocator. A
//! subquery gets its own `CriteriaQuery` whose unresolved properties fall back
//! to the enclosing one, which is how correlated subqueries reach outer columns.

use crate::alias::AliasAllocator;
use crate::criteria::{CriteriaId, DetachedCriteria, JoinType, ResultTransformer};
use crate::criterion::Criterion;
use crate::dialect::{Dialect, SqlFunction};
use crate::error::{CriteriaError, CriteriaResult};
use crate::metadata::{CollectionMapping, EntityMapping, Metadata, ResolvedProperty};
use crate::sink::SqlFragment;
use crate::types::{Type, TypedValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;

/// A fully compiled statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub sql: String,
    /// One entry per `?`, in textual order
    pub parameters: Vec<TypedValue>,
    pub result_types: Vec<Type>,
    pub column_aliases: Vec<String>,
    pub user_aliases: Vec<Option<String>>,
    pub result_transformer: ResultTransformer,
}

/// Entity and SQL alias bound to one criteria of the tree
#[derive(Debug)]
pub struct Scope<'a> {
    pub(crate) alias: Option<String>,
    pub(crate) entity: &'a EntityMapping,
    pub(crate) sql_alias: String,
    join: Option<Join<'a>>,
}

impl Scope<'_> {
    pub fn entity(&self) -> &EntityMapping {
        self.entity
    }

    pub fn sql_alias(&self) -> &str {
        &self.sql_alias
    }
}

#[derive(Debug)]
struct Join<'a> {
    kind: JoinType,
    table: String,
    on: String,
    with_clause: Option<&'a Criterion>,
}

pub struct CriteriaQuery<'a> {
    metadata: &'a dyn Metadata,
    dialect: &'a Dialect,
    criteria: &'a DetachedCriteria,
    outer: Option<&'a CriteriaQuery<'a>>,
    scopes: Vec<Scope<'a>>,
    allocator: RefCell<AliasAllocator>,
}

impl<'a> CriteriaQuery<'a> {
    pub fn new(
        metadata: &'a dyn Metadata,
        dialect: &'a Dialect,
        criteria: &'a DetachedCriteria,
    ) -> CriteriaResult<Self> {
        Self::build(metadata, dialect, criteria, None, AliasAllocator::new())
    }

    fn build(
        metadata: &'a dyn Metadata,
        dialect: &'a Dialect,
        criteria: &'a DetachedCriteria,
        outer: Option<&'a CriteriaQuery<'a>>,
        mut allocator: AliasAllocator,
    ) -> CriteriaResult<Self> {
        let root = metadata.require_entity(&criteria.entity)?;
        let mut scopes = vec![Scope {
            alias: Some(criteria.alias.clone()),
            entity: root,
            sql_alias: allocator.root_alias(),
            join: None,
        }];

        for (index, sub) in criteria.sub_criteria.iter().enumerate() {
            if sub.parent.0 > index {
                return Err(CriteriaError::Query(format!(
                    "criteria {} refers to unknown parent criteria {}",
                    index + 1,
                    sub.parent.0
                )));
            }
            if let Some(alias) = &sub.alias {
                if scopes.iter().any(|s| s.alias.as_deref() == Some(alias.as_str())) {
                    return Err(CriteriaError::Query(format!("duplicate alias: {}", alias)));
                }
            }

            let (parent_index, property_name) = match sub.path.split_once('.') {
                Some((prefix, rest)) => match scopes.iter().position(|s| s.alias.as_deref() == Some(prefix)) {
                    Some(i) => (i, rest),
                    None => (sub.parent.0, sub.path.as_str()),
                },
                None => (sub.parent.0, sub.path.as_str()),
            };
            let parent_entity = scopes[parent_index].entity;
            let parent_alias = scopes[parent_index].sql_alias.clone();
            let property = parent_entity
                .property(property_name)
                .ok_or_else(|| CriteriaError::property_not_found(&sub.path, &parent_entity.name))?;

            let sql_alias = allocator.next_join_alias(sub.alias.as_deref().unwrap_or(&sub.path));
            let (entity, table, on) = match &property.ty {
                Type::ManyToOne { entity } => {
                    let target = metadata.require_entity(entity)?;
                    let on = correlate(
                        &parent_alias,
                        &property.columns,
                        &sql_alias,
                        &target.identifier.columns,
                        &sub.path,
                    )?;
                    (target, target.table.clone(), on)
                }
                Type::Collection { role } => {
                    let collection = metadata
                        .collection(role)
                        .ok_or_else(|| CriteriaError::Query(format!("collection role not found: {}", role)))?;
                    let element = collection.element.as_deref().ok_or_else(|| {
                        CriteriaError::Mapping(format!(
                            "collection {} does not reference an entity and cannot be joined",
                            role
                        ))
                    })?;
                    let target = metadata.require_entity(element)?;
                    let on = correlate(
                        &parent_alias,
                        &parent_entity.identifier.columns,
                        &sql_alias,
                        &collection.key_columns,
                        &sub.path,
                    )?;
                    (target, collection.table.clone(), on)
                }
                _ => {
                    return Err(CriteriaError::Mapping(format!(
                        "Property path [{}.{}] does not reference an association",
                        parent_entity.name, property_name
                    )))
                }
            };

            scopes.push(Scope {
                alias: sub.alias.clone(),
                entity,
                sql_alias,
                join: Some(Join {
                    kind: sub.join,
                    table,
                    on,
                    with_clause: sub.with_clause.as_ref(),
                }),
            });
        }

        Ok(Self {
            metadata,
            dialect,
            criteria,
            outer,
            scopes,
            allocator: RefCell::new(allocator),
        })
    }

    pub fn metadata(&self) -> &'a dyn Metadata {
        self.metadata
    }

    pub fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    pub fn criteria(&self) -> &'a DetachedCriteria {
        self.criteria
    }

    pub fn function(&self, name: &str) -> CriteriaResult<&'a SqlFunction> {
        self.dialect.function(name)
    }

    pub fn scope(&self, crit: CriteriaId) -> CriteriaResult<&Scope<'a>> {
        self.scopes
            .get(crit.0)
            .ok_or_else(|| CriteriaError::Query(format!("unknown criteria: {}", crit.0)))
    }

    pub fn entity_name(&self, crit: CriteriaId) -> CriteriaResult<&str> {
        Ok(self.scope(crit)?.entity.name.as_str())
    }

    fn scope_by_alias(&self, alias: &str) -> Option<&Scope<'a>> {
        self.scopes
            .iter()
            .find(|s| s.alias.as_deref() == Some(alias))
            .or_else(|| self.outer.and_then(|outer| outer.scope_by_alias(alias)))
    }

    /// Scope a path belongs to and the path relative to that scope's entity.
    ///
    /// A leading segment naming a criteria alias, here or in an enclosing
    /// query, selects that criteria; otherwise the path is relative to `crit`.
    pub fn locate<'p>(&self, crit: CriteriaId, path: &'p str) -> CriteriaResult<(&Scope<'a>, &'p str)> {
        if let Some((prefix, rest)) = path.split_once('.') {
            if let Some(scope) = self.scope_by_alias(prefix) {
                return Ok((scope, rest));
            }
        }
        Ok((self.scope(crit)?, path))
    }

    pub fn sql_alias(&self, crit: CriteriaId, path: &str) -> CriteriaResult<&str> {
        Ok(self.locate(crit, path)?.0.sql_alias.as_str())
    }

    fn resolve(&self, crit: CriteriaId, path: &str) -> CriteriaResult<(&str, ResolvedProperty)> {
        let (scope, property) = self.locate(crit, path)?;
        match scope.entity.resolve(property, self.metadata) {
            Ok(resolved) => Ok((scope.sql_alias.as_str(), resolved)),
            Err(err @ CriteriaError::PropertyNotFound { .. }) => match self.outer {
                Some(outer) => outer.resolve(CriteriaId::ROOT, path).map_err(|_| err),
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Qualified columns of a mapped property, ignoring projection aliases.
    pub fn mapped_columns(&self, crit: CriteriaId, path: &str) -> CriteriaResult<Vec<String>> {
        let (sql_alias, resolved) = self.resolve(crit, path)?;
        if resolved.columns.is_empty() {
            return Err(CriteriaError::Query(format!(
                "property {} does not map to any column",
                path
            )));
        }
        Ok(resolved
            .columns
            .iter()
            .map(|c| format!("{}.{}", sql_alias, c))
            .collect())
    }

    pub fn mapped_type(&self, crit: CriteriaId, path: &str) -> CriteriaResult<Type> {
        Ok(self.resolve(crit, path)?.1.ty)
    }

    /// Columns a restriction or ordering on `path` refers to. A projection
    /// alias resolves to its `y<N>_` result columns.
    pub fn columns(&self, crit: CriteriaId, path: &str) -> CriteriaResult<Vec<String>> {
        if let Some(projection) = &self.criteria.projection {
            if let Some(aliases) = projection.column_aliases_for_alias(self, path, 0)? {
                return Ok(aliases);
            }
        }
        self.mapped_columns(crit, path)
    }

    pub fn property_type(&self, crit: CriteriaId, path: &str) -> CriteriaResult<Type> {
        if let Some(projection) = &self.criteria.projection {
            if let Some(mut types) = projection.types_for_alias(self, path)? {
                if types.len() == 1 {
                    return Ok(types.remove(0));
                }
            }
        }
        self.mapped_type(crit, path)
    }

    /// Leaf type of every column returned by [`CriteriaQuery::columns`].
    pub fn column_types(&self, crit: CriteriaId, path: &str) -> CriteriaResult<Vec<Type>> {
        if let Some(projection) = &self.criteria.projection {
            if let Some(types) = projection.types_for_alias(self, path)? {
                let mut columns = Vec::new();
                for ty in types {
                    columns.extend(ty.column_types(self.metadata)?);
                }
                return Ok(columns);
            }
        }
        self.mapped_type(crit, path)?.column_types(self.metadata)
    }

    /// Bind values of `value` as the type of `path`, one per column.
    pub fn typed_values(&self, crit: CriteriaId, path: &str, value: &Value) -> CriteriaResult<Vec<TypedValue>> {
        self.property_type(crit, path)?.disassemble(value, self.metadata)
    }

    pub fn identifier_columns(&self, crit: CriteriaId) -> CriteriaResult<Vec<String>> {
        let scope = self.scope(crit)?;
        Ok(scope
            .entity
            .identifier
            .columns
            .iter()
            .map(|c| format!("{}.{}", scope.sql_alias, c))
            .collect())
    }

    pub fn identifier_type(&self, crit: CriteriaId) -> CriteriaResult<Type> {
        Ok(self.scope(crit)?.entity.identifier.ty.clone())
    }

    /// The queryable collection mapped by `property` of `entity`.
    pub fn queryable_collection(&self, entity: &EntityMapping, property: &str) -> CriteriaResult<&'a CollectionMapping> {
        let role = match entity.property(property).map(|p| &p.ty) {
            Some(Type::Collection { role }) => role,
            _ => {
                return Err(CriteriaError::Mapping(format!(
                    "Property path [{}.{}] does not reference a collection",
                    entity.name, property
                )))
            }
        };
        let collection = self
            .metadata
            .collection(role)
            .ok_or_else(|| CriteriaError::Query(format!("collection role not found: {}", role)))?;
        if !collection.queryable {
            return Err(CriteriaError::Query(format!(
                "collection role is not queryable: {}",
                role
            )));
        }
        Ok(collection)
    }

    /// Scope for a subquery nested in this one.
    pub fn subquery<'s>(&'s self, criteria: &'s DetachedCriteria) -> CriteriaResult<CriteriaQuery<'s>> {
        let allocator = self.allocator.borrow_mut().nested();
        tracing::trace!("compiling subquery on {} as {}", criteria.entity, allocator.root_alias());
        CriteriaQuery::build(self.metadata, self.dialect, criteria, Some(self), allocator)
    }

    fn render_from(&self) -> CriteriaResult<SqlFragment> {
        let root = self.scope(CriteriaId::ROOT)?;
        let mut out = SqlFragment::new();
        out.push_sql(&format!(" from {} {}", root.entity.table, root.sql_alias));
        for (index, scope) in self.scopes.iter().enumerate() {
            let Some(join) = &scope.join else {
                continue;
            };
            out.push_sql(&format!(
                " {} {} {} on {}",
                join.kind.as_sql(),
                join.table,
                scope.sql_alias,
                join.on
            ));
            if let Some(with_clause) = join.with_clause {
                let mut condition = SqlFragment::new();
                with_clause.render(self, CriteriaId(index), &mut condition)?;
                if !condition.is_empty() {
                    out.push_sql(" and (").append(condition).push_sql(")");
                }
            }
        }
        Ok(out)
    }

    fn render_where(&self) -> CriteriaResult<SqlFragment> {
        let mut fragments = Vec::with_capacity(self.criteria.criteria.len());
        for entry in &self.criteria.criteria {
            let mut fragment = SqlFragment::new();
            entry.criterion.render(self, entry.criteria, &mut fragment)?;
            fragments.push(fragment);
        }
        Ok(SqlFragment::join(fragments, " and ").0)
    }

    /// `select ... from ... [where ...] [group by ...]`
    fn render_body(&self, select: &str) -> CriteriaResult<SqlFragment> {
        let mut out = SqlFragment::new();
        out.push_sql("select ").push_sql(select);
        out.append(self.render_from()?);
        let condition = self.render_where()?;
        if !condition.is_empty() {
            out.push_sql(" where ").append(condition);
        }
        if let Some(projection) = &self.criteria.projection {
            if projection.is_grouped() {
                let group_by = projection.render_group_by(self)?;
                if !group_by.is_empty() {
                    out.push_sql(" group by ").push_sql(&group_by);
                }
            }
        }
        Ok(out)
    }

    /// Render this query as a subselect, returning its SQL and projected types.
    /// Without a projection the subselect returns the root identifier.
    pub fn render_subselect(&self) -> CriteriaResult<(SqlFragment, Vec<Type>)> {
        let paginated = self.criteria.max_results.is_some() || self.criteria.first_result.is_some_and(|f| f > 0);
        if paginated || !self.criteria.orders.is_empty() {
            return Err(CriteriaError::Query(format!(
                "subquery on {} cannot be ordered or paginated",
                self.criteria.entity
            )));
        }
        let (select, types) = match &self.criteria.projection {
            Some(projection) => (projection.render_select(self, 0)?, projection.result_types(self)?),
            None => (
                self.identifier_columns(CriteriaId::ROOT)?.join(", "),
                vec![self.identifier_type(CriteriaId::ROOT)?],
            ),
        };
        let fragment = self.render_body(&select)?;
        tracing::trace!("subquery: {}", fragment.sql());
        Ok((fragment, types))
    }

    /// Compile the whole statement.
    pub fn compile(&self) -> CriteriaResult<CompiledQuery> {
        let root = self.scope(CriteriaId::ROOT)?;
        let (select, result_types, column_aliases, user_aliases) = match &self.criteria.projection {
            Some(projection) => (
                projection.render_select(self, 0)?,
                projection.result_types(self)?,
                projection.column_aliases(self, 0)?,
                projection.user_aliases(),
            ),
            None => (
                root.entity
                    .all_columns()
                    .iter()
                    .map(|c| format!("{}.{}", root.sql_alias, c))
                    .collect::<Vec<_>>()
                    .join(", "),
                vec![Type::many_to_one(root.entity.name.clone())],
                Vec::new(),
                vec![Some(self.criteria.alias.clone())],
            ),
        };

        let mut out = self.render_body(&select)?;

        let mut orders = Vec::with_capacity(self.criteria.orders.len());
        for entry in &self.criteria.orders {
            orders.push(entry.order.render(self, entry.criteria)?);
        }
        if !orders.is_empty() {
            out.push_sql(" order by ").push_sql(&orders.join(", "));
        }
        out.push_sql(
            &self
                .dialect
                .render_limit(self.criteria.first_result, self.criteria.max_results),
        );

        let result_transformer = match self.criteria.result_transformer {
            ResultTransformer::RootEntity if self.criteria.projection.is_some() => ResultTransformer::PassThrough,
            other => other,
        };

        let (sql, parameters) = out.into_parts();
        tracing::debug!(
            "compiled criteria on {}: {} ({} parameters)",
            root.entity.name,
            sql,
            parameters.len()
        );
        Ok(CompiledQuery {
            sql,
            parameters,
            result_types,
            column_aliases,
            user_aliases,
            result_transformer,
        })
    }
}

fn correlate(
    left_alias: &str,
    left: &[String],
    right_alias: &str,
    right: &[String],
    path: &str,
) -> CriteriaResult<String> {
    if left.len() != right.len() {
        return Err(CriteriaError::Query(format!(
            "association {} joins {} columns to {}",
            path,
            left.len(),
            right.len()
        )));
    }
    Ok(left
        .iter()
        .zip(right.iter())
        .map(|(l, r)| format!("{}.{}={}.{}", left_alias, l, right_alias, r))
        .collect::<Vec<_>>()
        .join(" and "))
}
