//! Predicate nodes.
//!
//! A [`Criterion`] renders to a SQL boolean expression. Rendering writes
//! through a [`SqlFragment`], so every emitted `?` carries its typed value in
//! the same call.

pub mod restrictions;


use crate::criteria::CriteriaId;
use crate::error::{CriteriaError, CriteriaResult};
use crate::example::Example;
use crate::sink::SqlFragment;
use crate::subquery::SubqueryExpression;
use crate::translator::CriteriaQuery;
use crate::types::{Type, TypedValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder in raw SQL replaced by the criteria's table alias
pub const ALIAS_PLACEHOLDER: &str = "{alias}";

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

/// Wildcard placement for LIKE matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact,
    Start,
    End,
    Anywhere,
}

impl MatchMode {
    pub fn to_match_string(&self, pattern: &str) -> String {
        match self {
            MatchMode::Exact => pattern.to_string(),
            MatchMode::Start => format!("{}%", pattern),
            MatchMode::End => format!("%{}", pattern),
            MatchMode::Anywhere => format!("%{}%", pattern),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    fn as_sql(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

/// Boolean condition in a criteria tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criterion {
    /// `property OP value`
    Compare {
        property: String,
        op: Operator,
        value: Value,
        #[serde(default)]
        ignore_case: bool,
    },
    /// `property OP other`
    PropertyCompare {
        property: String,
        other: String,
        op: Operator,
    },
    /// Identifier equality
    IdEq { value: Value },
    Null {
        property: String,
        #[serde(default)]
        negated: bool,
    },
    /// Collection emptiness, `[not] exists (select 1 ...)`
    Empty {
        property: String,
        #[serde(default)]
        negated: bool,
    },
    /// `? OP (select count(*) ...)`; the literal size is the left operand
    Size {
        property: String,
        op: Operator,
        size: i64,
    },
    In {
        property: String,
        values: Vec<Value>,
    },
    Between {
        property: String,
        lo: Value,
        hi: Value,
    },
    Like {
        property: String,
        value: String,
        #[serde(default)]
        mode: MatchMode,
        #[serde(default)]
        escape: Option<char>,
        #[serde(default)]
        ignore_case: bool,
    },
    /// Author-supplied SQL; `{alias}` is replaced by the table alias
    Sql {
        sql: String,
        #[serde(default)]
        values: Vec<TypedValue>,
    },
    Not { criterion: Box<Criterion> },
    Logical {
        op: LogicalOperator,
        lhs: Box<Criterion>,
        rhs: Box<Criterion>,
    },
    /// N-ary conjunction or disjunction
    Junction {
        op: LogicalOperator,
        #[serde(default)]
        criteria: Vec<Criterion>,
    },
    Subquery(SubqueryExpression),
    /// Equality on each natural-id property
    NaturalId {
        #[serde(default)]
        values: Vec<(String, Value)>,
    },
    Example(Example),
}

impl Criterion {
    /// Compare case-insensitively; only affects `Compare` and `Like`.
    pub fn ignore_case(mut self) -> Self {
        match &mut self {
            Criterion::Compare { ignore_case, .. } | Criterion::Like { ignore_case, .. } => {
                *ignore_case = true;
            }
            _ => {}
        }
        self
    }

    /// Add a child to a junction or natural-id set; other criteria are combined
    /// into a conjunction.
    pub fn add(self, criterion: Criterion) -> Self {
        match self {
            Criterion::Junction { op, mut criteria } => {
                criteria.push(criterion);
                Criterion::Junction { op, criteria }
            }
            other => Criterion::Junction {
                op: LogicalOperator::And,
                criteria: vec![other, criterion],
            },
        }
    }

    /// Set a natural-id property value.
    pub fn set(self, property: &str, value: Value) -> Self {
        match self {
            Criterion::NaturalId { mut values } => {
                values.push((property.to_string(), value));
                Criterion::NaturalId { values }
            }
            other => other.add(Criterion::NaturalId {
                values: vec![(property.to_string(), value)],
            }),
        }
    }

    /// Render into `out` in the context of criteria `crit`.
    pub fn render(&self, query: &CriteriaQuery<'_>, crit: CriteriaId, out: &mut SqlFragment) -> CriteriaResult<()> {
        match self {
            Criterion::Compare {
                property,
                op,
                value,
                ignore_case,
            } => render_compare(query, crit, property, *op, value, *ignore_case, out),
            Criterion::PropertyCompare { property, other, op } => {
                let lhs = query.columns(crit, property)?;
                let rhs = query.columns(crit, other)?;
                if lhs.len() != rhs.len() {
                    return Err(CriteriaError::Query(format!(
                        "cannot compare {} ({} columns) with {} ({} columns)",
                        property,
                        lhs.len(),
                        other,
                        rhs.len()
                    )));
                }
                let parts: Vec<String> = lhs
                    .iter()
                    .zip(rhs.iter())
                    .map(|(l, r)| format!("{}{}{}", l, op.as_sql(), r))
                    .collect();
                push_joined(out, &parts, " and ");
                Ok(())
            }
            Criterion::IdEq { value } => {
                let columns = query.identifier_columns(crit)?;
                let values = query.identifier_type(crit)?.disassemble(value, query.metadata())?;
                render_column_comparisons(out, &columns, Operator::Eq, values)
            }
            Criterion::Null { property, negated } => {
                let columns = query.columns(crit, property)?;
                let (suffix, separator) = if *negated {
                    (" is not null", " or ")
                } else {
                    (" is null", " and ")
                };
                let parts: Vec<String> = columns.iter().map(|c| format!("{}{}", c, suffix)).collect();
                push_joined(out, &parts, separator);
                Ok(())
            }
            Criterion::Empty { property, negated } => {
                let (table, correlation) = collection_correlation(query, crit, property)?;
                out.push_sql(if *negated { "exists " } else { "not exists " });
                out.push_sql(&format!("(select 1 from {} where {})", table, correlation));
                Ok(())
            }
            Criterion::Size { property, op, size } => {
                let (table, correlation) = collection_correlation(query, crit, property)?;
                out.push_param(TypedValue::new(Type::Integer, Value::from(*size)));
                out.push_sql(&format!(
                    " {} (select count(*) from {} where {})",
                    op.as_sql(),
                    table,
                    correlation
                ));
                Ok(())
            }
            Criterion::In { property, values } => render_in(query, crit, property, values, out),
            Criterion::Between { property, lo, hi } => {
                let columns = query.columns(crit, property)?;
                let lo = query.typed_values(crit, property, lo)?;
                let hi = query.typed_values(crit, property, hi)?;
                check_arity(property, &columns, &lo)?;
                check_arity(property, &columns, &hi)?;
                let multi = columns.len() > 1;
                if multi {
                    out.push_sql("(");
                }
                for (i, ((column, lo), hi)) in columns.iter().zip(lo).zip(hi).enumerate() {
                    if i > 0 {
                        out.push_sql(" and ");
                    }
                    out.push_sql(column).push_sql(" between ");
                    out.push_param(lo).push_sql(" and ").push_param(hi);
                }
                if multi {
                    out.push_sql(")");
                }
                Ok(())
            }
            Criterion::Like {
                property,
                value,
                mode,
                escape,
                ignore_case,
            } => render_like(query, crit, property, value, *mode, *escape, *ignore_case, out),
            Criterion::Sql { sql, values } => {
                let alias = query.sql_alias(crit, "")?;
                out.push_raw(&sql.replace(ALIAS_PLACEHOLDER, alias), values);
                Ok(())
            }
            Criterion::Not { criterion } => {
                let mut inner = SqlFragment::new();
                criterion.render(query, crit, &mut inner)?;
                if !inner.is_empty() {
                    let (prefix, suffix) = query.dialect().not_wrapping();
                    inner.wrap(prefix, suffix);
                }
                out.append(inner);
                Ok(())
            }
            Criterion::Logical { op, lhs, rhs } => {
                out.push_sql("(");
                lhs.render(query, crit, out)?;
                out.push_sql(" ").push_sql(op.as_sql()).push_sql(" ");
                rhs.render(query, crit, out)?;
                out.push_sql(")");
                Ok(())
            }
            Criterion::Junction { op, criteria } => {
                let mut fragments = Vec::with_capacity(criteria.len());
                for criterion in criteria {
                    let mut fragment = SqlFragment::new();
                    criterion.render(query, crit, &mut fragment)?;
                    fragments.push(fragment);
                }
                push_junction(out, fragments, op.as_sql());
                Ok(())
            }
            Criterion::Subquery(subquery) => subquery.render(query, crit, out),
            Criterion::NaturalId { values } => {
                let mut fragments = Vec::with_capacity(values.len());
                for (property, value) in values {
                    let mut fragment = SqlFragment::new();
                    render_compare(query, crit, property, Operator::Eq, value, false, &mut fragment)?;
                    fragments.push(fragment);
                }
                push_junction(out, fragments, "and");
                Ok(())
            }
            Criterion::Example(example) => example.render(query, crit, out),
        }
    }
}

/// Join fragments with ` and `/` or `; several survivors are parenthesized and
/// none at all renders as `1=1`.
pub(crate) fn push_junction(out: &mut SqlFragment, fragments: Vec<SqlFragment>, op: &str) {
    let (mut joined, count) = SqlFragment::join(fragments, &format!(" {} ", op));
    match count {
        0 => {
            out.push_sql("1=1");
        }
        1 => {
            out.append(joined);
        }
        _ => {
            joined.wrap("(", ")");
            out.append(joined);
        }
    }
}

fn push_joined(out: &mut SqlFragment, parts: &[String], separator: &str) {
    let joined = parts.join(separator);
    if parts.len() > 1 {
        out.push_sql("(").push_sql(&joined).push_sql(")");
    } else {
        out.push_sql(&joined);
    }
}

fn check_arity(property: &str, columns: &[String], values: &[TypedValue]) -> CriteriaResult<()> {
    if columns.len() != values.len() {
        return Err(CriteriaError::Query(format!(
            "value for {} spans {} columns, expected {}",
            property,
            values.len(),
            columns.len()
        )));
    }
    Ok(())
}

fn render_column_comparisons(
    out: &mut SqlFragment,
    columns: &[String],
    op: Operator,
    values: Vec<TypedValue>,
) -> CriteriaResult<()> {
    if columns.len() != values.len() {
        return Err(CriteriaError::Query(format!(
            "{} values supplied for {} columns",
            values.len(),
            columns.len()
        )));
    }
    let multi = columns.len() > 1;
    if multi {
        out.push_sql("(");
    }
    for (i, (column, value)) in columns.iter().zip(values).enumerate() {
        if i > 0 {
            out.push_sql(" and ");
        }
        out.push_sql(column).push_sql(op.as_sql());
        out.push_param(value);
    }
    if multi {
        out.push_sql(")");
    }
    Ok(())
}

fn render_compare(
    query: &CriteriaQuery<'_>,
    crit: CriteriaId,
    property: &str,
    op: Operator,
    value: &Value,
    ignore_case: bool,
    out: &mut SqlFragment,
) -> CriteriaResult<()> {
    let columns = query.columns(crit, property)?;
    let ty = query.property_type(crit, property)?;
    let metadata = query.metadata();
    let column_types = ty.column_types(metadata)?;
    let mut values = ty.disassemble(value, metadata)?;
    check_arity(property, &columns, &values)?;

    let mut lowered = Vec::with_capacity(columns.len());
    for (column, (column_type, value)) in columns.iter().zip(column_types.iter().zip(values.iter_mut())) {
        let lower = ignore_case && column_type.is_character();
        if lower {
            if let Value::String(s) = &value.value {
                value.value = Value::String(s.to_lowercase());
            }
            lowered.push(query.dialect().lower(column));
        } else {
            lowered.push(column.clone());
        }
    }
    render_column_comparisons(out, &lowered, op, values)
}

#[allow(clippy::too_many_arguments)]
fn render_like(
    query: &CriteriaQuery<'_>,
    crit: CriteriaId,
    property: &str,
    value: &str,
    mode: MatchMode,
    escape: Option<char>,
    ignore_case: bool,
    out: &mut SqlFragment,
) -> CriteriaResult<()> {
    let columns = query.columns(crit, property)?;
    let [column] = columns.as_slice() else {
        return Err(CriteriaError::Query(format!(
            "Like may only be used with single-column properties: {}",
            property
        )));
    };
    let dialect = query.dialect();
    let mut pattern = mode.to_match_string(value);
    if ignore_case {
        pattern = pattern.to_lowercase();
        if dialect.supports_ilike {
            out.push_sql(column).push_sql(" ilike ");
        } else {
            out.push_sql(&dialect.lower(column)).push_sql(" like ");
        }
    } else {
        out.push_sql(column).push_sql(" like ");
    }
    out.push_param(TypedValue::new(Type::String, Value::String(pattern)));
    if let Some(escape) = escape {
        out.push_sql(&format!(" escape '{}'", escape.to_string().replace('\'', "''")));
    }
    Ok(())
}

fn render_in(
    query: &CriteriaQuery<'_>,
    crit: CriteriaId,
    property: &str,
    values: &[Value],
    out: &mut SqlFragment,
) -> CriteriaResult<()> {
    let columns = query.columns(crit, property)?;
    let dialect = query.dialect();
    if values.is_empty() {
        match dialect.empty_in_list {
            crate::dialect::EmptyInList::AlwaysFalse => {
                out.push_sql("1=0");
            }
            crate::dialect::EmptyInList::Literal => {
                out.push_sql(&column_tuple(&columns)).push_sql(" in ()");
            }
        }
        return Ok(());
    }

    let mut expanded = Vec::with_capacity(values.len());
    for value in values {
        let typed = query.typed_values(crit, property, value)?;
        check_arity(property, &columns, &typed)?;
        expanded.push(typed);
    }

    if dialect.supports_row_value_in_list || columns.len() == 1 {
        out.push_sql(&column_tuple(&columns)).push_sql(" in (");
        for (i, typed) in expanded.into_iter().enumerate() {
            if i > 0 {
                out.push_sql(", ");
            }
            out.push_param_tuple(typed);
        }
        out.push_sql(")");
    } else {
        out.push_sql("( ");
        for (i, typed) in expanded.into_iter().enumerate() {
            if i > 0 {
                out.push_sql(" or ");
            }
            render_column_comparisons(out, &columns, Operator::Eq, typed)?;
        }
        out.push_sql(" )");
    }
    Ok(())
}

fn column_tuple(columns: &[String]) -> String {
    if columns.len() > 1 {
        format!("({})", columns.join(", "))
    } else {
        columns.join(", ")
    }
}

/// Collection table and the condition tying its key columns to the owner's identifier.
fn collection_correlation(
    query: &CriteriaQuery<'_>,
    crit: CriteriaId,
    property: &str,
) -> CriteriaResult<(String, String)> {
    let (scope, owner_property) = query.locate(crit, property)?;
    let collection = query.queryable_collection(scope.entity, owner_property)?;
    let owner_keys = &scope.entity.identifier.columns;
    if owner_keys.len() != collection.key_columns.len() {
        return Err(CriteriaError::Query(format!(
            "collection {} has {} key columns but its owner identifier has {}",
            collection.role,
            collection.key_columns.len(),
            owner_keys.len()
        )));
    }
    let correlation = owner_keys
        .iter()
        .zip(collection.key_columns.iter())
        .map(|(owner, key)| format!("{}.{}={}", scope.sql_alias, owner, key))
        .collect::<Vec<_>>()
        .join(" and ");
    Ok((collection.table.clone(), correlation))
}
