//! Factory functions for built-in criteria.

use super::{Criterion, LogicalOperator, MatchMode, Operator};
use crate::types::TypedValue;
use serde_json::Value;

fn compare(property: &str, op: Operator, value: Value) -> Criterion {
    Criterion::Compare {
        property: property.to_string(),
        op,
        value,
        ignore_case: false,
    }
}

pub fn eq(property: &str, value: impl Into<Value>) -> Criterion {
    compare(property, Operator::Eq, value.into())
}

pub fn ne(property: &str, value: impl Into<Value>) -> Criterion {
    compare(property, Operator::Ne, value.into())
}

pub fn lt(property: &str, value: impl Into<Value>) -> Criterion {
    compare(property, Operator::Lt, value.into())
}

pub fn le(property: &str, value: impl Into<Value>) -> Criterion {
    compare(property, Operator::Le, value.into())
}

pub fn gt(property: &str, value: impl Into<Value>) -> Criterion {
    compare(property, Operator::Gt, value.into())
}

pub fn ge(property: &str, value: impl Into<Value>) -> Criterion {
    compare(property, Operator::Ge, value.into())
}

/// `eq`, or `is null` when the value is null
pub fn eq_or_is_null(property: &str, value: impl Into<Value>) -> Criterion {
    let value = value.into();
    if value.is_null() {
        is_null(property)
    } else {
        eq(property, value)
    }
}

/// `ne`, or `is not null` when the value is null
pub fn ne_or_is_not_null(property: &str, value: impl Into<Value>) -> Criterion {
    let value = value.into();
    if value.is_null() {
        is_not_null(property)
    } else {
        ne(property, value)
    }
}

pub fn id_eq(value: impl Into<Value>) -> Criterion {
    Criterion::IdEq { value: value.into() }
}

fn property_compare(property: &str, other: &str, op: Operator) -> Criterion {
    Criterion::PropertyCompare {
        property: property.to_string(),
        other: other.to_string(),
        op,
    }
}

pub fn eq_property(property: &str, other: &str) -> Criterion {
    property_compare(property, other, Operator::Eq)
}

pub fn ne_property(property: &str, other: &str) -> Criterion {
    property_compare(property, other, Operator::Ne)
}

pub fn lt_property(property: &str, other: &str) -> Criterion {
    property_compare(property, other, Operator::Lt)
}

pub fn le_property(property: &str, other: &str) -> Criterion {
    property_compare(property, other, Operator::Le)
}

pub fn gt_property(property: &str, other: &str) -> Criterion {
    property_compare(property, other, Operator::Gt)
}

pub fn ge_property(property: &str, other: &str) -> Criterion {
    property_compare(property, other, Operator::Ge)
}

/// Exact-match `like`; the value may carry its own wildcards
pub fn like(property: &str, value: &str) -> Criterion {
    like_mode(property, value, MatchMode::Exact)
}

pub fn like_mode(property: &str, value: &str, mode: MatchMode) -> Criterion {
    Criterion::Like {
        property: property.to_string(),
        value: value.to_string(),
        mode,
        escape: None,
        ignore_case: false,
    }
}

pub fn like_escaped(property: &str, value: &str, mode: MatchMode, escape: char, ignore_case: bool) -> Criterion {
    Criterion::Like {
        property: property.to_string(),
        value: value.to_string(),
        mode,
        escape: Some(escape),
        ignore_case,
    }
}

pub fn ilike(property: &str, value: &str) -> Criterion {
    like(property, value).ignore_case()
}

pub fn ilike_mode(property: &str, value: &str, mode: MatchMode) -> Criterion {
    like_mode(property, value, mode).ignore_case()
}

pub fn is_null(property: &str) -> Criterion {
    Criterion::Null {
        property: property.to_string(),
        negated: false,
    }
}

pub fn is_not_null(property: &str) -> Criterion {
    Criterion::Null {
        property: property.to_string(),
        negated: true,
    }
}

pub fn is_empty(property: &str) -> Criterion {
    Criterion::Empty {
        property: property.to_string(),
        negated: false,
    }
}

pub fn is_not_empty(property: &str) -> Criterion {
    Criterion::Empty {
        property: property.to_string(),
        negated: true,
    }
}

fn size(property: &str, op: Operator, size: i64) -> Criterion {
    Criterion::Size {
        property: property.to_string(),
        op,
        size,
    }
}

// The size literal is the left operand of `? OP (select count(*) ...)`, so the
// ordering factories pass the mirrored operator.

pub fn size_eq(property: &str, n: i64) -> Criterion {
    size(property, Operator::Eq, n)
}

pub fn size_ne(property: &str, n: i64) -> Criterion {
    size(property, Operator::Ne, n)
}

pub fn size_gt(property: &str, n: i64) -> Criterion {
    size(property, Operator::Lt, n)
}

pub fn size_lt(property: &str, n: i64) -> Criterion {
    size(property, Operator::Gt, n)
}

pub fn size_ge(property: &str, n: i64) -> Criterion {
    size(property, Operator::Le, n)
}

pub fn size_le(property: &str, n: i64) -> Criterion {
    size(property, Operator::Ge, n)
}

pub fn in_values<I, V>(property: &str, values: I) -> Criterion
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Criterion::In {
        property: property.to_string(),
        values: values.into_iter().map(Into::into).collect(),
    }
}

pub fn between(property: &str, lo: impl Into<Value>, hi: impl Into<Value>) -> Criterion {
    Criterion::Between {
        property: property.to_string(),
        lo: lo.into(),
        hi: hi.into(),
    }
}

pub fn sql_restriction(sql: &str) -> Criterion {
    sql_restriction_with(sql, Vec::new())
}

pub fn sql_restriction_with(sql: &str, values: Vec<TypedValue>) -> Criterion {
    Criterion::Sql {
        sql: sql.to_string(),
        values,
    }
}

pub fn not(criterion: Criterion) -> Criterion {
    Criterion::Not {
        criterion: Box::new(criterion),
    }
}

pub fn and(lhs: Criterion, rhs: Criterion) -> Criterion {
    Criterion::Logical {
        op: LogicalOperator::And,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

pub fn or(lhs: Criterion, rhs: Criterion) -> Criterion {
    Criterion::Logical {
        op: LogicalOperator::Or,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

pub fn conjunction(criteria: Vec<Criterion>) -> Criterion {
    Criterion::Junction {
        op: LogicalOperator::And,
        criteria,
    }
}

pub fn disjunction(criteria: Vec<Criterion>) -> Criterion {
    Criterion::Junction {
        op: LogicalOperator::Or,
        criteria,
    }
}

/// Conjunction of `eq` for every entry; null values become `is null`
pub fn all_eq<I, V>(values: I) -> Criterion
where
    I: IntoIterator<Item = (String, V)>,
    V: Into<Value>,
{
    conjunction(
        values
            .into_iter()
            .map(|(property, value)| eq_or_is_null(&property, value))
            .collect(),
    )
}

/// Start a natural-id conjunction, filled with [`Criterion::set`]
pub fn natural_id() -> Criterion {
    Criterion::NaturalId { values: Vec::new() }
}
