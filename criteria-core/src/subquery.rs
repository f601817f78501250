//! Subquery predicates.
//!
//! The embedded criteria is compiled in its own nested scope. A literal left
//! operand is bound before the subquery's own values, matching their textual
//! order in `? op quantifier (select ...)`.

use crate::criteria::{CriteriaId, DetachedCriteria};
use crate::error::{CriteriaError, CriteriaResult};
use crate::sink::SqlFragment;
use crate::translator::CriteriaQuery;
use crate::types::Type;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubqueryOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Exists,
    NotExists,
}

impl SubqueryOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SubqueryOperator::Eq => "=",
            SubqueryOperator::Ne => "<>",
            SubqueryOperator::Lt => "<",
            SubqueryOperator::Le => "<=",
            SubqueryOperator::Gt => ">",
            SubqueryOperator::Ge => ">=",
            SubqueryOperator::In => "in",
            SubqueryOperator::NotIn => "not in",
            SubqueryOperator::Exists => "exists",
            SubqueryOperator::NotExists => "not exists",
        }
    }

    fn is_existence(&self) -> bool {
        matches!(self, SubqueryOperator::Exists | SubqueryOperator::NotExists)
    }

    /// Operators that accept an `all`/`any`/`some` quantifier
    fn is_comparison(&self) -> bool {
        !matches!(
            self,
            SubqueryOperator::In | SubqueryOperator::NotIn | SubqueryOperator::Exists | SubqueryOperator::NotExists
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    #[default]
    None,
    All,
    Any,
    Some,
}

impl Quantifier {
    fn as_sql(&self) -> &'static str {
        match self {
            Quantifier::None => "",
            Quantifier::All => "all ",
            Quantifier::Any => "any ",
            Quantifier::Some => "some ",
        }
    }
}

/// Left-hand side of a subquery comparison
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubqueryOperand {
    #[default]
    None,
    Value(Value),
    Property(String),
    /// Column tuple of several properties, `(a, b) in (select ...)`
    Properties(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubqueryExpression {
    #[serde(default)]
    pub left: SubqueryOperand,
    pub op: SubqueryOperator,
    #[serde(default)]
    pub quantifier: Quantifier,
    pub criteria: Box<DetachedCriteria>,
}

impl SubqueryExpression {
    pub fn render(&self, query: &CriteriaQuery<'_>, crit: CriteriaId, out: &mut SqlFragment) -> CriteriaResult<()> {
        let existence = self.op.is_existence();
        match (&self.left, existence) {
            (SubqueryOperand::None, false) => {
                return Err(CriteriaError::Query(format!(
                    "subquery operator {} requires a left operand",
                    self.op.as_sql()
                )))
            }
            (SubqueryOperand::None, true) => {}
            (_, true) => {
                return Err(CriteriaError::Query(format!(
                    "subquery operator {} takes no left operand",
                    self.op.as_sql()
                )))
            }
            (SubqueryOperand::Properties(properties), false) if properties.is_empty() => {
                return Err(CriteriaError::Query(
                    "subquery comparison needs at least one property".to_string(),
                ))
            }
            _ => {}
        }
        if self.quantifier != Quantifier::None && !self.op.is_comparison() {
            return Err(CriteriaError::Query(format!(
                "quantifier {} cannot be combined with subquery operator {}",
                self.quantifier.as_sql().trim_end(),
                self.op.as_sql()
            )));
        }

        let inner = query.subquery(&self.criteria)?;
        let (subselect, types) = inner.render_subselect()?;
        let metadata = query.metadata();

        match &self.left {
            SubqueryOperand::None => {}
            SubqueryOperand::Value(value) => {
                let [ty] = types.as_slice() else {
                    return Err(CriteriaError::Query(format!(
                        "subquery compared with a value must project exactly one result, found {}",
                        types.len()
                    )));
                };
                out.push_param_tuple(ty.disassemble(value, metadata)?);
                out.push_sql(" ");
            }
            SubqueryOperand::Property(property) => {
                let columns = query.columns(crit, property)?;
                push_column_tuple(query, property, columns, &types, out)?;
            }
            SubqueryOperand::Properties(properties) => {
                let mut columns = Vec::new();
                for property in properties {
                    columns.extend(query.columns(crit, property)?);
                }
                push_column_tuple(query, &properties.join(", "), columns, &types, out)?;
            }
        }

        out.push_sql(self.op.as_sql()).push_sql(" ");
        out.push_sql(self.quantifier.as_sql());
        out.push_sql("(").append(subselect).push_sql(")");
        Ok(())
    }
}

/// Left-hand columns, checked against the width of the subquery's select list.
fn push_column_tuple(
    query: &CriteriaQuery<'_>,
    described: &str,
    columns: Vec<String>,
    types: &[Type],
    out: &mut SqlFragment,
) -> CriteriaResult<()> {
    let metadata = query.metadata();
    let mut span = 0;
    for ty in types {
        span += ty.column_span(metadata)?;
    }
    if span != columns.len() {
        return Err(CriteriaError::Query(format!(
            "property {} spans {} columns but the subquery returns {}",
            described,
            columns.len(),
            span
        )));
    }
    if columns.len() > 1 {
        out.push_sql(&format!("({})", columns.join(", ")));
    } else {
        out.push_sql(&columns.join(", "));
    }
    out.push_sql(" ");
    Ok(())
}

/// Factory functions for subquery predicates.
pub mod subqueries {
    use super::{Quantifier, SubqueryExpression, SubqueryOperand, SubqueryOperator};
    use crate::criteria::DetachedCriteria;
    use crate::criterion::Criterion;
    use serde_json::Value;

    fn build(left: SubqueryOperand, op: SubqueryOperator, quantifier: Quantifier, criteria: DetachedCriteria) -> Criterion {
        Criterion::Subquery(SubqueryExpression {
            left,
            op,
            quantifier,
            criteria: Box::new(criteria),
        })
    }

    /// `property op [quantifier] (subquery)`
    pub fn property(property: &str, op: SubqueryOperator, quantifier: Quantifier, criteria: DetachedCriteria) -> Criterion {
        build(SubqueryOperand::Property(property.to_string()), op, quantifier, criteria)
    }

    /// `? op [quantifier] (subquery)`
    pub fn value(value: impl Into<Value>, op: SubqueryOperator, quantifier: Quantifier, criteria: DetachedCriteria) -> Criterion {
        build(SubqueryOperand::Value(value.into()), op, quantifier, criteria)
    }

    pub fn exists(criteria: DetachedCriteria) -> Criterion {
        build(SubqueryOperand::None, SubqueryOperator::Exists, Quantifier::None, criteria)
    }

    pub fn not_exists(criteria: DetachedCriteria) -> Criterion {
        build(SubqueryOperand::None, SubqueryOperator::NotExists, Quantifier::None, criteria)
    }

    /// `(a, b, ...) op [quantifier] (subquery)`
    pub fn properties(names: &[&str], op: SubqueryOperator, quantifier: Quantifier, criteria: DetachedCriteria) -> Criterion {
        let names = names.iter().map(|n| n.to_string()).collect();
        build(SubqueryOperand::Properties(names), op, quantifier, criteria)
    }

    pub fn properties_in(names: &[&str], criteria: DetachedCriteria) -> Criterion {
        properties(names, SubqueryOperator::In, Quantifier::None, criteria)
    }

    pub fn properties_not_in(names: &[&str], criteria: DetachedCriteria) -> Criterion {
        properties(names, SubqueryOperator::NotIn, Quantifier::None, criteria)
    }

    pub fn properties_eq(names: &[&str], criteria: DetachedCriteria) -> Criterion {
        properties(names, SubqueryOperator::Eq, Quantifier::None, criteria)
    }

    pub fn properties_ne(names: &[&str], criteria: DetachedCriteria) -> Criterion {
        properties(names, SubqueryOperator::Ne, Quantifier::None, criteria)
    }

    pub fn property_in(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::In, Quantifier::None, criteria)
    }

    pub fn property_not_in(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::NotIn, Quantifier::None, criteria)
    }

    pub fn property_eq(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Eq, Quantifier::None, criteria)
    }

    pub fn property_ne(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Ne, Quantifier::None, criteria)
    }

    pub fn property_gt(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Gt, Quantifier::None, criteria)
    }

    pub fn property_ge(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Ge, Quantifier::None, criteria)
    }

    pub fn property_lt(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Lt, Quantifier::None, criteria)
    }

    pub fn property_le(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Le, Quantifier::None, criteria)
    }

    pub fn property_eq_all(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Eq, Quantifier::All, criteria)
    }

    pub fn property_gt_all(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Gt, Quantifier::All, criteria)
    }

    pub fn property_lt_all(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Lt, Quantifier::All, criteria)
    }

    pub fn property_gt_some(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Gt, Quantifier::Some, criteria)
    }

    pub fn property_lt_some(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Lt, Quantifier::Some, criteria)
    }

    pub fn property_eq_any(name: &str, criteria: DetachedCriteria) -> Criterion {
        property(name, SubqueryOperator::Eq, Quantifier::Any, criteria)
    }

    pub fn eq(literal: impl Into<Value>, criteria: DetachedCriteria) -> Criterion {
        value(literal, SubqueryOperator::Eq, Quantifier::None, criteria)
    }

    pub fn value_in(literal: impl Into<Value>, criteria: DetachedCriteria) -> Criterion {
        value(literal, SubqueryOperator::In, Quantifier::None, criteria)
    }

    pub fn value_not_in(literal: impl Into<Value>, criteria: DetachedCriteria) -> Criterion {
        value(literal, SubqueryOperator::NotIn, Quantifier::None, criteria)
    }

    pub fn eq_all(literal: impl Into<Value>, criteria: DetachedCriteria) -> Criterion {
        value(literal, SubqueryOperator::Eq, Quantifier::All, criteria)
    }

    pub fn gt_all(literal: impl Into<Value>, criteria: DetachedCriteria) -> Criterion {
        value(literal, SubqueryOperator::Gt, Quantifier::All, criteria)
    }

    pub fn gt_some(literal: impl Into<Value>, criteria: DetachedCriteria) -> Criterion {
        value(literal, SubqueryOperator::Gt, Quantifier::Some, criteria)
    }

    pub fn lt_some(literal: impl Into<Value>, criteria: DetachedCriteria) -> Criterion {
        value(literal, SubqueryOperator::Lt, Quantifier::Some, criteria)
    }
}
