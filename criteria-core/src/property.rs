//! Fluent builder naming a property once.
//!
//! ```
//! use criteria_core::{DetachedCriteria, Property};
//!
//! let name = Property::for_name("name");
//! let mut criteria = DetachedCriteria::for_entity("Student");
//! criteria.add(name.like("Gav%")).add_order(name.asc());
//! ```

use crate::criteria::DetachedCriteria;
use crate::criterion::{restrictions, Criterion, MatchMode};
use crate::order::Order;
use crate::projection::{projections, Projection};
use crate::subquery::subqueries;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
}

impl Property {
    pub fn for_name(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property of a component or association, e.g. `cityState` then `state`.
    pub fn get_property(&self, name: &str) -> Property {
        Property::for_name(&format!("{}.{}", self.name, name))
    }

    pub fn eq(&self, value: impl Into<Value>) -> Criterion {
        restrictions::eq(&self.name, value)
    }

    pub fn ne(&self, value: impl Into<Value>) -> Criterion {
        restrictions::ne(&self.name, value)
    }

    pub fn gt(&self, value: impl Into<Value>) -> Criterion {
        restrictions::gt(&self.name, value)
    }

    pub fn ge(&self, value: impl Into<Value>) -> Criterion {
        restrictions::ge(&self.name, value)
    }

    pub fn lt(&self, value: impl Into<Value>) -> Criterion {
        restrictions::lt(&self.name, value)
    }

    pub fn le(&self, value: impl Into<Value>) -> Criterion {
        restrictions::le(&self.name, value)
    }

    pub fn eq_or_is_null(&self, value: impl Into<Value>) -> Criterion {
        restrictions::eq_or_is_null(&self.name, value)
    }

    pub fn between(&self, lo: impl Into<Value>, hi: impl Into<Value>) -> Criterion {
        restrictions::between(&self.name, lo, hi)
    }

    pub fn in_values<I, V>(&self, values: I) -> Criterion
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        restrictions::in_values(&self.name, values)
    }

    pub fn like(&self, value: &str) -> Criterion {
        restrictions::like(&self.name, value)
    }

    pub fn like_mode(&self, value: &str, mode: MatchMode) -> Criterion {
        restrictions::like_mode(&self.name, value, mode)
    }

    pub fn ilike(&self, value: &str) -> Criterion {
        restrictions::ilike(&self.name, value)
    }

    pub fn is_null(&self) -> Criterion {
        restrictions::is_null(&self.name)
    }

    pub fn is_not_null(&self) -> Criterion {
        restrictions::is_not_null(&self.name)
    }

    pub fn is_empty(&self) -> Criterion {
        restrictions::is_empty(&self.name)
    }

    pub fn is_not_empty(&self) -> Criterion {
        restrictions::is_not_empty(&self.name)
    }

    pub fn eq_property(&self, other: &str) -> Criterion {
        restrictions::eq_property(&self.name, other)
    }

    pub fn ne_property(&self, other: &str) -> Criterion {
        restrictions::ne_property(&self.name, other)
    }

    pub fn lt_property(&self, other: &str) -> Criterion {
        restrictions::lt_property(&self.name, other)
    }

    pub fn le_property(&self, other: &str) -> Criterion {
        restrictions::le_property(&self.name, other)
    }

    pub fn gt_property(&self, other: &str) -> Criterion {
        restrictions::gt_property(&self.name, other)
    }

    pub fn ge_property(&self, other: &str) -> Criterion {
        restrictions::ge_property(&self.name, other)
    }

    pub fn asc(&self) -> Order {
        Order::asc(&self.name)
    }

    pub fn desc(&self) -> Order {
        Order::desc(&self.name)
    }

    pub fn projection(&self) -> Projection {
        projections::property(&self.name)
    }

    pub fn group(&self) -> Projection {
        projections::group_property(&self.name)
    }

    pub fn count(&self) -> Projection {
        projections::count(&self.name)
    }

    pub fn sum(&self) -> Projection {
        projections::sum(&self.name)
    }

    pub fn avg(&self) -> Projection {
        projections::avg(&self.name)
    }

    pub fn min(&self) -> Projection {
        projections::min(&self.name)
    }

    pub fn max(&self) -> Projection {
        projections::max(&self.name)
    }

    pub fn in_subquery(&self, criteria: DetachedCriteria) -> Criterion {
        subqueries::property_in(&self.name, criteria)
    }

    pub fn not_in_subquery(&self, criteria: DetachedCriteria) -> Criterion {
        subqueries::property_not_in(&self.name, criteria)
    }

    pub fn eq_subquery(&self, criteria: DetachedCriteria) -> Criterion {
        subqueries::property_eq(&self.name, criteria)
    }

    pub fn eq_all(&self, criteria: DetachedCriteria) -> Criterion {
        subqueries::property_eq_all(&self.name, criteria)
    }

    pub fn gt_all(&self, criteria: DetachedCriteria) -> Criterion {
        subqueries::property_gt_all(&self.name, criteria)
    }

    pub fn gt_some(&self, criteria: DetachedCriteria) -> Criterion {
        subqueries::property_gt_some(&self.name, criteria)
    }

    pub fn lt_some(&self, criteria: DetachedCriteria) -> Criterion {
        subqueries::property_lt_some(&self.name, criteria)
    }
}
