//! Criteria Core - Storage-independent criteria query compiler.
//!
//! This crate compiles a tree of typed predicates, projections and orderings
//! into a parameterized SQL statement plus the ordered list of typed values
//! to bind. It performs no I/O; entity mappings come from a [`Metadata`]
//! implementation and database differences from a [`Dialect`].
//!
//! # Main Components
//!
//! - **Criteria**: [`DetachedCriteria`] trees, built incrementally
//! - **Criterion**: predicate nodes and their [`restrictions`] factories
//! - **Projection**: select-list nodes and their [`projections`] factories
//! - **Translator**: [`CriteriaQuery`], the per-compilation scope
//!
//! # Example
//!
//! ```rust
//! use criteria_core::{restrictions, Dialect, DetachedCriteria, EntityMapping, InMemoryMetadata, PropertyMapping, Type};
//!
//! let mut metadata = InMemoryMetadata::new();
//! metadata.add_entity(
//!     EntityMapping::new("Course", "Course", PropertyMapping::new("courseCode", &["courseCode"], Type::String))
//!         .with_property(PropertyMapping::new("description", &["description"], Type::String)),
//! );
//!
//! let mut criteria = DetachedCriteria::for_entity("Course");
//! criteria.add(restrictions::eq("description", "Hibernate Training"));
//!
//! let compiled = criteria.compile(&metadata, &Dialect::default()).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     "select this_.courseCode, this_.description from Course this_ where this_.description=?"
//! );
//! assert_eq!(compiled.parameters.len(), 1);
//! ```

pub mod alias;
pub mod criteria;
pub mod criterion;
pub mod dialect;
pub mod error;
pub mod example;
pub mod metadata;
pub mod order;
pub mod projection;
pub mod property;
pub mod sink;
pub mod subquery;
pub mod translator;
pub mod types;

#[cfg(test)]
mod fixtures;

// Re-export main types for convenience
pub use criteria::{
    CriteriaHandle, CriteriaId, DetachedCriteria, ExecutableCriteria, JoinType, ResultTransformer, Session,
};
pub use criterion::{restrictions, Criterion, LogicalOperator, MatchMode, Operator};
pub use dialect::{Dialect, DialectKind, EmptyInList, FunctionRegistry, ReturnKind, SqlFunction};
pub use error::{CriteriaError, CriteriaResult};
pub use example::{Example, PropertySelector};
pub use metadata::{CollectionMapping, EntityMapping, InMemoryMetadata, Metadata, PropertyMapping};
pub use order::Order;
pub use projection::{projections, Projection};
pub use property::Property;
pub use sink::SqlFragment;
pub use subquery::{subqueries, Quantifier, SubqueryExpression, SubqueryOperand, SubqueryOperator};
pub use translator::{CompiledQuery, CriteriaQuery};
pub use types::{ComponentType, Type, TypedValue};
