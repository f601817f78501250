//! Detached and executable criteria trees.
//!
//! A [`DetachedCriteria`] is built without any execution context. Pairing it
//! with a [`Session`] through [`DetachedCriteria::executable`] borrows the tree
//! rather than copying it, so mutations made through the executable view are
//! visible on the detached tree and vice versa.

use crate::alias::ROOT_ALIAS;
use crate::criterion::Criterion;
use crate::dialect::Dialect;
use crate::error::CriteriaResult;
use crate::metadata::Metadata;
use crate::order::Order;
use crate::projection::Projection;
use crate::translator::{CompiledQuery, CriteriaQuery};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Position of a criteria within its tree: `0` is the root, `n` is sub-criteria `n - 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaId(pub usize);

impl CriteriaId {
    pub const ROOT: CriteriaId = CriteriaId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    LeftOuter,
    FullOuter,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner join",
            JoinType::LeftOuter => "left outer join",
            JoinType::FullOuter => "full join",
        }
    }
}

/// How the caller should shape result rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTransformer {
    #[default]
    RootEntity,
    DistinctRootEntity,
    AliasToEntityMap,
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionEntry {
    #[serde(default)]
    pub criteria: CriteriaId,
    pub criterion: Criterion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEntry {
    #[serde(default)]
    pub criteria: CriteriaId,
    pub order: Order,
}

/// A joined association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCriteria {
    pub parent: CriteriaId,
    /// Association path, relative to the parent or prefixed with a known alias
    pub path: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub join: JoinType,
    /// Extra condition appended to the join's `on` clause
    #[serde(default)]
    pub with_clause: Option<Criterion>,
}

/// A criteria tree built without an execution context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetachedCriteria {
    pub entity: String,
    #[serde(default = "default_alias")]
    pub alias: String,
    #[serde(default)]
    pub criteria: Vec<CriterionEntry>,
    #[serde(default)]
    pub orders: Vec<OrderEntry>,
    #[serde(default)]
    pub projection: Option<Projection>,
    #[serde(default)]
    pub result_transformer: ResultTransformer,
    #[serde(default)]
    pub sub_criteria: Vec<SubCriteria>,
    #[serde(default)]
    pub first_result: Option<u64>,
    #[serde(default)]
    pub max_results: Option<u64>,
}

fn default_alias() -> String {
    ROOT_ALIAS.to_string()
}

impl DetachedCriteria {
    pub fn for_entity(entity: &str) -> Self {
        Self::for_entity_alias(entity, ROOT_ALIAS)
    }

    pub fn for_entity_alias(entity: &str, alias: &str) -> Self {
        Self {
            entity: entity.to_string(),
            alias: alias.to_string(),
            criteria: Vec::new(),
            orders: Vec::new(),
            projection: None,
            result_transformer: ResultTransformer::default(),
            sub_criteria: Vec::new(),
            first_result: None,
            max_results: None,
        }
    }

    pub fn add(&mut self, criterion: Criterion) -> &mut Self {
        self.add_to(CriteriaId::ROOT, criterion)
    }

    pub fn add_order(&mut self, order: Order) -> &mut Self {
        self.add_order_to(CriteriaId::ROOT, order)
    }

    /// Replace the projection. Projections always apply to the root.
    pub fn set_projection(&mut self, projection: Projection) -> &mut Self {
        self.projection = Some(projection);
        if self.result_transformer == ResultTransformer::RootEntity {
            self.result_transformer = ResultTransformer::PassThrough;
        }
        self
    }

    pub fn set_result_transformer(&mut self, transformer: ResultTransformer) -> &mut Self {
        self.result_transformer = transformer;
        self
    }

    pub fn set_first_result(&mut self, first: u64) -> &mut Self {
        self.first_result = Some(first);
        self
    }

    pub fn set_max_results(&mut self, max: u64) -> &mut Self {
        self.max_results = Some(max);
        self
    }

    /// Inner-join an association under `alias`.
    pub fn create_alias(&mut self, path: &str, alias: &str) -> &mut Self {
        self.create_alias_with(path, alias, JoinType::Inner, None)
    }

    pub fn create_alias_with(
        &mut self,
        path: &str,
        alias: &str,
        join: JoinType,
        with_clause: Option<Criterion>,
    ) -> &mut Self {
        self.push_sub_criteria(CriteriaId::ROOT, path, Some(alias), join, with_clause);
        self
    }

    /// Join an association and return a handle for adding criteria relative to it.
    pub fn create_criteria(&mut self, path: &str, alias: Option<&str>) -> CriteriaHandle<'_> {
        self.create_criteria_with(path, alias, JoinType::Inner)
    }

    pub fn create_criteria_with(&mut self, path: &str, alias: Option<&str>, join: JoinType) -> CriteriaHandle<'_> {
        let id = self.push_sub_criteria(CriteriaId::ROOT, path, alias, join, None);
        CriteriaHandle { root: self, id }
    }

    /// Handle on an existing criteria of this tree.
    pub fn criteria_handle(&mut self, id: CriteriaId) -> CriteriaHandle<'_> {
        CriteriaHandle { root: self, id }
    }

    fn add_to(&mut self, criteria: CriteriaId, criterion: Criterion) -> &mut Self {
        self.criteria.push(CriterionEntry { criteria, criterion });
        self
    }

    fn add_order_to(&mut self, criteria: CriteriaId, order: Order) -> &mut Self {
        self.orders.push(OrderEntry { criteria, order });
        self
    }

    fn push_sub_criteria(
        &mut self,
        parent: CriteriaId,
        path: &str,
        alias: Option<&str>,
        join: JoinType,
        with_clause: Option<Criterion>,
    ) -> CriteriaId {
        self.sub_criteria.push(SubCriteria {
            parent,
            path: path.to_string(),
            alias: alias.map(str::to_string),
            join,
            with_clause,
        });
        CriteriaId(self.sub_criteria.len())
    }

    /// Compile against explicit metadata and dialect.
    pub fn compile(&self, metadata: &dyn Metadata, dialect: &Dialect) -> CriteriaResult<CompiledQuery> {
        CriteriaQuery::new(metadata, dialect, self)?.compile()
    }

    /// Attach an execution context without copying the tree.
    pub fn executable<'a, S: Session>(&'a mut self, session: &'a S) -> ExecutableCriteria<'a, S> {
        ExecutableCriteria {
            criteria: self,
            session,
        }
    }
}

/// Mutable view on one criteria of a tree
pub struct CriteriaHandle<'a> {
    root: &'a mut DetachedCriteria,
    id: CriteriaId,
}

impl<'a> CriteriaHandle<'a> {
    pub fn id(&self) -> CriteriaId {
        self.id
    }

    pub fn add(&mut self, criterion: Criterion) -> &mut Self {
        self.root.add_to(self.id, criterion);
        self
    }

    pub fn add_order(&mut self, order: Order) -> &mut Self {
        self.root.add_order_to(self.id, order);
        self
    }

    pub fn create_alias(&mut self, path: &str, alias: &str) -> &mut Self {
        self.root
            .push_sub_criteria(self.id, path, Some(alias), JoinType::Inner, None);
        self
    }

    pub fn create_criteria(&mut self, path: &str, alias: Option<&str>) -> CriteriaHandle<'_> {
        let id = self
            .root
            .push_sub_criteria(self.id, path, alias, JoinType::Inner, None);
        CriteriaHandle {
            root: &mut *self.root,
            id,
        }
    }
}

/// Execution context a criteria tree is compiled in
pub trait Session {
    fn metadata(&self) -> &dyn Metadata;
    fn dialect(&self) -> &Dialect;
}

/// A criteria tree paired with a session
pub struct ExecutableCriteria<'a, S: Session> {
    criteria: &'a mut DetachedCriteria,
    session: &'a S,
}

impl<S: Session> ExecutableCriteria<'_, S> {
    pub fn session(&self) -> &S {
        self.session
    }

    pub fn compile(&self) -> CriteriaResult<CompiledQuery> {
        self.criteria
            .compile(self.session.metadata(), self.session.dialect())
    }
}

impl<S: Session> Deref for ExecutableCriteria<'_, S> {
    type Target = DetachedCriteria;

    fn deref(&self) -> &Self::Target {
        self.criteria
    }
}

impl<S: Session> DerefMut for ExecutableCriteria<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::restrictions;
    use crate::fixtures::school;
    use crate::metadata::InMemoryMetadata;
    use crate::projection::projections;

    struct TestSession {
        metadata: InMemoryMetadata,
        dialect: Dialect,
    }

    impl Session for TestSession {
        fn metadata(&self) -> &dyn Metadata {
            &self.metadata
        }

        fn dialect(&self) -> &Dialect {
            &self.dialect
        }
    }

    #[test]
    fn test_sub_criteria_ids() {
        let mut criteria = DetachedCriteria::for_entity("Student");
        criteria.create_alias("preferredCourse", "pc");
        let mut handle = criteria.create_criteria("enrolments", Some("e"));
        assert_eq!(handle.id(), CriteriaId(2));
        handle.add(restrictions::eq("semester", 1));
        let nested = handle.create_criteria("course", None).id();
        assert_eq!(nested, CriteriaId(3));

        assert_eq!(criteria.sub_criteria.len(), 3);
        assert_eq!(criteria.sub_criteria[2].parent, CriteriaId(2));
        assert_eq!(criteria.criteria[0].criteria, CriteriaId(2));
    }

    #[test]
    fn test_set_projection_switches_transformer() {
        let mut criteria = DetachedCriteria::for_entity("Student");
        criteria.set_projection(projections::row_count());
        assert_eq!(criteria.result_transformer, ResultTransformer::PassThrough);

        let mut criteria = DetachedCriteria::for_entity("Student");
        criteria
            .set_result_transformer(ResultTransformer::AliasToEntityMap)
            .set_projection(projections::row_count());
        assert_eq!(criteria.result_transformer, ResultTransformer::AliasToEntityMap);
    }

    #[test]
    fn test_executable_shares_tree() {
        let session = TestSession {
            metadata: school(),
            dialect: Dialect::default(),
        };
        let mut criteria = DetachedCriteria::for_entity("Student");
        {
            let mut executable = criteria.executable(&session);
            executable.add(restrictions::eq("name", "Gavin"));
            let compiled = executable.compile().unwrap();
            assert!(compiled.sql.ends_with("where this_.name=?"));
        }
        assert_eq!(criteria.criteria.len(), 1);
    }

    #[test]
    fn test_deserialize_minimal_tree() {
        let criteria: DetachedCriteria = serde_json::from_value(serde_json::json!({
            "entity": "Student",
            "criteria": [
                {"criterion": {"type": "compare", "property": "name", "op": "eq", "value": "Gavin"}}
            ],
            "max_results": 5
        }))
        .unwrap();
        assert_eq!(criteria.alias, "this");
        assert_eq!(criteria.criteria[0].criteria, CriteriaId::ROOT);
        assert_eq!(criteria.max_results, Some(5));
    }
}
