//! Query by example.
//!
//! An [`Example`] holds a prototype object and compiles to a conjunction of
//! restrictions on its properties. Identifier, version and association
//! properties never take part; components are matched property by property.

use crate::criteria::CriteriaId;
use crate::criterion::{Criterion, MatchMode, Operator};
use crate::error::{CriteriaError, CriteriaResult};
use crate::metadata::EntityMapping;
use crate::sink::SqlFragment;
use crate::translator::CriteriaQuery;
use crate::types::Type;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a property value takes part: `(value, path, type)`
pub type SelectorFn = dyn Fn(&Value, &str, &Type) -> bool + Send + Sync;

/// Which prototype properties are matched
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySelector {
    IncludeAll,
    #[default]
    ExcludeNull,
    /// Excludes nulls and numbers that truncate to zero
    ExcludeNullAndZero,
    #[serde(skip)]
    Custom(Arc<SelectorFn>),
}

impl PropertySelector {
    pub fn custom<F>(selector: F) -> Self
    where
        F: Fn(&Value, &str, &Type) -> bool + Send + Sync + 'static,
    {
        PropertySelector::Custom(Arc::new(selector))
    }

    pub fn include(&self, value: &Value, path: &str, ty: &Type) -> bool {
        match self {
            PropertySelector::IncludeAll => true,
            PropertySelector::ExcludeNull => !value.is_null(),
            PropertySelector::ExcludeNullAndZero => match value {
                Value::Null => false,
                Value::Number(n) => n.as_f64().map_or(true, |f| f.trunc() != 0.0),
                _ => true,
            },
            PropertySelector::Custom(selector) => selector(value, path, ty),
        }
    }
}

impl fmt::Debug for PropertySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertySelector::IncludeAll => f.write_str("IncludeAll"),
            PropertySelector::ExcludeNull => f.write_str("ExcludeNull"),
            PropertySelector::ExcludeNullAndZero => f.write_str("ExcludeNullAndZero"),
            PropertySelector::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for PropertySelector {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertySelector::IncludeAll, PropertySelector::IncludeAll)
            | (PropertySelector::ExcludeNull, PropertySelector::ExcludeNull)
            | (PropertySelector::ExcludeNullAndZero, PropertySelector::ExcludeNullAndZero) => true,
            (PropertySelector::Custom(a), PropertySelector::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub prototype: Value,
    /// Entity the prototype represents; checked against the criteria entity
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub selector: PropertySelector,
    #[serde(default)]
    pub excluded: BTreeSet<String>,
    /// LIKE matching for string properties, when enabled
    #[serde(default)]
    pub like_mode: Option<MatchMode>,
    #[serde(default)]
    pub escape: Option<char>,
    #[serde(default)]
    pub ignore_case: bool,
}

impl Example {
    pub fn create(prototype: Value) -> Self {
        Self {
            prototype,
            entity: None,
            selector: PropertySelector::default(),
            excluded: BTreeSet::new(),
            like_mode: None,
            escape: None,
            ignore_case: false,
        }
    }

    pub fn for_entity(entity: &str, prototype: Value) -> Self {
        Self {
            entity: Some(entity.to_string()),
            ..Self::create(prototype)
        }
    }

    pub fn exclude_zeroes(mut self) -> Self {
        self.selector = PropertySelector::ExcludeNullAndZero;
        self
    }

    pub fn exclude_none(mut self) -> Self {
        self.selector = PropertySelector::IncludeAll;
        self
    }

    pub fn exclude_nulls(mut self) -> Self {
        self.selector = PropertySelector::ExcludeNull;
        self
    }

    pub fn set_property_selector(mut self, selector: PropertySelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn exclude_property(mut self, name: &str) -> Self {
        self.excluded.insert(name.to_string());
        self
    }

    pub fn enable_like(mut self, mode: MatchMode) -> Self {
        self.like_mode = Some(mode);
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn set_escape_character(mut self, escape: char) -> Self {
        self.escape = Some(escape);
        self
    }

    pub fn render(&self, query: &CriteriaQuery<'_>, crit: CriteriaId, out: &mut SqlFragment) -> CriteriaResult<()> {
        let entity = query.scope(crit)?.entity();
        let criteria = self.criteria_for(entity)?;
        let mut fragments = Vec::with_capacity(criteria.len());
        for criterion in &criteria {
            let mut fragment = SqlFragment::new();
            criterion.render(query, crit, &mut fragment)?;
            fragments.push(fragment);
        }
        let (mut joined, count) = SqlFragment::join(fragments, " and ");
        if count == 0 {
            joined.push_sql("1=1");
        }
        joined.wrap("(", ")");
        out.append(joined);
        Ok(())
    }

    /// Restrictions this example expands to against `entity`.
    pub fn criteria_for(&self, entity: &EntityMapping) -> CriteriaResult<Vec<Criterion>> {
        if let Some(expected) = &self.entity {
            if expected != &entity.name {
                return Err(CriteriaError::Classification(format!(
                    "example of {} cannot be matched against {}",
                    expected, entity.name
                )));
            }
        }
        let Value::Object(prototype) = &self.prototype else {
            return Err(CriteriaError::Classification(format!(
                "example prototype for {} must be an object",
                entity.name
            )));
        };

        let mut criteria = Vec::new();
        for property in &entity.properties {
            if entity.version.as_deref() == Some(property.name.as_str())
                || self.excluded.contains(&property.name)
                || property.ty.is_association()
            {
                continue;
            }
            let value = prototype.get(&property.name).unwrap_or(&Value::Null);
            self.add_property(&property.name, value, &property.ty, &mut criteria)?;
        }
        tracing::trace!("example on {} expanded to {} restrictions", entity.name, criteria.len());
        Ok(criteria)
    }

    fn add_property(&self, path: &str, value: &Value, ty: &Type, criteria: &mut Vec<Criterion>) -> CriteriaResult<()> {
        match ty {
            Type::Component(component) => {
                let sub_values = match value {
                    Value::Null => return Ok(()),
                    Value::Object(map) => map,
                    other => {
                        return Err(CriteriaError::Classification(format!(
                            "example property {} expects a component, found {}",
                            path, other
                        )))
                    }
                };
                for sub in &component.properties {
                    let sub_path = format!("{}.{}", path, sub.name);
                    if self.excluded.contains(&sub_path) || sub.ty.is_association() {
                        continue;
                    }
                    let sub_value = component_value(sub_values, &sub.name);
                    self.add_property(&sub_path, sub_value, &sub.ty, criteria)?;
                }
                Ok(())
            }
            _ => {
                if !self.selector.include(value, path, ty) {
                    return Ok(());
                }
                criteria.push(self.leaf_criterion(path, value, ty));
                Ok(())
            }
        }
    }

    fn leaf_criterion(&self, path: &str, value: &Value, ty: &Type) -> Criterion {
        match (value, self.like_mode) {
            (Value::Null, _) => Criterion::Null {
                property: path.to_string(),
                negated: false,
            },
            (Value::String(s), Some(mode)) if ty.is_character() => Criterion::Like {
                property: path.to_string(),
                value: s.clone(),
                mode,
                escape: self.escape,
                ignore_case: self.ignore_case,
            },
            _ => Criterion::Compare {
                property: path.to_string(),
                op: Operator::Eq,
                value: value.clone(),
                ignore_case: self.ignore_case,
            },
        }
    }
}

fn component_value<'v>(values: &'v Map<String, Value>, name: &str) -> &'v Value {
    values.get(name).unwrap_or(&Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::DetachedCriteria;
    use crate::dialect::Dialect;
    use crate::fixtures::school;
    use crate::types::TypedValue;
    use serde_json::json;

    fn render(entity: &str, example: Example) -> CriteriaResult<SqlFragment> {
        render_with(entity, example, &Dialect::default())
    }

    fn render_with(entity: &str, example: Example, dialect: &Dialect) -> CriteriaResult<SqlFragment> {
        let md = school();
        let criteria = DetachedCriteria::for_entity(entity);
        let query = CriteriaQuery::new(&md, dialect, &criteria)?;
        let mut out = SqlFragment::new();
        example.render(&query, CriteriaId::ROOT, &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_null_properties_excluded_by_default() {
        let example = Example::create(json!({"name": "Gavin", "credits": null}));
        let out = render("Student", example).unwrap();
        assert_eq!(out.sql(), "(this_.name=?)");
        assert_eq!(out.params(), &[TypedValue::new(Type::String, json!("Gavin"))]);
    }

    #[test]
    fn test_include_all_emits_null_checks() {
        let example = Example::create(json!({"name": "Gavin", "credits": null})).exclude_none();
        let out = render("Student", example).unwrap();
        assert_eq!(
            out.sql(),
            "(this_.name=? and this_.credits is null)"
        );
        assert_eq!(out.params().len(), 1);
    }

    #[test]
    fn test_skips_identifier_version_and_associations() {
        let example = Example::create(json!({
            "studentNumber": 1,
            "version": 3,
            "preferredCourse": {"courseCode": "HIB"},
            "credits": 12
        }));
        let out = render("Student", example).unwrap();
        assert_eq!(out.sql(), "(this_.credits=?)");
    }

    #[test]
    fn test_component_properties() {
        let example = Example::create(json!({"cityState": {"city": "Odessa", "state": null}}));
        let out = render("Student", example).unwrap();
        assert_eq!(out.sql(), "(this_.cityName=?)");

        let example = Example::create(json!({"cityState": {"city": "Odessa"}}))
            .exclude_none()
            .exclude_property("name")
            .exclude_property("credits");
        let out = render("Student", example).unwrap();
        assert_eq!(out.sql(), "(this_.cityName=? and this_.stateCode is null)");
    }

    #[test]
    fn test_exclude_zeroes() {
        let example = Example::create(json!({"credits": 0, "name": "Gavin"})).exclude_zeroes();
        let out = render("Student", example).unwrap();
        assert_eq!(out.sql(), "(this_.name=?)");
    }

    #[test]
    fn test_like_mode_and_ignore_case() {
        let example = Example::create(json!({"name": "gav", "credits": 3}))
            .enable_like(MatchMode::Start)
            .ignore_case()
            .set_escape_character('\\');
        let out = render("Student", example).unwrap();
        assert_eq!(
            out.sql(),
            "(lower(this_.name) like ? escape '\\' and this_.credits=?)"
        );
        assert_eq!(out.params()[0].value, json!("gav%"));

        let example = Example::create(json!({"name": "gav"})).enable_like(MatchMode::Anywhere).ignore_case();
        let out = render_with("Student", example, &Dialect::postgresql()).unwrap();
        assert_eq!(out.sql(), "(this_.name ilike ?)");
    }

    #[test]
    fn test_custom_selector() {
        let example = Example::create(json!({"name": "Gavin", "credits": 4})).set_property_selector(
            PropertySelector::custom(|_, path, _| path != "credits"),
        );
        let out = render("Student", example).unwrap();
        assert_eq!(out.sql(), "(this_.name=?)");
    }

    #[test]
    fn test_empty_example() {
        let out = render("Student", Example::create(json!({}))).unwrap();
        assert_eq!(out.sql(), "(1=1)");
    }

    #[test]
    fn test_classification_errors() {
        let err = render("Student", Example::for_entity("Course", json!({}))).unwrap_err();
        assert!(matches!(err, CriteriaError::Classification(_)));

        let err = render("Student", Example::create(json!("Gavin"))).unwrap_err();
        assert!(matches!(err, CriteriaError::Classification(_)));
    }
}
