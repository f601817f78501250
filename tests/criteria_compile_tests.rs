//! Criteria Compilation Tests
//!
//! End-to-end tests for:
//! - Bind-value alignment with `?` placeholders
//! - Composite properties and row-value IN lists per dialect
//! - Projection alias numbering
//! - Subquery and example value ordering
//! - Deterministic output across compilations

mod common;

use common::{placeholders, school_context, values};
use criteria_sql::criteria_core::{
    projections, restrictions, subqueries, Criterion, DetachedCriteria, Dialect, DialectKind, Example,
    JoinType, Order, Type, TypedValue,
};
use criteria_sql::AppError;
use serde_json::json;

#[test]
fn test_single_column_equality_binds_one_value() {
    let context = school_context(Dialect::default());
    for (property, value, ty) in [
        ("name", json!("Gavin"), Type::String),
        ("credits", json!(12), Type::Integer),
        ("studentNumber", json!(232), Type::Long),
    ] {
        let mut criteria = DetachedCriteria::for_entity("Student");
        criteria.add(restrictions::eq(property, value.clone()));
        let compiled = context.compile(&mut criteria).unwrap();
        assert_eq!(placeholders(&compiled.sql), 1);
        assert_eq!(compiled.parameters, vec![TypedValue::new(ty, value)]);
    }
}

#[test]
fn test_composite_equality_binds_each_column() {
    let context = school_context(Dialect::default());
    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.add(restrictions::eq(
        "cityState",
        json!({"city": "Odessa", "state": "WA"}),
    ));
    let compiled = context.compile(&mut criteria).unwrap();
    assert!(compiled
        .sql
        .ends_with("where (this_.cityName=? and this_.stateCode=?)"));
    assert_eq!(placeholders(&compiled.sql), 2);
    assert_eq!(values(&compiled.parameters), vec![json!("Odessa"), json!("WA")]);
}

#[test]
fn test_in_list_with_row_values() {
    let context = school_context(Dialect::new(DialectKind::H2));
    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.add(restrictions::in_values("name", ["Gavin", "Max", "Emmanuel"]));
    let compiled = context.compile(&mut criteria).unwrap();
    assert!(compiled.sql.ends_with("where this_.name in (?, ?, ?)"));
    assert_eq!(
        values(&compiled.parameters),
        vec![json!("Gavin"), json!("Max"), json!("Emmanuel")]
    );
}

#[test]
fn test_composite_in_list_without_row_values() {
    let context = school_context(Dialect::default());
    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.add(restrictions::in_values(
        "cityState",
        [
            json!({"city": "Odessa", "state": "WA"}),
            json!({"city": "Austin", "state": "TX"}),
        ],
    ));
    let compiled = context.compile(&mut criteria).unwrap();
    assert!(compiled.sql.ends_with(
        "where ( (this_.cityName=? and this_.stateCode=?) or (this_.cityName=? and this_.stateCode=?) )"
    ));
    assert_eq!(
        values(&compiled.parameters),
        vec![json!("Odessa"), json!("WA"), json!("Austin"), json!("TX")]
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let context = school_context(Dialect::postgresql());
    let mut sub = DetachedCriteria::for_entity("Enrolment");
    sub.add(restrictions::eq("year", 2004))
        .set_projection(projections::property("student"));
    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria
        .create_alias("preferredCourse", "pc")
        .add(restrictions::like("pc.description", "Hib%"))
        .add(subqueries::property_in("studentNumber", sub))
        .add_order(Order::asc("name"));

    let first = context.compile(&mut criteria.clone()).unwrap();
    let second = context.compile(&mut criteria).unwrap();
    assert_eq!(first.sql, second.sql);
    assert_eq!(first.parameters, second.parameters);
}

#[test]
fn test_double_negation_keeps_values() {
    let context = school_context(Dialect::default());
    let predicate = restrictions::or(
        restrictions::between("credits", 3, 9),
        restrictions::eq("cityState", json!({"city": "Odessa", "state": "WA"})),
    );

    let mut plain = DetachedCriteria::for_entity("Student");
    plain.add(predicate.clone());
    let mut negated = DetachedCriteria::for_entity("Student");
    negated.add(restrictions::not(restrictions::not(predicate)));

    let plain = context.compile(&mut plain).unwrap();
    let negated = context.compile(&mut negated).unwrap();
    assert_eq!(plain.parameters, negated.parameters);
    assert_ne!(plain.sql, negated.sql);
}

#[test]
fn test_projection_list_numbering() {
    let context = school_context(Dialect::default());
    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.set_projection(
        projections::projection_list()
            .add(projections::property("name"))
            .add(projections::property("cityState"))
            .add(projections::row_count()),
    );
    let compiled = context.compile(&mut criteria).unwrap();
    assert_eq!(compiled.column_aliases, vec!["y0_", "y1_", "y2_", "y3_"]);
    assert_eq!(
        compiled.sql,
        "select this_.name as y0_, this_.cityName as y1_, this_.stateCode as y2_, count(*) as y3_ from Student this_"
    );
}

#[test]
fn test_some_subquery_values_follow_inner_order() {
    let context = school_context(Dialect::default());
    let mut sub = DetachedCriteria::for_entity("Student");
    sub.add(restrictions::eq("name", "Gavin"))
        .add(restrictions::lt("credits", 30))
        .set_projection(projections::property("credits"));
    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.add(subqueries::property_gt_some("credits", sub));

    let compiled = context.compile(&mut criteria).unwrap();
    assert!(compiled.sql.contains("where this_.credits > some (select"));
    assert_eq!(values(&compiled.parameters), vec![json!("Gavin"), json!(30)]);
}

#[test]
fn test_value_subquery_binds_literal_first() {
    let context = school_context(Dialect::default());
    let mut sub = DetachedCriteria::for_entity("Student");
    sub.add(restrictions::eq("name", "Gavin"))
        .set_projection(projections::max("credits"));
    let mut criteria = DetachedCriteria::for_entity("Course");
    criteria.add(subqueries::gt_all(10, sub));

    let compiled = context.compile(&mut criteria).unwrap();
    assert!(compiled.sql.contains("where ? > all (select max(this0_.credits) as y0_"));
    assert_eq!(
        compiled.parameters,
        vec![
            TypedValue::new(Type::Integer, json!(10)),
            TypedValue::new(Type::String, json!("Gavin")),
        ]
    );
}

#[test]
fn test_example_null_policy() {
    let context = school_context(Dialect::default());
    let prototype = json!({"name": "Gavin", "credits": null});

    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.add(Criterion::Example(Example::create(prototype.clone())));
    let compiled = context.compile(&mut criteria).unwrap();
    assert!(compiled.sql.ends_with("where (this_.name=?)"));

    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.add(Criterion::Example(Example::create(prototype).exclude_none()));
    let compiled = context.compile(&mut criteria).unwrap();
    assert!(compiled
        .sql
        .ends_with("where (this_.name=? and this_.credits is null)"));
    assert_eq!(compiled.parameters.len(), 1);
}

#[test]
fn test_placeholders_match_parameters_across_features() {
    let context = school_context(Dialect::mysql());
    let mut sub = DetachedCriteria::for_entity("Enrolment");
    sub.add(restrictions::eq("semester", 2))
        .set_projection(projections::property("course"));

    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria
        .create_alias_with(
            "enrolments",
            "e",
            JoinType::LeftOuter,
            Some(restrictions::eq("year", 2004)),
        )
        .add(restrictions::size_gt("enrolments", 1))
        .add(restrictions::not(restrictions::ilike("name", "G%")))
        .add(subqueries::property_in("preferredCourse", sub))
        .add(restrictions::in_values("cityState", [json!({"city": "Odessa", "state": "WA"})]))
        .set_max_results(20);

    let compiled = context.compile(&mut criteria).unwrap();
    assert_eq!(placeholders(&compiled.sql), compiled.parameters.len());
    assert_eq!(
        values(&compiled.parameters),
        vec![json!(2004), json!(1), json!("g%"), json!(2), json!("Odessa"), json!("WA")]
    );
    assert!(compiled.sql.ends_with(" limit 20"));
}

#[test]
fn test_errors_surface_through_context() {
    let context = school_context(Dialect::default());

    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.set_projection(projections::aggregate("median", "credits"));
    let err = context.compile(&mut criteria).unwrap_err();
    assert!(matches!(err, AppError::CriteriaError(_)));
    assert_eq!(
        err.to_string(),
        "Criteria error: Configuration error: Unable to locate mapping for function named [median]"
    );

    let mut criteria = DetachedCriteria::for_entity("Student");
    criteria.add(restrictions::is_empty("name"));
    assert!(context.compile(&mut criteria).is_err());
}
