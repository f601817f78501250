//! Common test utilities for criteria compilation tests
//!
//! Provides shared helper functions for:
//! - Building the school schema (Course, Student, Enrolment)
//! - Creating compilation contexts per dialect
//! - Writing schema and configuration files to temp dirs

#![allow(dead_code)]

use criteria_sql::criteria_core::{Dialect, TypedValue};
use criteria_sql::{Context, SchemaFile};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

pub fn school_schema_json() -> Value {
    json!({
        "entities": [
            {
                "name": "Course",
                "table": "Course",
                "identifier": {"name": "courseCode", "columns": ["courseCode"], "type": "string"},
                "properties": [
                    {"name": "description", "columns": ["description"], "type": "string"}
                ]
            },
            {
                "name": "Student",
                "table": "Student",
                "identifier": {"name": "studentNumber", "columns": ["studentId"], "type": "long"},
                "version": "version",
                "properties": [
                    {"name": "name", "columns": ["name"], "type": "string"},
                    {
                        "name": "cityState",
                        "columns": ["cityName", "stateCode"],
                        "type": {"component": {"properties": [
                            {"name": "city", "type": "string"},
                            {"name": "state", "type": "string"}
                        ]}}
                    },
                    {
                        "name": "preferredCourse",
                        "columns": ["preferredCourseCode"],
                        "type": {"many_to_one": {"entity": "Course"}}
                    },
                    {"name": "credits", "columns": ["credits"], "type": "integer"},
                    {"name": "enrolments", "type": {"collection": {"role": "Student.enrolments"}}},
                    {"name": "version", "columns": ["version"], "type": "integer"}
                ]
            },
            {
                "name": "Enrolment",
                "table": "Enrolment",
                "identifier": {
                    "name": "id",
                    "columns": ["studentId", "courseCode"],
                    "type": {"component": {"properties": [
                        {"name": "studentNumber", "type": "long"},
                        {"name": "courseCode", "type": "string"}
                    ]}}
                },
                "properties": [
                    {"name": "semester", "columns": ["semester"], "type": "short"},
                    {"name": "year", "columns": ["year"], "type": "short"},
                    {"name": "student", "columns": ["studentId"], "type": {"many_to_one": {"entity": "Student"}}},
                    {"name": "course", "columns": ["courseCode"], "type": {"many_to_one": {"entity": "Course"}}}
                ]
            }
        ],
        "collections": [
            {
                "role": "Student.enrolments",
                "table": "Enrolment",
                "key_columns": ["studentId"],
                "element": "Enrolment"
            }
        ]
    })
}

pub fn school_context(dialect: Dialect) -> Context {
    let schema = SchemaFile::from_json(&school_schema_json().to_string()).expect("valid schema");
    Context::new(schema.into_metadata().expect("consistent schema"), dialect)
}

/// Write the school schema and an optional config into a temp dir.
pub fn write_school_files(config: Option<&str>) -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let schema_path = dir.path().join("school.json");
    std::fs::write(&schema_path, school_schema_json().to_string()).expect("write schema");
    let config_path = dir.path().join("criteria-sql.toml");
    if let Some(config) = config {
        std::fs::write(&config_path, config).expect("write config");
    }
    (dir, schema_path, config_path)
}

pub fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

pub fn values(parameters: &[TypedValue]) -> Vec<Value> {
    parameters.iter().map(|p| p.value.clone()).collect()
}
