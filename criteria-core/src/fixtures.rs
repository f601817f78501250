//! Shared school schema used across unit tests.

use crate::metadata::{CollectionMapping, EntityMapping, InMemoryMetadata, PropertyMapping};
use crate::types::Type;

pub fn school() -> InMemoryMetadata {
    let course = EntityMapping::new(
        "Course",
        "Course",
        PropertyMapping::new("courseCode", &["courseCode"], Type::String),
    )
    .with_property(PropertyMapping::new("description", &["description"], Type::String))
    .with_property(PropertyMapping::new(
        "archivedStudents",
        &[],
        Type::collection("Course.archivedStudents"),
    ))
    .with_property(PropertyMapping::new("meetings", &[], Type::collection("Course.meetings")));

    let student = EntityMapping::new(
        "Student",
        "Student",
        PropertyMapping::new("studentNumber", &["studentId"], Type::Long),
    )
    .with_property(PropertyMapping::new("name", &["name"], Type::String))
    .with_property(PropertyMapping::new(
        "cityState",
        &["cityName", "stateCode"],
        Type::component(vec![("city", Type::String), ("state", Type::String)]),
    ))
    .with_property(PropertyMapping::new(
        "preferredCourse",
        &["preferredCourseCode"],
        Type::many_to_one("Course"),
    ))
    .with_property(PropertyMapping::new("credits", &["credits"], Type::Integer))
    .with_property(PropertyMapping::new("enrolments", &[], Type::collection("Student.enrolments")))
    .with_property(PropertyMapping::new("nicknames", &[], Type::collection("Student.nicknames")))
    .with_property(PropertyMapping::new("version", &["version"], Type::Integer))
    .with_version("version");

    let enrolment = EntityMapping::new(
        "Enrolment",
        "Enrolment",
        PropertyMapping::new(
            "id",
            &["studentId", "courseCode"],
            Type::component(vec![("studentNumber", Type::Long), ("courseCode", Type::String)]),
        ),
    )
    .with_property(PropertyMapping::new("semester", &["semester"], Type::Short))
    .with_property(PropertyMapping::new("year", &["year"], Type::Short))
    .with_property(PropertyMapping::new("student", &["studentId"], Type::many_to_one("Student")))
    .with_property(PropertyMapping::new("course", &["courseCode"], Type::many_to_one("Course")));

    InMemoryMetadata::from_parts(
        vec![course, student, enrolment],
        vec![
            CollectionMapping::new("Student.enrolments", "Enrolment", &["studentId"])
                .with_element("Enrolment"),
            CollectionMapping::new("Student.nicknames", "Student_Nicknames", &["studentId"]),
            CollectionMapping::new("Course.archivedStudents", "Course_Archive", &["courseCode"])
                .not_queryable(),
        ],
    )
}
