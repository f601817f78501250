//! Factory functions for projections.

use super::Projection;
use crate::types::Type;

pub fn projection_list() -> Projection {
    Projection::List {
        projections: Vec::new(),
    }
}

pub fn property(property: &str) -> Projection {
    Projection::Property {
        property: property.to_string(),
        grouped: false,
    }
}

/// Property that also appears in `GROUP BY`
pub fn group_property(property: &str) -> Projection {
    Projection::Property {
        property: property.to_string(),
        grouped: true,
    }
}

pub fn id() -> Projection {
    Projection::Identifier { grouped: false }
}

pub fn row_count() -> Projection {
    Projection::RowCount
}

/// Aggregate through any function registered with the dialect.
pub fn aggregate(function: &str, property: &str) -> Projection {
    Projection::Aggregate {
        function: function.to_string(),
        property: property.to_string(),
        distinct: false,
    }
}

pub fn count(property: &str) -> Projection {
    aggregate("count", property)
}

pub fn count_distinct(property: &str) -> Projection {
    Projection::Aggregate {
        function: "count".to_string(),
        property: property.to_string(),
        distinct: true,
    }
}

pub fn sum(property: &str) -> Projection {
    aggregate("sum", property)
}

pub fn avg(property: &str) -> Projection {
    aggregate("avg", property)
}

pub fn min(property: &str) -> Projection {
    aggregate("min", property)
}

pub fn max(property: &str) -> Projection {
    aggregate("max", property)
}

pub fn sql_projection(sql: &str, column_aliases: &[&str], types: Vec<Type>) -> Projection {
    Projection::Sql {
        sql: sql.to_string(),
        column_aliases: column_aliases.iter().map(|a| a.to_string()).collect(),
        types,
        group_by: None,
    }
}

pub fn sql_group_projection(sql: &str, group_by: &str, column_aliases: &[&str], types: Vec<Type>) -> Projection {
    Projection::Sql {
        sql: sql.to_string(),
        column_aliases: column_aliases.iter().map(|a| a.to_string()).collect(),
        types,
        group_by: Some(group_by.to_string()),
    }
}

pub fn alias(projection: Projection, alias: &str) -> Projection {
    projection.with_alias(alias)
}

pub fn distinct(projection: Projection) -> Projection {
    Projection::Distinct {
        projection: Box::new(projection),
    }
}
