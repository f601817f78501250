//! `ORDER BY` entries.

use crate::criteria::CriteriaId;
use crate::error::CriteriaResult;
use crate::translator::CriteriaQuery;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub property: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
    #[serde(default)]
    pub ignore_case: bool,
}

fn default_ascending() -> bool {
    true
}

impl Order {
    pub fn asc(property: &str) -> Self {
        Self {
            property: property.to_string(),
            ascending: true,
            ignore_case: false,
        }
    }

    pub fn desc(property: &str) -> Self {
        Self {
            property: property.to_string(),
            ascending: false,
            ignore_case: false,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// Render one `col asc|desc` entry per column, joined with `, `.
    ///
    /// The property may name a projection alias, in which case the result
    /// column aliases are ordered on.
    pub fn render(&self, query: &CriteriaQuery<'_>, crit: CriteriaId) -> CriteriaResult<String> {
        let columns = query.columns(crit, &self.property)?;
        let types = query.column_types(crit, &self.property)?;
        let direction = if self.ascending { " asc" } else { " desc" };
        let parts: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let lower = self.ignore_case && types.get(i).is_some_and(|t| t.is_character());
                let column = if lower {
                    query.dialect().lower(column)
                } else {
                    column.clone()
                };
                format!("{}{}", column, direction)
            })
            .collect();
        Ok(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::DetachedCriteria;
    use crate::dialect::Dialect;
    use crate::fixtures::school;
    use crate::projection::projections;

    fn render(criteria: &DetachedCriteria, order: &Order) -> String {
        let md = school();
        let dialect = Dialect::default();
        let query = CriteriaQuery::new(&md, &dialect, criteria).unwrap();
        order.render(&query, CriteriaId::ROOT).unwrap()
    }

    #[test]
    fn test_order_direction() {
        let criteria = DetachedCriteria::for_entity("Student");
        assert_eq!(render(&criteria, &Order::asc("name")), "this_.name asc");
        assert_eq!(render(&criteria, &Order::desc("credits")), "this_.credits desc");
    }

    #[test]
    fn test_order_ignore_case_only_lowers_text() {
        let criteria = DetachedCriteria::for_entity("Student");
        assert_eq!(
            render(&criteria, &Order::asc("name").ignore_case()),
            "lower(this_.name) asc"
        );
        assert_eq!(
            render(&criteria, &Order::asc("credits").ignore_case()),
            "this_.credits asc"
        );
    }

    #[test]
    fn test_order_expands_component_columns() {
        let criteria = DetachedCriteria::for_entity("Student");
        assert_eq!(
            render(&criteria, &Order::desc("cityState")),
            "this_.cityName desc, this_.stateCode desc"
        );
    }

    #[test]
    fn test_order_by_projection_alias() {
        let mut criteria = DetachedCriteria::for_entity("Student");
        criteria.set_projection(
            projections::projection_list()
                .add(projections::property("name"))
                .add(projections::alias(projections::sum("credits"), "total")),
        );
        assert_eq!(render(&criteria, &Order::desc("total")), "y1_ desc");
    }
}
