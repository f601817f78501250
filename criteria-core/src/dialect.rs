//! SQL dialect policies and the SQL function registry.
//!
//! A [`Dialect`] only carries the handful of rendering decisions the compiler
//! has to make differently per database: row-value IN lists, how `not` is
//! parenthesized, case folding, `ilike`, and pagination syntax.

use crate::error::{CriteriaError, CriteriaResult};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Known database families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Generic,
    PostgreSql,
    MySql,
    H2,
    Hsql,
    Oracle,
    SqlServer,
}

impl DialectKind {
    pub fn name(&self) -> &'static str {
        match self {
            DialectKind::Generic => "generic",
            DialectKind::PostgreSql => "postgresql",
            DialectKind::MySql => "mysql",
            DialectKind::H2 => "h2",
            DialectKind::Hsql => "hsql",
            DialectKind::Oracle => "oracle",
            DialectKind::SqlServer => "sqlserver",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "ansi" => Ok(DialectKind::Generic),
            "postgresql" | "postgres" | "pg" => Ok(DialectKind::PostgreSql),
            "mysql" | "mariadb" => Ok(DialectKind::MySql),
            "h2" => Ok(DialectKind::H2),
            "hsql" | "hsqldb" => Ok(DialectKind::Hsql),
            "oracle" => Ok(DialectKind::Oracle),
            "sqlserver" | "mssql" => Ok(DialectKind::SqlServer),
            other => Err(CriteriaError::Configuration(format!("unknown dialect: {}", other))),
        }
    }
}

/// How a negated predicate is wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotStyle {
    /// `not expr`
    Plain,
    /// `not (expr)`, required where `not` binds tighter than comparison (MySQL)
    Parenthesized,
}

/// Pagination syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitStyle {
    /// `limit N offset M`
    LimitOffset,
    /// `offset M rows fetch next N rows only`
    OffsetFetch,
}

/// Rendering of an IN predicate with no values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyInList {
    /// Render `1=0`, which every database accepts
    #[default]
    AlwaysFalse,
    /// Render `col in ()` verbatim
    Literal,
}

/// How an aggregate function derives its result type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    Long,
    Double,
    /// Long for integral arguments, double for floating ones, otherwise the argument type
    Sum,
    /// Same as the argument
    Argument,
}

/// A registered SQL function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlFunction {
    pub name: String,
    pub sql_name: String,
    pub returns: ReturnKind,
}

impl SqlFunction {
    pub fn new(name: &str, sql_name: &str, returns: ReturnKind) -> Self {
        Self {
            name: name.to_string(),
            sql_name: sql_name.to_string(),
            returns,
        }
    }

    pub fn render(&self, argument: &str, distinct: bool) -> String {
        if distinct {
            format!("{}(distinct {})", self.sql_name, argument)
        } else {
            format!("{}({})", self.sql_name, argument)
        }
    }

    pub fn return_type(&self, argument: &Type) -> Type {
        match self.returns {
            ReturnKind::Long => Type::Long,
            ReturnKind::Double => Type::Double,
            ReturnKind::Sum if argument.is_integral() => Type::Long,
            ReturnKind::Sum if argument.is_floating() => Type::Double,
            ReturnKind::Sum | ReturnKind::Argument => argument.clone(),
        }
    }
}

/// Function lookup by case-insensitive name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionRegistry {
    functions: HashMap<String, SqlFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard aggregates
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(SqlFunction::new("count", "count", ReturnKind::Long));
        registry.register(SqlFunction::new("sum", "sum", ReturnKind::Sum));
        registry.register(SqlFunction::new("avg", "avg", ReturnKind::Double));
        registry.register(SqlFunction::new("min", "min", ReturnKind::Argument));
        registry.register(SqlFunction::new("max", "max", ReturnKind::Argument));
        registry
    }

    pub fn register(&mut self, function: SqlFunction) {
        self.functions.insert(function.name.to_lowercase(), function);
    }

    pub fn find(&self, name: &str) -> Option<&SqlFunction> {
        self.functions.get(&name.to_lowercase())
    }

    pub fn require(&self, name: &str) -> CriteriaResult<&SqlFunction> {
        self.find(name).ok_or_else(|| {
            CriteriaError::Configuration(format!(
                "Unable to locate mapping for function named [{}]",
                name
            ))
        })
    }
}

/// Rendering policies of one database
#[derive(Debug, Clone, PartialEq)]
pub struct Dialect {
    pub kind: DialectKind,
    pub supports_row_value_in_list: bool,
    pub not_style: NotStyle,
    pub lowercase_function: String,
    pub supports_ilike: bool,
    pub limit_style: LimitStyle,
    pub empty_in_list: EmptyInList,
    functions: FunctionRegistry,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new(DialectKind::Generic)
    }
}

impl Dialect {
    pub fn new(kind: DialectKind) -> Self {
        let mut dialect = Self {
            kind,
            supports_row_value_in_list: false,
            not_style: NotStyle::Plain,
            lowercase_function: "lower".to_string(),
            supports_ilike: false,
            limit_style: LimitStyle::LimitOffset,
            empty_in_list: EmptyInList::default(),
            functions: FunctionRegistry::standard(),
        };
        match kind {
            DialectKind::Generic => {}
            DialectKind::PostgreSql => {
                dialect.supports_row_value_in_list = true;
                dialect.supports_ilike = true;
                dialect.register_function(SqlFunction::new("stddev", "stddev", ReturnKind::Double));
                dialect.register_function(SqlFunction::new("variance", "variance", ReturnKind::Double));
            }
            DialectKind::MySql => {
                dialect.supports_row_value_in_list = true;
                dialect.not_style = NotStyle::Parenthesized;
                dialect.register_function(SqlFunction::new("stddev", "std", ReturnKind::Double));
                dialect.register_function(SqlFunction::new("variance", "variance", ReturnKind::Double));
            }
            DialectKind::H2 | DialectKind::Hsql => {
                dialect.supports_row_value_in_list = true;
            }
            DialectKind::Oracle => {
                dialect.supports_row_value_in_list = true;
                dialect.limit_style = LimitStyle::OffsetFetch;
                dialect.register_function(SqlFunction::new("stddev", "stddev", ReturnKind::Double));
                dialect.register_function(SqlFunction::new("variance", "variance", ReturnKind::Double));
            }
            DialectKind::SqlServer => {
                dialect.limit_style = LimitStyle::OffsetFetch;
                dialect.register_function(SqlFunction::new("stddev", "stdev", ReturnKind::Double));
                dialect.register_function(SqlFunction::new("variance", "var", ReturnKind::Double));
            }
        }
        dialect
    }

    pub fn from_name(name: &str) -> CriteriaResult<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn postgresql() -> Self {
        Self::new(DialectKind::PostgreSql)
    }

    pub fn mysql() -> Self {
        Self::new(DialectKind::MySql)
    }

    pub fn with_empty_in_list(mut self, policy: EmptyInList) -> Self {
        self.empty_in_list = policy;
        self
    }

    pub fn register_function(&mut self, function: SqlFunction) {
        self.functions.register(function);
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn function(&self, name: &str) -> CriteriaResult<&SqlFunction> {
        self.functions.require(name)
    }

    pub fn lower(&self, column: &str) -> String {
        format!("{}({})", self.lowercase_function, column)
    }

    /// Prefix and suffix wrapped around a negated expression.
    pub fn not_wrapping(&self) -> (&'static str, &'static str) {
        match self.not_style {
            NotStyle::Plain => ("not ", ""),
            NotStyle::Parenthesized => ("not (", ")"),
        }
    }

    /// Pagination suffix; rows are rendered as literals so they never shift bind positions.
    pub fn render_limit(&self, first_result: Option<u64>, max_results: Option<u64>) -> String {
        match self.limit_style {
            LimitStyle::LimitOffset => {
                let mut sql = String::new();
                if let Some(max) = max_results {
                    sql.push_str(&format!(" limit {}", max));
                }
                if let Some(first) = first_result.filter(|f| *f > 0) {
                    sql.push_str(&format!(" offset {}", first));
                }
                sql
            }
            LimitStyle::OffsetFetch => {
                let first = first_result.unwrap_or(0);
                let mut sql = String::new();
                if first > 0 || max_results.is_some() {
                    sql.push_str(&format!(" offset {} rows", first));
                }
                if let Some(max) = max_results {
                    sql.push_str(&format!(" fetch next {} rows only", max));
                }
                sql
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_name() {
        assert_eq!(Dialect::from_name("postgres").unwrap().kind, DialectKind::PostgreSql);
        assert_eq!(Dialect::from_name("MySQL").unwrap().kind, DialectKind::MySql);
        assert!(matches!(
            Dialect::from_name("informix"),
            Err(CriteriaError::Configuration(_))
        ));
    }

    #[test]
    fn test_mysql_parenthesizes_not() {
        assert_eq!(Dialect::mysql().not_style, NotStyle::Parenthesized);
        assert_eq!(Dialect::postgresql().not_style, NotStyle::Plain);
        assert_eq!(Dialect::default().not_style, NotStyle::Plain);
    }

    #[test]
    fn test_row_value_support() {
        assert!(!Dialect::default().supports_row_value_in_list);
        assert!(!Dialect::new(DialectKind::SqlServer).supports_row_value_in_list);
        assert!(Dialect::postgresql().supports_row_value_in_list);
    }

    #[test]
    fn test_standard_functions() {
        let dialect = Dialect::default();
        let count = dialect.function("COUNT").unwrap();
        assert_eq!(count.render("this_.name", true), "count(distinct this_.name)");
        assert_eq!(count.return_type(&Type::String), Type::Long);

        let sum = dialect.function("sum").unwrap();
        assert_eq!(sum.return_type(&Type::Integer), Type::Long);
        assert_eq!(sum.return_type(&Type::Float), Type::Double);
        assert_eq!(sum.return_type(&Type::BigDecimal), Type::BigDecimal);

        let max = dialect.function("max").unwrap();
        assert_eq!(max.return_type(&Type::Short), Type::Short);
    }

    #[test]
    fn test_unknown_function_is_configuration_error() {
        let err = Dialect::default().function("median").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Unable to locate mapping for function named [median]"
        );
        assert!(Dialect::postgresql().function("stddev").is_ok());
        assert_eq!(Dialect::new(DialectKind::SqlServer).function("stddev").unwrap().sql_name, "stdev");
    }

    #[test]
    fn test_render_limit() {
        let pg = Dialect::postgresql();
        assert_eq!(pg.render_limit(None, Some(10)), " limit 10");
        assert_eq!(pg.render_limit(Some(20), Some(10)), " limit 10 offset 20");
        assert_eq!(pg.render_limit(None, None), "");

        let oracle = Dialect::new(DialectKind::Oracle);
        assert_eq!(
            oracle.render_limit(Some(5), Some(10)),
            " offset 5 rows fetch next 10 rows only"
        );
        assert_eq!(oracle.render_limit(None, Some(3)), " offset 0 rows fetch next 3 rows only");
    }
}
