//! SQL text builder that keeps placeholders and bind values aligned.
//!
//! Every `?` written through [`SqlFragment::push_param`] is recorded together
//! with its value, so the parameter list always matches the placeholders in
//! left-to-right order.

use crate::types::TypedValue;

/// SQL text plus its positional parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    sql: String,
    params: Vec<TypedValue>,
}

impl SqlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[TypedValue] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<TypedValue>) {
        (self.sql, self.params)
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Write a `?` placeholder bound to `value`.
    pub fn push_param(&mut self, value: TypedValue) -> &mut Self {
        self.sql.push('?');
        self.params.push(value);
        self
    }

    /// Write `?, ?, ...` for each value, parenthesized when there is more than one.
    pub fn push_param_tuple(&mut self, values: Vec<TypedValue>) -> &mut Self {
        let wrap = values.len() > 1;
        if wrap {
            self.sql.push('(');
        }
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_param(value);
        }
        if wrap {
            self.sql.push(')');
        }
        self
    }

    /// Append author-supplied SQL with its own placeholders and values.
    pub fn push_raw(&mut self, sql: &str, params: &[TypedValue]) -> &mut Self {
        self.sql.push_str(sql);
        self.params.extend_from_slice(params);
        self
    }

    pub fn append(&mut self, other: SqlFragment) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
        self
    }

    /// Surround the text; prefix and suffix must not contain placeholders.
    pub fn wrap(&mut self, prefix: &str, suffix: &str) -> &mut Self {
        self.sql.insert_str(0, prefix);
        self.sql.push_str(suffix);
        self
    }

    /// Join non-empty fragments with `separator`, returning the joined fragment
    /// and how many fragments it contains.
    pub fn join(fragments: Vec<SqlFragment>, separator: &str) -> (SqlFragment, usize) {
        let mut joined = SqlFragment::new();
        let mut count = 0;
        for fragment in fragments.into_iter().filter(|f| !f.is_empty()) {
            if count > 0 {
                joined.push_sql(separator);
            }
            joined.append(fragment);
            count += 1;
        }
        (joined, count)
    }
}
