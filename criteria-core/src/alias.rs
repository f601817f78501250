//! Per-compilation alias allocation.
//!
//! Aliases are derived from counters owned by one compilation, so compiling
//! the same tree twice yields the same SQL text. Each subquery gets a nested
//! allocator whose aliases carry the subquery's ordinal as a suffix, which
//! keeps them distinct from the enclosing query's aliases.

/// Alias naming the root criteria in property paths
pub const ROOT_ALIAS: &str = "this";

const ALIAS_TRUNCATE_LENGTH: usize = 10;

/// Result-column alias for the column at `position` in the select list
pub fn column_alias(position: usize) -> String {
    format!("y{}_", position)
}

#[derive(Debug, Clone, Default)]
pub struct AliasAllocator {
    namespace: String,
    next_join: usize,
    next_subquery: usize,
}

impl AliasAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// SQL alias of the root table in this scope.
    pub fn root_alias(&self) -> String {
        if self.namespace.is_empty() {
            format!("{}_", ROOT_ALIAS)
        } else {
            format!("{}{}", ROOT_ALIAS, self.namespace)
        }
    }

    /// SQL alias for a joined association, derived from its criteria alias.
    pub fn next_join_alias(&mut self, description: &str) -> String {
        let alias = format!("{}{}_{}", alias_root(description), self.next_join, self.namespace);
        self.next_join += 1;
        tracing::trace!("allocated join alias {} for {}", alias, description);
        alias
    }

    /// Allocator for a subquery nested in this scope.
    pub fn nested(&mut self) -> AliasAllocator {
        let namespace = format!("{}{}_", self.namespace, self.next_subquery);
        self.next_subquery += 1;
        AliasAllocator {
            namespace,
            next_join: 0,
            next_subquery: 0,
        }
    }
}

fn alias_root(description: &str) -> String {
    let unqualified = description.rsplit('.').next().unwrap_or(description);
    let mut root: String = unqualified
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(ALIAS_TRUNCATE_LENGTH)
        .collect::<String>()
        .to_lowercase();
    if root.is_empty() {
        root.push_str("alias");
    }
    // a trailing digit would run into the counter, and `this` followed by a
    // counter is the root alias of a subquery
    if root == ROOT_ALIAS || root.ends_with(|c: char| c.is_ascii_digit()) {
        root.push('x');
    }
    root
}
