//! Naming conventions for tables, columns, constraints and indexes.

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

/// Derives database identifiers from model and field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingStrategy {
    /// Prefix prepended to every table name.
    pub table_prefix: String,
    /// Use singular table names (`user` instead of `users`).
    pub singular_table: bool,
}

impl NamingStrategy {
    /// Table name for a model: `snake_case`, pluralized unless configured otherwise.
    #[must_use]
    pub fn table_name(&self, model: &str) -> String {
        let snake = model.to_snake_case();
        let name = if self.singular_table {
            snake
        } else {
            pluralizer::pluralize(&snake, 2, false)
        };
        format!("{}{}", self.table_prefix, name)
    }

    /// Column name for a field.
    #[must_use]
    pub fn column_name(&self, field: &str) -> String {
        field.to_snake_case()
    }

    /// Join table name for a many-to-many relationship.
    #[must_use]
    pub fn join_table_name(&self, owner_model: &str, relation: &str) -> String {
        format!(
            "{}{}_{}",
            self.table_prefix,
            owner_model.to_snake_case(),
            relation.to_snake_case()
        )
    }

    /// Foreign key constraint name.
    #[must_use]
    pub fn relationship_fk_name(&self, table: &str, relation: &str) -> String {
        format!("fk_{table}_{}", relation.to_snake_case())
    }

    /// Default index name for a column.
    #[must_use]
    pub fn index_name(&self, table: &str, column: &str) -> String {
        format!("idx_{table}_{column}")
    }
}
