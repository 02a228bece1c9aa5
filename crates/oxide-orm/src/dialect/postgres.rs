//! PostgreSQL dialect.

use super::{Dialector, Placeholder, Statement};
use crate::model::DataType;
use crate::schema::{Field, Index};

/// Connection settings for [`Postgres`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    /// Driver connections are opened through.
    pub driver_name: String,
    /// Data source name.
    pub dsn: String,
}

/// PostgreSQL dialect.
#[derive(Debug, Clone)]
pub struct Postgres {
    config: PostgresConfig,
}

impl Postgres {
    /// Creates the dialect.
    #[must_use]
    pub const fn new(config: PostgresConfig) -> Self {
        Self { config }
    }
}

impl Dialector for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn driver_name(&self) -> &str {
        &self.config.driver_name
    }

    fn dsn(&self) -> &str {
        &self.config.dsn
    }

    fn placeholder(&self) -> Placeholder {
        Placeholder::Dollar
    }

    fn data_type_of(&self, field: &Field) -> String {
        match &field.data_type {
            DataType::Bool => "boolean".to_string(),
            DataType::Int | DataType::Uint => {
                let bits = field.bits();
                let name = match (field.auto_increment, bits) {
                    (true, 0..=16) => "smallserial",
                    (true, 17..=32) => "serial",
                    (true, _) => "bigserial",
                    (false, 0..=16) => "smallint",
                    (false, 17..=32) => "integer",
                    (false, _) => "bigint",
                };
                name.to_string()
            }
            DataType::Float => {
                if field.precision > 0 {
                    if field.scale > 0 {
                        format!("numeric({},{})", field.precision, field.scale)
                    } else {
                        format!("numeric({})", field.precision)
                    }
                } else {
                    "decimal".to_string()
                }
            }
            DataType::String => {
                if field.size > 0 {
                    format!("varchar({})", field.size)
                } else {
                    "text".to_string()
                }
            }
            DataType::Time => {
                if field.precision > 0 {
                    format!("timestamptz({})", field.precision)
                } else {
                    "timestamptz".to_string()
                }
            }
            DataType::Bytes => "bytea".to_string(),
            DataType::Custom(sql) => sql.clone(),
        }
    }

    fn has_table(&self, table: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM information_schema.tables WHERE table_schema = CURRENT_SCHEMA() AND table_name = ",
        );
        stmt.push_bind(Placeholder::Dollar, table)
            .push(" AND table_type = ")
            .push_bind(Placeholder::Dollar, "BASE TABLE");
        stmt
    }

    fn has_constraint(&self, table: &str, name: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM information_schema.table_constraints WHERE table_schema = CURRENT_SCHEMA() AND table_name = ",
        );
        stmt.push_bind(Placeholder::Dollar, table)
            .push(" AND constraint_name = ")
            .push_bind(Placeholder::Dollar, name);
        stmt
    }

    fn has_index(&self, table: &str, name: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM pg_indexes WHERE schemaname = CURRENT_SCHEMA() AND tablename = ",
        );
        stmt.push_bind(Placeholder::Dollar, table)
            .push(" AND indexname = ")
            .push_bind(Placeholder::Dollar, name);
        stmt
    }

    fn create_index(&self, table: &str, index: &Index) -> Statement {
        let unique = if index.unique { "UNIQUE " } else { "" };
        Statement::new(format!(
            "CREATE {unique}INDEX IF NOT EXISTS {} ON {} ({})",
            self.quote(&index.name),
            self.quote(table),
            self.quote_list(&index.columns)
        ))
    }

    fn column_comment(&self, table: &str, field: &Field) -> Option<Statement> {
        let comment = field.comment.as_deref()?;
        let mut stmt = Statement::new(format!(
            "COMMENT ON COLUMN {}.{} IS ",
            self.quote(table),
            self.quote(&field.db_name)
        ));
        stmt.push_bind(Placeholder::Dollar, comment);
        Some(stmt)
    }
}
