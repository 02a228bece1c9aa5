//! SQLite dialect.

use tracing::debug;

use super::{Dialector, Placeholder, Statement};
use crate::driver::{Connection, Value};
use crate::error::{OrmError, Result};
use crate::model::DataType;
use crate::schema::Field;

/// Connection settings for [`Sqlite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Driver connections are opened through.
    pub driver_name: String,
    /// Data source name.
    pub dsn: String,
}

/// SQLite dialect.
#[derive(Debug, Clone)]
pub struct Sqlite {
    config: SqliteConfig,
    version: Option<String>,
}

impl Sqlite {
    /// Query issued on connect to learn the library version.
    pub const VERSION_QUERY: &'static str = "select sqlite_version()";

    /// Creates the dialect.
    #[must_use]
    pub const fn new(config: SqliteConfig) -> Self {
        Self {
            config,
            version: None,
        }
    }

    /// Library version learned on connect.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl Dialector for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn driver_name(&self) -> &str {
        &self.config.driver_name
    }

    fn dsn(&self) -> &str {
        &self.config.dsn
    }

    fn initialize(&mut self, conn: &mut dyn Connection) -> Result<()> {
        let rows = conn.query(Self::VERSION_QUERY, &[])?;
        let version = rows
            .scalar()
            .and_then(Value::as_str)
            .ok_or(OrmError::VersionQuery {
                dialect: "sqlite",
                query: Self::VERSION_QUERY,
            })?;
        debug!(version = %version, "sqlite library version");
        self.version = Some(version.to_string());
        Ok(())
    }

    fn quote(&self, ident: &str) -> String {
        format!("`{ident}`")
    }

    fn placeholder(&self) -> Placeholder {
        Placeholder::Question
    }

    fn data_type_of(&self, field: &Field) -> String {
        match &field.data_type {
            DataType::Bool => "numeric".to_string(),
            // Auto-increment implies the primary key here, even on non-key
            // fields.
            DataType::Int | DataType::Uint if field.auto_increment => {
                "integer PRIMARY KEY AUTOINCREMENT".to_string()
            }
            DataType::Int | DataType::Uint => "integer".to_string(),
            DataType::Float => "real".to_string(),
            DataType::String => "text".to_string(),
            DataType::Time => "datetime".to_string(),
            DataType::Bytes => "blob".to_string(),
            DataType::Custom(sql) => sql.clone(),
        }
    }

    fn has_table(&self, table: &str) -> Statement {
        let mut stmt = Statement::new("SELECT count(*) FROM sqlite_master WHERE type='table' AND name=");
        stmt.push_bind(Placeholder::Question, table);
        stmt
    }

    fn has_constraint(&self, table: &str, name: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND tbl_name = ",
        );
        stmt.push_bind(Placeholder::Question, table)
            .push(" AND (sql LIKE ")
            .push_bind(Placeholder::Question, format!("%CONSTRAINT \"{name}\" %"))
            .push(" OR sql LIKE ")
            .push_bind(Placeholder::Question, format!("%CONSTRAINT {name} %"))
            .push(" OR sql LIKE ")
            .push_bind(Placeholder::Question, format!("%CONSTRAINT `{name}`%"))
            .push(")");
        stmt
    }

    fn has_index(&self, table: &str, name: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = ",
        );
        stmt.push_bind(Placeholder::Question, table)
            .push(" AND name = ")
            .push_bind(Placeholder::Question, name);
        stmt
    }
}
