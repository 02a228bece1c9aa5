//! Database dialect implementations.
//!
//! A [`Dialector`] knows how one database spells DDL: identifier quoting,
//! bind placeholders, column types, introspection queries and the handful of
//! statements the migrator issues. Statements are built as [`Statement`]s so
//! bound values travel next to the SQL that references them.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::{Mysql, MysqlConfig};
pub use postgres::{Postgres, PostgresConfig};
pub use sqlite::{Sqlite, SqliteConfig};
pub use sqlserver::{SqlServer, SqlServerConfig};

use crate::driver::{Connection, Value};
use crate::error::Result;
use crate::model::{DefaultValue, ViewDef};
use crate::schema::{Constraint, Field, Index};

/// Bind placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Dollar,
    /// `@p1`, `@p2`, ...
    AtP,
}

impl Placeholder {
    /// Renders the placeholder for the `n`th argument (1-based).
    #[must_use]
    pub fn render(self, n: usize) -> String {
        match self {
            Self::Question => "?".to_string(),
            Self::Dollar => format!("${n}"),
            Self::AtP => format!("@p{n}"),
        }
    }
}

/// SQL text plus the values bound to its placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Bound values, in placeholder order.
    pub args: Vec<Value>,
}

impl Statement {
    /// Creates a statement without arguments.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Appends raw SQL.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Appends a placeholder and binds `value` to it.
    pub fn push_bind(&mut self, placeholder: Placeholder, value: impl Into<Value>) -> &mut Self {
        self.args.push(value.into());
        let rendered = placeholder.render(self.args.len());
        self.sql.push_str(&rendered);
        self
    }
}

/// Database-specific DDL generation and introspection.
pub trait Dialector {
    /// Dialect name, as used to pick trigger templates.
    fn name(&self) -> &'static str;

    /// Name of the driver connections are opened through.
    fn driver_name(&self) -> &str;

    /// Data source name passed to the driver.
    fn dsn(&self) -> &str;

    /// Runs the dialect's connect-time setup, such as reading the server
    /// version.
    ///
    /// # Errors
    ///
    /// Returns an error if a setup query fails or returns nothing usable.
    fn initialize(&mut self, _conn: &mut dyn Connection) -> Result<()> {
        Ok(())
    }

    /// Quotes an identifier.
    #[must_use]
    fn quote(&self, ident: &str) -> String {
        format!("\"{ident}\"")
    }

    /// Bind placeholder style.
    fn placeholder(&self) -> Placeholder;

    /// Column type for a field, without nullability or defaults.
    fn data_type_of(&self, field: &Field) -> String;

    /// Literal for a boolean default.
    #[must_use]
    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "true"
        } else {
            "false"
        }
    }

    /// Whether indexes are created by separate statements after the table.
    #[must_use]
    fn create_index_after_create_table(&self) -> bool {
        true
    }

    /// Query counting tables named `table`.
    fn has_table(&self, table: &str) -> Statement;

    /// Query counting constraints named `name` on `table`.
    fn has_constraint(&self, table: &str, name: &str) -> Statement;

    /// Query counting indexes named `name` on `table`.
    fn has_index(&self, table: &str, name: &str) -> Statement;

    /// `CREATE INDEX` statement.
    #[must_use]
    fn create_index(&self, table: &str, index: &Index) -> Statement {
        let unique = if index.unique { "UNIQUE " } else { "" };
        Statement::new(format!(
            "CREATE {unique}INDEX {} ON {}({})",
            self.quote(&index.name),
            self.quote(table),
            self.quote_list(&index.columns)
        ))
    }

    /// Separate statement setting a column comment, for dialects that do
    /// not support inline comments.
    #[must_use]
    fn column_comment(&self, _table: &str, _field: &Field) -> Option<Statement> {
        None
    }

    /// Writes the full column definition (type, NOT NULL, UNIQUE and
    /// DEFAULT) into `stmt`, numbering placeholders after its existing
    /// arguments.
    fn full_data_type(&self, field: &Field, stmt: &mut Statement) {
        column_definition(self, field, stmt);
    }

    /// Quotes and comma-joins identifiers.
    #[must_use]
    fn quote_list(&self, idents: &[String]) -> String {
        idents
            .iter()
            .map(|i| self.quote(i))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `CONSTRAINT ... FOREIGN KEY ... REFERENCES ...` clause.
    #[must_use]
    fn constraint_clause(&self, constraint: &Constraint) -> String {
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
            self.quote(&constraint.name),
            self.quote_list(&constraint.foreign_keys),
            self.quote(&constraint.reference_table),
            self.quote_list(&constraint.references)
        );
        if let Some(action) = constraint.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = constraint.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }

    /// `ALTER TABLE ... ADD CONSTRAINT` statement.
    #[must_use]
    fn add_constraint(&self, constraint: &Constraint) -> Statement {
        Statement::new(format!(
            "ALTER TABLE {} ADD {}",
            self.quote(&constraint.table),
            self.constraint_clause(constraint)
        ))
    }

    /// `CREATE VIEW` statement.
    #[must_use]
    fn create_view(&self, name: &str, view: &ViewDef) -> Statement {
        let replace = if view.replace { "OR REPLACE " } else { "" };
        Statement::new(format!(
            "CREATE {replace}VIEW {} AS {}",
            self.quote(name),
            view.query
        ))
    }
}

/// Column type followed by NOT NULL, UNIQUE and DEFAULT clauses.
pub(crate) fn column_definition<D: Dialector + ?Sized>(
    dialect: &D,
    field: &Field,
    stmt: &mut Statement,
) {
    stmt.push(&dialect.data_type_of(field));
    if field.not_null {
        stmt.push(" NOT NULL");
    }
    if field.unique {
        stmt.push(" UNIQUE");
    }
    if let Some(default) = &field.default {
        stmt.push(" DEFAULT ");
        match default {
            DefaultValue::Null => {
                stmt.push("NULL");
            }
            DefaultValue::Bool(b) => {
                stmt.push(dialect.bool_literal(*b));
            }
            DefaultValue::Expression(expr) => {
                stmt.push(expr);
            }
            literal => {
                if let Some(arg) = literal.to_arg() {
                    stmt.push_bind(dialect.placeholder(), arg);
                }
            }
        }
    }
}

/// Returns whether `version` is older than `major.minor`.
///
/// Unparsable components count as zero.
pub(crate) fn version_lt(version: &str, major: u32, minor: u32) -> bool {
    let mut parts = version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u32>().unwrap_or(0));
    let got_major = parts.next().unwrap_or(0);
    let got_minor = parts.next().unwrap_or(0);
    (got_major, got_minor) < (major, minor)
}
