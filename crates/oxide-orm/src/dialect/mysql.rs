//! MySQL dialect.

use tracing::debug;

use super::{column_definition, version_lt, Dialector, Placeholder, Statement};
use crate::driver::{Connection, Value};
use crate::error::{OrmError, Result};
use crate::model::DataType;
use crate::schema::Field;

/// Connection settings for [`Mysql`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MysqlConfig {
    /// Driver connections are opened through.
    pub driver_name: String,
    /// Data source name.
    pub dsn: String,
}

/// MySQL dialect.
#[derive(Debug, Clone)]
pub struct Mysql {
    config: MysqlConfig,
    server_version: Option<String>,
    datetime_precision: bool,
}

impl Mysql {
    /// Query issued on connect to learn the server version.
    pub const VERSION_QUERY: &'static str = "SELECT VERSION()";

    /// Creates the dialect.
    #[must_use]
    pub const fn new(config: MysqlConfig) -> Self {
        Self {
            config,
            server_version: None,
            datetime_precision: true,
        }
    }

    /// Server version learned on connect.
    #[must_use]
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    fn int_type(field: &Field) -> String {
        let mut sql = match field.bits() {
            0..=8 => "tinyint",
            9..=16 => "smallint",
            17..=24 => "mediumint",
            25..=32 => "int",
            _ => "bigint",
        }
        .to_string();
        if field.data_type == DataType::Uint {
            sql.push_str(" unsigned");
        }
        if field.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql
    }

    fn string_type(field: &Field) -> String {
        let mut size = field.size;
        let keyed = field.primary_key || field.default.is_some() || field.has_index || field.unique;
        if size == 0 && keyed {
            size = 191;
        }
        if (65536..=1 << 24).contains(&size) {
            "mediumtext".to_string()
        } else if size > 1 << 24 || size == 0 {
            "longtext".to_string()
        } else {
            format!("varchar({size})")
        }
    }

    fn time_type(&self, field: &Field) -> String {
        let precision = if field.precision > 0 { field.precision } else { 3 };
        let mut sql = if self.datetime_precision {
            format!("datetime({precision})")
        } else {
            "datetime".to_string()
        };
        if !field.not_null && !field.primary_key {
            sql.push_str(" NULL");
        }
        sql
    }
}

impl Dialector for Mysql {
    fn name(&self) -> &'static str {
        "mysql"
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
                dialect: "mysql",
                query: Self::VERSION_QUERY,
            })?
            .to_string();
        debug!(version = %version, "mysql server version");
        if !version.contains("MariaDB") && version_lt(&version, 5, 6) {
            self.datetime_precision = false;
        }
        self.server_version = Some(version);
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
            DataType::Bool => "boolean".to_string(),
            DataType::Int | DataType::Uint => Self::int_type(field),
            DataType::Float => {
                if field.precision > 0 {
                    format!("decimal({}, {})", field.precision, field.scale)
                } else if field.bits() <= 32 {
                    "float".to_string()
                } else {
                    "double".to_string()
                }
            }
            DataType::String => Self::string_type(field),
            DataType::Time => self.time_type(field),
            DataType::Bytes => {
                if field.size > 0 && field.size < 65536 {
                    format!("varbinary({})", field.size)
                } else {
                    "longblob".to_string()
                }
            }
            DataType::Custom(sql) => sql.clone(),
        }
    }

    fn create_index_after_create_table(&self) -> bool {
        false
    }

    fn has_table(&self, table: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ",
        );
        stmt.push_bind(Placeholder::Question, table)
            .push(" AND table_type = ")
            .push_bind(Placeholder::Question, "BASE TABLE");
        stmt
    }

    fn has_constraint(&self, table: &str, name: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM information_schema.table_constraints WHERE constraint_schema = DATABASE() AND table_name = ",
        );
        stmt.push_bind(Placeholder::Question, table)
            .push(" AND constraint_name = ")
            .push_bind(Placeholder::Question, name);
        stmt
    }

    fn has_index(&self, table: &str, name: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM information_schema.statistics WHERE table_schema = DATABASE() AND table_name = ",
        );
        stmt.push_bind(Placeholder::Question, table)
            .push(" AND index_name = ")
            .push_bind(Placeholder::Question, name);
        stmt
    }

    fn full_data_type(&self, field: &Field, stmt: &mut Statement) {
        column_definition(self, field, stmt);
        if let Some(comment) = &field.comment {
            stmt.push(" COMMENT ").push_bind(Placeholder::Question, comment.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::tests::parse_field;
    use crate::driver::{Rows, Value};
    use crate::model::{DefaultValue, FieldDef};

    fn mysql() -> Mysql {
        Mysql::new(MysqlConfig {
            driver_name: "recordriver".into(),
            dsn: "ddl".into(),
        })
    }

    struct VersionConn(Option<&'static str>);

    impl Connection for VersionConn {
        fn exec(&mut self, _sql: &str, _args: &[Value]) -> Result<u64> {
            Ok(0)
        }

        fn query(&mut self, sql: &str, _args: &[Value]) -> Result<Rows> {
            assert_eq!(sql, Mysql::VERSION_QUERY);
            Ok(Rows {
                columns: vec!["VERSION()".into()],
                data: self.0.map(|v| vec![vec![Value::from(v)]]).unwrap_or_default(),
            })
        }
    }

    #[test]
    fn test_initialize_reads_version() {
        let mut dialect = mysql();
        dialect.initialize(&mut VersionConn(Some("8.0.24"))).unwrap();
        assert_eq!(dialect.server_version(), Some("8.0.24"));
        let field = parse_field(FieldDef::new("created_at", DataType::Time));
        assert_eq!(dialect.data_type_of(&field), "datetime(3) NULL");
    }

    #[test]
    fn test_initialize_old_server_drops_datetime_precision() {
        let mut dialect = mysql();
        dialect.initialize(&mut VersionConn(Some("5.5.62"))).unwrap();
        let field = parse_field(FieldDef::new("created_at", DataType::Time).not_null());
        assert_eq!(dialect.data_type_of(&field), "datetime");
    }

    #[test]
    fn test_initialize_without_rows_fails() {
        let err = mysql().initialize(&mut VersionConn(None)).unwrap_err();
        assert!(matches!(err, OrmError::VersionQuery { dialect: "mysql", .. }));
    }

    #[test]
    fn test_integer_types() {
        let dialect = mysql();
        let id = parse_field(FieldDef::new("id", DataType::Uint).primary_key());
        assert_eq!(dialect.data_type_of(&id), "bigint unsigned AUTO_INCREMENT");

        let small = parse_field(FieldDef::new("age", DataType::Int).size(16));
        assert_eq!(dialect.data_type_of(&small), "smallint");

        let tiny = parse_field(FieldDef::new("flag", DataType::Uint).size(8));
        assert_eq!(dialect.data_type_of(&tiny), "tinyint unsigned");
    }

    #[test]
    fn test_string_types() {
        let dialect = mysql();
        let plain = parse_field(FieldDef::new("name", DataType::String));
        assert_eq!(dialect.data_type_of(&plain), "longtext");

        let indexed = parse_field(FieldDef::new("email", DataType::String).unique_index());
        assert_eq!(dialect.data_type_of(&indexed), "varchar(191)");

        let sized = parse_field(FieldDef::new("code", DataType::String).size(32));
        assert_eq!(dialect.data_type_of(&sized), "varchar(32)");

        let medium = parse_field(FieldDef::new("bio", DataType::String).size(70_000));
        assert_eq!(dialect.data_type_of(&medium), "mediumtext");
    }

    #[test]
    fn test_float_and_bytes_types() {
        let dialect = mysql();
        let price = parse_field(FieldDef::new("price", DataType::Float).precision(10, 2));
        assert_eq!(dialect.data_type_of(&price), "decimal(10, 2)");
        let ratio = parse_field(FieldDef::new("ratio", DataType::Float).size(32));
        assert_eq!(dialect.data_type_of(&ratio), "float");
        let blob = parse_field(FieldDef::new("data", DataType::Bytes));
        assert_eq!(dialect.data_type_of(&blob), "longblob");
    }

    #[test]
    fn test_full_data_type_binds_default_and_comment() {
        let dialect = mysql();
        let field = parse_field(
            FieldDef::new("status", DataType::String)
                .size(16)
                .not_null()
                .default(DefaultValue::String("active".into()))
                .comment("lifecycle"),
        );
        let mut stmt = Statement::default();
        dialect.full_data_type(&field, &mut stmt);
        assert_eq!(stmt.sql, "varchar(16) NOT NULL DEFAULT ? COMMENT ?");
        assert_eq!(stmt.args, vec![Value::from("active"), Value::from("lifecycle")]);
    }

    #[test]
    fn test_has_table_query() {
        let stmt = mysql().has_table("users");
        assert_eq!(
            stmt.sql,
            "SELECT count(*) FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ? AND table_type = ?"
        );
        assert_eq!(stmt.args, vec![Value::from("users"), Value::from("BASE TABLE")]);
    }
}
