//! SQL Server dialect.

use super::{Dialector, Placeholder, Statement};
use crate::model::DataType;
use crate::schema::Field;

/// Connection settings for [`SqlServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlServerConfig {
    /// Driver connections are opened through.
    pub driver_name: String,
    /// Data source name.
    pub dsn: String,
}

/// SQL Server dialect.
#[derive(Debug, Clone)]
pub struct SqlServer {
    config: SqlServerConfig,
}

impl SqlServer {
    /// Creates the dialect.
    #[must_use]
    pub const fn new(config: SqlServerConfig) -> Self {
        Self { config }
    }
}

impl Dialector for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn driver_name(&self) -> &str {
        &self.config.driver_name
    }

    fn dsn(&self) -> &str {
        &self.config.dsn
    }

    fn placeholder(&self) -> Placeholder {
        Placeholder::AtP
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn data_type_of(&self, field: &Field) -> String {
        match &field.data_type {
            DataType::Bool => "bit".to_string(),
            DataType::Int | DataType::Uint => {
                let mut sql = match field.bits() {
                    0..=15 => "smallint",
                    16..=30 => "int",
                    _ => "bigint",
                }
                .to_string();
                if field.auto_increment {
                    sql.push_str(" IDENTITY(1,1)");
                }
                sql
            }
            DataType::Float => "float".to_string(),
            DataType::String => {
                let keyed = field.primary_key || field.has_index || field.unique;
                match field.size {
                    1..=4000 => format!("nvarchar({})", field.size),
                    _ if keyed => "nvarchar(4000)".to_string(),
                    _ => "nvarchar(MAX)".to_string(),
                }
            }
            DataType::Time => {
                if field.precision > 0 {
                    format!("datetimeoffset({})", field.precision)
                } else {
                    "datetimeoffset".to_string()
                }
            }
            DataType::Bytes => {
                if field.size > 0 && field.size <= 4000 {
                    format!("varbinary({})", field.size)
                } else {
                    "varbinary(MAX)".to_string()
                }
            }
            DataType::Custom(sql) => sql.clone(),
        }
    }

    fn has_table(&self, table: &str) -> Statement {
        let mut stmt = Statement::new(
            "SELECT count(*) FROM INFORMATION_SCHEMA.tables WHERE table_name = ",
        );
        stmt.push_bind(Placeholder::AtP, table)
            .push(" AND table_catalog = DB_NAME() AND table_type = ")
            .push_bind(Placeholder::AtP, "BASE TABLE");
        stmt
    }

    fn has_constraint(&self, table: &str, name: &str) -> Statement {
        let mut stmt = Statement::new("SELECT count(*) FROM sys.foreign_keys WHERE name = ");
        stmt.push_bind(Placeholder::AtP, name)
            .push(" AND parent_object_id = OBJECT_ID(")
            .push_bind(Placeholder::AtP, table)
            .push(")");
        stmt
    }

    fn has_index(&self, table: &str, name: &str) -> Statement {
        let mut stmt = Statement::new("SELECT count(*) FROM sys.indexes WHERE name = ");
        stmt.push_bind(Placeholder::AtP, name)
            .push(" AND object_id = OBJECT_ID(")
            .push_bind(Placeholder::AtP, table)
            .push(")");
        stmt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::tests::parse_field;
    use crate::driver::Value;
    use crate::model::{DefaultValue, FieldDef};

    fn sqlserver() -> SqlServer {
        SqlServer::new(SqlServerConfig {
            driver_name: "recordriver".into(),
            dsn: "ddl".into(),
        })
    }

    #[test]
    fn test_identity_key() {
        let id = parse_field(FieldDef::new("id", DataType::Uint).primary_key());
        assert_eq!(sqlserver().data_type_of(&id), "bigint IDENTITY(1,1)");
        let small = parse_field(FieldDef::new("n", DataType::Int).size(8));
        assert_eq!(sqlserver().data_type_of(&small), "smallint");
    }

    #[test]
    fn test_string_types() {
        let dialect = sqlserver();
        let plain = parse_field(FieldDef::new("name", DataType::String));
        assert_eq!(dialect.data_type_of(&plain), "nvarchar(MAX)");
        let indexed = parse_field(FieldDef::new("email", DataType::String).index());
        assert_eq!(dialect.data_type_of(&indexed), "nvarchar(4000)");
        let sized = parse_field(FieldDef::new("code", DataType::String).size(10));
        assert_eq!(dialect.data_type_of(&sized), "nvarchar(10)");
    }

    #[test]
    fn test_bool_default_uses_bit_literal() {
        let field = parse_field(
            FieldDef::new("active", DataType::Bool).default(DefaultValue::Bool(true)),
        );
        let mut stmt = Statement::default();
        sqlserver().full_data_type(&field, &mut stmt);
        assert_eq!(stmt.sql, "bit DEFAULT 1");
        assert!(stmt.args.is_empty());
    }

    #[test]
    fn test_has_constraint_query() {
        let stmt = sqlserver().has_constraint("pets", "fk_users_pets");
        assert_eq!(
            stmt.sql,
            "SELECT count(*) FROM sys.foreign_keys WHERE name = @p1 AND parent_object_id = OBJECT_ID(@p2)"
        );
        assert_eq!(stmt.args, vec![Value::from("fk_users_pets"), Value::from("pets")]);
    }
}
