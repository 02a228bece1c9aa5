//! # oxide-orm
//!
//! Model declarations, schema parsing and a dialect-aware migrator.
//!
//! This crate provides:
//! - `ModelDef` / `Model` for declaring tables, indexes and relationships
//! - `SchemaCache` for resolving declarations into schemas and constraints
//! - `Dialector` implementations for MySQL, PostgreSQL, SQLite and SQL Server
//! - `Db` and `Migrator` for creating tables, constraints and views
//! - the `Driver` / `Connection` seam every statement goes through
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_orm::{Config, Db, Drivers, ModelDef, Mysql, MysqlConfig};
//! use oxide_orm::{DataType, FieldDef};
//!
//! let user = ModelDef::new("User")
//!     .with_base_fields()
//!     .field(FieldDef::new("name", DataType::String))
//!     .has_many("Pets", "Pet");
//! let pet = ModelDef::new("Pet")
//!     .with_base_fields()
//!     .field(FieldDef::new("user_id", DataType::Uint));
//!
//! let mut drivers = Drivers::new();
//! drivers.register("mydriver", my_driver);
//! let dialect = Mysql::new(MysqlConfig {
//!     driver_name: "mydriver".into(),
//!     dsn: "app".into(),
//! });
//!
//! let mut db = Db::open(Box::new(dialect), &drivers, Config::default())?;
//! db.migrator().auto_migrate(&[&user, &pet])?;
//! ```
//!
//! ## Relationships
//!
//! Relationships name their target model; the foreign key column defaults
//! to `<model>_id` on the holder. A has-one or has-many constraint belongs
//! to the target table and is named `fk_<owner table>_<relation>`:
//!
//! ```ignore
//! let cache = SchemaCache::parse(&[user, pet], &NamingStrategy::default(), &[])?;
//! let pets = &cache.get("User").unwrap().relationships["Pets"];
//! let constraint = pets.parse_constraint(&cache).unwrap();
//! assert_eq!(constraint.name, "fk_users_pets");
//! assert_eq!(constraint.table, "pets");
//! ```

mod db;
pub mod dialect;
mod driver;
mod error;
mod migrator;
mod model;
pub mod schema;
mod trigger;

pub use db::{Config, Db};
pub use dialect::{
    Dialector, Mysql, MysqlConfig, Placeholder, Postgres, PostgresConfig, SqlServer,
    SqlServerConfig, Sqlite, SqliteConfig, Statement,
};
pub use driver::{Connection, Driver, Drivers, Rows, Value};
pub use error::{OrmError, Result};
pub use migrator::{MigrationMode, Migrator};
pub use model::{
    DataType, DeclaredModel, DefaultValue, FieldDef, ForeignKeyAction, HasTriggers, HasView,
    IndexTag, Model, ModelDef, RelationDef, RelationKind, ViewDef,
};
pub use schema::{JoinTableSetup, NamingStrategy, SchemaCache};
pub use trigger::{Trigger, TriggerEvent, TriggerFor, TriggerTime};
