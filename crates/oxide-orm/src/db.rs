//! Database handle.
//!
//! A [`Db`] pairs a [`Dialector`] with an open [`Connection`] and the
//! migration settings that apply to it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dialect::{Dialector, Statement};
use crate::driver::{Connection, Drivers, Rows};
use crate::error::{OrmError, Result};
use crate::migrator::{MigrationMode, Migrator};
use crate::model::{Model, ModelDef, RelationKind};
use crate::schema::{JoinTableSetup, NamingStrategy};

/// Migration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Leave foreign key constraints out of migrations.
    pub disable_foreign_key_constraint_when_migrating: bool,
    /// Naming conventions.
    pub naming: NamingStrategy,
}

/// An open database.
pub struct Db {
    dialector: Box<dyn Dialector>,
    conn: Box<dyn Connection>,
    /// Migration settings; may be changed after opening.
    pub config: Config,
    mode: MigrationMode,
    join_tables: Vec<JoinTableSetup>,
}

impl Db {
    /// Opens a connection through the dialect's driver and runs the
    /// dialect's connect-time setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver is not registered, the connection
    /// cannot be opened or the dialect's setup fails.
    pub fn open(
        mut dialector: Box<dyn Dialector>,
        drivers: &Drivers,
        config: Config,
    ) -> Result<Self> {
        let mut conn = drivers.open(dialector.driver_name(), dialector.dsn())?;
        dialector.initialize(conn.as_mut())?;
        info!(
            dialect = dialector.name(),
            driver = dialector.driver_name(),
            "opened database"
        );
        Ok(Self {
            dialector,
            conn,
            config,
            mode: MigrationMode::default(),
            join_tables: Vec::new(),
        })
    }

    /// Sets the migration mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: MigrationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the migration mode.
    #[must_use]
    pub const fn mode(&self) -> MigrationMode {
        self.mode
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialector(&self) -> &dyn Dialector {
        self.dialector.as_ref()
    }

    /// Executes a statement.
    ///
    /// # Errors
    ///
    /// Returns whatever the connection fails with.
    pub fn exec(&mut self, stmt: &Statement) -> Result<u64> {
        debug!(sql = %stmt.sql, args = stmt.args.len(), "exec");
        self.conn.exec(&stmt.sql, &stmt.args)
    }

    /// Runs a query.
    ///
    /// # Errors
    ///
    /// Returns whatever the connection fails with.
    pub fn query(&mut self, stmt: &Statement) -> Result<Rows> {
        debug!(sql = %stmt.sql, args = stmt.args.len(), "query");
        self.conn.query(&stmt.sql, &stmt.args)
    }

    /// Replaces the generated join model of `model`'s many-to-many
    /// relationship `field` with `join`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] if `model` has no many-to-many
    /// relationship named `field`.
    pub fn setup_join_table(
        &mut self,
        model: &dyn Model,
        field: &str,
        join: &dyn Model,
    ) -> Result<()> {
        let def = model.definition();
        let is_many_to_many = def
            .get_relation(field)
            .is_some_and(|rel| rel.kind == RelationKind::ManyToMany);
        if !is_many_to_many {
            return Err(OrmError::Schema {
                model: def.name,
                message: format!("failed to find many-to-many relation {field}"),
            });
        }

        self.join_tables
            .retain(|setup| !(setup.model == def.name && setup.field == field));
        self.join_tables.push(JoinTableSetup {
            model: def.name,
            field: field.to_string(),
            join: join.definition(),
        });
        Ok(())
    }

    /// Returns the registered join models.
    #[must_use]
    pub fn join_tables(&self) -> &[JoinTableSetup] {
        &self.join_tables
    }

    /// Carries join model registrations over from another handle.
    #[must_use]
    pub fn with_join_tables(mut self, join_tables: Vec<JoinTableSetup>) -> Self {
        self.join_tables = join_tables;
        self
    }

    /// Table name of a model under this handle's naming strategy.
    #[must_use]
    pub fn table_name(&self, def: &ModelDef) -> String {
        def.table
            .clone()
            .unwrap_or_else(|| self.config.naming.table_name(&def.name))
    }

    /// Returns a migrator bound to this handle.
    pub const fn migrator(&mut self) -> Migrator<'_> {
        Migrator::new(self)
    }
}
