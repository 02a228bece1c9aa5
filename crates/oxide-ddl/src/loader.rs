//! The DDL loader.
//!
//! [`Loader::load`] runs a full migration of the given models against a
//! recording driver and returns what was recorded:
//!
//! 1. tables and indexes, in dependency order (with inline foreign keys on
//!    SQLite),
//! 2. foreign key constraints, added to the already "existing" tables,
//! 3. triggers, in model order.

use oxide_orm::{Config, Db, Drivers, MigrationMode, Model, Statement, Value};
use oxide_recordriver::{RecordDriver, Response};
use tracing::{debug, info};

use crate::engine::{Engine, DRIVER_NAME, SESSION_KEY};
use crate::error::{LoadError, Result};
use crate::trigger;

type Callback = Box<dyn Fn(&mut Db) -> oxide_orm::Result<()>>;

/// Turns models into the DDL statements of one dialect.
pub struct Loader {
    dialect: String,
    config: Config,
    before_auto_migrate: Vec<Callback>,
}

impl Loader {
    /// Creates a loader for `dialect` (`mysql`, `postgres`, `sqlite` or
    /// `sqlserver`). Unsupported names fail at [`load`](Self::load).
    #[must_use]
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            config: Config::default(),
            before_auto_migrate: Vec::new(),
        }
    }

    /// Sets the migration config.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Uses `join` as the join model of `model`'s many-to-many relationship
    /// `field`.
    #[must_use]
    pub fn with_join_table(self, model: &dyn Model, field: &str, join: &dyn Model) -> Self {
        let model = model.definition();
        let join = join.definition();
        let field = field.to_string();
        self.before_auto_migrate(move |db| db.setup_join_table(&model, &field, &join))
    }

    /// Runs `callback` on the database before tables are created.
    #[must_use]
    pub fn before_auto_migrate(
        mut self,
        callback: impl Fn(&mut Db) -> oxide_orm::Result<()> + 'static,
    ) -> Self {
        self.before_auto_migrate.push(Box::new(callback));
        self
    }

    /// Returns the DDL for `models`, one statement per line.
    ///
    /// # Errors
    ///
    /// Returns an error if the dialect is unsupported, a callback fails, a
    /// model cannot be parsed, or a trigger cannot be rendered.
    pub fn load(&self, models: &[&dyn Model]) -> Result<String> {
        let engine: Engine = self.dialect.parse()?;

        let recorder = RecordDriver::new();
        if let Some(seeded) = engine.seeded_version() {
            recorder.set_response(
                SESSION_KEY,
                seeded.query,
                Response::new([seeded.column], vec![vec![Value::from(seeded.version)]]),
            );
        }
        let mut drivers = Drivers::new();
        drivers.register(DRIVER_NAME, recorder.clone());

        let mut db = Db::open(engine.dialector(), &drivers, self.config.clone())?;
        if !engine.inline_foreign_keys() {
            db.config.disable_foreign_key_constraint_when_migrating = true;
        }
        for callback in &self.before_auto_migrate {
            callback(&mut db)?;
        }

        info!(engine = %engine, models = models.len(), "creating tables");
        db.migrator().auto_migrate(models)?;

        let mut db = Db::open(engine.dialector(), &drivers, self.config.clone())?
            .with_mode(MigrationMode::ConstraintsOnly)
            .with_join_tables(db.join_tables().to_vec());

        if !self.config.disable_foreign_key_constraint_when_migrating
            && !engine.inline_foreign_keys()
        {
            info!(engine = %engine, "creating constraints");
            db.migrator().create_constraints(models)?;
        }

        create_triggers(&mut db, engine, models)?;

        let session = recorder
            .session(SESSION_KEY)
            .ok_or_else(|| LoadError::SessionNotFound(SESSION_KEY.to_string()))?;
        Ok(session.stmts())
    }
}

/// Renders and executes the triggers of every model that declares some.
fn create_triggers(db: &mut Db, engine: Engine, models: &[&dyn Model]) -> Result<()> {
    for model in models {
        let Some(triggers) = model.as_triggers() else {
            continue;
        };
        let table = db.table_name(&model.definition());
        for t in triggers.triggers() {
            debug!(trigger = %t.name, table = %table, "creating trigger");
            let sql = trigger::render(&t, &table, engine.name())?;
            db.exec(&Statement::new(sql))?;
        }
    }
    Ok(())
}
