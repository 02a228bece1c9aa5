//! Schema migrator.
//!
//! The [`Migrator`] brings a database in line with a set of models: it
//! creates missing tables (with their indexes and, when enabled, inline
//! foreign keys), adds missing constraints and indexes to existing tables
//! and creates views.
//!
//! In [`MigrationMode::ConstraintsOnly`] every table is reported as existing,
//! so only the add-constraint path runs.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use tracing::{debug, info};

use crate::db::Db;
use crate::dialect::Statement;
use crate::driver::Value;
use crate::error::{OrmError, Result};
use crate::model::{Model, ModelDef, ViewDef};
use crate::schema::{Constraint, Schema, SchemaCache};

/// How the migrator treats existing tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MigrationMode {
    /// Ask the database whether tables exist.
    #[default]
    Standard,
    /// Assume every table exists; only constraints are added.
    ConstraintsOnly,
}

/// Runs migrations against a [`Db`].
pub struct Migrator<'a> {
    db: &'a mut Db,
}

impl<'a> Migrator<'a> {
    /// Creates a migrator bound to `db`.
    pub const fn new(db: &'a mut Db) -> Self {
        Self { db }
    }

    /// Parses the models into schemas, honoring registered join models.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] for declarations that do not resolve.
    pub fn parse(&self, models: &[&dyn Model]) -> Result<SchemaCache> {
        let defs: Vec<ModelDef> = models.iter().map(|m| m.definition()).collect();
        SchemaCache::parse(&defs, &self.db.config.naming, self.db.join_tables())
    }

    fn count(&mut self, stmt: &Statement) -> Result<bool> {
        let rows = self.db.query(stmt)?;
        Ok(rows.scalar().and_then(Value::as_count).unwrap_or(0) > 0)
    }

    /// Returns whether `table` exists.
    ///
    /// # Errors
    ///
    /// Returns whatever the existence query fails with.
    pub fn has_table(&mut self, table: &str) -> Result<bool> {
        if self.db.mode() == MigrationMode::ConstraintsOnly {
            return Ok(true);
        }
        let stmt = self.db.dialector().has_table(table);
        self.count(&stmt)
    }

    /// Returns whether constraint `name` exists on `table`.
    ///
    /// # Errors
    ///
    /// Returns whatever the existence query fails with.
    pub fn has_constraint(&mut self, table: &str, name: &str) -> Result<bool> {
        let stmt = self.db.dialector().has_constraint(table, name);
        self.count(&stmt)
    }

    /// Returns whether index `name` exists on `table`.
    ///
    /// # Errors
    ///
    /// Returns whatever the existence query fails with.
    pub fn has_index(&mut self, table: &str, name: &str) -> Result<bool> {
        let stmt = self.db.dialector().has_index(table, name);
        self.count(&stmt)
    }

    /// Orders models so that every model comes after the models its foreign
    /// keys reference. Ties keep input order; cycles are broken arbitrarily
    /// but deterministically.
    ///
    /// With `auto_add`, join models of many-to-many relationships are
    /// included right after the model declaring the relationship.
    #[must_use]
    pub fn reorder_models(
        cache: &SchemaCache,
        names: &[String],
        auto_add: bool,
    ) -> Vec<String> {
        let mut inputs: Vec<String> = Vec::new();
        for name in names {
            if inputs.contains(name) {
                continue;
            }
            inputs.push(name.clone());
            if !auto_add {
                continue;
            }
            let Some(schema) = cache.get(name) else {
                continue;
            };
            for rel in schema.sorted_relationship_names() {
                let rel = &schema.relationships[rel];
                if let Some(join) = &rel.join_table {
                    if !rel.ignore_migration && !inputs.contains(join) {
                        inputs.push(join.clone());
                    }
                }
            }
        }

        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
        for name in &inputs {
            nodes.insert(name.as_str(), graph.add_node(name.clone()));
        }

        for name in &inputs {
            let Some(schema) = cache.get(name) else {
                continue;
            };
            for dependency in dependencies(cache, schema) {
                if let Some(&to) = nodes.get(dependency.as_str()) {
                    graph.add_edge(nodes[name.as_str()], to, ());
                }
            }
        }

        let mut ordered = Vec::with_capacity(inputs.len());
        let mut dfs = DfsPostOrder::empty(&graph);
        for name in &inputs {
            dfs.move_to(nodes[name.as_str()]);
            while let Some(node) = dfs.next(&graph) {
                ordered.push(graph[node].clone());
            }
        }
        ordered
    }

    /// Creates missing tables, constraints and indexes for `models`, then
    /// their views.
    ///
    /// # Errors
    ///
    /// Returns an error if the models do not parse or a statement fails.
    pub fn auto_migrate(&mut self, models: &[&dyn Model]) -> Result<()> {
        let cache = self.parse(models)?;
        let views: HashSet<String> = models
            .iter()
            .filter(|m| m.as_view().is_some())
            .map(|m| m.definition().name)
            .collect();
        let names: Vec<String> = models
            .iter()
            .map(|m| m.definition().name)
            .filter(|name| !views.contains(name))
            .collect();

        for name in Self::reorder_models(&cache, &names, true) {
            let schema = cache.lookup(&name)?;
            if self.has_table(&schema.table)? {
                self.add_missing(&cache, schema)?;
            } else {
                self.create_table(&cache, schema)?;
            }
        }

        for model in models {
            if let Some(view) = model.as_view() {
                let table = self.db.table_name(&model.definition());
                let view = view.view_def(self.db.dialector().name());
                self.create_view(&table, &view)?;
            }
        }
        Ok(())
    }

    const fn foreign_keys_enabled(&self) -> bool {
        !self.db.config.disable_foreign_key_constraint_when_migrating
    }

    /// Adds the constraints and indexes an existing table lacks.
    fn add_missing(&mut self, cache: &SchemaCache, schema: &Schema) -> Result<()> {
        debug!(table = %schema.table, "table exists, checking constraints and indexes");
        if self.foreign_keys_enabled() {
            for constraint in owned_constraints(cache, schema) {
                self.create_constraint(cache, &schema.name, &constraint.name)?;
            }
        }
        for index in &schema.indexes {
            if !self.has_index(&schema.table, &index.name)? {
                let stmt = self.db.dialector().create_index(&schema.table, index);
                self.db.exec(&stmt)?;
            }
        }
        Ok(())
    }

    /// Creates the table of `schema`.
    ///
    /// # Errors
    ///
    /// Returns whatever executing the statements fails with.
    pub fn create_table(&mut self, cache: &SchemaCache, schema: &Schema) -> Result<()> {
        info!(table = %schema.table, "creating table");
        let dialect = self.db.dialector();
        let mut stmt =
            Statement::new(format!("CREATE TABLE {} (", dialect.quote(&schema.table)));
        let mut inline_primary_key = false;

        for field in schema.fields.iter().filter(|f| !f.ignore_migration) {
            stmt.push(&dialect.quote(&field.db_name)).push(" ");
            dialect.full_data_type(field, &mut stmt);
            stmt.push(",");
            if dialect
                .data_type_of(field)
                .to_uppercase()
                .contains("PRIMARY KEY")
            {
                inline_primary_key = true;
            }
        }

        if !inline_primary_key && !schema.primary_keys.is_empty() {
            stmt.push(&format!(
                "PRIMARY KEY ({}),",
                dialect.quote_list(&schema.primary_keys)
            ));
        }

        if !dialect.create_index_after_create_table() {
            for index in &schema.indexes {
                let class = if index.unique { "UNIQUE " } else { "" };
                stmt.push(&format!(
                    "{class}INDEX {} ({}),",
                    dialect.quote(&index.name),
                    dialect.quote_list(&index.columns)
                ));
            }
        }

        if self.foreign_keys_enabled() {
            for constraint in owned_constraints(cache, schema) {
                stmt.push(&dialect.constraint_clause(&constraint)).push(",");
            }
        }

        if stmt.sql.ends_with(',') {
            stmt.sql.pop();
        }
        stmt.push(")");

        let after_indexes: Vec<Statement> = if dialect.create_index_after_create_table() {
            schema
                .indexes
                .iter()
                .map(|index| dialect.create_index(&schema.table, index))
                .collect()
        } else {
            Vec::new()
        };
        let comments: Vec<Statement> = schema
            .fields
            .iter()
            .filter(|f| !f.ignore_migration)
            .filter_map(|f| dialect.column_comment(&schema.table, f))
            .collect();

        self.db.exec(&stmt)?;
        for stmt in after_indexes.iter().chain(&comments) {
            self.db.exec(stmt)?;
        }
        Ok(())
    }

    /// Creates the constraint `name` of model `model` unless it exists.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConstraintNotFound`] if no relationship of the
    /// model resolves to `name`, or whatever the statements fail with.
    pub fn create_constraint(
        &mut self,
        cache: &SchemaCache,
        model: &str,
        name: &str,
    ) -> Result<()> {
        let schema = cache.lookup(model)?;
        let constraint = schema.find_constraint(cache, name).ok_or_else(|| {
            OrmError::ConstraintNotFound {
                table: schema.table.clone(),
                name: name.to_string(),
            }
        })?;
        if self.has_constraint(&constraint.table, &constraint.name)? {
            debug!(constraint = %constraint.name, "constraint exists");
            return Ok(());
        }
        info!(constraint = %constraint.name, table = %constraint.table, "creating constraint");
        let stmt = self.db.dialector().add_constraint(&constraint);
        self.db.exec(&stmt)?;
        Ok(())
    }

    /// Creates the foreign key constraints of `models`.
    ///
    /// Models are visited in dependency order, relationships by sorted name;
    /// each constraint is created from the pass of the model that owns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the models do not parse or a statement fails.
    pub fn create_constraints(&mut self, models: &[&dyn Model]) -> Result<()> {
        let cache = self.parse(models)?;
        let names: Vec<String> = models
            .iter()
            .filter(|m| m.as_view().is_none())
            .map(|m| m.definition().name)
            .collect();

        for name in Self::reorder_models(&cache, &names, true) {
            let schema = cache.lookup(&name)?;
            for constraint in owned_constraints(&cache, schema) {
                self.create_constraint(&cache, &schema.name, &constraint.name)?;
            }
        }
        Ok(())
    }

    /// Creates a view.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] for an empty query, or whatever the
    /// statement fails with.
    pub fn create_view(&mut self, name: &str, view: &ViewDef) -> Result<()> {
        if view.query.trim().is_empty() {
            return Err(OrmError::schema(name, "view query is empty"));
        }
        info!(view = %name, "creating view");
        let stmt = self.db.dialector().create_view(name, view);
        self.db.exec(&stmt)?;
        Ok(())
    }
}

/// Constraints owned by `schema`, by sorted relationship name, skipping
/// relationships ignored for migration.
fn owned_constraints(cache: &SchemaCache, schema: &Schema) -> Vec<Constraint> {
    schema
        .sorted_relationship_names()
        .into_iter()
        .map(|rel| &schema.relationships[rel])
        .filter(|rel| !rel.ignore_migration)
        .filter_map(|rel| rel.parse_constraint(cache))
        .filter(|c| c.schema == schema.name)
        .collect()
}

/// Models `schema` must be created after: the referenced side of every
/// constraint it owns.
fn dependencies(cache: &SchemaCache, schema: &Schema) -> Vec<String> {
    owned_constraints(cache, schema)
        .into_iter()
        .filter(|c| c.reference_schema != c.schema)
        .map(|c| c.reference_schema)
        .collect()
}
