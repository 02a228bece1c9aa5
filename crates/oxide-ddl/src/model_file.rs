//! JSON model files.
//!
//! A model file describes a model set in data, for use from the command
//! line:
//!
//! ```json
//! {
//!   "config": { "disable_foreign_key_constraint_when_migrating": false },
//!   "models": [
//!     { "name": "User", "fields": [...], "relations": [...], "triggers": [...] }
//!   ],
//!   "join_tables": [
//!     { "model": "Person", "field": "Addresses", "join": { "name": "PersonAddress", ... } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use oxide_orm::{Config, DeclaredModel, Model, ModelDef, OrmError};

use crate::error::Result;
use crate::loader::Loader;

/// A custom join model for a many-to-many relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinTableDecl {
    /// Model declaring the relationship.
    pub model: String,
    /// Relationship name.
    pub field: String,
    /// The join model.
    pub join: ModelDef,
}

/// A model set with its migration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelFile {
    /// Models, in load order.
    pub models: Vec<DeclaredModel>,
    /// Migration settings.
    pub config: Config,
    /// Custom join models.
    pub join_tables: Vec<JoinTableDecl>,
}

impl ModelFile {
    /// Reads a model file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a model set.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses a model file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`](crate::LoadError::Json) if `text` is not
    /// a model set.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The models as trait objects, in load order.
    #[must_use]
    pub fn models(&self) -> Vec<&dyn Model> {
        self.models.iter().map(|m| m as &dyn Model).collect()
    }

    /// Builds a loader for `dialect` with this file's settings and join
    /// models.
    ///
    /// # Errors
    ///
    /// Returns an error if a join table names a model the file lacks.
    pub fn loader(&self, dialect: &str) -> Result<Loader> {
        let mut loader = Loader::new(dialect).with_config(self.config.clone());
        for decl in &self.join_tables {
            let model = self
                .models
                .iter()
                .find(|m| m.definition.name == decl.model)
                .ok_or_else(|| OrmError::UnknownModel(decl.model.clone()))?;
            loader = loader.with_join_table(model, &decl.field, &decl.join);
        }
        Ok(loader)
    }

    /// Returns the DDL of this model set for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns an error if building the loader or loading fails.
    pub fn load(&self, dialect: &str) -> Result<String> {
        self.loader(dialect)?.load(&self.models())
    }
}
