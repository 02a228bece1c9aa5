//! Error types for the ORM.

use thiserror::Error;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// No driver is registered under the requested name.
    #[error("sql: unknown driver {0:?} (forgotten register?)")]
    DriverNotRegistered(String),

    /// The driver rejected a call.
    #[error("driver error: {0}")]
    Driver(String),

    /// The version query issued on connect did not return a row.
    #[error("{dialect}: version query `{query}` returned no rows")]
    VersionQuery {
        /// Dialect that issued the query.
        dialect: &'static str,
        /// The query text.
        query: &'static str,
    },

    /// A model definition could not be parsed into a schema.
    #[error("invalid model {model}: {message}")]
    Schema {
        /// Model name.
        model: String,
        /// What is wrong with it.
        message: String,
    },

    /// A model was referenced that is not part of the parsed set.
    #[error("unknown model {0:?}")]
    UnknownModel(String),

    /// A constraint name did not resolve to any relationship of the table.
    #[error("failed to create constraint {name:?}: no such constraint on {table}")]
    ConstraintNotFound {
        /// Table the constraint was looked up on.
        table: String,
        /// Constraint name.
        name: String,
    },
}

impl OrmError {
    pub(crate) fn schema(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            model: model.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
