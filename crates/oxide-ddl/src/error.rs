//! Error types for DDL extraction.

use thiserror::Error;

use oxide_orm::OrmError;

/// Errors that can occur while loading models into DDL.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The requested dialect has no adapter.
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),

    /// The recorded session disappeared before it could be read.
    #[error("ddl session {0:?} not found")]
    SessionNotFound(String),

    /// Schema parsing or migration failed.
    #[error(transparent)]
    Orm(#[from] OrmError),

    /// No trigger template exists for the dialect.
    #[error("no trigger template for dialect {0:?}")]
    TemplateNotFound(String),

    /// A trigger template could not be rendered.
    #[error("failed to render trigger {trigger:?}: {message}")]
    Render {
        /// Trigger name.
        trigger: String,
        /// What went wrong.
        message: String,
    },

    /// Reading a model file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A model file is not valid JSON for a model set.
    #[error("invalid model file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for loading.
pub type Result<T> = std::result::Result<T, LoadError>;
