//! # oxide-ddl
//!
//! Computes the DDL a set of models migrates to, without a database.
//!
//! The models are migrated against a recording driver posing as the target
//! engine. Tables come first, then foreign key constraints (SQLite writes
//! them inline instead), then triggers. The recorded statements are
//! returned as one script.
//!
//! ```ignore
//! use oxide_ddl::Loader;
//! use oxide_orm::{DataType, FieldDef, ModelDef};
//!
//! let user = ModelDef::new("User")
//!     .with_base_fields()
//!     .field(FieldDef::new("name", DataType::String))
//!     .has_many("Pets", "Pet");
//! let pet = ModelDef::new("Pet")
//!     .with_base_fields()
//!     .field(FieldDef::new("user_id", DataType::Uint));
//!
//! let ddl = Loader::new("mysql").load(&[&user, &pet])?;
//! print!("{ddl}");
//! ```

pub mod engine;
pub mod error;
pub mod loader;
pub mod model_file;
pub mod trigger;

pub use engine::Engine;
pub use error::{LoadError, Result};
pub use loader::Loader;
pub use model_file::{JoinTableDecl, ModelFile};
