//! # trx-config
//!
//! Settings editor core for TRX game configuration files.
//!
//! Settings are grouped into categories described by a named schema. Each
//! property can be edited, reset to its factory default, or locked by an
//! enforced value coming from the game's gameflow document. The configuration
//! tracks whether it differs from disk and from defaults, and every property
//! can be found by a diacritic-insensitive text search.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use trx_config::{
//!     data::{Configuration, PropertyValue},
//!     lang::LanguageTable,
//!     schema::SchemaRegistry,
//! };
//!
//! let schemas = SchemaRegistry::load_dir("resources/schemas").unwrap();
//! let lang = Arc::new(LanguageTable::load("resources/lang/en.toml").unwrap());
//!
//! let mut config = Configuration::read("cfg/TR1X.json5", "tr1", &schemas, lang).unwrap();
//! config.set_value("fov_value", PropertyValue::Integer(80)).unwrap();
//! assert!(config.is_data_dirty());
//! config.write("cfg/TR1X.json5").unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Properties, categories and the configuration aggregate
//! - [`error`] - Error types and result definitions
//! - [`lang`] - Display text lookup
//! - [`schema`] - Named schemas and their registry
//! - [`search`] - Text normalization and property search
//! - [`session`] - Editing session and derived flags

#[macro_use]
extern crate log;

/// Properties, categories and the configuration aggregate.
pub mod data;

/// Error types and result definitions.
pub mod error;

/// Display text lookup.
pub mod lang;

/// Named schemas and their registry.
pub mod schema;

/// Text normalization and property search.
pub mod search;

/// Editing session and derived flags.
pub mod session;

pub use error::{ConfigError, Result};
pub use session::EditorSession;
