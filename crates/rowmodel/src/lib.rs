//! rowmodel — a lightweight record-to-table data mapper.
//!
//! A concrete entity type declares its table, fields, and identifier once
//! with [`EntityDef`]; a [`Record`] then transparently supports fetch-by-key,
//! fetch-by-criteria, insert, per-field update, and delete against any
//! [`Backend`] implementation, exposing fields as properties with lazy
//! materialization.
//!
//! # Role In The Architecture
//!
//! This is the facade crate: it re-exports the foundation layer
//! (`rowmodel-core`) and the statement builders (`rowmodel-query`) and adds
//! the pieces an application touches directly:
//!
//! - [`Record`] — the entity instance and its lifecycle state machine
//!   (unpersisted INSERT vs persisted UPDATE).
//! - [`Gateway`] — the lazily-connected, process-wide backend handle every
//!   statement funnels through.
//! - [`DebugPolicy`] / [`DebugLevel`] — the single escalation chokepoint for
//!   storage errors.
//! - [`Config`] — host-supplied DSN, default database, debug level, and
//!   save strategy.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rowmodel::prelude::*;
//!
//! let schema = EntityDef::new("heroes")
//!     .field("id", FieldType::Integer)
//!     .plain("name")
//!     .identifier("id")
//!     .build()?;
//!
//! # let connector = |_dsn: &str| -> Option<Arc<dyn rowmodel::Backend>> { None };
//! let gateway = Arc::new(Gateway::new(Config::default(), connector));
//! let mut hero = Record::new(schema, gateway);
//! hero.set_prop("name", "Deadpond");
//! assert_eq!(hero.data().get("name"), Some(&Value::from("Deadpond")));
//! # Ok::<(), rowmodel::Error>(())
//! ```

pub mod config;
pub mod gateway;
pub mod policy;
pub mod record;

pub use config::{Config, SaveStrategy};
pub use gateway::{Gateway, global_gateway, set_global_gateway};
pub use policy::{DebugLevel, DebugPolicy, FATAL_MESSAGE};
pub use record::{Query, Record};

pub use rowmodel_core::{
    Arg, Backend, BackendError, Connector, EntityDef, Error, ExecOutcome, FieldDecl, FieldMap,
    FieldType, Overrides, Placeholder, Result, Row, Schema, Statement, Value, naming, schema,
};
pub use rowmodel_query::{
    DeleteBuilder, FetchBuilder, InsertBuilder, UpdateFieldBuilder, UpdateRowBuilder,
};

/// Everything an application typically imports.
pub mod prelude {
    pub use crate::config::{Config, SaveStrategy};
    pub use crate::gateway::Gateway;
    pub use crate::policy::{DebugLevel, DebugPolicy};
    pub use crate::record::{Query, Record};
    pub use rowmodel_core::{EntityDef, FieldType, Row, Value};
}
