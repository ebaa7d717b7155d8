//! Core types and contracts for rowmodel.
//!
//! `rowmodel-core` is the foundation layer for the rowmodel workspace. It
//! defines the data types and traits the query and facade crates build on.
//!
//! # Role In The Architecture
//!
//! - **Data model**: [`Value`] and [`Row`] represent statement inputs and
//!   query outputs shared across all crates.
//! - **Type map**: [`FieldType`] and [`Placeholder`] connect a field's
//!   declared semantic type to the storage-layer placeholder directive used
//!   when statements are built.
//! - **Naming**: [`naming`] converts between property-style names
//!   (`runStopTime`) and storage-style column names (`run_stop_time`).
//! - **Schema**: [`EntityDef`] and [`Schema`] normalize an entity type's
//!   field declarations once into an immutable, shareable form.
//! - **Contract layer**: [`Backend`] and [`Connector`] are the traits a
//!   storage-execution library implements; [`Statement`] and [`Arg`] are the
//!   units it consumes.
//!
//! Most applications should use the `rowmodel` facade; reach for
//! `rowmodel-core` directly when implementing a backend.

pub mod backend;
pub mod error;
pub mod naming;
pub mod row;
pub mod schema;
pub mod statement;
pub mod types;
pub mod value;

pub use backend::{Backend, BackendError, Connector, ExecOutcome};
pub use error::{Error, Result};
pub use row::Row;
pub use schema::{EntityDef, FieldDecl, FieldMap, Overrides, Schema};
pub use statement::{Arg, Statement};
pub use types::{FieldType, Placeholder};
pub use value::Value;
