//! Statement builders for the rowmodel data mapper.
//!
//! # Role In The Architecture
//!
//! This crate is the translation layer between an entity's [`Schema`] and the
//! typed-placeholder [`Statement`]s the backend executes. Each persistence
//! intent gets its own builder: [`FetchBuilder`] for row and single-field
//! reads, [`InsertBuilder`] for creation, [`UpdateFieldBuilder`] and
//! [`UpdateRowBuilder`] for the two write strategies, and [`DeleteBuilder`]
//! for removal. The builders own all template construction so the record
//! layer above never concatenates SQL, and the backend below only ever sees
//! marker-typed templates.
//!
//! Builders validate locally — unknown fields, empty criteria, and missing
//! identifiers are caught here before any statement reaches a backend.
//!
//! [`Schema`]: rowmodel_core::Schema
//! [`Statement`]: rowmodel_core::Statement

pub mod builder;

pub use builder::{
    DeleteBuilder, FetchBuilder, InsertBuilder, UpdateFieldBuilder, UpdateRowBuilder, use_schema,
};
