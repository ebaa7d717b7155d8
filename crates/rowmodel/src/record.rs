//! The entity instance.
//!
//! A [`Record`] pairs a shared [`Schema`] with an in-memory field buffer and
//! an optional identifier. The identifier drives the lifecycle: a record
//! without one is unpersisted and `save` INSERTs; once an identifier is
//! present (fetched, merged, or adopted from a generated key) `save` performs
//! UPDATEs. Property access goes through the name codec, honors the schema's
//! accessor overrides, and lazily materializes missing fields with a
//! single-field SELECT.
//!
//! Operations that cannot proceed for local reasons (unknown field, missing
//! identifier, criteria that filter to nothing) return `Ok(false)` or
//! `Ok(None)` rather than erroring, so callers branch on success; only
//! storage failures are `Err`.

use std::collections::HashMap;
use std::sync::Arc;

use rowmodel_core::naming::{to_property_name, to_storage_name};
use rowmodel_core::{Error, ExecOutcome, Overrides, Result, Schema, Value};
use rowmodel_query::{
    DeleteBuilder, FetchBuilder, InsertBuilder, UpdateFieldBuilder, UpdateRowBuilder, use_schema,
};
use tracing::debug;

use crate::config::SaveStrategy;
use crate::gateway::Gateway;
use crate::policy::DebugLevel;

/// How to address the row a [`Record::get`] call fetches.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Fetch by identifier value.
    Id(Value),
    /// Fetch by equality criteria on declared fields. Unknown keys are
    /// dropped before the statement is built.
    Criteria(Vec<(String, Value)>),
}

impl From<Value> for Query {
    fn from(id: Value) -> Self {
        Query::Id(id)
    }
}

impl From<Vec<(String, Value)>> for Query {
    fn from(criteria: Vec<(String, Value)>) -> Self {
        Query::Criteria(criteria)
    }
}

/// One entity instance bound to a table row (or about to be).
#[derive(Debug)]
pub struct Record {
    schema: Arc<Schema>,
    gateway: Arc<Gateway>,
    schema_name: Option<String>,
    values: HashMap<String, Value>,
    id: Option<Value>,
}

impl Record {
    /// Create an unbound record. The database name resolves from the entity
    /// declaration first, then the gateway's configured default.
    #[must_use]
    pub fn new(schema: Arc<Schema>, gateway: Arc<Gateway>) -> Self {
        let schema_name = schema
            .schema_name()
            .map(str::to_string)
            .or_else(|| gateway.config().schema.clone());
        Self {
            schema,
            gateway,
            schema_name,
            values: HashMap::new(),
            id: None,
        }
    }

    /// The entity schema this record was built from.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The database name statements run against, if any.
    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    /// The current identifier value.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Whether this record is backed by a stored row.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.as_ref().is_some_and(|v| !v.is_empty())
    }

    fn persisted_id(&self) -> Option<Value> {
        self.id.clone().filter(|v| !v.is_empty())
    }

    /// Fetch one row and merge it into this record.
    ///
    /// Returns `Ok(false)` when no row matches, when the id is empty, or
    /// when criteria filter down to nothing (no statement is issued in the
    /// latter two cases).
    pub fn get(&mut self, query: impl Into<Query>) -> Result<bool> {
        let fetch = FetchBuilder::new(&self.schema).schema_name(self.schema_name.clone());
        let stmt = match query.into() {
            Query::Id(id) => {
                if id.is_empty() {
                    return Ok(false);
                }
                fetch.by_id(&id)
            }
            Query::Criteria(criteria) => match fetch.by_criteria(&criteria) {
                Ok(stmt) => stmt,
                Err(Error::EmptyCriteria) => return Ok(false),
                Err(e) => return Err(e),
            },
        };
        match self.gateway.select_row(&stmt)? {
            Some(row) => {
                self.create(row.into_iter().collect());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Refetch this record's row by its current identifier.
    pub fn load(&mut self) -> Result<bool> {
        match self.persisted_id() {
            Some(id) => self.get(Query::Id(id)),
            None => Ok(false),
        }
    }

    /// Bulk-merge a data mapping into the field buffer.
    ///
    /// Only declared fields are taken; unknown keys drop silently. Setter
    /// overrides dispatch instead of the direct store. The first non-empty
    /// identifier-field value is adopted as the instance identifier; later
    /// ones do not overwrite it. Returns `false` for empty data or when
    /// declared required fields are still empty after the merge.
    pub fn create(&mut self, data: Vec<(String, Value)>) -> bool {
        if data.is_empty() {
            return false;
        }
        for (name, value) in data {
            if !self.schema.has_field(&name) {
                continue;
            }
            if name == self.schema.id_field()
                && !value.is_empty()
                && self.id.as_ref().is_none_or(Value::is_empty)
            {
                self.id = Some(value.clone());
            }
            if let Some(setter) = self.schema.overrides(&name).and_then(Overrides::setter) {
                setter(&mut self.values, value);
            } else {
                self.values.insert(name, value);
            }
        }
        self.schema
            .required()
            .iter()
            .all(|name| self.values.get(name).is_some_and(|v| !v.is_empty()))
    }

    /// Persist the record: per-field UPDATEs (or one multi-column UPDATE
    /// under [`SaveStrategy::SingleStatement`]) when an identifier is
    /// present, otherwise a single INSERT.
    ///
    /// A successful INSERT adopts the generated identifier as both instance
    /// id and identifier-field value; `Ok(false)` means the INSERT yielded
    /// none and the record stays unpersisted.
    pub fn save(&mut self) -> Result<bool> {
        let Some(id) = self.persisted_id() else {
            return self.insert();
        };
        match self.gateway.config().save_strategy {
            SaveStrategy::PerField => {
                let builder =
                    UpdateFieldBuilder::new(&self.schema).schema_name(self.schema_name.clone());
                for (name, _) in self.schema.fields() {
                    if name == self.schema.id_field() {
                        continue;
                    }
                    let Some(value) = self.values.get(name) else {
                        continue;
                    };
                    if let Some(saver) = self.schema.overrides(name).and_then(Overrides::saver) {
                        self.gateway.apply_saver(saver, value)?;
                        continue;
                    }
                    let stmt = match builder.build(name, value, Some(&id)) {
                        Ok(stmt) => stmt,
                        Err(Error::NoIdentifier | Error::UnknownField(_)) => continue,
                        Err(e) => return Err(e),
                    };
                    self.gateway.execute(&stmt)?;
                }
                Ok(true)
            }
            SaveStrategy::SingleStatement => {
                let builder =
                    UpdateRowBuilder::new(&self.schema).schema_name(self.schema_name.clone());
                match builder.build(&self.values, Some(&id)) {
                    Ok(stmt) => {
                        self.gateway.execute(&stmt)?;
                        Ok(true)
                    }
                    Err(Error::NoIdentifier | Error::EmptyCriteria) => Ok(false),
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn insert(&mut self) -> Result<bool> {
        let stmt = InsertBuilder::new(&self.schema)
            .schema_name(self.schema_name.clone())
            .build(&self.values);
        match self.gateway.execute(&stmt)? {
            ExecOutcome::Inserted(id) if !id.is_empty() => {
                self.values
                    .insert(self.schema.id_field().to_string(), id.clone());
                self.id = Some(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Write one field immediately.
    ///
    /// Returns `Ok(None)` without touching the backend when the record is
    /// unpersisted, the key is unknown, or the key is the identifier field
    /// with an empty value. An omitted `value` falls back to the
    /// materialized one.
    pub fn save_field(&mut self, name: &str, value: Option<Value>) -> Result<Option<u64>> {
        let storage = to_storage_name(name);
        if !self.schema.has_field(&storage) {
            return Ok(None);
        }
        let value = match value {
            Some(v) => v,
            None => self.values.get(&storage).cloned().unwrap_or(Value::Null),
        };
        if storage == self.schema.id_field() && value.is_empty() {
            return Ok(None);
        }
        let Some(id) = self.persisted_id() else {
            return Ok(None);
        };
        let builder = UpdateFieldBuilder::new(&self.schema).schema_name(self.schema_name.clone());
        let stmt = match builder.build(&storage, &value, Some(&id)) {
            Ok(stmt) => stmt,
            Err(Error::NoIdentifier | Error::UnknownField(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        match self.gateway.execute(&stmt)? {
            ExecOutcome::Affected(n) => {
                self.values.insert(storage, value);
                Ok(Some(n))
            }
            _ => Ok(None),
        }
    }

    /// Delete the stored row.
    ///
    /// `Ok(None)` on an unpersisted record, no statement issued. After a
    /// delete the identifier is cleared; the buffer stays in memory but the
    /// record is no longer storage-backed.
    pub fn delete(&mut self) -> Result<Option<u64>> {
        let builder = DeleteBuilder::new(&self.schema).schema_name(self.schema_name.clone());
        let stmt = match builder.build(self.id.as_ref()) {
            Ok(stmt) => stmt,
            Err(Error::NoIdentifier) => return Ok(None),
            Err(e) => return Err(e),
        };
        let outcome = self.gateway.execute(&stmt)?;
        self.id = None;
        match outcome {
            ExecOutcome::Affected(n) => Ok(Some(n)),
            _ => Ok(None),
        }
    }

    /// Dynamic property read.
    ///
    /// Materialized values win; a declared but unmaterialized field goes
    /// through its getter override (cached) or, on a persisted record, one
    /// single-field SELECT (cached on hit). Everything else — a declared
    /// field on an unpersisted record, an undeclared property with no getter
    /// override — reads as `Ok(None)` with a verbose-level notice, never
    /// fatal.
    pub fn prop(&mut self, name: &str) -> Result<Option<Value>> {
        let storage = to_storage_name(name);
        if let Some(v) = self.values.get(&storage) {
            return Ok(Some(v.clone()));
        }
        if self.schema.has_field(&storage) {
            if let Some(getter) = self.schema.overrides(&storage).and_then(Overrides::getter) {
                let v = getter(&self.values);
                self.values.insert(storage, v.clone());
                return Ok(Some(v));
            }
            let Some(id) = self.persisted_id() else {
                self.log_unresolved(name);
                return Ok(None);
            };
            let fetch = FetchBuilder::new(&self.schema).schema_name(self.schema_name.clone());
            let stmt = match fetch.field(&storage, &id) {
                Ok(stmt) => stmt,
                Err(Error::UnknownField(_)) => return Ok(None),
                Err(e) => return Err(e),
            };
            if let Some(v) = self.gateway.select_scalar(&stmt)? {
                self.values.insert(storage, v.clone());
                return Ok(Some(v));
            }
            return Ok(None);
        }
        if let Some(getter) = self.schema.overrides(&storage).and_then(Overrides::getter) {
            // Computed property outside the field table: never cached.
            return Ok(Some(getter(&self.values)));
        }
        self.log_unresolved(name);
        Ok(None)
    }

    fn log_unresolved(&self, name: &str) {
        if self.gateway.policy().level() == DebugLevel::Verbose {
            debug!(property = name, "unresolved property read");
        }
    }

    /// Dynamic property write. Unknown fields are a no-op; setter overrides
    /// dispatch instead of the direct store.
    pub fn set_prop(&mut self, name: &str, value: impl Into<Value>) {
        let storage = to_storage_name(name);
        if !self.schema.has_field(&storage) {
            return;
        }
        let value = value.into();
        if let Some(setter) = self.schema.overrides(&storage).and_then(Overrides::setter) {
            setter(&mut self.values, value);
        } else {
            self.values.insert(storage, value);
        }
    }

    /// Whether a property is materialized or has a getter override.
    #[must_use]
    pub fn has_prop(&self, name: &str) -> bool {
        let storage = to_storage_name(name);
        self.values.contains_key(&storage)
            || self
                .schema
                .overrides(&storage)
                .and_then(Overrides::getter)
                .is_some()
    }

    /// Evict a property from the in-memory buffer. Does not touch storage.
    pub fn unset_prop(&mut self, name: &str) {
        self.values.remove(&to_storage_name(name));
    }

    /// The raw storage-name value mapping.
    #[must_use]
    pub fn data(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// A property-name-keyed copy of the value mapping (identifier field
    /// included, lower-camel-case).
    #[must_use]
    pub fn data_by_property(&self) -> HashMap<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (to_property_name(k), v.clone()))
            .collect()
    }

    /// JSON projection of the storage-name value mapping.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.values)
    }

    /// Switch the database this instance's statements run against, after
    /// verifying it with the backend (`USE`).
    pub fn set_schema_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.gateway.execute(&use_schema(&name))?;
        self.schema_name = Some(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rowmodel_core::{Backend, EntityDef, FieldType};

    fn offline_gateway() -> Arc<Gateway> {
        // A connector that refuses; fine for paths that never hit storage.
        Arc::new(Gateway::new(
            Config::default(),
            |_dsn: &str| -> Option<Arc<dyn Backend>> { None },
        ))
    }

    fn hero_schema() -> Arc<Schema> {
        EntityDef::new("heroes")
            .field("id", FieldType::Integer)
            .plain("name")
            .field("secret_name", FieldType::NullableCast)
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_adopts_first_nonempty_identifier() {
        let mut record = Record::new(hero_schema(), offline_gateway());
        assert!(record.create(vec![
            ("id".to_string(), Value::Int(5)),
            ("name".to_string(), Value::from("Deadpond")),
            ("id".to_string(), Value::Int(9)),
        ]));
        assert_eq!(record.id(), Some(&Value::Int(5)));
        // The buffer still takes the later write; only the identity is fixed.
        assert_eq!(record.data().get("id"), Some(&Value::Int(9)));
        assert!(record.is_persisted());
    }

    #[test]
    fn test_create_rejects_empty_data_and_drops_unknown_keys() {
        let mut record = Record::new(hero_schema(), offline_gateway());
        assert!(!record.create(Vec::new()));
        assert!(record.create(vec![
            ("name".to_string(), Value::from("Rusty-Man")),
            ("power_level".to_string(), Value::Int(9)),
        ]));
        assert!(record.data().contains_key("name"));
        assert!(!record.data().contains_key("power_level"));
        assert!(!record.is_persisted());
    }

    #[test]
    fn test_create_checks_required_fields() {
        let schema = EntityDef::new("heroes")
            .field("id", FieldType::Integer)
            .plain("name")
            .required(&["name"])
            .build()
            .unwrap();
        let mut record = Record::new(schema, offline_gateway());
        assert!(!record.create(vec![("id".to_string(), Value::Int(1))]));
        assert!(record.create(vec![("name".to_string(), Value::from("Spider-Boy"))]));
    }

    #[test]
    fn test_set_prop_translates_names_and_ignores_unknown() {
        let mut record = Record::new(hero_schema(), offline_gateway());
        record.set_prop("secretName", "Dive Wilson");
        assert_eq!(
            record.data().get("secret_name"),
            Some(&Value::from("Dive Wilson"))
        );
        record.set_prop("powerLevel", 9);
        assert!(record.data().get("power_level").is_none());
    }

    #[test]
    fn test_setter_override_dispatch() {
        let schema = EntityDef::new("heroes")
            .field("id", FieldType::Integer)
            .plain("name")
            .on_set("name", |map, v| {
                map.insert("name".to_string(), Value::from(v.to_string().to_uppercase()));
            })
            .build()
            .unwrap();
        let mut record = Record::new(schema, offline_gateway());
        record.set_prop("name", "quiet");
        assert_eq!(record.data().get("name"), Some(&Value::from("QUIET")));
    }

    #[test]
    fn test_has_and_unset_prop() {
        let mut record = Record::new(hero_schema(), offline_gateway());
        assert!(!record.has_prop("name"));
        record.set_prop("name", "Deadpond");
        assert!(record.has_prop("name"));
        record.unset_prop("name");
        assert!(!record.has_prop("name"));
    }

    #[test]
    fn test_data_by_property_translates_keys() {
        let mut record = Record::new(hero_schema(), offline_gateway());
        record.set_prop("secretName", "Dive Wilson");
        let by_prop = record.data_by_property();
        assert_eq!(by_prop.get("secretName"), Some(&Value::from("Dive Wilson")));
        assert!(!by_prop.contains_key("secret_name"));
    }

    #[test]
    fn test_to_json() {
        let mut record = Record::new(hero_schema(), offline_gateway());
        record.set_prop("id", 3);
        let json = record.to_json().unwrap();
        assert_eq!(json, r#"{"id":3}"#);
    }

    #[test]
    fn test_schema_name_prefers_entity_declaration() {
        let schema = EntityDef::new("heroes")
            .schema_name("multiverse")
            .plain("id")
            .build()
            .unwrap();
        let gateway = Arc::new(Gateway::new(
            Config {
                schema: Some("main".to_string()),
                ..Config::default()
            },
            |_dsn: &str| -> Option<Arc<dyn Backend>> { None },
        ));
        let record = Record::new(schema, gateway.clone());
        assert_eq!(record.schema_name(), Some("multiverse"));

        let record = Record::new(hero_schema(), gateway);
        assert_eq!(record.schema_name(), Some("main"));
    }
}
