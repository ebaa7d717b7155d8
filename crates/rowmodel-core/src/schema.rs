//! Entity declarations and their normalized schema.
//!
//! A concrete entity type is declared once with an [`EntityDef`] builder and
//! normalized into an immutable [`Schema`] that every [`Record`] of that type
//! shares. Normalization accepts heterogeneous declaration shapes — plain
//! names (defaulting to `String`) mixed with name+type pairs — and resolves
//! accessor overrides into a static capability table, so no runtime probing
//! happens on the hot paths.
//!
//! Build a schema once per entity type and share the `Arc`; [`cached`] does
//! the memoization for callers that prefer a registry.
//!
//! [`Record`]: ../../rowmodel/record/struct.Record.html

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::backend::{Backend, BackendError, ExecOutcome};
use crate::error::{Error, Result};
use crate::naming::to_storage_name;
use crate::types::FieldType;
use crate::value::Value;

/// The in-memory field buffer accessor overrides operate on.
pub type FieldMap = HashMap<String, Value>;

/// A custom getter override: computes a value from the materialized buffer.
pub type GetterFn = Box<dyn Fn(&FieldMap) -> Value + Send + Sync>;

/// A custom setter override: writes into the buffer instead of the default
/// direct store.
pub type SetterFn = Box<dyn Fn(&mut FieldMap, Value) + Send + Sync>;

/// A custom per-field persistence override, invoked by `save` instead of the
/// default single-field UPDATE.
pub type SaverFn =
    Box<dyn Fn(&dyn Backend, &Value) -> std::result::Result<ExecOutcome, BackendError> + Send + Sync>;

/// Accessor overrides for one property, resolved at schema build time.
#[derive(Default)]
pub struct Overrides {
    getter: Option<GetterFn>,
    setter: Option<SetterFn>,
    saver: Option<SaverFn>,
}

impl Overrides {
    /// The getter override, if declared.
    #[must_use]
    pub fn getter(&self) -> Option<&GetterFn> {
        self.getter.as_ref()
    }

    /// The setter override, if declared.
    #[must_use]
    pub fn setter(&self) -> Option<&SetterFn> {
        self.setter.as_ref()
    }

    /// The saver override, if declared.
    #[must_use]
    pub fn saver(&self) -> Option<&SaverFn> {
        self.saver.as_ref()
    }
}

impl std::fmt::Debug for Overrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overrides")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("saver", &self.saver.is_some())
            .finish()
    }
}

/// One raw field declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDecl {
    /// A plain name; the type defaults to `String`. If the name is already
    /// declared, the entry is treated as an alias and dropped.
    Plain(String),
    /// A name with an explicit type.
    Typed(String, FieldType),
}

/// Builder for an entity type declaration.
///
/// # Example
///
/// ```
/// use rowmodel_core::{EntityDef, FieldType};
///
/// let schema = EntityDef::new("runs")
///     .field("id", FieldType::Integer)
///     .field("name", FieldType::String)
///     .plain("comment")
///     .identifier("id")
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.id_field(), "id");
/// assert_eq!(schema.field_type("comment"), Some(FieldType::String));
/// ```
pub struct EntityDef {
    table: String,
    schema_name: Option<String>,
    decls: Vec<FieldDecl>,
    identifier: Option<String>,
    required: Vec<String>,
    overrides: HashMap<String, Overrides>,
}

impl EntityDef {
    /// Start a declaration for the given table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema_name: None,
            decls: Vec::new(),
            identifier: None,
            required: Vec::new(),
            overrides: HashMap::new(),
        }
    }

    /// Set the database/schema name this entity's table lives in.
    #[must_use]
    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = Some(name.into());
        self
    }

    /// Declare a field with an explicit type.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.decls.push(FieldDecl::Typed(name.into(), ty));
        self
    }

    /// Declare a plain field (type defaults to `String`).
    #[must_use]
    pub fn plain(mut self, name: impl Into<String>) -> Self {
        self.decls.push(FieldDecl::Plain(name.into()));
        self
    }

    /// Append a raw declaration.
    #[must_use]
    pub fn decl(mut self, decl: FieldDecl) -> Self {
        self.decls.push(decl);
        self
    }

    /// Explicitly mark the identifier field. Preferred over the positional
    /// fallback (first declared field).
    #[must_use]
    pub fn identifier(mut self, name: impl Into<String>) -> Self {
        self.identifier = Some(name.into());
        self
    }

    /// Declare fields that must hold a non-empty value before an INSERT.
    #[must_use]
    pub fn required(mut self, names: &[&str]) -> Self {
        self.required
            .extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    /// Register a getter override for a property.
    #[must_use]
    pub fn on_get(
        mut self,
        property: &str,
        f: impl Fn(&FieldMap) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.overrides
            .entry(to_storage_name(property))
            .or_default()
            .getter = Some(Box::new(f));
        self
    }

    /// Register a setter override for a property.
    #[must_use]
    pub fn on_set(
        mut self,
        property: &str,
        f: impl Fn(&mut FieldMap, Value) + Send + Sync + 'static,
    ) -> Self {
        self.overrides
            .entry(to_storage_name(property))
            .or_default()
            .setter = Some(Box::new(f));
        self
    }

    /// Register a per-field persistence override for a property.
    #[must_use]
    pub fn on_save(
        mut self,
        property: &str,
        f: impl Fn(&dyn Backend, &Value) -> std::result::Result<ExecOutcome, BackendError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.overrides
            .entry(to_storage_name(property))
            .or_default()
            .saver = Some(Box::new(f));
        self
    }

    /// Normalize into an immutable, shareable schema.
    ///
    /// Fails with [`Error::Schema`] if the table name is empty, the field
    /// table ends up empty, or an explicit identifier names an undeclared
    /// field. These are construction-time errors and are never downgraded.
    pub fn build(self) -> Result<Arc<Schema>> {
        if self.table.is_empty() {
            return Err(Error::Schema("entity has no table name".to_string()));
        }

        let mut fields: Vec<(String, FieldType)> = Vec::with_capacity(self.decls.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(self.decls.len());
        for decl in self.decls {
            match decl {
                FieldDecl::Plain(name) => {
                    // Alias entry: a plain name that is already declared.
                    if !index.contains_key(&name) {
                        index.insert(name.clone(), fields.len());
                        fields.push((name, FieldType::String));
                    }
                }
                FieldDecl::Typed(name, ty) => {
                    if let Some(&i) = index.get(&name) {
                        fields[i].1 = ty;
                    } else {
                        index.insert(name.clone(), fields.len());
                        fields.push((name, ty));
                    }
                }
            }
        }

        if fields.is_empty() {
            return Err(Error::Schema(format!(
                "entity for table {} declares no fields",
                self.table
            )));
        }

        let id_field = match self.identifier {
            Some(name) => {
                if !index.contains_key(&name) {
                    return Err(Error::Schema(format!(
                        "identifier field {name} is not declared for table {}",
                        self.table
                    )));
                }
                name
            }
            None => fields[0].0.clone(),
        };

        Ok(Arc::new(Schema {
            table: self.table,
            schema_name: self.schema_name,
            fields,
            index,
            id_field,
            required: self.required,
            overrides: self.overrides,
        }))
    }
}

/// The normalized, immutable declaration of one entity type.
#[derive(Debug)]
pub struct Schema {
    table: String,
    schema_name: Option<String>,
    fields: Vec<(String, FieldType)>,
    index: HashMap<String, usize>,
    id_field: String,
    required: Vec<String>,
    overrides: HashMap<String, Overrides>,
}

impl Schema {
    /// The table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The database/schema name declared for this entity, if any.
    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    /// Field table in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Whether `name` is a declared field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The declared type of a field.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.index.get(name).map(|&i| self.fields[i].1)
    }

    /// The identifier field name.
    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// The identifier field's declared type.
    #[must_use]
    pub fn id_type(&self) -> FieldType {
        self.field_type(&self.id_field).unwrap_or_default()
    }

    /// Fields that must be non-empty before an INSERT.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Accessor overrides for a storage name, if any were declared.
    ///
    /// Overrides may exist for names outside the field table (computed
    /// properties).
    #[must_use]
    pub fn overrides(&self, storage_name: &str) -> Option<&Overrides> {
        self.overrides.get(storage_name)
    }
}

static CACHE: OnceLock<Mutex<HashMap<String, Arc<Schema>>>> = OnceLock::new();

/// Build-once schema cache keyed by entity type name.
///
/// The first call for a key runs `init` and stores the result; later calls
/// return the shared schema without re-deriving it. Construction errors are
/// not cached.
pub fn cached(key: &str, init: impl FnOnce() -> EntityDef) -> Result<Arc<Schema>> {
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(schema) = guard.get(key) {
        return Ok(schema.clone());
    }
    let schema = init().build()?;
    tracing::debug!(entity = key, table = schema.table(), "normalized entity schema");
    guard.insert(key.to_string(), schema.clone());
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_list_equals_all_string_map() {
        let plain = EntityDef::new("t")
            .plain("id")
            .plain("name")
            .plain("comment")
            .build()
            .unwrap();
        let typed = EntityDef::new("t")
            .field("id", FieldType::String)
            .field("name", FieldType::String)
            .field("comment", FieldType::String)
            .build()
            .unwrap();
        assert_eq!(plain.fields(), typed.fields());
        assert_eq!(plain.id_field(), typed.id_field());
    }

    #[test]
    fn test_alias_entries_are_dropped() {
        let schema = EntityDef::new("t")
            .field("id", FieldType::Integer)
            .plain("id")
            .plain("name")
            .build()
            .unwrap();
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field_type("id"), Some(FieldType::Integer));
    }

    #[test]
    fn test_identifier_defaults_to_first_field() {
        let schema = EntityDef::new("t")
            .field("uid", FieldType::Integer)
            .plain("name")
            .build()
            .unwrap();
        assert_eq!(schema.id_field(), "uid");
        assert_eq!(schema.id_type(), FieldType::Integer);
    }

    #[test]
    fn test_explicit_identifier_wins() {
        let schema = EntityDef::new("t")
            .plain("name")
            .field("id", FieldType::Integer)
            .identifier("id")
            .build()
            .unwrap();
        assert_eq!(schema.id_field(), "id");
    }

    #[test]
    fn test_explicit_identifier_must_be_declared() {
        let err = EntityDef::new("t")
            .plain("name")
            .identifier("missing")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_empty_fields_fail() {
        let err = EntityDef::new("t").build().unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_empty_table_name_fails() {
        let err = EntityDef::new("").plain("id").build().unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_overrides_keyed_by_storage_name() {
        let schema = EntityDef::new("t")
            .field("run_stop_time", FieldType::Integer)
            .on_set("runStopTime", |map, v| {
                map.insert("run_stop_time".to_string(), v);
            })
            .build()
            .unwrap();
        let ov = schema.overrides("run_stop_time").unwrap();
        assert!(ov.setter().is_some());
        assert!(ov.getter().is_none());
    }

    #[test]
    fn test_cached_returns_shared_schema() {
        let a = cached("schema-test-entity", || {
            EntityDef::new("cache_t").plain("id")
        })
        .unwrap();
        let b = cached("schema-test-entity", || {
            // Would fail if re-derived; must come from the cache.
            EntityDef::new("")
        })
        .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
