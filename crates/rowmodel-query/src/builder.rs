//! Per-intent statement builders.
//!
//! Every builder is constructed from a shared [`Schema`] and inherits the
//! schema's database name; a per-builder [`schema_name`] override lets one
//! record address a table in a different database without touching the shared
//! declaration. When no database name is in effect the `?#.` prefix is
//! omitted entirely and the table resolves against the connection's current
//! database.
//!
//! [`schema_name`]: FetchBuilder::schema_name

use std::collections::HashMap;

use rowmodel_core::types::Placeholder;
use rowmodel_core::{Arg, Error, Result, Schema, Statement, Value};
use tracing::trace;

/// Append a table reference (`?#.?#` or bare `?#`) to a template.
fn push_table(sql: &mut String, args: &mut Vec<Arg>, schema_name: Option<&str>, table: &str) {
    if let Some(db) = schema_name {
        sql.push_str("?#.?#");
        args.push(Arg::Ident(db.to_string()));
    } else {
        sql.push_str("?#");
    }
    args.push(Arg::Ident(table.to_string()));
}

/// Builder for row and single-field SELECTs.
///
/// # Example
///
/// ```
/// use rowmodel_core::{EntityDef, FieldType, Value};
/// use rowmodel_query::FetchBuilder;
///
/// let schema = EntityDef::new("runs")
///     .field("id", FieldType::Integer)
///     .plain("name")
///     .build()
///     .unwrap();
///
/// let stmt = FetchBuilder::new(&schema).by_id(&Value::Int(7));
/// assert_eq!(stmt.sql, "SELECT ?# FROM ?# WHERE ?# = ?d LIMIT 1");
/// ```
#[derive(Debug)]
pub struct FetchBuilder<'a> {
    schema: &'a Schema,
    schema_name: Option<String>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a fetch builder for the given schema.
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            schema_name: schema.schema_name().map(str::to_string),
        }
    }

    /// Override the database name for this builder.
    #[must_use]
    pub fn schema_name(mut self, name: Option<String>) -> Self {
        self.schema_name = name;
        self
    }

    /// Build a fetch of one full row by identifier.
    #[must_use]
    pub fn by_id(&self, id: &Value) -> Statement {
        let id_marker = Placeholder::for_field(self.schema.id_type()).marker();
        let mut sql = String::from("SELECT ?# FROM ");
        let mut args = vec![Arg::IdentList(
            self.schema.field_names().map(str::to_string).collect(),
        )];
        push_table(&mut sql, &mut args, self.schema_name.as_deref(), self.schema.table());
        sql.push_str(" WHERE ?# = ");
        sql.push_str(id_marker);
        sql.push_str(" LIMIT 1");
        args.push(Arg::Ident(self.schema.id_field().to_string()));
        args.push(Arg::Value(id.clone()));
        let stmt = Statement::new(sql, args);
        trace!(statement = %stmt, "built fetch-by-id");
        stmt
    }

    /// Build a fetch of one full row by equality criteria.
    ///
    /// Criteria entries naming undeclared fields are silently dropped. Fails
    /// with [`Error::EmptyCriteria`] when nothing usable remains, so no
    /// unfiltered statement can ever reach the backend.
    pub fn by_criteria(&self, criteria: &[(String, Value)]) -> Result<Statement> {
        let known: Vec<&(String, Value)> = criteria
            .iter()
            .filter(|(name, _)| self.schema.has_field(name))
            .collect();
        if known.is_empty() {
            return Err(Error::EmptyCriteria);
        }

        let mut sql = String::from("SELECT ?# FROM ");
        let mut args = vec![Arg::IdentList(
            self.schema.field_names().map(str::to_string).collect(),
        )];
        push_table(&mut sql, &mut args, self.schema_name.as_deref(), self.schema.table());
        sql.push_str(" WHERE (?#) = (?a) LIMIT 1");
        args.push(Arg::IdentList(
            known.iter().map(|(name, _)| name.clone()).collect(),
        ));
        args.push(Arg::List(known.iter().map(|(_, v)| v.clone()).collect()));
        let stmt = Statement::new(sql, args);
        trace!(statement = %stmt, "built fetch-by-criteria");
        Ok(stmt)
    }

    /// Build a single-column fetch for lazy field materialization.
    pub fn field(&self, field: &str, id: &Value) -> Result<Statement> {
        if !self.schema.has_field(field) {
            return Err(Error::UnknownField(field.to_string()));
        }
        let id_marker = Placeholder::for_field(self.schema.id_type()).marker();
        let mut sql = String::from("SELECT ?# FROM ");
        let mut args = vec![Arg::Ident(field.to_string())];
        push_table(&mut sql, &mut args, self.schema_name.as_deref(), self.schema.table());
        sql.push_str(" WHERE ?# = ");
        sql.push_str(id_marker);
        sql.push_str(" LIMIT 1");
        args.push(Arg::Ident(self.schema.id_field().to_string()));
        args.push(Arg::Value(id.clone()));
        Ok(Statement::new(sql, args))
    }
}

/// Builder for INSERTs.
///
/// Emits the buffered fields in declaration order; fields absent from the
/// buffer are left out entirely so database column defaults apply. An empty
/// identifier value is forced to NULL so auto-generated keys take effect.
#[derive(Debug)]
pub struct InsertBuilder<'a> {
    schema: &'a Schema,
    schema_name: Option<String>,
}

impl<'a> InsertBuilder<'a> {
    /// Create an insert builder for the given schema.
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            schema_name: schema.schema_name().map(str::to_string),
        }
    }

    /// Override the database name for this builder.
    #[must_use]
    pub fn schema_name(mut self, name: Option<String>) -> Self {
        self.schema_name = name;
        self
    }

    /// Build the INSERT from the record's current field buffer.
    #[must_use]
    pub fn build(&self, values: &HashMap<String, Value>) -> Statement {
        let id_field = self.schema.id_field();
        let mut columns = Vec::with_capacity(values.len());
        let mut bound = Vec::with_capacity(values.len());
        for name in self.schema.field_names() {
            let Some(value) = values.get(name) else {
                continue;
            };
            let value = if name == id_field && value.is_empty() {
                Value::Null
            } else {
                value.clone()
            };
            columns.push(name.to_string());
            bound.push(value);
        }

        let mut sql = String::from("INSERT INTO ");
        let mut args = Vec::with_capacity(4);
        push_table(&mut sql, &mut args, self.schema_name.as_deref(), self.schema.table());
        sql.push_str("(?#) VALUES(?a)");
        args.push(Arg::IdentList(columns));
        args.push(Arg::List(bound));
        let stmt = Statement::new(sql, args);
        trace!(statement = %stmt, "built insert");
        stmt
    }
}

/// Builder for single-field UPDATEs, the default write strategy.
#[derive(Debug)]
pub struct UpdateFieldBuilder<'a> {
    schema: &'a Schema,
    schema_name: Option<String>,
}

impl<'a> UpdateFieldBuilder<'a> {
    /// Create a field-update builder for the given schema.
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            schema_name: schema.schema_name().map(str::to_string),
        }
    }

    /// Override the database name for this builder.
    #[must_use]
    pub fn schema_name(mut self, name: Option<String>) -> Self {
        self.schema_name = name;
        self
    }

    /// Build an UPDATE of one field on the row identified by `id`.
    ///
    /// The SET marker is the field's typed placeholder, so integer fields
    /// bind `?d`, floats `?f`, and nullable-cast fields `?n`.
    pub fn build(&self, field: &str, value: &Value, id: Option<&Value>) -> Result<Statement> {
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(Error::NoIdentifier),
        };
        let Some(field_type) = self.schema.field_type(field) else {
            return Err(Error::UnknownField(field.to_string()));
        };
        let field_marker = Placeholder::for_field(field_type).marker();
        let id_marker = Placeholder::for_field(self.schema.id_type()).marker();

        let mut sql = String::from("UPDATE ");
        let mut args = Vec::with_capacity(6);
        push_table(&mut sql, &mut args, self.schema_name.as_deref(), self.schema.table());
        sql.push_str(" SET ?# = ");
        sql.push_str(field_marker);
        sql.push_str(" WHERE ?# = ");
        sql.push_str(id_marker);
        sql.push_str(" LIMIT 1");
        args.push(Arg::Ident(field.to_string()));
        args.push(Arg::Value(value.clone()));
        args.push(Arg::Ident(self.schema.id_field().to_string()));
        args.push(Arg::Value(id.clone()));
        let stmt = Statement::new(sql, args);
        trace!(statement = %stmt, "built field update");
        Ok(stmt)
    }
}

/// Builder for whole-row UPDATEs, the single-statement write strategy.
///
/// Writes every non-identifier field present in the buffer in one statement.
#[derive(Debug)]
pub struct UpdateRowBuilder<'a> {
    schema: &'a Schema,
    schema_name: Option<String>,
}

impl<'a> UpdateRowBuilder<'a> {
    /// Create a row-update builder for the given schema.
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            schema_name: schema.schema_name().map(str::to_string),
        }
    }

    /// Override the database name for this builder.
    #[must_use]
    pub fn schema_name(mut self, name: Option<String>) -> Self {
        self.schema_name = name;
        self
    }

    /// Build an UPDATE of all buffered non-identifier fields.
    pub fn build(&self, values: &HashMap<String, Value>, id: Option<&Value>) -> Result<Statement> {
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(Error::NoIdentifier),
        };
        let id_field = self.schema.id_field();
        let assignments: Vec<(String, Value)> = self
            .schema
            .field_names()
            .filter(|name| *name != id_field)
            .filter_map(|name| values.get(name).map(|v| (name.to_string(), v.clone())))
            .collect();
        if assignments.is_empty() {
            return Err(Error::EmptyCriteria);
        }
        let id_marker = Placeholder::for_field(self.schema.id_type()).marker();

        let mut sql = String::from("UPDATE ");
        let mut args = Vec::with_capacity(5);
        push_table(&mut sql, &mut args, self.schema_name.as_deref(), self.schema.table());
        sql.push_str(" SET ?a WHERE ?# = ");
        sql.push_str(id_marker);
        sql.push_str(" LIMIT 1");
        args.push(Arg::Assoc(assignments));
        args.push(Arg::Ident(id_field.to_string()));
        args.push(Arg::Value(id.clone()));
        let stmt = Statement::new(sql, args);
        trace!(statement = %stmt, "built row update");
        Ok(stmt)
    }
}

/// Builder for single-row DELETEs.
#[derive(Debug)]
pub struct DeleteBuilder<'a> {
    schema: &'a Schema,
    schema_name: Option<String>,
}

impl<'a> DeleteBuilder<'a> {
    /// Create a delete builder for the given schema.
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            schema_name: schema.schema_name().map(str::to_string),
        }
    }

    /// Override the database name for this builder.
    #[must_use]
    pub fn schema_name(mut self, name: Option<String>) -> Self {
        self.schema_name = name;
        self
    }

    /// Build a DELETE of the row identified by `id`.
    pub fn build(&self, id: Option<&Value>) -> Result<Statement> {
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(Error::NoIdentifier),
        };
        let id_marker = Placeholder::for_field(self.schema.id_type()).marker();

        let mut sql = String::from("DELETE FROM ");
        let mut args = Vec::with_capacity(4);
        push_table(&mut sql, &mut args, self.schema_name.as_deref(), self.schema.table());
        sql.push_str(" WHERE ?# = ");
        sql.push_str(id_marker);
        sql.push_str(" LIMIT 1");
        args.push(Arg::Ident(self.schema.id_field().to_string()));
        args.push(Arg::Value(id.clone()));
        let stmt = Statement::new(sql, args);
        trace!(statement = %stmt, "built delete");
        Ok(stmt)
    }
}

/// Build a `USE` statement switching the connection's current database.
#[must_use]
pub fn use_schema(name: &str) -> Statement {
    Statement::new("USE ?#", vec![Arg::Ident(name.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmodel_core::{EntityDef, FieldType};
    use std::sync::Arc;

    fn run_schema() -> Arc<Schema> {
        EntityDef::new("runs")
            .field("id", FieldType::Integer)
            .plain("name")
            .field("duration", FieldType::Float)
            .field("comment", FieldType::NullableCast)
            .build()
            .unwrap()
    }

    #[test]
    fn test_fetch_by_id_uses_id_marker() {
        let schema = run_schema();
        let stmt = FetchBuilder::new(&schema).by_id(&Value::Int(7));
        assert_eq!(stmt.sql, "SELECT ?# FROM ?# WHERE ?# = ?d LIMIT 1");
        assert_eq!(
            stmt.args[0],
            Arg::IdentList(vec![
                "id".to_string(),
                "name".to_string(),
                "duration".to_string(),
                "comment".to_string(),
            ])
        );
        assert_eq!(stmt.args[1], Arg::Ident("runs".to_string()));
        assert_eq!(stmt.args[3], Arg::Value(Value::Int(7)));
    }

    #[test]
    fn test_schema_name_adds_qualified_table() {
        let schema = run_schema();
        let stmt = FetchBuilder::new(&schema)
            .schema_name(Some("analytics".to_string()))
            .by_id(&Value::Int(1));
        assert_eq!(stmt.sql, "SELECT ?# FROM ?#.?# WHERE ?# = ?d LIMIT 1");
        assert_eq!(stmt.args[1], Arg::Ident("analytics".to_string()));
        assert_eq!(stmt.args[2], Arg::Ident("runs".to_string()));
    }

    #[test]
    fn test_fetch_by_criteria_drops_unknown_keys() {
        let schema = run_schema();
        let stmt = FetchBuilder::new(&schema)
            .by_criteria(&[
                ("name".to_string(), Value::from("alpha")),
                ("bogus".to_string(), Value::Int(1)),
            ])
            .unwrap();
        assert_eq!(stmt.sql, "SELECT ?# FROM ?# WHERE (?#) = (?a) LIMIT 1");
        assert_eq!(stmt.args[2], Arg::IdentList(vec!["name".to_string()]));
        assert_eq!(stmt.args[3], Arg::List(vec![Value::from("alpha")]));
    }

    #[test]
    fn test_fetch_by_all_unknown_criteria_fails() {
        let schema = run_schema();
        let err = FetchBuilder::new(&schema)
            .by_criteria(&[("bogus".to_string(), Value::Int(1))])
            .unwrap_err();
        assert_eq!(err, Error::EmptyCriteria);
    }

    #[test]
    fn test_single_field_fetch() {
        let schema = run_schema();
        let stmt = FetchBuilder::new(&schema)
            .field("comment", &Value::Int(9))
            .unwrap();
        assert_eq!(stmt.sql, "SELECT ?# FROM ?# WHERE ?# = ?d LIMIT 1");
        assert_eq!(stmt.args[0], Arg::Ident("comment".to_string()));

        let err = FetchBuilder::new(&schema)
            .field("bogus", &Value::Int(9))
            .unwrap_err();
        assert_eq!(err, Error::UnknownField("bogus".to_string()));
    }

    #[test]
    fn test_insert_forces_empty_identifier_to_null() {
        let schema = run_schema();
        let mut values = HashMap::new();
        values.insert("id".to_string(), Value::Int(0));
        values.insert("name".to_string(), Value::from("alpha"));
        let stmt = InsertBuilder::new(&schema).build(&values);
        assert_eq!(stmt.sql, "INSERT INTO ?#(?#) VALUES(?a)");
        assert_eq!(
            stmt.args[1],
            Arg::IdentList(vec!["id".to_string(), "name".to_string()])
        );
        assert_eq!(
            stmt.args[2],
            Arg::List(vec![Value::Null, Value::from("alpha")])
        );
    }

    #[test]
    fn test_insert_omits_absent_fields_for_database_defaults() {
        let schema = run_schema();
        let mut values = HashMap::new();
        values.insert("name".to_string(), Value::from("alpha"));
        let stmt = InsertBuilder::new(&schema).build(&values);
        // Unbuffered columns (id, duration, comment) stay out of the
        // statement so the database applies its own defaults.
        assert_eq!(stmt.args[1], Arg::IdentList(vec!["name".to_string()]));
        assert_eq!(stmt.args[2], Arg::List(vec![Value::from("alpha")]));
    }

    #[test]
    fn test_insert_keeps_explicit_identifier() {
        let schema = run_schema();
        let mut values = HashMap::new();
        values.insert("id".to_string(), Value::Int(42));
        let stmt = InsertBuilder::new(&schema).build(&values);
        let Arg::List(bound) = &stmt.args[2] else {
            panic!("expected value list");
        };
        assert_eq!(bound[0], Value::Int(42));
    }

    #[test]
    fn test_update_field_markers_follow_types() {
        let schema = run_schema();
        let builder = UpdateFieldBuilder::new(&schema);
        let id = Value::Int(5);

        let stmt = builder
            .build("name", &Value::from("beta"), Some(&id))
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE ?# SET ?# = ? WHERE ?# = ?d LIMIT 1");

        let stmt = builder
            .build("duration", &Value::Float(1.5), Some(&id))
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE ?# SET ?# = ?f WHERE ?# = ?d LIMIT 1");

        let stmt = builder
            .build("comment", &Value::from(""), Some(&id))
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE ?# SET ?# = ?n WHERE ?# = ?d LIMIT 1");
    }

    #[test]
    fn test_update_field_requires_identifier_and_known_field() {
        let schema = run_schema();
        let builder = UpdateFieldBuilder::new(&schema);

        let err = builder.build("name", &Value::Null, None).unwrap_err();
        assert_eq!(err, Error::NoIdentifier);

        // An empty identifier is as useless as a missing one.
        let err = builder
            .build("name", &Value::Null, Some(&Value::Int(0)))
            .unwrap_err();
        assert_eq!(err, Error::NoIdentifier);

        let err = builder
            .build("bogus", &Value::Null, Some(&Value::Int(3)))
            .unwrap_err();
        assert_eq!(err, Error::UnknownField("bogus".to_string()));
    }

    #[test]
    fn test_update_row_excludes_identifier() {
        let schema = run_schema();
        let mut values = HashMap::new();
        values.insert("id".to_string(), Value::Int(5));
        values.insert("name".to_string(), Value::from("beta"));
        values.insert("duration".to_string(), Value::Float(2.0));
        let stmt = UpdateRowBuilder::new(&schema)
            .build(&values, Some(&Value::Int(5)))
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE ?# SET ?a WHERE ?# = ?d LIMIT 1");
        assert_eq!(
            stmt.args[1],
            Arg::Assoc(vec![
                ("name".to_string(), Value::from("beta")),
                ("duration".to_string(), Value::Float(2.0)),
            ])
        );
    }

    #[test]
    fn test_delete_requires_identifier() {
        let schema = run_schema();
        let stmt = DeleteBuilder::new(&schema)
            .build(Some(&Value::Int(3)))
            .unwrap();
        assert_eq!(stmt.sql, "DELETE FROM ?# WHERE ?# = ?d LIMIT 1");

        let err = DeleteBuilder::new(&schema).build(None).unwrap_err();
        assert_eq!(err, Error::NoIdentifier);
    }

    #[test]
    fn test_use_schema() {
        let stmt = use_schema("analytics");
        assert_eq!(stmt.sql, "USE ?#");
        assert_eq!(stmt.args, vec![Arg::Ident("analytics".to_string())]);
    }
}
