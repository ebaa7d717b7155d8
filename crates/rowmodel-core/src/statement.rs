//! Parameterized statements and their typed arguments.

use crate::value::Value;

/// One positional argument bound to a placeholder marker in a statement
/// template. The variant must match the marker kind: scalars for value
/// markers, lists for `?a`, identifiers for `?#`.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A scalar bound to `?`, `?d`, `?f`, or `?n`.
    Value(Value),
    /// A positional value list bound to `?a` (insert tuples, `IN` lists).
    List(Vec<Value>),
    /// A keyed value list bound to `?a` in SET position
    /// (`col = val, col = val, ...`).
    Assoc(Vec<(String, Value)>),
    /// A single table/column identifier bound to `?#`.
    Ident(String),
    /// A list of identifiers bound to `?#` (select lists, key tuples).
    IdentList(Vec<String>),
}

/// A statement template plus its positional arguments.
///
/// The template carries typed placeholder markers; quoting and escaping per
/// marker kind is the backend's responsibility.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The statement template with placeholder markers.
    pub sql: String,
    /// Arguments in marker order.
    pub args: Vec<Arg>,
}

impl Statement {
    /// Create a statement from a template and its arguments.
    #[must_use]
    pub fn new(sql: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}
