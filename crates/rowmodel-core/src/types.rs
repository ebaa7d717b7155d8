//! Field types and placeholder directives.
//!
//! Every declared field carries a [`FieldType`]; statement construction maps
//! it to a [`Placeholder`] directive telling the backend how to quote or cast
//! the bound value. Two additional directives exist only for statement
//! construction (`ValueList`, `Ident`, `Literal`) and can never be declared
//! as a field's type — the split into two enums enforces that statically.

/// Declared semantic type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    /// Generic string field. The fallback for anything unresolvable.
    #[default]
    String,
    /// Integer field.
    Integer,
    /// Floating point field.
    Float,
    /// Like `String`, but empty strings and zeros are cast to NULL by the
    /// backend.
    NullableCast,
}

/// Storage-layer placeholder directive.
///
/// The marker alphabet is the wire contract with the backend: the backend is
/// responsible for quoting/escaping per marker kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?` — generic scalar value.
    Value,
    /// `?d` — integer cast.
    Int,
    /// `?f` — float cast.
    Float,
    /// `?n` — like `?`, but empty strings and zeros bind as NULL.
    NullableCast,
    /// `?a` — a list of values (`IN (?a)`, insert tuples, assoc SET lists).
    ValueList,
    /// `?#` — a quoted table/column identifier (or a list of them).
    Ident,
    /// `?_` — literal constant such as a table prefix.
    Literal,
}

impl Placeholder {
    /// Resolve the placeholder for a declared field type.
    ///
    /// Total and infallible: every field type has exactly one directive.
    #[must_use]
    pub const fn for_field(ty: FieldType) -> Self {
        match ty {
            FieldType::String => Placeholder::Value,
            FieldType::Integer => Placeholder::Int,
            FieldType::Float => Placeholder::Float,
            FieldType::NullableCast => Placeholder::NullableCast,
        }
    }

    /// The marker written into statement templates.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Placeholder::Value => "?",
            Placeholder::Int => "?d",
            Placeholder::Float => "?f",
            Placeholder::NullableCast => "?n",
            Placeholder::ValueList => "?a",
            Placeholder::Ident => "?#",
            Placeholder::Literal => "?_",
        }
    }
}
