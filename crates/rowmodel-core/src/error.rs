//! Error taxonomy for rowmodel.

use crate::backend::BackendError;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// All the ways a mapper operation can fail.
///
/// Propagation policy:
/// - `Schema` is raised at entity construction and is never downgraded.
/// - `Config`, `Connection`, and `Backend` funnel through the debug policy.
/// - `EmptyCriteria`, `NoIdentifier`, and `UnknownField` are local: the
///   operations that produce them degrade to a falsy/not-found return, so
///   callers can branch on success without error handling.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Entity type misconfigured: missing table name or empty field set.
    Schema(String),
    /// Missing or unusable configuration (e.g. empty DSN).
    Config(String),
    /// The backend could not be reached or returned no handle.
    Connection(String),
    /// Fetch criteria filtered down to nothing; no statement was issued.
    EmptyCriteria,
    /// An operation requiring a persisted identifier ran without one.
    NoIdentifier,
    /// A field name that is not part of the entity's declared field table.
    UnknownField(String),
    /// A storage error surfaced through the debug policy. `detail` is
    /// populated only at the verbose debug level.
    Backend {
        /// The backend's error message.
        message: String,
        /// Full diagnostic context (code, failing statement, call site).
        detail: Option<BackendError>,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Schema(msg) => write!(f, "schema error: {msg}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Connection(msg) => write!(f, "connection error: {msg}"),
            Error::EmptyCriteria => f.write_str("criteria contained no known fields"),
            Error::NoIdentifier => f.write_str("record has no identifier"),
            Error::UnknownField(name) => write!(f, "unknown field: {name}"),
            Error::Backend { message, detail } => match detail {
                Some(d) => write!(f, "DB error: {message} ({d})"),
                None => write!(f, "DB error: {message}"),
            },
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::UnknownField("nope".to_string());
        assert_eq!(err.to_string(), "unknown field: nope");

        let err = Error::Backend {
            message: "gone away".to_string(),
            detail: None,
        };
        assert_eq!(err.to_string(), "DB error: gone away");
    }
}
