//! The storage-collaborator contract.
//!
//! The mapper never talks SQL transport itself; it hands [`Statement`]s to an
//! implementation of [`Backend`] obtained through a [`Connector`]. All calls
//! are synchronous and blocking — timeouts and retries, if any, belong to the
//! backend.

use std::sync::Arc;

use crate::row::Row;
use crate::statement::Statement;
use crate::value::Value;

/// Diagnostic context for a failed backend call.
///
/// Everything the verbose debug level surfaces to callers: the backend error
/// code, the failing statement, and the call site if the backend knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendError {
    /// Backend-specific error code, if any.
    pub code: Option<i64>,
    /// Human-readable error message.
    pub message: String,
    /// The statement template that failed.
    pub statement: String,
    /// Call-site context, if the backend tracks it.
    pub context: Option<String>,
}

impl BackendError {
    /// Create an error with just a message (connection-stage failures).
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            statement: String::new(),
            context: None,
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[{code}] ")?;
        }
        f.write_str(&self.message)?;
        if !self.statement.is_empty() {
            write!(f, "; statement: {}", self.statement)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, "; at {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BackendError {}

/// Outcome of a non-select statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// Rows affected by an UPDATE or DELETE.
    Affected(u64),
    /// The identifier generated by an INSERT.
    Inserted(Value),
    /// The backend reported failure without raising an error.
    Failed,
}

/// A live storage handle.
///
/// Statement templates use positional typed placeholder markers (see
/// [`crate::types::Placeholder`]); the implementation is responsible for
/// quoting and escaping per marker kind.
pub trait Backend: Send + Sync {
    /// Execute a select expected to yield at most one row.
    fn select_row(&self, stmt: &Statement) -> std::result::Result<Option<Row>, BackendError>;

    /// Execute a select expected to yield a single scalar.
    fn select_scalar(&self, stmt: &Statement) -> std::result::Result<Option<Value>, BackendError>;

    /// Execute an INSERT, UPDATE, or DELETE.
    fn execute(&self, stmt: &Statement) -> std::result::Result<ExecOutcome, BackendError>;
}

/// Establishes backend handles from a DSN.
///
/// Returning `None` signals an unreachable backend; the gateway escalates it
/// through the debug policy.
pub trait Connector: Send + Sync {
    /// Connect to the backend described by `dsn`.
    fn connect(&self, dsn: &str) -> Option<Arc<dyn Backend>>;
}

impl<F> Connector for F
where
    F: Fn(&str) -> Option<Arc<dyn Backend>> + Send + Sync,
{
    fn connect(&self, dsn: &str) -> Option<Arc<dyn Backend>> {
        self(dsn)
    }
}
