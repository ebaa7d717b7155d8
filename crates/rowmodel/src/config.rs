//! Host-supplied mapper configuration.

use crate::policy::DebugLevel;

/// How `save` writes a persisted record back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStrategy {
    /// One UPDATE per non-identifier field. Relies on backend statement
    /// caching; keeps each write independently retryable by the caller.
    #[default]
    PerField,
    /// One multi-column UPDATE for all buffered non-identifier fields.
    SingleStatement,
}

/// Static configuration the host hands to [`Gateway::new`].
///
/// [`Gateway::new`]: crate::Gateway::new
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Backend DSN. Must be non-empty before the first statement runs.
    pub dsn: String,
    /// Default database/schema name; entity declarations may override it.
    pub schema: Option<String>,
    /// Error-escalation and query-logging level.
    pub debug: DebugLevel,
    /// Write strategy for `save` on persisted records.
    pub save_strategy: SaveStrategy,
}
