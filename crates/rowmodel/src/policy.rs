//! Error-escalation policy.
//!
//! Every backend failure in the workspace passes through exactly one
//! chokepoint, [`DebugPolicy::escalate`], called from the gateway's execution
//! paths. The configured [`DebugLevel`] decides what the caller sees:
//! nothing (process abort with a sanitized message), the message alone, or
//! the full diagnostic context plus per-statement query logging.
//!
//! Termination is not buried in the storage layer: the abort behavior is an
//! injectable hook on the policy, so tests observe it instead of dying.

use rowmodel_core::{BackendError, Error};
use tracing::error;

/// The sanitized message emitted at [`DebugLevel::Silent`]. Deliberately
/// carries no backend diagnostics.
pub const FATAL_MESSAGE: &str = "Fatal DB error occurred.";

/// Escalation level for backend errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugLevel {
    /// Any backend error aborts via the policy's abort hook with
    /// [`FATAL_MESSAGE`]. Nothing propagates to caller code.
    Silent,
    /// Log the error message, return an error carrying the message only.
    #[default]
    Errors,
    /// Log and return full diagnostic context; additionally the gateway logs
    /// every executed statement.
    Verbose,
}

impl DebugLevel {
    /// Map a numeric level (0/1/2) to its variant. Levels above 2 clamp to
    /// `Verbose`.
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => DebugLevel::Silent,
            1 => DebugLevel::Errors,
            _ => DebugLevel::Verbose,
        }
    }

    /// Whether every executed statement should be logged.
    #[must_use]
    pub const fn log_queries(self) -> bool {
        matches!(self, DebugLevel::Verbose)
    }
}

/// Invoked with [`FATAL_MESSAGE`] when a backend error hits
/// [`DebugLevel::Silent`].
pub type AbortHook = Box<dyn Fn(&str) + Send + Sync>;

/// The escalation ladder, parameterized by level and abort behavior.
pub struct DebugPolicy {
    level: DebugLevel,
    abort: AbortHook,
}

impl DebugPolicy {
    /// Create a policy whose abort hook prints the sanitized message and
    /// terminates the process.
    #[must_use]
    pub fn new(level: DebugLevel) -> Self {
        Self {
            level,
            abort: Box::new(|msg| {
                eprintln!("{msg}");
                std::process::exit(1);
            }),
        }
    }

    /// Create a policy with a custom abort hook.
    #[must_use]
    pub fn with_abort_hook(level: DebugLevel, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            level,
            abort: Box::new(hook),
        }
    }

    /// The configured level.
    #[must_use]
    pub fn level(&self) -> DebugLevel {
        self.level
    }

    /// Classify a backend error per the configured level.
    ///
    /// At `Silent` the abort hook runs first; the returned error only matters
    /// when the hook does not terminate (tests).
    pub fn escalate(&self, err: BackendError) -> Error {
        match self.level {
            DebugLevel::Silent => {
                (self.abort)(FATAL_MESSAGE);
                Error::Backend {
                    message: FATAL_MESSAGE.to_string(),
                    detail: None,
                }
            }
            DebugLevel::Errors => {
                error!(message = %err.message, "storage error");
                Error::Backend {
                    message: err.message,
                    detail: None,
                }
            }
            DebugLevel::Verbose => {
                error!(error = %err, "storage error");
                Error::Backend {
                    message: err.message.clone(),
                    detail: Some(err),
                }
            }
        }
    }

    /// Route a connection-stage error (missing DSN, unreachable backend)
    /// through the same ladder while keeping its variant.
    pub fn escalate_setup(&self, err: Error) -> Error {
        match self.level {
            DebugLevel::Silent => {
                (self.abort)(FATAL_MESSAGE);
                err
            }
            DebugLevel::Errors | DebugLevel::Verbose => {
                error!(error = %err, "connection setup failed");
                err
            }
        }
    }
}

impl std::fmt::Debug for DebugPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugPolicy")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}
