//! The connection provider.
//!
//! One [`Gateway`] owns the process-wide backend handle: lazily established
//! on the first statement, reused for the process lifetime, guarded by a
//! mutex so first-connect races are explicit and safe. All statement
//! execution funnels through [`select_row`], [`select_scalar`], and
//! [`execute`], which log at the verbose level and route every backend error
//! through the [`DebugPolicy`] chokepoint.
//!
//! [`select_row`]: Gateway::select_row
//! [`select_scalar`]: Gateway::select_scalar
//! [`execute`]: Gateway::execute

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rowmodel_core::schema::SaverFn;
use rowmodel_core::{Backend, Connector, Error, ExecOutcome, Result, Row, Statement, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::policy::DebugPolicy;

/// Lazily-connected backend handle plus escalation policy.
pub struct Gateway {
    config: Config,
    policy: DebugPolicy,
    connector: Box<dyn Connector>,
    handle: Mutex<Option<Arc<dyn Backend>>>,
}

impl Gateway {
    /// Create a gateway; the policy is derived from `config.debug` with the
    /// default (terminating) abort hook.
    #[must_use]
    pub fn new(config: Config, connector: impl Connector + 'static) -> Self {
        let policy = DebugPolicy::new(config.debug);
        Self::with_policy(config, connector, policy)
    }

    /// Create a gateway with an explicit policy (test abort hooks).
    #[must_use]
    pub fn with_policy(
        config: Config,
        connector: impl Connector + 'static,
        policy: DebugPolicy,
    ) -> Self {
        Self {
            config,
            policy,
            connector: Box::new(connector),
            handle: Mutex::new(None),
        }
    }

    /// The configuration this gateway was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The escalation policy.
    #[must_use]
    pub fn policy(&self) -> &DebugPolicy {
        &self.policy
    }

    /// Return the cached handle or establish it under the lock.
    ///
    /// A missing DSN and a connector that yields no handle are terminal and
    /// ride the policy ladder like any backend error.
    fn connect(&self) -> Result<Arc<dyn Backend>> {
        let mut guard = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = guard.as_ref() {
            return Ok(handle.clone());
        }
        if self.config.dsn.is_empty() {
            return Err(self
                .policy
                .escalate_setup(Error::Config("no DSN configured".to_string())));
        }
        let Some(handle) = self.connector.connect(&self.config.dsn) else {
            return Err(self
                .policy
                .escalate_setup(Error::Connection("backend returned no handle".to_string())));
        };
        info!("backend connection established");
        *guard = Some(handle.clone());
        Ok(handle)
    }

    /// Drop the cached handle; the next statement reconnects.
    pub fn shutdown(&self) {
        let mut guard = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// Execute a single-row select.
    pub fn select_row(&self, stmt: &Statement) -> Result<Option<Row>> {
        let handle = self.connect()?;
        self.log_statement(stmt);
        handle.select_row(stmt).map_err(|e| self.policy.escalate(e))
    }

    /// Execute a single-scalar select.
    pub fn select_scalar(&self, stmt: &Statement) -> Result<Option<Value>> {
        let handle = self.connect()?;
        self.log_statement(stmt);
        handle
            .select_scalar(stmt)
            .map_err(|e| self.policy.escalate(e))
    }

    /// Execute an INSERT, UPDATE, or DELETE.
    pub fn execute(&self, stmt: &Statement) -> Result<ExecOutcome> {
        let handle = self.connect()?;
        self.log_statement(stmt);
        handle.execute(stmt).map_err(|e| self.policy.escalate(e))
    }

    /// Run a per-field saver override against the live handle, with the same
    /// escalation as a built-in statement.
    pub fn apply_saver(&self, saver: &SaverFn, value: &Value) -> Result<ExecOutcome> {
        let handle = self.connect()?;
        saver(handle.as_ref(), value).map_err(|e| self.policy.escalate(e))
    }

    fn log_statement(&self, stmt: &Statement) {
        if self.policy.level().log_queries() {
            debug!(statement = %stmt, "executing");
        }
    }
}

static GLOBAL: OnceLock<Arc<Gateway>> = OnceLock::new();

/// Install the process-wide gateway. The first call wins; later calls are
/// ignored.
pub fn set_global_gateway(gateway: Arc<Gateway>) {
    let _ = GLOBAL.set(gateway);
}

/// The process-wide gateway, if one has been installed.
#[must_use]
pub fn global_gateway() -> Option<Arc<Gateway>> {
    GLOBAL.get().cloned()
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connected = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("connected", &connected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmodel_core::BackendError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend;

    impl Backend for CountingBackend {
        fn select_row(&self, _stmt: &Statement) -> std::result::Result<Option<Row>, BackendError> {
            Ok(None)
        }

        fn select_scalar(
            &self,
            _stmt: &Statement,
        ) -> std::result::Result<Option<Value>, BackendError> {
            Ok(Some(Value::Int(1)))
        }

        fn execute(&self, _stmt: &Statement) -> std::result::Result<ExecOutcome, BackendError> {
            Ok(ExecOutcome::Affected(1))
        }
    }

    fn config(dsn: &str) -> Config {
        Config {
            dsn: dsn.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_connect_is_cached() {
        static CONNECTS: AtomicUsize = AtomicUsize::new(0);
        let gateway = Gateway::new(config("mock://db"), |_dsn: &str| -> Option<Arc<dyn Backend>> {
            CONNECTS.fetch_add(1, Ordering::SeqCst);
            Some(Arc::new(CountingBackend))
        });

        let stmt = Statement::new("SELECT 1", Vec::new());
        gateway.select_scalar(&stmt).unwrap();
        gateway.select_scalar(&stmt).unwrap();
        assert_eq!(CONNECTS.load(Ordering::SeqCst), 1);

        // Shutdown drops the handle; the next call reconnects.
        gateway.shutdown();
        gateway.select_scalar(&stmt).unwrap();
        assert_eq!(CONNECTS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_global_gateway_is_set_only_once() {
        let first = Arc::new(Gateway::new(
            config("mock://a"),
            |_dsn: &str| -> Option<Arc<dyn Backend>> { None },
        ));
        set_global_gateway(first.clone());
        let got = global_gateway().unwrap();
        assert!(Arc::ptr_eq(&first, &got));

        // Subsequent sets are ignored.
        let second = Arc::new(Gateway::new(
            config("mock://b"),
            |_dsn: &str| -> Option<Arc<dyn Backend>> { None },
        ));
        set_global_gateway(second);
        let got = global_gateway().unwrap();
        assert!(Arc::ptr_eq(&first, &got));
    }

    #[test]
    fn test_empty_dsn_is_a_config_error() {
        let gateway = Gateway::new(config(""), |_dsn: &str| -> Option<Arc<dyn Backend>> {
            Some(Arc::new(CountingBackend))
        });
        let err = gateway
            .select_row(&Statement::new("SELECT 1", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unreachable_backend_is_a_connection_error() {
        let gateway =
            Gateway::new(config("mock://db"), |_dsn: &str| -> Option<Arc<dyn Backend>> {
                None
            });
        let err = gateway
            .execute(&Statement::new("DELETE FROM ?#", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
