//! Lazily-initialized connection wrapper

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as TokioMutex;

use crate::config::{ConnectionOverrides, ConnectionParams, load_params};
use crate::driver::{Driver, HttpDriver};
use crate::{Error, Result};

#[derive(Debug)]
enum ConnectorState {
    Connected { driver: Arc<dyn Driver> },
    Disconnected,
}

impl ConnectorState {
    const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// Holds resolved connection parameters and opens the driver on first use.
///
/// Profiles are resolved eagerly, so key file and passphrase problems
/// surface at construction. The network connection waits until a statement
/// needs it, and `close` followed by another statement reconnects.
pub struct Connector {
    profile: String,
    params: Option<ConnectionParams>,
    state: Mutex<ConnectorState>,
    connect_lock: TokioMutex<()>,
}

impl Connector {
    /// Resolve `profile` from `connections.toml` (or `path`) with overrides applied
    pub fn from_profile(
        profile: &str,
        path: Option<&Path>,
        overrides: ConnectionOverrides,
    ) -> Result<Self> {
        let params = load_params(profile, path, overrides)?;
        Ok(Self::from_params(profile, params))
    }

    #[must_use]
    pub fn from_params(profile: &str, params: ConnectionParams) -> Self {
        Self {
            profile: profile.to_string(),
            params: Some(params),
            state: Mutex::new(ConnectorState::Disconnected),
            connect_lock: TokioMutex::new(()),
        }
    }

    /// Wrap an existing driver. It cannot reconnect after `close`.
    #[must_use]
    pub fn with_driver(profile: &str, driver: Arc<dyn Driver>) -> Self {
        Self {
            profile: profile.to_string(),
            params: None,
            state: Mutex::new(ConnectorState::Connected { driver }),
            connect_lock: TokioMutex::new(()),
        }
    }

    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    #[must_use]
    pub const fn params(&self) -> Option<&ConnectionParams> {
        self.params.as_ref()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.lock().is_connected()
    }

    fn current(&self) -> Option<Arc<dyn Driver>> {
        match &*self.state.lock() {
            ConnectorState::Connected { driver } => Some(Arc::clone(driver)),
            ConnectorState::Disconnected => None,
        }
    }

    /// Driver for the next statement, connecting first if needed
    pub async fn connect(&self) -> Result<Arc<dyn Driver>> {
        if let Some(driver) = self.current() {
            return Ok(driver);
        }

        let _guard = self.connect_lock.lock().await;
        if let Some(driver) = self.current() {
            return Ok(driver);
        }

        let params = self.params.clone().ok_or(Error::ConnectionClosed)?;
        tracing::debug!(profile = %self.profile, "Opening connection");
        let driver: Arc<dyn Driver> = Arc::new(HttpDriver::connect(params).await?);

        *self.state.lock() = ConnectorState::Connected {
            driver: Arc::clone(&driver),
        };
        Ok(driver)
    }

    /// Close the connection. Calling it again is a no-op.
    pub async fn close(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), ConnectorState::Disconnected);
        if let ConnectorState::Connected { driver } = previous {
            tracing::debug!(profile = %self.profile, "Closing connection");
            if let Err(e) = driver.close().await {
                tracing::warn!(profile = %self.profile, error = %e, "Error while closing connection");
            }
        }
        Ok(())
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_connected() {
            "connected"
        } else {
            "not connected"
        };
        write!(f, "Connector(profile='{}', {state})", self.profile)
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("profile", &self.profile)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
