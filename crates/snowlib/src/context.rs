//! Connection context shared by queries and models

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::Result;
use crate::config::ConnectionOverrides;
use crate::connector::Connector;
use crate::driver::{Driver, Statement};

/// Access to one Snowflake connection.
///
/// A context built from a profile owns its connector and closes it; one
/// built from an existing connector leaves closing to the caller. Clones
/// share the connector but never own it, so only the original can close it.
pub struct Context {
    connector: Arc<Connector>,
    owned: bool,
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self::from_connector(Arc::clone(&self.connector))
    }
}

impl Context {
    /// Own a new connector for `profile`; nothing connects until first use
    pub fn from_profile(
        profile: &str,
        path: Option<&Path>,
        overrides: ConnectionOverrides,
    ) -> Result<Self> {
        Ok(Self {
            connector: Arc::new(Connector::from_profile(profile, path, overrides)?),
            owned: true,
        })
    }

    /// Borrow a connector managed elsewhere
    #[must_use]
    pub const fn from_connector(connector: Arc<Connector>) -> Self {
        Self {
            connector,
            owned: false,
        }
    }

    /// Own a connector wrapping `driver`
    #[must_use]
    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        Self {
            connector: Arc::new(Connector::with_driver("default", driver)),
            owned: true,
        }
    }

    #[must_use]
    pub fn connector(&self) -> &Arc<Connector> {
        &self.connector
    }

    #[must_use]
    pub const fn owns_connector(&self) -> bool {
        self.owned
    }

    /// Driver for the next statement, connecting on first use
    pub async fn driver(&self) -> Result<Arc<dyn Driver>> {
        self.connector.connect().await
    }

    /// Close the connector if this context owns it
    pub async fn close(&self) -> Result<()> {
        if self.owned {
            self.connector.close().await?;
        }
        Ok(())
    }

    async fn current(&self, function: &str) -> Result<String> {
        let driver = self.driver().await?;
        let response = driver
            .execute(&Statement::new(format!("SELECT {function}()")))
            .await?;
        Ok(response
            .data
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.into_iter().next())
            .flatten()
            .unwrap_or_default())
    }

    /// `CURRENT_DATABASE()`, empty when unset
    pub async fn current_database(&self) -> Result<String> {
        self.current("CURRENT_DATABASE").await
    }

    pub async fn current_schema(&self) -> Result<String> {
        self.current("CURRENT_SCHEMA").await
    }

    pub async fn current_warehouse(&self) -> Result<String> {
        self.current("CURRENT_WAREHOUSE").await
    }

    pub async fn current_role(&self) -> Result<String> {
        self.current("CURRENT_ROLE").await
    }

    pub async fn current_user(&self) -> Result<String> {
        self.current("CURRENT_USER").await
    }

    pub async fn current_account(&self) -> Result<String> {
        self.current("CURRENT_ACCOUNT").await
    }

    pub async fn current_region(&self) -> Result<String> {
        self.current("CURRENT_REGION").await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("profile", &self.connector.profile())
            .field("connected", &self.connector.is_connected())
            .field("owned", &self.owned)
            .finish()
    }
}
