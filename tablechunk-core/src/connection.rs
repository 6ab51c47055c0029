//! Connection manager: credentials in, one live connection and one live
//! cursor out.
//!
//! `ConnectionHelper` is the sole owner of the connection and (through its
//! `TableHelper`) the cursor. Replacing either closes the previous handle
//! first, best-effort.

use crate::config::HelperConfig;
use crate::credentials::{CredentialOverrides, Credentials, Prompter, resolve_credentials};
use crate::driver::{Connection, Driver, close_connection_quietly};
use crate::tables::TableHelper;
use crate::Result;
use std::path::{Path, PathBuf};

/// Connection manager wrapping a `TableHelper`.
pub struct ConnectionHelper {
    credentials: Credentials,
    driver: Box<dyn Driver>,
    connection: Option<Box<dyn Connection>>,
    tables: TableHelper,
    config: HelperConfig,
}

impl std::fmt::Debug for ConnectionHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHelper")
            .field("credentials", &self.credentials)
            .field(
                "connection_open",
                &self.connection.as_ref().map(|c| c.is_open()),
            )
            .field("tables", &self.tables)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConnectionHelper {
    /// Creates a helper from complete credentials.
    ///
    /// With `auto_connect` the connection is opened and a cursor installed,
    /// which builds the table catalog. Without it the helper starts with no
    /// connection and no cursor.
    ///
    /// # Errors
    /// Returns the driver's connection error unchanged, or any error from
    /// the initial catalog build.
    pub async fn new(
        driver: Box<dyn Driver>,
        credentials: Credentials,
        config: HelperConfig,
    ) -> Result<Self> {
        let mut helper = Self {
            credentials,
            driver,
            connection: None,
            tables: TableHelper::new(config.eager_metadata),
            config,
        };

        if config.auto_connect {
            helper.open(config.verbose, true).await?;
            let cursor = match helper.connection.as_deref() {
                Some(connection) if connection.is_open() => Some(connection.cursor().await?),
                _ => None,
            };
            helper.tables.set_cursor(cursor).await?;
        }

        Ok(helper)
    }

    /// Resolves credentials (prompting for anything `overrides` lacks) and
    /// creates a helper from them.
    pub async fn resolve<P>(
        driver: Box<dyn Driver>,
        overrides: &CredentialOverrides,
        prompter: &mut P,
        config: HelperConfig,
    ) -> Result<Self>
    where
        P: Prompter + ?Sized,
    {
        let credentials = resolve_credentials(overrides, prompter, &config.resolver_options())?;
        Self::new(driver, credentials, config).await
    }

    /// Loads a (possibly partial) credential file and creates a helper.
    ///
    /// Saved credentials are usually trusted, so callers typically pass a
    /// config with `check_creds` disabled.
    pub async fn from_json_creds<P>(
        driver: Box<dyn Driver>,
        path: impl AsRef<Path>,
        prompter: &mut P,
        config: HelperConfig,
    ) -> Result<Self>
    where
        P: Prompter + ?Sized,
    {
        let overrides = CredentialOverrides::load_json(path)?;
        Self::resolve(driver, &overrides, prompter, config).await
    }

    /// Writes the credentials in use to `path` and returns it.
    pub fn save_json_creds(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.credentials.save_json(path)
    }

    /// Opens a fresh connection and installs a new cursor on it, which
    /// resets the table catalog.
    ///
    /// If the driver hands back a connection that is not open, the active
    /// cursor is cleared and a warning is logged; no error is returned, so
    /// check `tables().has_cursor()` afterwards.
    ///
    /// # Errors
    /// Returns the driver's connection error unchanged.
    pub async fn open_connection(&mut self, verbose: bool) -> Result<()> {
        self.open(verbose, false).await
    }

    async fn open(&mut self, verbose: bool, on_init: bool) -> Result<()> {
        let connection = self.driver.connect(&self.credentials).await?;
        self.install_connection(connection).await;

        let Some(connection) = self.connection.as_deref() else {
            return Ok(());
        };

        if connection.is_open() {
            if verbose {
                tracing::info!(
                    "New connection established to '{}'",
                    self.credentials.database
                );
            } else {
                tracing::debug!("Connected to {}", self.credentials);
            }
            if !on_init {
                let cursor = connection.cursor().await?;
                self.tables.install_cursor(cursor).await?;
            }
        } else {
            tracing::warn!("No connection established.");
            self.tables.clear_cursor().await;
        }
        Ok(())
    }

    /// Replaces the live connection, closing the previous one best-effort.
    pub async fn install_connection(&mut self, connection: Box<dyn Connection>) {
        if let Some(previous) = self.connection.take() {
            close_connection_quietly(previous.as_ref()).await;
        }
        self.connection = Some(connection);
    }

    /// Closes the cursor and the connection, best-effort.
    pub async fn close(&mut self) {
        self.tables.clear_cursor().await;
        if let Some(connection) = self.connection.take() {
            close_connection_quietly(connection.as_ref()).await;
        }
    }

    pub fn connection(&self) -> Option<&dyn Connection> {
        self.connection.as_deref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    pub fn tables(&self) -> &TableHelper {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut TableHelper {
        &mut self.tables
    }
}
