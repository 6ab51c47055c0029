//! Credential records and their JSON file form.
//!
//! # Security
//! - The password is zeroed when a record is dropped
//! - `Debug` output never contains the password
//! - Files are written in cleartext; protecting them is the caller's job

use crate::error::TableChunkError;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A complete set of connection parameters.
///
/// The four named fields are required by the driver. Anything else the
/// driver understands (port, charset, ssl options...) lives in `extra` and is
/// stored next to them in the JSON file.
///
/// # Example
///
/// ```rust
/// use tablechunk_core::Credentials;
///
/// let creds = Credentials::new("analyst", "secret", "db.internal", "sales");
/// assert_eq!(creds.to_string(), "analyst@db.internal/sales");
/// assert!(!format!("{:?}", creds).contains("secret"));
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub host: String,
    pub database: String,
    /// Additional driver options, flattened into the JSON record
    #[serde(flatten)]
    #[zeroize(skip)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl Credentials {
    /// Creates a record with no extra driver options.
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            host: host.into(),
            database: database.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Builder method to add a driver option.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Writes the record as pretty JSON and returns the path written.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            TableChunkError::Serialization {
                context: "Failed to serialize credentials".to_string(),
                source: e,
            }
        })?;
        std::fs::write(path, json).map_err(|e| TableChunkError::Io {
            context: format!("Failed to write credentials to {}", path.display()),
            source: e,
        })?;
        tracing::debug!("Saved credentials for {} to {}", self, path.display());
        Ok(path.to_path_buf())
    }

    /// Reads a complete record; every named field must be present.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = read_file(path)?;
        serde_json::from_str(&contents).map_err(|e| TableChunkError::Serialization {
            context: format!("Invalid credentials file {}", path.display()),
            source: e,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"****")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Safe form for logs: `user@host/database`.
impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.user, self.host, self.database)
    }
}

/// A partial credential record: whatever the caller already knows.
///
/// Empty strings are treated the same as absent fields, so a file holding
/// `"password": ""` still prompts for the password.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl CredentialOverrides {
    /// Creates an empty set of overrides; every field will be prompted for.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Builder method to set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Builder method to set the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Builder method to set the database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Builder method to add a driver option.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Layers `other` on top of `self`; fields set in `other` win.
    pub fn overlay(mut self, mut other: Self) -> Self {
        fn pick(base: &mut Option<String>, top: &mut Option<String>) {
            if present(top).is_some() {
                std::mem::swap(base, top);
            }
        }

        pick(&mut self.user, &mut other.user);
        pick(&mut self.password, &mut other.password);
        pick(&mut self.host, &mut other.host);
        pick(&mut self.database, &mut other.database);
        self.extra.append(&mut other.extra);
        self
    }

    /// Reads a possibly partial record from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = read_file(path)?;
        serde_json::from_str(&contents).map_err(|e| TableChunkError::Serialization {
            context: format!("Invalid credentials file {}", path.display()),
            source: e,
        })
    }

    /// Returns the user if set and non-empty.
    pub fn user(&self) -> Option<&str> {
        present(&self.user)
    }

    /// Returns the password if set and non-empty.
    pub fn password(&self) -> Option<&str> {
        present(&self.password)
    }

    /// Returns the host if set and non-empty.
    pub fn host(&self) -> Option<&str> {
        present(&self.host)
    }

    /// Returns the database if set and non-empty.
    pub fn database(&self) -> Option<&str> {
        present(&self.database)
    }

    /// Returns true when no prompt is needed.
    pub fn is_complete(&self) -> bool {
        self.user().is_some()
            && self.password().is_some()
            && self.host().is_some()
            && self.database().is_some()
    }
}

impl fmt::Debug for CredentialOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOverrides")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("host", &self.host)
            .field("database", &self.database)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Drop for CredentialOverrides {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl From<&Credentials> for CredentialOverrides {
    fn from(creds: &Credentials) -> Self {
        Self {
            user: Some(creds.user.clone()),
            password: Some(creds.password.clone()),
            host: Some(creds.host.clone()),
            database: Some(creds.database.clone()),
            extra: creds.extra.clone(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| TableChunkError::Io {
        context: format!("Failed to read credentials from {}", path.display()),
        source: e,
    })
}
