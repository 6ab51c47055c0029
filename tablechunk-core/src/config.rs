//! Connection helper configuration.

use crate::credentials::ResolverOptions;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Configuration for `ConnectionHelper`.
///
/// # Example
/// ```rust
/// use tablechunk_core::HelperConfig;
///
/// let config = HelperConfig::default()
///     .with_eager_metadata(false)
///     .with_check_creds(false);
///
/// assert!(config.auto_connect);
/// assert!(!config.resolver_options().check_creds);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperConfig {
    /// Compute row counts and column names as soon as tables are listed
    pub eager_metadata: bool,
    /// Open the connection and install a cursor on construction
    pub auto_connect: bool,
    /// Offer to review credentials after prompting
    pub check_creds: bool,
    /// Log connection and table creation messages at INFO
    pub verbose: bool,
    /// Maximum credential resolution passes; `None` retries until accepted
    pub max_attempts: Option<NonZeroUsize>,
    /// Echo the host prompt
    pub echo_host: bool,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            eager_metadata: true,
            auto_connect: true,
            check_creds: true,
            verbose: true,
            max_attempts: None,
            echo_host: false,
        }
    }
}

impl HelperConfig {
    /// Builder method to set eager metadata mode.
    pub fn with_eager_metadata(mut self, eager_metadata: bool) -> Self {
        self.eager_metadata = eager_metadata;
        self
    }

    /// Builder method to set whether construction connects.
    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// Builder method to set the credential review.
    pub fn with_check_creds(mut self, check_creds: bool) -> Self {
        self.check_creds = check_creds;
        self
    }

    /// Builder method to set verbose logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder method to bound credential resolution passes.
    pub fn with_max_attempts(mut self, max_attempts: Option<NonZeroUsize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Builder method to echo the host prompt.
    pub fn with_echo_host(mut self, echo_host: bool) -> Self {
        self.echo_host = echo_host;
        self
    }

    /// The credential resolution part of this configuration.
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            check_creds: self.check_creds,
            max_attempts: self.max_attempts,
            echo_host: self.echo_host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HelperConfig::default();
        assert!(config.eager_metadata);
        assert!(config.auto_connect);
        assert!(config.check_creds);
        assert!(config.verbose);
        assert_eq!(config.max_attempts, None);
        assert!(!config.echo_host);
    }

    #[test]
    fn test_resolver_options_follow_config() {
        let config = HelperConfig::default()
            .with_check_creds(false)
            .with_max_attempts(NonZeroUsize::new(3))
            .with_echo_host(true);

        let options = config.resolver_options();
        assert!(!options.check_creds);
        assert_eq!(options.max_attempts.map(NonZeroUsize::get), Some(3));
        assert!(options.echo_host);
    }

    #[test]
    fn test_config_deserializes_from_json() {
        let config: HelperConfig = serde_json::from_str(
            r#"{"eager_metadata": false, "auto_connect": true, "check_creds": false,
                "verbose": false, "max_attempts": 2, "echo_host": false}"#,
        )
        .unwrap();
        assert!(!config.eager_metadata);
        assert_eq!(config.max_attempts.map(NonZeroUsize::get), Some(2));
    }
}
