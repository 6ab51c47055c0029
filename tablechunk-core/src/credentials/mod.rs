//! Credential collection for the MySQL connection.
//!
//! Credentials come from explicit overrides, a JSON file, a connection URL or
//! interactive prompts, in any combination. Nothing here talks to the
//! database; bad credentials only surface when a connection is opened.
//!
//! # Module Structure
//! - `record`: the complete `Credentials` record and the partial `CredentialOverrides`
//! - `connection_url`: `mysql://` URL parsing into overrides
//! - `prompt`: the `Prompter` seam and its terminal implementation
//! - `resolver`: the prompt/confirm/retry loop

mod connection_url;
mod prompt;
mod record;
mod resolver;

pub use prompt::{Prompter, TerminalPrompter};
pub use record::{CredentialOverrides, Credentials};
pub use resolver::{ResolverOptions, resolve_credentials};
