//! Credential resolution: fill the gaps, optionally confirm, retry on rejection.

use super::prompt::Prompter;
use super::record::{CredentialOverrides, Credentials};
use crate::Result;
use crate::error::TableChunkError;
use std::num::NonZeroUsize;

/// Controls the interactive part of credential resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Offer to display the assembled credentials for confirmation
    pub check_creds: bool,
    /// Maximum number of resolution passes; `None` retries until accepted
    pub max_attempts: Option<NonZeroUsize>,
    /// Echo the host prompt. Off by default: the host prompt has always been
    /// read like a password, and changing that is left to the caller.
    pub echo_host: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            check_creds: true,
            max_attempts: None,
            echo_host: false,
        }
    }
}

impl ResolverOptions {
    /// Builder method to enable or disable the confirmation step.
    pub fn with_check_creds(mut self, check_creds: bool) -> Self {
        self.check_creds = check_creds;
        self
    }

    /// Builder method to bound the number of passes.
    pub fn with_max_attempts(mut self, max_attempts: Option<NonZeroUsize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Builder method to echo the host prompt.
    pub fn with_echo_host(mut self, echo_host: bool) -> Self {
        self.echo_host = echo_host;
        self
    }
}

/// Produces a complete credential record.
///
/// Every required field missing from `overrides` is prompted for; password
/// and host prompts are hidden (host unless `echo_host`). With `check_creds`
/// the user may review the result in cleartext. Rejecting it starts a new
/// pass from `overrides` alone, so previously typed answers are discarded and
/// supplied fields are kept.
///
/// # Errors
/// Returns a prompt error if the terminal fails, or a configuration error
/// once `max_attempts` passes have been rejected.
pub fn resolve_credentials<P>(
    overrides: &CredentialOverrides,
    prompter: &mut P,
    options: &ResolverOptions,
) -> Result<Credentials>
where
    P: Prompter + ?Sized,
{
    let mut attempts: usize = 0;
    loop {
        attempts = attempts.saturating_add(1);
        let credentials = gather(overrides, prompter, options)?;

        if !options.check_creds || confirm(&credentials, prompter)? {
            tracing::debug!("Resolved credentials for {}", credentials);
            return Ok(credentials);
        }

        if let Some(max) = options.max_attempts
            && attempts >= max.get()
        {
            return Err(TableChunkError::configuration(format!(
                "Credentials rejected after {} attempt(s)",
                attempts
            )));
        }
        tracing::debug!("Credentials rejected, prompting again");
    }
}

fn gather<P>(
    overrides: &CredentialOverrides,
    prompter: &mut P,
    options: &ResolverOptions,
) -> Result<Credentials>
where
    P: Prompter + ?Sized,
{
    let user = match overrides.user() {
        Some(user) => user.to_string(),
        None => prompter.ask("Please input the mysql user: ")?,
    };
    let password = match overrides.password() {
        Some(password) => password.to_string(),
        None => prompter.ask_hidden(&format!(
            "Please input the password for user '{}': ",
            user
        ))?,
    };
    let host = match overrides.host() {
        Some(host) => host.to_string(),
        None => {
            let prompt = "Please input the host address for the mysql server: ";
            if options.echo_host {
                prompter.ask(prompt)?
            } else {
                prompter.ask_hidden(prompt)?
            }
        }
    };
    let database = match overrides.database() {
        Some(database) => database.to_string(),
        None => prompter.ask("Please input the name of the desired database: ")?,
    };

    let mut credentials = Credentials::new(user, password, host, database);
    credentials.extra = overrides.extra.clone();
    Ok(credentials)
}

/// Returns false only when the user reviewed the values and rejected them.
fn confirm<P>(credentials: &Credentials, prompter: &mut P) -> Result<bool>
where
    P: Prompter + ?Sized,
{
    let answer = prompter.ask(
        "Would you like to check your inputs?\n\
         Danger! This will expose your password and host.\n\
         (y/[n]): ",
    )?;
    if !is_yes(&answer) {
        return Ok(true);
    }

    prompter.show(&format!(
        "\nYou have input the following parameters:\n\
         user: '{}'\n\
         password: '{}'\n\
         host: '{}'\n\
         database: '{}'\n",
        credentials.user, credentials.password, credentials.host, credentials.database
    ))?;

    let correct = prompter.ask("Is this correct? ([y]/n): ")?;
    Ok(!is_no(&correct))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn is_no(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "n" | "no")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers and records which prompts were hidden.
    #[derive(Default)]
    struct Scripted {
        answers: VecDeque<String>,
        asked: Vec<(String, bool)>,
        shown: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                ..Self::default()
            }
        }

        fn next(&mut self, prompt: &str, hidden: bool) -> Result<String> {
            self.asked.push((prompt.to_string(), hidden));
            self.answers.pop_front().ok_or_else(|| {
                TableChunkError::prompt(
                    "script exhausted",
                    std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
                )
            })
        }
    }

    impl Prompter for Scripted {
        fn ask(&mut self, prompt: &str) -> Result<String> {
            self.next(prompt, false)
        }

        fn ask_hidden(&mut self, prompt: &str) -> Result<String> {
            self.next(prompt, true)
        }

        fn show(&mut self, message: &str) -> Result<()> {
            self.shown.push(message.to_string());
            Ok(())
        }
    }

    fn no_check() -> ResolverOptions {
        ResolverOptions::default().with_check_creds(false)
    }

    #[test]
    fn test_complete_overrides_need_no_prompts() {
        let overrides = CredentialOverrides::new()
            .with_user("u")
            .with_password("p")
            .with_host("h")
            .with_database("d")
            .with_extra("port", 3307);
        let mut prompter = Scripted::new(&[]);

        let creds = resolve_credentials(&overrides, &mut prompter, &no_check()).unwrap();
        assert_eq!(creds, Credentials::new("u", "p", "h", "d").with_extra("port", 3307));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_missing_fields_are_prompted_in_order() {
        let mut prompter = Scripted::new(&["alice", "pw", "db.local", "sales"]);

        let creds =
            resolve_credentials(&CredentialOverrides::new(), &mut prompter, &no_check()).unwrap();

        assert_eq!(creds, Credentials::new("alice", "pw", "db.local", "sales"));
        let hidden: Vec<bool> = prompter.asked.iter().map(|(_, h)| *h).collect();
        assert_eq!(hidden, vec![false, true, true, false]);
        assert_eq!(
            prompter.asked[1].0,
            "Please input the password for user 'alice': "
        );
    }

    #[test]
    fn test_echo_host_option() {
        let overrides = CredentialOverrides::new()
            .with_user("u")
            .with_password("p")
            .with_database("d");
        let mut prompter = Scripted::new(&["h"]);
        let options = no_check().with_echo_host(true);

        resolve_credentials(&overrides, &mut prompter, &options).unwrap();
        assert_eq!(prompter.asked.len(), 1);
        assert!(!prompter.asked[0].1);
    }

    #[test]
    fn test_declining_review_accepts() {
        let overrides = CredentialOverrides::new().with_user("u").with_host("h");
        let mut prompter = Scripted::new(&["p", "d", ""]);

        let creds =
            resolve_credentials(&overrides, &mut prompter, &ResolverOptions::default()).unwrap();
        assert_eq!(creds.database, "d");
        assert!(prompter.shown.is_empty());
    }

    #[test]
    fn test_rejection_retries_with_supplied_fields() {
        let overrides = CredentialOverrides::new().with_user("u").with_host("h");
        let mut prompter = Scripted::new(&[
            // first pass: password, database, review? yes, correct? no
            "wrong", "d1", "y", "n",
            // second pass
            "right", "d2", "yes", "",
        ]);

        let creds =
            resolve_credentials(&overrides, &mut prompter, &ResolverOptions::default()).unwrap();

        assert_eq!(creds, Credentials::new("u", "right", "h", "d2"));
        assert_eq!(prompter.shown.len(), 2);
        assert!(prompter.shown[0].contains("password: 'wrong'"));
        assert!(
            prompter
                .asked
                .iter()
                .all(|(prompt, _)| !prompt.contains("mysql user"))
        );
    }

    #[test]
    fn test_bounded_attempts() {
        let overrides = CredentialOverrides::new()
            .with_user("u")
            .with_password("p")
            .with_host("h")
            .with_database("d");
        let mut prompter = Scripted::new(&["y", "n", "y", "no"]);
        let options = ResolverOptions::default().with_max_attempts(NonZeroUsize::new(2));

        let err = resolve_credentials(&overrides, &mut prompter, &options).unwrap_err();
        assert!(matches!(err, TableChunkError::Configuration { .. }));
        assert!(err.to_string().contains("2 attempt"));
    }
}
