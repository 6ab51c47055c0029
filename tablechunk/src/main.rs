//! Chunked reads over MySQL tables.
//!
//! This binary resolves credentials, connects, and then lists tables,
//! streams one table as JSON lines, creates a shuffled copy, or just saves
//! the resolved credentials for later runs.

use anyhow::{Context, bail};
use clap::Parser;
use futures::StreamExt;
use tablechunk::{ChunksArgs, Cli, Command};
use tablechunk_core::driver::mysql::MySqlDriver;
use tablechunk_core::logging::init_logging;
use tablechunk_core::{ConnectionHelper, TerminalPrompter, resolve_credentials};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let overrides = cli.credentials.overrides()?;
    let config = cli.credentials.config(cli.global.quiet);
    let mut prompter = TerminalPrompter;

    if let Command::SaveCreds { path } = &cli.command {
        let credentials =
            resolve_credentials(&overrides, &mut prompter, &config.resolver_options())?;
        let path = credentials
            .save_json(path)
            .with_context(|| format!("Failed to save credentials for {}", credentials))?;
        info!("Credentials saved to {}", path.display());
        return Ok(());
    }

    let mut helper = ConnectionHelper::resolve(
        Box::new(MySqlDriver::new()),
        &overrides,
        &mut prompter,
        config,
    )
    .await?;
    if !helper.tables().has_cursor() {
        bail!("No connection established to {}", helper.credentials());
    }

    let outcome = run(&mut helper, &cli.command).await;
    helper.close().await;
    outcome
}

async fn run(helper: &mut ConnectionHelper, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::SaveCreds { .. } => Ok(()),
        Command::Tables => list_tables(helper),
        Command::Chunks(args) => stream_table(helper, args).await,
        Command::Randomize {
            source,
            dest,
            columns,
        } => {
            let verbose = helper.config().verbose;
            helper
                .tables_mut()
                .create_randomized_table(source, dest, columns, verbose, None)
                .await
                .with_context(|| format!("Failed to create '{}' from '{}'", dest, source))?;
            Ok(())
        }
    }
}

/// Prints one JSON object per catalog entry.
fn list_tables(helper: &ConnectionHelper) -> anyhow::Result<()> {
    for entry in helper.tables().catalog().entries() {
        println!("{}", serde_json::to_string(entry)?);
    }
    Ok(())
}

/// Prints one JSON object per chunk, as soon as each chunk arrives.
async fn stream_table(helper: &mut ConnectionHelper, args: &ChunksArgs) -> anyhow::Result<()> {
    let options = args.options();
    let Some(mut chunks) = helper
        .tables_mut()
        .iterate_chunks(&args.table, &options, None)
        .await?
    else {
        bail!("Table '{}' not found", args.table);
    };

    let mut emitted = 0usize;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.with_context(|| {
            format!("Chunk {} of '{}' failed", emitted.saturating_add(1), args.table)
        })?;
        println!("{}", serde_json::to_string(&chunk)?);
        emitted = emitted.saturating_add(1);
    }
    info!("Emitted {} chunk(s) from '{}'", emitted, args.table);
    Ok(())
}
