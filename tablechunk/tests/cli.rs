//! Argument parsing and credential layering for the tablechunk binary.

use clap::Parser;
use tablechunk::{Cli, Command};
use tablechunk_core::DEFAULT_START_OFFSET;

#[test]
fn test_cli_chunk_defaults() {
    let cli = Cli::try_parse_from(["tablechunk", "chunks", "orders"]).unwrap();

    let Command::Chunks(args) = &cli.command else {
        panic!("expected the chunks command");
    };
    let options = args.options();
    assert_eq!(options.n_chunks, 10);
    assert!(options.columns.is_empty());
    assert!(options.as_frame);
    assert!(options.respect_index);
    assert_eq!(options.start_offset, DEFAULT_START_OFFSET);
}

#[test]
fn test_cli_chunk_flags() {
    let cli = Cli::try_parse_from([
        "tablechunk",
        "chunks",
        "orders",
        "-n",
        "4",
        "--columns",
        "id,total",
        "--raw",
        "--no-index",
        "--start-offset",
        "0",
    ])
    .unwrap();

    let Command::Chunks(args) = &cli.command else {
        panic!("expected the chunks command");
    };
    let options = args.options();
    assert_eq!(options.n_chunks, 4);
    assert_eq!(options.columns, vec!["id".to_string(), "total".to_string()]);
    assert!(!options.as_frame);
    assert!(!options.respect_index);
    assert_eq!(options.start_offset, 0);
}

#[test]
fn test_cli_flags_override_url_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("creds.json");
    std::fs::write(
        &path,
        r#"{"user": "from_file", "password": "file_pw", "host": "file.host", "database": "file_db", "charset": "utf8mb4"}"#,
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "tablechunk",
        "--creds",
        path.to_str().unwrap(),
        "--url",
        "mysql://from_url@url.host:3307/url_db",
        "--database",
        "flag_db",
        "--password",
        "flag_pw",
        "tables",
    ])
    .unwrap();

    let overrides = cli.credentials.overrides().unwrap();
    assert_eq!(overrides.user(), Some("from_url"));
    assert_eq!(overrides.host(), Some("url.host"));
    assert_eq!(overrides.database(), Some("flag_db"));
    assert_eq!(overrides.password(), Some("flag_pw"));
    assert_eq!(overrides.extra["port"], 3307);
    assert_eq!(overrides.extra["charset"], "utf8mb4");
}

#[test]
fn test_cli_credential_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "tablechunk",
        "randomize",
        "orders",
        "orders_shuffled",
        "--columns",
        "id",
        "--user",
        "reader",
        "--lazy-metadata",
        "-q",
    ])
    .unwrap();

    assert_eq!(cli.credentials.user.as_deref(), Some("reader"));
    let config = cli.credentials.config(cli.global.quiet);
    assert!(!config.eager_metadata);
    assert!(!config.check_creds);
    assert!(!config.verbose);
    assert!(matches!(
        cli.command,
        Command::Randomize { ref columns, .. } if columns == &["id".to_string()]
    ));
}

#[test]
fn test_cli_rejects_bad_url() {
    let cli = Cli::try_parse_from(["tablechunk", "--url", "postgres://x@y/z", "tables"]).unwrap();
    assert!(cli.credentials.overrides().is_err());
}

#[test]
fn test_cli_requires_a_command() {
    assert!(Cli::try_parse_from(["tablechunk"]).is_err());
}
