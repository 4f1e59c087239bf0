// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `hookrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hookrun",
    version,
    about = "Run configured commands when their HTTP hook is POSTed to.",
    long_about = None
)]
pub struct CliArgs {
    /// Address to listen on. `:8080` listens on every interface.
    #[arg(short = 'a', long, value_name = "ADDR", default_value = ":8080")]
    pub addr: String,

    /// Path to the TOML file containing the hook definitions.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: PathBuf,

    /// Create a PID file at the given path; removed on shutdown.
    #[arg(long = "pid", value_name = "PATH")]
    pub pid: Option<PathBuf>,

    /// Serve HTTPS instead of HTTP.
    #[arg(long, requires_all = ["tls_key", "tls_cert"])]
    pub tls: bool,

    /// Path to the private key PEM file for HTTPS.
    #[arg(long = "tls-key", value_name = "PATH")]
    pub tls_key: Option<PathBuf>,

    /// Path to the certificate PEM file for HTTPS.
    #[arg(long = "tls-cert", value_name = "PATH")]
    pub tls_cert: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HOOKRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the hook file, print the routes, but don't serve.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
