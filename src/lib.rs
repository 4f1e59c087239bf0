// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod hooks;
pub mod logging;
pub mod server;
pub mod types;

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::exec::Resolution;
use crate::server::{listen_address, serve, serve_tls, Dispatcher, PidFile, TlsFiles};

/// How long in-flight invocations may keep running after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - hook file loading
/// - registry / route handlers / router
/// - optional PID file
/// - HTTP or HTTPS serving
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.file)
        .with_context(|| format!("loading hooks from {:?}", args.file))?;

    let dispatcher = Dispatcher::from_config(&cfg)?;

    if args.dry_run {
        print_dry_run(&dispatcher);
        return Ok(());
    }

    let router = dispatcher.router();

    let _pid_file = args
        .pid
        .as_ref()
        .map(PidFile::create)
        .transpose()
        .context("writing pid file")?;

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received; no longer accepting connections");
        let _ = stop_tx.send(true);
    });

    let addr = listen_address(&args.addr);
    let graceful = stopped(stop_rx.clone());
    let server = async {
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding to {addr}"))?;
        if args.tls {
            let tls = TlsFiles {
                cert: args.tls_cert.clone().context("--tls requires --tls-cert")?,
                key: args.tls_key.clone().context("--tls requires --tls-key")?,
            };
            serve_tls(listener, &tls, router, graceful).await?;
        } else {
            serve(listener, router, graceful).await?;
        }
        // Responses have ended; children may still be exiting.
        dispatcher.wait_for_invocations().await;
        Ok::<(), anyhow::Error>(())
    };

    let deadline = async {
        stopped(stop_rx).await;
        tokio::time::sleep(SHUTDOWN_GRACE).await;
    };

    tokio::select! {
        res = server => res?,
        _ = deadline => {
            warn!(grace = ?SHUTDOWN_GRACE, "invocations still running after grace period; exiting anyway");
        }
    }

    info!(spawned = dispatcher.invoker().spawn_count(), "server stopped");
    Ok(())
}

async fn stopped(mut rx: watch::Receiver<bool>) {
    // An error means the sender is gone, which only happens after it fired.
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Completes on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print every route and what it would run.
fn print_dry_run(dispatcher: &Dispatcher) {
    println!("hookrun dry-run");
    println!("routes ({}):", dispatcher.handlers().len());
    for handler in dispatcher.handlers() {
        let hook = handler.hook();
        println!("  POST {}", hook.route());
        match handler.resolution() {
            Resolution::Inline(cmd) => println!("      inline: {:?}", cmd.argv()),
            Resolution::External(cmd) => println!("      command: {:?}", cmd.argv()),
            Resolution::NoOp => println!("      (no command; requests are accepted and ignored)"),
        }
        if let Some(dir) = hook.workdir() {
            println!("      workdir: {}", dir.display());
        }
    }
    println!("  *    / (liveness, replies OK)");

    debug!("dry-run complete (no server started)");
}
