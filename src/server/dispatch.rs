// src/server/dispatch.rs

//! Router assembly and the HTTP / HTTPS accept loops.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::routing::any;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::exec::{CommandResolver, ProcessInvoker};
use crate::hooks::HookRegistry;
use crate::server::handler::RouteHandler;

/// Owns one [`RouteHandler`] per registered hook.
#[derive(Debug)]
pub struct Dispatcher {
    registry: HookRegistry,
    handlers: Vec<Arc<RouteHandler>>,
    invoker: Arc<ProcessInvoker>,
    invocations: TaskTracker,
}

impl Dispatcher {
    pub fn new(
        registry: HookRegistry,
        resolver: &CommandResolver,
        invoker: Arc<ProcessInvoker>,
    ) -> Self {
        let invocations = TaskTracker::new();
        let handlers = registry
            .iter()
            .map(|(_, hook)| {
                Arc::new(RouteHandler::new(
                    hook.clone(),
                    resolver,
                    invoker.clone(),
                    invocations.clone(),
                ))
            })
            .collect();

        Self {
            registry,
            handlers,
            invoker,
            invocations,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> crate::errors::Result<Self> {
        let registry = HookRegistry::from_config(cfg)?;
        let resolver = CommandResolver::from_settings(&cfg.settings);
        let invoker = Arc::new(ProcessInvoker::from_settings(&cfg.settings));
        Ok(Self::new(registry, &resolver, invoker))
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn handlers(&self) -> &[Arc<RouteHandler>] {
        &self.handlers
    }

    pub fn invoker(&self) -> &Arc<ProcessInvoker> {
        &self.invoker
    }

    /// Wait until every invocation started so far has reaped its child and
    /// logged its outcome. New invocations are not expected afterwards.
    pub async fn wait_for_invocations(&self) {
        self.invocations.close();
        debug!(pending = self.invocations.len(), "waiting for running invocations");
        self.invocations.wait().await;
    }

    /// Build the axum router: every hook at its route (any method, the
    /// handler rejects non-POST itself) and a liveness fallback for
    /// everything else.
    pub fn router(&self) -> Router {
        let mut router = Router::new();
        for handler in self.handlers.iter() {
            let route = handler.hook().route().to_string();
            info!(
                hook = %handler.hook().name(),
                route = %route,
                token = %handler.correlation_token(),
                "registered hook"
            );

            let handler = handler.clone();
            router = router.route(
                &route,
                any(move |request: Request| {
                    let handler = handler.clone();
                    async move { handler.handle(request).await }
                }),
            );
        }
        router.fallback(liveness)
    }
}

/// Answers `OK` to anything that is not a hook route.
pub async fn liveness() -> &'static str {
    "OK"
}

/// Certificate and private key, both PEM encoded.
#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Expand a Go-style `:port` address to listen on every interface.
pub fn listen_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Serve plain HTTP on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener.local_addr().ok();
    info!(addr = ?local, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server exited")?;
    Ok(())
}

/// Serve HTTPS on an already bound listener until `shutdown` resolves.
pub async fn serve_tls<F>(
    listener: TcpListener,
    tls: &TlsFiles,
    router: Router,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    // Both rustls backends can end up compiled in; name one explicitly.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
        .await
        .with_context(|| format!("loading TLS certificate {:?} and key {:?}", tls.cert, tls.key))?;

    let local = listener.local_addr().ok();
    let listener = listener
        .into_std()
        .context("converting listener for the TLS server")?;

    let handle = axum_server::Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown.await;
            handle.graceful_shutdown(None);
        }
    });

    info!(addr = ?local, "listening with secured connection");
    axum_server::from_tcp_rustls(listener, config)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .context("https server exited")?;
    Ok(())
}
