use std::net::SocketAddr;

use anyhow::{Context, Result};
use hookrun::config::ConfigFile;
use hookrun::server::{serve, serve_tls, Dispatcher, TlsFiles};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A hookrun server on an ephemeral localhost port, running inside the
/// test's runtime.
pub struct TestServer {
    addr: SocketAddr,
    scheme: &'static str,
    dispatcher: Dispatcher,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl TestServer {
    pub async fn start(cfg: ConfigFile) -> Result<Self> {
        Self::launch(cfg, None).await
    }

    /// Same as [`TestServer::start`] but serving HTTPS with the given PEM
    /// files. URLs use the host name `localhost`.
    pub async fn start_tls(cfg: ConfigFile, tls: TlsFiles) -> Result<Self> {
        Self::launch(cfg, Some(tls)).await
    }

    async fn launch(cfg: ConfigFile, tls: Option<TlsFiles>) -> Result<Self> {
        let dispatcher = Dispatcher::from_config(&cfg)?;
        let router = dispatcher.router();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let shutdown = async move {
            let _ = rx.await;
        };
        let (scheme, handle) = match tls {
            Some(tls) => (
                "https",
                tokio::spawn(async move { serve_tls(listener, &tls, router, shutdown).await }),
            ),
            None => ("http", tokio::spawn(serve(listener, router, shutdown))),
        };

        Ok(Self {
            addr,
            scheme,
            dispatcher,
            shutdown: Some(tx),
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self, path: &str) -> String {
        match self.scheme {
            "https" => format!("https://localhost:{}{}", self.addr.port(), path),
            _ => format!("http://{}{}", self.addr, path),
        }
    }

    /// Processes spawned by this server so far.
    pub fn spawn_count(&self) -> u64 {
        self.dispatcher.invoker().spawn_count()
    }

    /// Stop accepting, let open responses finish, then wait for every
    /// invocation to reap its child and log its outcome.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.context("server task panicked")??;
        self.dispatcher.wait_for_invocations().await;
        Ok(())
    }
}
