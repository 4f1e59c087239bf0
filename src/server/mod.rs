// src/server/mod.rs

//! HTTP side of hookrun.
//!
//! - [`handler`]: one `RouteHandler` per hook (method check, invocation,
//!   streamed response).
//! - [`dispatch`]: router assembly, liveness fallback, HTTP/HTTPS serving.
//! - [`pidfile`]: optional PID file for the running server.

pub mod dispatch;
pub mod handler;
pub mod pidfile;

pub use dispatch::{listen_address, liveness, serve, serve_tls, Dispatcher, TlsFiles};
pub use handler::RouteHandler;
pub use pidfile::PidFile;
