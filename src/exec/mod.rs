// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`resolve`] turns a hook definition into an argument vector.
//! - [`invoker`] spawns the command with `tokio::process::Command`, feeds the
//!   request body to stdin and forwards stdout/stderr to a sink.
//! - [`capture`] keeps a bounded prefix of the output for logging.

pub mod capture;
pub mod invoker;
pub mod resolve;

pub use capture::{ellipsis, OutputCapture};
pub use invoker::{InputFailure, InvocationOutcome, InvokerOptions, ProcessInvoker, RunningProcess};
pub use resolve::{tokenize, CommandLine, CommandResolver, Resolution};
