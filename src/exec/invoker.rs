// src/exec/invoker.rs

//! Spawning a command and bridging its standard streams.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::config::SettingsSection;
use crate::errors::{HookrunError, Result};
use crate::exec::capture::OutputCapture;
use crate::exec::resolve::CommandLine;

const READ_BUFFER_SIZE: usize = 8 * 1024;
const OUTPUT_CHANNEL_CAPACITY: usize = 16;

/// Knobs for [`ProcessInvoker`].
#[derive(Debug, Clone, Copy)]
pub struct InvokerOptions {
    /// Keep a bounded prefix of the output for [`InvocationOutcome::summary`].
    pub capture_output: bool,
    /// Summary length in characters.
    pub summary_length: usize,
    /// Maximum number of live children; `None` is unbounded.
    pub max_concurrent: Option<usize>,
}

impl InvokerOptions {
    pub fn from_settings(settings: &SettingsSection) -> Self {
        Self {
            capture_output: settings.capture_output,
            summary_length: settings.summary_length,
            max_concurrent: settings.max_concurrent,
        }
    }
}

impl Default for InvokerOptions {
    fn default() -> Self {
        Self::from_settings(&SettingsSection::default())
    }
}

/// Why the request body did not fully reach the child's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFailure {
    /// Reading the request body failed (client went away mid-upload).
    Body(String),
    /// Writing to stdin failed, usually because the child closed it or
    /// exited without reading everything.
    Pipe(String),
}

/// Result of one finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Exit code, or `-1` if the child was killed by a signal or its status
    /// could not be read.
    pub exit_code: i32,
    /// Bytes the child wrote to stdout and stderr combined.
    pub output_bytes: u64,
    /// Truncated output, when capture is enabled.
    pub summary: Option<String>,
    pub input_failure: Option<InputFailure>,
    pub wait_error: Option<String>,
}

impl InvocationOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.wait_error.is_none()
    }
}

/// Spawns hook commands.
///
/// Shared by every route handler. Holds no per-request state apart from an
/// atomic spawn counter and, if configured, a semaphore bounding the number
/// of live children.
#[derive(Debug)]
pub struct ProcessInvoker {
    options: InvokerOptions,
    limiter: Option<Arc<Semaphore>>,
    spawned: AtomicU64,
}

impl ProcessInvoker {
    pub fn new(options: InvokerOptions) -> Self {
        Self {
            options,
            limiter: options.max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
            spawned: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &SettingsSection) -> Self {
        Self::new(InvokerOptions::from_settings(settings))
    }

    pub fn options(&self) -> &InvokerOptions {
        &self.options
    }

    /// Number of child processes started so far.
    pub fn spawn_count(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Start `command` with all three standard streams piped.
    ///
    /// The environment is inherited unchanged. When a concurrency cap is set
    /// this waits for a free slot first; the slot is held until the returned
    /// process has been run to completion.
    pub async fn spawn(&self, command: &CommandLine, workdir: Option<&Path>) -> Result<RunningProcess> {
        let permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(anyhow::Error::from)?,
            ),
            None => None,
        };

        let mut cmd = Command::new(command.program());
        cmd.args(command.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| HookrunError::Spawn {
            program: command.program().to_string(),
            source,
        })?;

        let total = self.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(pid = child.id(), spawned_total = total, "child process started");

        let capture = self
            .options
            .capture_output
            .then(|| OutputCapture::new(self.options.summary_length));

        Ok(RunningProcess {
            child,
            capture,
            _permit: permit,
        })
    }

    /// Spawn and run to completion in one call.
    pub async fn invoke<S, E>(
        &self,
        command: &CommandLine,
        workdir: Option<&Path>,
        input: S,
        sink: mpsc::Sender<Bytes>,
    ) -> Result<InvocationOutcome>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send,
        E: std::fmt::Display + Send,
    {
        let process = self.spawn(command, workdir).await?;
        Ok(process.run(input, sink).await)
    }
}

/// A spawned child whose streams have not been wired yet.
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    capture: Option<OutputCapture>,
    _permit: Option<OwnedSemaphorePermit>,
}

impl RunningProcess {
    /// Feed `input` to stdin, forward stdout and stderr to `sink`, then wait
    /// for the child to exit.
    ///
    /// Feeding and forwarding run concurrently, so a child that writes a lot
    /// before reading its input cannot stall on a full pipe. If `sink` is
    /// closed (the client disconnected) output is still drained and captured
    /// and the child is still awaited; it is never killed.
    pub async fn run<S, E>(mut self, input: S, sink: mpsc::Sender<Bytes>) -> InvocationOutcome
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send,
        E: std::fmt::Display + Send,
    {
        let stdin = self.child.stdin.take();

        let (chunk_tx, mut chunk_rx) = mpsc::channel::<Bytes>(OUTPUT_CHANNEL_CAPACITY);
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = self.child.stdout.take() {
            readers.push(tokio::spawn(pump(stdout, chunk_tx.clone())));
        }
        if let Some(stderr) = self.child.stderr.take() {
            readers.push(tokio::spawn(pump(stderr, chunk_tx.clone())));
        }
        drop(chunk_tx);

        let mut capture = self.capture.take();
        let forward = async {
            let mut sink = Some(sink);
            let mut total = 0u64;
            while let Some(chunk) = chunk_rx.recv().await {
                total += chunk.len() as u64;
                if let Some(capture) = capture.as_mut() {
                    capture.push(&chunk);
                }
                if let Some(tx) = &sink {
                    if tx.send(chunk).await.is_err() {
                        debug!("response body dropped; draining remaining output");
                        sink = None;
                    }
                }
            }
            total
        };

        let (input_failure, output_bytes) = tokio::join!(feed_stdin(stdin, input), forward);

        for reader in readers {
            let _ = reader.await;
        }

        let (exit_code, wait_error) = match self.child.wait().await {
            Ok(status) => (status.code().unwrap_or(-1), None),
            Err(e) => (-1, Some(e.to_string())),
        };

        InvocationOutcome {
            exit_code,
            output_bytes,
            summary: capture.map(|c| c.summary()),
            input_failure,
            wait_error,
        }
    }
}

/// Copy `input` into the child's stdin, then close it.
///
/// After a write failure the rest of the body is still read and discarded so
/// the connection is left in a clean state.
async fn feed_stdin<S, E>(stdin: Option<ChildStdin>, input: S) -> Option<InputFailure>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut input = std::pin::pin!(input);
    let mut pipe = stdin;
    let mut failure = None;

    while let Some(next) = input.next().await {
        match next {
            Ok(chunk) => {
                let Some(writer) = pipe.as_mut() else {
                    continue;
                };
                if let Err(e) = writer.write_all(&chunk).await {
                    failure = Some(InputFailure::Pipe(e.to_string()));
                    pipe = None;
                }
            }
            Err(e) => {
                failure = Some(InputFailure::Body(e.to_string()));
                break;
            }
        }
    }

    // Dropping the handle closes the write end, so the child sees EOF.
    drop(pipe);
    failure
}

async fn pump<R>(mut reader: R, tx: mpsc::Sender<Bytes>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "reading child output failed");
                break;
            }
        }
    }
}
