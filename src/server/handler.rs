// src/server/handler.rs

//! Per-hook HTTP handler: method check, command resolution, invocation.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{stream, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::exec::{
    ellipsis, CommandResolver, InputFailure, InvocationOutcome, ProcessInvoker, Resolution,
};
use crate::hooks::HookDefinition;

const RESPONSE_CHANNEL_CAPACITY: usize = 16;

/// Handles every request addressed to one hook's route.
///
/// Each handler owns a tracing span carrying the hook name and a correlation
/// token generated when the handler is built, so all log lines for a hook can
/// be told apart from other hooks and from earlier server runs.
#[derive(Debug)]
pub struct RouteHandler {
    hook: Arc<HookDefinition>,
    resolution: Resolution,
    invoker: Arc<ProcessInvoker>,
    tasks: TaskTracker,
    token: Uuid,
    span: Span,
    requests: AtomicU64,
}

impl RouteHandler {
    pub fn new(
        hook: Arc<HookDefinition>,
        resolver: &CommandResolver,
        invoker: Arc<ProcessInvoker>,
        tasks: TaskTracker,
    ) -> Self {
        let token = Uuid::new_v4();
        let span = info_span!("hook", name = %hook.name(), token = %token);
        // Definitions never change, so resolving once is the same as
        // resolving on every request.
        let resolution = resolver.resolve(&hook);

        Self {
            hook,
            resolution,
            invoker,
            tasks,
            token,
            span,
            requests: AtomicU64::new(0),
        }
    }

    pub fn hook(&self) -> &HookDefinition {
        &self.hook
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn correlation_token(&self) -> Uuid {
        self.token
    }

    pub async fn handle(&self, request: Request) -> Response {
        let seq = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        let span = info_span!(parent: &self.span, "request", seq);
        self.dispatch(request, span.clone()).instrument(span).await
    }

    async fn dispatch(&self, request: Request, span: Span) -> Response {
        if request.method() != Method::POST {
            info!(method = %request.method(), "method not allowed");
            discard(request.into_body()).await;
            return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n").into_response();
        }

        let Some(command) = self.resolution.command_line() else {
            debug!("hook has neither inline nor command; nothing to run");
            discard(request.into_body()).await;
            return StatusCode::OK.into_response();
        };

        let limit = self.invoker.options().summary_length;
        let shown = ellipsis(&command.to_string(), limit);
        info!(command = %shown, "executing command");

        let process = match self.invoker.spawn(command, self.hook.workdir()).await {
            Ok(process) => process,
            Err(err) => {
                error!(
                    command = %shown,
                    workdir = ?self.hook.workdir(),
                    error = %err,
                    "failed to start command"
                );
                discard(request.into_body()).await;
                return (StatusCode::INTERNAL_SERVER_ERROR, "failed to start command\n")
                    .into_response();
            }
        };

        let (tx, rx) = mpsc::channel::<Bytes>(RESPONSE_CHANNEL_CAPACITY);
        let input = request.into_body().into_data_stream();

        // The invocation owns the request body and outlives this function:
        // the response below streams while the child is still running.
        self.tasks.spawn(
            async move {
                let outcome = process.run(input, tx).await;
                log_outcome(&outcome);
            }
            .instrument(span),
        );

        Response::new(Body::from_stream(receiver_stream(rx)))
    }
}

fn receiver_stream(rx: mpsc::Receiver<Bytes>) -> impl Stream<Item = Result<Bytes, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    })
}

/// Read and throw away the rest of a request body.
async fn discard(body: Body) {
    let mut data = body.into_data_stream();
    while let Some(chunk) = data.next().await {
        if let Err(e) = chunk {
            debug!(error = %e, "request body ended early");
            break;
        }
    }
}

fn log_outcome(outcome: &InvocationOutcome) {
    match &outcome.input_failure {
        Some(InputFailure::Body(e)) => {
            warn!(error = %e, "request body ended early; command received partial input")
        }
        Some(InputFailure::Pipe(e)) => debug!(error = %e, "command did not read all of its input"),
        None => {}
    }

    if let Some(e) = &outcome.wait_error {
        error!(error = %e, "waiting for command failed");
    }

    if outcome.exit_code != 0 {
        warn!(exit_code = outcome.exit_code, "command failed");
    }

    match &outcome.summary {
        Some(summary) => info!(
            exit_code = outcome.exit_code,
            output_bytes = outcome.output_bytes,
            result = ?summary,
            "command finished"
        ),
        None => info!(
            exit_code = outcome.exit_code,
            output_bytes = outcome.output_bytes,
            "command finished"
        ),
    }
}
