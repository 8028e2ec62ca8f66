//! Isolated generation worker
//!
//! A worker runs one generation on its own thread with its own session.
//! Requests and messages cross the boundary as JSON strings, so the same
//! protocol works over any byte transport.

use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::session::{GenerateOutput, Session};
use crate::tree::{CancellationToken, Hooks, StructureConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub root_path: PathBuf,
    pub config: StructureConfig,
}

/// Messages posted by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum WorkerMessage {
    Progress {
        increment: usize,
        message: String,
    },
    Result {
        text: String,
        total_items: usize,
        duration_ms: u64,
    },
    Error {
        message: String,
        kind: WorkerErrorKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
}

/// Which [`GenerateError`] a worker error message stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerErrorKind {
    Cancelled,
    RootNotFound,
    NotADirectory,
    Io,
    Other,
}

impl WorkerMessage {
    fn from_error(error: &GenerateError) -> Self {
        let kind = match error {
            GenerateError::Cancelled => WorkerErrorKind::Cancelled,
            GenerateError::RootNotFound(_) => WorkerErrorKind::RootNotFound,
            GenerateError::NotADirectory(_) => WorkerErrorKind::NotADirectory,
            GenerateError::Io { .. } => WorkerErrorKind::Io,
            _ => WorkerErrorKind::Other,
        };
        WorkerMessage::Error {
            message: error.to_string(),
            kind,
            path: error.path().cloned(),
        }
    }
}

/// Rebuild the caller-side error from a worker error message.
fn into_error(message: String, kind: WorkerErrorKind, path: Option<PathBuf>) -> GenerateError {
    match (kind, path) {
        (WorkerErrorKind::Cancelled, _) => GenerateError::Cancelled,
        (WorkerErrorKind::RootNotFound, Some(path)) => GenerateError::RootNotFound(path),
        (WorkerErrorKind::NotADirectory, Some(path)) => GenerateError::NotADirectory(path),
        (WorkerErrorKind::Io, Some(path)) => GenerateError::Io {
            path,
            source: io::Error::other(message),
        },
        _ => GenerateError::Worker(message),
    }
}

/// Caller's side of a running worker.
pub struct WorkerHandle {
    receiver: Receiver<String>,
    token: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

/// Start a worker for `request`.
pub fn spawn(request: &WorkerRequest) -> Result<WorkerHandle, GenerateError> {
    let payload = serde_json::to_string(request)?;
    let (sender, receiver) = crossbeam_channel::unbounded();
    let token = CancellationToken::new();
    let worker_token = token.clone();

    let thread = thread::Builder::new()
        .name("treescribe-worker".into())
        .spawn(move || run_worker(&payload, &sender, &worker_token))
        .map_err(|e| GenerateError::Worker(e.to_string()))?;

    Ok(WorkerHandle {
        receiver,
        token,
        thread: Some(thread),
    })
}

fn run_worker(payload: &str, sender: &Sender<String>, token: &CancellationToken) {
    let message = match execute(payload, sender, token) {
        Ok(output) => WorkerMessage::Result {
            text: output.text,
            total_items: output.total_items,
            duration_ms: output.duration.as_millis() as u64,
        },
        Err(e) => WorkerMessage::from_error(&e),
    };
    post(sender, &message);
}

fn execute(
    payload: &str,
    sender: &Sender<String>,
    token: &CancellationToken,
) -> Result<GenerateOutput, GenerateError> {
    let request: WorkerRequest = serde_json::from_str(payload)?;
    tracing::debug!(root = %request.root_path.display(), "worker started");

    let progress = sender.clone();
    let hooks = Hooks::new()
        .with_token(token)
        .on_progress(move |increment, message| {
            post(
                &progress,
                &WorkerMessage::Progress {
                    increment,
                    message: message.to_string(),
                },
            );
        });
    Session::new().generate(&request.root_path, &request.config, hooks)
}

fn post(sender: &Sender<String>, message: &WorkerMessage) {
    match serde_json::to_string(message) {
        // A send error means the handle was dropped; nobody is listening.
        Ok(json) => {
            let _ = sender.send(json);
        }
        Err(e) => tracing::warn!(error = %e, "failed to encode worker message"),
    }
}

impl WorkerHandle {
    /// Next decoded message, or `None` once the worker has exited.
    pub fn recv(&self) -> Option<Result<WorkerMessage, GenerateError>> {
        let json = self.receiver.recv().ok()?;
        Some(serde_json::from_str(&json).map_err(|e| GenerateError::Worker(e.to_string())))
    }

    /// Ask the worker to stop at its next directory boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Drain messages until the result arrives, forwarding progress.
    pub fn wait<F>(mut self, mut on_progress: F) -> Result<GenerateOutput, GenerateError>
    where
        F: FnMut(usize, &str),
    {
        while let Some(message) = self.recv() {
            match message? {
                WorkerMessage::Progress { increment, message } => on_progress(increment, &message),
                WorkerMessage::Result {
                    text,
                    total_items,
                    duration_ms,
                } => {
                    self.join();
                    return Ok(GenerateOutput {
                        text,
                        total_items,
                        duration: Duration::from_millis(duration_ms),
                    });
                }
                WorkerMessage::Error {
                    message,
                    kind,
                    path,
                } => {
                    self.join();
                    return Err(into_error(message, kind, path));
                }
            }
        }
        self.join();
        Err(GenerateError::Worker(
            "worker exited without a result".to_string(),
        ))
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("worker thread panicked");
            }
        }
    }
}
