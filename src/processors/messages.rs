use crate::error::RecordError;
use crate::utils::constants::MAX_STORED_DIAGNOSTICS;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Notification sent from the scan loop and parse tasks to the collector.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestrationMessage {
    ParseError {
        worker: usize,
        line: Vec<u8>,
        reason: RecordError,
    },
    ReadError {
        worker: usize,
        reason: String,
    },
    EndOfFile {
        worker: usize,
    },
}

impl OrchestrationMessage {
    pub fn worker(&self) -> usize {
        match self {
            OrchestrationMessage::ParseError { worker, .. }
            | OrchestrationMessage::ReadError { worker, .. }
            | OrchestrationMessage::EndOfFile { worker } => *worker,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, OrchestrationMessage::EndOfFile { .. })
    }
}

impl fmt::Display for OrchestrationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationMessage::ParseError {
                worker,
                line,
                reason,
            } => write!(
                f,
                "worker {}: unable to parse line '{}': {}",
                worker,
                String::from_utf8_lossy(line),
                reason
            ),
            OrchestrationMessage::ReadError { worker, reason } => {
                write!(f, "worker {}: read failed: {}", worker, reason)
            }
            OrchestrationMessage::EndOfFile { worker } => {
                write!(f, "worker {}: end of file", worker)
            }
        }
    }
}

/// Everything the collector saw during a run.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    /// The first messages received, up to a fixed cap
    pub messages: Vec<OrchestrationMessage>,
    pub parse_errors: u64,
    pub read_errors: u64,
    pub finished_workers: Vec<usize>,
}

impl DiagnosticLog {
    fn record(&mut self, message: OrchestrationMessage) {
        match &message {
            OrchestrationMessage::ParseError { .. } => {
                self.parse_errors += 1;
                warn!(%message, "Skipping record");
            }
            OrchestrationMessage::ReadError { .. } => {
                self.read_errors += 1;
                warn!(%message, "Retiring worker");
            }
            OrchestrationMessage::EndOfFile { worker } => {
                self.finished_workers.push(*worker);
                debug!(%message, "Worker finished");
            }
        }

        if self.messages.len() < MAX_STORED_DIAGNOSTICS {
            self.messages.push(message);
        }
    }

    pub fn error_count(&self) -> u64 {
        self.parse_errors + self.read_errors
    }
}

/// Single consumer loop; returns once every sender has been dropped.
pub async fn collect_messages(
    mut receiver: mpsc::Receiver<OrchestrationMessage>,
) -> DiagnosticLog {
    let mut log = DiagnosticLog::default();
    while let Some(message) = receiver.recv().await {
        log.record(message);
    }
    log
}
