//! Progress event types and broadcast channel for harvest telemetry.
//!
//! The session emits `ProgressEvent`s as responses are handled; they flow
//! through a `tokio::sync::broadcast` channel to any subscriber (progress
//! bar, logs). When no subscriber exists, events are silently dropped.

use serde::{Deserialize, Serialize};

/// A progress event emitted during a harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// Dispatch is about to start.
    Started { total_terms: usize, concurrency: usize },
    /// The output schema was derived from the first feature.
    SchemaDeclared { fields: Vec<String> },
    /// A response parsed; `count` results were returned for `term`.
    TermCompleted { term: String, count: usize },
    /// A term produced no summary line (transport, service or parse failure).
    TermFailed {
        term: String,
        kind: String,
        message: String,
    },
    /// A single feature or record was skipped.
    FeatureSkipped {
        term: String,
        kind: String,
        message: String,
    },
    /// All responses have been handled.
    Finished {
        records_written: usize,
        summary_lines: usize,
        elapsed_ms: u64,
    },
}

impl ProgressEventKind {
    /// Whether this event accounts for one finished term.
    pub fn is_term_done(&self) -> bool {
        matches!(
            self,
            ProgressEventKind::TermCompleted { .. } | ProgressEventKind::TermFailed { .. }
        )
    }
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Emit a progress event, silently ignoring send errors
/// (which occur when no receivers are listening).
pub fn emit(tx: &Option<ProgressSender>, run_id: &str, seq: &mut u64, event: ProgressEventKind) {
    if let Some(ref sender) = tx {
        *seq += 1;
        let _ = sender.send(ProgressEvent {
            run_id: run_id.to_string(),
            seq: *seq,
            event,
        });
    }
}
