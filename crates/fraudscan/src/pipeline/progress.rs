use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Queued,
    Stored,
    OcrRunning,
    OcrDone,
    Analyzing,
    Aggregating,
    Scored,
    ForgeryDetected,
    LlmExtractionRunning,
    AudioAnalysisRunning,
    Completed,
    Failed,
}

impl PipelinePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelinePhase::Scored
                | PipelinePhase::ForgeryDetected
                | PipelinePhase::Completed
                | PipelinePhase::Failed
        )
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelinePhase::Queued => write!(f, "Queued"),
            PipelinePhase::Stored => write!(f, "Stored"),
            PipelinePhase::OcrRunning => write!(f, "Running OCR"),
            PipelinePhase::OcrDone => write!(f, "OCR done"),
            PipelinePhase::Analyzing => write!(f, "Analyzing"),
            PipelinePhase::Aggregating => write!(f, "Aggregating"),
            PipelinePhase::Scored => write!(f, "Scored"),
            PipelinePhase::ForgeryDetected => write!(f, "Forgery detected"),
            PipelinePhase::LlmExtractionRunning => write!(f, "Running LLM extraction"),
            PipelinePhase::AudioAnalysisRunning => write!(f, "Running audio analysis"),
            PipelinePhase::Completed => write!(f, "Completed"),
            PipelinePhase::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEvent {
    pub request_id: String,
    pub phase: PipelinePhase,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn new(request_id: &str, phase: PipelinePhase, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.to_string(),
            phase,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: PipelineEvent);
}

/// No-op reporter for unit tests and one-shot CLI runs.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: PipelineEvent) {}
}

/// Forwards events to a broadcast channel. Sending with no subscribers is
/// not an error.
pub struct BroadcastProgress {
    sender: Arc<broadcast::Sender<PipelineEvent>>,
}

impl BroadcastProgress {
    pub fn new(sender: Arc<broadcast::Sender<PipelineEvent>>) -> Self {
        Self { sender }
    }

    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<PipelineEvent>) {
        let (sender, receiver) = broadcast::channel(capacity);
        (Self::new(Arc::new(sender)), receiver)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: PipelineEvent) {
        let _ = self.sender.send(event);
    }
}

/// Collects events in memory.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phases(&self) -> Vec<PipelinePhase> {
        self.events
            .lock()
            .map(|events| events.iter().map(|e| e.phase).collect())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
