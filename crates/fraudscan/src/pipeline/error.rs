use std::fmt;

use thiserror::Error;

use crate::error::{StorageError, TaskError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Document,
    Audio,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Document => f.write_str("Document"),
            PipelineKind::Audio => f.write_str("Audio"),
        }
    }
}

/// Fatal pipeline conditions. Anything recoverable is recorded in the stage
/// payloads instead and never reaches this type.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{kind} processing failed: could not store upload: {source}")]
    Storage {
        kind: PipelineKind,
        #[source]
        source: StorageError,
    },

    #[error("{kind} processing failed: {source}")]
    TaskNotFound {
        kind: PipelineKind,
        #[source]
        source: TaskError,
    },

    #[error("{kind} processing failed: {source}")]
    Task {
        kind: PipelineKind,
        #[source]
        source: TaskError,
    },

    #[error("Document processing failed: OCR extraction failed: {reason}")]
    OcrExtractionFailed { reason: String },

    #[error("{kind} processing failed: invalid request: {reason}")]
    InvalidRequest { kind: PipelineKind, reason: String },
}

impl PipelineError {
    pub fn storage(kind: PipelineKind, source: StorageError) -> Self {
        PipelineError::Storage { kind, source }
    }

    /// Classifies an executor error; a missing program is a misconfiguration
    /// and gets its own variant.
    pub fn task(kind: PipelineKind, source: TaskError) -> Self {
        match source {
            TaskError::NotFound { .. } => PipelineError::TaskNotFound { kind, source },
            other => PipelineError::Task {
                kind,
                source: other,
            },
        }
    }

    pub fn ocr(reason: impl Into<String>) -> Self {
        PipelineError::OcrExtractionFailed {
            reason: reason.into(),
        }
    }

    pub fn invalid(kind: PipelineKind, reason: impl Into<String>) -> Self {
        PipelineError::InvalidRequest {
            kind,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> PipelineKind {
        match self {
            PipelineError::Storage { kind, .. }
            | PipelineError::TaskNotFound { kind, .. }
            | PipelineError::Task { kind, .. }
            | PipelineError::InvalidRequest { kind, .. } => *kind,
            PipelineError::OcrExtractionFailed { .. } => PipelineKind::Document,
        }
    }
}
