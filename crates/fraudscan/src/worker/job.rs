use serde::Serialize;
use uuid::Uuid;

use crate::pipeline::{AudioResponse, AudioUpload, DocumentOutcome, DocumentUpload, PipelineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Document,
    Audio,
}

#[derive(Debug, Clone)]
pub enum JobWork {
    Document(DocumentUpload),
    Audio(AudioUpload),
}

/// An upload queued for background processing.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub work: JobWork,
}

impl Job {
    pub fn document(upload: DocumentUpload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            work: JobWork::Document(upload),
        }
    }

    pub fn audio(upload: AudioUpload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            work: JobWork::Audio(upload),
        }
    }

    pub fn kind(&self) -> JobKind {
        match self.work {
            JobWork::Document(_) => JobKind::Document,
            JobWork::Audio(_) => JobKind::Audio,
        }
    }

    pub fn lead_id(&self) -> &str {
        match &self.work {
            JobWork::Document(upload) => &upload.lead_id,
            JobWork::Audio(upload) => &upload.lead_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Processed,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobOutput {
    Document(DocumentOutcome),
    Audio(AudioResponse),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: String,
    pub kind: JobKind,
    pub lead_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JobOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn from_document(job: &Job, result: Result<DocumentOutcome, PipelineError>) -> Self {
        match result {
            Ok(outcome) => Self {
                job_id: job.id.clone(),
                kind: JobKind::Document,
                lead_id: job.lead_id().to_string(),
                status: if outcome.is_forgery() {
                    JobStatus::Rejected
                } else {
                    JobStatus::Processed
                },
                output: Some(JobOutput::Document(outcome)),
                error: None,
            },
            Err(e) => Self::failure(job, e.to_string()),
        }
    }

    /// An audio run that produced no extraction is reported as failed but
    /// still carries its response.
    pub fn from_audio(job: &Job, result: Result<AudioResponse, PipelineError>) -> Self {
        match result {
            Ok(response) => {
                let (status, error) = if response.is_error() {
                    (
                        JobStatus::Failed,
                        Some("LLM extraction produced no result".to_string()),
                    )
                } else {
                    (JobStatus::Processed, None)
                };
                Self {
                    job_id: job.id.clone(),
                    kind: JobKind::Audio,
                    lead_id: job.lead_id().to_string(),
                    status,
                    output: Some(JobOutput::Audio(response)),
                    error,
                }
            }
            Err(e) => Self::failure(job, e.to_string()),
        }
    }

    pub fn failure(job: &Job, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            kind: job.kind(),
            lead_id: job.lead_id().to_string(),
            status: JobStatus::Failed,
            output: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Processed
    }
}
