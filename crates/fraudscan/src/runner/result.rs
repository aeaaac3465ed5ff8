use std::time::Duration;

use serde_json::json;

use crate::parser::{Payload, ERROR_KEY};

use super::ProgramId;

/// Outcome of one analysis task. Success always carries a parsed payload;
/// raw program output never reaches the orchestrator unparsed.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Success {
        payload: Payload,
        elapsed: Duration,
    },
    Failure {
        exit_code: Option<i32>,
        output: String,
        elapsed: Duration,
    },
    Timeout {
        after: Duration,
    },
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Success { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AnalysisResult::Timeout { .. })
    }

    /// Collapses the result into the stage payload recorded for audit.
    ///
    /// Failures and timeouts become an `{"error": ...}` payload so every stage
    /// is always represented, and scoring reads their absent fields as zero.
    pub fn into_stage_payload(self, program: ProgramId) -> Payload {
        match self {
            AnalysisResult::Success { payload, .. } => payload,
            AnalysisResult::Timeout { .. } => {
                error_payload(format!("{} timed out", program.stage_name()))
            }
            AnalysisResult::Failure {
                exit_code, output, ..
            } => {
                let mut payload = error_payload(match exit_code {
                    Some(code) => format!("{} failed with exit code {}", program.stage_name(), code),
                    None => format!("{} terminated by signal", program.stage_name()),
                });
                if !output.is_empty() {
                    payload.insert("output".to_string(), json!(output));
                }
                payload
            }
        }
    }
}

pub(crate) fn error_payload(message: String) -> Payload {
    let mut payload = Payload::new();
    payload.insert(ERROR_KEY.to_string(), json!(message));
    payload
}
