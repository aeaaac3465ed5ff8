use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The external analysis programs the orchestrator knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramId {
    Ocr,
    Quality,
    Forgery,
    Validation,
    LlmExtraction,
    AudioAnalysis,
}

impl ProgramId {
    pub const ALL: [ProgramId; 6] = [
        ProgramId::Ocr,
        ProgramId::Quality,
        ProgramId::Forgery,
        ProgramId::Validation,
        ProgramId::LlmExtraction,
        ProgramId::AudioAnalysis,
    ];

    /// Stage name used in logs and in degraded stage payloads.
    pub fn stage_name(&self) -> &'static str {
        match self {
            ProgramId::Ocr => "OCR Extraction",
            ProgramId::Quality => "Quality Analysis",
            ProgramId::Forgery => "Forgery Detection",
            ProgramId::Validation => "Document Validation",
            ProgramId::LlmExtraction => "LLM Extraction",
            ProgramId::AudioAnalysis => "Audio Analysis",
        }
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage_name())
    }
}

/// One invocation of an external program. Built per pipeline run and
/// consumed by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTask {
    program: ProgramId,
    args: Vec<String>,
    timeout: Duration,
}

impl AnalysisTask {
    pub fn new<I, S>(program: ProgramId, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program,
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_are_distinct() {
        let mut names: Vec<&str> = ProgramId::ALL.iter().map(|p| p.stage_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ProgramId::ALL.len());
    }

    #[test]
    fn test_display_matches_stage_name() {
        assert_eq!(ProgramId::Quality.to_string(), "Quality Analysis");
    }

    #[test]
    fn test_task_keeps_argument_order() {
        let task = AnalysisTask::new(
            ProgramId::Validation,
            ["/tmp/doc.png", "/tmp/ocr.json"],
            Duration::from_secs(10),
        );
        assert_eq!(task.program(), ProgramId::Validation);
        assert_eq!(task.args(), ["/tmp/doc.png", "/tmp/ocr.json"]);
        assert_eq!(task.timeout(), Duration::from_secs(10));
    }
}
