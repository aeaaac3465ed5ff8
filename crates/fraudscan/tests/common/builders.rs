//! Builders for test configs and fake program output.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::json;

use fraudscan::config::schema::{
    Config, ExecutionConfig, ProgramsConfig, StorageConfig, WorkersConfig,
};

/// Builder for `Config` instances rooted in a test directory.
pub struct ConfigBuilder {
    storage: StorageConfig,
    programs: ProgramsConfig,
    execution: ExecutionConfig,
    worker_count: usize,
}

impl ConfigBuilder {
    /// Defaults tuned for tests: `sh` interpreter, short timeouts, one worker.
    pub fn new(root: &Path) -> Self {
        Self {
            storage: StorageConfig {
                document_directory: root.join("storage").join("documents"),
                audio_directory: root.join("storage").join("audio"),
                archive_directory: root.join("storage").join("archive"),
                archive_processed: false,
            },
            programs: ProgramsConfig {
                scripts_directory: root.join("scripts"),
                interpreter: Some("sh".to_string()),
                ocr: "ocr.sh".to_string(),
                quality: "quality.sh".to_string(),
                forgery: "forgery.sh".to_string(),
                validation: "validation.sh".to_string(),
                llm_extraction: "llm_extraction.sh".to_string(),
                audio_analysis: "audio_analysis.sh".to_string(),
            },
            execution: ExecutionConfig {
                pool_size: 4,
                stage_timeout_secs: 5,
                ocr_timeout_secs: 5,
                audio_timeout_secs: 5,
                max_logged_output: 200,
            },
            worker_count: 1,
        }
    }

    pub fn scripts_directory(mut self, path: PathBuf) -> Self {
        self.programs.scripts_directory = path;
        self
    }

    pub fn stage_timeout_secs(mut self, secs: u64) -> Self {
        self.execution.stage_timeout_secs = secs;
        self
    }

    pub fn audio_timeout_secs(mut self, secs: u64) -> Self {
        self.execution.audio_timeout_secs = secs;
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.execution.pool_size = size;
        self
    }

    pub fn archive_processed(mut self, enabled: bool) -> Self {
        self.storage.archive_processed = enabled;
        self
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn build(self) -> Config {
        Config {
            storage: self.storage,
            programs: self.programs,
            execution: self.execution,
            workers: WorkersConfig {
                count: self.worker_count,
            },
            ..Config::default()
        }
    }
}

pub fn quality_output(score: f64) -> String {
    json!({ "overall_quality_score": score }).to_string()
}

pub fn forgery_output(confidence: f64, conclusion: &str) -> String {
    json!({
        "Detailed Insights": {
            "Overall Assessment": {
                "confidence": confidence,
                "conclusion": conclusion
            }
        }
    })
    .to_string()
}

pub fn validation_output(score: f64) -> String {
    json!({ "validation_results": { "overall_validation_score": score } }).to_string()
}

pub fn llm_extraction_output() -> String {
    json!({
        "extracted_result": {
            "reference_name": "Ravi Kumar",
            "subject_name": "Anita Sharma",
            "subject_address": "12 MG Road, Pune",
            "relation_to_subject": "Colleague",
            "subject_occupation": "Engineer"
        },
        "scoring_results": {
            "overall_score": 0.85,
            "explanation": { "name_match": "exact", "address_match": "partial" },
            "field_by_field_scores": { "subject_name": 1.0, "subject_address": 0.6 }
        },
        "transcript": [
            { "speaker": "agent", "text": "Do you know Anita Sharma?" },
            { "speaker": "reference", "text": "Yes, we work together." }
        ]
    })
    .to_string()
}
