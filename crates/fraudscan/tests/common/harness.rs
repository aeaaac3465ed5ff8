//! Isolated environment for running the pipelines against real subprocesses.
//!
//! Every analysis program is a small `sh` script in a per-test scripts
//! directory, so tests exercise the production `TaskRunner` end to end.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use fraudscan::{
    AudioPipeline, AudioUpload, Config, DocumentPipeline, DocumentType, DocumentUpload,
    TaskExecutor, TaskRunner,
};

use super::builders::ConfigBuilder;

pub struct TestHarness {
    temp_dir: TempDir,
    pub scripts_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let scripts_dir = temp_dir.path().join("scripts");
        std::fs::create_dir_all(&scripts_dir).expect("Failed to create scripts dir");

        Self {
            temp_dir,
            scripts_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config builder whose directories all live inside this harness.
    pub fn config(&self) -> ConfigBuilder {
        ConfigBuilder::new(self.root()).scripts_directory(self.scripts_dir.clone())
    }

    /// Writes a fake program with the given shell body.
    pub fn program(&self, name: &str, body: &str) -> PathBuf {
        let path = self.scripts_dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))
            .expect("Failed to write fake program");
        path
    }

    /// Fake program that prints `output` verbatim and exits 0.
    pub fn json_program(&self, name: &str, output: &str) -> PathBuf {
        self.program(name, &format!("cat <<'JSON'\n{}\nJSON", output))
    }

    /// Fake program that sleeps in place of the shell so a kill reaches it.
    pub fn hanging_program(&self, name: &str, secs: u64) -> PathBuf {
        self.program(name, &format!("exec sleep {}", secs))
    }

    /// Fake OCR that writes its JSON next to the document and reports the
    /// extracted text plus the path of that file.
    pub fn ocr_program(&self, text: &str) -> PathBuf {
        let body = format!(
            r#"out="$1.ocr.json"
printf '{{"fields":{{}}}}' > "$out"
printf '{{"text":"%s","ocr_json_path":"%s"}}' '{}' "$out""#,
            text
        );
        self.program("ocr.sh", &body)
    }

    /// Fake validation that echoes its arguments, so tests can check what it
    /// was given.
    pub fn validation_program(&self, score: f64) -> PathBuf {
        let body = format!(
            r#"printf '{{"validation_results":{{"overall_validation_score":{}}},"args":["%s","%s"]}}' "$1" "$2""#,
            score
        );
        self.program("validation.sh", &body)
    }

    pub fn executor(config: &Config) -> Arc<dyn TaskExecutor> {
        Arc::new(TaskRunner::from_config(config))
    }

    pub fn document_pipeline(config: Config) -> DocumentPipeline {
        let executor = Self::executor(&config);
        DocumentPipeline::new(executor, Arc::new(config))
    }

    pub fn audio_pipeline(config: Config) -> AudioPipeline {
        let executor = Self::executor(&config);
        AudioPipeline::new(executor, Arc::new(config))
    }

    pub fn document_upload(&self, file_name: &str) -> DocumentUpload {
        DocumentUpload {
            lead_id: "lead-42".to_string(),
            agent_id: "agent-7".to_string(),
            document_type: DocumentType::Aadhaar,
            file_name: file_name.to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
        }
    }

    pub fn audio_upload(&self, id: &str) -> AudioUpload {
        AudioUpload {
            id: id.to_string(),
            lead_id: "lead-42".to_string(),
            agent_id: "agent-7".to_string(),
            file_name: "reference-call.mp3".to_string(),
            bytes: b"ID3\x03\x00".to_vec(),
        }
    }
}
