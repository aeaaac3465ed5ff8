use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::runner::ProgramId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub programs: ProgramsConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default = "default_document_types")]
    pub document_types: BTreeMap<String, String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_document_types() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("aadhaar".to_string(), "Aadhaar Card".to_string()),
        ("pan".to_string(), "PAN Card".to_string()),
    ])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            storage: StorageConfig::default(),
            programs: ProgramsConfig::default(),
            execution: ExecutionConfig::default(),
            workers: WorkersConfig::default(),
            document_types: default_document_types(),
        }
    }
}

impl Config {
    /// Human-readable label for a document type key, falling back to the key.
    pub fn document_label(&self, key: &str) -> String {
        self.document_types
            .get(&key.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_document_directory")]
    pub document_directory: PathBuf,
    #[serde(default = "default_audio_directory")]
    pub audio_directory: PathBuf,
    #[serde(default = "default_archive_directory")]
    pub archive_directory: PathBuf,
    #[serde(default)]
    pub archive_processed: bool,
}

fn default_document_directory() -> PathBuf {
    PathBuf::from("storage/documents")
}

fn default_audio_directory() -> PathBuf {
    PathBuf::from("storage/audio")
}

fn default_archive_directory() -> PathBuf {
    PathBuf::from("storage/documents/archive")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            document_directory: default_document_directory(),
            audio_directory: default_audio_directory(),
            archive_directory: default_archive_directory(),
            archive_processed: false,
        }
    }
}

/// Where the external analysis programs live and how to launch them.
///
/// With an `interpreter` set, each program is run as
/// `<interpreter> <scripts_directory>/<script> args...`; without one the
/// script itself must be executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramsConfig {
    #[serde(default = "default_scripts_directory")]
    pub scripts_directory: PathBuf,
    #[serde(default = "default_interpreter")]
    pub interpreter: Option<String>,
    #[serde(default = "default_ocr")]
    pub ocr: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default = "default_forgery")]
    pub forgery: String,
    #[serde(default = "default_validation")]
    pub validation: String,
    #[serde(default = "default_llm_extraction")]
    pub llm_extraction: String,
    #[serde(default = "default_audio_analysis")]
    pub audio_analysis: String,
}

fn default_scripts_directory() -> PathBuf {
    PathBuf::from("python_workflows")
}

fn default_interpreter() -> Option<String> {
    Some("python3".to_string())
}

fn default_ocr() -> String {
    "DocumentOcr.py".to_string()
}

fn default_quality() -> String {
    "DocumentQuality.py".to_string()
}

fn default_forgery() -> String {
    "DocumentForgery.py".to_string()
}

fn default_validation() -> String {
    "DocumentValidation.py".to_string()
}

fn default_llm_extraction() -> String {
    "LLMextractionvalidation.py".to_string()
}

fn default_audio_analysis() -> String {
    "AudioAnalysis.py".to_string()
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            scripts_directory: default_scripts_directory(),
            interpreter: default_interpreter(),
            ocr: default_ocr(),
            quality: default_quality(),
            forgery: default_forgery(),
            validation: default_validation(),
            llm_extraction: default_llm_extraction(),
            audio_analysis: default_audio_analysis(),
        }
    }
}

impl ProgramsConfig {
    pub fn script_for(&self, program: ProgramId) -> &str {
        match program {
            ProgramId::Ocr => &self.ocr,
            ProgramId::Quality => &self.quality,
            ProgramId::Forgery => &self.forgery,
            ProgramId::Validation => &self.validation,
            ProgramId::LlmExtraction => &self.llm_extraction,
            ProgramId::AudioAnalysis => &self.audio_analysis,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum number of analysis subprocesses alive at once.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Timeout for Quality, Forgery and Validation.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
    #[serde(default = "default_ocr_timeout_secs")]
    pub ocr_timeout_secs: u64,
    /// Timeout for LLM extraction and audio analysis.
    #[serde(default = "default_audio_timeout_secs")]
    pub audio_timeout_secs: u64,
    /// Characters of program output kept in log lines.
    #[serde(default = "default_max_logged_output")]
    pub max_logged_output: usize,
}

fn default_pool_size() -> usize {
    4
}

fn default_stage_timeout_secs() -> u64 {
    10
}

fn default_ocr_timeout_secs() -> u64 {
    30
}

fn default_audio_timeout_secs() -> u64 {
    120
}

fn default_max_logged_output() -> usize {
    500
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            stage_timeout_secs: default_stage_timeout_secs(),
            ocr_timeout_secs: default_ocr_timeout_secs(),
            audio_timeout_secs: default_audio_timeout_secs(),
            max_logged_output: default_max_logged_output(),
        }
    }
}

impl ExecutionConfig {
    pub fn timeout_for(&self, program: ProgramId) -> Duration {
        let secs = match program {
            ProgramId::Ocr => self.ocr_timeout_secs,
            ProgramId::Quality | ProgramId::Forgery | ProgramId::Validation => {
                self.stage_timeout_secs
            }
            ProgramId::LlmExtraction | ProgramId::AudioAnalysis => self.audio_timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    #[serde(default = "default_worker_count")]
    pub count: usize,
}

fn default_worker_count() -> usize {
    num_cpus::get().clamp(1, 4)
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}
