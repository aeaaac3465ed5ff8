pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod runner;
pub mod sanitize;
pub mod scoring;
pub mod storage;
pub mod worker;

pub use config::{load_config, Config};
pub use error::{ConfigError, FraudscanError, Result, StorageError, TaskError, WorkerError};
pub use parser::{parse, Payload};
pub use pipeline::{
    AudioPipeline, AudioResponse, AudioUpload, DocumentOutcome, DocumentPipeline,
    DocumentResponse, DocumentType, DocumentUpload, PipelineError, PipelineRequest,
};
pub use runner::{AnalysisResult, AnalysisTask, ProgramId, TaskExecutor, TaskRunner};
pub use scoring::{compute_risk_score, Decision, RiskBand, StageScores};
pub use storage::FileStorage;
pub use worker::{Job, JobResult, WorkerPool};
