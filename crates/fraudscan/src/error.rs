use std::path::PathBuf;
use thiserror::Error;

use crate::runner::ProgramId;

#[derive(Error, Debug)]
pub enum FraudscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("{0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Output(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Invalid file name: '{0}'")]
    InvalidFileName(String),

    #[error("Storage task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failures that prevent an external program from being run at all.
///
/// A program that runs and exits nonzero, or overruns its timeout, is not a
/// `TaskError`: those are reported through [`crate::runner::AnalysisResult`].
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Analysis program {program} not found at '{path}'")]
    NotFound { program: ProgramId, path: PathBuf },

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: ProgramId,
        #[source]
        source: std::io::Error,
    },

    #[error("Execution pool is closed")]
    PoolClosed,
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Job failed: {0}")]
    JobFailed(String),
}

pub type Result<T> = std::result::Result<T, FraudscanError>;
