use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::{Config, ProgramsConfig};
use crate::error::TaskError;
use crate::parser;
use crate::sanitize;

use super::{AnalysisResult, AnalysisTask, ProgramId};

/// Runs analysis tasks. The pipelines only see this trait, so tests can
/// substitute scripted executors for real subprocesses.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: AnalysisTask) -> Result<AnalysisResult, TaskError>;
}

/// Subprocess-backed executor with a fixed number of execution slots.
///
/// Built once at startup and shared behind an `Arc` by every pipeline, so
/// the slot count bounds subprocess fan-out across all concurrent requests.
pub struct TaskRunner {
    programs: ProgramsConfig,
    slots: Arc<Semaphore>,
    pool_size: usize,
    max_logged_output: usize,
}

impl TaskRunner {
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(programs: ProgramsConfig, pool_size: usize, max_logged_output: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        Self {
            programs,
            slots: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            max_logged_output,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.programs.clone(),
            config.execution.pool_size,
            config.execution.max_logged_output,
        )
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Slots not currently held by a running subprocess.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Stops accepting new tasks. Tasks already holding a slot run to completion.
    pub fn close(&self) {
        self.slots.close();
    }

    /// Resolves the on-disk location of a program's script.
    pub fn resolve(&self, program: ProgramId) -> Result<PathBuf, TaskError> {
        let path = self
            .programs
            .scripts_directory
            .join(self.programs.script_for(program));

        if path.is_file() {
            Ok(path)
        } else {
            Err(TaskError::NotFound { program, path })
        }
    }

    pub async fn run(&self, task: &AnalysisTask) -> Result<AnalysisResult, TaskError> {
        let program = task.program();
        let span = info_span!("analysis_task", program = %program);
        self.run_inner(task).instrument(span).await.map_err(|e| {
            warn!(program = %program, "Analysis task could not be started: {}", e);
            e
        })
    }

    async fn run_inner(&self, task: &AnalysisTask) -> Result<AnalysisResult, TaskError> {
        let program = task.program();
        let script = self.resolve(program)?;

        let _slot = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| TaskError::PoolClosed)?;

        let mut cmd = match &self.programs.interpreter {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(&script);
                cmd
            }
            None => Command::new(&script),
        };
        cmd.args(task.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let logged_args: Vec<String> = task
            .args()
            .iter()
            .map(|a| sanitize::redact_arg(a, 64))
            .collect();
        info!(
            script = %sanitize::redact_path(&script),
            args = ?logged_args,
            timeout_ms = task.timeout().as_millis() as u64,
            "Launching analysis program"
        );

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|source| TaskError::Spawn { program, source })?;
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let waited = tokio::time::timeout(task.timeout(), async {
            let mut out = Vec::new();
            let mut err = Vec::new();
            let (status, _, _) = tokio::join!(
                child.wait(),
                read_stream(stdout.as_mut(), &mut out),
                read_stream(stderr.as_mut(), &mut err),
            );
            status.map(|status| (status, out, err))
        })
        .await;

        let elapsed = started.elapsed();

        let (status, out, err) = match waited {
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out {}: {}", program, e);
                }
                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "{} timed out; subprocess killed", program
                );
                return Ok(AnalysisResult::Timeout { after: elapsed });
            }
            Ok(Err(e)) => {
                warn!("Waiting on {} failed: {}", program, e);
                return Ok(AnalysisResult::Failure {
                    exit_code: None,
                    output: e.to_string(),
                    elapsed,
                });
            }
            Ok(Ok(collected)) => collected,
        };

        let stdout_text = String::from_utf8_lossy(&out).trim().to_string();
        let stderr_text = String::from_utf8_lossy(&err).trim().to_string();

        if status.success() {
            info!(
                exit_code = 0,
                elapsed_ms = elapsed.as_millis() as u64,
                output = %sanitize::truncate_for_log(&stdout_text, self.max_logged_output),
                "Analysis program completed"
            );
            if !stderr_text.is_empty() {
                debug!(
                    stderr = %sanitize::truncate_for_log(&stderr_text, self.max_logged_output),
                    "Analysis program wrote to stderr"
                );
            }

            return Ok(AnalysisResult::Success {
                payload: parser::parse(&stdout_text),
                elapsed,
            });
        }

        let output = match (stdout_text.is_empty(), stderr_text.is_empty()) {
            (false, false) => format!("{}\n{}", stdout_text, stderr_text),
            (false, true) => stdout_text,
            (true, _) => stderr_text,
        };

        warn!(
            exit_code = ?status.code(),
            elapsed_ms = elapsed.as_millis() as u64,
            output = %sanitize::truncate_for_log(&output, self.max_logged_output),
            "Analysis program failed"
        );

        Ok(AnalysisResult::Failure {
            exit_code: status.code(),
            output,
            elapsed,
        })
    }
}

#[async_trait]
impl TaskExecutor for TaskRunner {
    async fn execute(&self, task: AnalysisTask) -> Result<AnalysisResult, TaskError> {
        self.run(&task).await
    }
}

async fn read_stream<R>(stream: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(stream) => stream.read_to_end(buf).await,
        None => Ok(0),
    }
}
