//! Scripted executor for orchestration tests. No subprocesses are spawned.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::parser;
use crate::runner::{AnalysisResult, AnalysisTask, ProgramId, TaskExecutor};

#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Output(String),
    Timeout,
    Failure(i32, String),
    NotFound,
}

#[derive(Debug, Clone)]
pub(crate) struct Step {
    delay: Duration,
    outcome: Outcome,
}

impl Step {
    pub(crate) fn output(json: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Outcome::Output(json.to_string()),
        }
    }

    pub(crate) fn timeout() -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Outcome::Timeout,
        }
    }

    pub(crate) fn failure(code: i32, output: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Outcome::Failure(code, output.to_string()),
        }
    }

    pub(crate) fn not_found() -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Outcome::NotFound,
        }
    }

    pub(crate) fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Replays a fixed outcome per program and records start/finish order.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    steps: HashMap<ProgramId, Step>,
    events: Mutex<Vec<String>>,
    tasks: Mutex<Vec<AnalysisTask>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, program: ProgramId, step: Step) -> Self {
        self.steps.insert(program, step);
        self
    }

    /// `"start <program>"` / `"finish <program>"` entries in order.
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn started(&self, program: ProgramId) -> bool {
        self.events().contains(&format!("start {:?}", program))
    }

    pub(crate) fn finished(&self, program: ProgramId) -> bool {
        self.events().contains(&format!("finish {:?}", program))
    }

    pub(crate) fn task_for(&self, program: ProgramId) -> Option<AnalysisTask> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.program() == program)
            .cloned()
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn execute(&self, task: AnalysisTask) -> Result<AnalysisResult, TaskError> {
        let program = task.program();
        let step = self.steps.get(&program).cloned().unwrap_or_else(|| Step::output("{}"));

        if let Outcome::NotFound = step.outcome {
            return Err(TaskError::NotFound {
                program,
                path: PathBuf::from(format!("/missing/{:?}", program)),
            });
        }

        self.tasks.lock().unwrap().push(task.clone());
        self.events.lock().unwrap().push(format!("start {:?}", program));

        tokio::time::sleep(step.delay).await;

        let result = match step.outcome {
            Outcome::Output(raw) => AnalysisResult::Success {
                payload: parser::parse(&raw),
                elapsed: step.delay,
            },
            Outcome::Timeout => AnalysisResult::Timeout {
                after: task.timeout(),
            },
            Outcome::Failure(code, output) => AnalysisResult::Failure {
                exit_code: Some(code),
                output,
                elapsed: step.delay,
            },
            Outcome::NotFound => unreachable!(),
        };

        self.events.lock().unwrap().push(format!("finish {:?}", program));
        Ok(result)
    }
}
