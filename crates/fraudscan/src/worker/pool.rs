use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::error::WorkerError;
use crate::pipeline::{
    AudioPipeline, BroadcastProgress, DocumentPipeline, NoopProgress, PipelineEvent,
    PipelinePhase, ProgressReporter,
};
use crate::worker::job::{Job, JobResult, JobWork};

/// Pipelines shared by every worker thread.
#[derive(Clone)]
pub struct Pipelines {
    pub document: Arc<DocumentPipeline>,
    pub audio: Arc<AudioPipeline>,
}

/// Background intake: a fixed set of OS threads pulling uploads off a
/// bounded queue and driving the async pipelines on a shared runtime.
///
/// The runtime handle must belong to a multi-threaded runtime; stage tasks
/// are spawned onto it while a worker blocks on the pipeline.
pub struct WorkerPool {
    job_sender: Sender<Job>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(pipelines: Pipelines, runtime: Handle, worker_count: usize) -> Self {
        Self::with_progress_sender(pipelines, runtime, worker_count, None)
    }

    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn with_progress_sender(
        pipelines: Pipelines,
        runtime: Handle,
        worker_count: usize,
        progress_sender: Option<Arc<broadcast::Sender<PipelineEvent>>>,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = bounded::<Job>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<JobResult>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let worker = Worker {
                id: worker_id,
                jobs: job_receiver.clone(),
                results: result_sender.clone(),
                shutdown: Arc::clone(&shutdown),
                pipelines: pipelines.clone(),
                runtime: runtime.clone(),
                progress_sender: progress_sender.clone(),
            };
            workers.push(thread::spawn(move || worker.run()));
        }

        info!("Started {} intake workers", worker_count);

        Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        }
    }

    /// Queues a job, blocking while the queue is full.
    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<JobResult> {
        self.result_receiver.recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<JobResult> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down intake workers...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn wait(self) {
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All intake workers have stopped");
    }
}

struct Worker {
    id: usize,
    jobs: Receiver<Job>,
    results: Sender<JobResult>,
    shutdown: Arc<AtomicBool>,
    pipelines: Pipelines,
    runtime: Handle,
    progress_sender: Option<Arc<broadcast::Sender<PipelineEvent>>>,
}

impl Worker {
    fn run(self) {
        debug!("Worker {} started", self.id);

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                debug!("Worker {} received shutdown signal", self.id);
                break;
            }

            match self.jobs.recv_timeout(Duration::from_millis(100)) {
                Ok(job) => {
                    debug!("Worker {} processing {:?} job {}", self.id, job.kind(), job.id);
                    let result = match &self.progress_sender {
                        Some(sender) => {
                            let progress = BroadcastProgress::new(Arc::clone(sender));
                            progress.report(PipelineEvent::new(
                                &job.id,
                                PipelinePhase::Queued,
                                "Job queued for processing",
                            ));
                            self.process(&job, &progress)
                        }
                        None => self.process(&job, &NoopProgress),
                    };

                    if let Err(e) = self.results.send(result) {
                        error!("Worker {} failed to send result: {}", self.id, e);
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Worker {} job channel disconnected", self.id);
                    break;
                }
            }
        }

        debug!("Worker {} stopped", self.id);
    }

    fn process(&self, job: &Job, progress: &dyn ProgressReporter) -> JobResult {
        match &job.work {
            JobWork::Document(upload) => {
                let outcome = self
                    .runtime
                    .block_on(self.pipelines.document.ingest(upload, progress));
                JobResult::from_document(job, outcome)
            }
            JobWork::Audio(upload) => {
                let response = self
                    .runtime
                    .block_on(self.pipelines.audio.ingest(upload, progress));
                JobResult::from_audio(job, response)
            }
        }
    }
}
