use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{StorageError, TaskError};
use crate::parser::{ForgeryReport, OcrReport, Payload, QualityReport, ValidationReport};
use crate::runner::result::error_payload;
use crate::runner::{AnalysisResult, AnalysisTask, ProgramId, TaskExecutor};
use crate::sanitize;
use crate::scoring::{RiskAssessment, StageScores};
use crate::storage::FileStorage;

use super::error::{PipelineError, PipelineKind};
use super::progress::{PipelineEvent, PipelinePhase, ProgressReporter};
use super::request::{DocumentUpload, PipelineRequest};
use super::response::{DocumentOutcome, DocumentResponse, ForgeryRejection, FORGERY_NEXT_STEPS};

const KIND: PipelineKind = PipelineKind::Document;
const REMARKS: &str = "Processing completed successfully";

type StageResult = Result<AnalysisResult, TaskError>;

/// A spawned stage that is aborted if the pipeline stops waiting for it.
/// Aborting drops the executor future, which kills the subprocess.
struct StageHandle {
    program: ProgramId,
    handle: JoinHandle<StageResult>,
}

impl StageHandle {
    async fn payload(&mut self) -> Result<Payload, PipelineError> {
        match (&mut self.handle).await {
            Ok(Ok(result)) => Ok(result.into_stage_payload(self.program)),
            Ok(Err(e)) => Err(PipelineError::task(KIND, e)),
            Err(join_error) => {
                warn!("{} task did not complete: {}", self.program, join_error);
                Ok(error_payload(format!(
                    "{} did not complete",
                    self.program.stage_name()
                )))
            }
        }
    }
}

impl Drop for StageHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// OCR, then Quality, Forgery and Validation concurrently, then scoring.
pub struct DocumentPipeline {
    executor: Arc<dyn TaskExecutor>,
    storage: FileStorage,
    config: Arc<Config>,
}

impl DocumentPipeline {
    pub fn new(executor: Arc<dyn TaskExecutor>, config: Arc<Config>) -> Self {
        Self {
            executor,
            storage: FileStorage::new(),
            config,
        }
    }

    /// Validates and stores an upload, then runs it.
    pub async fn ingest(
        &self,
        upload: &DocumentUpload,
        progress: &dyn ProgressReporter,
    ) -> Result<DocumentOutcome, PipelineError> {
        upload.validate()?;

        let stored = tokio::task::spawn_blocking({
            let storage = self.storage.clone();
            let bytes = upload.bytes.clone();
            let directory = self.config.storage.document_directory.clone();
            let file_name = upload.file_name.clone();

            move || storage.save_file(&bytes, &directory, &file_name)
        })
        .await
        .map_err(StorageError::from)
        .and_then(|saved| saved)
        .map_err(|e| PipelineError::storage(KIND, e))?;

        let request = PipelineRequest::new(upload.lead_id.clone(), stored, upload.document_type);
        info!(
            request_id = %request.request_id,
            agent_id = %upload.agent_id,
            filename = %sanitize::redact_path(&request.file_path),
            "Document stored"
        );
        progress.report(PipelineEvent::new(
            &request.request_id,
            PipelinePhase::Stored,
            "Document stored",
        ));

        self.run(&request, progress).await
    }

    /// Runs the pipeline for a document already on disk.
    pub async fn run(
        &self,
        request: &PipelineRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<DocumentOutcome, PipelineError> {
        let span = info_span!("document_pipeline",
            request_id = %request.request_id,
            lead_id = %request.lead_id,
            filename = %sanitize::redact_path(&request.file_path),
        );

        let started = Instant::now();
        let result = self.run_stages(request, progress).instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(outcome) => info!(
                forgery = outcome.is_forgery(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Document pipeline finished"
            ),
            Err(e) => {
                error!("{}", e);
                progress.report(PipelineEvent::new(
                    &request.request_id,
                    PipelinePhase::Failed,
                    e.to_string(),
                ));
            }
        });
        result
    }

    async fn run_stages(
        &self,
        request: &PipelineRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<DocumentOutcome, PipelineError> {
        let request_id = request.request_id.as_str();
        let document_path = request.file_path.to_string_lossy().into_owned();

        progress.report(PipelineEvent::new(
            request_id,
            PipelinePhase::OcrRunning,
            "Running OCR extraction",
        ));
        let ocr_payload = self.step_ocr(&document_path).await?;
        let ocr = OcrReport::from_payload(&ocr_payload);
        let ocr_json_path = self.check_ocr(&ocr)?;
        progress.report(PipelineEvent::new(
            request_id,
            PipelinePhase::OcrDone,
            "OCR extraction complete",
        ));

        progress.report(PipelineEvent::new(
            request_id,
            PipelinePhase::Analyzing,
            "Running quality, forgery and validation analysis",
        ));
        let mut quality = self.spawn_stage(ProgramId::Quality, vec![document_path.clone()]);
        let mut forgery = self.spawn_stage(ProgramId::Forgery, vec![document_path.clone()]);
        let mut validation = self.spawn_stage(
            ProgramId::Validation,
            vec![document_path, ocr_json_path.to_string_lossy().into_owned()],
        );

        // Forgery decides whether there is anything to score.
        let forgery_payload = forgery.payload().await?;
        let forgery_report = ForgeryReport::from_payload(&forgery_payload);
        if forgery_report.is_forgery() {
            drop(quality);
            drop(validation);

            let conclusion = forgery_report.conclusion.clone().unwrap_or_default();
            warn!(
                confidence = forgery_report.confidence,
                "Forgery detected; remaining stages cancelled: {}", conclusion
            );
            progress.report(PipelineEvent::new(
                request_id,
                PipelinePhase::ForgeryDetected,
                conclusion.clone(),
            ));

            return Ok(DocumentOutcome::ForgeryDetected(ForgeryRejection {
                request_id: request.request_id.clone(),
                lead_id: request.lead_id.clone(),
                document_type: request.document_type,
                conclusion,
                forgery_confidence: forgery_report.confidence,
                next_steps: FORGERY_NEXT_STEPS.to_string(),
                ocr_results: ocr_payload,
                forgery_results: forgery_payload,
                processed_at: Utc::now(),
            }));
        }

        let (quality_payload, validation_payload) =
            tokio::join!(quality.payload(), validation.payload());
        let quality_payload = quality_payload?;
        let validation_payload = validation_payload?;

        progress.report(PipelineEvent::new(
            request_id,
            PipelinePhase::Aggregating,
            "Computing risk score",
        ));
        let scores = StageScores::from_reports(
            &ocr,
            &QualityReport::from_payload(&quality_payload),
            &forgery_report,
            &ValidationReport::from_payload(&validation_payload),
        );
        let assessment = RiskAssessment::assess(scores);
        info!(
            score = assessment.score,
            risk_level = assessment.band.as_str(),
            decision = assessment.decision.as_str(),
            "Document scored"
        );

        let archive_path = if self.config.storage.archive_processed {
            self.archive(&request.file_path).await
        } else {
            None
        };

        progress.report(PipelineEvent::new(
            request_id,
            PipelinePhase::Scored,
            format!("Risk level {}", assessment.band.as_str()),
        ));

        Ok(DocumentOutcome::Scored(DocumentResponse {
            document_id: Uuid::new_v4().to_string(),
            request_id: request.request_id.clone(),
            lead_id: request.lead_id.clone(),
            document_type: request.document_type,
            final_risk_score: assessment.score,
            risk_level: assessment.band,
            decision: assessment.decision,
            next_steps: assessment.band.next_steps().to_string(),
            remarks: REMARKS.to_string(),
            individual_scores: assessment.scores,
            ocr_results: ocr_payload,
            quality_results: quality_payload,
            forgery_results: forgery_payload,
            validation_results: validation_payload,
            processed_at: Utc::now(),
            archive_path,
        }))
    }

    async fn step_ocr(&self, document_path: &str) -> Result<Payload, PipelineError> {
        let task = AnalysisTask::new(
            ProgramId::Ocr,
            [document_path],
            self.config.execution.timeout_for(ProgramId::Ocr),
        );

        match self
            .executor
            .execute(task)
            .await
            .map_err(|e| PipelineError::task(KIND, e))?
        {
            AnalysisResult::Success { payload, .. } => Ok(payload),
            AnalysisResult::Timeout { after } => Err(PipelineError::ocr(format!(
                "OCR timed out after {}s",
                after.as_secs_f32()
            ))),
            AnalysisResult::Failure {
                exit_code, output, ..
            } => Err(PipelineError::ocr(format!(
                "OCR program exited with {}: {}",
                exit_code.map_or_else(|| "a signal".to_string(), |c| format!("code {}", c)),
                sanitize::truncate_for_log(&output, self.config.execution.max_logged_output)
            ))),
        }
    }

    /// Validation reads OCR's JSON file, so OCR must have produced one.
    fn check_ocr<'a>(&self, ocr: &'a OcrReport) -> Result<&'a Path, PipelineError> {
        if let Some(message) = &ocr.error {
            return Err(PipelineError::ocr(format!(
                "OCR program reported an error: {}",
                message
            )));
        }

        let path = ocr
            .ocr_json_path
            .as_deref()
            .ok_or_else(|| PipelineError::ocr("result has no ocr_json_path"))?;

        if !path.exists() {
            return Err(PipelineError::ocr(format!(
                "OCR output file not found: {}",
                sanitize::redact_path(path)
            )));
        }

        debug!(ocr_json = %sanitize::redact_path(path), "OCR output located");
        Ok(path)
    }

    fn spawn_stage(&self, program: ProgramId, args: Vec<String>) -> StageHandle {
        let executor = Arc::clone(&self.executor);
        let task = AnalysisTask::new(program, args, self.config.execution.timeout_for(program));
        let handle = tokio::spawn(
            async move { executor.execute(task).await }.instrument(Span::current()),
        );
        StageHandle { program, handle }
    }

    async fn archive(&self, document: &Path) -> Option<std::path::PathBuf> {
        let archived = tokio::task::spawn_blocking({
            let storage = self.storage.clone();
            let document = document.to_path_buf();
            let archive_directory = self.config.storage.archive_directory.clone();

            move || storage.archive(&document, &archive_directory)
        })
        .await
        .map_err(StorageError::from)
        .and_then(|moved| moved);

        match archived {
            Ok(path) => {
                info!(archive = %sanitize::redact_path(&path), "Document archived");
                Some(path)
            }
            Err(e) => {
                warn!("Archiving scored document failed: {}", e);
                None
            }
        }
    }
}
