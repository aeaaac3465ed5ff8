use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::error::StorageError;
use crate::parser::{LlmExtractionReport, Payload, ERROR_KEY, RAW_OUTPUT_KEY};
use crate::runner::{AnalysisResult, AnalysisTask, ProgramId, TaskExecutor};
use crate::sanitize;
use crate::storage::FileStorage;

use super::error::{PipelineError, PipelineKind};
use super::progress::{PipelineEvent, PipelinePhase, ProgressReporter};
use super::request::{AudioRequest, AudioUpload};
use super::response::AudioResponse;

const KIND: PipelineKind = PipelineKind::Audio;
const STATUS_ERROR: &str = "error";
const STATUS_SUCCESS: &str = "success";

/// LLM extraction and audio analysis over a reference-call recording.
///
/// The two programs are independent, so they run concurrently. No risk
/// score is derived; the LLM stage's `overall_score` is passed through.
pub struct AudioPipeline {
    executor: Arc<dyn TaskExecutor>,
    storage: FileStorage,
    config: Arc<Config>,
}

impl AudioPipeline {
    pub fn new(executor: Arc<dyn TaskExecutor>, config: Arc<Config>) -> Self {
        Self {
            executor,
            storage: FileStorage::new(),
            config,
        }
    }

    pub async fn ingest(
        &self,
        upload: &AudioUpload,
        progress: &dyn ProgressReporter,
    ) -> Result<AudioResponse, PipelineError> {
        upload.validate()?;

        let stored = tokio::task::spawn_blocking({
            let storage = self.storage.clone();
            let bytes = upload.bytes.clone();
            let directory = self.config.storage.audio_directory.clone();
            let file_name = upload.stored_name();

            move || storage.save_as(&bytes, &directory, &file_name)
        })
        .await
        .map_err(StorageError::from)
        .and_then(|saved| saved)
        .map_err(|e| PipelineError::storage(KIND, e))?;

        let request = AudioRequest {
            request_id: upload.id.trim().to_string(),
            lead_id: upload.lead_id.clone(),
            agent_id: upload.agent_id.clone(),
            file_path: stored,
        };
        progress.report(PipelineEvent::new(
            &request.request_id,
            PipelinePhase::Stored,
            "Recording stored",
        ));

        self.run(&request, progress).await
    }

    pub async fn run(
        &self,
        request: &AudioRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<AudioResponse, PipelineError> {
        let span = info_span!("audio_pipeline",
            request_id = %request.request_id,
            lead_id = %request.lead_id,
            filename = %sanitize::redact_path(&request.file_path),
        );

        let started = Instant::now();
        let result = self.run_stages(request, progress).instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(response) => info!(
                status = %response.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Audio pipeline finished"
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
        request: &AudioRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<AudioResponse, PipelineError> {
        let args = [
            request.file_path.to_string_lossy().into_owned(),
            request.lead_id.clone(),
        ];

        progress.report(PipelineEvent::new(
            &request.request_id,
            PipelinePhase::LlmExtractionRunning,
            "Running LLM extraction",
        ));
        progress.report(PipelineEvent::new(
            &request.request_id,
            PipelinePhase::AudioAnalysisRunning,
            "Running audio analysis",
        ));

        let (llm, analysis) = tokio::join!(
            self.stage(ProgramId::LlmExtraction, &args),
            self.stage(ProgramId::AudioAnalysis, &args),
        );
        let (llm_ok, llm_payload) = llm?;
        let (_, audio_analysis) = analysis?;

        let report = if llm_ok && has_content(&llm_payload) {
            LlmExtractionReport::from_payload(&llm_payload)
        } else {
            warn!("LLM extraction returned no usable result");
            LlmExtractionReport {
                status: Some(STATUS_ERROR.to_string()),
                ..LlmExtractionReport::default()
            }
        };

        let status = report
            .status
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| STATUS_SUCCESS.to_string());
        info!(
            overall_score = report.overall_score,
            transcript_segments = report.transcript.len(),
            status = %status,
            "Reference call extracted"
        );

        progress.report(PipelineEvent::new(
            &request.request_id,
            PipelinePhase::Completed,
            format!("Status {}", status),
        ));

        Ok(AudioResponse {
            request_id: request.request_id.clone(),
            lead_id: request.lead_id.clone(),
            agent_id: request.agent_id.clone(),
            reference_name: report.reference_name,
            subject_name: report.subject_name,
            subject_address: report.subject_address,
            relation_to_subject: report.relation_to_subject,
            subject_occupation: report.subject_occupation,
            overall_score: report.overall_score,
            explanation: report.explanation,
            field_by_field_scores: report.field_by_field_scores,
            transcript: report.transcript,
            status,
            llm_extraction_results: llm_payload,
            audio_analysis,
            processed_at: Utc::now(),
        })
    }

    /// Runs one stage; the flag is false when the program failed or timed out.
    async fn stage(
        &self,
        program: ProgramId,
        args: &[String],
    ) -> Result<(bool, Payload), PipelineError> {
        let task = AnalysisTask::new(
            program,
            args.iter().cloned(),
            self.config.execution.timeout_for(program),
        );
        let result = self
            .executor
            .execute(task)
            .await
            .map_err(|e| PipelineError::task(KIND, e))?;

        let ok = matches!(result, AnalysisResult::Success { .. });
        Ok((ok, result.into_stage_payload(program)))
    }
}

/// Blank, unparseable or error-only output carries nothing to extract.
fn has_content(payload: &Payload) -> bool {
    payload
        .keys()
        .any(|key| key != RAW_OUTPUT_KEY && key != ERROR_KEY)
}
