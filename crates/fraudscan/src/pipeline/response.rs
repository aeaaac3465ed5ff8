use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::parser::Payload;
use crate::scoring::{Decision, RiskBand, StageScores};

use super::request::DocumentType;

pub const FORGERY_NEXT_STEPS: &str = "Reject document and flag lead for manual fraud review";

/// Result of a scored document run, handed to the caller for persistence.
///
/// Field names are the persistence boundary and must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub document_id: String,
    pub request_id: String,
    pub lead_id: String,
    pub document_type: DocumentType,
    pub final_risk_score: f64,
    pub risk_level: RiskBand,
    pub decision: Decision,
    pub next_steps: String,
    pub remarks: String,
    pub individual_scores: StageScores,
    pub ocr_results: Payload,
    pub quality_results: Payload,
    pub forgery_results: Payload,
    pub validation_results: Payload,
    pub processed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<PathBuf>,
}

impl DocumentResponse {
    /// Summary row shown on a lead's dashboard.
    pub fn insights(&self, config: &Config) -> DocumentInsights {
        DocumentInsights {
            lead_id: self.lead_id.clone(),
            document_type: self.document_type,
            document_name: config.document_label(self.document_type.as_str()),
            status: "PROCESSED".to_string(),
            score: self.final_risk_score,
            description: self.decision.as_str().to_string(),
            uploaded_at: self.processed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInsights {
    pub lead_id: String,
    pub document_type: DocumentType,
    pub document_name: String,
    pub status: String,
    pub score: f64,
    pub description: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Early termination because the forgery stage concluded forgery. No score
/// is computed for these documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgeryRejection {
    pub request_id: String,
    pub lead_id: String,
    pub document_type: DocumentType,
    pub conclusion: String,
    pub forgery_confidence: f64,
    pub next_steps: String,
    pub ocr_results: Payload,
    pub forgery_results: Payload,
    pub processed_at: DateTime<Utc>,
}

/// Terminal outcome of a document run that did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Scored(DocumentResponse),
    ForgeryDetected(ForgeryRejection),
}

impl DocumentOutcome {
    pub fn request_id(&self) -> &str {
        match self {
            DocumentOutcome::Scored(response) => &response.request_id,
            DocumentOutcome::ForgeryDetected(rejection) => &rejection.request_id,
        }
    }

    pub fn is_forgery(&self) -> bool {
        matches!(self, DocumentOutcome::ForgeryDetected(_))
    }

    pub fn scored(&self) -> Option<&DocumentResponse> {
        match self {
            DocumentOutcome::Scored(response) => Some(response),
            DocumentOutcome::ForgeryDetected(_) => None,
        }
    }
}

/// Result of a reference-call run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResponse {
    pub request_id: String,
    pub lead_id: String,
    pub agent_id: String,
    pub reference_name: String,
    pub subject_name: String,
    pub subject_address: String,
    pub relation_to_subject: String,
    pub subject_occupation: String,
    pub overall_score: f64,
    pub explanation: Vec<String>,
    pub field_by_field_scores: BTreeMap<String, f64>,
    pub transcript: Vec<String>,
    pub status: String,
    pub llm_extraction_results: Payload,
    pub audio_analysis: Payload,
    pub processed_at: DateTime<Utc>,
}

impl AudioResponse {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}
