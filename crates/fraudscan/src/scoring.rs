//! Weighted fraud risk scoring for document pipelines.

use serde::{Deserialize, Serialize};

use crate::parser::{ForgeryReport, OcrReport, QualityReport, ValidationReport};

pub const OCR_WEIGHT: f64 = 0.1;
pub const QUALITY_WEIGHT: f64 = 0.2;
pub const FORGERY_WEIGHT: f64 = 0.4;
pub const VALIDATION_WEIGHT: f64 = 0.3;

const HIGH_THRESHOLD: f64 = 0.7;
const MEDIUM_THRESHOLD: f64 = 0.4;

/// Per-stage inputs to the risk score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageScores {
    pub ocr_score: f64,
    pub quality_score: f64,
    pub forgery_score: f64,
    pub validation_score: f64,
}

impl StageScores {
    pub fn from_reports(
        ocr: &OcrReport,
        quality: &QualityReport,
        forgery: &ForgeryReport,
        validation: &ValidationReport,
    ) -> Self {
        Self {
            // Binary: a document is not penalised for poor OCR alone.
            ocr_score: if ocr.has_text() { 1.0 } else { 0.0 },
            quality_score: quality.overall_quality_score,
            forgery_score: forgery.confidence,
            validation_score: validation.overall_validation_score,
        }
    }
}

/// Weighted sum of the stage scores, clamped to `[0, 1]`.
pub fn compute_risk_score(scores: &StageScores) -> f64 {
    let raw = OCR_WEIGHT * scores.ocr_score
        + QUALITY_WEIGHT * scores.quality_score
        + FORGERY_WEIGHT * scores.forgery_score
        + VALIDATION_WEIGHT * scores.validation_score;

    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_THRESHOLD {
            RiskBand::High
        } else if score > MEDIUM_THRESHOLD {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }

    pub fn decision(&self) -> Decision {
        match self {
            RiskBand::High => Decision::Reject,
            RiskBand::Medium | RiskBand::Low => Decision::Approve,
        }
    }

    pub fn next_steps(&self) -> &'static str {
        match self {
            RiskBand::High => "Request re-submission or manual verification",
            RiskBand::Medium => "Manual review recommended",
            RiskBand::Low => "No further action needed",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "LOW",
            RiskBand::Medium => "MEDIUM",
            RiskBand::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "APPROVE",
            Decision::Reject => "REJECT",
        }
    }
}

/// Score, band and decision derived together so they can never disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub scores: StageScores,
    pub score: f64,
    pub band: RiskBand,
    pub decision: Decision,
}

impl RiskAssessment {
    pub fn assess(scores: StageScores) -> Self {
        let score = compute_risk_score(&scores);
        let band = RiskBand::from_score(score);
        Self {
            scores,
            score,
            band,
            decision: band.decision(),
        }
    }
}
