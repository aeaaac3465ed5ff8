//! Typed views over the payloads of each external program.
//!
//! Decoding is deliberately permissive: a missing field, a field of the wrong
//! type, or a non-finite number decodes to `0.0` / empty string instead of an
//! error. Numbers that arrive as numeric strings (`"0.8"`) are accepted. This
//! keeps the "never fail on bad external data" contract in one place while
//! the orchestrator and scoring code work with plain typed fields.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use super::Payload;

/// Follows a key path through nested objects.
fn value_at<'a>(payload: &'a Payload, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = payload.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Lenient numeric coercion: numbers and numeric strings, anything else is 0.0.
pub fn lenient_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn number_at(payload: &Payload, path: &[&str]) -> f64 {
    value_at(payload, path).map(lenient_f64).unwrap_or(0.0)
}

fn text_at(payload: &Payload, path: &[&str]) -> Option<String> {
    match value_at(payload, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrReport {
    pub text: String,
    pub ocr_json_path: Option<PathBuf>,
    pub error: Option<String>,
    structured_fields: usize,
}

impl OcrReport {
    pub fn from_payload(payload: &Payload) -> Self {
        let structured_fields = value_at(payload, &["structured_data"])
            .and_then(Value::as_object)
            .map(|m| m.len())
            .unwrap_or(0);

        Self {
            text: text_at(payload, &["text"]).unwrap_or_default(),
            ocr_json_path: text_at(payload, &["ocr_json_path"])
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            error: text_at(payload, &["error"]),
            structured_fields,
        }
    }

    /// Whether OCR extracted anything: free text, or structured fields when
    /// the program reports those instead.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty() || self.structured_fields > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityReport {
    pub overall_quality_score: f64,
}

impl QualityReport {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            overall_quality_score: number_at(payload, &["overall_quality_score"]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForgeryReport {
    pub confidence: f64,
    pub conclusion: Option<String>,
}

impl ForgeryReport {
    const ASSESSMENT: [&'static str; 2] = ["Detailed Insights", "Overall Assessment"];

    pub fn from_payload(payload: &Payload) -> Self {
        let [insights, assessment] = Self::ASSESSMENT;
        Self {
            confidence: number_at(payload, &[insights, assessment, "confidence"]),
            conclusion: text_at(payload, &[insights, assessment, "conclusion"]),
        }
    }

    /// A conclusion mentioning "forgery" in any case is a forgery verdict.
    pub fn is_forgery(&self) -> bool {
        self.conclusion
            .as_deref()
            .map(|c| c.to_lowercase().contains("forgery"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub overall_validation_score: f64,
}

impl ValidationReport {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            overall_validation_score: number_at(
                payload,
                &["validation_results", "overall_validation_score"],
            ),
        }
    }
}

/// Fields pulled from the LLM extraction program's reference-call analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmExtractionReport {
    pub reference_name: String,
    pub subject_name: String,
    pub subject_address: String,
    pub relation_to_subject: String,
    pub subject_occupation: String,
    pub overall_score: f64,
    /// `"key: value"` lines from `scoring_results.explanation`.
    pub explanation: Vec<String>,
    pub field_by_field_scores: BTreeMap<String, f64>,
    /// Transcript segment texts in spoken order.
    pub transcript: Vec<String>,
    pub status: Option<String>,
}

impl LlmExtractionReport {
    pub fn from_payload(payload: &Payload) -> Self {
        let extracted = |key: &str| text_at(payload, &["extracted_result", key]).unwrap_or_default();

        let explanation = value_at(payload, &["scoring_results", "explanation"])
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| format!("{}: {}", k, display_value(v)))
                    .collect()
            })
            .unwrap_or_default();

        let field_by_field_scores = value_at(payload, &["scoring_results", "field_by_field_scores"])
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), lenient_f64(v)))
                    .collect()
            })
            .unwrap_or_default();

        let transcript = value_at(payload, &["transcript"])
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| match entry {
                        Value::Object(segment) => segment.get("text").map(display_value),
                        Value::String(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            reference_name: extracted("reference_name"),
            subject_name: extracted("subject_name"),
            subject_address: extracted("subject_address"),
            relation_to_subject: extracted("relation_to_subject"),
            subject_occupation: extracted("subject_occupation"),
            overall_score: number_at(payload, &["scoring_results", "overall_score"]),
            explanation,
            field_by_field_scores,
            transcript,
            status: text_at(payload, &["status"]),
        }
    }
}
