//! Normalisation of external program output.
//!
//! Analysis scripts are expected to print a JSON object, but in practice
//! they also print tracebacks, truncated JSON, or nothing at all. Parsing
//! never fails: anything that is not a JSON object becomes a one-entry
//! payload `{"output": <raw text>}` so a single misbehaving stage cannot
//! abort a pipeline.

pub mod reports;

use serde_json::{Map, Value};

pub use reports::{
    ForgeryReport, LlmExtractionReport, OcrReport, QualityReport, ValidationReport,
};

/// Normalised result of one stage. Key names are preserved verbatim from the
/// program's output.
pub type Payload = Map<String, Value>;

/// Key used for raw-text passthrough when output is not a JSON object.
pub const RAW_OUTPUT_KEY: &str = "output";

/// Key a program, or the runner on its behalf, uses to report failure.
pub const ERROR_KEY: &str = "error";

pub fn parse(raw_text: &str) -> Payload {
    let trimmed = raw_text.trim();

    if trimmed.is_empty() {
        return raw_output("");
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::debug!("Program output is not a JSON object; keeping raw text");
            raw_output(trimmed)
        }
    }
}

fn raw_output(text: &str) -> Payload {
    let mut payload = Map::new();
    payload.insert(RAW_OUTPUT_KEY.to_string(), Value::String(text.to_string()));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_preserves_keys() {
        let payload = parse(r#"{"Detailed Insights": {"Overall Assessment": {"confidence": 0.2}}, "finalQualityScore": 0.8}"#);
        assert_eq!(payload.len(), 2);
        assert_eq!(
            payload["Detailed Insights"]["Overall Assessment"]["confidence"],
            0.2
        );
        assert_eq!(payload["finalQualityScore"], 0.8);
    }

    #[test]
    fn test_parse_surrounding_whitespace() {
        let payload = parse("\n\n  {\"text\": \"ABC123\"}  \n");
        assert_eq!(payload["text"], "ABC123");
    }

    #[test]
    fn test_parse_malformed_json_keeps_raw_text() {
        let payload = parse(r#"{"text": "ABC"#);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[RAW_OUTPUT_KEY], r#"{"text": "ABC"#);
    }

    #[test]
    fn test_parse_plain_text() {
        let payload = parse("Traceback (most recent call last):\n  boom");
        assert_eq!(
            payload[RAW_OUTPUT_KEY],
            "Traceback (most recent call last):\n  boom"
        );
    }

    #[test]
    fn test_parse_empty_and_blank() {
        for raw in ["", "   ", "\n\t\n"] {
            let payload = parse(raw);
            assert_eq!(payload.len(), 1);
            assert_eq!(payload[RAW_OUTPUT_KEY], "");
        }
    }

    #[test]
    fn test_parse_non_object_json() {
        for raw in ["[1, 2, 3]", "0.87", "\"done\"", "null", "true"] {
            let payload = parse(raw);
            assert_eq!(payload[RAW_OUTPUT_KEY], raw);
        }
    }

    #[test]
    fn test_parse_empty_object() {
        assert!(parse("{}").is_empty());
    }
}
