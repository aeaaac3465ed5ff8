use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::runner::ProgramId;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Quality, Forgery and Validation each hold a slot at the same time.
pub const MIN_POOL_SIZE: usize = 3;

/// Default config location: `<platform config dir>/fraudscan/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fraudscan").join("config.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();

    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.execution.pool_size < MIN_POOL_SIZE {
        return Err(ConfigError::Validation {
            message: format!(
                "execution.pool_size must be at least {}, got {}",
                MIN_POOL_SIZE, config.execution.pool_size
            ),
        });
    }

    if config.execution.stage_timeout_secs == 0
        || config.execution.ocr_timeout_secs == 0
        || config.execution.audio_timeout_secs == 0
    {
        return Err(ConfigError::Validation {
            message: "execution timeouts must be at least 1 second".to_string(),
        });
    }

    if config.workers.count == 0 {
        return Err(ConfigError::Validation {
            message: "workers.count must be at least 1".to_string(),
        });
    }

    // Each program needs its own script; two stages sharing one would
    // silently feed the wrong payload schema into scoring.
    let mut scripts = HashSet::new();
    for program in ProgramId::ALL {
        let script = config.programs.script_for(program);
        if script.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("No script configured for {}", program),
            });
        }
        if !scripts.insert(script) {
            return Err(ConfigError::Validation {
                message: format!("Script '{}' is configured for more than one program", script),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.execution.pool_size, 4);
        assert_eq!(config.programs.ocr, "DocumentOcr.py");
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "storage": {
                "document_directory": "/srv/fraud/documents",
                "audio_directory": "/srv/fraud/audio",
                "archive_directory": "/srv/fraud/archive",
                "archive_processed": true
            },
            "programs": {
                "scripts_directory": "/opt/workflows",
                "interpreter": null,
                "ocr": "ocr.sh"
            },
            "execution": {
                "pool_size": 6,
                "stage_timeout_secs": 5
            },
            "workers": { "count": 2 },
            "document_types": { "voter_id": "Voter ID" }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert!(config.storage.archive_processed);
        assert_eq!(config.programs.interpreter, None);
        assert_eq!(config.programs.ocr, "ocr.sh");
        assert_eq!(config.programs.quality, "DocumentQuality.py");
        assert_eq!(config.execution.pool_size, 6);
        assert_eq!(config.execution.stage_timeout_secs, 5);
        assert_eq!(config.workers.count, 2);
        assert_eq!(config.document_label("voter_id"), "Voter ID");
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_zero_pool_size_rejected_by_schema() {
        let result = load_config_from_str(r#"{ "execution": { "pool_size": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_pool_too_small_for_parallel_stages_rejected_by_schema() {
        for size in [1, 2] {
            let config_json = format!(r#"{{ "execution": {{ "pool_size": {} }} }}"#, size);
            let result = load_config_from_str(&config_json);
            assert!(
                matches!(result, Err(ConfigError::SchemaValidation { .. })),
                "pool_size {} accepted",
                size
            );
        }
    }

    #[test]
    fn test_pool_too_small_for_parallel_stages_rejected_by_validation() {
        let mut config = Config::default();
        config.execution.pool_size = 2;

        match validate_config(&config) {
            Err(ConfigError::Validation { message }) => {
                assert!(message.contains("pool_size must be at least 3"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }

        config.execution.pool_size = MIN_POOL_SIZE;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_field_rejected_by_schema() {
        let result = load_config_from_str(r#"{ "risk_weights": { "ocr": 0.5 } }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_duplicate_script_rejected() {
        let config_json = r#"
        {
            "programs": {
                "quality": "analyze.py",
                "forgery": "analyze.py"
            }
        }
        "#;

        let result = load_config_from_str(config_json);
        match result {
            Err(ConfigError::Validation { message }) => {
                assert!(message.contains("analyze.py"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/fraudscan/config.json");
        match result {
            Err(ConfigError::ReadFile { path, .. }) => {
                assert!(path.ends_with("config.json"));
            }
            other => panic!("Expected ReadFile error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "workers": { "count": 3 } }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.workers.count, 3);
    }
}
