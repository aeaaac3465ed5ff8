use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{PipelineError, PipelineKind};

/// Identity documents accepted by the document pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Aadhaar,
    Pan,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "aadhaar",
            DocumentType::Pan => "pan",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aadhaar" | "aadhar" => Ok(DocumentType::Aadhaar),
            "pan" => Ok(DocumentType::Pan),
            other => Err(format!("unknown document type '{}'", other)),
        }
    }
}

/// A stored document ready for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub request_id: String,
    pub lead_id: String,
    pub file_path: PathBuf,
    pub document_type: DocumentType,
}

impl PipelineRequest {
    pub fn new(lead_id: impl Into<String>, file_path: PathBuf, document_type: DocumentType) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            lead_id: lead_id.into(),
            file_path,
            document_type,
        }
    }
}

/// A document as received from an agent, before it is stored.
#[derive(Clone)]
pub struct DocumentUpload {
    pub lead_id: String,
    pub agent_id: String,
    pub document_type: DocumentType,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("lead_id", &self.lead_id)
            .field("agent_id", &self.agent_id)
            .field("document_type", &self.document_type)
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl DocumentUpload {
    /// Only non-empty JPEG and PNG images are accepted.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let kind = PipelineKind::Document;

        if self.bytes.is_empty() {
            return Err(PipelineError::invalid(kind, "uploaded file is empty"));
        }
        if self.file_name.trim().is_empty() {
            return Err(PipelineError::invalid(kind, "file name is blank"));
        }
        if self.lead_id.trim().is_empty() {
            return Err(PipelineError::invalid(kind, "lead id is blank"));
        }

        let is_image = mime_guess::from_path(&self.file_name)
            .iter()
            .any(|mime| matches!(mime.essence_str(), "image/jpeg" | "image/png"));
        if !is_image {
            return Err(PipelineError::invalid(
                kind,
                format!(
                    "unsupported file type for '{}'; only JPG and PNG are accepted",
                    self.file_name
                ),
            ));
        }

        Ok(())
    }
}

/// A reference-call recording as received from an agent.
#[derive(Clone)]
pub struct AudioUpload {
    pub id: String,
    pub lead_id: String,
    pub agent_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for AudioUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioUpload")
            .field("id", &self.id)
            .field("lead_id", &self.lead_id)
            .field("agent_id", &self.agent_id)
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl AudioUpload {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let kind = PipelineKind::Audio;

        if self.bytes.is_empty() {
            return Err(PipelineError::invalid(kind, "uploaded file is empty"));
        }
        if self.id.trim().is_empty() {
            return Err(PipelineError::invalid(kind, "audio id is blank"));
        }
        if self.lead_id.trim().is_empty() {
            return Err(PipelineError::invalid(kind, "lead id is blank"));
        }
        Ok(())
    }

    /// Recordings are stored under their id, not the uploaded name.
    pub fn stored_name(&self) -> String {
        format!("{}.mp3", self.id.trim())
    }
}

/// A stored recording ready for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRequest {
    pub request_id: String,
    pub lead_id: String,
    pub agent_id: String,
    pub file_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(file_name: &str, bytes: &[u8]) -> DocumentUpload {
        DocumentUpload {
            lead_id: "lead-1".to_string(),
            agent_id: "agent-1".to_string(),
            document_type: DocumentType::Pan,
            file_name: file_name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_document_type_parsing() {
        assert_eq!("AADHAAR".parse::<DocumentType>(), Ok(DocumentType::Aadhaar));
        assert_eq!(" pan ".parse::<DocumentType>(), Ok(DocumentType::Pan));
        assert!("passport".parse::<DocumentType>().is_err());
        assert_eq!(
            serde_json::to_value(DocumentType::Aadhaar).unwrap(),
            "aadhaar"
        );
    }

    #[test]
    fn test_accepts_jpeg_and_png() {
        for name in ["scan.jpg", "scan.JPEG", "front.png"] {
            assert!(upload(name, b"data").validate().is_ok(), "{} rejected", name);
        }
    }

    #[test]
    fn test_rejects_other_types() {
        for name in ["scan.pdf", "scan.gif", "scan", "notes.txt"] {
            match upload(name, b"data").validate() {
                Err(PipelineError::InvalidRequest { reason, .. }) => {
                    assert!(reason.contains("only JPG and PNG"));
                }
                other => panic!("Expected InvalidRequest for {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_rejects_empty_or_unnamed() {
        assert!(upload("scan.png", b"").validate().is_err());
        assert!(upload("   ", b"data").validate().is_err());
    }

    #[test]
    fn test_debug_hides_bytes() {
        let rendered = format!("{:?}", upload("scan.png", b"secret-bytes"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("bytes: 12"));
    }

    #[test]
    fn test_audio_upload() {
        let audio = AudioUpload {
            id: "call-9".to_string(),
            lead_id: "lead-1".to_string(),
            agent_id: "agent-1".to_string(),
            file_name: "recording.wav".to_string(),
            bytes: b"RIFF".to_vec(),
        };
        assert!(audio.validate().is_ok());
        assert_eq!(audio.stored_name(), "call-9.mp3");

        let empty = AudioUpload {
            bytes: Vec::new(),
            ..audio
        };
        assert!(empty.validate().is_err());
    }
}
