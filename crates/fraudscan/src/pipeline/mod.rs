pub mod audio;
pub mod document;
pub mod error;
pub mod progress;
pub mod request;
pub mod response;

#[cfg(test)]
pub(crate) mod testing;

pub use audio::AudioPipeline;
pub use document::DocumentPipeline;
pub use error::{PipelineError, PipelineKind};
pub use progress::{
    BroadcastProgress, NoopProgress, PipelineEvent, PipelinePhase, ProgressReporter,
    RecordingProgress,
};
pub use request::{AudioRequest, AudioUpload, DocumentType, DocumentUpload, PipelineRequest};
pub use response::{
    AudioResponse, DocumentInsights, DocumentOutcome, DocumentResponse, ForgeryRejection,
};
