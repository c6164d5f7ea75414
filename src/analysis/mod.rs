//! Best-effort description of a finished capture by a vision model.
//!
//! Nothing here can fail a capture. The orchestrator hands the artifact to
//! a [`PostCaptureHook`] and only logs what comes back.

mod background;
mod prompts;
mod vision;

pub use background::{log_result, AnalysisCallback, BackgroundAnalysis};
pub use prompts::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DESCRIBE_PROMPT, MAX_TOKENS};
pub use vision::{build_request_body, extract_description, VisionAnalyzer};

use crate::capture::CaptureArtifact;

/// Called once per successful capture, after the window is restored.
///
/// Implementations must return promptly; long work belongs on another task.
pub trait PostCaptureHook {
    fn on_capture(&self, artifact: &CaptureArtifact) -> Result<(), AnalysisError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No ANTHROPIC_API_KEY configured")]
    MissingCredential,

    #[error("Reading capture failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Response contained no text")]
    EmptyResponse,
}
