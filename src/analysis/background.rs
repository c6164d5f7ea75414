//! Fire-and-forget analysis on a tokio runtime.

use super::vision::VisionAnalyzer;
use super::{AnalysisError, PostCaptureHook};
use crate::capture::CaptureArtifact;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Receives the outcome of each background analysis.
pub type AnalysisCallback = Arc<dyn Fn(&Path, Result<String, AnalysisError>) + Send + Sync>;

/// Hook that spawns a [`VisionAnalyzer`] call and returns immediately.
///
/// A missing credential is reported synchronously so the orchestrator can
/// log it; everything after the spawn only reaches the callback.
pub struct BackgroundAnalysis {
    analyzer: Arc<VisionAnalyzer>,
    runtime: Handle,
    on_result: AnalysisCallback,
}

impl BackgroundAnalysis {
    pub fn new(analyzer: VisionAnalyzer, runtime: Handle) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            runtime,
            on_result: Arc::new(log_result),
        }
    }

    pub fn on_result(
        mut self,
        callback: impl Fn(&Path, Result<String, AnalysisError>) + Send + Sync + 'static,
    ) -> Self {
        self.on_result = Arc::new(callback);
        self
    }
}

impl PostCaptureHook for BackgroundAnalysis {
    fn on_capture(&self, artifact: &CaptureArtifact) -> Result<(), AnalysisError> {
        if !self.analyzer.has_credential() {
            return Err(AnalysisError::MissingCredential);
        }

        let analyzer = Arc::clone(&self.analyzer);
        let callback = Arc::clone(&self.on_result);
        let path: PathBuf = artifact.filepath.clone();

        self.runtime.spawn(async move {
            let result = analyzer.analyze(&path).await;
            callback(&path, result);
        });

        Ok(())
    }
}

/// Default callback: the description goes to the log.
pub fn log_result(path: &Path, result: Result<String, AnalysisError>) {
    match result {
        Ok(text) => log::info!("[ANALYSIS] {}:\n{}", path.display(), text),
        Err(e) => log::warn!("[ANALYSIS] {} failed: {}", path.display(), e),
    }
}
