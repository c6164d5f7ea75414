//! One user-triggered capture, start to finish.
//!
//! geometry → resolve → hide → grab → write → restore → feedback → hook.
//! Restore happens before feedback, so the flash is always drawn on a
//! visible window.

use super::persist;
use super::region::resolve_with_offset;
use super::screenshot::{self, DisplayCapture};
use super::visibility::{Feedback, VisibilityController, WindowState};
use super::{CaptureArtifact, CaptureError, CaptureSettings};
use crate::analysis::PostCaptureHook;
use std::cell::Cell;
use std::sync::{Mutex, TryLockError};

pub struct CaptureOrchestrator<W, D> {
    visibility: VisibilityController<W>,
    display: D,
    settings: CaptureSettings,
    hook: Option<Box<dyn PostCaptureHook + Send>>,
    in_flight: Cell<bool>,
}

impl<W: WindowState, D: DisplayCapture> CaptureOrchestrator<W, D> {
    pub fn new(window: W, display: D, settings: CaptureSettings) -> Self {
        Self {
            visibility: VisibilityController::new(window, settings.appearance),
            display,
            settings,
            hook: None,
            in_flight: Cell::new(false),
        }
    }

    /// Runs `hook` after every successful capture.
    pub fn with_hook(mut self, hook: Box<dyn PostCaptureHook + Send>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn window(&self) -> &W {
        self.visibility.window()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn visibility(&self) -> &VisibilityController<W> {
        &self.visibility
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    /// Captures the region under the window and saves it.
    ///
    /// A call made while another capture is still running fails with
    /// [`CaptureError::CaptureInProgress`]; it is not queued. Whatever
    /// happens, the window is visible again when this returns.
    pub fn capture_once(&self) -> Result<CaptureArtifact, CaptureError> {
        let _flight = InFlight::enter(&self.in_flight)?;
        let start = std::time::Instant::now();
        log::info!("[CAPTURE] Starting capture");

        let result = self.run_sequence();

        match &result {
            Ok(artifact) => {
                log::info!(
                    "[CAPTURE] Done in {}ms: {}",
                    start.elapsed().as_millis(),
                    artifact.filepath.display()
                );
                self.window().flash(Feedback::Success);
                self.run_hook(artifact);
            }
            Err(e) => {
                log::error!("[CAPTURE] Capture failed: {}", e);
                self.window().flash(Feedback::Failure);
            }
        }

        result
    }

    /// [`capture_once`](Self::capture_once) on an orchestrator shared
    /// between command threads.
    ///
    /// A capture already holding the lock means this call is rejected with
    /// [`CaptureError::CaptureInProgress`] instead of waiting behind it. A
    /// poisoned lock is taken over: the window was restored by the guard
    /// while the panic unwound.
    pub fn capture_locked(shared: &Mutex<Self>) -> Result<CaptureArtifact, CaptureError> {
        let orchestrator = match shared.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                log::warn!("[CAPTURE] Capture requested while one is in flight, rejecting");
                return Err(CaptureError::CaptureInProgress);
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        orchestrator.capture_once()
    }

    fn run_sequence(&self) -> Result<CaptureArtifact, CaptureError> {
        let geometry = self
            .window()
            .geometry()
            .map_err(|e| CaptureError::Window(format!("cannot read geometry: {}", e)))?;
        log::debug!(
            "[CAPTURE] Window at ({},{}) size {}x{}",
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height
        );

        // Rejected before the window is touched.
        let region = resolve_with_offset(&geometry, self.settings.menu_bar_offset)?;

        let hidden = self.visibility.hide()?;
        let image = screenshot::grab(&hidden, &self.display, &region)?;
        let artifact = persist::write(image, &self.settings.output_dir)?;
        drop(hidden);

        Ok(artifact)
    }

    fn run_hook(&self, artifact: &CaptureArtifact) {
        let Some(hook) = &self.hook else {
            return;
        };
        if let Err(e) = hook.on_capture(artifact) {
            log::warn!(
                "[ANALYSIS] Skipped for {}: {}",
                artifact.filepath.display(),
                e
            );
        }
    }
}

/// Marks a capture as running for as long as it is alive.
struct InFlight<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Result<Self, CaptureError> {
        if flag.replace(true) {
            log::warn!("[CAPTURE] Capture requested while one is in flight, rejecting");
            return Err(CaptureError::CaptureInProgress);
        }
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
