//! Hide/restore bracket around every pixel grab.
//!
//! The capture window must not appear in its own screenshot, and it must
//! come back no matter how the grab ends. [`VisibilityController::hide`]
//! hands out a [`HiddenWindow`] guard; dropping the guard is the only way
//! back to `Visible`, so every exit path restores exactly once.

use super::{Appearance, CaptureError, VisibilityState, WindowGeometry};
use std::cell::Cell;

/// Abstract window provided by the GUI shell.
///
/// Every method is called from the thread that runs the capture.
pub trait WindowState {
    /// Current outer position (monitor-relative) and size.
    fn geometry(&self) -> Result<WindowGeometry, WindowError>;

    fn hide(&self) -> Result<(), WindowError>;

    fn show(&self) -> Result<(), WindowError>;

    /// Blocks until pending visibility changes are on screen.
    fn flush(&self);

    fn set_opacity(&self, opacity: f64) -> Result<(), WindowError>;

    fn set_always_on_top(&self, on_top: bool) -> Result<(), WindowError>;

    /// Transient success/failure indication after a capture.
    fn flash(&self, feedback: Feedback);
}

/// Outcome shown to the user once the window is back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Success,
    Failure,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct WindowError(pub String);

impl WindowError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub struct VisibilityController<W> {
    window: W,
    appearance: Appearance,
    state: Cell<VisibilityState>,
}

impl<W: WindowState> VisibilityController<W> {
    pub fn new(window: W, appearance: Appearance) -> Self {
        Self {
            window,
            appearance,
            state: Cell::new(VisibilityState::Visible),
        }
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn state(&self) -> VisibilityState {
        self.state.get()
    }

    /// Hides the window and waits for the hide to reach the screen.
    ///
    /// Fails with [`CaptureError::CaptureInProgress`] if a guard is already
    /// out. If the shell refuses to hide, the window is restored before the
    /// error is returned.
    pub fn hide(&self) -> Result<HiddenWindow<'_, W>, CaptureError> {
        if self.state.get() == VisibilityState::Hidden {
            return Err(CaptureError::CaptureInProgress);
        }

        log::debug!("[CAPTURE] Hiding window");
        self.state.set(VisibilityState::Hidden);
        let guard = HiddenWindow { controller: self };

        self.window
            .hide()
            .map_err(|e| CaptureError::Window(format!("hide failed: {}", e)))?;
        self.window.flush();

        Ok(guard)
    }

    /// Every step runs even if an earlier one fails.
    fn restore(&self) {
        log::debug!("[CAPTURE] Restoring window");

        if let Err(e) = self.window.show() {
            log::error!("[CAPTURE] Failed to show window: {}", e);
        }
        if let Err(e) = self.window.set_opacity(self.appearance.opacity) {
            log::warn!("[CAPTURE] Failed to restore opacity: {}", e);
        }
        if let Err(e) = self.window.set_always_on_top(self.appearance.always_on_top) {
            log::warn!("[CAPTURE] Failed to restore always-on-top: {}", e);
        }
        self.window.flush();

        self.state.set(VisibilityState::Visible);
    }
}

/// Proof that the window is currently hidden. Restores it on drop.
#[must_use = "the window is restored as soon as the guard is dropped"]
pub struct HiddenWindow<'a, W: WindowState> {
    controller: &'a VisibilityController<W>,
}

impl<W: WindowState> Drop for HiddenWindow<'_, W> {
    fn drop(&mut self) {
        self.controller.restore();
    }
}
