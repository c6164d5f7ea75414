//! The draggable capture window and its `WindowState` adapter.

use crate::capture::{Appearance, Feedback, WindowError, WindowGeometry, WindowState};
use crate::config::WindowSettings;
use serde::Serialize;
use std::time::Duration;
use tauri::{AppHandle, Emitter, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

pub const CAPTURE_WINDOW: &str = "capture";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlashPayload {
    outcome: &'static str,
    duration_ms: u64,
}

/// Creates the see-through, undecorated capture window.
///
/// The frame and buttons come from `ui/index.html`; opacity is applied by
/// the page so it can be restored through an event after each capture.
pub fn build_capture_window(
    app: &AppHandle,
    settings: &WindowSettings,
    appearance: &Appearance,
) -> tauri::Result<WebviewWindow> {
    WebviewWindowBuilder::new(app, CAPTURE_WINDOW, WebviewUrl::App("index.html".into()))
        .title("Screen Capture")
        .inner_size(settings.width as f64, settings.height as f64)
        .min_inner_size(settings.min_width as f64, settings.min_height as f64)
        .transparent(true)
        .decorations(false)
        .shadow(false)
        .always_on_top(appearance.always_on_top)
        .resizable(true)
        .initialization_script(&format!(
            "window.__CAPTURE_OPACITY__ = {};",
            appearance.opacity
        ))
        .build()
}

pub struct TauriWindow {
    window: WebviewWindow,
    settle: Duration,
    flash: Duration,
}

impl TauriWindow {
    pub fn new(window: WebviewWindow, settings: &WindowSettings) -> Self {
        Self {
            window,
            settle: settings.hide_settle,
            flash: settings.flash,
        }
    }
}

fn shell_err(e: tauri::Error) -> WindowError {
    WindowError::new(e.to_string())
}

impl WindowState for TauriWindow {
    /// Physical pixels, relative to the primary monitor's origin.
    fn geometry(&self) -> Result<WindowGeometry, WindowError> {
        let position = self.window.outer_position().map_err(shell_err)?;
        let size = self.window.outer_size().map_err(shell_err)?;
        let (origin_x, origin_y) = self
            .window
            .primary_monitor()
            .map_err(shell_err)?
            .map(|m| (m.position().x, m.position().y))
            .unwrap_or((0, 0));

        Ok(WindowGeometry {
            x: position.x - origin_x,
            y: position.y - origin_y,
            width: size.width,
            height: size.height,
        })
    }

    fn hide(&self) -> Result<(), WindowError> {
        self.window.hide().map_err(shell_err)
    }

    fn show(&self) -> Result<(), WindowError> {
        self.window.show().map_err(shell_err)
    }

    /// The webview has no synchronous repaint, so give the compositor a
    /// fixed window to apply the change.
    fn flush(&self) {
        std::thread::sleep(self.settle);
    }

    fn set_opacity(&self, opacity: f64) -> Result<(), WindowError> {
        self.window
            .emit("window-opacity", opacity)
            .map_err(shell_err)
    }

    fn set_always_on_top(&self, on_top: bool) -> Result<(), WindowError> {
        self.window.set_always_on_top(on_top).map_err(shell_err)
    }

    fn flash(&self, feedback: Feedback) {
        let payload = FlashPayload {
            outcome: feedback.as_str(),
            duration_ms: self.flash.as_millis() as u64,
        };
        if let Err(e) = self.window.emit("capture-feedback", payload) {
            log::warn!("[CAPTURE] Could not flash window: {}", e);
        }
    }
}
