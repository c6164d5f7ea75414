//! Screen capture domain: public API.
//!
//! This module owns the hide → grab → write → restore sequence.
//! External code should go through [`CaptureOrchestrator`]; the pieces are
//! public so the shell and the tests can drive them individually.

// Fakes for tests, kept public so tests/ can use them.
#[doc(hidden)]
pub mod mock;
mod orchestrator;
mod persist;
mod region;
mod screenshot;
mod visibility;

pub use orchestrator::CaptureOrchestrator;
pub use persist::{capture_filename, ensure_output_dir, write, write_at};
pub use region::{crop_rgba, resolve, resolve_with_offset, CropError, MENU_BAR_OFFSET};
pub use screenshot::{grab, DisplayCapture, DisplayError, RawFrame};
pub use visibility::{Feedback, HiddenWindow, VisibilityController, WindowError, WindowState};

#[cfg(feature = "desktop")]
pub use screenshot::XcapDisplay;

use chrono::{DateTime, Local};
use image::RgbImage;
use std::path::PathBuf;

/// Live position and size of the capture window, as reported by the shell.
///
/// Read fresh before every capture, since the user may have dragged or
/// resized the window since the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Monitor-relative pixel rectangle that will be read from the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub top: i32,
    pub left: i32,
    pub width: u32,
    pub height: u32,
}

/// Decoded RGB pixels of one grab. No alpha channel.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pixels: RgbImage,
}

impl CapturedImage {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbImage {
        self.pixels
    }
}

/// A capture that made it to disk. Only built after the write was verified.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureArtifact {
    pub filepath: PathBuf,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    Visible,
    Hidden,
}

/// Window attributes re-applied every time the window comes back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub opacity: f64,
    pub always_on_top: bool,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            opacity: 0.3,
            always_on_top: true,
        }
    }
}

/// Everything the orchestrator needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub output_dir: PathBuf,
    pub menu_bar_offset: u32,
    pub appearance: Appearance,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("screenshots"),
            menu_bar_offset: MENU_BAR_OFFSET,
            appearance: Appearance::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error(
        "Capture region is empty: {width}x{height} window leaves nothing below the {offset}px menu bar"
    )]
    InvalidRegion { width: u32, height: u32, offset: u32 },

    #[error("A capture is already in progress")]
    CaptureInProgress,

    #[error("Screen grab failed: {0}")]
    GrabFailed(String),

    #[error("Saving screenshot failed: {0}")]
    PersistenceFailed(String),

    #[error("Window shell error: {0}")]
    Window(String),
}
