//! Pixel grab. The only code that touches the display.
//!
//! [`grab`] is backend-agnostic: it asks a [`DisplayCapture`] for raw RGBA
//! bytes and decodes them into an RGB [`CapturedImage`]. The `xcap` backend
//! lives behind the `desktop` feature; if xcap misbehaves on some OS, that
//! backend is the piece to replace.

use super::visibility::{HiddenWindow, WindowState};
use super::{CaptureError, CaptureRegion, CapturedImage};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

/// Raw pixels as handed over by a capture backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, 4 bytes per pixel.
    pub rgba: Vec<u8>,
}

/// Source of screen pixels.
pub trait DisplayCapture {
    fn grab(&self, region: &CaptureRegion) -> Result<RawFrame, DisplayError>;

    /// Cheap check that the process is allowed to read the screen at all.
    fn probe(&self) -> Result<(), DisplayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No monitor found")]
    NoMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error(transparent)]
    Crop(#[from] super::region::CropError),
}

/// Grabs `region` and decodes it.
///
/// Taking the [`HiddenWindow`] guard means this cannot be called while the
/// capture window is still on screen. No retry: a failed grab is returned
/// as [`CaptureError::GrabFailed`] and the caller's guard restores the
/// window.
pub fn grab<W: WindowState>(
    _hidden: &HiddenWindow<'_, W>,
    display: &impl DisplayCapture,
    region: &CaptureRegion,
) -> Result<CapturedImage, CaptureError> {
    let start = std::time::Instant::now();

    let frame = display
        .grab(region)
        .map_err(|e| CaptureError::GrabFailed(e.to_string()))?;

    let image = decode(frame, region)?;

    log::info!(
        "[CAPTURE] Grabbed {}x{} at ({},{}) in {}ms",
        image.width(),
        image.height(),
        region.left,
        region.top,
        start.elapsed().as_millis()
    );

    Ok(image)
}

/// RGBA bytes → RGB image of exactly the requested size.
///
/// Backends on scaled displays hand back more physical pixels than the
/// region asked for; those frames are resampled down to the region.
fn decode(frame: RawFrame, region: &CaptureRegion) -> Result<CapturedImage, CaptureError> {
    let (width, height) = (frame.width, frame.height);
    let expected_len = width as usize * height as usize * 4;
    if width == 0 || height == 0 || frame.rgba.len() != expected_len {
        return Err(CaptureError::GrabFailed(format!(
            "backend returned {} bytes for a {}x{} frame",
            frame.rgba.len(),
            width,
            height
        )));
    }

    let rgba = RgbaImage::from_raw(width, height, frame.rgba).ok_or_else(|| {
        CaptureError::GrabFailed(format!("could not decode {}x{} frame", width, height))
    })?;

    let rgba = if (width, height) == (region.width, region.height) {
        rgba
    } else {
        log::debug!(
            "[CAPTURE] Resampling {}x{} frame to {}x{}",
            width,
            height,
            region.width,
            region.height
        );
        imageops::resize(&rgba, region.width, region.height, FilterType::Triangle)
    };

    Ok(CapturedImage::new(DynamicImage::ImageRgba8(rgba).to_rgb8()))
}

#[cfg(feature = "desktop")]
pub use xcap_backend::XcapDisplay;

#[cfg(feature = "desktop")]
mod xcap_backend {
    use super::{DisplayCapture, DisplayError, RawFrame};
    use crate::capture::region::crop_rgba;
    use crate::capture::CaptureRegion;
    use image::DynamicImage;
    use xcap::Monitor;

    /// Captures from the primary monitor. Regions are relative to its
    /// top-left corner.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct XcapDisplay;

    impl XcapDisplay {
        pub fn new() -> Self {
            Self
        }

        fn primary_monitor() -> Result<Monitor, DisplayError> {
            let monitors =
                Monitor::all().map_err(|e| DisplayError::MonitorEnumeration(e.to_string()))?;

            let mut fallback = None;
            for monitor in monitors {
                if monitor.is_primary().unwrap_or(false) {
                    return Ok(monitor);
                }
                // If no monitor reports as primary, use the first one
                fallback.get_or_insert(monitor);
            }
            fallback.ok_or(DisplayError::NoMonitor)
        }

        fn capture_primary() -> Result<DynamicImage, DisplayError> {
            let image = Self::primary_monitor()?
                .capture_image()
                .map_err(|e| DisplayError::CaptureFailed(e.to_string()))?;
            Ok(DynamicImage::ImageRgba8(image))
        }
    }

    impl DisplayCapture for XcapDisplay {
        fn grab(&self, region: &CaptureRegion) -> Result<RawFrame, DisplayError> {
            let frame = Self::capture_primary()?;
            let cropped = crop_rgba(&frame, region)?;
            let (width, height) = cropped.dimensions();
            Ok(RawFrame {
                width,
                height,
                rgba: cropped.into_raw(),
            })
        }

        fn probe(&self) -> Result<(), DisplayError> {
            Self::capture_primary().map(|_| ())
        }
    }
}
