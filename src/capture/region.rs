//! Pure region logic, the functional core of a capture.
//!
//! This module has zero infrastructure dependencies.
//! Window geometry in, capture rectangle out; monitor frame in, cropped
//! pixels out.

use super::{CaptureError, CaptureRegion, WindowGeometry};
use image::{DynamicImage, RgbaImage};

/// Height of the system menu bar strip excluded from every capture.
pub const MENU_BAR_OFFSET: u32 = 25;

/// Converts the window's geometry into the rectangle to grab, skipping
/// the default [`MENU_BAR_OFFSET`].
pub fn resolve(geometry: &WindowGeometry) -> Result<CaptureRegion, CaptureError> {
    resolve_with_offset(geometry, MENU_BAR_OFFSET)
}

/// Converts the window's geometry into the rectangle to grab.
///
/// The top edge moves down by `offset` and the height shrinks by the same
/// amount, so the region keeps its bottom edge. Fails with
/// [`CaptureError::InvalidRegion`] when nothing is left to capture.
pub fn resolve_with_offset(
    geometry: &WindowGeometry,
    offset: u32,
) -> Result<CaptureRegion, CaptureError> {
    let height = geometry.height.saturating_sub(offset);

    if geometry.width == 0 || height == 0 {
        return Err(CaptureError::InvalidRegion {
            width: geometry.width,
            height: geometry.height,
            offset,
        });
    }

    Ok(CaptureRegion {
        top: geometry.y.saturating_add(offset as i32),
        left: geometry.x,
        width: geometry.width,
        height,
    })
}

/// Crops a full-monitor frame down to `region`.
///
/// Regions that start left of or above the monitor, or run past its
/// right/bottom edge, are rejected rather than clamped: a silently
/// smaller screenshot would not match what the user framed.
pub fn crop_rgba(frame: &DynamicImage, region: &CaptureRegion) -> Result<RgbaImage, CropError> {
    if region.width == 0 || region.height == 0 {
        return Err(CropError::ZeroDimension);
    }

    let (frame_width, frame_height) = (frame.width(), frame.height());
    let out_of_bounds = || CropError::OutOfBounds {
        requested: (region.left, region.top, region.width, region.height),
        frame_size: (frame_width, frame_height),
    };

    let x = u32::try_from(region.left).map_err(|_| out_of_bounds())?;
    let y = u32::try_from(region.top).map_err(|_| out_of_bounds())?;

    let fits_x = x.checked_add(region.width).is_some_and(|r| r <= frame_width);
    let fits_y = y.checked_add(region.height).is_some_and(|b| b <= frame_height);
    if !fits_x || !fits_y {
        return Err(out_of_bounds());
    }

    Ok(frame.crop_imm(x, y, region.width, region.height).to_rgba8())
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds monitor bounds ({}x{})",
        requested.0, requested.1, requested.2, requested.3,
        frame_size.0, frame_size.1
    )]
    OutOfBounds {
        requested: (i32, i32, u32, u32),
        frame_size: (u32, u32),
    },
}
