//! Writes captures to disk as `screen_YYYYMMDD_HHMMSS.png`.
//!
//! Two captures in the same wall-clock second share a filename; the later
//! one overwrites the earlier.

use super::{CaptureArtifact, CaptureError, CapturedImage};
use chrono::{DateTime, Local};
use image::ImageFormat;
use std::path::Path;

/// Creates `dir` (and parents) if needed. Succeeds if it already exists.
pub fn ensure_output_dir(dir: &Path) -> Result<(), CaptureError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        CaptureError::PersistenceFailed(format!("cannot create {}: {}", dir.display(), e))
    })
}

pub fn capture_filename(timestamp: &DateTime<Local>) -> String {
    format!("screen_{}.png", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Saves `image` into `dir`, stamped with the current local time.
pub fn write(image: CapturedImage, dir: &Path) -> Result<CaptureArtifact, CaptureError> {
    write_at(image, dir, Local::now())
}

/// Saves `image` into `dir` under the name derived from `timestamp`.
///
/// The image is consumed. The file must exist after the encoder returns;
/// an encoder that reports success without producing a file is still a
/// [`CaptureError::PersistenceFailed`].
pub fn write_at(
    image: CapturedImage,
    dir: &Path,
    timestamp: DateTime<Local>,
) -> Result<CaptureArtifact, CaptureError> {
    ensure_output_dir(dir)?;

    let filepath = dir.join(capture_filename(&timestamp));
    log::debug!("[CAPTURE] Saving to {}", filepath.display());

    image
        .into_pixels()
        .save_with_format(&filepath, ImageFormat::Png)
        .map_err(|e| {
            CaptureError::PersistenceFailed(format!("{}: {}", filepath.display(), e))
        })?;

    verify_written(&filepath)?;
    log::info!("[CAPTURE] Screenshot saved: {}", filepath.display());

    Ok(CaptureArtifact {
        filepath,
        timestamp,
    })
}

fn verify_written(path: &Path) -> Result<(), CaptureError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(CaptureError::PersistenceFailed(format!(
            "{} is not a regular file after write",
            path.display()
        ))),
        Err(e) => Err(CaptureError::PersistenceFailed(format!(
            "{} missing after write: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> CapturedImage {
        CapturedImage::new(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn filename_uses_zero_padded_timestamp() {
        assert_eq!(capture_filename(&fixed_time()), "screen_20240309_070501.png");
    }

    #[test]
    fn creates_missing_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("screenshots");

        let artifact = write_at(solid(3, 2, [1, 2, 3]), &dir, fixed_time()).unwrap();

        assert_eq!(artifact.filepath, dir.join("screen_20240309_070501.png"));
        assert_eq!(artifact.timestamp, fixed_time());
        let saved = image::open(&artifact.filepath).unwrap();
        assert_eq!((saved.width(), saved.height()), (3, 2));
    }

    #[test]
    fn saved_png_has_no_alpha_channel() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = write_at(solid(2, 2, [9, 9, 9]), tmp.path(), fixed_time()).unwrap();

        let saved = image::open(&artifact.filepath).unwrap();
        assert_eq!(saved.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn same_second_write_overwrites() {
        let tmp = tempfile::tempdir().unwrap();

        write_at(solid(4, 4, [255, 0, 0]), tmp.path(), fixed_time()).unwrap();
        let second = write_at(solid(4, 4, [0, 0, 255]), tmp.path(), fixed_time()).unwrap();

        let files: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let saved = image::open(&second.filepath).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn unwritable_directory_is_persistence_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = write_at(solid(1, 1, [0, 0, 0]), &blocker, fixed_time());
        assert!(matches!(result, Err(CaptureError::PersistenceFailed(_))));
    }

    #[test]
    fn verify_rejects_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("screen_20240309_070501.png");
        assert!(matches!(
            verify_written(&missing),
            Err(CaptureError::PersistenceFailed(_))
        ));
    }
}
