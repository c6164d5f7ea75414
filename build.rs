//! Build script for the Screen Capture app.
//!
//! The Tauri codegen step only runs for the `desktop` build; the capture
//! library itself needs no build-time work.

fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
