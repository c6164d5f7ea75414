//! Startup check for screen-recording access.
//!
//! macOS hands back an error (or a blank frame) until the user allows the
//! host app under Privacy & Security. The app keeps running either way;
//! captures simply fail with `GrabFailed` until access is granted.

use crate::capture::DisplayCapture;
use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

const PERMISSION_HELP: &str = "\
Screen recording permission is required.

Please follow these steps:
1. Open System Settings
2. Go to Privacy & Security
3. Scroll to Screen Recording
4. Enable permission for this app (or your terminal)
5. Restart the application";

pub fn check_screen_access(app: &AppHandle, display: &impl DisplayCapture) {
    match display.probe() {
        Ok(()) => log::info!("Screen recording permission granted"),
        Err(e) => {
            log::warn!("Screen recording permission needed: {}", e);
            app.dialog()
                .message(PERMISSION_HELP)
                .title("Permission Required")
                .kind(MessageDialogKind::Warning)
                .show(|_| {});
        }
    }
}
