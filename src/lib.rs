//! Screen Capture: a see-through window you drag over part of the screen.
//!
//! Pressing Capture hides the window, grabs the pixels underneath it,
//! saves them to `screenshots/screen_YYYYMMDD_HHMMSS.png`, brings the window
//! back and optionally asks a vision model to describe the image.
//!
//! - Capture sequence (capture/), independent of any window system
//! - Analysis hook (analysis/)
//! - Configuration (config.rs)
//! - Tauri shell (shell/, `desktop` feature)

pub mod analysis;
pub mod capture;
pub mod config;

#[cfg(feature = "desktop")]
mod shell;

#[cfg(feature = "desktop")]
pub use shell::run;
