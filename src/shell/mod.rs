//! Tauri application shell.
//!
//! Wires the capture orchestrator to a real window:
//! - capture window + `WindowState` adapter (window.rs)
//! - screen-recording permission check (permission.rs)
//! - Tauri command handlers for the page

mod permission;
mod window;

use crate::analysis::{self, BackgroundAnalysis};
use crate::capture::{self, CaptureOrchestrator, XcapDisplay};
use crate::config::AppConfig;
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use tauri::{Emitter, Manager};
use window::TauriWindow;

type DesktopOrchestrator = CaptureOrchestrator<TauriWindow, XcapDisplay>;

struct ShellState {
    orchestrator: Mutex<DesktopOrchestrator>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisPayload {
    path: String,
    description: Option<String>,
    error: Option<String>,
}

/// Tauri command: capture the region under the window.
///
/// Runs on the async runtime's worker pool, never the main thread, so the
/// event loop is free to apply the hide while the capture waits for it.
/// Returns the saved file path.
#[tauri::command(async)]
fn capture_once(state: tauri::State<'_, ShellState>) -> Result<String, String> {
    CaptureOrchestrator::capture_locked(&state.orchestrator)
        .map(|artifact| artifact.filepath.display().to_string())
        .map_err(|e| e.to_string())
}

/// Tauri command: quit (Quit button and Escape).
#[tauri::command]
fn quit_app(app: tauri::AppHandle) {
    log::info!("Quit requested");
    app.exit(0);
}

fn analysis_hook(app: &tauri::AppHandle, config: &AppConfig) -> Option<BackgroundAnalysis> {
    let analyzer = config.analysis.analyzer()?;
    let runtime = tauri::async_runtime::handle().inner().clone();
    let app = app.clone();

    Some(
        BackgroundAnalysis::new(analyzer, runtime).on_result(move |path: &Path, result| {
            let payload = AnalysisPayload {
                path: path.display().to_string(),
                description: result.as_ref().ok().cloned(),
                error: result.as_ref().err().map(|e| e.to_string()),
            };
            if let Err(e) = app.emit("analysis-complete", &payload) {
                log::warn!("[ANALYSIS] Could not notify window: {}", e);
            }
            analysis::log_result(path, result);
        }),
    )
}

/// Entry point, called by `main`.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("[CONFIG] {}", e);
            std::process::exit(2);
        }
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![capture_once, quit_app])
        .setup(move |app| {
            log::info!("Screen Capture starting up");

            let output_dir = &config.capture.output_dir;
            match capture::ensure_output_dir(output_dir) {
                Ok(()) => log::info!(
                    "Screenshots will be saved to: {}",
                    std::fs::canonicalize(output_dir)
                        .unwrap_or_else(|_| output_dir.clone())
                        .display()
                ),
                // Not fatal: every capture retries the create.
                Err(e) => log::error!("Error creating screenshots directory: {}", e),
            }

            let display = XcapDisplay::new();
            permission::check_screen_access(app.handle(), &display);

            let webview = window::build_capture_window(
                app.handle(),
                &config.window,
                &config.capture.appearance,
            )?;
            let window = TauriWindow::new(webview, &config.window);

            let mut orchestrator =
                CaptureOrchestrator::new(window, display, config.capture.clone());
            if let Some(hook) = analysis_hook(app.handle(), &config) {
                orchestrator = orchestrator.with_hook(Box::new(hook));
            }

            app.manage(ShellState {
                orchestrator: Mutex::new(orchestrator),
            });

            log::info!("Capture window ready");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running Screen Capture");
}
