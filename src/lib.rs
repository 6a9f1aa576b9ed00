#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Result;
use log::{info, warn};
use parking_lot::Mutex;
use tauri::{AppHandle, Builder, Emitter};
use tauri_plugin_opener::OpenerExt;

pub mod analysis;
pub mod capture;
pub mod dashboard;
pub mod ocr;
pub mod session;
pub mod settings;

use analysis::AnalysisEngine;
use capture::CaptureSession;
use session::{AppSnapshot, StudySession};
use settings::Settings;

/// A scheduled timer task (submit, extraction, or analysis stage) together
/// with the session epoch it was started under. At most one is pending;
/// navigating away aborts it.
pub struct PendingTask {
    pub epoch: u64,
    pub handle: tauri::async_runtime::JoinHandle<()>,
}

/// All mutable application state, managed by Tauri and handed to commands
/// as a `State<AppState>`.
pub struct AppState {
    pub settings: Settings,
    pub session: Mutex<StudySession>,
    pub capture: Mutex<CaptureSession>,
    pub engine: AnalysisEngine,
    pub pending: Mutex<Option<PendingTask>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(Settings::load())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            session: Mutex::new(StudySession::new()),
            capture: Mutex::new(CaptureSession::new()),
            engine: AnalysisEngine::new(),
            pending: Mutex::new(None),
        }
    }

    /// Abort whichever timer task is still pending. Called on every
    /// navigation so a stage scheduled for an abandoned page never fires.
    pub fn cancel_pending(&self) {
        if let Some(task) = self.pending.lock().take() {
            info!("🛑 Cancelling pending task for epoch {}", task.epoch);
            task.handle.abort();
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Push the current session snapshot to the webview and return it, so
/// commands can both notify and reply with the same state.
pub(crate) fn emit_app_state(app: &AppHandle, state: &AppState) -> AppSnapshot {
    let snapshot = state.session.lock().snapshot();
    if let Err(e) = app.emit("app://state-changed", snapshot.clone()) {
        warn!("Failed to notify webview of state change: {}", e);
    }
    snapshot
}

/// Open a recommended resource in the system browser.
#[tauri::command]
async fn open_resource(app: AppHandle, url: String) -> Result<(), String> {
    info!("🔗 Opening resource: {}", url);
    app.opener()
        .open_url(&url, None::<&str>)
        .map_err(|e| format!("Failed to open {}: {}", url, e))
}

pub fn run() -> Result<()> {
    info!("ScholarLens starting...");

    Builder::default()
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            session::manager::get_app_state,
            session::manager::choose_scan,
            session::manager::choose_type,
            session::manager::go_back,
            session::manager::try_again,
            session::manager::back_to_edit,
            session::manager::open_teacher_view,
            session::manager::validate_draft,
            session::manager::submit_answer,
            capture::manager::get_capture_state,
            capture::manager::camera_permission,
            capture::manager::camera_error,
            capture::manager::retry_camera,
            capture::manager::capture_photo,
            capture::manager::retake_photo,
            capture::manager::upload_image,
            capture::manager::process_capture,
            dashboard::get_student_progress,
            dashboard::get_dashboard_stats,
            dashboard::get_subject_performance,
            open_resource
        ])
        .manage(AppState::new())
        .setup(|_app| {
            info!("🚀 ScholarLens ready on the landing page");
            Ok(())
        })
        .run(tauri::generate_context!())?;

    Ok(())
}
