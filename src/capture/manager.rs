use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager, State};
use uuid::Uuid;

use super::{normalize_image, CapturePayload, CaptureSnapshot, CaptureSource, StreamHandle};
use crate::ocr;
use crate::session::StudentData;
use crate::{emit_app_state, AppState, PendingTask};

#[derive(Serialize, Clone)]
struct AcquireEvent<'a> {
    id: Uuid,
    facing: &'a str,
}

#[derive(Serialize, Clone)]
struct ReleaseEvent {
    id: Uuid,
}

/// Tell the webview to open the camera (`getUserMedia`, preferring the
/// configured facing mode) under the given handle.
pub(crate) fn notify_stream_acquired(app: &AppHandle, handle: &StreamHandle, facing: &str) {
    let event = AcquireEvent {
        id: handle.id,
        facing,
    };
    if let Err(e) = app.emit("camera://acquire", event) {
        warn!("Failed to notify webview of stream acquisition: {}", e);
    }
}

/// Tell the webview to stop the tracks behind a released handle.
pub(crate) fn notify_stream_released(app: &AppHandle, handle: &StreamHandle) {
    if let Err(e) = app.emit("camera://release", ReleaseEvent { id: handle.id }) {
        warn!("Failed to notify webview of stream release: {}", e);
    }
}

fn emit_capture_state(app: &AppHandle, state: &AppState) -> CaptureSnapshot {
    let snapshot = state.capture.lock().snapshot();
    if let Err(e) = app.emit("capture://state-changed", snapshot.clone()) {
        warn!("Failed to notify webview of capture state change: {}", e);
    }
    snapshot
}

#[tauri::command]
pub fn get_capture_state(state: State<'_, AppState>) -> CaptureSnapshot {
    state.capture.lock().snapshot()
}

/// Outcome of the permission prompt. Granting acquires the camera stream;
/// the single-owner rule releases any handle that was still outstanding.
#[tauri::command]
pub fn camera_permission(
    app: AppHandle,
    state: State<'_, AppState>,
    allow: bool,
) -> Result<CaptureSnapshot, String> {
    if allow {
        let swap = state
            .capture
            .lock()
            .request_stream("grant camera access")
            .map_err(|e| e.to_string())?;
        if let Some(old) = swap.released {
            notify_stream_released(&app, &old);
        }
        notify_stream_acquired(&app, &swap.acquired, &state.settings.camera_facing);
        info!("🎥 Camera stream acquired: {}", swap.acquired.id);
    } else {
        state.capture.lock().deny().map_err(|e| e.to_string())?;
        info!("🚫 Camera permission denied by the user");
    }
    Ok(emit_capture_state(&app, &state))
}

/// The webview reports that opening the camera failed (permission or
/// device error). Recoverable: the error screen offers retry and upload.
#[tauri::command]
pub fn camera_error(
    app: AppHandle,
    state: State<'_, AppState>,
    message: String,
) -> CaptureSnapshot {
    warn!("📵 Camera failed: {}", message);
    if let Some(handle) = state.capture.lock().fail(message) {
        notify_stream_released(&app, &handle);
    }
    emit_capture_state(&app, &state)
}

#[tauri::command]
pub fn retry_camera(app: AppHandle, state: State<'_, AppState>) -> Result<CaptureSnapshot, String> {
    info!("🔁 Retrying camera access");
    state.capture.lock().retry().map_err(|e| e.to_string())?;
    Ok(emit_capture_state(&app, &state))
}

/// A still frame read from the live stream arrives as a data URL drawn
/// from the webview canvas. Normalizing it ends the live stream: only the
/// encoded still travels downstream.
#[tauri::command]
pub fn capture_photo(
    app: AppHandle,
    state: State<'_, AppState>,
    frame: String,
) -> Result<CaptureSnapshot, String> {
    let payload = match normalize_image(&frame, CaptureSource::Camera) {
        Ok(payload) => payload,
        Err(e) => {
            let message = format!("Could not read the captured frame: {}", e);
            warn!("📷 {}", message);
            if let Some(handle) = state.capture.lock().fail(message.clone()) {
                notify_stream_released(&app, &handle);
            }
            emit_capture_state(&app, &state);
            return Err(message);
        }
    };

    let released = state
        .capture
        .lock()
        .capture_still(payload)
        .map_err(|e| e.to_string())?;
    if let Some(handle) = released {
        notify_stream_released(&app, &handle);
    }
    info!("📸 Still frame captured, stream released");
    Ok(emit_capture_state(&app, &state))
}

/// Retake re-acquires the capture device; the swap releases first.
#[tauri::command]
pub fn retake_photo(app: AppHandle, state: State<'_, AppState>) -> Result<CaptureSnapshot, String> {
    let swap = state
        .capture
        .lock()
        .request_stream("retake the photo")
        .map_err(|e| e.to_string())?;
    if let Some(old) = swap.released {
        notify_stream_released(&app, &old);
    }
    notify_stream_acquired(&app, &swap.acquired, &state.settings.camera_facing);
    info!("🔄 Retaking photo, camera re-acquired: {}", swap.acquired.id);
    Ok(emit_capture_state(&app, &state))
}

/// File-picker fallback: reads the chosen image (data URL) into the same
/// payload representation as a captured frame, never touching the camera.
#[tauri::command]
pub fn upload_image(
    app: AppHandle,
    state: State<'_, AppState>,
    data: String,
) -> Result<CaptureSnapshot, String> {
    let payload = match normalize_image(&data, CaptureSource::Upload) {
        Ok(payload) => payload,
        Err(e) => {
            let message = format!("Could not read the selected file: {}", e);
            warn!("🗂️ {}", message);
            if let Some(handle) = state.capture.lock().fail(message.clone()) {
                notify_stream_released(&app, &handle);
            }
            emit_capture_state(&app, &state);
            return Err(message);
        }
    };

    info!(
        "🗂️ Image file accepted ({}x{}), bypassing the camera",
        payload.width, payload.height
    );
    let released = state
        .capture
        .lock()
        .accept_upload(payload)
        .map_err(|e| e.to_string())?;
    if let Some(handle) = released {
        notify_stream_released(&app, &handle);
    }
    Ok(emit_capture_state(&app, &state))
}

/// Run the (simulated) OCR stage over the captured image and hand the
/// extracted text to the review screen.
#[tauri::command]
pub fn process_capture(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<CaptureSnapshot, String> {
    state.cancel_pending();
    let payload = state
        .capture
        .lock()
        .begin_processing()
        .map_err(|e| e.to_string())?;
    let epoch = state.session.lock().epoch();

    info!(
        "🧾 Processing captured answer ({}x{}, source: {:?})",
        payload.width, payload.height, payload.source
    );
    schedule_ocr(&app, &state, epoch, payload);
    Ok(emit_capture_state(&app, &state))
}

/// The OCR stage is one cancellable timer task; its result is delivered
/// only if the session epoch is unchanged when it fires.
fn schedule_ocr(app: &AppHandle, state: &AppState, epoch: u64, payload: CapturePayload) {
    let delay = state.settings.ocr_delay();
    let app = app.clone();
    let handle = tauri::async_runtime::spawn(async move {
        tokio::time::sleep(delay).await;
        let state = app.state::<AppState>();
        let extracted = ocr::extract_text(&payload);
        let data = StudentData {
            answer: extracted.text,
            // The subject gets selected on the review screen.
            subject: String::new(),
            captured_image: Some(payload),
            timestamp: Utc::now(),
        };
        let applied = state.session.lock().receive_capture_if_current(epoch, data);
        if applied {
            info!("✅ Extracted text delivered to the review screen");
            state.pending.lock().take();
            if let Some(handle) = state.capture.lock().reset() {
                notify_stream_released(&app, &handle);
            }
            emit_app_state(&app, &state);
            emit_capture_state(&app, &state);
        } else {
            info!("🗑️ Discarding stale extraction; the page changed");
        }
    });
    *state.pending.lock() = Some(PendingTask { epoch, handle });
}
