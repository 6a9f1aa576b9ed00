use chrono::Utc;
use log::info;
use tauri::{AppHandle, Manager, State};

use crate::capture;
use crate::session::{AnswerDraft, AppSnapshot, DraftValidation, StudentData, TransitionError};
use crate::{emit_app_state, AppState, PendingTask};

#[tauri::command]
pub fn get_app_state(state: State<'_, AppState>) -> AppSnapshot {
    state.session.lock().snapshot()
}

#[tauri::command]
pub fn choose_scan(app: AppHandle, state: State<'_, AppState>) -> Result<AppSnapshot, String> {
    info!("📷 Student chose to scan a handwritten answer");
    state.cancel_pending();
    state
        .session
        .lock()
        .choose_scan()
        .map_err(|e| e.to_string())?;
    // The camera page always starts a fresh capture flow.
    release_capture(&app, &state);
    Ok(emit_app_state(&app, &state))
}

#[tauri::command]
pub fn choose_type(app: AppHandle, state: State<'_, AppState>) -> Result<AppSnapshot, String> {
    info!("⌨️ Student chose to type an answer");
    state.cancel_pending();
    state
        .session
        .lock()
        .choose_type()
        .map_err(|e| e.to_string())?;
    Ok(emit_app_state(&app, &state))
}

#[tauri::command]
pub fn go_back(app: AppHandle, state: State<'_, AppState>) -> Result<AppSnapshot, String> {
    info!("⬅️ Navigating back");
    state.cancel_pending();
    state.session.lock().go_back().map_err(|e| e.to_string())?;
    release_capture(&app, &state);
    Ok(emit_app_state(&app, &state))
}

#[tauri::command]
pub fn try_again(app: AppHandle, state: State<'_, AppState>) -> AppSnapshot {
    info!("🔄 Restarting the flow from the landing page");
    state.cancel_pending();
    state.session.lock().reset_to_landing();
    release_capture(&app, &state);
    emit_app_state(&app, &state)
}

#[tauri::command]
pub fn back_to_edit(app: AppHandle, state: State<'_, AppState>) -> Result<AppSnapshot, String> {
    info!("✏️ Returning to the input screen to edit the answer");
    state.cancel_pending();
    state
        .session
        .lock()
        .back_to_edit()
        .map_err(|e| e.to_string())?;
    Ok(emit_app_state(&app, &state))
}

#[tauri::command]
pub fn open_teacher_view(app: AppHandle, state: State<'_, AppState>) -> Result<AppSnapshot, String> {
    info!("🧑‍🏫 Opening the teacher dashboard");
    state.cancel_pending();
    state
        .session
        .lock()
        .open_teacher()
        .map_err(|e| e.to_string())?;
    release_capture(&app, &state);
    Ok(emit_app_state(&app, &state))
}

/// Re-run the form rules for inline feedback while the student types.
#[tauri::command]
pub fn validate_draft(answer: String, subject: String) -> DraftValidation {
    AnswerDraft { answer, subject }.check()
}

/// Submit the typed (or OCR-reviewed) answer. Invalid drafts and
/// duplicate submits come back as advisory messages, never as errors;
/// a valid submission moves to the processing page after the simulated
/// submit delay and schedules the analysis stage.
#[tauri::command]
pub async fn submit_answer(
    app: AppHandle,
    state: State<'_, AppState>,
    answer: String,
    subject: String,
) -> Result<DraftValidation, String> {
    let draft = AnswerDraft { answer, subject };
    let validation = draft.check();
    if !validation.valid {
        info!("📋 Submission refused by validation: {:?}", validation.messages);
        return Ok(validation);
    }

    let epoch = {
        let mut session = state.session.lock();
        match session.begin_submission() {
            Ok(()) => session.epoch(),
            Err(TransitionError::SubmissionInFlight) => {
                return Ok(DraftValidation {
                    valid: false,
                    messages: vec!["A submission is already being processed.".to_string()],
                })
            }
            Err(e) => return Err(e.to_string()),
        }
    };
    emit_app_state(&app, &state);

    info!(
        "🚀 Submitting {} answer for analysis ({} words)",
        draft.subject,
        draft.answer.split_whitespace().count()
    );
    tokio::time::sleep(state.settings.submit_delay()).await;

    // A camera submission carries its captured image forward.
    let captured_image = state
        .session
        .lock()
        .student_data()
        .and_then(|d| d.captured_image.clone());

    let data = StudentData {
        answer: draft.answer.trim().to_string(),
        subject: draft.subject.clone(),
        captured_image,
        timestamp: Utc::now(),
    };
    let answer_text = data.answer.clone();
    let subject_name = data.subject.clone();

    let analysis_epoch = {
        let mut session = state.session.lock();
        if session.epoch() != epoch {
            info!("🗑️ Discarding submission; the page changed while it was in flight");
            return Ok(validation);
        }
        session.start_processing(data).map_err(|e| e.to_string())?;
        session.epoch()
    };
    emit_app_state(&app, &state);

    schedule_analysis(&app, &state, analysis_epoch, answer_text, subject_name);

    Ok(validation)
}

/// One cancellable timer task stands in for the AI analysis stage. The
/// epoch recorded at scheduling time is re-checked on delivery so a result
/// that raced a navigation is dropped instead of clobbering the new page.
fn schedule_analysis(
    app: &AppHandle,
    state: &AppState,
    epoch: u64,
    answer: String,
    subject: String,
) {
    let delay = state.settings.analysis_delay();
    let app = app.clone();
    let handle = tauri::async_runtime::spawn(async move {
        tokio::time::sleep(delay).await;
        let state = app.state::<AppState>();
        let analysis = state.engine.analyze(&answer, &subject);
        let delivered = state
            .session
            .lock()
            .deliver_analysis_if_current(epoch, analysis);
        if delivered {
            info!("🎯 Analysis ready, showing results");
            state.pending.lock().take();
            emit_app_state(&app, &state);
        } else {
            info!("🗑️ Discarding stale analysis result");
        }
    });
    *state.pending.lock() = Some(PendingTask { epoch, handle });
}

/// Leaving (or re-entering) the camera flow drops any capture progress and
/// tells the webview to stop a live stream.
fn release_capture(app: &AppHandle, state: &AppState) {
    if let Some(handle) = state.capture.lock().reset() {
        capture::notify_stream_released(app, &handle);
    }
}
