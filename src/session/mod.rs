pub mod manager;

pub use manager::*;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::analysis::Analysis;
use crate::capture::CapturePayload;

/// Subjects a student can submit under.
pub const SUBJECTS: [&str; 10] = [
    "Mathematics",
    "Science",
    "English",
    "History",
    "Geography",
    "Physics",
    "Chemistry",
    "Biology",
    "Literature",
    "Social Studies",
];

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Landing,
    Camera,
    Input,
    Processing,
    Results,
    Teacher,
}

/// A finalized submission. Immutable once built; discarded when the user
/// restarts the flow.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StudentData {
    pub answer: String,
    pub subject: String,
    pub captured_image: Option<CapturePayload>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("cannot {action} from the {page:?} page")]
    InvalidPage {
        action: &'static str,
        page: Page,
    },
    #[error("a submission is already in progress")]
    SubmissionInFlight,
}

/// The typed-answer form. Failing a rule keeps the submit button disabled;
/// it never raises past the advisory message.
#[derive(Deserialize, Clone, Debug, Validate)]
pub struct AnswerDraft {
    #[validate(custom = "validate_answer_length")]
    pub answer: String,
    #[validate(custom = "validate_subject")]
    pub subject: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct DraftValidation {
    pub valid: bool,
    pub messages: Vec<String>,
}

fn validate_answer_length(answer: &str) -> Result<(), ValidationError> {
    if answer.trim().chars().count() > 10 {
        Ok(())
    } else {
        Err(ValidationError::new("answer_too_short"))
    }
}

fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    if SUBJECTS.contains(&subject) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_subject"))
    }
}

impl AnswerDraft {
    /// Run the form rules and map them to the advisory strings shown
    /// under the submit button.
    pub fn check(&self) -> DraftValidation {
        match self.validate() {
            Ok(()) => DraftValidation {
                valid: true,
                messages: Vec::new(),
            },
            Err(errors) => {
                let mut messages = Vec::new();
                if errors.field_errors().contains_key("subject") {
                    messages.push("Please select a subject.".to_string());
                }
                if errors.field_errors().contains_key("answer") {
                    messages.push(
                        "Please write a more detailed answer (at least 10 characters)."
                            .to_string(),
                    );
                }
                DraftValidation {
                    valid: false,
                    messages,
                }
            }
        }
    }
}

/// Serializable view of the orchestrator handed to the webview on every
/// state change.
#[derive(Serialize, Clone, Debug)]
pub struct AppSnapshot {
    pub page: Page,
    pub student_data: Option<StudentData>,
    pub analysis: Option<Analysis>,
    pub submitting: bool,
    pub subjects: Vec<&'static str>,
}

/// Top-level page orchestrator. One instance lives in the managed
/// `AppState`; commands mutate it through the transition methods below,
/// never by writing fields directly. `Results` is only reachable through
/// `deliver_analysis`, which requires both the submission and the
/// analysis, so the results page can always render.
#[derive(Debug)]
pub struct StudySession {
    page: Page,
    student_data: Option<StudentData>,
    analysis: Option<Analysis>,
    epoch: u64,
    submitting: bool,
}

impl StudySession {
    pub fn new() -> Self {
        Self {
            page: Page::Landing,
            student_data: None,
            analysis: None,
            epoch: 0,
            submitting: false,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Monotonic transition counter. A timer task records the epoch when
    /// it is scheduled and delivers only if it still matches, so results
    /// that race a navigation are discarded.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn student_data(&self) -> Option<&StudentData> {
        self.student_data.as_ref()
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn goto(&mut self, page: Page) {
        self.page = page;
        self.epoch += 1;
        // Navigating away abandons any submission still in its delay; the
        // epoch bump makes the in-flight task discard itself, so the guard
        // must not stay set.
        self.submitting = false;
    }

    pub fn choose_scan(&mut self) -> Result<(), TransitionError> {
        self.expect_page(Page::Landing, "scan an answer")?;
        self.goto(Page::Camera);
        Ok(())
    }

    pub fn choose_type(&mut self) -> Result<(), TransitionError> {
        self.expect_page(Page::Landing, "type an answer")?;
        self.goto(Page::Input);
        Ok(())
    }

    /// Camera flow finished: carry the captured image and extracted text
    /// forward as a partial submission and move to the review screen.
    pub fn receive_capture(&mut self, data: StudentData) -> Result<(), TransitionError> {
        self.expect_page(Page::Camera, "deliver a captured answer")?;
        self.student_data = Some(data);
        self.goto(Page::Input);
        Ok(())
    }

    /// Epoch-guarded variant used by the OCR timer task. Returns whether
    /// the capture was applied.
    pub fn receive_capture_if_current(&mut self, epoch: u64, data: StudentData) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.receive_capture(data).is_ok()
    }

    /// Mark a submission in flight. Duplicate submits are refused until
    /// the current one settles.
    pub fn begin_submission(&mut self) -> Result<(), TransitionError> {
        self.expect_page(Page::Input, "submit an answer")?;
        if self.submitting {
            return Err(TransitionError::SubmissionInFlight);
        }
        self.submitting = true;
        self.epoch += 1;
        Ok(())
    }

    /// The simulated submit delay elapsed: store the finalized submission
    /// and move to the processing screen.
    pub fn start_processing(&mut self, data: StudentData) -> Result<(), TransitionError> {
        self.expect_page(Page::Input, "start processing")?;
        self.student_data = Some(data);
        self.submitting = false;
        self.goto(Page::Processing);
        Ok(())
    }

    /// The analysis stage finished. Requires the stored submission, which
    /// `start_processing` guarantees; no other method reaches `Results`.
    pub fn deliver_analysis(&mut self, analysis: Analysis) -> Result<(), TransitionError> {
        self.expect_page(Page::Processing, "deliver an analysis")?;
        if self.student_data.is_none() {
            return Err(TransitionError::InvalidPage {
                action: "deliver an analysis without a submission",
                page: self.page,
            });
        }
        self.analysis = Some(analysis);
        self.goto(Page::Results);
        Ok(())
    }

    /// Epoch-guarded variant used by the analysis timer task.
    pub fn deliver_analysis_if_current(&mut self, epoch: u64, analysis: Analysis) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.deliver_analysis(analysis).is_ok()
    }

    /// "Back to edit" always routes to the input screen, whether or not
    /// the submission came from the camera.
    pub fn back_to_edit(&mut self) -> Result<(), TransitionError> {
        self.expect_page(Page::Results, "go back to edit")?;
        self.goto(Page::Input);
        Ok(())
    }

    /// "Try again" and every back-to-start affordance: clear the session.
    pub fn reset_to_landing(&mut self) {
        self.student_data = None;
        self.analysis = None;
        self.submitting = false;
        self.goto(Page::Landing);
    }

    /// The teacher view is reachable from every other page.
    pub fn open_teacher(&mut self) -> Result<(), TransitionError> {
        self.expect_not_page(Page::Teacher, "open the teacher view")?;
        self.goto(Page::Teacher);
        Ok(())
    }

    /// Context-sensitive back button. From the review screen a camera
    /// submission goes back to the camera; everything else unwinds to the
    /// landing page (clearing the session) or to the previous screen.
    pub fn go_back(&mut self) -> Result<(), TransitionError> {
        match self.page {
            Page::Camera => {
                self.reset_to_landing();
                Ok(())
            }
            Page::Input => {
                let from_camera = self
                    .student_data
                    .as_ref()
                    .map(|d| d.captured_image.is_some())
                    .unwrap_or(false);
                if from_camera {
                    self.goto(Page::Camera);
                } else {
                    self.reset_to_landing();
                }
                Ok(())
            }
            Page::Results => self.back_to_edit(),
            Page::Teacher => {
                self.reset_to_landing();
                Ok(())
            }
            page => Err(TransitionError::InvalidPage {
                action: "go back",
                page,
            }),
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            page: self.page,
            student_data: self.student_data.clone(),
            analysis: self.analysis.clone(),
            submitting: self.submitting,
            subjects: SUBJECTS.to_vec(),
        }
    }

    fn expect_page(&self, page: Page, action: &'static str) -> Result<(), TransitionError> {
        if self.page == page {
            Ok(())
        } else {
            Err(TransitionError::InvalidPage {
                action,
                page: self.page,
            })
        }
    }

    fn expect_not_page(&self, page: Page, action: &'static str) -> Result<(), TransitionError> {
        if self.page != page {
            Ok(())
        } else {
            Err(TransitionError::InvalidPage {
                action,
                page: self.page,
            })
        }
    }
}

impl Default for StudySession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisEngine;
    use crate::capture::{CapturePayload, CaptureSource};

    fn typed_submission() -> StudentData {
        StudentData {
            answer: "Photosynthesis converts light energy into chemical energy.".to_string(),
            subject: "Science".to_string(),
            captured_image: None,
            timestamp: Utc::now(),
        }
    }

    fn camera_submission() -> StudentData {
        StudentData {
            captured_image: Some(CapturePayload {
                data: "aGVsbG8=".to_string(),
                width: 2,
                height: 2,
                source: CaptureSource::Camera,
            }),
            ..typed_submission()
        }
    }

    fn analysis() -> crate::analysis::Analysis {
        AnalysisEngine::with_seed(5).analyze("short answer", "Science")
    }

    fn session_at_processing(data: StudentData) -> StudySession {
        let mut session = StudySession::new();
        session.choose_type().unwrap();
        session.begin_submission().unwrap();
        session.start_processing(data).unwrap();
        session
    }

    #[test]
    fn landing_branches_to_camera_or_input() {
        let mut session = StudySession::new();
        session.choose_scan().unwrap();
        assert_eq!(session.page(), Page::Camera);

        let mut session = StudySession::new();
        session.choose_type().unwrap();
        assert_eq!(session.page(), Page::Input);
    }

    #[test]
    fn results_requires_both_submission_and_analysis() {
        let mut session = StudySession::new();
        // No path sets the results page without going through processing.
        assert!(session.deliver_analysis(analysis()).is_err());

        let mut session = session_at_processing(typed_submission());
        session.deliver_analysis(analysis()).unwrap();
        assert_eq!(session.page(), Page::Results);
        assert!(session.student_data().is_some());
        assert!(session.analysis().is_some());
    }

    #[test]
    fn duplicate_submissions_are_refused() {
        let mut session = StudySession::new();
        session.choose_type().unwrap();
        session.begin_submission().unwrap();
        assert!(matches!(
            session.begin_submission(),
            Err(TransitionError::SubmissionInFlight)
        ));
    }

    #[test]
    fn stale_timer_results_are_discarded() {
        let mut session = session_at_processing(typed_submission());
        let epoch = session.epoch();
        // User navigates away before the analysis timer fires.
        session.open_teacher().unwrap();
        assert!(!session.deliver_analysis_if_current(epoch, analysis()));
        assert_eq!(session.page(), Page::Teacher);
        assert!(session.analysis().is_none());
    }

    #[test]
    fn current_timer_results_are_applied() {
        let mut session = session_at_processing(typed_submission());
        let epoch = session.epoch();
        assert!(session.deliver_analysis_if_current(epoch, analysis()));
        assert_eq!(session.page(), Page::Results);
    }

    #[test]
    fn abandoning_a_submission_by_navigating_frees_the_guard() {
        let mut session = StudySession::new();
        session.choose_scan().unwrap();
        let epoch = session.epoch();
        assert!(session.receive_capture_if_current(epoch, camera_submission()));
        session.begin_submission().unwrap();

        // User backs out to the camera while the submit delay is pending.
        session.go_back().unwrap();
        assert_eq!(session.page(), Page::Camera);
        assert!(!session.is_submitting());

        // A fresh capture and submit must not be refused as a duplicate.
        let epoch = session.epoch();
        assert!(session.receive_capture_if_current(epoch, camera_submission()));
        session.begin_submission().unwrap();
        assert!(session.is_submitting());
    }

    #[test]
    fn captured_answers_move_to_the_review_screen() {
        let mut session = StudySession::new();
        session.choose_scan().unwrap();
        let epoch = session.epoch();
        assert!(session.receive_capture_if_current(epoch, camera_submission()));
        assert_eq!(session.page(), Page::Input);
        assert!(session.student_data().unwrap().captured_image.is_some());
    }

    #[test]
    fn back_to_edit_always_returns_to_input() {
        for data in [typed_submission(), camera_submission()] {
            let mut session = session_at_processing(data);
            session.deliver_analysis(analysis()).unwrap();
            session.back_to_edit().unwrap();
            assert_eq!(session.page(), Page::Input);
            // The submission survives so the form can be pre-filled.
            assert!(session.student_data().is_some());
        }
    }

    #[test]
    fn back_from_review_depends_on_the_capture_origin() {
        let mut session = StudySession::new();
        session.choose_scan().unwrap();
        let epoch = session.epoch();
        session.receive_capture_if_current(epoch, camera_submission());
        session.go_back().unwrap();
        assert_eq!(session.page(), Page::Camera);

        let mut session = StudySession::new();
        session.choose_type().unwrap();
        session.go_back().unwrap();
        assert_eq!(session.page(), Page::Landing);
    }

    #[test]
    fn teacher_view_opens_from_anywhere_and_back_clears() {
        let mut session = session_at_processing(typed_submission());
        session.open_teacher().unwrap();
        assert_eq!(session.page(), Page::Teacher);
        assert!(session.open_teacher().is_err());
        session.go_back().unwrap();
        assert_eq!(session.page(), Page::Landing);
        assert!(session.student_data().is_none());
        assert!(session.analysis().is_none());
    }

    #[test]
    fn try_again_clears_everything() {
        let mut session = session_at_processing(typed_submission());
        session.deliver_analysis(analysis()).unwrap();
        session.reset_to_landing();
        assert_eq!(session.page(), Page::Landing);
        assert!(session.student_data().is_none());
        assert!(session.analysis().is_none());
        assert!(!session.is_submitting());
    }

    #[test]
    fn drafts_need_a_subject_and_a_real_answer() {
        let draft = AnswerDraft {
            answer: "too short".to_string(),
            subject: String::new(),
        };
        let validation = draft.check();
        assert!(!validation.valid);
        assert_eq!(validation.messages.len(), 2);

        let draft = AnswerDraft {
            answer: "     padded but still too short once trimmed? no".to_string(),
            subject: "Science".to_string(),
        };
        assert!(draft.check().valid);

        let draft = AnswerDraft {
            answer: "          1234567890".to_string(),
            subject: "Science".to_string(),
        };
        // Exactly 10 characters after trimming is still too short.
        assert!(!draft.check().valid);
    }

    #[test]
    fn ten_trimmed_characters_never_submit_regardless_of_subject() {
        for subject in SUBJECTS {
            let draft = AnswerDraft {
                answer: "  answer  ".to_string(),
                subject: subject.to_string(),
            };
            assert!(!draft.check().valid);
        }
    }

    #[test]
    fn unknown_subjects_are_rejected_by_the_form() {
        let draft = AnswerDraft {
            answer: "a perfectly reasonable length answer".to_string(),
            subject: "Astrology".to_string(),
        };
        let validation = draft.check();
        assert!(!validation.valid);
        assert_eq!(validation.messages, vec!["Please select a subject.".to_string()]);
    }
}
