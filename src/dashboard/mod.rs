use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Serialize, Deserialize};

use crate::analysis::UnderstandingLevel;

/// One prior submission as shown on the teacher dashboard. The roster is
/// fixture data for the demo; new submissions are not persisted into it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StudentProgress {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub understanding_level: UnderstandingLevel,
    pub confidence: u8,
    pub timestamp: DateTime<Utc>,
    pub answer: String,
}

/// Roster row plus the display strings the dashboard renders.
#[derive(Serialize, Clone, Debug)]
pub struct StudentProgressRow {
    #[serde(flatten)]
    pub progress: StudentProgress,
    pub understanding_label: &'static str,
    pub last_activity: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_students: usize,
    pub avg_confidence: u32,
    pub understands_count: usize,
    pub partial_count: usize,
    pub needs_help_count: usize,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SubjectPerformance {
    pub subject: String,
    pub avg_confidence: u32,
}

/// Subjects broken out on the performance panel.
const PERFORMANCE_SUBJECTS: [&str; 4] = ["Mathematics", "Science", "English", "History"];

pub fn mock_student_progress() -> Vec<StudentProgress> {
    let now = Utc::now();
    vec![
        StudentProgress {
            id: "1".to_string(),
            name: "Emma Johnson".to_string(),
            subject: "Mathematics".to_string(),
            understanding_level: UnderstandingLevel::Understands,
            confidence: 87,
            timestamp: now - Duration::hours(2),
            answer: "To solve this quadratic equation, I first identify the coefficients..."
                .to_string(),
        },
        StudentProgress {
            id: "2".to_string(),
            name: "Alex Chen".to_string(),
            subject: "Science".to_string(),
            understanding_level: UnderstandingLevel::Partial,
            confidence: 62,
            timestamp: now - Duration::hours(4),
            answer: "Photosynthesis is when plants make food from sunlight...".to_string(),
        },
        StudentProgress {
            id: "3".to_string(),
            name: "Sarah Williams".to_string(),
            subject: "English".to_string(),
            understanding_level: UnderstandingLevel::Understands,
            confidence: 94,
            timestamp: now - Duration::hours(6),
            answer: "The author uses symbolism throughout the novel to represent...".to_string(),
        },
        StudentProgress {
            id: "4".to_string(),
            name: "Michael Brown".to_string(),
            subject: "History".to_string(),
            understanding_level: UnderstandingLevel::NeedsRemedial,
            confidence: 34,
            timestamp: now - Duration::hours(8),
            answer: "The war happened because countries fought.".to_string(),
        },
        StudentProgress {
            id: "5".to_string(),
            name: "Lisa Garcia".to_string(),
            subject: "Mathematics".to_string(),
            understanding_level: UnderstandingLevel::Partial,
            confidence: 71,
            timestamp: now - Duration::hours(10),
            answer: "I think the answer is 42 but I'm not sure about the steps...".to_string(),
        },
    ]
}

/// Filter the roster by a free-text search (case-insensitive substring on
/// name or subject) and a subject filter (`all` passes everything). An
/// empty search with `all` returns the roster unchanged, in order.
pub fn filter_students(
    students: &[StudentProgress],
    search_term: &str,
    subject_filter: &str,
) -> Vec<StudentProgress> {
    let search = search_term.to_lowercase();
    let subject = subject_filter.to_lowercase();

    students
        .iter()
        .filter(|student| {
            let matches_search = student.name.to_lowercase().contains(&search)
                || student.subject.to_lowercase().contains(&search);
            let matches_subject =
                subject == "all" || student.subject.to_lowercase().contains(&subject);
            matches_search && matches_subject
        })
        .cloned()
        .collect()
}

/// Summary numbers for the stat cards. An empty roster reports zeroes
/// across the board; the mean is never NaN.
pub fn class_stats(students: &[StudentProgress]) -> DashboardStats {
    let total_students = students.len();
    let avg_confidence = if total_students == 0 {
        0
    } else {
        let sum: u32 = students.iter().map(|s| s.confidence as u32).sum();
        (sum as f64 / total_students as f64).round() as u32
    };

    let count_level = |level: UnderstandingLevel| {
        students
            .iter()
            .filter(|s| s.understanding_level == level)
            .count()
    };

    DashboardStats {
        total_students,
        avg_confidence,
        understands_count: count_level(UnderstandingLevel::Understands),
        partial_count: count_level(UnderstandingLevel::Partial),
        needs_help_count: count_level(UnderstandingLevel::NeedsRemedial),
    }
}

/// Mean confidence per subject for the performance panel; subjects with no
/// submissions report zero.
pub fn subject_performance(students: &[StudentProgress]) -> Vec<SubjectPerformance> {
    PERFORMANCE_SUBJECTS
        .iter()
        .map(|subject| {
            let rows: Vec<&StudentProgress> =
                students.iter().filter(|s| s.subject == *subject).collect();
            let avg_confidence = if rows.is_empty() {
                0
            } else {
                let sum: u32 = rows.iter().map(|s| s.confidence as u32).sum();
                (sum as f64 / rows.len() as f64).round() as u32
            };
            SubjectPerformance {
                subject: subject.to_string(),
                avg_confidence,
            }
        })
        .collect()
}

/// "Just now" / "Nh ago" / "Nd ago", matching the dashboard's activity
/// column.
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - timestamp).num_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        format!("{}d ago", hours / 24)
    }
}

fn to_row(progress: StudentProgress, now: DateTime<Utc>) -> StudentProgressRow {
    StudentProgressRow {
        understanding_label: progress.understanding_level.display_label(),
        last_activity: format_relative_time(progress.timestamp, now),
        progress,
    }
}

#[tauri::command]
pub fn get_student_progress(search_term: String, subject_filter: String) -> Vec<StudentProgressRow> {
    info!(
        "📊 Dashboard query: search={:?}, subject={:?}",
        search_term, subject_filter
    );
    let roster = mock_student_progress();
    let now = Utc::now();
    filter_students(&roster, &search_term, &subject_filter)
        .into_iter()
        .map(|progress| to_row(progress, now))
        .collect()
}

#[tauri::command]
pub fn get_dashboard_stats() -> DashboardStats {
    class_stats(&mock_student_progress())
}

#[tauri::command]
pub fn get_subject_performance() -> Vec<SubjectPerformance> {
    subject_performance(&mock_student_progress())
}
