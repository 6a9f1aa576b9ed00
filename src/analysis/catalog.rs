use super::{Difficulty, Recommendation, ResourceKind};

/// Look up the recommendation list for a subject. Lookup is over the
/// lowercased subject against the catalog keys (`math`, `science`,
/// `english`); anything unmapped falls back to the math list. The fallback
/// is an explicit default policy, not an error.
pub fn recommendations_for(subject: &str) -> Vec<Recommendation> {
    match subject.to_lowercase().as_str() {
        "science" => science_resources(),
        "english" => english_resources(),
        "math" => math_resources(),
        _ => math_resources(),
    }
}

fn math_resources() -> Vec<Recommendation> {
    vec![
        Recommendation {
            kind: ResourceKind::Pdf,
            title: "Algebra Fundamentals Guide".to_string(),
            description: "Comprehensive guide covering basic algebraic concepts and operations"
                .to_string(),
            url: "#".to_string(),
            difficulty: Difficulty::Beginner,
            estimated_time: "15 min".to_string(),
        },
        Recommendation {
            kind: ResourceKind::Video,
            title: "Khan Academy: Linear Equations".to_string(),
            description: "Step-by-step video tutorial on solving linear equations".to_string(),
            url: "#".to_string(),
            difficulty: Difficulty::Beginner,
            estimated_time: "12 min".to_string(),
        },
        Recommendation {
            kind: ResourceKind::Quiz,
            title: "Practice Quiz: Basic Algebra".to_string(),
            description: "Interactive quiz to test your understanding".to_string(),
            url: "#".to_string(),
            difficulty: Difficulty::Beginner,
            estimated_time: "10 min".to_string(),
        },
    ]
}

fn science_resources() -> Vec<Recommendation> {
    vec![
        Recommendation {
            kind: ResourceKind::Pdf,
            title: "Cell Structure and Function".to_string(),
            description: "Detailed overview of cellular components and their roles".to_string(),
            url: "#".to_string(),
            difficulty: Difficulty::Intermediate,
            estimated_time: "20 min".to_string(),
        },
        Recommendation {
            kind: ResourceKind::Video,
            title: "Photosynthesis Explained".to_string(),
            description: "Visual explanation of the photosynthesis process".to_string(),
            url: "#".to_string(),
            difficulty: Difficulty::Intermediate,
            estimated_time: "15 min".to_string(),
        },
    ]
}

fn english_resources() -> Vec<Recommendation> {
    vec![
        Recommendation {
            kind: ResourceKind::Pdf,
            title: "Essay Writing Techniques".to_string(),
            description: "Guide to structuring and writing effective essays".to_string(),
            url: "#".to_string(),
            difficulty: Difficulty::Intermediate,
            estimated_time: "25 min".to_string(),
        },
        Recommendation {
            kind: ResourceKind::Practice,
            title: "Grammar Practice Exercises".to_string(),
            description: "Interactive exercises for improving grammar skills".to_string(),
            url: "#".to_string(),
            difficulty: Difficulty::Beginner,
            estimated_time: "18 min".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_subjects_resolve_to_their_own_lists() {
        assert_eq!(recommendations_for("science"), science_resources());
        assert_eq!(recommendations_for("English"), english_resources());
        assert_eq!(recommendations_for("MATH"), math_resources());
    }

    #[test]
    fn unmapped_subjects_fall_back_to_math() {
        // The subject picker uses full names, so "Mathematics" lowercases
        // to a key that is not in the catalog and takes the fallback.
        assert_eq!(recommendations_for("Mathematics"), math_resources());
        assert_eq!(recommendations_for("History"), math_resources());
        assert_eq!(recommendations_for(""), math_resources());
    }
}
