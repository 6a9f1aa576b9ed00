pub mod catalog;
pub mod engine;

pub use catalog::recommendations_for;
pub use engine::AnalysisEngine;

use serde::{Serialize, Deserialize};

/// Three-tier classification of how well a submitted answer demonstrates
/// comprehension of the topic.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UnderstandingLevel {
    Understands,
    Partial,
    NeedsRemedial,
}

impl UnderstandingLevel {
    /// Human-readable label shown on the teacher dashboard.
    pub fn display_label(&self) -> &'static str {
        match self {
            UnderstandingLevel::Understands => "Understands",
            UnderstandingLevel::Partial => "Partial",
            UnderstandingLevel::NeedsRemedial => "Needs Help",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pdf,
    Video,
    Quiz,
    Practice,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A study resource suggested alongside an analysis. Catalog entries are
/// read-only reference data keyed by subject.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub title: String,
    pub description: String,
    pub url: String,
    pub difficulty: Difficulty,
    pub estimated_time: String,
}

/// Result of analyzing one submission. Produced once per submission and
/// never mutated afterwards.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Analysis {
    pub understanding_level: UnderstandingLevel,
    pub confidence: u8,
    pub explanation: String,
    pub key_points: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // The webview matches on these exact string tags; renaming a variant
    // must show up here before it breaks the renderer.
    #[test]
    fn understanding_levels_serialize_as_kebab_case_tags() {
        assert_eq!(
            serde_json::to_value(UnderstandingLevel::Understands).unwrap(),
            json!("understands")
        );
        assert_eq!(
            serde_json::to_value(UnderstandingLevel::Partial).unwrap(),
            json!("partial")
        );
        assert_eq!(
            serde_json::to_value(UnderstandingLevel::NeedsRemedial).unwrap(),
            json!("needs-remedial")
        );
    }

    #[test]
    fn recommendations_expose_their_kind_under_the_type_key() {
        let rec = Recommendation {
            kind: ResourceKind::Video,
            title: "Photosynthesis Explained".to_string(),
            description: "Visual explanation of the photosynthesis process".to_string(),
            url: "#".to_string(),
            difficulty: Difficulty::Intermediate,
            estimated_time: "15 min".to_string(),
        };
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["type"], json!("video"));
        assert_eq!(value["difficulty"], json!("intermediate"));
        assert!(value.get("kind").is_none());
    }
}
