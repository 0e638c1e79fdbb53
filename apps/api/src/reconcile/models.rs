//! Wire types for parsed resume data.
//!
//! Every extracted candidate value is wrapped in [`ParsedField`]: the value,
//! a confidence score in `[0, 1]`, and a user-controlled `selected` flag.
//! Confidence is advisory only — it drives review badges and never blocks
//! selection or commit.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Review badge derived from a confidence score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ConfidenceBand::High
        } else if score >= 0.7 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// A candidate value extracted from an uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedField<T> {
    pub value: T,
    pub confidence: f64,
    pub selected: bool,
}

impl<T> ParsedField<T> {
    /// Wraps a freshly extracted value. Extracted fields start out selected;
    /// the user deselects during review.
    pub fn new(value: T, confidence: f64) -> Self {
        ParsedField {
            value,
            confidence: confidence.clamp(0.0, 1.0),
            selected: true,
        }
    }

    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.confidence)
    }
}

/// Extracted header/contact candidates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ParsedPersonalInfo {
    #[serde(default)]
    pub full_name: Option<ParsedField<String>>,
    #[serde(default)]
    pub email: Option<ParsedField<String>>,
    #[serde(default)]
    pub phone: Option<ParsedField<String>>,
    #[serde(default)]
    pub location: Option<ParsedField<String>>,
    #[serde(default)]
    pub linkedin: Option<ParsedField<String>>,
    #[serde(default)]
    pub github: Option<ParsedField<String>>,
    #[serde(default)]
    pub summary: Option<ParsedField<String>>,
}

/// Extracted experience entry. `provisional_id` is a UI-only identifier for
/// the review screen; it never becomes a persisted item id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedExperience {
    #[serde(default)]
    pub provisional_id: Option<String>,
    pub role: String,
    pub company: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedEducation {
    #[serde(default)]
    pub provisional_id: Option<String>,
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedProject {
    #[serde(default)]
    pub provisional_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedCertification {
    #[serde(default)]
    pub provisional_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Everything the parser extracted from one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ParsedResume {
    #[serde(default)]
    pub personal_info: ParsedPersonalInfo,
    #[serde(default)]
    pub experience: Vec<ParsedField<ParsedExperience>>,
    #[serde(default)]
    pub education: Vec<ParsedField<ParsedEducation>>,
    #[serde(default)]
    pub skills: Vec<ParsedField<String>>,
    #[serde(default)]
    pub projects: Vec<ParsedField<ParsedProject>>,
    #[serde(default)]
    pub certifications: Vec<ParsedField<ParsedCertification>>,
}
