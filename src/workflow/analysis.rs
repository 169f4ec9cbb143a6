use std::fmt;

use serde::{Deserialize, Serialize};

/// Appeal recommendation produced by the legal analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Appeal,
    Maybe,
    DontAppeal,
    #[serde(other)]
    Undetermined,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Appeal => write!(f, "appeal"),
            Recommendation::Maybe => write!(f, "maybe"),
            Recommendation::DontAppeal => write!(f, "dont_appeal"),
            Recommendation::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// Estimated chance that an appeal succeeds. Unknown values read as `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealProbability {
    High,
    Medium,
    #[serde(other)]
    Low,
}

impl fmt::Display for AppealProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppealProbability::High => write!(f, "high"),
            AppealProbability::Medium => write!(f, "medium"),
            AppealProbability::Low => write!(f, "low"),
        }
    }
}

/// A defect found in the ticket itself (missing calibration, wrong section, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalIssue {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
}

/// Whether a result came from the analysis service or was synthesized locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Service,
    Fallback,
}

/// Outcome of the legal analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub legal_section: String,
    pub points: u32,
    pub appeal_probability: AppealProbability,
    pub recommendation: Recommendation,
    pub reasoning: String,
    pub technical_issues: Vec<TechnicalIssue>,
    pub detailed_analysis: String,
    pub source: ResultSource,
}

impl AnalysisResult {
    /// Placeholder used when the analysis call fails, so the workflow can
    /// still reach the results step. It makes no legal claim and is marked
    /// [`ResultSource::Fallback`].
    pub fn fallback() -> Self {
        Self {
            legal_section: "unknown".to_string(),
            points: 0,
            appeal_probability: AppealProbability::Low,
            recommendation: Recommendation::Undetermined,
            reasoning: "Automated analysis was unavailable. The report needs a manual review \
                        before deciding on an appeal."
                .to_string(),
            technical_issues: Vec::new(),
            detailed_analysis: String::new(),
            source: ResultSource::Fallback,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        self.source == ResultSource::Service
    }
}
