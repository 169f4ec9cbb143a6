use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::analysis::{AnalysisResult, Recommendation};
use crate::error::FlowError;

/// Number of steps in the analysis workflow.
pub const TOTAL_STEPS: u8 = 5;

/// The five steps of the workflow, in order.
///
/// UPLOAD → EDIT → ANALYZE → RESULTS → EXPORT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    Upload = 1,
    Edit = 2,
    Analyze = 3,
    Results = 4,
    Export = 5,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Upload,
        Step::Edit,
        Step::Analyze,
        Step::Results,
        Step::Export,
    ];

    /// One-based position of the step.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Step> {
        Step::ALL.get(usize::from(index).checked_sub(1)?).copied()
    }

    /// Short human title used by the progress view.
    pub fn title(self) -> &'static str {
        match self {
            Step::Upload => "Upload report",
            Step::Edit => "Review fields",
            Step::Analyze => "Legal analysis",
            Step::Results => "Results",
            Step::Export => "Export",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Upload => write!(f, "UPLOAD"),
            Step::Edit => write!(f, "EDIT"),
            Step::Analyze => write!(f, "ANALYZE"),
            Step::Results => write!(f, "RESULTS"),
            Step::Export => write!(f, "EXPORT"),
        }
    }
}

/// Where a step sits relative to the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Active,
    Pending,
}

/// A single extracted OCR value. The backend sends either text or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Blank means empty after trimming. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Number(_) => false,
            FieldValue::Text(text) => text.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// The selected document. `report_id` is assigned by the backend once the
/// file has actually been uploaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    /// `data:<mime>;base64,...` rendition of the file, for previews.
    pub file_data_url: Option<String>,
    #[serde(alias = "sessionId")]
    pub report_id: Option<String>,
}

/// Extracted fields and per-field confidence, as delivered by OCR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResults {
    #[serde(default, deserialize_with = "skip_null_entries")]
    pub extracted_fields: BTreeMap<String, FieldValue>,
    #[serde(default, deserialize_with = "skip_null_entries")]
    pub confidence_scores: BTreeMap<String, f64>,
}

/// OCR sends `null` for fields it could not read; those count as absent.
fn skip_null_entries<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = BTreeMap::<String, Option<V>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrData {
    pub extracted_fields: BTreeMap<String, FieldValue>,
    pub confidence_scores: BTreeMap<String, f64>,
    /// Set once the user has changed any field by hand.
    pub is_edited: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub is_processing: bool,
    pub progress: f64,
    pub results: Option<AnalysisResult>,
}

/// Display record for the results step, derived from the analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSummary {
    pub conclusion: Option<String>,
    pub recommendation: Option<Recommendation>,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub is_generated: bool,
    pub download_url: Option<String>,
}

/// Per-step payloads. Each record is written only by its own step's intents
/// and may be read by any later step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepData {
    pub upload: UploadInfo,
    pub ocr: OcrData,
    pub analysis: AnalysisData,
    pub results: ResultsSummary,
    pub pdf: ExportData,
}

/// Complete state of one analysis session.
///
/// Fields are crate-private: outside code reads through accessors and
/// changes state only by dispatching intents through
/// [`WorkflowEngine`](super::WorkflowEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub(crate) current_step: u8,
    pub(crate) total_steps: u8,
    pub(crate) can_proceed: bool,
    pub(crate) step_data: StepData,
    pub(crate) error: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            current_step: 1,
            total_steps: TOTAL_STEPS,
            can_proceed: false,
            step_data: StepData::default(),
            error: None,
        }
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn total_steps(&self) -> u8 {
        self.total_steps
    }

    /// The current position as a [`Step`].
    pub fn step(&self) -> Step {
        Step::from_index(self.current_step).unwrap_or(Step::Upload)
    }

    pub fn can_proceed(&self) -> bool {
        self.can_proceed
    }

    pub fn step_data(&self) -> &StepData {
        &self.step_data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.total_steps
    }

    pub fn step_status(&self, step: Step) -> StepStatus {
        match step.index().cmp(&self.current_step) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Active,
            std::cmp::Ordering::Greater => StepStatus::Pending,
        }
    }

    /// Fraction of the workflow reached, `current / total`.
    pub fn progress_ratio(&self) -> f64 {
        f64::from(self.current_step) / f64::from(self.total_steps)
    }

    /// Parses a snapshot, rejecting states that break the step invariants.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let state: WorkflowState = serde_json::from_str(json)?;
        if state.total_steps != TOTAL_STEPS {
            return Err(FlowError::InvalidSnapshot(format!(
                "expected {TOTAL_STEPS} steps, found {}",
                state.total_steps
            )));
        }
        if !(1..=state.total_steps).contains(&state.current_step) {
            return Err(FlowError::InvalidSnapshot(format!(
                "current step {} is outside 1..={}",
                state.current_step, state.total_steps
            )));
        }
        Ok(state)
    }

    pub fn to_json_pretty(&self) -> Result<String, FlowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), FlowError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, FlowError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
