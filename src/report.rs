//! Results summary and the exported report.
//!
//! [`summarize`] turns an analysis result into the display record of the
//! results step. [`ExportReport`] is the document written by the export
//! step; its path becomes the state's download URL.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::FlowError;
use crate::workflow::{AnalysisResult, FieldValue, Recommendation, ResultsSummary, WorkflowState};

pub const DISCLAIMER: &str =
    "This report is a preliminary opinion only and does not constitute legal advice.";

const DEFAULT_EXPLANATION: &str =
    "The report was analyzed and contains points worth checking before deciding.";

/// Headline sentence for a recommendation.
pub fn conclusion_text(recommendation: Recommendation) -> &'static str {
    match recommendation {
        Recommendation::Appeal => "Appealing this ticket is recommended",
        Recommendation::Maybe => "Consider appealing this ticket",
        Recommendation::DontAppeal => "Appealing this ticket is not recommended",
        Recommendation::Undetermined => "Further review is required",
    }
}

/// Build the results-step record from an analysis result.
pub fn summarize(result: &AnalysisResult) -> ResultsSummary {
    let explanation = if result.reasoning.trim().is_empty() {
        DEFAULT_EXPLANATION.to_string()
    } else {
        result.reasoning.clone()
    };
    ResultsSummary {
        conclusion: Some(conclusion_text(result.recommendation).to_string()),
        recommendation: Some(result.recommendation),
        explanation,
    }
}

/// The exported summary of a finished analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub generated_at: DateTime<Utc>,
    pub file_name: String,
    pub report_id: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub analysis: AnalysisResult,
    pub summary: ResultsSummary,
    /// `false` when the analysis is the local fallback.
    pub authoritative: bool,
    pub disclaimer: &'static str,
}

impl ExportReport {
    pub fn from_state(state: &WorkflowState) -> Result<Self, FlowError> {
        let data = state.step_data();
        let analysis = data.analysis.results.clone().ok_or_else(|| {
            FlowError::MissingPrerequisite("no analysis result to export".to_string())
        })?;
        let summary = if data.results.conclusion.is_some() {
            data.results.clone()
        } else {
            summarize(&analysis)
        };
        Ok(Self {
            generated_at: Utc::now(),
            file_name: data.upload.file_name.clone(),
            report_id: data.upload.report_id.clone(),
            fields: data.ocr.extracted_fields.clone(),
            authoritative: analysis.is_authoritative(),
            analysis,
            summary,
            disclaimer: DISCLAIMER,
        })
    }

    /// File name used inside the output directory.
    pub fn output_file_name(&self) -> String {
        let id = self
            .report_id
            .as_deref()
            .unwrap_or("unsubmitted")
            .replace(|c: char| !c.is_ascii_alphanumeric() && c != '-', "_");
        format!("smarttraffic-report-{id}.json")
    }

    /// Write the report as pretty JSON into `dir`, returning the written path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, FlowError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.output_file_name());
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}
