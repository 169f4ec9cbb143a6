//! Wire types for the document service.
//!
//! Field names follow the backend's camelCase JSON. Responses are converted
//! into workflow records here so the engine never sees wire shapes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflow::{
    AnalysisResult, AppealProbability, FieldValue, OcrResults, Recommendation, ResultSource,
    TechnicalIssue,
};

/// A file picked for upload, kept outside the workflow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDocument {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Response from `POST upload/document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(alias = "sessionId")]
    pub report_id: String,
    #[serde(default)]
    pub ocr_results: Option<OcrResults>,
}

impl UploadResponse {
    /// OCR results with backend field names mapped to the ones the edit step uses.
    ///
    /// `violationDate` (`DD/MM/YYYY`) becomes `date` (`YYYY-MM-DD`) and
    /// `violationTime` is copied to `time`. A date that does not parse is
    /// left unmapped.
    pub fn normalized_ocr(&self) -> Option<OcrResults> {
        let mut ocr = self.ocr_results.clone()?;
        let fields = &mut ocr.extracted_fields;

        if let Some(date) = fields
            .get("violationDate")
            .and_then(FieldValue::as_text)
            .and_then(to_iso_date)
        {
            fields.insert("date".to_string(), FieldValue::Text(date));
        }
        if let Some(time) = fields.get("violationTime").cloned() {
            fields.insert("time".to_string(), time);
        }
        Some(ocr)
    }
}

fn to_iso_date(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Body of `POST upload/analyze/{reportId}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_fields: Option<BTreeMap<String, FieldValue>>,
}

/// Response from the analyze and results endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis_results: AnalysisPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub legal_analysis: LegalAnalysis,
    pub appeal_assessment: AppealAssessment,
    #[serde(default)]
    pub technical_issues: Vec<TechnicalIssue>,
    #[serde(default)]
    pub detailed_analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalAnalysis {
    pub section: String,
    #[serde(default)]
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealAssessment {
    pub probability: AppealProbability,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub reasoning: String,
}

impl From<AnalysisPayload> for AnalysisResult {
    fn from(payload: AnalysisPayload) -> Self {
        Self {
            legal_section: payload.legal_analysis.section,
            points: payload.legal_analysis.points,
            appeal_probability: payload.appeal_assessment.probability,
            recommendation: payload.appeal_assessment.recommendation,
            reasoning: payload.appeal_assessment.reasoning,
            technical_issues: payload.technical_issues,
            detailed_analysis: payload.detailed_analysis,
            source: ResultSource::Service,
        }
    }
}
