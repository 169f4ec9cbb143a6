//! Canned backend used by `smarttraffic demo`.
//!
//! Uploads always succeed with a fixed OCR reading that leaves the fine
//! amount blank, and the analysis endpoint is always unavailable, so a demo
//! run exercises field editing and the fallback analysis path.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::DocumentService;
use super::error::ServiceError;
use super::types::{AnalysisResponse, SelectedDocument, UploadResponse};
use crate::workflow::{FieldValue, OcrResults};

#[derive(Debug, Default)]
pub struct OfflineService;

impl OfflineService {
    fn sample_ocr() -> OcrResults {
        let fields = [
            ("reportNumber", FieldValue::from("TR-2024-118734")),
            ("violationDate", FieldValue::from("05/03/2024")),
            ("violationTime", FieldValue::from("14:32")),
            ("violationType", FieldValue::from("Speeding, 27 km/h over limit")),
            ("fineAmount", FieldValue::from("")),
            ("location", FieldValue::from("Route 4, km 112")),
            ("points", FieldValue::Number(6.0)),
        ];
        let scores = [
            ("reportNumber", 0.96),
            ("violationDate", 0.88),
            ("violationTime", 0.71),
            ("violationType", 0.67),
            ("fineAmount", 0.31),
            ("location", 0.55),
            ("points", 0.92),
        ];
        OcrResults {
            extracted_fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            confidence_scores: scores
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl DocumentService for OfflineService {
    async fn upload_document(
        &self,
        _document: &SelectedDocument,
    ) -> Result<UploadResponse, ServiceError> {
        Ok(UploadResponse {
            report_id: format!("offline-{}", Uuid::new_v4()),
            ocr_results: Some(Self::sample_ocr()),
        })
    }

    async fn analyze_document(
        &self,
        _report_id: &str,
        _corrected_fields: Option<&BTreeMap<String, FieldValue>>,
    ) -> Result<AnalysisResponse, ServiceError> {
        Err(ServiceError::Status {
            status: 503,
            message: "analysis is not available offline".to_string(),
        })
    }
}
