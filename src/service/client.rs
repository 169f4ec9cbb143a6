use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::DocumentService;
use super::error::ServiceError;
use super::types::{AnalysisResponse, AnalyzeRequest, SelectedDocument, UploadResponse};
use crate::workflow::FieldValue;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/";

/// HTTP client for the upload/OCR/analysis backend.
pub struct DocumentClient {
    client: Client,
    base_url: String,
}

impl DocumentClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the stored analysis for a report.
    pub async fn get_results(&self, report_id: &str) -> Result<AnalysisResponse, ServiceError> {
        let response = self
            .client
            .get(self.url(&format!("upload/results/{report_id}")))
            .send()
            .await?;
        decode(response).await
    }

    /// Check that the backend is reachable. Returns whatever the test endpoint reports.
    pub async fn test_connection(&self) -> Result<serde_json::Value, ServiceError> {
        let response = self.client.get(self.url("upload/test")).send().await?;
        decode(response).await
    }
}

impl DocumentService for DocumentClient {
    async fn upload_document(
        &self,
        document: &SelectedDocument,
    ) -> Result<UploadResponse, ServiceError> {
        info!(file = %document.file_name, bytes = document.bytes.len(), "uploading document");
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str(&document.mime_type)?;
        let form = Form::new().part("document", part);

        let response = self
            .client
            .post(self.url("upload/document"))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn analyze_document(
        &self,
        report_id: &str,
        corrected_fields: Option<&BTreeMap<String, FieldValue>>,
    ) -> Result<AnalysisResponse, ServiceError> {
        info!(report_id, corrected = corrected_fields.is_some(), "requesting analysis");
        let body = AnalyzeRequest {
            corrected_fields: corrected_fields.cloned(),
        };
        let response = self
            .client
            .post(self.url(&format!("upload/analyze/{report_id}")))
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        return Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.text().await?;
    debug!(bytes = body.len(), "decoding service response");
    serde_json::from_str(&body).map_err(|e| ServiceError::Decode(e.to_string()))
}
