//! Client side of the document upload/OCR/analysis backend.
//!
//! The session driver talks to the backend only through the
//! [`DocumentService`] trait, so tests and the offline demo can swap in
//! their own implementation.

pub mod client;
pub mod error;
pub mod offline;
pub mod types;

use std::collections::BTreeMap;

pub use client::DocumentClient;
pub use error::ServiceError;
pub use offline::OfflineService;
pub use types::{AnalysisResponse, SelectedDocument, UploadResponse};

use crate::workflow::FieldValue;

/// Remote calls the workflow depends on.
#[allow(async_fn_in_trait)]
pub trait DocumentService {
    /// Upload a document and receive its report id, plus OCR output when available.
    async fn upload_document(
        &self,
        document: &SelectedDocument,
    ) -> Result<UploadResponse, ServiceError>;

    /// Run the legal analysis for an uploaded report.
    async fn analyze_document(
        &self,
        report_id: &str,
        corrected_fields: Option<&BTreeMap<String, FieldValue>>,
    ) -> Result<AnalysisResponse, ServiceError>;
}
