//! Drives one analysis session through the step flow.
//!
//! [`FlowSession`] holds the single live [`WorkflowState`] and replaces it
//! with the engine's output after every intent. Remote calls are awaited
//! here, never in the engine, and their outcomes re-enter the state only as
//! intents. Guard flags are raised before a call and lowered on every exit
//! path.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::report::{ExportReport, summarize};
use crate::service::{DocumentService, SelectedDocument};
use crate::workflow::validation::{mime_for_path, validate_upload};
use crate::workflow::{
    AnalysisResult, FieldValue, Intent, ResultSource, Step, UploadInfo, UploadRejection,
    WorkflowEngine, WorkflowState,
};

/// Per-session limits and locations, taken from [`FlowConfig`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub max_upload_bytes: u64,
    pub output_dir: PathBuf,
}

impl From<&FlowConfig> for SessionSettings {
    fn from(config: &FlowConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            output_dir: config.output_dir.clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&FlowConfig::default())
    }
}

/// Encode bytes as a `data:` URL for previews.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Runs its closure when dropped, so a busy flag is lowered even when the
/// future holding it is cancelled mid-call.
struct Release<F: FnMut()>(F);

impl<F: FnMut()> Drop for Release<F> {
    fn drop(&mut self) {
        (self.0)()
    }
}

pub struct FlowSession<S> {
    id: String,
    service: S,
    settings: SessionSettings,
    state: WorkflowState,
    selected: Option<SelectedDocument>,
    is_uploading: bool,
}

impl<S: DocumentService> FlowSession<S> {
    pub fn new(service: S, settings: SessionSettings) -> Self {
        Self::resume(service, settings, WorkflowState::new())
    }

    /// Continue from a previously saved state.
    pub fn resume(service: S, settings: SessionSettings, state: WorkflowState) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            service,
            settings,
            state,
            selected: None,
            is_uploading: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn is_uploading(&self) -> bool {
        self.is_uploading
    }

    pub fn has_selection(&self) -> bool {
        self.selected.is_some()
    }

    fn dispatch(&mut self, intent: Intent) {
        let name = intent.name();
        self.state = WorkflowEngine::apply(&self.state, intent);
        debug!(
            session = %self.id,
            intent = name,
            step = self.state.current_step(),
            gate = self.state.can_proceed(),
            "dispatch"
        );
    }

    fn expect_step(&self, action: &'static str, expected: Step) -> Result<(), FlowError> {
        let actual = self.state.step();
        if actual == expected {
            Ok(())
        } else {
            Err(FlowError::WrongStep {
                action,
                expected,
                actual,
            })
        }
    }

    fn reject(&mut self, err: FlowError) -> FlowError {
        self.dispatch(Intent::SetError(err.to_string()));
        err
    }

    /// Read a file from disk, validate it and record it as the selected upload.
    pub fn select_file(&mut self, path: &Path) -> Result<(), FlowError> {
        self.expect_step("select a file", Step::Upload)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let Some(mime_type) = mime_for_path(path) else {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("none")
                .to_string();
            return Err(self.reject(UploadRejection::UnsupportedType(ext).into()));
        };
        let size = std::fs::metadata(path)?.len();
        if let Err(rejection) =
            validate_upload(&file_name, mime_type, size, self.settings.max_upload_bytes)
        {
            return Err(self.reject(rejection.into()));
        }
        let bytes = std::fs::read(path)?;
        self.select_document(SelectedDocument {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    /// Validate an in-memory document and record it as the selected upload.
    ///
    /// The document itself stays in the session; the state only keeps its
    /// metadata and preview data URL.
    pub fn select_document(&mut self, document: SelectedDocument) -> Result<(), FlowError> {
        self.expect_step("select a file", Step::Upload)?;
        if let Err(rejection) = validate_upload(
            &document.file_name,
            &document.mime_type,
            document.bytes.len() as u64,
            self.settings.max_upload_bytes,
        ) {
            return Err(self.reject(rejection.into()));
        }

        info!(session = %self.id, file = %document.file_name, "file selected");
        self.dispatch(Intent::RecordUpload(UploadInfo {
            file_name: document.file_name.clone(),
            file_size: document.bytes.len() as u64,
            file_type: document.mime_type.clone(),
            file_data_url: Some(data_url(&document.mime_type, &document.bytes)),
            report_id: None,
        }));
        self.dispatch(Intent::ClearError);
        self.selected = Some(document);
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.selected = None;
        self.dispatch(Intent::ClearUpload);
    }

    /// Upload the selected file and move to the edit step.
    ///
    /// The step is entered as soon as the backend accepts the file, before
    /// OCR output is recorded, so missing fields never keep the user on the
    /// upload step. A call while an upload is in flight fails with
    /// [`FlowError::InProgress`].
    pub async fn submit_upload(&mut self) -> Result<(), FlowError> {
        if self.is_uploading {
            debug!(session = %self.id, "upload already in flight");
            return Err(FlowError::InProgress("upload"));
        }
        self.expect_step("submit an upload", Step::Upload)?;
        let Some(document) = self.selected.clone() else {
            return Err(self.reject(FlowError::MissingPrerequisite(
                "no file selected".to_string(),
            )));
        };

        self.is_uploading = true;
        let outcome = {
            let _release = Release(|| self.is_uploading = false);
            self.service.upload_document(&document).await
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!(session = %self.id, error = %e, "upload failed");
                return Err(self.reject(e.into()));
            }
        };

        info!(session = %self.id, report_id = %response.report_id, "upload accepted");
        let mut upload = self.state.step_data().upload.clone();
        upload.report_id = Some(response.report_id.clone());
        self.dispatch(Intent::RecordUpload(upload));
        self.dispatch(Intent::ClearError);
        self.selected = None;
        self.dispatch(Intent::Advance);
        if let Some(ocr) = response.normalized_ocr() {
            self.dispatch(Intent::RecordOcrResults(ocr));
        }
        Ok(())
    }

    pub fn edit_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.dispatch(Intent::EditOcrField {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Advance one step if the gate allows it. Returns whether the step changed.
    ///
    /// Entering the results step records the summary of the analysis, and
    /// entering the export step opens its gate immediately.
    pub fn next(&mut self) -> bool {
        let before = self.state.current_step();
        self.dispatch(Intent::Advance);
        if self.state.current_step() == before {
            return false;
        }
        match self.state.step() {
            Step::Results => {
                if let Some(result) = &self.state.step_data().analysis.results {
                    let summary = summarize(result);
                    self.dispatch(Intent::RecordResultsSummary(summary));
                }
            }
            Step::Export => self.dispatch(Intent::SetGate(true)),
            _ => {}
        }
        true
    }

    /// Go back one step. Returns whether the step changed.
    pub fn back(&mut self) -> bool {
        let before = self.state.current_step();
        self.dispatch(Intent::Retreat);
        self.state.current_step() != before
    }

    /// Discard the whole session state, including any selected file.
    pub fn restart(&mut self) {
        info!(session = %self.id, "restarting workflow");
        self.selected = None;
        self.is_uploading = false;
        self.dispatch(Intent::Reset);
    }

    /// Run the legal analysis for the uploaded report.
    ///
    /// On success the result is recorded and the flow moves on to the
    /// results step. When the call fails the error is recorded together with
    /// [`AnalysisResult::fallback`], the gate opens, and the flow stays on
    /// the analysis step so the front end can show the failure. Returns the
    /// source of the recorded result. A result that already exists is kept.
    pub async fn run_analysis(&mut self) -> Result<ResultSource, FlowError> {
        self.expect_step("run analysis", Step::Analyze)?;
        let analysis = &self.state.step_data().analysis;
        if let Some(existing) = &analysis.results {
            return Ok(existing.source);
        }
        if analysis.is_processing {
            debug!(session = %self.id, "analysis already in flight");
            return Err(FlowError::InProgress("analysis"));
        }

        let data = self.state.step_data();
        let Some(report_id) = data.upload.report_id.clone() else {
            return Err(self.reject(FlowError::MissingPrerequisite(
                "no uploaded report, start again from the upload step".to_string(),
            )));
        };
        if data.ocr.extracted_fields.is_empty() {
            return Err(self.reject(FlowError::MissingPrerequisite(
                "no extracted fields to analyze".to_string(),
            )));
        }
        let corrected = data
            .ocr
            .is_edited
            .then(|| data.ocr.extracted_fields.clone());

        self.dispatch(Intent::SetAnalysisProcessing(true));
        self.dispatch(Intent::SetAnalysisProgress(0.0));
        let outcome = {
            let _release = Release(|| {
                self.state =
                    WorkflowEngine::apply(&self.state, Intent::SetAnalysisProcessing(false));
            });
            self.service
                .analyze_document(&report_id, corrected.as_ref())
                .await
        };
        self.dispatch(Intent::SetAnalysisProgress(100.0));

        let (result, live) = match outcome {
            Ok(response) => {
                info!(session = %self.id, %report_id, "analysis complete");
                self.dispatch(Intent::ClearError);
                (AnalysisResult::from(response.analysis_results), true)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "analysis failed, using fallback result");
                self.dispatch(Intent::SetError(format!("Analysis failed: {e}")));
                (AnalysisResult::fallback(), false)
            }
        };
        let source = result.source;
        self.dispatch(Intent::RecordAnalysisResults(result));
        if live {
            self.next();
        }
        Ok(source)
    }

    /// Write the export report and record its location.
    pub fn export_report(&mut self) -> Result<PathBuf, FlowError> {
        self.expect_step("export the report", Step::Export)?;
        let report = ExportReport::from_state(&self.state)?;
        let path = report.write_to(&self.settings.output_dir)?;
        info!(session = %self.id, path = %path.display(), "report exported");
        self.dispatch(Intent::RecordExportReady {
            download_url: path.display().to_string(),
        });
        Ok(path)
    }

    pub fn save_state(&self, path: &Path) -> Result<(), FlowError> {
        self.state.save(path)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::service::types::{AnalysisPayload, AppealAssessment, LegalAnalysis};
    use crate::service::{AnalysisResponse, ServiceError, UploadResponse};
    use crate::workflow::{AppealProbability, OcrResults, Recommendation};

    /// Scripted backend recording what it was asked.
    #[derive(Default)]
    struct MockService {
        fail_upload: bool,
        fail_analysis: bool,
        ocr: Option<OcrResults>,
        hang_upload: Cell<bool>,
        hang_analysis: Cell<bool>,
        uploads: Cell<u32>,
        corrections: RefCell<Vec<Option<BTreeMap<String, FieldValue>>>>,
    }

    impl MockService {
        fn with_ocr(fields: &[(&str, &str)]) -> Self {
            Self {
                ocr: Some(OcrResults {
                    extracted_fields: fields
                        .iter()
                        .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
                        .collect(),
                    confidence_scores: BTreeMap::new(),
                }),
                ..Default::default()
            }
        }
    }

    impl DocumentService for MockService {
        async fn upload_document(
            &self,
            _document: &SelectedDocument,
        ) -> Result<UploadResponse, ServiceError> {
            self.uploads.set(self.uploads.get() + 1);
            if self.hang_upload.get() {
                std::future::pending::<()>().await;
            }
            if self.fail_upload {
                return Err(ServiceError::Status {
                    status: 500,
                    message: "upload exploded".into(),
                });
            }
            Ok(UploadResponse {
                report_id: "rep-1".into(),
                ocr_results: self.ocr.clone(),
            })
        }

        async fn analyze_document(
            &self,
            _report_id: &str,
            corrected_fields: Option<&BTreeMap<String, FieldValue>>,
        ) -> Result<AnalysisResponse, ServiceError> {
            self.corrections.borrow_mut().push(corrected_fields.cloned());
            if self.hang_analysis.get() {
                std::future::pending::<()>().await;
            }
            if self.fail_analysis {
                return Err(ServiceError::Status {
                    status: 503,
                    message: "analysis offline".into(),
                });
            }
            Ok(AnalysisResponse {
                analysis_results: AnalysisPayload {
                    legal_analysis: LegalAnalysis {
                        section: "68A".into(),
                        points: 6,
                    },
                    appeal_assessment: AppealAssessment {
                        probability: AppealProbability::High,
                        recommendation: Recommendation::Appeal,
                        reasoning: "radar not calibrated".into(),
                    },
                    technical_issues: Vec::new(),
                    detailed_analysis: String::new(),
                },
            })
        }
    }

    const COMPLETE: &[(&str, &str)] = &[
        ("reportNumber", "A-1"),
        ("date", "2024-03-05"),
        ("violationType", "speeding"),
        ("fineAmount", "500"),
    ];

    const MISSING_FINE: &[(&str, &str)] = &[
        ("reportNumber", "A-1"),
        ("date", "2024-03-05"),
        ("violationType", "speeding"),
    ];

    fn jpeg(name: &str) -> SelectedDocument {
        SelectedDocument {
            file_name: name.into(),
            mime_type: "image/jpeg".into(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    /// The output directory lives as long as the returned `TempDir`.
    fn session(service: MockService) -> (FlowSession<MockService>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let session = FlowSession::new(
            service,
            SessionSettings {
                max_upload_bytes: 1024,
                output_dir: dir.path().to_path_buf(),
            },
        );
        (session, dir)
    }

    async fn at_analysis(service: MockService) -> (FlowSession<MockService>, TempDir) {
        let (mut s, dir) = session(service);
        s.select_document(jpeg("a.jpg")).unwrap();
        s.submit_upload().await.unwrap();
        assert!(s.next());
        assert_eq!(s.state().step(), Step::Analyze);
        (s, dir)
    }

    #[test]
    fn data_url_encodes_base64() {
        assert_eq!(data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[test]
    fn selecting_a_file_opens_the_gate() {
        let (mut s, _dir) = session(MockService::default());
        s.select_document(jpeg("a.jpg")).unwrap();
        let upload = &s.state().step_data().upload;
        assert_eq!(upload.file_name, "a.jpg");
        assert_eq!(upload.file_size, 4);
        assert!(upload.file_data_url.as_deref().unwrap().starts_with("data:image/jpeg;base64,"));
        assert!(upload.report_id.is_none());
        assert!(s.state().can_proceed());
        assert!(s.has_selection());
    }

    #[test]
    fn rejected_file_records_error_and_keeps_gate_closed() {
        let (mut s, _dir) = session(MockService::default());
        let doc = SelectedDocument {
            file_name: "notes.gif".into(),
            mime_type: "image/gif".into(),
            bytes: vec![1],
        };
        let err = s.select_document(doc).unwrap_err();
        assert!(matches!(err, FlowError::Upload(UploadRejection::UnsupportedType(_))));
        assert!(!s.state().can_proceed());
        assert!(s.state().error().is_some());
        assert!(!s.has_selection());

        let big = SelectedDocument {
            bytes: vec![0; 2048],
            ..jpeg("big.jpg")
        };
        let err = s.select_document(big).unwrap_err();
        assert!(matches!(err, FlowError::Upload(UploadRejection::TooLarge { .. })));
    }

    #[test]
    fn select_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticket.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
        let (mut s, _dir) = session(MockService::default());
        s.select_file(&path).unwrap();
        assert_eq!(s.state().step_data().upload.file_type, "image/png");

        let txt = dir.path().join("ticket.txt");
        std::fs::write(&txt, "x").unwrap();
        s.clear_file();
        assert!(s.select_file(&txt).is_err());
        assert!(!s.state().can_proceed());
    }

    #[tokio::test]
    async fn upload_moves_to_edit_even_with_missing_fields() {
        let (mut s, _dir) = session(MockService::with_ocr(MISSING_FINE));
        s.select_document(jpeg("a.jpg")).unwrap();
        s.submit_upload().await.unwrap();

        assert_eq!(s.state().step(), Step::Edit);
        assert!(!s.state().can_proceed());
        assert_eq!(s.state().step_data().upload.report_id.as_deref(), Some("rep-1"));
        assert!(!s.is_uploading());
        assert!(!s.has_selection());
    }

    #[tokio::test]
    async fn upload_with_complete_ocr_opens_edit_gate() {
        let (mut s, _dir) = session(MockService::with_ocr(COMPLETE));
        s.select_document(jpeg("a.jpg")).unwrap();
        s.submit_upload().await.unwrap();
        assert_eq!(s.state().step(), Step::Edit);
        assert!(s.state().can_proceed());
    }

    #[tokio::test]
    async fn failed_upload_releases_guard_and_stays() {
        let (mut s, _dir) = session(MockService {
            fail_upload: true,
            ..Default::default()
        });
        s.select_document(jpeg("a.jpg")).unwrap();
        let err = s.submit_upload().await.unwrap_err();
        assert!(matches!(err, FlowError::Service(_)));
        assert!(!s.is_uploading());
        assert_eq!(s.state().step(), Step::Upload);
        assert!(s.state().error().unwrap().contains("upload exploded"));
        assert!(s.has_selection());
    }

    #[tokio::test]
    async fn cancelled_upload_releases_guard() {
        let (mut s, _dir) = session(MockService::with_ocr(COMPLETE));
        s.service.hang_upload.set(true);
        s.select_document(jpeg("a.jpg")).unwrap();
        let timed_out = tokio::time::timeout(Duration::from_millis(20), s.submit_upload()).await;
        assert!(timed_out.is_err());
        assert!(!s.is_uploading());
        assert_eq!(s.state().step(), Step::Upload);

        s.service.hang_upload.set(false);
        s.submit_upload().await.unwrap();
        assert_eq!(s.service.uploads.get(), 2);
        assert_eq!(s.state().step(), Step::Edit);
    }

    #[tokio::test]
    async fn cancelled_analysis_clears_processing() {
        let (mut s, _dir) = at_analysis(MockService::with_ocr(COMPLETE)).await;
        s.service.hang_analysis.set(true);
        let timed_out = tokio::time::timeout(Duration::from_millis(20), s.run_analysis()).await;
        assert!(timed_out.is_err());
        assert!(!s.state().step_data().analysis.is_processing);
        assert!(s.state().step_data().analysis.results.is_none());

        s.service.hang_analysis.set(false);
        assert_eq!(s.run_analysis().await.unwrap(), ResultSource::Service);
        assert_eq!(s.state().step(), Step::Results);
        assert_eq!(s.service.corrections.borrow().len(), 2);
    }

    #[test]
    fn select_file_off_the_upload_step_is_wrong_step() {
        let mut s = FlowSession::resume(
            MockService::default(),
            SessionSettings::default(),
            WorkflowEngine::go_to_step(&WorkflowState::new(), 3),
        );
        let err = s.select_file(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(
            err,
            FlowError::WrongStep {
                expected: Step::Upload,
                actual: Step::Analyze,
                ..
            }
        ));
        assert!(s.state().error().is_none());
    }

    #[tokio::test]
    async fn upload_without_selection_is_an_error() {
        let (mut s, _dir) = session(MockService::default());
        let err = s.submit_upload().await.unwrap_err();
        assert!(matches!(err, FlowError::MissingPrerequisite(_)));
        assert_eq!(s.service.uploads.get(), 0);
    }

    #[tokio::test]
    async fn editing_last_missing_field_unlocks_progress() {
        let (mut s, _dir) = session(MockService::with_ocr(MISSING_FINE));
        s.select_document(jpeg("a.jpg")).unwrap();
        s.submit_upload().await.unwrap();
        assert!(!s.next());

        s.edit_field("fineAmount", "500");
        assert!(s.state().can_proceed());
        s.edit_field("fineAmount", "");
        assert!(!s.state().can_proceed());
        s.edit_field("fineAmount", "500");
        assert!(s.next());
        assert_eq!(s.state().step(), Step::Analyze);
        assert!(!s.state().can_proceed());
    }

    #[tokio::test]
    async fn successful_analysis_moves_to_results_with_summary() {
        let (mut s, _dir) = at_analysis(MockService::with_ocr(COMPLETE)).await;
        let source = s.run_analysis().await.unwrap();

        assert_eq!(source, ResultSource::Service);
        assert_eq!(s.state().step(), Step::Results);
        let data = s.state().step_data();
        assert!(!data.analysis.is_processing);
        assert_eq!(data.results.recommendation, Some(Recommendation::Appeal));
        assert_eq!(data.results.explanation, "radar not calibrated");
        assert!(s.state().can_proceed());
        let sent = s.service.corrections.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_none());
    }

    #[tokio::test]
    async fn edited_fields_are_sent_as_corrections() {
        let (mut s, _dir) = session(MockService::with_ocr(COMPLETE));
        s.select_document(jpeg("a.jpg")).unwrap();
        s.submit_upload().await.unwrap();
        s.edit_field("fineAmount", "750");
        s.next();
        s.run_analysis().await.unwrap();

        let sent = s.service.corrections.borrow();
        let fields = sent[0].as_ref().unwrap();
        assert_eq!(fields["fineAmount"], FieldValue::from("750"));
    }

    #[tokio::test]
    async fn failed_analysis_records_fallback() {
        let (mut s, _dir) = at_analysis(MockService {
            fail_analysis: true,
            ..MockService::with_ocr(COMPLETE)
        })
        .await;
        let source = s.run_analysis().await.unwrap();

        assert_eq!(source, ResultSource::Fallback);
        let analysis = &s.state().step_data().analysis;
        assert!(!analysis.is_processing);
        assert!(!analysis.results.as_ref().unwrap().is_authoritative());
        assert!(s.state().error().unwrap().contains("analysis offline"));
        assert_eq!(s.state().step(), Step::Analyze);
        assert!(s.state().can_proceed());

        assert!(s.next());
        assert_eq!(
            s.state().step_data().results.recommendation,
            Some(Recommendation::Undetermined)
        );
    }

    #[tokio::test]
    async fn analysis_is_not_repeated_once_recorded() {
        let (mut s, _dir) = at_analysis(MockService {
            fail_analysis: true,
            ..MockService::with_ocr(COMPLETE)
        })
        .await;
        s.run_analysis().await.unwrap();
        let again = s.run_analysis().await.unwrap();
        assert_eq!(again, ResultSource::Fallback);
        assert_eq!(s.service.corrections.borrow().len(), 1);
    }

    #[tokio::test]
    async fn analysis_without_report_id_is_rejected() {
        let mut s = FlowSession::resume(
            MockService::default(),
            SessionSettings::default(),
            WorkflowEngine::go_to_step(&WorkflowState::new(), 3),
        );
        let err = s.run_analysis().await.unwrap_err();
        assert!(matches!(err, FlowError::MissingPrerequisite(_)));
        assert!(s.state().error().is_some());
        assert!(!s.state().step_data().analysis.is_processing);
        assert!(s.service.corrections.borrow().is_empty());
    }

    #[tokio::test]
    async fn analysis_from_wrong_step_is_rejected() {
        let (mut s, _dir) = session(MockService::default());
        let err = s.run_analysis().await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::WrongStep {
                expected: Step::Analyze,
                actual: Step::Upload,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn full_flow_exports_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = FlowSession::new(
            MockService::with_ocr(COMPLETE),
            SessionSettings {
                max_upload_bytes: 1024,
                output_dir: dir.path().to_path_buf(),
            },
        );
        s.select_document(jpeg("a.jpg")).unwrap();
        s.submit_upload().await.unwrap();
        assert!(s.next());
        s.run_analysis().await.unwrap();
        assert!(s.next());
        assert_eq!(s.state().step(), Step::Export);
        assert!(s.state().can_proceed());

        let path = s.export_report().unwrap();
        assert!(path.exists());
        let pdf = &s.state().step_data().pdf;
        assert!(pdf.is_generated);
        assert_eq!(pdf.download_url.as_deref(), Some(path.display().to_string().as_str()));
        assert!(!s.next());
    }

    #[tokio::test]
    async fn back_and_restart() {
        let (mut s, _dir) = session(MockService::with_ocr(COMPLETE));
        assert!(!s.back());
        s.select_document(jpeg("a.jpg")).unwrap();
        s.submit_upload().await.unwrap();
        assert!(s.back());
        assert_eq!(s.state().step(), Step::Upload);
        assert!(s.state().can_proceed());

        s.restart();
        assert_eq!(s.state(), &WorkflowState::default());
        assert!(!s.has_selection());
    }
}
