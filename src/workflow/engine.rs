use tracing::debug;

use super::analysis::AnalysisResult;
use super::state::{ExportData, FieldValue, OcrResults, ResultsSummary, UploadInfo, WorkflowState};
use super::validation::has_all_required;

/// A named request to change the workflow state.
///
/// This is the only mutation surface the front end gets: every change goes
/// through [`WorkflowEngine::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Move to the next step when the gate is open.
    Advance,
    /// Move back one step; the gate opens because the step was completed once.
    Retreat,
    /// Jump directly to a step, bypassing the gate. Internal recovery only.
    GoToStep(u8),
    /// Discard everything and start over.
    Reset,
    SetGate(bool),
    RecordUpload(UploadInfo),
    ClearUpload,
    RecordOcrResults(OcrResults),
    EditOcrField { name: String, value: FieldValue },
    SetAnalysisProgress(f64),
    SetAnalysisProcessing(bool),
    RecordAnalysisResults(AnalysisResult),
    RecordResultsSummary(ResultsSummary),
    RecordExportReady { download_url: String },
    SetError(String),
    ClearError,
}

impl Intent {
    /// Short name for logs; payloads such as data URLs can be large.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Advance => "advance",
            Intent::Retreat => "retreat",
            Intent::GoToStep(_) => "go_to_step",
            Intent::Reset => "reset",
            Intent::SetGate(_) => "set_gate",
            Intent::RecordUpload(_) => "record_upload",
            Intent::ClearUpload => "clear_upload",
            Intent::RecordOcrResults(_) => "record_ocr_results",
            Intent::EditOcrField { .. } => "edit_ocr_field",
            Intent::SetAnalysisProgress(_) => "set_analysis_progress",
            Intent::SetAnalysisProcessing(_) => "set_analysis_processing",
            Intent::RecordAnalysisResults(_) => "record_analysis_results",
            Intent::RecordResultsSummary(_) => "record_results_summary",
            Intent::RecordExportReady { .. } => "record_export_ready",
            Intent::SetError(_) => "set_error",
            Intent::ClearError => "clear_error",
        }
    }
}

/// Pure transition rules for the step flow.
///
/// Every operation takes the current state by reference and returns the next
/// state; the caller's copy is never modified. Rejected navigation (closed
/// gate, already at the first or last step, out-of-range jump) returns an
/// unchanged copy rather than an error.
pub struct WorkflowEngine;

impl WorkflowEngine {
    /// Compute the state that results from applying `intent` to `state`.
    pub fn apply(state: &WorkflowState, intent: Intent) -> WorkflowState {
        let mut next = state.clone();
        match intent {
            Intent::Advance => {
                if next.current_step < next.total_steps && next.can_proceed {
                    next.current_step += 1;
                    next.can_proceed = false;
                } else {
                    debug!(
                        step = next.current_step,
                        gate = next.can_proceed,
                        "advance rejected"
                    );
                }
            }
            Intent::Retreat => {
                if next.current_step > 1 {
                    next.current_step -= 1;
                    next.can_proceed = true;
                } else {
                    debug!("retreat rejected at first step");
                }
            }
            Intent::GoToStep(target) => {
                if (1..=next.total_steps).contains(&target) {
                    next.current_step = target;
                } else {
                    debug!(step = target, "jump rejected, out of range");
                }
            }
            Intent::Reset => return WorkflowState::default(),
            Intent::SetGate(value) => next.can_proceed = value,
            Intent::RecordUpload(info) => {
                next.can_proceed = !info.file_name.is_empty();
                next.step_data.upload = info;
            }
            Intent::ClearUpload => {
                next.step_data.upload = UploadInfo::default();
                next.can_proceed = false;
            }
            Intent::RecordOcrResults(results) => {
                let ocr = &mut next.step_data.ocr;
                ocr.extracted_fields = results.extracted_fields;
                ocr.confidence_scores = results.confidence_scores;
                next.can_proceed = has_all_required(&ocr.extracted_fields);
            }
            Intent::EditOcrField { name, value } => {
                let ocr = &mut next.step_data.ocr;
                ocr.extracted_fields.insert(name, value);
                ocr.is_edited = true;
                next.can_proceed = has_all_required(&ocr.extracted_fields);
            }
            Intent::SetAnalysisProgress(value) => next.step_data.analysis.progress = value,
            Intent::SetAnalysisProcessing(flag) => next.step_data.analysis.is_processing = flag,
            Intent::RecordAnalysisResults(results) => {
                let analysis = &mut next.step_data.analysis;
                analysis.results = Some(results);
                analysis.is_processing = false;
                next.can_proceed = true;
            }
            Intent::RecordResultsSummary(summary) => {
                next.step_data.results = summary;
                next.can_proceed = true;
            }
            Intent::RecordExportReady { download_url } => {
                next.step_data.pdf = ExportData {
                    is_generated: true,
                    download_url: Some(download_url),
                };
                next.can_proceed = true;
            }
            Intent::SetError(message) => next.error = Some(message),
            Intent::ClearError => next.error = None,
        }
        next
    }

    pub fn advance(state: &WorkflowState) -> WorkflowState {
        Self::apply(state, Intent::Advance)
    }

    pub fn retreat(state: &WorkflowState) -> WorkflowState {
        Self::apply(state, Intent::Retreat)
    }

    pub fn go_to_step(state: &WorkflowState, target: u8) -> WorkflowState {
        Self::apply(state, Intent::GoToStep(target))
    }

    pub fn reset(state: &WorkflowState) -> WorkflowState {
        Self::apply(state, Intent::Reset)
    }

    pub fn set_gate(state: &WorkflowState, value: bool) -> WorkflowState {
        Self::apply(state, Intent::SetGate(value))
    }

    pub fn record_upload(state: &WorkflowState, info: UploadInfo) -> WorkflowState {
        Self::apply(state, Intent::RecordUpload(info))
    }

    pub fn clear_upload(state: &WorkflowState) -> WorkflowState {
        Self::apply(state, Intent::ClearUpload)
    }

    pub fn record_ocr_results(state: &WorkflowState, results: OcrResults) -> WorkflowState {
        Self::apply(state, Intent::RecordOcrResults(results))
    }

    pub fn edit_ocr_field(
        state: &WorkflowState,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> WorkflowState {
        Self::apply(
            state,
            Intent::EditOcrField {
                name: name.into(),
                value: value.into(),
            },
        )
    }

    pub fn set_analysis_progress(state: &WorkflowState, value: f64) -> WorkflowState {
        Self::apply(state, Intent::SetAnalysisProgress(value))
    }

    pub fn set_analysis_processing(state: &WorkflowState, flag: bool) -> WorkflowState {
        Self::apply(state, Intent::SetAnalysisProcessing(flag))
    }

    pub fn record_analysis_results(state: &WorkflowState, results: AnalysisResult) -> WorkflowState {
        Self::apply(state, Intent::RecordAnalysisResults(results))
    }

    pub fn record_results_summary(state: &WorkflowState, summary: ResultsSummary) -> WorkflowState {
        Self::apply(state, Intent::RecordResultsSummary(summary))
    }

    pub fn record_export_ready(state: &WorkflowState, download_url: impl Into<String>) -> WorkflowState {
        Self::apply(
            state,
            Intent::RecordExportReady {
                download_url: download_url.into(),
            },
        )
    }

    pub fn set_error(state: &WorkflowState, message: impl Into<String>) -> WorkflowState {
        Self::apply(state, Intent::SetError(message.into()))
    }

    pub fn clear_error(state: &WorkflowState) -> WorkflowState {
        Self::apply(state, Intent::ClearError)
    }
}
