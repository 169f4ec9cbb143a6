mod analysis;
mod engine;
mod state;
pub mod validation;

pub use analysis::{AnalysisResult, AppealProbability, Recommendation, ResultSource, TechnicalIssue};
pub use engine::{Intent, WorkflowEngine};
pub use state::{
    AnalysisData, ExportData, FieldValue, OcrData, OcrResults, ResultsSummary, Step, StepData,
    StepStatus, TOTAL_STEPS, UploadInfo, WorkflowState,
};
pub use validation::{ConfidenceBand, UploadRejection};
