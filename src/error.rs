use thiserror::Error;

use crate::service::ServiceError;
use crate::workflow::{Step, UploadRejection};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadRejection),

    #[error("Cannot {action} while on step {actual}, expected {expected}")]
    WrongStep {
        action: &'static str,
        expected: Step,
        actual: Step,
    },

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("{0} already in progress")]
    InProgress(&'static str),

    #[error("Invalid state snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Document service error: {0}")]
    Service(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
