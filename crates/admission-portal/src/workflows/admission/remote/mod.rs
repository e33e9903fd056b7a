//! Client side of the admission server: draft checkpoints, submission and office-use calls.

mod client;
mod transport;
pub mod wire;

use async_trait::async_trait;

use super::domain::{
    ApplicationDocument, ApplicationId, ApplicationSummary, Draft, DraftId, OfficeUseFields,
};
use super::error::{PersistenceError, SubmissionError};

pub use client::RemoteAdmissionApi;
pub use transport::{RouterTransport, Transport, UreqTransport, WireMethod, WireRequest, WireResponse};

/// Failure of a single remote call, before callers decide what it means for them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("resource not found")]
    NotFound,
    #[error("missing or rejected bearer credential")]
    Unauthorized,
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<RemoteError> for PersistenceError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::NotFound => PersistenceError::Status {
                status: 404,
                message: "resource not found".to_string(),
            },
            RemoteError::Unauthorized => PersistenceError::Unauthorized,
            RemoteError::Status { status, message } => PersistenceError::Status { status, message },
            RemoteError::Transport(message) => PersistenceError::Transport(message),
            RemoteError::Decode(message) => PersistenceError::Decode(message),
        }
    }
}

impl From<RemoteError> for SubmissionError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::NotFound => SubmissionError::Rejected {
                status: 404,
                message: "submission endpoint not found".to_string(),
            },
            RemoteError::Unauthorized => SubmissionError::Rejected {
                status: 401,
                message: "missing or rejected bearer credential".to_string(),
            },
            RemoteError::Status { status, message } => SubmissionError::Rejected { status, message },
            RemoteError::Transport(message) => SubmissionError::Transport(message),
            RemoteError::Decode(message) => SubmissionError::Decode(message),
        }
    }
}

/// Operations the admission server exposes to the wizard and the office desk.
#[async_trait]
pub trait AdmissionApi: Send + Sync {
    async fn create_draft(&self, draft: &Draft) -> Result<DraftId, RemoteError>;
    async fn update_draft(&self, draft_id: &DraftId, draft: &Draft) -> Result<DraftId, RemoteError>;
    /// Drafts owned by the authenticated caller.
    async fn list_drafts(&self) -> Result<Vec<Draft>, RemoteError>;
    async fn get_draft(&self, draft_id: &DraftId) -> Result<Draft, RemoteError>;
    async fn delete_draft(&self, draft_id: &DraftId) -> Result<(), RemoteError>;
    async fn submit_application(
        &self,
        document: &ApplicationDocument,
    ) -> Result<ApplicationId, RemoteError>;
    async fn application_summary(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationSummary, RemoteError>;
    async fn save_office_use(
        &self,
        application_id: &ApplicationId,
        fields: &OfficeUseFields,
    ) -> Result<(), RemoteError>;
}
