use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{
    ApplicationDocument, ApplicationId, ApplicationSummary, Draft, DraftId, DraftStatus,
    OfficeUseFields,
};

/// Server copy of a draft together with the principal that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDraft {
    pub draft_id: DraftId,
    pub owner: String,
    pub data: ApplicationDocument,
    pub status: DraftStatus,
    pub updated_at: DateTime<Utc>,
}

impl StoredDraft {
    pub fn to_draft(&self) -> Draft {
        Draft {
            draft_id: Some(self.draft_id.clone()),
            data: self.data.clone(),
            status: self.status,
            updated_at: Some(self.updated_at),
        }
    }
}

/// Submitted application with its office-use sub-document, empty until staff fill it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application_id: ApplicationId,
    pub owner: String,
    pub submitted_at: DateTime<Utc>,
    pub data: ApplicationDocument,
    pub office_use_only: OfficeUseFields,
}

impl ApplicationRecord {
    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            application_id: self.application_id.clone(),
            submitted_at: self.submitted_at,
            student_name: self.data.student_name().map(str::to_string),
            data: self.data.clone(),
            office_use_only: self.office_use_only.clone(),
        }
    }
}

pub trait DraftRepository: Send + Sync {
    fn insert(&self, draft: StoredDraft) -> Result<StoredDraft, RepositoryError>;
    fn update(&self, draft: StoredDraft) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &DraftId) -> Result<Option<StoredDraft>, RepositoryError>;
    fn list_by_owner(&self, owner: &str) -> Result<Vec<StoredDraft>, RepositoryError>;
    /// Returns whether a draft was removed.
    fn delete(&self, id: &DraftId) -> Result<bool, RepositoryError>;
}

pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
