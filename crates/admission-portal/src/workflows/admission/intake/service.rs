use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::super::domain::{
    ApplicationDocument, ApplicationId, DraftId, DraftStatus, OfficeUseFields,
};
use super::super::error::{NotFoundError, SubmissionError};
use super::super::steps::validate_document;
use super::repository::{
    ApplicationRecord, ApplicationRepository, DraftRepository, RepositoryError, StoredDraft,
};

/// Server side of the admission wizard: owner-scoped drafts and final applications.
pub struct AdmissionIntakeService<D, A> {
    drafts: Arc<D>,
    applications: Arc<A>,
}

static DRAFT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_draft_id() -> DraftId {
    let id = DRAFT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DraftId(format!("draft-{id:06}"))
}

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<D, A> AdmissionIntakeService<D, A>
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    pub fn new(drafts: Arc<D>, applications: Arc<A>) -> Self {
        Self {
            drafts,
            applications,
        }
    }

    /// Drafts owned by someone else are reported as missing.
    fn owned_draft(&self, owner: &str, draft_id: &DraftId) -> Result<StoredDraft, IntakeError> {
        self.drafts
            .fetch(draft_id)?
            .filter(|draft| draft.owner == owner)
            .ok_or_else(|| NotFoundError::Draft(draft_id.clone()).into())
    }

    pub fn create_draft(
        &self,
        owner: &str,
        data: ApplicationDocument,
        status: DraftStatus,
    ) -> Result<StoredDraft, IntakeError> {
        let draft = StoredDraft {
            draft_id: next_draft_id(),
            owner: owner.to_string(),
            data,
            status,
            updated_at: Utc::now(),
        };
        let stored = self.drafts.insert(draft)?;
        debug!(draft_id = %stored.draft_id, "draft created");
        Ok(stored)
    }

    pub fn update_draft(
        &self,
        owner: &str,
        draft_id: &DraftId,
        data: ApplicationDocument,
        status: DraftStatus,
    ) -> Result<StoredDraft, IntakeError> {
        let mut draft = self.owned_draft(owner, draft_id)?;
        draft.data = data;
        draft.status = status;
        draft.updated_at = Utc::now();
        self.drafts.update(draft.clone())?;
        debug!(draft_id = %draft_id, "draft updated");
        Ok(draft)
    }

    /// The caller's drafts, most recently updated first.
    pub fn list_drafts(&self, owner: &str) -> Result<Vec<StoredDraft>, IntakeError> {
        let mut drafts = self.drafts.list_by_owner(owner)?;
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(drafts)
    }

    pub fn get_draft(&self, owner: &str, draft_id: &DraftId) -> Result<StoredDraft, IntakeError> {
        self.owned_draft(owner, draft_id)
    }

    pub fn delete_draft(&self, owner: &str, draft_id: &DraftId) -> Result<(), IntakeError> {
        self.owned_draft(owner, draft_id)?;
        if !self.drafts.delete(draft_id)? {
            return Err(NotFoundError::Draft(draft_id.clone()).into());
        }
        debug!(draft_id = %draft_id, "draft deleted");
        Ok(())
    }

    /// Re-check completeness server side, then record the application.
    pub fn submit(
        &self,
        owner: &str,
        data: ApplicationDocument,
    ) -> Result<ApplicationRecord, IntakeError> {
        validate_document(&data)?;

        let record = ApplicationRecord {
            application_id: next_application_id(),
            owner: owner.to_string(),
            submitted_at: Utc::now(),
            data,
            office_use_only: OfficeUseFields::default(),
        };
        let stored = self.applications.insert(record)?;
        info!(application_id = %stored.application_id, "application recorded");
        Ok(stored)
    }

    pub fn get_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, IntakeError> {
        self.applications
            .fetch(application_id)?
            .ok_or_else(|| NotFoundError::Application(application_id.clone()).into())
    }

    /// Replace the office-use sub-document; applicant namespaces are left untouched.
    pub fn save_office_use(
        &self,
        application_id: &ApplicationId,
        fields: OfficeUseFields,
    ) -> Result<ApplicationRecord, IntakeError> {
        let mut record = self.get_application(application_id)?;
        record.office_use_only = fields;
        self.applications.update(record.clone())?;
        info!(application_id = %application_id, "office-use fields replaced");
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Rejected(#[from] SubmissionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
