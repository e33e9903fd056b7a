use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::super::domain::{ApplicationId, DraftId};
use super::repository::{
    ApplicationRecord, ApplicationRepository, DraftRepository, RepositoryError, StoredDraft,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryDraftRepository {
    drafts: Arc<Mutex<HashMap<DraftId, StoredDraft>>>,
}

impl InMemoryDraftRepository {
    pub fn len(&self) -> usize {
        lock(&self.drafts).map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftRepository for InMemoryDraftRepository {
    fn insert(&self, draft: StoredDraft) -> Result<StoredDraft, RepositoryError> {
        let mut guard = lock(&self.drafts)?;
        if guard.contains_key(&draft.draft_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(draft.draft_id.clone(), draft.clone());
        Ok(draft)
    }

    fn update(&self, draft: StoredDraft) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.drafts)?;
        match guard.get_mut(&draft.draft_id) {
            Some(slot) => {
                *slot = draft;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &DraftId) -> Result<Option<StoredDraft>, RepositoryError> {
        Ok(lock(&self.drafts)?.get(id).cloned())
    }

    fn list_by_owner(&self, owner: &str) -> Result<Vec<StoredDraft>, RepositoryError> {
        Ok(lock(&self.drafts)?
            .values()
            .filter(|draft| draft.owner == owner)
            .cloned()
            .collect())
    }

    fn delete(&self, id: &DraftId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.drafts)?.remove(id).is_some())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    pub fn len(&self) -> usize {
        lock(&self.records).map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&record.application_id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }
}
