//! Draft checkpoints against the admission server, with a device-local backup for degraded mode.
//!
//! The remote draft is authoritative. The local backup is written only when a remote save
//! fails and is read only when no remote draft can be found at session start.

mod backup;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{ApplicationDocument, Draft, DraftId};
use super::error::{LoadError, NotFoundError, PersistenceError};
use super::remote::{AdmissionApi, RemoteError};

pub use backup::{
    BackupError, BackupStore, FileBackupStore, LocalBackup, MemoryBackupStore, LOCAL_BACKUP_KEY,
};

/// Result of a checkpoint. A local fallback still carries the remote failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOutcome {
    Remote(DraftId),
    LocalFallback {
        error: PersistenceError,
        backed_up: bool,
    },
}

/// Where a resumed session got its document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Remote(Draft),
    Local {
        backup: LocalBackup,
        remote_error: Option<PersistenceError>,
    },
    Fresh {
        remote_error: Option<PersistenceError>,
    },
}

impl RestoreOutcome {
    pub fn remote_error(&self) -> Option<&PersistenceError> {
        match self {
            RestoreOutcome::Remote(_) => None,
            RestoreOutcome::Local { remote_error, .. } | RestoreOutcome::Fresh { remote_error } => {
                remote_error.as_ref()
            }
        }
    }
}

pub struct DraftPersistenceService<A, B> {
    api: Arc<A>,
    backup: Arc<B>,
    backup_key: String,
}

impl<A, B> DraftPersistenceService<A, B>
where
    A: AdmissionApi + 'static,
    B: BackupStore + 'static,
{
    pub fn new(api: Arc<A>, backup: Arc<B>) -> Self {
        Self::with_backup_key(api, backup, LOCAL_BACKUP_KEY)
    }

    pub fn with_backup_key(api: Arc<A>, backup: Arc<B>, backup_key: impl Into<String>) -> Self {
        Self {
            api,
            backup,
            backup_key: backup_key.into(),
        }
    }

    pub fn backup_key(&self) -> &str {
        &self.backup_key
    }

    /// Upsert: creates a draft when `draft_id` is absent, otherwise updates that draft.
    pub async fn save_draft(
        &self,
        document: &ApplicationDocument,
        draft_id: Option<&DraftId>,
    ) -> Result<DraftId, PersistenceError> {
        let draft = Draft::new(document.clone());
        let saved = match draft_id {
            Some(draft_id) => self.api.update_draft(draft_id, &draft).await?,
            None => self.api.create_draft(&draft).await?,
        };
        info!(draft_id = %saved, sections = document.len(), "draft saved");
        Ok(saved)
    }

    pub async fn list_drafts(&self) -> Result<Vec<Draft>, PersistenceError> {
        Ok(self.api.list_drafts().await?)
    }

    pub async fn get_draft(&self, draft_id: &DraftId) -> Result<Draft, LoadError> {
        match self.api.get_draft(draft_id).await {
            Ok(mut draft) => {
                draft.draft_id.get_or_insert_with(|| draft_id.clone());
                Ok(draft)
            }
            Err(RemoteError::NotFound) => Err(NotFoundError::Draft(draft_id.clone()).into()),
            Err(other) => Err(PersistenceError::from(other).into()),
        }
    }

    /// Deleting a draft that no longer exists counts as success.
    pub async fn delete_draft(&self, draft_id: &DraftId) -> Result<(), PersistenceError> {
        match self.api.delete_draft(draft_id).await {
            Ok(()) => Ok(()),
            Err(RemoteError::NotFound) => {
                debug!(draft_id = %draft_id, "draft already gone");
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Best-effort mirror. Storage faults become `false`, never an error.
    pub fn save_local_backup(&self, document: &ApplicationDocument) -> bool {
        let backup = LocalBackup {
            data: document.clone(),
            saved_at: Utc::now(),
        };
        match self.backup.write(&self.backup_key, &backup) {
            Ok(()) => {
                debug!(key = %self.backup_key, "local backup written");
                true
            }
            Err(err) => {
                warn!(key = %self.backup_key, error = %err, "local backup write failed");
                false
            }
        }
    }

    pub fn get_local_backup(&self) -> Option<LocalBackup> {
        match self.backup.read(&self.backup_key) {
            Ok(backup) => backup,
            Err(err) => {
                warn!(key = %self.backup_key, error = %err, "local backup unreadable");
                None
            }
        }
    }

    pub fn clear_local_backup(&self) -> bool {
        match self.backup.clear(&self.backup_key) {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %self.backup_key, error = %err, "local backup clear failed");
                false
            }
        }
    }

    /// Save remotely; on failure mirror locally and report both facts.
    pub async fn checkpoint(
        &self,
        document: &ApplicationDocument,
        draft_id: Option<&DraftId>,
    ) -> CheckpointOutcome {
        match self.save_draft(document, draft_id).await {
            Ok(saved) => CheckpointOutcome::Remote(saved),
            Err(error) => {
                warn!(error = %error, "remote draft save failed; falling back to local backup");
                let backed_up = self.save_local_backup(document);
                CheckpointOutcome::LocalFallback { error, backed_up }
            }
        }
    }

    /// Resume a session: the known draft, else the caller's latest draft, else the local
    /// backup, else nothing.
    pub async fn restore(&self, known: Option<&DraftId>) -> RestoreOutcome {
        let remote = match known {
            Some(draft_id) => self.get_draft(draft_id).await.map(Some),
            None => self.latest_draft().await.map_err(LoadError::from),
        };

        let remote_error = match remote {
            Ok(Some(draft)) => {
                info!(draft_id = ?draft.draft_id, "resuming from remote draft");
                return RestoreOutcome::Remote(draft);
            }
            Ok(None) => None,
            Err(LoadError::NotFound(err)) => {
                debug!(error = %err, "known draft is gone");
                None
            }
            Err(LoadError::Persistence(err)) => {
                warn!(error = %err, "remote drafts unavailable during restore");
                Some(err)
            }
        };

        match self.get_local_backup() {
            Some(backup) => {
                info!(saved_at = %backup.saved_at, "resuming from local backup");
                RestoreOutcome::Local {
                    backup,
                    remote_error,
                }
            }
            None => RestoreOutcome::Fresh { remote_error },
        }
    }

    async fn latest_draft(&self) -> Result<Option<Draft>, PersistenceError> {
        let drafts = self.list_drafts().await?;
        Ok(drafts.into_iter().max_by_key(|draft| draft.updated_at))
    }
}
