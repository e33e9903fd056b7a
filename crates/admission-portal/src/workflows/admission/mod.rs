//! Multi-step admission application wizard.
//!
//! The applicant walks nine steps. Eight of them each write one namespace of the
//! [`ApplicationDocument`]; the ninth is a read-only review followed by submission. Drafts are
//! checkpointed to the admission server, with a device-local backup for when it is unreachable.
//! The [`intake`] module hosts the server side of the same HTTP contract.

pub mod domain;
pub mod drafts;
pub mod encoder;
pub mod error;
pub mod intake;
pub mod office_use;
pub mod remote;
pub mod sequencer;
pub mod session;
pub mod steps;
pub mod submission;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationDocument, ApplicationId, ApplicationSummary, Draft, DraftId, DraftStatus,
    FieldMap, FieldValue, FileAsset, MimeClass, Namespace, OfficeUseFields, StepPayload,
};
pub use drafts::{
    BackupError, BackupStore, CheckpointOutcome, DraftPersistenceService, FileBackupStore, LocalBackup,
    MemoryBackupStore, RestoreOutcome, LOCAL_BACKUP_KEY,
};
pub use error::{
    ErrorKind, LoadError, NotFoundError, PersistenceError, RetryAction, SequencerError,
    SubmissionError, UserNotice, ValidationError, WizardError,
};
pub use office_use::OfficeUseDesk;
pub use remote::{AdmissionApi, RemoteAdmissionApi, RemoteError, RouterTransport, UreqTransport};
pub use sequencer::{StepSequencer, WizardState, REVIEW_STEP, STEP_COUNT};
pub use session::{RestoredFrom, WizardSession};
pub use steps::{PreferencesStep, ReviewConfirmation, ReviewSection, ReviewStep, StepForm};
pub use submission::SubmissionAssembler;
