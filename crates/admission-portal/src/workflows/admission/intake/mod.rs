//! Server side of the wire contract: owner-scoped drafts, submission and office-use amendments.

pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

pub use memory::{InMemoryApplicationRepository, InMemoryDraftRepository};
pub use repository::{
    ApplicationRecord, ApplicationRepository, DraftRepository, RepositoryError, StoredDraft,
};
pub use router::admission_router;
pub use service::{AdmissionIntakeService, IntakeError};
