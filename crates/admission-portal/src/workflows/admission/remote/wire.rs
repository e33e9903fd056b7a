//! JSON bodies and paths shared by the HTTP client and the intake router.

use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicationDocument, ApplicationId, Draft, DraftId, DraftStatus};

pub const DRAFTS_PATH: &str = "/api/v1/admission/drafts";
pub const USER_DRAFTS_PATH: &str = "/api/v1/admission/users/me/drafts";
pub const APPLICATIONS_PATH: &str = "/api/v1/admission/applications";

/// Largest request or response body either side accepts. Documents embed their uploads
/// as base64, so this sits well above a handful of phone photos.
pub const MAX_DOCUMENT_BYTES: usize = 64 * 1024 * 1024;

pub fn draft_path(draft_id: &DraftId) -> String {
    format!("{DRAFTS_PATH}/{draft_id}")
}

pub fn summary_path(application_id: &ApplicationId) -> String {
    format!("{APPLICATIONS_PATH}/{application_id}/summary")
}

pub fn office_use_path(application_id: &ApplicationId) -> String {
    format!("{APPLICATIONS_PATH}/{application_id}/office-use")
}

/// Body of draft create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftBody {
    pub data: ApplicationDocument,
    #[serde(default)]
    pub status: DraftStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSaved {
    pub draft_id: DraftId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftList {
    pub drafts: Vec<Draft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
