use std::sync::RwLock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::super::domain::{
    ApplicationDocument, ApplicationId, ApplicationSummary, Draft, DraftId, OfficeUseFields,
};
use super::transport::{Transport, WireMethod, WireRequest, WireResponse};
use super::wire::{
    self, DraftBody, DraftList, DraftSaved, ErrorBody, SubmissionReceipt, APPLICATIONS_PATH,
    DRAFTS_PATH, USER_DRAFTS_PATH,
};
use super::{AdmissionApi, RemoteError};

/// JSON-over-HTTP implementation of [`AdmissionApi`].
///
/// The bearer credential is read from session state on every call, so a refreshed token is
/// picked up without rebuilding the client.
pub struct RemoteAdmissionApi<T> {
    transport: T,
    bearer: RwLock<Option<String>>,
}

impl<T> RemoteAdmissionApi<T>
where
    T: Transport,
{
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            bearer: RwLock::new(None),
        }
    }

    pub fn with_bearer(self, token: impl Into<String>) -> Self {
        self.set_bearer(Some(token.into()));
        self
    }

    pub fn set_bearer(&self, token: Option<String>) {
        let mut guard = match self.bearer.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token.filter(|token| !token.trim().is_empty());
    }

    fn bearer(&self) -> Option<String> {
        match self.bearer.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn call(
        &self,
        method: WireMethod,
        path: String,
        body: Option<Vec<u8>>,
    ) -> Result<WireResponse, RemoteError> {
        let Some(bearer) = self.bearer() else {
            return Err(RemoteError::Unauthorized);
        };

        debug!(?method, path = %path, "calling admission server");
        let response = self
            .transport
            .send(WireRequest {
                method,
                path: path.clone(),
                bearer: Some(bearer),
                body,
            })
            .await
            .inspect_err(|err| warn!(path = %path, error = %err, "admission server unreachable"))?;

        if response.is_success() {
            return Ok(response);
        }

        let error = match response.status {
            401 | 403 => RemoteError::Unauthorized,
            404 => RemoteError::NotFound,
            status => RemoteError::Status {
                status,
                message: error_message(&response),
            },
        };
        warn!(path = %path, status = response.status, error = %error, "admission server rejected request");
        Err(error)
    }
}

fn encode<V: Serialize>(value: &V) -> Result<Vec<u8>, RemoteError> {
    serde_json::to_vec(value)
        .map_err(|err| RemoteError::Transport(format!("could not encode request: {err}")))
}

fn decode<V: DeserializeOwned>(response: &WireResponse) -> Result<V, RemoteError> {
    serde_json::from_slice(&response.body).map_err(|err| RemoteError::Decode(err.to_string()))
}

fn error_message(response: &WireResponse) -> String {
    match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) => body.error,
        Err(_) if response.body.is_empty() => "no response body".to_string(),
        Err(_) => String::from_utf8_lossy(&response.body).into_owned(),
    }
}

fn draft_body(draft: &Draft) -> DraftBody {
    DraftBody {
        data: draft.data.clone(),
        status: draft.status,
    }
}

#[async_trait]
impl<T> AdmissionApi for RemoteAdmissionApi<T>
where
    T: Transport,
{
    async fn create_draft(&self, draft: &Draft) -> Result<DraftId, RemoteError> {
        let body = encode(&draft_body(draft))?;
        let response = self
            .call(WireMethod::Post, DRAFTS_PATH.to_string(), Some(body))
            .await?;
        let saved: DraftSaved = decode(&response)?;
        Ok(saved.draft_id)
    }

    async fn update_draft(&self, draft_id: &DraftId, draft: &Draft) -> Result<DraftId, RemoteError> {
        let body = encode(&draft_body(draft))?;
        let response = self
            .call(WireMethod::Put, wire::draft_path(draft_id), Some(body))
            .await?;
        let saved: DraftSaved = decode(&response)?;
        Ok(saved.draft_id)
    }

    async fn list_drafts(&self) -> Result<Vec<Draft>, RemoteError> {
        let response = self
            .call(WireMethod::Get, USER_DRAFTS_PATH.to_string(), None)
            .await?;
        let list: DraftList = decode(&response)?;
        Ok(list.drafts)
    }

    async fn get_draft(&self, draft_id: &DraftId) -> Result<Draft, RemoteError> {
        let response = self
            .call(WireMethod::Get, wire::draft_path(draft_id), None)
            .await?;
        decode(&response)
    }

    async fn delete_draft(&self, draft_id: &DraftId) -> Result<(), RemoteError> {
        self.call(WireMethod::Delete, wire::draft_path(draft_id), None)
            .await?;
        Ok(())
    }

    async fn submit_application(
        &self,
        document: &ApplicationDocument,
    ) -> Result<ApplicationId, RemoteError> {
        let body = encode(document)?;
        let response = self
            .call(WireMethod::Post, APPLICATIONS_PATH.to_string(), Some(body))
            .await?;
        let receipt: SubmissionReceipt = decode(&response)?;
        if !receipt.success {
            return Err(RemoteError::Status {
                status: response.status,
                message: "server did not confirm the submission".to_string(),
            });
        }
        Ok(receipt.application_id)
    }

    async fn application_summary(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationSummary, RemoteError> {
        let response = self
            .call(WireMethod::Get, wire::summary_path(application_id), None)
            .await?;
        decode(&response)
    }

    async fn save_office_use(
        &self,
        application_id: &ApplicationId,
        fields: &OfficeUseFields,
    ) -> Result<(), RemoteError> {
        let body = encode(fields)?;
        self.call(WireMethod::Put, wire::office_use_path(application_id), Some(body))
            .await?;
        Ok(())
    }
}
