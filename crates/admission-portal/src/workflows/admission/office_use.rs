use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{ApplicationId, ApplicationSummary, OfficeUseFields};
use super::error::{LoadError, NotFoundError, PersistenceError};
use super::remote::{AdmissionApi, RemoteError};

/// Post-submission amendment path for admissions staff, keyed by application id only.
pub struct OfficeUseDesk<A> {
    api: Arc<A>,
}

impl<A> OfficeUseDesk<A>
where
    A: AdmissionApi + 'static,
{
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn summary(&self, application_id: &ApplicationId) -> Result<ApplicationSummary, LoadError> {
        self.api
            .application_summary(application_id)
            .await
            .map_err(|err| not_found_or(err, application_id))
    }

    pub async fn load(&self, application_id: &ApplicationId) -> Result<OfficeUseFields, LoadError> {
        Ok(self.summary(application_id).await?.office_use_only)
    }

    /// Replace the office-use sub-document wholesale.
    pub async fn save(
        &self,
        application_id: &ApplicationId,
        fields: &OfficeUseFields,
    ) -> Result<(), LoadError> {
        self.api
            .save_office_use(application_id, fields)
            .await
            .map_err(|err| not_found_or(err, application_id))
            .inspect_err(|err| warn!(application_id = %application_id, error = %err, "office-use save failed"))?;
        info!(application_id = %application_id, "office-use fields saved");
        Ok(())
    }
}

fn not_found_or(err: RemoteError, application_id: &ApplicationId) -> LoadError {
    match err {
        RemoteError::NotFound => NotFoundError::Application(application_id.clone()).into(),
        other => PersistenceError::from(other).into(),
    }
}
