use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{ApplicationDocument, ApplicationId};
use super::error::SubmissionError;
use super::remote::AdmissionApi;
use super::steps::{validate_document, ReviewConfirmation};

/// Sends the finished document to the application service. Never retries on its own.
pub struct SubmissionAssembler<A> {
    api: Arc<A>,
}

impl<A> SubmissionAssembler<A>
where
    A: AdmissionApi + 'static,
{
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Every namespace present and every step's checks passing.
    pub fn check_complete(&self, document: &ApplicationDocument) -> Result<(), SubmissionError> {
        validate_document(document)
    }

    /// The document is only borrowed, so a failed attempt leaves it intact for a retry.
    pub async fn submit(
        &self,
        document: &ApplicationDocument,
        confirmation: &ReviewConfirmation,
    ) -> Result<ApplicationId, SubmissionError> {
        self.check_complete(document)?;

        match self.api.submit_application(document).await {
            Ok(application_id) => {
                info!(
                    application_id = %application_id,
                    confirmed_at = %confirmation.confirmed_at(),
                    "application submitted"
                );
                Ok(application_id)
            }
            Err(err) => {
                warn!(error = %err, "application submission failed");
                Err(err.into())
            }
        }
    }
}
