//! One applicant's pass through the wizard.
//!
//! Every operation that touches the network takes `&mut self`, so a second save or submit
//! cannot start while one is in flight. File selection only needs `&self` because encodes for
//! different fields may overlap.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{
    ApplicationDocument, ApplicationId, DraftId, FieldValue, FileAsset, Namespace,
};
use super::drafts::{BackupStore, CheckpointOutcome, DraftPersistenceService, RestoreOutcome};
use super::encoder::SlotOutcome;
use super::error::{
    Direction, RetryAction, SequencerError, UserNotice, ValidationError, WizardError,
};
use super::remote::AdmissionApi;
use super::sequencer::{CurrentStep, StepSequencer, WizardState};
use super::steps::{
    definition, FormStep, PreferencesStep, ReviewConfirmation, ReviewSection, ReviewStep,
    StepForm, UploadStep,
};
use super::submission::SubmissionAssembler;

/// Where a restored session's document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoredFrom {
    RemoteDraft(DraftId),
    LocalBackup,
    Fresh,
}

#[derive(Debug)]
struct StepForms {
    student: FormStep,
    address: FormStep,
    contact: FormStep,
    other: FormStep,
    uploads: UploadStep,
    academic: FormStep,
    preferences: PreferencesStep,
    signature: UploadStep,
}

impl StepForms {
    fn new() -> Self {
        Self {
            student: FormStep::new(definition(Namespace::StudentDetails)),
            address: FormStep::new(definition(Namespace::AddressDetails)),
            contact: FormStep::new(definition(Namespace::ContactDetails)),
            other: FormStep::new(definition(Namespace::OtherDetails)),
            uploads: UploadStep::new(definition(Namespace::UploadedFiles)),
            academic: FormStep::new(definition(Namespace::AcademicDetails)),
            preferences: PreferencesStep::new(),
            signature: UploadStep::new(definition(Namespace::SignatureUpload)),
        }
    }

    fn get(&self, namespace: Namespace) -> &dyn StepForm {
        match namespace {
            Namespace::StudentDetails => &self.student,
            Namespace::AddressDetails => &self.address,
            Namespace::ContactDetails => &self.contact,
            Namespace::OtherDetails => &self.other,
            Namespace::UploadedFiles => &self.uploads,
            Namespace::AcademicDetails => &self.academic,
            Namespace::Preferences => &self.preferences,
            Namespace::SignatureUpload => &self.signature,
        }
    }

    fn get_mut(&mut self, namespace: Namespace) -> &mut dyn StepForm {
        match namespace {
            Namespace::StudentDetails => &mut self.student,
            Namespace::AddressDetails => &mut self.address,
            Namespace::ContactDetails => &mut self.contact,
            Namespace::OtherDetails => &mut self.other,
            Namespace::UploadedFiles => &mut self.uploads,
            Namespace::AcademicDetails => &mut self.academic,
            Namespace::Preferences => &mut self.preferences,
            Namespace::SignatureUpload => &mut self.signature,
        }
    }

    fn upload(&self, namespace: Namespace) -> Option<&UploadStep> {
        match namespace {
            Namespace::UploadedFiles => Some(&self.uploads),
            Namespace::SignatureUpload => Some(&self.signature),
            _ => None,
        }
    }
}

pub struct WizardSession<A, B> {
    sequencer: StepSequencer,
    forms: StepForms,
    review: ReviewStep,
    drafts: DraftPersistenceService<A, B>,
    assembler: SubmissionAssembler<A>,
    draft_id: Option<DraftId>,
    confirmation: Option<ReviewConfirmation>,
    notice: Option<UserNotice>,
}

impl<A, B> WizardSession<A, B>
where
    A: AdmissionApi + 'static,
    B: BackupStore + 'static,
{
    pub fn new(api: Arc<A>, backup: Arc<B>) -> Self {
        Self::from_parts(
            DraftPersistenceService::new(api.clone(), backup),
            SubmissionAssembler::new(api),
        )
    }

    pub fn with_backup_key(api: Arc<A>, backup: Arc<B>, backup_key: impl Into<String>) -> Self {
        Self::from_parts(
            DraftPersistenceService::with_backup_key(api.clone(), backup, backup_key),
            SubmissionAssembler::new(api),
        )
    }

    fn from_parts(drafts: DraftPersistenceService<A, B>, assembler: SubmissionAssembler<A>) -> Self {
        Self {
            sequencer: StepSequencer::new(),
            forms: StepForms::new(),
            review: ReviewStep,
            drafts,
            assembler,
            draft_id: None,
            confirmation: None,
            notice: None,
        }
    }

    pub fn drafts(&self) -> &DraftPersistenceService<A, B> {
        &self.drafts
    }

    pub fn state(&self) -> &WizardState {
        self.sequencer.state()
    }

    pub fn document(&self) -> &ApplicationDocument {
        self.sequencer.document()
    }

    pub fn draft_id(&self) -> Option<&DraftId> {
        self.draft_id.as_ref()
    }

    /// Most recent failure shown to the applicant, cleared by the next success.
    pub fn notice(&self) -> Option<&UserNotice> {
        self.notice.as_ref()
    }

    pub fn current_step(&self) -> Result<CurrentStep<'_>, WizardError> {
        Ok(self.sequencer.current_step()?)
    }

    pub fn is_review(&self) -> bool {
        self.sequencer.is_terminal()
    }

    fn current_namespace(&self) -> Option<Namespace> {
        self.sequencer
            .current_step()
            .ok()
            .and_then(|step| step.namespace)
    }

    /// The form for the current step; `None` on the review step or after submission.
    pub fn form(&self) -> Option<&dyn StepForm> {
        self.current_namespace()
            .map(|namespace| self.forms.get(namespace))
    }

    pub fn form_mut(&mut self) -> Option<&mut dyn StepForm> {
        let namespace = self.current_namespace()?;
        Some(self.forms.get_mut(namespace))
    }

    pub fn preferences_mut(&mut self) -> Option<&mut PreferencesStep> {
        match self.current_namespace() {
            Some(Namespace::Preferences) => Some(&mut self.forms.preferences),
            _ => None,
        }
    }

    fn record<T>(&mut self, err: impl Into<WizardError>) -> Result<T, WizardError> {
        let err = err.into();
        self.notice = Some(err.notice());
        Err(err)
    }

    fn not_on_a_step(&self) -> WizardError {
        match self.sequencer.current_step() {
            Err(err) => err.into(),
            Ok(step) => SequencerError::OutOfRange {
                index: step.index,
                direction: Direction::Forward,
            }
            .into(),
        }
    }

    fn load_current_form(&mut self) {
        let Ok(step) = self.sequencer.current_step() else {
            return;
        };
        if let Some(namespace) = step.namespace {
            self.forms.get_mut(namespace).load(step.slice);
        }
    }

    pub fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), WizardError> {
        let Some(form) = self.form_mut() else {
            let err = self.not_on_a_step();
            return self.record(err);
        };
        match form.set(field, value) {
            Ok(()) => Ok(()),
            Err(err) => self.record(err),
        }
    }

    /// Encode a file into one of the current step's file fields. `Ok(None)` means a newer
    /// selection for the same field replaced this one.
    pub async fn select_file(
        &self,
        field: &str,
        path: &Path,
    ) -> Result<Option<FileAsset>, WizardError> {
        let step = self
            .current_namespace()
            .and_then(|namespace| self.forms.upload(namespace))
            .ok_or_else(|| ValidationError::NotAFileField {
                field: field.to_string(),
            })?;

        match step.select_file(field, path).await? {
            SlotOutcome::Applied(asset) => Ok(Some(asset)),
            SlotOutcome::Superseded => Ok(None),
            SlotOutcome::Failed(err) => Err(err.into()),
        }
    }

    /// Validate the current step and move to the next one.
    pub fn next(&mut self) -> Result<usize, WizardError> {
        let Some(namespace) = self.current_namespace() else {
            let err = self.not_on_a_step();
            return self.record(err);
        };
        let payload = match self.forms.get(namespace).emit() {
            Ok(payload) => payload,
            Err(err) => return self.record(err),
        };

        let index = match self.sequencer.advance(payload) {
            Ok(index) => index,
            Err(err) => return self.record(err),
        };
        self.confirmation = None;
        self.notice = None;
        self.load_current_form();
        Ok(index)
    }

    /// Move back one step. Unsaved edits on the step being left are discarded.
    pub fn back(&mut self) -> Result<usize, WizardError> {
        let index = match self.sequencer.retreat() {
            Ok(index) => index,
            Err(err) => return self.record(err),
        };
        self.confirmation = None;
        self.load_current_form();
        Ok(index)
    }

    pub fn review_summary(&self) -> Vec<ReviewSection> {
        self.review.summary(self.sequencer.document())
    }

    pub fn confirm_declaration(&mut self, accepted: bool) -> Result<(), WizardError> {
        if !self.is_review() {
            let err = self.not_on_a_step();
            return self.record(err);
        }
        match self.review.confirm(accepted) {
            Ok(confirmation) => {
                self.confirmation = Some(confirmation);
                Ok(())
            }
            Err(err) => self.record(err),
        }
    }

    /// Resume from the known draft, the caller's latest draft or the local backup.
    pub async fn restore(&mut self, known: Option<DraftId>) -> Result<RestoredFrom, WizardError> {
        if let WizardState::Submitted { application_id } = self.sequencer.state() {
            let err = SequencerError::AlreadySubmitted(application_id.clone());
            return self.record(err);
        }

        let outcome = self.drafts.restore(known.as_ref()).await;
        self.notice = outcome.remote_error().map(|err| {
            WizardError::Persistence(err.clone())
                .notice()
                .with_retry(Some(RetryAction::LoadDraft))
        });

        let (document, draft_id, source) = match outcome {
            RestoreOutcome::Remote(draft) => {
                let draft_id = draft.draft_id.or(known);
                let source = match &draft_id {
                    Some(id) => RestoredFrom::RemoteDraft(id.clone()),
                    None => RestoredFrom::Fresh,
                };
                (draft.data, draft_id, source)
            }
            RestoreOutcome::Local { backup, .. } => (backup.data, None, RestoredFrom::LocalBackup),
            RestoreOutcome::Fresh { .. } => (ApplicationDocument::new(), None, RestoredFrom::Fresh),
        };

        self.sequencer = StepSequencer::resume(document);
        self.draft_id = draft_id;
        self.confirmation = None;
        self.forms = StepForms::new();
        self.load_current_form();
        debug!(?source, "session restored");
        Ok(source)
    }

    /// Checkpoint the document. A failed remote save is reported through [`Self::notice`]
    /// even when the local backup succeeded.
    pub async fn save_draft(&mut self) -> Result<CheckpointOutcome, WizardError> {
        if let WizardState::Submitted { application_id } = self.sequencer.state() {
            let err = SequencerError::AlreadySubmitted(application_id.clone());
            return self.record(err);
        }

        let outcome = self
            .drafts
            .checkpoint(self.sequencer.document(), self.draft_id.as_ref())
            .await;
        match &outcome {
            CheckpointOutcome::Remote(draft_id) => {
                self.draft_id = Some(draft_id.clone());
                self.notice = None;
            }
            CheckpointOutcome::LocalFallback { error, backed_up } => {
                let mut notice = WizardError::Persistence(error.clone()).notice();
                notice.message = if *backed_up {
                    format!("{} A copy was kept on this device.", notice.message)
                } else {
                    format!("{} No local copy could be kept either.", notice.message)
                };
                self.notice = Some(notice);
            }
        }
        Ok(outcome)
    }

    /// Submit from the review step. On failure the document stays as it was.
    pub async fn submit(&mut self) -> Result<ApplicationId, WizardError> {
        if !self.is_review() {
            let err = self.not_on_a_step();
            return self.record(err);
        }
        let Some(confirmation) = self.confirmation.clone() else {
            return self.record(ValidationError::DeclarationNotAccepted);
        };

        let result = self
            .assembler
            .submit(self.sequencer.document(), &confirmation)
            .await;
        let application_id = match result {
            Ok(application_id) => application_id,
            Err(err) => return self.record(err),
        };

        if let Err(err) = self.sequencer.mark_submitted(application_id.clone()) {
            return self.record(err);
        }
        self.notice = None;

        if let Some(draft_id) = self.draft_id.take() {
            if let Err(err) = self.drafts.delete_draft(&draft_id).await {
                warn!(draft_id = %draft_id, error = %err, "submitted draft could not be deleted");
            }
        }
        self.drafts.clear_local_backup();
        info!(application_id = %application_id, "wizard completed");
        Ok(application_id)
    }
}
