use serde::Serialize;

use super::domain::{ApplicationId, DraftId, Namespace};

/// Step-local validation failure. Blocks `advance`; never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{namespace}: required fields missing: {}", .fields.join(", "))]
    MissingFields {
        namespace: Namespace,
        fields: Vec<String>,
    },
    #[error("{namespace}: field '{field}' {reason}")]
    InvalidField {
        namespace: Namespace,
        field: String,
        reason: String,
    },
    #[error("{namespace}: unknown field '{field}'")]
    UnknownField { namespace: Namespace, field: String },
    #[error("'{field}' is not a file field of the current step")]
    NotAFileField { field: String },
    #[error("the declaration must be accepted before submitting")]
    DeclarationNotAccepted,
}

/// Remote draft save/load/delete failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("draft service unreachable: {0}")]
    Transport(String),
    #[error("draft service rejected the request ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("draft service returned an unreadable response: {0}")]
    Decode(String),
    #[error("no bearer credential is available for the draft service")]
    Unauthorized,
}

/// A selected file could not be turned into a [`FileAsset`](super::domain::FileAsset).
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("could not read file for '{field}': {source}")]
    Unreadable {
        field: String,
        #[source]
        source: std::io::Error,
    },
    #[error("selected file for '{field}' is empty")]
    Empty { field: String },
}

impl EncodingError {
    pub fn field(&self) -> &str {
        match self {
            EncodingError::Unreadable { field, .. } | EncodingError::Empty { field } => field,
        }
    }
}

/// Final submission failed; the document is retained for a user-initiated retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("application is incomplete; missing sections: {}", join_namespaces(.missing))]
    Incomplete { missing: Vec<Namespace> },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("application service rejected the submission ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("application service unreachable: {0}")]
    Transport(String),
    #[error("application service returned an unreadable response: {0}")]
    Decode(String),
}

/// A draft or application identifier did not resolve for the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("draft {0} not found")]
    Draft(DraftId),
    #[error("application {0} not found")]
    Application(ApplicationId),
}

/// Navigation outside the step range or against a spent wizard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    #[error("cannot move {direction} from step {index}")]
    OutOfRange {
        index: usize,
        direction: Direction,
    },
    #[error("step {index} owns '{expected}' but received a '{found}' payload")]
    NamespaceMismatch {
        index: usize,
        expected: String,
        found: Namespace,
    },
    #[error("application {0} was already submitted")]
    AlreadySubmitted(ApplicationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

/// Failure of a call keyed by an identifier: "does not exist" versus "could not ask".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Umbrella error surfaced by the wizard session.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

impl From<LoadError> for WizardError {
    fn from(value: LoadError) -> Self {
        match value {
            LoadError::NotFound(err) => WizardError::NotFound(err),
            LoadError::Persistence(err) => WizardError::Persistence(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Persistence,
    Encoding,
    Submission,
    NotFound,
    Navigation,
}

/// Explicit control offered next to a failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum RetryAction {
    SaveDraft,
    LoadDraft,
    Submit,
    ReselectFile { field: String },
}

/// What the user sees when an operation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserNotice {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryAction>,
}

impl UserNotice {
    /// Replace the default retry control, e.g. a failed draft load offers "load" not "save".
    pub fn with_retry(mut self, retry: Option<RetryAction>) -> Self {
        self.retry = retry;
        self
    }
}

impl WizardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WizardError::Validation(_) => ErrorKind::Validation,
            WizardError::Persistence(_) => ErrorKind::Persistence,
            WizardError::Encoding(_) => ErrorKind::Encoding,
            WizardError::Submission(_) => ErrorKind::Submission,
            WizardError::NotFound(_) => ErrorKind::NotFound,
            WizardError::Sequencer(_) => ErrorKind::Navigation,
        }
    }

    pub fn retry(&self) -> Option<RetryAction> {
        match self {
            WizardError::Persistence(_) => Some(RetryAction::SaveDraft),
            WizardError::Encoding(err) => Some(RetryAction::ReselectFile {
                field: err.field().to_string(),
            }),
            WizardError::Submission(
                SubmissionError::Rejected { .. }
                | SubmissionError::Transport(_)
                | SubmissionError::Decode(_),
            ) => Some(RetryAction::Submit),
            WizardError::Validation(_)
            | WizardError::Submission(_)
            | WizardError::NotFound(_)
            | WizardError::Sequencer(_) => None,
        }
    }

    pub fn notice(&self) -> UserNotice {
        let message = match self {
            WizardError::Persistence(err) => {
                format!("The admission server could not complete the request: {err}")
            }
            WizardError::Submission(SubmissionError::Incomplete { .. }) => {
                format!("Please complete every section before submitting. {self}")
            }
            WizardError::NotFound(err) => format!("Not found: {err}"),
            other => other.to_string(),
        };

        UserNotice {
            kind: self.kind(),
            message,
            retry: self.retry(),
        }
    }
}

fn join_namespaces(namespaces: &[Namespace]) -> String {
    namespaces
        .iter()
        .map(|namespace| namespace.key())
        .collect::<Vec<_>>()
        .join(", ")
}
