//! Linear navigation over the nine wizard steps and ownership of the merged document.

use serde::Serialize;
use tracing::debug;

use super::domain::{ApplicationDocument, ApplicationId, Namespace, StepPayload};
use super::error::{Direction, SequencerError};

pub const STEP_COUNT: usize = 9;

/// Index of the display-only review step.
pub const REVIEW_STEP: usize = STEP_COUNT - 1;

/// Namespace owned by each step; the review step owns none.
pub const fn step_namespace(index: usize) -> Option<Namespace> {
    if index < Namespace::ALL.len() {
        Some(Namespace::ALL[index])
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum WizardState {
    Step { index: usize },
    Submitted { application_id: ApplicationId },
}

/// The step a form should render, with its namespace's current slice for pre-population.
#[derive(Debug, Clone, Copy)]
pub struct CurrentStep<'a> {
    pub index: usize,
    pub namespace: Option<Namespace>,
    pub slice: Option<&'a StepPayload>,
}

#[derive(Debug, Clone)]
pub struct StepSequencer {
    state: WizardState,
    document: ApplicationDocument,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSequencer {
    pub fn new() -> Self {
        Self {
            state: WizardState::Step { index: 0 },
            document: ApplicationDocument::new(),
        }
    }

    /// Resume with a restored document, positioned at the first step not yet completed.
    pub fn resume(document: ApplicationDocument) -> Self {
        let index = document
            .missing()
            .first()
            .map(|namespace| namespace.step_index())
            .unwrap_or(REVIEW_STEP);
        Self {
            state: WizardState::Step { index },
            document,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn document(&self) -> &ApplicationDocument {
        &self.document
    }

    fn active_index(&self) -> Result<usize, SequencerError> {
        match &self.state {
            WizardState::Step { index } => Ok(*index),
            WizardState::Submitted { application_id } => {
                Err(SequencerError::AlreadySubmitted(application_id.clone()))
            }
        }
    }

    /// Merge `partial` under its namespace and move forward one step.
    pub fn advance(&mut self, partial: StepPayload) -> Result<usize, SequencerError> {
        let index = self.active_index()?;
        let Some(expected) = step_namespace(index) else {
            return Err(SequencerError::OutOfRange {
                index,
                direction: Direction::Forward,
            });
        };
        if partial.namespace() != expected {
            return Err(SequencerError::NamespaceMismatch {
                index,
                expected: expected.key().to_string(),
                found: partial.namespace(),
            });
        }

        let replaced = self.document.merge(partial).is_some();
        let next = index + 1;
        self.state = WizardState::Step { index: next };
        debug!(namespace = %expected, replaced, step = next, "advanced wizard");
        Ok(next)
    }

    /// Move back one step. Data merged for later steps is kept.
    pub fn retreat(&mut self) -> Result<usize, SequencerError> {
        let index = self.active_index()?;
        if index == 0 {
            return Err(SequencerError::OutOfRange {
                index,
                direction: Direction::Backward,
            });
        }
        let previous = index - 1;
        self.state = WizardState::Step { index: previous };
        debug!(step = previous, "retreated wizard");
        Ok(previous)
    }

    pub fn current_step(&self) -> Result<CurrentStep<'_>, SequencerError> {
        let index = self.active_index()?;
        let namespace = step_namespace(index);
        Ok(CurrentStep {
            index,
            namespace,
            slice: namespace.and_then(|namespace| self.document.slice(namespace)),
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, WizardState::Step { index } if index == REVIEW_STEP)
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, WizardState::Submitted { .. })
    }

    /// Transition from the review step to the spent `submitted` state.
    pub fn mark_submitted(&mut self, application_id: ApplicationId) -> Result<(), SequencerError> {
        let index = self.active_index()?;
        if index != REVIEW_STEP {
            return Err(SequencerError::OutOfRange {
                index,
                direction: Direction::Forward,
            });
        }
        self.state = WizardState::Submitted { application_id };
        Ok(())
    }
}
