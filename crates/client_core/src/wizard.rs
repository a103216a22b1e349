//! Wizard state machine for the three-step try-on flow.
//!
//! The whole screen state is a single [`WizardState`] value, so a loading
//! indicator and an error banner can never be shown at the same time and the
//! result step is only reachable through a successful submission.

use shared::{
    domain::{DataUrl, FormData, ImageSlot, SubmissionResult, WizardStep},
    error::TryOnError,
    protocol::TryOnRequest,
    validation::validate_step1,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::image_loader::{ImageLoadError, ImageLoadOutcome};

pub const PROGRESS_MESSAGES: [&str; 4] = [
    "Uploading your photos...",
    "Analyzing body measurements...",
    "Fitting the garment to your shape...",
    "Rendering your virtual try-on...",
];

/// The two steps on which the form can still be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStep {
    Details,
    Measurements,
}

impl From<EditStep> for WizardStep {
    fn from(value: EditStep) -> Self {
        match value {
            EditStep::Details => WizardStep::Details,
            EditStep::Measurements => WizardStep::Measurements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Editing {
        step: EditStep,
        data: FormData,
    },
    Submitting {
        data: FormData,
        progress: usize,
    },
    Succeeded {
        result: SubmissionResult,
    },
    Failed {
        step: EditStep,
        data: FormData,
        error: TryOnError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error("cannot {action} from step {}", .step.number())]
    NotAllowed {
        action: &'static str,
        step: WizardStep,
    },
    /// The wizard recorded this error and stayed on its step.
    #[error(transparent)]
    Rejected(#[from] TryOnError),
}

/// Identifies one submission attempt. Finishing with a ticket from an older
/// attempt (e.g. one started before a restart) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub ticket: SubmissionTicket,
    pub request: TryOnRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageApplied {
    Applied,
    Stale,
    Failed(ImageLoadError),
}

#[derive(Debug, Clone)]
pub struct Wizard {
    state: WizardState,
    image_generations: [u64; 2],
    submission_seq: u64,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            state: WizardState::Editing {
                step: EditStep::Details,
                data: FormData::default(),
            },
            image_generations: [0; 2],
            submission_seq: 0,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> WizardStep {
        match &self.state {
            WizardState::Editing { step, .. } | WizardState::Failed { step, .. } => (*step).into(),
            WizardState::Submitting { .. } => WizardStep::Measurements,
            WizardState::Succeeded { .. } => WizardStep::Result,
        }
    }

    pub fn data(&self) -> Option<&FormData> {
        match &self.state {
            WizardState::Editing { data, .. }
            | WizardState::Submitting { data, .. }
            | WizardState::Failed { data, .. } => Some(data),
            WizardState::Succeeded { .. } => None,
        }
    }

    /// Mutable access while the form is editable. Edits do not clear a shown
    /// error; the next transition does.
    pub fn data_mut(&mut self) -> Option<&mut FormData> {
        match &mut self.state {
            WizardState::Editing { data, .. } | WizardState::Failed { data, .. } => Some(data),
            WizardState::Submitting { .. } | WizardState::Succeeded { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&TryOnError> {
        match &self.state {
            WizardState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        match &self.state {
            WizardState::Succeeded { result } => Some(result),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, WizardState::Submitting { .. })
    }

    pub fn loading_message(&self) -> Option<&'static str> {
        match self.state {
            WizardState::Submitting { progress, .. } => {
                Some(PROGRESS_MESSAGES[progress % PROGRESS_MESSAGES.len()])
            }
            _ => None,
        }
    }

    pub fn advance_progress(&mut self) {
        if let WizardState::Submitting { progress, .. } = &mut self.state {
            *progress = (*progress + 1) % PROGRESS_MESSAGES.len();
        }
    }

    /// Step 1 -> step 2.
    pub fn next(&mut self) -> Result<(), TransitionError> {
        let step = self.editable_step("go to the next step")?;
        if step != EditStep::Details {
            return Err(TransitionError::NotAllowed {
                action: "go to the next step",
                step: step.into(),
            });
        }
        let data = self.take_form();
        match validate_step1(&data) {
            Ok(()) => {
                debug!("wizard: details complete, moving to measurements");
                self.state = WizardState::Editing {
                    step: EditStep::Measurements,
                    data,
                };
                Ok(())
            }
            Err(err) => {
                let error = TryOnError::from(err);
                self.state = WizardState::Failed {
                    step: EditStep::Details,
                    data,
                    error: error.clone(),
                };
                Err(TransitionError::Rejected(error))
            }
        }
    }

    /// Step 2 -> step 1.
    pub fn back(&mut self) -> Result<(), TransitionError> {
        let step = self.editable_step("go back")?;
        if step != EditStep::Measurements {
            return Err(TransitionError::NotAllowed {
                action: "go back",
                step: step.into(),
            });
        }
        let data = self.take_form();
        self.state = WizardState::Editing {
            step: EditStep::Details,
            data,
        };
        Ok(())
    }

    /// Validates the form and enters the loading state. The caller performs
    /// the network call and reports back through [`Wizard::finish_submit`].
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, TransitionError> {
        if self.is_loading() {
            return Err(TransitionError::SubmissionInFlight);
        }
        let step = self.editable_step("submit")?;
        if step != EditStep::Measurements {
            return Err(TransitionError::NotAllowed {
                action: "submit",
                step: step.into(),
            });
        }

        let data = self.take_form();
        match TryOnRequest::from_form(&data) {
            Ok(request) => {
                self.submission_seq += 1;
                let ticket = SubmissionTicket(self.submission_seq);
                info!(attempt = self.submission_seq, style = request.style.as_str(), "wizard: submission started");
                self.state = WizardState::Submitting { data, progress: 0 };
                Ok(PendingSubmission { ticket, request })
            }
            Err(err) => {
                let error = TryOnError::from(err);
                self.state = WizardState::Failed {
                    step: EditStep::Measurements,
                    data,
                    error: error.clone(),
                };
                Err(TransitionError::Rejected(error))
            }
        }
    }

    /// Leaves the loading state. Success moves to step 3, failure stays on
    /// step 2 with the error shown.
    pub fn finish_submit(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<SubmissionResult, TryOnError>,
    ) -> Result<(), TransitionError> {
        if ticket.0 != self.submission_seq || !self.is_loading() {
            debug!(ticket = ticket.0, current = self.submission_seq, "wizard: ignoring stale submission outcome");
            return Err(TransitionError::NotAllowed {
                action: "finish a submission",
                step: self.step(),
            });
        }

        let data = self.take_form();
        match outcome {
            Ok(result) => {
                info!(attempt = ticket.0, "wizard: submission succeeded");
                self.state = WizardState::Succeeded { result };
                Ok(())
            }
            Err(error) => {
                info!(attempt = ticket.0, "wizard: submission failed: {error}");
                self.state = WizardState::Failed {
                    step: EditStep::Measurements,
                    data,
                    error,
                };
                Ok(())
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        if let WizardState::Failed { step, .. } = self.state {
            let data = self.take_form();
            self.state = WizardState::Editing { step, data };
        }
    }

    /// Back to an empty step 1. Pending image reads and any in-flight
    /// submission become stale.
    pub fn restart(&mut self) {
        for generation in &mut self.image_generations {
            *generation += 1;
        }
        self.submission_seq += 1;
        self.state = WizardState::Editing {
            step: EditStep::Details,
            data: FormData::default(),
        };
    }

    /// Registers a new read for `slot` and returns its generation. Only the
    /// most recently registered generation will be applied.
    pub fn begin_image_load(&mut self, slot: ImageSlot) -> u64 {
        let generation = &mut self.image_generations[slot_index(slot)];
        *generation += 1;
        *generation
    }

    pub fn finish_image_load(&mut self, outcome: ImageLoadOutcome) -> ImageApplied {
        if outcome.generation != self.image_generations[slot_index(outcome.slot)] {
            debug!(slot = %outcome.slot, generation = outcome.generation, "wizard: dropping stale image");
            return ImageApplied::Stale;
        }
        match outcome.result {
            Ok(image) => self.set_image(outcome.slot, image),
            Err(err) => ImageApplied::Failed(err),
        }
    }

    pub fn set_image(&mut self, slot: ImageSlot, image: DataUrl) -> ImageApplied {
        match self.data_mut() {
            Some(data) => {
                data.set_image(slot, Some(image));
                ImageApplied::Applied
            }
            None => ImageApplied::Stale,
        }
    }

    fn editable_step(&self, action: &'static str) -> Result<EditStep, TransitionError> {
        match &self.state {
            WizardState::Editing { step, .. } | WizardState::Failed { step, .. } => Ok(*step),
            WizardState::Submitting { .. } => Err(TransitionError::SubmissionInFlight),
            WizardState::Succeeded { .. } => Err(TransitionError::NotAllowed {
                action,
                step: WizardStep::Result,
            }),
        }
    }

    fn take_form(&mut self) -> FormData {
        match &mut self.state {
            WizardState::Editing { data, .. }
            | WizardState::Submitting { data, .. }
            | WizardState::Failed { data, .. } => std::mem::take(data),
            WizardState::Succeeded { .. } => FormData::default(),
        }
    }
}

fn slot_index(slot: ImageSlot) -> usize {
    match slot {
        ImageSlot::User => 0,
        ImageSlot::Clothing => 1,
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
