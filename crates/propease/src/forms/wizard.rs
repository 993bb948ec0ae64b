use tracing::debug;

use super::navigator::{StepNavigator, StepOutcome};
use super::state::{FormState, FormValues};
use super::step::StepDefinition;
use super::FormErrors;
use crate::submission::SubmissionError;
use crate::uploads::{LocalFile, UploadError};

pub struct WizardDefinition {
    pub name: &'static str,
    pub steps: &'static [StepDefinition],
}

impl WizardDefinition {
    /// Every step at once, as the server checks a finished submission.
    pub fn validate(&self, values: &dyn FormValues) -> FormErrors {
        StepNavigator::new(self.steps).validate_all(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Editing,
    Submitting,
    Submitted,
}

/// Form state, step position, inline errors, and submit phase of one wizard run.
pub struct Wizard {
    definition: &'static WizardDefinition,
    state: FormState,
    navigator: StepNavigator,
    errors: FormErrors,
    phase: SubmitPhase,
}

impl Wizard {
    pub fn new(definition: &'static WizardDefinition) -> Self {
        Self {
            definition,
            state: FormState::new(),
            navigator: StepNavigator::new(definition.steps),
            errors: FormErrors::default(),
            phase: SubmitPhase::Editing,
        }
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    pub fn definition(&self) -> &'static WizardDefinition {
        self.definition
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn step_index(&self) -> usize {
        self.navigator.current()
    }

    pub fn current_step(&self) -> Option<&'static StepDefinition> {
        self.navigator.current_step()
    }

    /// Editing a field clears its inline error until the next validation.
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.state.set(field, value);
        self.errors.clear_field(field);
    }

    pub fn add_entry(&mut self, group: &str) -> usize {
        self.errors.clear_field(group);
        self.state.push_entry(group)
    }

    pub fn set_entry(&mut self, group: &str, index: usize, field: &str, value: impl Into<String>) -> bool {
        let updated = self.state.set_entry(group, index, field, value);
        if updated {
            self.errors.clear_entry_field(group, index, field);
        }
        updated
    }

    /// Removes a repeatable entry and re-indexes its errors to match.
    pub fn remove_entry(&mut self, group: &str, index: usize) -> bool {
        if self.state.remove_entry(group, index).is_none() {
            return false;
        }
        self.errors.remove_entry(group, index);
        true
    }

    /// Rejects files that would fail the upload preflight so the user sees the
    /// message before anything is sent.
    pub fn attach(&mut self, slot: &str, file: LocalFile) -> Result<(), UploadError> {
        let rule = self
            .definition
            .steps
            .iter()
            .find_map(|step| step.attachment_rule(slot));
        if let Some(rule) = rule {
            rule.kind.preflight(&file)?;
        }
        self.state.attach(slot, file);
        self.errors.clear_attachment(slot);
        Ok(())
    }

    pub fn detach(&mut self, slot: &str, index: usize) -> Option<LocalFile> {
        self.state.detach(slot, index)
    }

    pub fn next(&mut self) -> StepOutcome {
        let outcome = self.navigator.next(&self.state);
        match &outcome {
            StepOutcome::Blocked(errors) => {
                debug!(wizard = self.name(), step = self.navigator.current(), errors = errors.len(), "step blocked");
                self.errors = errors.clone();
            }
            StepOutcome::Advanced { .. } | StepOutcome::AtLastStep => {
                self.errors = FormErrors::default();
            }
        }
        outcome
    }

    pub fn back(&mut self) -> bool {
        self.navigator.back()
    }

    pub fn can_submit(&self) -> bool {
        self.phase == SubmitPhase::Editing && self.navigator.can_submit(&self.state)
    }

    /// Enters the submitting phase. A second call while a submit is in flight,
    /// or after one succeeded, is refused.
    pub fn begin_submit(&mut self) -> Result<&FormState, SubmissionError> {
        match self.phase {
            SubmitPhase::Submitting => return Err(SubmissionError::InFlight),
            SubmitPhase::Submitted => return Err(SubmissionError::AlreadySubmitted),
            SubmitPhase::Editing => {}
        }
        let errors = self.navigator.validate_all(&self.state);
        if !errors.is_empty() || !self.navigator.is_last() {
            self.errors = errors.clone();
            return Err(SubmissionError::Incomplete(errors));
        }
        self.phase = SubmitPhase::Submitting;
        Ok(&self.state)
    }

    /// A failed submit returns to editing so the user can try again.
    pub fn finish_submit(&mut self, succeeded: bool) {
        self.phase = if succeeded {
            SubmitPhase::Submitted
        } else {
            SubmitPhase::Editing
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::application::TENANT_APPLICATION;

    #[test]
    fn removing_an_entry_keeps_values_and_errors_aligned() {
        let mut wizard = Wizard::new(&TENANT_APPLICATION);
        for _ in 0..3 {
            wizard.add_entry("employment");
        }
        wizard.set_entry("employment", 0, "employer", "Acme");
        wizard.set_entry("employment", 2, "employer", "Globex");
        let errors = wizard.navigator.validate_all(&wizard.state);
        wizard.errors = errors;
        assert!(wizard.errors().entry("employment", 1, "employer").is_some());
        assert!(wizard.errors().entry("employment", 2, "position").is_some());

        assert!(wizard.remove_entry("employment", 1));

        assert_eq!(wizard.state().entry_value("employment", 1, "employer"), "Globex");
        assert_eq!(wizard.errors().entry("employment", 1, "employer"), None);
        assert!(wizard.errors().entry("employment", 1, "position").is_some());
        assert!(wizard.errors().group("employment").is_some());
        assert!(!wizard.remove_entry("employment", 7));
    }

    #[test]
    fn oversized_document_is_refused_on_attach() {
        let mut wizard = Wizard::new(&TENANT_APPLICATION);
        let big = LocalFile::new("paystub.pdf", "application/pdf", vec![0; 11 * 1024 * 1024]);
        assert_eq!(
            wizard.attach("documents", big),
            Err(UploadError::TooLarge("File size should be less than 10MB"))
        );
        assert_eq!(wizard.state().attachments("documents").len(), 0);
    }

    #[test]
    fn submit_on_an_incomplete_form_is_refused() {
        let mut wizard = Wizard::new(&TENANT_APPLICATION);
        assert!(matches!(
            wizard.begin_submit(),
            Err(SubmissionError::Incomplete(_))
        ));
        assert_eq!(wizard.phase(), SubmitPhase::Editing);
    }
}
