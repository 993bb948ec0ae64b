use super::state::FormValues;
use super::step::StepDefinition;
use super::FormErrors;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced { from: usize, to: usize },
    /// The active step did not validate; the index is unchanged.
    Blocked(FormErrors),
    /// The last step validated; only submit remains.
    AtLastStep,
}

/// Linear step index with forward validation and free backward movement.
#[derive(Clone, Copy)]
pub struct StepNavigator {
    steps: &'static [StepDefinition],
    current: usize,
}

impl StepNavigator {
    pub fn new(steps: &'static [StepDefinition]) -> Self {
        Self { steps, current: 0 }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current_step(&self) -> Option<&'static StepDefinition> {
        self.steps.get(self.current)
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    pub fn steps(&self) -> &'static [StepDefinition] {
        self.steps
    }

    pub fn validate_current(&self, values: &dyn FormValues) -> FormErrors {
        self.current_step()
            .map(|step| step.validate(values))
            .unwrap_or_default()
    }

    pub fn next(&mut self, values: &dyn FormValues) -> StepOutcome {
        let errors = self.validate_current(values);
        if !errors.is_empty() {
            return StepOutcome::Blocked(errors);
        }
        if self.is_last() {
            return StepOutcome::AtLastStep;
        }
        let from = self.current;
        self.current += 1;
        StepOutcome::Advanced {
            from,
            to: self.current,
        }
    }

    /// Moves back one step without validating. Returns `false` on the first step.
    pub fn back(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn validate_all(&self, values: &dyn FormValues) -> FormErrors {
        let mut errors = FormErrors::default();
        for step in self.steps {
            errors.merge(step.validate(values));
        }
        errors
    }

    pub fn can_submit(&self, values: &dyn FormValues) -> bool {
        self.is_last() && self.validate_all(values).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::step::FieldRule;
    use crate::forms::{validators, FormState};

    const STEPS: &[StepDefinition] = &[
        StepDefinition {
            key: "name",
            title: "Name",
            fields: &[FieldRule {
                name: "full_name",
                validator: validators::full_name,
            }],
            groups: &[],
            attachments: &[],
            checks: &[],
        },
        StepDefinition {
            key: "income",
            title: "Income",
            fields: &[FieldRule {
                name: "monthly_income",
                validator: validators::monthly_income,
            }],
            groups: &[],
            attachments: &[],
            checks: &[],
        },
    ];

    #[test]
    fn next_is_blocked_until_the_step_validates() {
        let mut navigator = StepNavigator::new(STEPS);
        let mut state = FormState::new();

        match navigator.next(&state) {
            StepOutcome::Blocked(errors) => {
                assert_eq!(errors.field("full_name"), Some("Full name is required"))
            }
            other => panic!("expected blocked, got {other:?}"),
        }
        assert_eq!(navigator.current(), 0);

        state.set("full_name", "Jordan Lee");
        assert_eq!(
            navigator.next(&state),
            StepOutcome::Advanced { from: 0, to: 1 }
        );
        assert_eq!(navigator.current(), 1);
    }

    #[test]
    fn back_skips_validation_and_stops_at_zero() {
        let mut navigator = StepNavigator::new(STEPS);
        let mut state = FormState::new();
        state.set("full_name", "Jordan Lee");
        navigator.next(&state);

        assert!(navigator.back());
        assert_eq!(navigator.current(), 0);
        assert!(!navigator.back());
        assert_eq!(state.value("full_name"), "Jordan Lee");
    }

    #[test]
    fn submit_needs_last_step_and_every_step_valid() {
        let mut navigator = StepNavigator::new(STEPS);
        let mut state = FormState::new();
        state.set("full_name", "Jordan Lee");
        state.set("monthly_income", "4200");
        assert!(!navigator.can_submit(&state));

        navigator.next(&state);
        assert!(navigator.can_submit(&state));
        assert_eq!(navigator.next(&state), StepOutcome::AtLastStep);

        state.set("full_name", "");
        assert!(!navigator.can_submit(&state));
    }
}
