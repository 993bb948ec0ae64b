//! Multi-step validated forms.
//!
//! A [`Wizard`] owns a [`FormState`], walks a static table of
//! [`StepDefinition`]s with a [`StepNavigator`], and keeps the inline
//! [`FormErrors`] of the last validation. Validation failures are values, never
//! `Err`s; the only fallible wizard operations are attaching a file that fails
//! the upload preflight and starting a submit.
//!
//! The same step tables validate an [`crate::submission::AssembledSubmission`]
//! on the server before it is turned into a typed payload.

pub mod application;
pub mod errors;
pub mod lease;
pub mod navigator;
pub mod state;
pub mod step;
pub mod validators;
pub mod wizard;

pub use application::TENANT_APPLICATION;
pub use errors::{EntryErrors, FormErrors};
pub use lease::STANDARD_LEASE;
pub use navigator::{StepNavigator, StepOutcome};
pub use state::{Entry, FormState, FormValues};
pub use step::{AttachmentRule, CrossCheck, FieldRule, GroupRule, StepDefinition};
pub use wizard::{SubmitPhase, Wizard, WizardDefinition};

use chrono::NaiveDate;

use crate::money::{parse_amount, Cents};

// Typed readers used after validation has passed. They still report a field
// error rather than panic if a caller skipped validation.

pub(crate) fn read_date(value: &str, field: &str) -> Result<NaiveDate, FormErrors> {
    validators::parse_date(value)
        .ok_or_else(|| FormErrors::single(field, "Enter a valid date (YYYY-MM-DD)"))
}

pub(crate) fn read_amount(value: &str, field: &str) -> Result<Cents, FormErrors> {
    parse_amount(value).map_err(|err| FormErrors::single(field, err.to_string()))
}

pub(crate) fn read_optional_amount(value: &str, field: &str) -> Result<Option<Cents>, FormErrors> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    read_amount(value, field).map(Some)
}

pub(crate) fn read_number<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, FormErrors> {
    value
        .trim()
        .parse()
        .map_err(|_| FormErrors::single(field, "Enter a whole number"))
}

pub(crate) fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
