use uuid::Uuid;

use super::step::{FieldRule, StepDefinition};
use super::validators as v;
use super::wizard::WizardDefinition;
use super::{read_amount, read_date, read_number, read_optional_amount, FormErrors, FormValues};
use crate::domain::{LeaseDraft, ListingId};
use crate::submission::AssembledSubmission;

fn end_after_start(values: &dyn FormValues) -> Option<(&'static str, String)> {
    let start = v::parse_date(values.value("start_date"))?;
    let end = v::parse_date(values.value("end_date"))?;
    (end <= start).then(|| ("end_date", "End date must be after start date".to_string()))
}

/// Standard lease: parties and terms, then review and sign.
pub static STANDARD_LEASE: WizardDefinition = WizardDefinition {
    name: "standard-lease",
    steps: &[
        StepDefinition {
            key: "terms",
            title: "Parties and terms",
            fields: &[
                FieldRule { name: "listing_id", validator: v::listing_reference },
                FieldRule { name: "tenant_name", validator: v::tenant_name },
                FieldRule { name: "tenant_email", validator: v::tenant_email },
                FieldRule { name: "start_date", validator: v::lease_start_date },
                FieldRule { name: "end_date", validator: v::lease_end_date },
                FieldRule { name: "rent", validator: v::rent_amount },
                FieldRule { name: "security_deposit", validator: v::security_deposit },
                FieldRule { name: "payment_due_day", validator: v::payment_due_day },
                FieldRule { name: "late_fee", validator: v::late_fee },
            ],
            groups: &[],
            attachments: &[],
            checks: &[end_after_start],
        },
        StepDefinition {
            key: "review",
            title: "Clauses and review",
            fields: &[FieldRule { name: "landlord_signature", validator: v::landlord_signature }],
            groups: &[],
            attachments: &[],
            checks: &[],
        },
    ],
};

impl LeaseDraft {
    pub fn from_submission(submission: &AssembledSubmission) -> Result<Self, FormErrors> {
        let errors = STANDARD_LEASE.validate(submission);
        if !errors.is_empty() {
            return Err(errors);
        }

        let listing = Uuid::parse_str(submission.value("listing_id").trim())
            .map_err(|_| FormErrors::single("listing_id", "Select a property"))?;

        Ok(Self {
            listing_id: ListingId(listing),
            tenant_name: submission.value("tenant_name").trim().to_string(),
            tenant_email: submission.value("tenant_email").trim().to_string(),
            start_date: read_date(submission.value("start_date"), "start_date")?,
            end_date: read_date(submission.value("end_date"), "end_date")?,
            rent: read_amount(submission.value("rent"), "rent")?,
            security_deposit: read_amount(submission.value("security_deposit"), "security_deposit")?,
            payment_due_day: read_number(submission.value("payment_due_day"), "payment_due_day")?,
            late_fee: read_optional_amount(submission.value("late_fee"), "late_fee")?,
        })
    }

    /// Checks a draft that arrived already typed (custom lease uploads).
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if let Some(message) = v::tenant_name(&self.tenant_name) {
            errors.insert_field("tenant_name", message);
        }
        if let Some(message) = v::tenant_email(&self.tenant_email) {
            errors.insert_field("tenant_email", message);
        }
        if self.end_date <= self.start_date {
            errors.insert_field("end_date", "End date must be after start date");
        }
        if !self.rent.is_positive() {
            errors.insert_field("rent", "Rent amount must be greater than 0");
        }
        if self.security_deposit.0 < 0 {
            errors.insert_field("security_deposit", "Security deposit cannot be negative");
        }
        if !(1..=28).contains(&self.payment_due_day) {
            errors.insert_field("payment_due_day", "Payment due day must be between 1 and 28");
        }
        if self.late_fee.is_some_and(|fee| !fee.is_positive()) {
            errors.insert_field("late_fee", "Late fee must be greater than 0");
        }
        errors
    }
}
