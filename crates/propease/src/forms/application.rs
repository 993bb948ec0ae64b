use super::step::{AttachmentRule, FieldRule, GroupRule, StepDefinition};
use super::validators as v;
use super::wizard::WizardDefinition;
use super::{optional_text, read_amount, read_date, read_number, FormErrors, FormValues};
use crate::domain::{ApplicationForm, EmploymentEntry};
use crate::submission::AssembledSubmission;
use crate::uploads::UploadKind;

pub const EMPLOYMENT: &str = "employment";
pub const DOCUMENTS: &str = "documents";

/// Tenant application: personal and income details, employment history,
/// rental history, supporting documents. Pets and notes are optional.
pub static TENANT_APPLICATION: WizardDefinition = WizardDefinition {
    name: "tenant-application",
    steps: &[
        StepDefinition {
            key: "personal",
            title: "Personal information",
            fields: &[
                FieldRule { name: "full_name", validator: v::full_name },
                FieldRule { name: "email", validator: v::email },
                FieldRule { name: "phone", validator: v::phone },
                FieldRule { name: "date_of_birth", validator: v::date_of_birth },
                FieldRule { name: "monthly_income", validator: v::monthly_income },
                FieldRule { name: "number_of_tenants", validator: v::number_of_tenants },
                FieldRule { name: "move_in_date", validator: v::move_in_date },
            ],
            groups: &[],
            attachments: &[],
            checks: &[],
        },
        StepDefinition {
            key: "employment",
            title: "Employment",
            fields: &[],
            groups: &[GroupRule {
                group: EMPLOYMENT,
                min_entries: 1,
                empty_message: "Add at least one employer",
                fields: &[
                    FieldRule { name: "employer", validator: v::employer },
                    FieldRule { name: "position", validator: v::position },
                    FieldRule { name: "monthly_income", validator: v::monthly_income },
                    FieldRule { name: "start_date", validator: v::employment_start_date },
                ],
            }],
            attachments: &[],
            checks: &[],
        },
        StepDefinition {
            key: "rental_history",
            title: "Rental history",
            fields: &[
                FieldRule { name: "previous_address", validator: v::previous_address },
                FieldRule { name: "previous_landlord_name", validator: v::previous_landlord_name },
                FieldRule { name: "previous_landlord_phone", validator: v::previous_landlord_phone },
            ],
            groups: &[],
            attachments: &[],
            checks: &[],
        },
        StepDefinition {
            key: "documents",
            title: "Documents",
            fields: &[],
            groups: &[],
            attachments: &[AttachmentRule {
                slot: DOCUMENTS,
                kind: UploadKind::ApplicationDocument,
                min_files: 1,
                message: "Upload at least one document",
            }],
            checks: &[],
        },
    ],
};

impl ApplicationForm {
    /// Re-validates an assembled submission with the wizard's own rules and
    /// builds the typed payload.
    pub fn from_submission(submission: &AssembledSubmission) -> Result<Self, FormErrors> {
        let errors = TENANT_APPLICATION.validate(submission);
        if !errors.is_empty() {
            return Err(errors);
        }

        let employment = submission
            .entries(EMPLOYMENT)
            .iter()
            .map(|entry| {
                let value = |field: &str| entry.get(field).map(String::as_str).unwrap_or("");
                Ok(EmploymentEntry {
                    employer: value("employer").trim().to_string(),
                    position: value("position").trim().to_string(),
                    monthly_income: read_amount(value("monthly_income"), "monthly_income")?,
                    start_date: read_date(value("start_date"), "start_date")?,
                })
            })
            .collect::<Result<Vec<_>, FormErrors>>()?;

        Ok(Self {
            full_name: submission.value("full_name").trim().to_string(),
            email: submission.value("email").trim().to_string(),
            phone: submission.value("phone").trim().to_string(),
            date_of_birth: read_date(submission.value("date_of_birth"), "date_of_birth")?,
            monthly_income: read_amount(submission.value("monthly_income"), "monthly_income")?,
            number_of_tenants: read_number(submission.value("number_of_tenants"), "number_of_tenants")?,
            // Optional and never validated; anything unreadable is dropped.
            pets: submission.value("pets").trim().parse().ok(),
            move_in_date: read_date(submission.value("move_in_date"), "move_in_date")?,
            employment,
            previous_address: submission.value("previous_address").trim().to_string(),
            previous_landlord_name: submission.value("previous_landlord_name").trim().to_string(),
            previous_landlord_phone: submission.value("previous_landlord_phone").trim().to_string(),
            notes: optional_text(submission.value("notes")),
            documents: submission.uploads_for(DOCUMENTS).to_vec(),
        })
    }
}
