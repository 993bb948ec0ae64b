use super::state::FormValues;
use super::validators::Validator;
use super::FormErrors;
use crate::uploads::UploadKind;

pub struct FieldRule {
    pub name: &'static str,
    pub validator: Validator,
}

/// A repeatable sub-form such as employment history.
pub struct GroupRule {
    pub group: &'static str,
    pub min_entries: usize,
    pub empty_message: &'static str,
    pub fields: &'static [FieldRule],
}

pub struct AttachmentRule {
    pub slot: &'static str,
    pub kind: UploadKind,
    pub min_files: usize,
    pub message: &'static str,
}

/// Validation that spans several fields. Returns the field to blame and the message.
pub type CrossCheck = fn(&dyn FormValues) -> Option<(&'static str, String)>;

/// One page of a wizard. Fields not listed here (pets, notes) are carried but
/// never validated.
pub struct StepDefinition {
    pub key: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldRule],
    pub groups: &'static [GroupRule],
    pub attachments: &'static [AttachmentRule],
    pub checks: &'static [CrossCheck],
}

impl StepDefinition {
    pub fn validate(&self, values: &dyn FormValues) -> FormErrors {
        let mut errors = FormErrors::default();

        for rule in self.fields {
            if let Some(message) = (rule.validator)(values.value(rule.name)) {
                errors.insert_field(rule.name, message);
            }
        }

        for rule in self.groups {
            let entries = values.entries(rule.group);
            if entries.len() < rule.min_entries {
                errors.insert_field(rule.group, rule.empty_message);
            }
            for (index, entry) in entries.iter().enumerate() {
                for field in rule.fields {
                    let value = entry.get(field.name).map(String::as_str).unwrap_or("");
                    if let Some(message) = (field.validator)(value) {
                        errors.insert_entry(rule.group, index, field.name, message);
                    }
                }
            }
        }

        for rule in self.attachments {
            if values.attachment_count(rule.slot) < rule.min_files {
                errors.insert_attachment(rule.slot, rule.message);
            }
            for file in values.local_files(rule.slot) {
                if let Err(err) = rule.kind.preflight(file) {
                    errors.insert_attachment(rule.slot, err.to_string());
                }
            }
        }

        for check in self.checks {
            if let Some((field, message)) = check(values) {
                errors.insert_field(field, message);
            }
        }

        errors
    }

    pub fn attachment_rule(&self, slot: &str) -> Option<&AttachmentRule> {
        self.attachments.iter().find(|rule| rule.slot == slot)
    }
}
