use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Errors for a repeatable group, keyed by entry index then field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryErrors(BTreeMap<usize, BTreeMap<String, String>>);

impl EntryErrors {
    pub fn insert(&mut self, index: usize, field: &str, message: impl Into<String>) {
        self.0
            .entry(index)
            .or_default()
            .insert(field.to_string(), message.into());
    }

    /// Like [`EntryErrors::insert`], but an existing message wins.
    fn insert_first(&mut self, index: usize, field: &str, message: String) {
        self.0
            .entry(index)
            .or_default()
            .entry(field.to_string())
            .or_insert(message);
    }

    pub fn get(&self, index: usize, field: &str) -> Option<&str> {
        self.0
            .get(&index)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    pub fn for_entry(&self, index: usize) -> Option<&BTreeMap<String, String>> {
        self.0.get(&index)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.keys().copied()
    }

    pub fn clear_field(&mut self, index: usize, field: &str) {
        if let Some(fields) = self.0.get_mut(&index) {
            fields.remove(field);
            if fields.is_empty() {
                self.0.remove(&index);
            }
        }
    }

    /// Drop the errors of entry `removed` and shift every later entry down by
    /// one so indices keep matching the entries that remain.
    pub fn remove_entry(&mut self, removed: usize) {
        self.0 = std::mem::take(&mut self.0)
            .into_iter()
            .filter_map(|(index, fields)| match index.cmp(&removed) {
                Ordering::Less => Some((index, fields)),
                Ordering::Equal => None,
                Ordering::Greater => Some((index - 1, fields)),
            })
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Inline errors for a form: plain fields, repeatable groups, attachment slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    groups: BTreeMap<String, EntryErrors>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attachments: BTreeMap<String, String>,
}

impl FormErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.insert_field(field, message);
        errors
    }

    pub fn insert_field(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn clear_field(&mut self, field: &str) {
        self.fields.remove(field);
    }

    pub fn insert_entry(&mut self, group: &str, index: usize, field: &str, message: impl Into<String>) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(index, field, message);
    }

    pub fn entry(&self, group: &str, index: usize, field: &str) -> Option<&str> {
        self.groups
            .get(group)
            .and_then(|errors| errors.get(index, field))
    }

    pub fn group(&self, group: &str) -> Option<&EntryErrors> {
        self.groups.get(group)
    }

    pub fn clear_entry_field(&mut self, group: &str, index: usize, field: &str) {
        if let Some(errors) = self.groups.get_mut(group) {
            errors.clear_field(index, field);
            if errors.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    pub fn remove_entry(&mut self, group: &str, index: usize) {
        if let Some(errors) = self.groups.get_mut(group) {
            errors.remove_entry(index);
            if errors.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    pub fn insert_attachment(&mut self, slot: &str, message: impl Into<String>) {
        self.attachments
            .entry(slot.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn attachment(&self, slot: &str) -> Option<&str> {
        self.attachments.get(slot).map(String::as_str)
    }

    pub fn clear_attachment(&mut self, slot: &str) {
        self.attachments.remove(slot);
    }

    pub fn merge(&mut self, other: FormErrors) {
        for (field, message) in other.fields {
            self.fields.entry(field).or_insert(message);
        }
        for (group, errors) in other.groups {
            let target = self.groups.entry(group).or_default();
            for index in errors.indices().collect::<Vec<_>>() {
                if let Some(fields) = errors.for_entry(index) {
                    for (field, message) in fields {
                        target.insert_first(index, field, message.clone());
                    }
                }
            }
        }
        for (slot, message) in other.attachments {
            self.attachments.entry(slot).or_insert(message);
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
            + self.attachments.len()
            + self
                .groups
                .values()
                .flat_map(|errors| errors.0.values())
                .map(BTreeMap::len)
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.attachments.is_empty() && self.groups.is_empty()
    }
}
