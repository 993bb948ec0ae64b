use std::collections::BTreeMap;

use crate::uploads::LocalFile;

pub type Entry = BTreeMap<String, String>;

/// Read access shared by the live form state and an assembled submission, so
/// the same step rules validate on both sides of the wire.
pub trait FormValues {
    fn value(&self, field: &str) -> &str;
    fn entries(&self, group: &str) -> &[Entry];
    fn attachment_count(&self, slot: &str) -> usize;
    /// Files still held locally; assembled submissions have none.
    fn local_files(&self, _slot: &str) -> &[LocalFile] {
        &[]
    }
}

/// Flat record of what the user has typed and picked so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    fields: BTreeMap<String, String>,
    groups: BTreeMap<String, Vec<Entry>>,
    attachments: BTreeMap<String, Vec<LocalFile>>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<Entry>> {
        &self.groups
    }

    /// Append an empty entry to a repeatable group and return its index.
    pub fn push_entry(&mut self, group: &str) -> usize {
        let entries = self.groups.entry(group.to_string()).or_default();
        entries.push(Entry::new());
        entries.len() - 1
    }

    /// Returns `false` when `index` does not name an existing entry.
    pub fn set_entry(&mut self, group: &str, index: usize, field: &str, value: impl Into<String>) -> bool {
        match self
            .groups
            .get_mut(group)
            .and_then(|entries| entries.get_mut(index))
        {
            Some(entry) => {
                entry.insert(field.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn entry_value(&self, group: &str, index: usize, field: &str) -> &str {
        self.groups
            .get(group)
            .and_then(|entries| entries.get(index))
            .and_then(|entry| entry.get(field))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn remove_entry(&mut self, group: &str, index: usize) -> Option<Entry> {
        let entries = self.groups.get_mut(group)?;
        (index < entries.len()).then(|| entries.remove(index))
    }

    pub fn attach(&mut self, slot: &str, file: LocalFile) {
        self.attachments.entry(slot.to_string()).or_default().push(file);
    }

    pub fn detach(&mut self, slot: &str, index: usize) -> Option<LocalFile> {
        let files = self.attachments.get_mut(slot)?;
        (index < files.len()).then(|| files.remove(index))
    }

    pub fn attachments(&self, slot: &str) -> &[LocalFile] {
        self.attachments.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl FormValues for FormState {
    fn value(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    fn entries(&self, group: &str) -> &[Entry] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    fn attachment_count(&self, slot: &str) -> usize {
        self.attachments(slot).len()
    }

    fn local_files(&self, slot: &str) -> &[LocalFile] {
        self.attachments(slot)
    }
}
