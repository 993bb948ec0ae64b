//! Final step of a wizard: upload every attached file, merge the references
//! with the field values, and issue exactly one write.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::forms::{Entry, FormErrors, FormState, FormValues, Wizard, WizardDefinition};
use crate::uploads::{UploadAdapter, UploadError, UploadReference, UploadTransport};

/// The single request body sent when a wizard is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledSubmission {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<Entry>>,
    #[serde(default)]
    pub uploads: BTreeMap<String, Vec<UploadReference>>,
}

impl AssembledSubmission {
    pub fn from_state(state: &FormState, uploads: BTreeMap<String, Vec<UploadReference>>) -> Self {
        Self {
            fields: state.fields().clone(),
            groups: state.groups().clone(),
            uploads,
        }
    }

    pub fn uploads_for(&self, slot: &str) -> &[UploadReference] {
        self.uploads.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl FormValues for AssembledSubmission {
    fn value(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    fn entries(&self, group: &str) -> &[Entry] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    fn attachment_count(&self, slot: &str) -> usize {
        self.uploads_for(slot).len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("{} field(s) need attention", .0.len())]
    Incomplete(FormErrors),
    #[error("submission already in progress")]
    InFlight,
    #[error("form already submitted")]
    AlreadySubmitted,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Submission failed: {0}")]
    Transport(String),
    /// The server refused the submission. Terminal rejections (expired link,
    /// already submitted) cannot be fixed by editing the form.
    #[error("{message}")]
    Rejected { message: String, terminal: bool },
}

impl SubmissionError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionError::AlreadySubmitted)
            || matches!(self, SubmissionError::Rejected { terminal: true, .. })
    }
}

/// Where an assembled submission is written.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    type Receipt: Send;

    async fn submit(&self, submission: AssembledSubmission) -> Result<Self::Receipt, SubmissionError>;
}

pub struct SubmissionAssembler<T, S> {
    uploads: UploadAdapter<T>,
    sink: S,
}

impl<T, S> SubmissionAssembler<T, S>
where
    T: UploadTransport,
    S: SubmissionSink,
{
    pub fn new(uploads: UploadAdapter<T>, sink: S) -> Self {
        Self { uploads, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Uploads every attached file concurrently and waits for all of them
    /// before building the body. Any failed upload fails the assembly.
    pub async fn assemble(
        &self,
        definition: &WizardDefinition,
        state: &FormState,
    ) -> Result<AssembledSubmission, SubmissionError> {
        let pending = definition
            .steps
            .iter()
            .flat_map(|step| step.attachments)
            .flat_map(|rule| {
                state
                    .attachments(rule.slot)
                    .iter()
                    .map(move |file| (rule.slot, rule.kind, file))
            })
            .map(|(slot, kind, file)| async move {
                self.uploads
                    .upload(kind, file)
                    .await
                    .map(|reference| (slot, reference))
            });

        let mut uploads: BTreeMap<String, Vec<UploadReference>> = BTreeMap::new();
        for result in join_all(pending).await {
            let (slot, reference) = result?;
            uploads.entry(slot.to_string()).or_default().push(reference);
        }

        Ok(AssembledSubmission::from_state(state, uploads))
    }

    /// Runs the whole submit for a wizard sitting on its last step. The wizard
    /// refuses a second call while this one is in flight.
    pub async fn submit(&self, wizard: &mut Wizard) -> Result<S::Receipt, SubmissionError> {
        let state = wizard.begin_submit()?.clone();
        let definition = wizard.definition();

        let result = match self.assemble(definition, &state).await {
            Ok(submission) => self.sink.submit(submission).await,
            Err(err) => Err(err),
        };

        match &result {
            Ok(_) => info!(wizard = definition.name, "form submitted"),
            Err(err) => warn!(wizard = definition.name, error = %err, "form submission failed"),
        }
        wizard.finish_submit(result.is_ok());
        result
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    terminal: bool,
}

/// Posts the assembled body as JSON to one endpoint of the API.
#[derive(Debug, Clone)]
pub struct HttpSubmissionSink {
    client: Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl HttpSubmissionSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }
}

#[async_trait]
impl SubmissionSink for HttpSubmissionSink {
    type Receipt = serde_json::Value;

    async fn submit(&self, submission: AssembledSubmission) -> Result<Self::Receipt, SubmissionError> {
        let mut request = self.client.post(&self.endpoint).json(&submission);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<ErrorBody>().await {
                Ok(body) => SubmissionError::Rejected {
                    message: body.error,
                    terminal: body.terminal,
                },
                Err(_) => SubmissionError::Transport(format!("server responded {status}")),
            });
        }

        response
            .json()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))
    }
}
