use async_trait::async_trait;
use tracing::{debug, info};

use super::{LocalFile, PresignedUpload, UploadKind, UploadReference};

/// Errors surfaced to the user as a toast. None of them are retried; the
/// caller starts the whole sequence again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    TooLarge(&'static str),
    #[error("{0}")]
    UnsupportedType(&'static str),
    #[error("Failed to get upload URL: {0}")]
    UrlRequest(String),
    #[error("Failed to upload file: {0}")]
    Transfer(String),
}

/// The two network legs of an upload.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn request_upload_url(
        &self,
        kind: UploadKind,
        file_name: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, UploadError>;

    async fn put_object(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), UploadError>;
}

/// Turns a local file into a durable [`UploadReference`].
#[derive(Debug, Clone)]
pub struct UploadAdapter<T> {
    transport: T,
}

impl<T> UploadAdapter<T>
where
    T: UploadTransport,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn upload(
        &self,
        kind: UploadKind,
        file: &LocalFile,
    ) -> Result<UploadReference, UploadError> {
        kind.preflight(file)?;

        let grant = self
            .transport
            .request_upload_url(kind, &file.name, &file.content_type)
            .await?;
        debug!(kind = kind.slug(), key = %grant.key, "upload url issued");

        self.transport
            .put_object(&grant.upload_url, &file.content_type, file.bytes.clone())
            .await?;
        info!(kind = kind.slug(), key = %grant.key, bytes = file.size(), "file uploaded");

        Ok(UploadReference {
            kind,
            key: grant.key,
            url: grant.file_url,
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<String>>,
        fail_put: bool,
    }

    impl RecordingTransport {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl UploadTransport for RecordingTransport {
        async fn request_upload_url(
            &self,
            kind: UploadKind,
            file_name: &str,
            content_type: &str,
        ) -> Result<PresignedUpload, UploadError> {
            self.calls
                .lock()
                .expect("calls mutex poisoned")
                .push(format!("url:{}:{file_name}:{content_type}", kind.slug()));
            Ok(PresignedUpload {
                upload_url: "https://storage.test/upload/tok".to_string(),
                file_url: format!("https://storage.test/files/{}/{file_name}", kind.slug()),
                key: format!("{}/{file_name}", kind.slug()),
                expires_at: Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap(),
            })
        }

        async fn put_object(
            &self,
            upload_url: &str,
            content_type: &str,
            bytes: Vec<u8>,
        ) -> Result<(), UploadError> {
            self.calls
                .lock()
                .expect("calls mutex poisoned")
                .push(format!("put:{upload_url}:{content_type}:{}", bytes.len()));
            if self.fail_put {
                Err(UploadError::Transfer("503 Service Unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn upload_requests_url_then_puts_bytes() {
        let adapter = UploadAdapter::new(RecordingTransport::default());
        let file = LocalFile::new("receipt.pdf", "application/pdf", vec![7; 64]);

        let reference = adapter
            .upload(UploadKind::PaymentReceipt, &file)
            .await
            .expect("upload succeeds");

        assert_eq!(reference.key, "receipt/receipt.pdf");
        assert_eq!(reference.url, "https://storage.test/files/receipt/receipt.pdf");
        assert_eq!(
            adapter.transport().calls(),
            vec![
                "url:receipt:receipt.pdf:application/pdf".to_string(),
                "put:https://storage.test/upload/tok:application/pdf:64".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn oversized_photo_never_reaches_the_network() {
        let adapter = UploadAdapter::new(RecordingTransport::default());
        let photo = LocalFile::new("me.jpg", "image/jpeg", vec![0; 6 * 1024 * 1024]);

        let err = adapter
            .upload(UploadKind::ProfilePhoto, &photo)
            .await
            .expect_err("oversized photo rejected");

        assert_eq!(err.to_string(), "Image size should be less than 5MB");
        assert!(adapter.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn transfer_failures_surface_without_retry() {
        let adapter = UploadAdapter::new(RecordingTransport {
            fail_put: true,
            ..RecordingTransport::default()
        });
        let file = LocalFile::new("policy.pdf", "application/pdf", vec![1; 10]);

        let err = adapter
            .upload(UploadKind::InsuranceDocument, &file)
            .await
            .expect_err("put fails");

        assert!(matches!(err, UploadError::Transfer(_)));
        assert_eq!(adapter.transport().calls().len(), 2);
    }
}
