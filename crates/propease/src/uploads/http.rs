use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use super::{PresignedUpload, UploadError, UploadKind, UploadTransport};

/// Upload transport speaking to a running PropEase API.
#[derive(Debug, Clone)]
pub struct HttpUploadTransport {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpUploadTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    fn upload_url_endpoint(&self, kind: UploadKind) -> String {
        format!("{}/upload/{}-upload-url", self.base_url, kind.slug())
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn request_upload_url(
        &self,
        kind: UploadKind,
        file_name: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, UploadError> {
        let mut request = self
            .client
            .get(self.upload_url_endpoint(kind))
            .query(&[("fileName", file_name), ("fileType", content_type)]);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| UploadError::UrlRequest(err.to_string()))?;

        response
            .json::<PresignedUpload>()
            .await
            .map_err(|err| UploadError::UrlRequest(err.to_string()))
    }

    async fn put_object(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), UploadError> {
        // The presigned URL is the credential; no bearer token on this leg.
        self.client
            .put(upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| UploadError::Transfer(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_kind_specific_endpoints() {
        let transport = HttpUploadTransport::new("https://api.propease.test/");
        assert_eq!(
            transport.upload_url_endpoint(UploadKind::ProfilePhoto),
            "https://api.propease.test/upload/profile-photo-upload-url"
        );
        assert_eq!(
            transport.upload_url_endpoint(UploadKind::PaymentReceipt),
            "https://api.propease.test/upload/receipt-upload-url"
        );
    }
}
