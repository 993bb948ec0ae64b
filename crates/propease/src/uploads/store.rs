use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::{PresignedDownload, PresignedUpload, UploadKind, UploadReference};
use crate::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("upload link is invalid or has already been used")]
    UnknownGrant,
    #[error("upload link has expired")]
    Expired,
    #[error("content type '{found}' does not match the '{expected}' this link was issued for")]
    ContentTypeMismatch { expected: String, found: String },
    #[error("{0}")]
    TooLarge(&'static str),
    #[error("{0}")]
    UnsupportedType(&'static str),
    #[error("file name is required")]
    MissingFileName,
    #[error("object '{0}' not found")]
    NotFound(String),
    #[error("'{0}' is not a file uploaded to this service")]
    NotStored(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantAccess {
    Write {
        kind: UploadKind,
        content_type: String,
        file_name: String,
        /// Signed-in uploader; `None` for the public application link.
        owner: Option<UserId>,
    },
    Read,
}

/// Capability token bound to a single object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub token: String,
    pub key: String,
    pub access: GrantAccess,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub owner: Option<UserId>,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

/// Backing store for objects and the grants that address them. Policy lives
/// in [`UploadService`]; implementations only persist.
pub trait ObjectStore: Send + Sync {
    fn save_grant(&self, grant: Grant) -> Result<(), StorageError>;
    /// Remove and return a grant. Write grants are single use.
    fn take_grant(&self, token: &str) -> Result<Option<Grant>, StorageError>;
    fn grant(&self, token: &str) -> Result<Option<Grant>, StorageError>;
    fn put(&self, object: StoredObject) -> Result<(), StorageError>;
    fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError>;
    /// Drop every grant that expired at or before `now`; returns how many.
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError>;
}

/// Issues presigned URLs and accepts the transfers made against them.
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
    ttl: Duration,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, public_base_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            ttl,
        }
    }

    pub fn file_url(&self, key: &str) -> String {
        format!("{}/files/{}", self.public_base_url, key)
    }

    /// Inverse of [`UploadService::file_url`].
    pub fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix("/files/"))
            .filter(|key| !key.is_empty())
    }

    pub fn presign_upload(
        &self,
        kind: UploadKind,
        owner: Option<UserId>,
        file_name: &str,
        content_type: &str,
        now: DateTime<Utc>,
    ) -> Result<PresignedUpload, StorageError> {
        let file_name = sanitize_file_name(file_name);
        if file_name.is_empty() {
            return Err(StorageError::MissingFileName);
        }
        if !kind.accepts(content_type) {
            return Err(StorageError::UnsupportedType(kind.unsupported_type_message()));
        }

        let key = format!("{}/{}-{}", kind.slug(), Uuid::new_v4().simple(), file_name);
        let grant = Grant {
            token: Uuid::new_v4().simple().to_string(),
            key: key.clone(),
            access: GrantAccess::Write {
                kind,
                content_type: content_type.to_string(),
                file_name,
                owner,
            },
            expires_at: now + self.ttl,
        };
        let upload_url = format!("{}/storage/upload/{}", self.public_base_url, grant.token);
        let expires_at = grant.expires_at;
        self.store.save_grant(grant)?;

        info!(kind = kind.slug(), %key, "issued upload url");
        Ok(PresignedUpload {
            upload_url,
            file_url: self.file_url(&key),
            key,
            expires_at,
        })
    }

    /// Accept the bytes PUT against an upload URL.
    pub fn complete_upload(
        &self,
        token: &str,
        content_type: &str,
        bytes: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<UploadReference, StorageError> {
        let grant = self
            .store
            .take_grant(token)?
            .ok_or(StorageError::UnknownGrant)?;

        let GrantAccess::Write {
            kind,
            content_type: expected,
            file_name,
            owner,
        } = grant.access
        else {
            return Err(StorageError::UnknownGrant);
        };

        if now >= grant.expires_at {
            warn!(key = %grant.key, "upload attempted with expired url");
            return Err(StorageError::Expired);
        }
        if !same_essence(&expected, content_type) {
            return Err(StorageError::ContentTypeMismatch {
                expected,
                found: content_type.to_string(),
            });
        }
        if bytes.len() > kind.max_bytes() {
            return Err(StorageError::TooLarge(kind.too_large_message()));
        }

        let size = bytes.len();
        self.store.put(StoredObject {
            key: grant.key.clone(),
            owner,
            content_type: expected.clone(),
            bytes,
            stored_at: now,
        })?;
        info!(kind = kind.slug(), key = %grant.key, bytes = size, "upload stored");

        Ok(UploadReference {
            kind,
            url: self.file_url(&grant.key),
            key: grant.key,
            file_name,
            content_type: expected,
        })
    }

    pub fn object(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.store
            .get(key)?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    /// Map a submitted file URL back to the stored upload of `kind` it names.
    pub fn resolve(&self, kind: UploadKind, url: &str) -> Result<StoredObject, StorageError> {
        let not_stored = || StorageError::NotStored(url.to_string());
        let key = self
            .key_from_url(url)
            .filter(|key| key_has_kind(key, kind))
            .ok_or_else(not_stored)?;
        self.store.get(key)?.ok_or_else(not_stored)
    }

    /// Read access is granted by the caller's service layer; this only checks
    /// the object exists.
    pub fn presign_download(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<PresignedDownload, StorageError> {
        if self.store.get(key)?.is_none() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let grant = Grant {
            token: Uuid::new_v4().simple().to_string(),
            key: key.to_string(),
            access: GrantAccess::Read,
            expires_at: now + self.ttl,
        };
        let download_url = format!("{}/storage/download/{}", self.public_base_url, grant.token);
        let expires_at = grant.expires_at;
        self.store.save_grant(grant)?;

        Ok(PresignedDownload {
            download_url,
            expires_at,
        })
    }

    pub fn download(&self, token: &str, now: DateTime<Utc>) -> Result<StoredObject, StorageError> {
        let grant = self.store.grant(token)?.ok_or(StorageError::UnknownGrant)?;
        if grant.access != GrantAccess::Read {
            return Err(StorageError::UnknownGrant);
        }
        if now >= grant.expires_at {
            self.store.take_grant(token)?;
            return Err(StorageError::Expired);
        }

        self.store
            .get(&grant.key)?
            .ok_or(StorageError::NotFound(grant.key))
    }

    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let purged = self.store.purge_expired(now)?;
        if purged > 0 {
            info!(purged, "expired storage grants removed");
        }
        Ok(purged)
    }
}

/// `key` lives under the `{slug}/` prefix of `kind`.
pub fn key_has_kind(key: &str, kind: UploadKind) -> bool {
    key.strip_prefix(kind.slug())
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'))
}

fn same_essence(expected: &str, found: &str) -> bool {
    match (expected.parse::<mime::Mime>(), found.parse::<mime::Mime>()) {
        (Ok(expected), Ok(found)) => expected.essence_str() == found.essence_str(),
        _ => false,
    }
}

/// Keep object keys URL-safe: letters, digits, dot, dash, underscore.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    base.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
