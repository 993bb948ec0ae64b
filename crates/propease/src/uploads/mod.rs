//! Direct-to-storage uploads.
//!
//! Every file in the system (profile photos, receipts, application documents,
//! insurance documents, signed leases) travels the same way: the client asks
//! for a write URL keyed by file name and MIME type, PUTs the bytes straight to
//! that URL, then keeps the returned stable reference in its next payload.
//! [`UploadAdapter`] is the client half, [`UploadService`] the server half.

pub mod adapter;
pub mod http;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use adapter::{UploadAdapter, UploadError, UploadTransport};
pub use http::HttpUploadTransport;
pub use store::{
    key_has_kind, Grant, GrantAccess, ObjectStore, StorageError, StoredObject, UploadService,
};

const MB: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadKind {
    ProfilePhoto,
    ListingImage,
    MaintenancePhoto,
    PaymentReceipt,
    ApplicationDocument,
    InsuranceDocument,
    CustomLease,
    SignedLease,
}

impl UploadKind {
    pub const fn all() -> [UploadKind; 8] {
        [
            UploadKind::ProfilePhoto,
            UploadKind::ListingImage,
            UploadKind::MaintenancePhoto,
            UploadKind::PaymentReceipt,
            UploadKind::ApplicationDocument,
            UploadKind::InsuranceDocument,
            UploadKind::CustomLease,
            UploadKind::SignedLease,
        ]
    }

    /// Path segment used by the `/upload/{slug}-upload-url` endpoints and as
    /// the object key prefix.
    pub const fn slug(self) -> &'static str {
        match self {
            UploadKind::ProfilePhoto => "profile-photo",
            UploadKind::ListingImage => "listing-image",
            UploadKind::MaintenancePhoto => "maintenance-photo",
            UploadKind::PaymentReceipt => "receipt",
            UploadKind::ApplicationDocument => "application-document",
            UploadKind::InsuranceDocument => "insurance-document",
            UploadKind::CustomLease => "custom-lease",
            UploadKind::SignedLease => "signed-lease",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.slug() == slug)
    }

    pub const fn images_only(self) -> bool {
        matches!(
            self,
            UploadKind::ProfilePhoto | UploadKind::ListingImage | UploadKind::MaintenancePhoto
        )
    }

    pub const fn max_bytes(self) -> usize {
        if self.images_only() {
            5 * MB
        } else {
            10 * MB
        }
    }

    pub const fn too_large_message(self) -> &'static str {
        if self.images_only() {
            "Image size should be less than 5MB"
        } else {
            "File size should be less than 10MB"
        }
    }

    pub const fn unsupported_type_message(self) -> &'static str {
        if self.images_only() {
            "Please select an image file"
        } else {
            "Only PDF, Word, and image files are supported"
        }
    }

    /// Whether a declared MIME type may be stored under this kind.
    pub fn accepts(self, content_type: &str) -> bool {
        let Ok(parsed) = content_type.parse::<mime::Mime>() else {
            return false;
        };
        if parsed.type_() == mime::IMAGE {
            return true;
        }
        if self.images_only() {
            return false;
        }

        parsed.essence_str() == mime::APPLICATION_PDF.essence_str()
            || parsed.essence_str() == "application/msword"
            || parsed.essence_str()
                == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    }

    /// Checks that run on the client before any network call is made.
    pub fn preflight(self, file: &LocalFile) -> Result<(), UploadError> {
        if !self.accepts(&file.content_type) {
            return Err(UploadError::UnsupportedType(self.unsupported_type_message()));
        }
        if file.size() > self.max_bytes() {
            return Err(UploadError::TooLarge(self.too_large_message()));
        }
        Ok(())
    }
}

/// A file picked on the client, not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Stable, server-addressable reference to a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReference {
    pub kind: UploadKind,
    pub key: String,
    pub url: String,
    pub file_name: String,
    pub content_type: String,
}

/// Write capability returned by `/upload/{kind}-upload-url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub file_url: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

/// Read capability returned by `/upload/{kind}-download-url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedDownload {
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}
