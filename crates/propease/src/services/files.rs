use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::{load, ServiceError, Stores};
use crate::domain::{
    Insurance, Lease, LeaseKind, Listing, MaintenanceRequest, Payment, RequestApplication, User,
};
use crate::session::Session;
use crate::uploads::{
    key_has_kind, PresignedDownload, StorageError, StoredObject, UploadKind, UploadService,
};

/// Read access to stored files. The uploader can always read a file; anyone
/// else needs a record that references it and that they are a party to.
#[derive(Clone)]
pub struct FileService {
    stores: Stores,
    uploads: Arc<UploadService>,
}

impl FileService {
    pub fn new(stores: Stores, uploads: Arc<UploadService>) -> Self {
        Self { stores, uploads }
    }

    pub fn presign_download(
        &self,
        session: &Session,
        kind: UploadKind,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<PresignedDownload, ServiceError> {
        self.readable(session, kind, key)?;
        Ok(self.uploads.presign_download(key, now)?)
    }

    /// The object behind a stable `/files/{key}` reference.
    pub fn open(&self, session: &Session, key: &str) -> Result<StoredObject, ServiceError> {
        let kind = key
            .split_once('/')
            .and_then(|(slug, _)| UploadKind::from_slug(slug))
            .ok_or(ServiceError::NotFound { entity: "file" })?;
        self.readable(session, kind, key)
    }

    fn readable(&self, session: &Session, kind: UploadKind, key: &str) -> Result<StoredObject, ServiceError> {
        if !key_has_kind(key, kind) {
            return Err(ServiceError::NotFound { entity: "file" });
        }
        let object = self.uploads.object(key).map_err(|err| match err {
            StorageError::NotFound(_) => ServiceError::NotFound { entity: "file" },
            other => other.into(),
        })?;
        if object.owner == Some(session.user_id) {
            return Ok(object);
        }

        let viewer = load(self.stores.users.as_ref(), &session.user_id)?;
        if self.referenced_for(&viewer, kind, &self.uploads.file_url(key))? {
            return Ok(object);
        }
        warn!(user = %viewer.id, kind = kind.slug(), "file read refused");
        Err(ServiceError::Forbidden)
    }

    fn referenced_for(&self, viewer: &User, kind: UploadKind, url: &str) -> Result<bool, ServiceError> {
        let user = viewer.id;
        let referenced = match kind {
            // Shown on profiles and listings, so any signed-in account may read
            // them once they are attached.
            UploadKind::ProfilePhoto => !self
                .stores
                .users
                .find(&|owner: &User| owner.profile_photo_url.as_deref() == Some(url))?
                .is_empty(),
            UploadKind::ListingImage => !self
                .stores
                .listings
                .find(&|listing: &Listing| listing.images.iter().any(|image| image.url == url))?
                .is_empty(),
            UploadKind::MaintenancePhoto => !self
                .stores
                .maintenance
                .find(&|request: &MaintenanceRequest| {
                    (request.landlord_id == user || request.raised_by == user)
                        && request.photos.iter().any(|photo| photo == url)
                })?
                .is_empty(),
            UploadKind::PaymentReceipt => !self
                .stores
                .payments
                .find(&|payment: &Payment| {
                    (payment.landlord_id == user || payment.tenant_id == Some(user))
                        && payment.receipt.as_ref().is_some_and(|receipt| receipt.url == url)
                })?
                .is_empty(),
            UploadKind::ApplicationDocument => !self
                .stores
                .applications
                .find(&|application: &RequestApplication| {
                    application.landlord_id == user
                        && application
                            .form
                            .as_ref()
                            .is_some_and(|form| form.documents.iter().any(|doc| doc.url == url))
                })?
                .is_empty(),
            UploadKind::InsuranceDocument => !self
                .stores
                .insurance
                .find(&|policy: &Insurance| {
                    (policy.landlord_id == user || policy.tenant_id == user) && policy.document_url == url
                })?
                .is_empty(),
            UploadKind::CustomLease | UploadKind::SignedLease => !self
                .stores
                .leases
                .find(&|lease: &Lease| lease_party(lease, viewer) && lease_document(lease, url))?
                .is_empty(),
        };
        Ok(referenced)
    }
}

/// Before signing, the invited tenant is only known by email.
fn lease_party(lease: &Lease, viewer: &User) -> bool {
    lease.landlord_id == viewer.id
        || lease.tenant_id == Some(viewer.id)
        || (lease.tenant_id.is_none() && lease.tenant_email.eq_ignore_ascii_case(&viewer.email))
}

fn lease_document(lease: &Lease, url: &str) -> bool {
    let custom = matches!(&lease.kind, LeaseKind::Custom { document_url } if document_url == url);
    custom || lease.signed_document_url.as_deref() == Some(url)
}
