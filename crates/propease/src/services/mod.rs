//! Services applying the business rules on top of the repository traits.
//!
//! Every status change goes through [`transition`], which checks the
//! transition table and persists with a compare-and-swap on the previous
//! status. Two racing requests on the same record cannot both apply; the
//! loser gets a conflict.

pub mod applications;
pub mod error;
pub mod files;
pub mod insurance;
pub mod leases;
pub mod listings;
pub mod maintenance;
pub mod notifications;
pub mod payments;
pub mod repository;
pub mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::info;

use crate::config::WorkflowConfig;
use crate::domain::{
    Insurance, Lease, LeaseInvite, Listing, MaintenanceRequest, Notification, Payment,
    RequestApplication, StatusFlow, StatusTracked, User, UserId,
};
use crate::forms::FormErrors;
use crate::session::SessionRegistry;
use crate::uploads::{StorageError, UploadKind, UploadService};

pub use applications::ApplicationService;
pub use error::{BusinessRule, ServiceError};
pub use files::FileService;
pub use insurance::InsuranceService;
pub use leases::{CustomLeaseRequest, InviteView, LeaseService, SignLease};
pub use listings::ListingService;
pub use maintenance::MaintenanceService;
pub use notifications::NotificationService;
pub use payments::PaymentService;
pub use repository::{Matcher, NotificationError, NotificationPublisher, Repository, RepositoryError};
pub use users::{NewUser, UserService};

/// One repository per record type plus the notification hook.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn Repository<User>>,
    pub listings: Arc<dyn Repository<Listing>>,
    pub applications: Arc<dyn Repository<RequestApplication>>,
    pub leases: Arc<dyn Repository<Lease>>,
    pub invites: Arc<dyn Repository<LeaseInvite>>,
    pub payments: Arc<dyn Repository<Payment>>,
    pub maintenance: Arc<dyn Repository<MaintenanceRequest>>,
    pub insurance: Arc<dyn Repository<Insurance>>,
    pub notifications: Arc<dyn NotificationPublisher>,
}

impl Stores {
    pub(crate) fn notify(&self, notification: Notification) -> Result<(), ServiceError> {
        self.notifications.publish(notification)?;
        Ok(())
    }
}

/// Facade handed to the HTTP layer.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub listings: ListingService,
    pub applications: ApplicationService,
    pub leases: LeaseService,
    pub payments: PaymentService,
    pub maintenance: MaintenanceService,
    pub insurance: InsuranceService,
    pub notifications: NotificationService,
    pub files: FileService,
    pub uploads: Arc<UploadService>,
}

impl Services {
    pub fn new(
        stores: Stores,
        sessions: Arc<SessionRegistry>,
        uploads: UploadService,
        workflow: WorkflowConfig,
    ) -> Self {
        let uploads = Arc::new(uploads);
        Self {
            users: UserService::new(stores.clone(), sessions),
            listings: ListingService::new(stores.clone()),
            applications: ApplicationService::new(stores.clone(), workflow.application_link_ttl),
            leases: LeaseService::new(stores.clone(), uploads.clone(), workflow.lease_invite_ttl),
            payments: PaymentService::new(stores.clone(), uploads.clone()),
            maintenance: MaintenanceService::new(stores.clone()),
            insurance: InsuranceService::new(stores.clone(), uploads.clone()),
            notifications: NotificationService::new(stores.notifications.clone()),
            files: FileService::new(stores, uploads.clone()),
            uploads,
        }
    }
}

/// Fetch a record or report it missing.
pub(crate) fn load<T: crate::domain::Entity>(
    repository: &dyn Repository<T>,
    id: &T::Id,
) -> Result<T, ServiceError> {
    repository
        .fetch(id)?
        .ok_or(ServiceError::NotFound { entity: T::KIND })
}

/// Move `record` to `next`, applying `edit` first. The write only lands if the
/// stored record still has the status `record` was read with.
pub(crate) fn transition<T, F>(
    repository: &dyn Repository<T>,
    mut record: T,
    next: T::Status,
    edit: F,
) -> Result<T, ServiceError>
where
    T: StatusTracked,
    F: FnOnce(&mut T),
{
    let current = record.status();
    if !current.can_transition_to(next) {
        return Err(ServiceError::InvalidTransition {
            entity: T::KIND,
            from: current.label(),
            to: next.label(),
        });
    }

    edit(&mut record);
    record.set_status(next);
    repository
        .update_if(record.clone(), &|stored: &T| stored.status() == current)
        .map_err(|err| match err {
            RepositoryError::Stale => {
                ServiceError::Conflict(format!("{} was changed by another request", T::KIND))
            }
            other => other.into(),
        })?;

    info!(entity = T::KIND, from = current.label(), to = next.label(), "status changed");
    Ok(record)
}

pub(crate) fn require_text(field: &str, label: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(FormErrors::single(
            field,
            format!("{label} is required"),
        )));
    }
    Ok(trimmed.to_string())
}

/// A submitted file reference must name a `kind` upload that `uploader` put
/// into storage.
pub(crate) fn require_upload(
    uploads: &UploadService,
    kind: UploadKind,
    uploader: Option<UserId>,
    field: &str,
    label: &str,
    url: &str,
) -> Result<String, ServiceError> {
    let url = require_text(field, label, url)?;
    match uploads.resolve(kind, &url) {
        Ok(object) if uploader.is_some() && object.owner == uploader => Ok(url),
        Ok(_) | Err(StorageError::NotStored(_)) => Err(ServiceError::Validation(FormErrors::single(
            field,
            format!("{label} must be a file you uploaded"),
        ))),
        Err(err) => Err(err.into()),
    }
}
