//! Persistence records for the rental workflows and the status transition
//! tables that guard them.

pub mod application;
pub mod insurance;
pub mod lease;
pub mod listing;
pub mod maintenance;
pub mod notification;
pub mod payment;
pub mod user;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use application::{ApplicationForm, ApplicationStatus, EmploymentEntry, RequestApplication};
pub use insurance::{Insurance, InsuranceStatus, NewInsurance};
pub use lease::{Lease, LeaseDraft, LeaseInvite, LeaseKind, LeaseStatus};
pub use listing::{Listing, ListingImage, ListingStatus, NewListing, PropertyType};
pub use maintenance::{
    MaintenanceCategory, MaintenancePriority, MaintenanceRequest, MaintenanceStatus,
    NewMaintenanceRequest,
};
pub use notification::{Notification, NotificationKind};
pub use payment::{NewPayment, Payment, PaymentStatus, PaymentType, Receipt, ReceiptReview};
pub use user::{ProfileUpdate, Role, User};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(UserId);
entity_id!(ListingId);
entity_id!(
    /// Internal key of an application; tenants only ever see the public link id.
    ApplicationId
);
entity_id!(LeaseId);
entity_id!(PaymentId);
entity_id!(MaintenanceId);
entity_id!(InsuranceId);
entity_id!(NotificationId);

/// Records that can live behind a [`crate::services::Repository`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + std::hash::Hash + fmt::Debug + Send + Sync + 'static;

    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
}

/// Status enums expose their legal moves so services can reject the rest.
pub trait StatusFlow: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn can_transition_to(self, next: Self) -> bool;

    fn label(self) -> &'static str;
}

/// Records whose lifecycle is driven by a [`StatusFlow`].
pub trait StatusTracked: Entity {
    type Status: StatusFlow;

    fn status(&self) -> Self::Status;

    fn set_status(&mut self, status: Self::Status);
}

macro_rules! status_tracked {
    ($($entity:ty => $status:ty),* $(,)?) => {
        $(
            impl StatusTracked for $entity {
                type Status = $status;

                fn status(&self) -> $status {
                    self.status
                }

                fn set_status(&mut self, status: $status) {
                    self.status = status;
                }
            }
        )*
    };
}

status_tracked! {
    Listing => ListingStatus,
    RequestApplication => ApplicationStatus,
    Lease => LeaseStatus,
    Payment => PaymentStatus,
    MaintenanceRequest => MaintenanceStatus,
    Insurance => InsuranceStatus,
}

/// Random URL-safe token used for application links and lease invites.
pub(crate) fn random_token() -> String {
    Uuid::new_v4().simple().to_string()
}
