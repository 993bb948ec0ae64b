use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, NotificationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationSubmitted,
    ApplicationReviewed,
    LeaseSigned,
    ReceiptSubmitted,
    ReceiptReviewed,
    PaymentDue,
    MaintenanceUpdated,
    InsuranceReviewed,
}

/// In-app message for a landlord or tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            message: message.into(),
            read: false,
            created_at,
        }
    }
}

impl Entity for Notification {
    type Id = NotificationId;

    const KIND: &'static str = "notification";

    fn id(&self) -> &NotificationId {
        &self.id
    }
}
