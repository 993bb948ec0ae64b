use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, LeaseId, ListingId, PaymentId, StatusFlow, UserId};
use crate::money::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Rent,
    Deposit,
    Maintenance,
    LateFee,
    Utility,
    Other,
}

impl PaymentType {
    pub const fn ordered() -> [PaymentType; 6] {
        [
            PaymentType::Rent,
            PaymentType::Deposit,
            PaymentType::Maintenance,
            PaymentType::LateFee,
            PaymentType::Utility,
            PaymentType::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            PaymentType::Rent => "Rent",
            PaymentType::Deposit => "Deposit",
            PaymentType::Maintenance => "Maintenance",
            PaymentType::LateFee => "Late fee",
            PaymentType::Utility => "Utilities",
            PaymentType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl StatusFlow for PaymentStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Failed) | (Pending, Cancelled) | (Failed, Pending)
        )
    }

    fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptReview {
    Submitted,
    Approved,
    Rejected { reason: String },
}

/// Tenant-uploaded proof of payment awaiting landlord review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub url: String,
    pub submitted_at: DateTime<Utc>,
    pub review: ReceiptReview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub landlord_id: UserId,
    pub tenant_id: Option<UserId>,
    pub lease_id: Option<LeaseId>,
    pub listing_id: Option<ListingId>,
    pub amount: Cents,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub receipt: Option<Receipt>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == PaymentStatus::Pending && self.due_date < today
    }

    pub fn has_receipt_awaiting_review(&self) -> bool {
        matches!(
            self.receipt,
            Some(Receipt {
                review: ReceiptReview::Submitted,
                ..
            })
        )
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    const KIND: &'static str = "payment";

    fn id(&self) -> &PaymentId {
        &self.id
    }
}

/// Landlord input for a new payment obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub tenant_id: Option<UserId>,
    pub lease_id: Option<LeaseId>,
    pub listing_id: Option<ListingId>,
    pub amount: Cents,
    pub payment_type: PaymentType,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}
