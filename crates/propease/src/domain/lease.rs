use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, LeaseId, ListingId, StatusFlow, UserId};
use crate::money::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseStatus {
    Draft,
    Active,
    Terminated,
    Expired,
}

impl StatusFlow for LeaseStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use LeaseStatus::*;
        matches!(
            (self, next),
            (Draft, Active) | (Draft, Terminated) | (Active, Terminated) | (Active, Expired)
        )
    }

    fn label(self) -> &'static str {
        match self {
            LeaseStatus::Draft => "DRAFT",
            LeaseStatus::Active => "ACTIVE",
            LeaseStatus::Terminated => "TERMINATED",
            LeaseStatus::Expired => "EXPIRED",
        }
    }
}

/// A standard lease is generated from the lease wizard; a custom lease carries
/// the landlord's own uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseKind {
    Standard,
    Custom { document_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    pub landlord_id: UserId,
    pub listing_id: ListingId,
    pub tenant_id: Option<UserId>,
    pub tenant_name: String,
    pub tenant_email: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rent: Cents,
    pub security_deposit: Cents,
    pub payment_due_day: u8,
    pub late_fee: Option<Cents>,
    pub kind: LeaseKind,
    pub status: LeaseStatus,
    pub signed_document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Lease {
    /// An active lease whose end date has passed should be moved to `Expired`.
    pub fn has_lapsed(&self, today: NaiveDate) -> bool {
        self.status == LeaseStatus::Active && today > self.end_date
    }
}

impl Entity for Lease {
    type Id = LeaseId;

    const KIND: &'static str = "lease";

    fn id(&self) -> &LeaseId {
        &self.id
    }
}

/// Landlord input for a lease, produced by the standard lease wizard or the
/// custom lease upload form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseDraft {
    pub listing_id: ListingId,
    pub tenant_name: String,
    pub tenant_email: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rent: Cents,
    pub security_deposit: Cents,
    pub payment_due_day: u8,
    pub late_fee: Option<Cents>,
}

/// One-time signing link for a lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseInvite {
    pub token: String,
    pub lease_id: LeaseId,
    pub tenant_email: String,
    pub signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub signer_name: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Entity for LeaseInvite {
    type Id = String;

    const KIND: &'static str = "lease invite";

    fn id(&self) -> &String {
        &self.token
    }
}
