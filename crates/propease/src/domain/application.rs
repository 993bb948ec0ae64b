use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ApplicationId, Entity, ListingId, StatusFlow, UserId};
use crate::money::Cents;
use crate::uploads::UploadReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    New,
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected | ApplicationStatus::Cancelled
        )
    }
}

impl StatusFlow for ApplicationStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (New, Pending)
                | (New, Cancelled)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
        )
    }

    fn label(self) -> &'static str {
        match self {
            ApplicationStatus::New => "NEW",
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Application link issued by a landlord, filled in once by the tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestApplication {
    pub id: ApplicationId,
    pub public_id: String,
    pub listing_id: ListingId,
    pub landlord_id: UserId,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub form: Option<ApplicationForm>,
}

impl RequestApplication {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Entity for RequestApplication {
    type Id = ApplicationId;

    const KIND: &'static str = "application";

    fn id(&self) -> &ApplicationId {
        &self.id
    }
}

/// Typed tenant application, produced from the application wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub monthly_income: Cents,
    pub number_of_tenants: u32,
    pub pets: Option<u32>,
    pub move_in_date: NaiveDate,
    pub employment: Vec<EmploymentEntry>,
    pub previous_address: String,
    pub previous_landlord_name: String,
    pub previous_landlord_phone: String,
    pub notes: Option<String>,
    pub documents: Vec<UploadReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentEntry {
    pub employer: String,
    pub position: String,
    pub monthly_income: Cents,
    pub start_date: NaiveDate,
}
