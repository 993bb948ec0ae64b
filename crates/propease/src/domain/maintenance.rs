use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, ListingId, MaintenanceId, Role, StatusFlow, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceCategory {
    Plumbing,
    Electrical,
    Hvac,
    Appliance,
    Structural,
    Pest,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl StatusFlow for MaintenanceStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use MaintenanceStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (Open, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
        )
    }

    fn label(self) -> &'static str {
        match self {
            MaintenanceStatus::Open => "OPEN",
            MaintenanceStatus::InProgress => "IN_PROGRESS",
            MaintenanceStatus::Completed => "COMPLETED",
            MaintenanceStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: MaintenanceId,
    pub listing_id: ListingId,
    pub landlord_id: UserId,
    pub raised_by: UserId,
    pub raised_by_role: Role,
    pub title: String,
    pub description: String,
    pub priority: MaintenancePriority,
    pub category: MaintenanceCategory,
    pub status: MaintenanceStatus,
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for MaintenanceRequest {
    type Id = MaintenanceId;

    const KIND: &'static str = "maintenance request";

    fn id(&self) -> &MaintenanceId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaintenanceRequest {
    pub listing_id: ListingId,
    pub title: String,
    pub description: String,
    pub priority: MaintenancePriority,
    pub category: MaintenanceCategory,
    #[serde(default)]
    pub photos: Vec<String>,
}
