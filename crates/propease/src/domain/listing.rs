use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, ListingId, StatusFlow, UserId};
use crate::money::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Active,
    Rented,
    Draft,
}

impl StatusFlow for ListingStatus {
    fn can_transition_to(self, next: Self) -> bool {
        // Listings move freely between the three states; only no-ops are refused.
        self != next
    }

    fn label(self) -> &'static str {
        match self {
            ListingStatus::Active => "ACTIVE",
            ListingStatus::Rented => "RENTED",
            ListingStatus::Draft => "DRAFT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Apartment,
    House,
    Condo,
    Townhouse,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub landlord_id: UserId,
    pub title: String,
    pub address: String,
    pub rent: Cents,
    pub property_type: PropertyType,
    pub status: ListingStatus,
    pub images: Vec<ListingImage>,
    pub amenities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Listing {
    type Id = ListingId;

    const KIND: &'static str = "listing";

    fn id(&self) -> &ListingId {
        &self.id
    }
}

/// Landlord input for a new listing. Images and amenities are owned by the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub address: String,
    pub rent: Cents,
    pub property_type: PropertyType,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
}
