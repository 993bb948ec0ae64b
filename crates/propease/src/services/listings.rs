use chrono::{DateTime, Utc};

use super::{load, require_text, transition, ServiceError, Stores};
use crate::domain::{Listing, ListingId, ListingImage, ListingStatus, NewListing};
use crate::forms::FormErrors;
use crate::session::Session;

#[derive(Clone)]
pub struct ListingService {
    stores: Stores,
}

impl ListingService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub fn create(&self, session: &Session, listing: NewListing, now: DateTime<Utc>) -> Result<Listing, ServiceError> {
        let landlord = session.require_landlord()?;
        let title = require_text("title", "Title", &listing.title)?;
        let address = require_text("address", "Address", &listing.address)?;
        if !listing.rent.is_positive() {
            return Err(ServiceError::Validation(FormErrors::single(
                "rent",
                "Rent amount must be greater than 0",
            )));
        }

        let record = Listing {
            id: ListingId::new(),
            landlord_id: landlord,
            title,
            address,
            rent: listing.rent,
            property_type: listing.property_type,
            status: ListingStatus::Active,
            images: listing
                .image_urls
                .into_iter()
                .map(|url| ListingImage { url })
                .collect(),
            amenities: listing
                .amenities
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            created_at: now,
        };
        Ok(self.stores.listings.insert(record)?)
    }

    /// Landlords see their own listings; tenants see what is on the market.
    pub fn list(&self, session: &Session) -> Result<Vec<Listing>, ServiceError> {
        let landlord = session.user_id;
        let mut listings = if session.is_landlord() {
            self.stores
                .listings
                .find(&|listing: &Listing| listing.landlord_id == landlord)?
        } else {
            self.stores
                .listings
                .find(&|listing: &Listing| listing.status == ListingStatus::Active)?
        };
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    pub fn get(&self, id: &ListingId) -> Result<Listing, ServiceError> {
        load(self.stores.listings.as_ref(), id)
    }

    pub(crate) fn owned(&self, session: &Session, id: &ListingId) -> Result<Listing, ServiceError> {
        let landlord = session.require_landlord()?;
        let listing = self.get(id)?;
        if listing.landlord_id != landlord {
            return Err(ServiceError::Forbidden);
        }
        Ok(listing)
    }

    pub fn set_status(&self, session: &Session, id: &ListingId, status: ListingStatus) -> Result<Listing, ServiceError> {
        let listing = self.owned(session, id)?;
        transition(self.stores.listings.as_ref(), listing, status, |_| {})
    }
}
