use chrono::{DateTime, Utc};

use super::{load, require_text, transition, ServiceError, Stores};
use crate::domain::{
    Lease, LeaseStatus, MaintenanceId, MaintenanceRequest, MaintenanceStatus, NewMaintenanceRequest,
    Notification, NotificationKind, StatusFlow,
};
use crate::session::Session;

#[derive(Clone)]
pub struct MaintenanceService {
    stores: Stores,
}

impl MaintenanceService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Landlords raise tickets on their own listings; tenants on a listing they
    /// hold an active lease for.
    pub fn create(
        &self,
        session: &Session,
        request: NewMaintenanceRequest,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceRequest, ServiceError> {
        let title = require_text("title", "Title", &request.title)?;
        let description = require_text("description", "Description", &request.description)?;
        let listing = load(self.stores.listings.as_ref(), &request.listing_id)?;

        if session.is_landlord() {
            if listing.landlord_id != session.user_id {
                return Err(ServiceError::Forbidden);
            }
        } else {
            let tenant = session.user_id;
            let leases = self.stores.leases.find(&|lease: &Lease| {
                lease.listing_id == listing.id
                    && lease.tenant_id == Some(tenant)
                    && lease.status == LeaseStatus::Active
            })?;
            if leases.is_empty() {
                return Err(ServiceError::Forbidden);
            }
        }

        let ticket = self.stores.maintenance.insert(MaintenanceRequest {
            id: MaintenanceId::new(),
            listing_id: listing.id,
            landlord_id: listing.landlord_id,
            raised_by: session.user_id,
            raised_by_role: session.role,
            title,
            description,
            priority: request.priority,
            category: request.category,
            status: MaintenanceStatus::Open,
            photos: request.photos,
            created_at: now,
            updated_at: now,
        })?;

        if !session.is_landlord() {
            self.stores.notify(Notification::new(
                ticket.landlord_id,
                NotificationKind::MaintenanceUpdated,
                format!("New maintenance request: {}", ticket.title),
                now,
            ))?;
        }
        Ok(ticket)
    }

    pub fn list(&self, session: &Session) -> Result<Vec<MaintenanceRequest>, ServiceError> {
        let user = session.user_id;
        let mut tickets = if session.is_landlord() {
            self.stores
                .maintenance
                .find(&|ticket: &MaintenanceRequest| ticket.landlord_id == user)?
        } else {
            self.stores
                .maintenance
                .find(&|ticket: &MaintenanceRequest| ticket.raised_by == user)?
        };
        tickets.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.created_at.cmp(&a.created_at)));
        Ok(tickets)
    }

    /// The landlord drives the ticket through its lifecycle; the tenant who
    /// raised it may only cancel.
    pub fn update_status(
        &self,
        session: &Session,
        id: &MaintenanceId,
        status: MaintenanceStatus,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceRequest, ServiceError> {
        let ticket = load(self.stores.maintenance.as_ref(), id)?;
        let allowed = if session.is_landlord() {
            ticket.landlord_id == session.user_id
        } else {
            ticket.raised_by == session.user_id && status == MaintenanceStatus::Cancelled
        };
        if !allowed {
            return Err(ServiceError::Forbidden);
        }

        let ticket = transition(self.stores.maintenance.as_ref(), ticket, status, |ticket| {
            ticket.updated_at = now;
        })?;

        let recipient = if session.is_landlord() {
            ticket.raised_by
        } else {
            ticket.landlord_id
        };
        if recipient != session.user_id {
            self.stores.notify(Notification::new(
                recipient,
                NotificationKind::MaintenanceUpdated,
                format!("{} is now {}", ticket.title, status.label()),
                now,
            ))?;
        }
        Ok(ticket)
    }
}
