use super::common::*;
use crate::domain::{
    MaintenanceCategory, MaintenancePriority, MaintenanceStatus, NewMaintenanceRequest,
    NotificationKind,
};
use crate::services::ServiceError;

fn leak(listing: &crate::domain::Listing) -> NewMaintenanceRequest {
    NewMaintenanceRequest {
        listing_id: listing.id,
        title: "Kitchen sink leak".to_string(),
        description: "Water pooling under the sink since Monday".to_string(),
        priority: MaintenancePriority::High,
        category: MaintenanceCategory::Plumbing,
        photos: Vec::new(),
    }
}

#[test]
fn tenants_need_an_active_lease_to_raise_requests() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);

    assert!(matches!(
        harness.services.maintenance.create(&tenant, leak(&listing), now()),
        Err(ServiceError::Forbidden)
    ));

    harness.active_lease(&landlord, &tenant, &listing);
    let ticket = harness
        .services
        .maintenance
        .create(&tenant, leak(&listing), now())
        .expect("request raised");
    assert_eq!(ticket.status, MaintenanceStatus::Open);
    assert_eq!(ticket.landlord_id, landlord.user_id);

    let landlord_view = harness
        .services
        .maintenance
        .list(&landlord)
        .expect("landlord list");
    assert_eq!(landlord_view.len(), 1);
}

#[test]
fn landlord_progresses_and_tenant_may_only_cancel() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);
    harness.active_lease(&landlord, &tenant, &listing);
    let ticket = harness
        .services
        .maintenance
        .create(&tenant, leak(&listing), now())
        .expect("request raised");

    assert!(matches!(
        harness
            .services
            .maintenance
            .update_status(&tenant, &ticket.id, MaintenanceStatus::InProgress, now()),
        Err(ServiceError::Forbidden)
    ));

    let started = harness
        .services
        .maintenance
        .update_status(&landlord, &ticket.id, MaintenanceStatus::InProgress, now())
        .expect("work started");
    assert_eq!(started.status, MaintenanceStatus::InProgress);
    let updates = harness
        .notifications
        .for_user(tenant.user_id)
        .into_iter()
        .filter(|note| note.kind == NotificationKind::MaintenanceUpdated)
        .count();
    assert_eq!(updates, 1);

    assert!(matches!(
        harness
            .services
            .maintenance
            .update_status(&landlord, &ticket.id, MaintenanceStatus::Open, now()),
        Err(ServiceError::InvalidTransition { .. })
    ));

    let cancelled = harness
        .services
        .maintenance
        .update_status(&tenant, &ticket.id, MaintenanceStatus::Cancelled, now())
        .expect("tenant cancelled");
    assert_eq!(cancelled.status, MaintenanceStatus::Cancelled);
}

#[test]
fn notifications_can_be_marked_read() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);
    harness.active_lease(&landlord, &tenant, &listing);
    harness
        .services
        .maintenance
        .create(&tenant, leak(&listing), now())
        .expect("request raised");

    let inbox = harness
        .services
        .notifications
        .inbox(&landlord)
        .expect("inbox");
    assert!(!inbox.is_empty());
    harness
        .services
        .notifications
        .mark_read(&landlord, &inbox[0].id)
        .expect("marked read");

    assert!(matches!(
        harness.services.notifications.mark_read(&tenant, &inbox[0].id),
        Err(ServiceError::NotFound { .. })
    ));
}
