use chrono::Duration;

use super::common::*;
use crate::domain::{Lease, LeaseKind, LeaseStatus, Listing, NotificationKind};
use crate::services::{BusinessRule, CustomLeaseRequest, ServiceError, SignLease};
use crate::session::Session;
use crate::uploads::UploadKind;

fn signature() -> SignLease {
    SignLease {
        signer_name: "Jordan Lee".to_string(),
        signed_document_url: None,
    }
}

fn drafted(harness: &Harness, landlord: &Session, listing: &Listing) -> Lease {
    harness
        .services
        .leases
        .create_custom(
            landlord,
            CustomLeaseRequest {
                draft: harness.draft(listing),
                document_url: harness.upload(landlord, UploadKind::CustomLease, "maple.pdf"),
            },
            now(),
        )
        .expect("lease drafted")
}

#[test]
fn signing_activates_the_lease_and_links_the_tenant() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);

    let lease = harness.active_lease(&landlord, &tenant, &listing);

    assert_eq!(lease.status, LeaseStatus::Active);
    assert_eq!(lease.tenant_id, Some(tenant.user_id));
    assert!(matches!(lease.kind, LeaseKind::Custom { .. }));
    let inbox = harness.notifications.for_user(landlord.user_id);
    assert!(inbox.iter().any(|note| note.kind == NotificationKind::LeaseSigned));
}

#[test]
fn an_invite_can_be_signed_only_once() {
    let harness = harness();
    let landlord = harness.landlord();
    let listing = harness.listing(&landlord);
    let lease = drafted(&harness, &landlord, &listing);
    let invite = harness
        .services
        .leases
        .invite(&landlord, &lease.id, now())
        .expect("invite issued");

    harness
        .services
        .leases
        .sign(&invite.token, None, signature(), now())
        .expect("first signature");

    match harness
        .services
        .leases
        .sign(&invite.token, None, signature(), now())
    {
        Err(err @ ServiceError::Rule(BusinessRule::LeaseAlreadySigned)) => assert!(err.is_terminal()),
        other => panic!("expected already signed, got {other:?}"),
    }
    assert!(matches!(
        harness.services.leases.invite(&landlord, &lease.id, now()),
        Err(ServiceError::Rule(BusinessRule::LeaseAlreadySigned))
    ));
}

#[test]
fn expired_invites_cannot_be_opened() {
    let harness = harness();
    let landlord = harness.landlord();
    let listing = harness.listing(&landlord);
    let lease = drafted(&harness, &landlord, &listing);
    let invite = harness
        .services
        .leases
        .invite(&landlord, &lease.id, now())
        .expect("invite issued");

    assert!(matches!(
        harness
            .services
            .leases
            .open_invite(&invite.token, now() + Duration::days(8)),
        Err(ServiceError::Rule(BusinessRule::InviteExpired))
    ));
}

#[test]
fn custom_leases_require_valid_terms_and_a_document() {
    let harness = harness();
    let landlord = harness.landlord();
    let listing = harness.listing(&landlord);

    let mut draft = harness.draft(&listing);
    draft.end_date = draft.start_date;
    match harness.services.leases.create_custom(
        &landlord,
        CustomLeaseRequest {
            draft,
            document_url: harness.upload(&landlord, UploadKind::CustomLease, "maple.pdf"),
        },
        now(),
    ) {
        Err(ServiceError::Validation(errors)) => {
            assert_eq!(errors.field("end_date"), Some("End date must be after start date"))
        }
        other => panic!("expected validation failure, got {other:?}"),
    }

    assert!(matches!(
        harness.services.leases.create_custom(
            &landlord,
            CustomLeaseRequest {
                draft: harness.draft(&listing),
                document_url: "  ".to_string(),
            },
            now(),
        ),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn lease_documents_must_be_the_landlords_own_uploads() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);

    let never_uploaded = "https://api.propease.test/files/custom-lease/forged.pdf".to_string();
    let someone_elses = harness.upload(&tenant, UploadKind::CustomLease, "mine.pdf");
    let wrong_kind = harness.upload(&landlord, UploadKind::InsuranceDocument, "policy.pdf");
    for document_url in [never_uploaded, someone_elses, wrong_kind] {
        match harness.services.leases.create_custom(
            &landlord,
            CustomLeaseRequest {
                draft: harness.draft(&listing),
                document_url: document_url.clone(),
            },
            now(),
        ) {
            Err(ServiceError::Validation(errors)) => assert_eq!(
                errors.field("document_url"),
                Some("Lease document must be a file you uploaded"),
                "{document_url}"
            ),
            other => panic!("expected validation failure for {document_url}, got {other:?}"),
        }
    }
}

#[test]
fn signed_copy_is_attached_when_the_signer_uploaded_it() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);
    let lease = drafted(&harness, &landlord, &listing);
    let invite = harness
        .services
        .leases
        .invite(&landlord, &lease.id, now())
        .expect("invite issued");

    let anonymous = SignLease {
        signed_document_url: Some(harness.upload(&tenant, UploadKind::SignedLease, "signed.pdf")),
        ..signature()
    };
    assert!(matches!(
        harness.services.leases.sign(&invite.token, None, anonymous, now()),
        Err(ServiceError::Validation(_))
    ));

    let signed_copy = harness.upload(&tenant, UploadKind::SignedLease, "signed.pdf");
    let lease = harness
        .services
        .leases
        .sign(
            &invite.token,
            Some(&tenant),
            SignLease {
                signed_document_url: Some(signed_copy.clone()),
                ..signature()
            },
            now(),
        )
        .expect("lease signed");
    assert_eq!(lease.signed_document_url, Some(signed_copy));
}

#[test]
fn withdrawn_lease_leaves_the_invite_unused() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);
    let lease = drafted(&harness, &landlord, &listing);
    let invite = harness
        .services
        .leases
        .invite(&landlord, &lease.id, now())
        .expect("invite issued");

    harness
        .services
        .leases
        .terminate(&landlord, &lease.id)
        .expect("draft withdrawn");

    match harness
        .services
        .leases
        .sign(&invite.token, Some(&tenant), signature(), now())
    {
        Err(err @ ServiceError::Rule(BusinessRule::LeaseWithdrawn)) => assert!(err.is_terminal()),
        other => panic!("expected withdrawn lease, got {other:?}"),
    }
    let stored = harness
        .stores
        .invites
        .fetch(&invite.token)
        .expect("invite readable")
        .expect("invite kept");
    assert!(!stored.signed);
    assert_eq!(stored.signer_name, None);
    let lease = harness.stores.leases.fetch(&lease.id).expect("readable").expect("kept");
    assert_eq!(lease.status, LeaseStatus::Terminated);
    assert_eq!(lease.tenant_id, None);
}

#[test]
fn lapsed_leases_expire() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);
    let lease = harness.active_lease(&landlord, &tenant, &listing);

    let expired = harness
        .services
        .leases
        .expire_lapsed(date(2026, 11, 1))
        .expect("sweep runs");
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, lease.id);
    assert_eq!(expired[0].status, LeaseStatus::Expired);

    assert!(harness
        .services
        .leases
        .expire_lapsed(date(2026, 11, 2))
        .expect("sweep runs")
        .is_empty());
}

#[test]
fn only_the_owner_may_terminate() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let listing = harness.listing(&landlord);
    let lease = harness.active_lease(&landlord, &tenant, &listing);

    assert!(matches!(
        harness.services.leases.terminate(&tenant, &lease.id),
        Err(ServiceError::Forbidden)
    ));
    let terminated = harness
        .services
        .leases
        .terminate(&landlord, &lease.id)
        .expect("terminated");
    assert_eq!(terminated.status, LeaseStatus::Terminated);
}
