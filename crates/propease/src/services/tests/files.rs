use super::common::*;
use crate::domain::{NewInsurance, Role};
use crate::services::{CustomLeaseRequest, ServiceError};
use crate::uploads::UploadKind;

fn key_of(url: &str) -> &str {
    url.split_once("/files/").map(|(_, key)| key).expect("file url")
}

#[test]
fn policy_documents_are_private_to_the_parties() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let neighbour = harness.sign_in(Role::Tenant, "Sam Ortiz", "sam@example.com");
    let files = &harness.services.files;

    let url = harness.upload(&tenant, UploadKind::InsuranceDocument, "ho4.pdf");
    let key = key_of(&url);

    files
        .presign_download(&tenant, UploadKind::InsuranceDocument, key, now())
        .expect("uploader reads own file");
    assert!(matches!(
        files.presign_download(&landlord, UploadKind::InsuranceDocument, key, now()),
        Err(ServiceError::Forbidden)
    ));

    harness
        .services
        .insurance
        .submit(
            &tenant,
            NewInsurance {
                landlord_id: landlord.user_id,
                lease_id: None,
                provider: "Acme Mutual".to_string(),
                policy_number: "HO4-1182".to_string(),
                coverage_amount: crate::money::Cents::from_dollars(100_000),
                start_date: date(2025, 11, 1),
                end_date: date(2026, 10, 31),
                document_url: url.clone(),
            },
        )
        .expect("policy submitted");

    files
        .presign_download(&landlord, UploadKind::InsuranceDocument, key, now())
        .expect("landlord on the policy reads it");
    assert!(matches!(
        files.presign_download(&neighbour, UploadKind::InsuranceDocument, key, now()),
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(files.open(&neighbour, key), Err(ServiceError::Forbidden)));
    assert_eq!(
        files.open(&landlord, key).expect("readable").bytes,
        b"%PDF-1.7".to_vec()
    );
}

#[test]
fn endpoint_kind_must_match_the_key() {
    let harness = harness();
    let tenant = harness.tenant();
    let url = harness.upload(&tenant, UploadKind::InsuranceDocument, "ho4.pdf");

    assert!(matches!(
        harness
            .services
            .files
            .presign_download(&tenant, UploadKind::PaymentReceipt, key_of(&url), now()),
        Err(ServiceError::NotFound { entity: "file" })
    ));
    assert!(matches!(
        harness.services.files.open(&tenant, "avatars/ho4.pdf"),
        Err(ServiceError::NotFound { entity: "file" })
    ));
    assert!(matches!(
        harness.services.files.open(&tenant, "receipt/missing.pdf"),
        Err(ServiceError::NotFound { entity: "file" })
    ));
}

#[test]
fn invited_tenant_reads_the_custom_lease_before_signing() {
    let harness = harness();
    let landlord = harness.landlord();
    let tenant = harness.tenant();
    let stranger = harness.sign_in(Role::Tenant, "Sam Ortiz", "sam@example.com");
    let listing = harness.listing(&landlord);

    let url = harness.upload(&landlord, UploadKind::CustomLease, "maple.pdf");
    harness
        .services
        .leases
        .create_custom(
            &landlord,
            CustomLeaseRequest {
                draft: harness.draft(&listing),
                document_url: url.clone(),
            },
            now(),
        )
        .expect("lease drafted");

    harness
        .services
        .files
        .open(&tenant, key_of(&url))
        .expect("invited by email");
    assert!(matches!(
        harness.services.files.open(&stranger, key_of(&url)),
        Err(ServiceError::Forbidden)
    ));
}
