use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::config::WorkflowConfig;
use crate::domain::{
    Entity, Lease, LeaseDraft, Listing, NewListing, Notification, NotificationId, PropertyType,
    Role, UserId,
};
use crate::money::Cents;
use crate::services::{
    Matcher, NewUser, NotificationError, NotificationPublisher, Repository, RepositoryError,
    Services, SignLease, Stores,
};
use crate::session::{Session, SessionRegistry};
use crate::uploads::{Grant, ObjectStore, StorageError, StoredObject, UploadKind, UploadService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
}

pub(super) fn today() -> NaiveDate {
    now().date_naive()
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) struct MemoryRepository<T: Entity> {
    records: Mutex<HashMap<T::Id, T>>,
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Entity> Repository<T> for MemoryRepository<T> {
    fn insert(&self, record: T) -> Result<T, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(record.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: T) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id().clone(), record);
        Ok(())
    }

    fn update_if(&self, record: T, expected: Matcher<'_, T>) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get(record.id()) {
            None => Err(RepositoryError::NotFound),
            Some(stored) if !expected(stored) => Err(RepositoryError::Stale),
            Some(_) => {
                guard.insert(record.id().clone(), record);
                Ok(())
            }
        }
    }

    fn fetch(&self, id: &T::Id) -> Result<Option<T>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find(&self, predicate: Matcher<'_, T>) -> Result<Vec<T>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().filter(|record| predicate(record)).cloned().collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }

    pub(super) fn for_user(&self, user: UserId) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter(|notification| notification.user_id == user)
            .collect()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }

    fn inbox(&self, user: &UserId) -> Result<Vec<Notification>, NotificationError> {
        Ok(self.for_user(*user))
    }

    fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<bool, NotificationError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        match guard
            .iter_mut()
            .find(|notification| notification.id == *id && notification.user_id == *user)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub(super) struct MemoryObjects {
    grants: Mutex<HashMap<String, Grant>>,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl ObjectStore for MemoryObjects {
    fn save_grant(&self, grant: Grant) -> Result<(), StorageError> {
        self.grants
            .lock()
            .expect("grant mutex poisoned")
            .insert(grant.token.clone(), grant);
        Ok(())
    }

    fn take_grant(&self, token: &str) -> Result<Option<Grant>, StorageError> {
        Ok(self.grants.lock().expect("grant mutex poisoned").remove(token))
    }

    fn grant(&self, token: &str) -> Result<Option<Grant>, StorageError> {
        Ok(self.grants.lock().expect("grant mutex poisoned").get(token).cloned())
    }

    fn put(&self, object: StoredObject) -> Result<(), StorageError> {
        self.objects
            .lock()
            .expect("object mutex poisoned")
            .insert(object.key.clone(), object);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        Ok(self.objects.lock().expect("object mutex poisoned").get(key).cloned())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut grants = self.grants.lock().expect("grant mutex poisoned");
        let before = grants.len();
        grants.retain(|_, grant| grant.expires_at > now);
        Ok(before - grants.len())
    }
}

pub(super) struct Harness {
    pub(super) services: Services,
    pub(super) stores: Stores,
    pub(super) notifications: Arc<MemoryNotifications>,
}

pub(super) fn harness() -> Harness {
    let notifications = Arc::new(MemoryNotifications::default());
    let stores = Stores {
        users: Arc::new(MemoryRepository::default()),
        listings: Arc::new(MemoryRepository::default()),
        applications: Arc::new(MemoryRepository::default()),
        leases: Arc::new(MemoryRepository::default()),
        invites: Arc::new(MemoryRepository::default()),
        payments: Arc::new(MemoryRepository::default()),
        maintenance: Arc::new(MemoryRepository::default()),
        insurance: Arc::new(MemoryRepository::default()),
        notifications: notifications.clone(),
    };
    let uploads = UploadService::new(
        Arc::new(MemoryObjects::default()),
        "https://api.propease.test",
        chrono::Duration::minutes(15),
    );
    let services = Services::new(
        stores.clone(),
        Arc::new(SessionRegistry::default()),
        uploads,
        WorkflowConfig::default(),
    );
    Harness {
        services,
        stores,
        notifications,
    }
}

impl Harness {
    pub(super) fn sign_in(&self, role: Role, name: &str, email: &str) -> Session {
        self.services
            .users
            .register(
                NewUser {
                    role,
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: None,
                },
                now(),
            )
            .expect("user registered");
        self.services.users.login(email, now()).expect("session opened")
    }

    pub(super) fn landlord(&self) -> Session {
        self.sign_in(Role::Admin, "Morgan Reyes", "morgan@propease.test")
    }

    pub(super) fn tenant(&self) -> Session {
        self.sign_in(Role::Tenant, "Jordan Lee", "jordan@example.com")
    }

    pub(super) fn listing(&self, landlord: &Session) -> Listing {
        self.services
            .listings
            .create(
                landlord,
                NewListing {
                    title: "Maple Court 2B".to_string(),
                    address: "44 Maple Ct, Des Moines, IA".to_string(),
                    rent: Cents::from_dollars(1_450),
                    property_type: PropertyType::Apartment,
                    image_urls: Vec::new(),
                    amenities: vec!["Laundry".to_string()],
                },
                now(),
            )
            .expect("listing created")
    }

    pub(super) fn draft(&self, listing: &Listing) -> LeaseDraft {
        LeaseDraft {
            listing_id: listing.id,
            tenant_name: "Jordan Lee".to_string(),
            tenant_email: "jordan@example.com".to_string(),
            start_date: date(2025, 11, 1),
            end_date: date(2026, 10, 31),
            rent: Cents::from_dollars(1_450),
            security_deposit: Cents::from_dollars(1_450),
            payment_due_day: 1,
            late_fee: Some(Cents::from_dollars(50)),
        }
    }

    /// Presign and PUT a small file as `uploader`, returning its stable URL.
    pub(super) fn upload(&self, uploader: &Session, kind: UploadKind, file_name: &str) -> String {
        let content_type = if kind.images_only() { "image/png" } else { "application/pdf" };
        let grant = self
            .services
            .uploads
            .presign_upload(kind, Some(uploader.user_id), file_name, content_type, now())
            .expect("upload url issued");
        let token = grant.upload_url.rsplit('/').next().expect("token segment");
        self.services
            .uploads
            .complete_upload(token, content_type, b"%PDF-1.7".to_vec(), now())
            .expect("upload stored")
            .url
    }

    /// Landlord drafts a custom lease for `listing` and the tenant signs it.
    pub(super) fn active_lease(&self, landlord: &Session, tenant: &Session, listing: &Listing) -> Lease {
        let lease = self
            .services
            .leases
            .create_custom(
                landlord,
                crate::services::CustomLeaseRequest {
                    draft: self.draft(listing),
                    document_url: self.upload(landlord, UploadKind::CustomLease, "maple.pdf"),
                },
                now(),
            )
            .expect("lease drafted");
        let invite = self
            .services
            .leases
            .invite(landlord, &lease.id, now())
            .expect("invite issued");
        self.services
            .leases
            .sign(
                &invite.token,
                Some(tenant),
                SignLease {
                    signer_name: "Jordan Lee".to_string(),
                    signed_document_url: None,
                },
                now(),
            )
            .expect("lease signed")
    }
}
