use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use propease::config::AppConfig;
use propease::domain::{Entity, Notification, NotificationId, UserId};
use propease::services::{
    Matcher, NotificationError, NotificationPublisher, Repository, RepositoryError, Services,
    Stores,
};
use propease::session::SessionRegistry;
use propease::uploads::{Grant, ObjectStore, StorageError, StoredObject, UploadService};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) support_mailto: Option<String>,
}

pub(crate) struct InMemoryRepository<T: Entity> {
    records: Arc<Mutex<HashMap<T::Id, T>>>,
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Entity> Repository<T> for InMemoryRepository<T> {
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
        if guard.contains_key(record.id()) {
            guard.insert(record.id().clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
        Ok(guard
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for InMemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }

    fn inbox(&self, user: &UserId) -> Result<Vec<Notification>, NotificationError> {
        let guard = self.events.lock().expect("notification mutex poisoned");
        Ok(guard
            .iter()
            .filter(|notification| notification.user_id == *user)
            .cloned()
            .collect())
    }

    fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<bool, NotificationError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        let found = guard
            .iter_mut()
            .find(|notification| notification.id == *id && notification.user_id == *user);
        Ok(match found {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        })
    }
}

impl InMemoryNotifications {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

/// Grants and objects kept in process memory. Suitable for the demo and a
/// single-instance deployment.
#[derive(Default, Clone)]
pub(crate) struct InMemoryObjectStore {
    grants: Arc<Mutex<HashMap<String, Grant>>>,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

impl ObjectStore for InMemoryObjectStore {
    fn save_grant(&self, grant: Grant) -> Result<(), StorageError> {
        let mut guard = self.grants.lock().expect("grant mutex poisoned");
        guard.insert(grant.token.clone(), grant);
        Ok(())
    }

    fn take_grant(&self, token: &str) -> Result<Option<Grant>, StorageError> {
        let mut guard = self.grants.lock().expect("grant mutex poisoned");
        Ok(guard.remove(token))
    }

    fn grant(&self, token: &str) -> Result<Option<Grant>, StorageError> {
        let guard = self.grants.lock().expect("grant mutex poisoned");
        Ok(guard.get(token).cloned())
    }

    fn put(&self, object: StoredObject) -> Result<(), StorageError> {
        let mut guard = self.objects.lock().expect("object mutex poisoned");
        guard.insert(object.key.clone(), object);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let guard = self.objects.lock().expect("object mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut guard = self.grants.lock().expect("grant mutex poisoned");
        let before = guard.len();
        guard.retain(|_, grant| grant.expires_at > now);
        Ok(before - guard.len())
    }
}

pub(crate) fn in_memory_stores(notifications: Arc<InMemoryNotifications>) -> Stores {
    Stores {
        users: Arc::new(InMemoryRepository::default()),
        listings: Arc::new(InMemoryRepository::default()),
        applications: Arc::new(InMemoryRepository::default()),
        leases: Arc::new(InMemoryRepository::default()),
        invites: Arc::new(InMemoryRepository::default()),
        payments: Arc::new(InMemoryRepository::default()),
        maintenance: Arc::new(InMemoryRepository::default()),
        insurance: Arc::new(InMemoryRepository::default()),
        notifications,
    }
}

/// Wire every service against in-memory storage.
pub(crate) fn in_memory_services(config: &AppConfig, notifications: Arc<InMemoryNotifications>) -> Services {
    let uploads = UploadService::new(
        Arc::new(InMemoryObjectStore::default()),
        config.storage.public_base_url.clone(),
        config.storage.upload_url_ttl,
    );
    Services::new(
        in_memory_stores(notifications),
        Arc::new(SessionRegistry::default()),
        uploads,
        config.workflow.clone(),
    )
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use propease::uploads::GrantAccess;

    #[test]
    fn purge_drops_only_expired_grants() {
        let store = InMemoryObjectStore::default();
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap();
        for (token, expires_at) in [("old", now), ("fresh", now + Duration::minutes(10))] {
            store
                .save_grant(Grant {
                    token: token.to_string(),
                    key: "receipt/r.pdf".to_string(),
                    access: GrantAccess::Read,
                    expires_at,
                })
                .expect("grant saved");
        }

        assert_eq!(store.purge_expired(now), Ok(1));
        assert_eq!(store.grant("old"), Ok(None));
        assert!(store.grant("fresh").expect("readable").is_some());
    }
}
