use crate::domain::{Entity, Notification, NotificationId, UserId};

/// Predicate handed to the repository. Kept as a trait object so the
/// repository trait stays object safe.
pub type Matcher<'a, T> = &'a (dyn Fn(&T) -> bool + Sync);

/// Storage abstraction so services can be exercised in isolation.
pub trait Repository<T: Entity>: Send + Sync {
    fn insert(&self, record: T) -> Result<T, RepositoryError>;
    fn update(&self, record: T) -> Result<(), RepositoryError>;
    /// Replace the stored record only if it still satisfies `expected`.
    /// Fails with [`RepositoryError::Stale`] otherwise.
    fn update_if(&self, record: T, expected: Matcher<'_, T>) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &T::Id) -> Result<Option<T>, RepositoryError>;
    fn find(&self, predicate: Matcher<'_, T>) -> Result<Vec<T>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was changed by another request")]
    Stale,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook plus the per-user inbox it fills.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
    fn inbox(&self, user: &UserId) -> Result<Vec<Notification>, NotificationError>;
    /// Returns `false` when the notification does not belong to `user`.
    fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<bool, NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
