use std::sync::Arc;

use super::{NotificationPublisher, ServiceError};
use crate::domain::{Notification, NotificationId};
use crate::session::Session;

#[derive(Clone)]
pub struct NotificationService {
    publisher: Arc<dyn NotificationPublisher>,
}

impl NotificationService {
    pub fn new(publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self { publisher }
    }

    /// Newest first.
    pub fn inbox(&self, session: &Session) -> Result<Vec<Notification>, ServiceError> {
        let mut notifications = self.publisher.inbox(&session.user_id)?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    pub fn mark_read(&self, session: &Session, id: &NotificationId) -> Result<(), ServiceError> {
        if self.publisher.mark_read(&session.user_id, id)? {
            Ok(())
        } else {
            Err(ServiceError::NotFound { entity: "notification" })
        }
    }
}
