//! Explicit login state. Every service operation that acts on behalf of a user
//! takes the caller's [`Session`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::{random_token, Role, User, UserId};
use crate::services::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn is_landlord(&self) -> bool {
        self.role == Role::Admin
    }

    /// The caller's id if they act as a landlord.
    pub fn require_landlord(&self) -> Result<UserId, ServiceError> {
        match self.role {
            Role::Admin => Ok(self.user_id),
            Role::Tenant => Err(ServiceError::Forbidden),
        }
    }

    pub fn require_tenant(&self) -> Result<UserId, ServiceError> {
        match self.role {
            Role::Tenant => Ok(self.user_id),
            Role::Admin => Err(ServiceError::Forbidden),
        }
    }
}

/// Bearer tokens of the sessions currently open.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn open(&self, user: &User, now: DateTime<Utc>) -> Session {
        let session = Session {
            token: random_token(),
            user_id: user.id,
            role: user.role,
            issued_at: now,
        };
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.token.clone(), session.clone());
        info!(user = %user.id, role = user.role.label(), "session opened");
        session
    }

    pub fn resolve(&self, token: &str) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
    }

    /// Returns `false` if the token was not open.
    pub fn close(&self, token: &str) -> bool {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
        if let Some(session) = &removed {
            info!(user = %session.user_id, "session closed");
        }
        removed.is_some()
    }
}
