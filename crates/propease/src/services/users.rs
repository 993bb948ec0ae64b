use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{load, require_text, ServiceError, Stores};
use crate::domain::{ProfileUpdate, Role, User, UserId};
use crate::forms::{validators, FormErrors};
use crate::session::{Session, SessionRegistry};

/// Account registration payload. Used by seeding and the demo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub role: Role,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    stores: Stores,
    sessions: Arc<SessionRegistry>,
}

impl UserService {
    pub fn new(stores: Stores, sessions: Arc<SessionRegistry>) -> Self {
        Self { stores, sessions }
    }

    pub fn register(&self, new_user: NewUser, now: DateTime<Utc>) -> Result<User, ServiceError> {
        let name = require_text("name", "Name", &new_user.name)?;
        if let Some(message) = validators::email(&new_user.email) {
            return Err(ServiceError::Validation(FormErrors::single("email", message)));
        }
        let email = new_user.email.trim().to_ascii_lowercase();
        if self.find_by_email(&email)?.is_some() {
            return Err(ServiceError::Conflict("email already registered".to_string()));
        }

        let user = self.stores.users.insert(User {
            id: UserId::new(),
            role: new_user.role,
            name,
            email,
            phone: new_user
                .phone
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty()),
            profile_photo_url: None,
            created_at: now,
        })?;
        info!(user = %user.id, role = user.role.label(), "user registered");
        Ok(user)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let email = email.trim().to_ascii_lowercase();
        let matches = self.stores.users.find(&|user: &User| user.email == email)?;
        Ok(matches.into_iter().next())
    }

    /// Opens a session for an existing account. Credentials are out of scope;
    /// the email identifies the account.
    pub fn login(&self, email: &str, now: DateTime<Utc>) -> Result<Session, ServiceError> {
        let user = self
            .find_by_email(email)?
            .ok_or(ServiceError::NotFound { entity: "user" })?;
        Ok(self.sessions.open(&user, now))
    }

    pub fn logout(&self, session: &Session) -> bool {
        self.sessions.close(&session.token)
    }

    pub fn authenticate(&self, token: &str) -> Option<Session> {
        self.sessions.resolve(token)
    }

    pub fn profile(&self, session: &Session) -> Result<User, ServiceError> {
        load(self.stores.users.as_ref(), &session.user_id)
    }

    pub fn update_profile(&self, session: &Session, update: ProfileUpdate) -> Result<User, ServiceError> {
        let mut errors = FormErrors::default();
        if let Some(message) = update.name.as_deref().and_then(validators::full_name) {
            errors.insert_field("name", message);
        }
        if let Some(message) = update
            .phone
            .as_deref()
            .filter(|phone| !phone.trim().is_empty())
            .and_then(validators::phone)
        {
            errors.insert_field("phone", message);
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let mut user = self.profile(session)?;
        user.apply(update);
        self.stores.users.update(user.clone())?;
        info!(user = %user.id, "profile updated");
        Ok(user)
    }
}
