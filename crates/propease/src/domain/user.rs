use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, UserId};

/// Account role. `Admin` accounts act as landlords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Tenant,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "landlord",
            Role::Tenant => "tenant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    const KIND: &'static str = "user";

    fn id(&self) -> &UserId {
        &self.id
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub profile_photo_url: Option<String>,
}

impl User {
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            let phone = phone.trim();
            self.phone = (!phone.is_empty()).then(|| phone.to_string());
        }
        if let Some(url) = update.profile_photo_url {
            self.profile_photo_url = Some(url);
        }
    }
}
