use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::repository::{NotificationError, RepositoryError};
use crate::forms::FormErrors;
use crate::uploads::StorageError;

/// Business conditions the server refuses outright. Terminal ones cannot be
/// fixed by retrying and are rendered as a full-page message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusinessRule {
    #[error("link expired")]
    LinkExpired,
    #[error("application already submitted")]
    ApplicationAlreadySubmitted,
    #[error("application is no longer open")]
    ApplicationClosed,
    #[error("lease already signed")]
    LeaseAlreadySigned,
    #[error("lease is no longer available to sign")]
    LeaseWithdrawn,
    #[error("invitation expired")]
    InviteExpired,
    #[error("no receipt is awaiting review")]
    NoReceiptToReview,
    #[error("lease belongs to another landlord")]
    ForeignLease,
}

impl BusinessRule {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            BusinessRule::LinkExpired
                | BusinessRule::ApplicationAlreadySubmitted
                | BusinessRule::ApplicationClosed
                | BusinessRule::LeaseAlreadySigned
                | BusinessRule::LeaseWithdrawn
                | BusinessRule::InviteExpired
        )
    }
}

/// Error raised by every service in this module.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("not permitted for this account")]
    Forbidden,
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },
    #[error(transparent)]
    Rule(#[from] BusinessRule),
    #[error("{} field(s) need attention", .0.len())]
    Validation(FormErrors),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str) -> Self {
        ServiceError::NotFound { entity }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            ServiceError::Rule(rule) => rule.is_terminal(),
            ServiceError::Storage(StorageError::Expired) => true,
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::InvalidTransition { .. } | ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Rule(rule) if rule.is_terminal() => StatusCode::GONE,
            ServiceError::Rule(BusinessRule::ForeignLease) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Rule(_) => StatusCode::CONFLICT,
            ServiceError::Validation(_) | ServiceError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ServiceError::Repository(RepositoryError::Conflict | RepositoryError::Stale) => {
                StatusCode::CONFLICT
            }
            ServiceError::Storage(err) => match err {
                StorageError::UnknownGrant | StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::Expired => StatusCode::GONE,
                StorageError::ContentTypeMismatch { .. }
                | StorageError::TooLarge(_)
                | StorageError::UnsupportedType(_)
                | StorageError::MissingFileName
                | StorageError::NotStored(_) => StatusCode::UNPROCESSABLE_ENTITY,
                StorageError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::Repository(RepositoryError::Unavailable(_))
            | ServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut payload = json!({
            "error": self.to_string(),
            "terminal": self.is_terminal(),
        });
        if let ServiceError::Validation(errors) = &self {
            payload["fields"] = json!(errors);
        }
        (status, Json(payload)).into_response()
    }
}
