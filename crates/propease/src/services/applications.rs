use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::{load, transition, BusinessRule, ServiceError, Stores};
use crate::domain::{
    random_token, ApplicationForm, ApplicationId, ApplicationStatus, ListingId, Notification,
    NotificationKind, RequestApplication, Role, User,
};
use crate::session::Session;
use crate::submission::AssembledSubmission;

/// Attempts at drawing an unused public id before giving up.
const PUBLIC_ID_ATTEMPTS: usize = 4;

#[derive(Clone)]
pub struct ApplicationService {
    stores: Stores,
    link_ttl: Duration,
}

impl ApplicationService {
    pub fn new(stores: Stores, link_ttl: Duration) -> Self {
        Self { stores, link_ttl }
    }

    /// Landlord generates a shareable application link for one of their listings.
    pub fn generate_link(
        &self,
        session: &Session,
        listing_id: &ListingId,
        now: DateTime<Utc>,
    ) -> Result<RequestApplication, ServiceError> {
        let landlord = session.require_landlord()?;
        let listing = load(self.stores.listings.as_ref(), listing_id)?;
        if listing.landlord_id != landlord {
            return Err(ServiceError::Forbidden);
        }

        let public_id = self.unused_public_id()?;
        let application = self.stores.applications.insert(RequestApplication {
            id: ApplicationId::new(),
            public_id,
            listing_id: listing.id,
            landlord_id: landlord,
            status: ApplicationStatus::New,
            created_at: now,
            expires_at: now + self.link_ttl,
            submitted_at: None,
            form: None,
        })?;
        info!(application = %application.id, listing = %listing.id, "application link generated");
        Ok(application)
    }

    fn unused_public_id(&self) -> Result<String, ServiceError> {
        for _ in 0..PUBLIC_ID_ATTEMPTS {
            let candidate = random_token();
            let taken = self
                .stores
                .applications
                .find(&|application: &RequestApplication| application.public_id == candidate)?;
            if taken.is_empty() {
                return Ok(candidate);
            }
        }
        Err(ServiceError::Conflict("could not allocate an application link".to_string()))
    }

    pub fn list(&self, session: &Session) -> Result<Vec<RequestApplication>, ServiceError> {
        let landlord = session.require_landlord()?;
        let mut applications = self
            .stores
            .applications
            .find(&|application: &RequestApplication| application.landlord_id == landlord)?;
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(applications)
    }

    fn by_public_id(&self, public_id: &str) -> Result<RequestApplication, ServiceError> {
        self.stores
            .applications
            .find(&|application: &RequestApplication| application.public_id == public_id)?
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound { entity: "application" })
    }

    /// What a tenant sees when opening the link. Expired, submitted, and closed
    /// links are terminal.
    pub fn open(&self, public_id: &str, now: DateTime<Utc>) -> Result<RequestApplication, ServiceError> {
        let application = self.by_public_id(public_id)?;
        match application.status {
            ApplicationStatus::New if application.is_expired(now) => Err(BusinessRule::LinkExpired.into()),
            ApplicationStatus::New => Ok(application),
            ApplicationStatus::Pending | ApplicationStatus::Approved | ApplicationStatus::Rejected => {
                Err(BusinessRule::ApplicationAlreadySubmitted.into())
            }
            ApplicationStatus::Cancelled => Err(BusinessRule::ApplicationClosed.into()),
        }
    }

    /// Tenant submits the wizard through the public link. The same validators
    /// the wizard ran are applied again here.
    pub fn submit(
        &self,
        public_id: &str,
        submission: &AssembledSubmission,
        now: DateTime<Utc>,
    ) -> Result<RequestApplication, ServiceError> {
        let application = self.open(public_id, now)?;
        let form = ApplicationForm::from_submission(submission).map_err(ServiceError::Validation)?;

        let submitted = transition(
            self.stores.applications.as_ref(),
            application,
            ApplicationStatus::Pending,
            |application| {
                application.form = Some(form);
                application.submitted_at = Some(now);
            },
        )
        .map_err(|err| match err {
            // Lost a race against another submit of the same link.
            ServiceError::Conflict(_) => BusinessRule::ApplicationAlreadySubmitted.into(),
            other => other,
        })?;

        let applicant = submitted
            .form
            .as_ref()
            .map(|form| form.full_name.as_str())
            .unwrap_or("An applicant");
        self.stores.notify(Notification::new(
            submitted.landlord_id,
            NotificationKind::ApplicationSubmitted,
            format!("{applicant} submitted an application"),
            now,
        ))?;
        Ok(submitted)
    }

    pub fn approve(&self, session: &Session, id: &ApplicationId, now: DateTime<Utc>) -> Result<RequestApplication, ServiceError> {
        self.review(session, id, ApplicationStatus::Approved, now)
    }

    pub fn reject(&self, session: &Session, id: &ApplicationId, now: DateTime<Utc>) -> Result<RequestApplication, ServiceError> {
        self.review(session, id, ApplicationStatus::Rejected, now)
    }

    pub fn cancel(&self, session: &Session, id: &ApplicationId) -> Result<RequestApplication, ServiceError> {
        let application = self.owned(session, id)?;
        transition(
            self.stores.applications.as_ref(),
            application,
            ApplicationStatus::Cancelled,
            |_| {},
        )
    }

    fn owned(&self, session: &Session, id: &ApplicationId) -> Result<RequestApplication, ServiceError> {
        let landlord = session.require_landlord()?;
        let application = load(self.stores.applications.as_ref(), id)?;
        if application.landlord_id != landlord {
            return Err(ServiceError::Forbidden);
        }
        Ok(application)
    }

    fn review(
        &self,
        session: &Session,
        id: &ApplicationId,
        decision: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<RequestApplication, ServiceError> {
        let application = self.owned(session, id)?;
        let reviewed = transition(self.stores.applications.as_ref(), application, decision, |_| {})?;

        // Applicants only hear about it in-app if they already hold an account.
        if let Some(applicant) = self.applicant_account(&reviewed)? {
            let verdict = match decision {
                ApplicationStatus::Approved => "approved",
                _ => "declined",
            };
            self.stores.notify(Notification::new(
                applicant.id,
                NotificationKind::ApplicationReviewed,
                format!("Your rental application was {verdict}"),
                now,
            ))?;
        } else {
            warn!(application = %reviewed.id, "applicant has no account to notify");
        }
        Ok(reviewed)
    }

    fn applicant_account(&self, application: &RequestApplication) -> Result<Option<User>, ServiceError> {
        let Some(email) = application
            .form
            .as_ref()
            .map(|form| form.email.trim().to_ascii_lowercase())
        else {
            return Ok(None);
        };
        let users = self
            .stores
            .users
            .find(&|user: &User| user.role == Role::Tenant && user.email == email)?;
        Ok(users.into_iter().next())
    }
}
