use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    load, require_text, require_upload, transition, BusinessRule, RepositoryError, ServiceError,
    Stores,
};
use crate::domain::{
    random_token, Lease, LeaseDraft, LeaseId, LeaseInvite, LeaseKind, LeaseStatus, Notification,
    NotificationKind, Role, User, UserId,
};
use crate::session::Session;
use crate::submission::AssembledSubmission;
use crate::uploads::{UploadKind, UploadService};

/// Custom lease: typed terms plus the landlord's own uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomLeaseRequest {
    #[serde(flatten)]
    pub draft: LeaseDraft,
    pub document_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignLease {
    pub signer_name: String,
    #[serde(default)]
    pub signed_document_url: Option<String>,
}

/// What the tenant sees when opening an invite link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteView {
    pub invite: LeaseInvite,
    pub lease: Lease,
}

#[derive(Clone)]
pub struct LeaseService {
    stores: Stores,
    uploads: Arc<UploadService>,
    invite_ttl: Duration,
}

impl LeaseService {
    pub fn new(stores: Stores, uploads: Arc<UploadService>, invite_ttl: Duration) -> Self {
        Self {
            stores,
            uploads,
            invite_ttl,
        }
    }

    /// Standard lease from the lease wizard's assembled submission.
    pub fn create_standard(
        &self,
        session: &Session,
        submission: &AssembledSubmission,
        now: DateTime<Utc>,
    ) -> Result<Lease, ServiceError> {
        let draft = LeaseDraft::from_submission(submission).map_err(ServiceError::Validation)?;
        self.create(session, draft, LeaseKind::Standard, now)
    }

    pub fn create_custom(
        &self,
        session: &Session,
        request: CustomLeaseRequest,
        now: DateTime<Utc>,
    ) -> Result<Lease, ServiceError> {
        let landlord = session.require_landlord()?;
        let errors = request.draft.validate();
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }
        let document_url = require_upload(
            &self.uploads,
            UploadKind::CustomLease,
            Some(landlord),
            "document_url",
            "Lease document",
            &request.document_url,
        )?;
        self.create(session, request.draft, LeaseKind::Custom { document_url }, now)
    }

    fn create(
        &self,
        session: &Session,
        draft: LeaseDraft,
        kind: LeaseKind,
        now: DateTime<Utc>,
    ) -> Result<Lease, ServiceError> {
        let landlord = session.require_landlord()?;
        let listing = load(self.stores.listings.as_ref(), &draft.listing_id)?;
        if listing.landlord_id != landlord {
            return Err(ServiceError::Forbidden);
        }

        let tenant_email = draft.tenant_email.trim().to_ascii_lowercase();
        let tenant_id = self.tenant_account(&tenant_email)?.map(|user| user.id);
        let lease = self.stores.leases.insert(Lease {
            id: LeaseId::new(),
            landlord_id: landlord,
            listing_id: listing.id,
            tenant_id,
            tenant_name: draft.tenant_name.trim().to_string(),
            tenant_email,
            start_date: draft.start_date,
            end_date: draft.end_date,
            rent: draft.rent,
            security_deposit: draft.security_deposit,
            payment_due_day: draft.payment_due_day,
            late_fee: draft.late_fee,
            kind,
            status: LeaseStatus::Draft,
            signed_document_url: None,
            created_at: now,
        })?;
        info!(lease = %lease.id, listing = %listing.id, "lease drafted");
        Ok(lease)
    }

    fn tenant_account(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let users = self
            .stores
            .users
            .find(&|user: &User| user.role == Role::Tenant && user.email == email)?;
        Ok(users.into_iter().next())
    }

    pub fn list(&self, session: &Session) -> Result<Vec<Lease>, ServiceError> {
        let user = session.user_id;
        let mut leases = if session.is_landlord() {
            self.stores.leases.find(&|lease: &Lease| lease.landlord_id == user)?
        } else {
            self.stores
                .leases
                .find(&|lease: &Lease| lease.tenant_id == Some(user))?
        };
        leases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leases)
    }

    pub fn get(&self, session: &Session, id: &LeaseId) -> Result<Lease, ServiceError> {
        let lease = load(self.stores.leases.as_ref(), id)?;
        let visible = lease.landlord_id == session.user_id || lease.tenant_id == Some(session.user_id);
        if !visible {
            return Err(ServiceError::Forbidden);
        }
        Ok(lease)
    }

    fn owned(&self, session: &Session, id: &LeaseId) -> Result<Lease, ServiceError> {
        let landlord = session.require_landlord()?;
        let lease = load(self.stores.leases.as_ref(), id)?;
        if lease.landlord_id != landlord {
            return Err(ServiceError::Forbidden);
        }
        Ok(lease)
    }

    pub fn terminate(&self, session: &Session, id: &LeaseId) -> Result<Lease, ServiceError> {
        let lease = self.owned(session, id)?;
        transition(self.stores.leases.as_ref(), lease, LeaseStatus::Terminated, |_| {})
    }

    /// Moves every active lease whose end date has passed to `Expired`.
    pub fn expire_lapsed(&self, today: NaiveDate) -> Result<Vec<Lease>, ServiceError> {
        let lapsed = self.stores.leases.find(&|lease: &Lease| lease.has_lapsed(today))?;
        let mut expired = Vec::with_capacity(lapsed.len());
        for lease in lapsed {
            match transition(self.stores.leases.as_ref(), lease, LeaseStatus::Expired, |_| {}) {
                Ok(lease) => expired.push(lease),
                // Someone else moved it first; nothing left to do.
                Err(ServiceError::Conflict(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(expired)
    }

    /// Issues a one-time signing link for a draft lease.
    pub fn invite(&self, session: &Session, lease_id: &LeaseId, now: DateTime<Utc>) -> Result<LeaseInvite, ServiceError> {
        let lease = self.owned(session, lease_id)?;
        if lease.status != LeaseStatus::Draft {
            return Err(no_longer_signable(lease.status).into());
        }

        let invite = self.stores.invites.insert(LeaseInvite {
            token: random_token(),
            lease_id: lease.id,
            tenant_email: lease.tenant_email.clone(),
            signed: false,
            signed_at: None,
            signer_name: None,
            expires_at: now + self.invite_ttl,
        })?;
        info!(lease = %lease.id, "lease invite issued");
        Ok(invite)
    }

    pub fn open_invite(&self, token: &str, now: DateTime<Utc>) -> Result<InviteView, ServiceError> {
        let invite = load(self.stores.invites.as_ref(), &token.to_string())?;
        if invite.signed {
            return Err(BusinessRule::LeaseAlreadySigned.into());
        }
        if now >= invite.expires_at {
            return Err(BusinessRule::InviteExpired.into());
        }
        let lease = load(self.stores.leases.as_ref(), &invite.lease_id)?;
        if lease.status != LeaseStatus::Draft {
            return Err(no_longer_signable(lease.status).into());
        }
        Ok(InviteView { invite, lease })
    }

    /// Activates the lease, then consumes the invite. A signed-in tenant is
    /// linked to the lease; otherwise the account matching the invited email is.
    pub fn sign(
        &self,
        token: &str,
        signer: Option<&Session>,
        request: SignLease,
        now: DateTime<Utc>,
    ) -> Result<Lease, ServiceError> {
        let signer_name = require_text("signer_name", "Signature", &request.signer_name)?;
        let InviteView { mut invite, lease } = self.open_invite(token, now)?;

        let tenant_id: Option<UserId> = match signer {
            Some(session) => Some(session.require_tenant()?),
            None => self.tenant_account(&invite.tenant_email)?.map(|user| user.id),
        };
        let signed_document_url = match request
            .signed_document_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        {
            Some(url) => Some(require_upload(
                &self.uploads,
                UploadKind::SignedLease,
                signer.map(|session| session.user_id),
                "signed_document_url",
                "Signed lease",
                url,
            )?),
            None => None,
        };

        // Lease first, so a lease withdrawn meanwhile leaves the invite unused.
        let lease_id = lease.id;
        let lease = transition(self.stores.leases.as_ref(), lease, LeaseStatus::Active, |lease| {
            if tenant_id.is_some() {
                lease.tenant_id = tenant_id;
            }
            lease.signed_document_url = signed_document_url;
        })
        .map_err(|err| match err {
            ServiceError::Conflict(_) | ServiceError::InvalidTransition { .. } => {
                match load(self.stores.leases.as_ref(), &lease_id) {
                    Ok(current) => ServiceError::from(no_longer_signable(current.status)),
                    Err(err) => err,
                }
            }
            other => other,
        })?;

        invite.signed = true;
        invite.signed_at = Some(now);
        invite.signer_name = Some(signer_name.clone());
        self.stores
            .invites
            .update_if(invite, &|stored: &LeaseInvite| !stored.signed)
            .map_err(|err| match err {
                RepositoryError::Stale => ServiceError::Rule(BusinessRule::LeaseAlreadySigned),
                other => other.into(),
            })?;

        self.stores.notify(Notification::new(
            lease.landlord_id,
            NotificationKind::LeaseSigned,
            format!("{signer_name} signed the lease"),
            now,
        ))?;
        Ok(lease)
    }
}

fn no_longer_signable(status: LeaseStatus) -> BusinessRule {
    match status {
        LeaseStatus::Active => BusinessRule::LeaseAlreadySigned,
        _ => BusinessRule::LeaseWithdrawn,
    }
}
