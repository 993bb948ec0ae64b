use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use super::{load, require_text, require_upload, transition, BusinessRule, ServiceError, Stores};
use crate::domain::{
    Insurance, InsuranceId, InsuranceStatus, NewInsurance, Notification, NotificationKind,
};
use crate::forms::FormErrors;
use crate::session::Session;
use crate::uploads::{UploadKind, UploadService};

#[derive(Clone)]
pub struct InsuranceService {
    stores: Stores,
    uploads: Arc<UploadService>,
}

impl InsuranceService {
    pub fn new(stores: Stores, uploads: Arc<UploadService>) -> Self {
        Self { stores, uploads }
    }

    pub fn submit(&self, session: &Session, policy: NewInsurance) -> Result<Insurance, ServiceError> {
        let tenant = session.require_tenant()?;
        let provider = require_text("provider", "Provider", &policy.provider)?;
        let policy_number = require_text("policy_number", "Policy number", &policy.policy_number)?;
        let document_url = require_upload(
            &self.uploads,
            UploadKind::InsuranceDocument,
            Some(tenant),
            "document_url",
            "Policy document",
            &policy.document_url,
        )?;

        let mut errors = FormErrors::default();
        if !policy.coverage_amount.is_positive() {
            errors.insert_field("coverage_amount", "Coverage amount must be greater than 0");
        }
        if policy.end_date <= policy.start_date {
            errors.insert_field("end_date", "End date must be after start date");
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        if let Some(lease_id) = &policy.lease_id {
            let lease = load(self.stores.leases.as_ref(), lease_id)?;
            if lease.tenant_id != Some(tenant) {
                return Err(ServiceError::Forbidden);
            }
            if lease.landlord_id != policy.landlord_id {
                return Err(BusinessRule::ForeignLease.into());
            }
        }

        let insurance = self.stores.insurance.insert(Insurance {
            id: InsuranceId::new(),
            tenant_id: tenant,
            landlord_id: policy.landlord_id,
            lease_id: policy.lease_id,
            provider,
            policy_number,
            coverage_amount: policy.coverage_amount,
            start_date: policy.start_date,
            end_date: policy.end_date,
            document_url,
            status: InsuranceStatus::Pending,
            rejection_reason: None,
        })?;
        info!(insurance = %insurance.id, "insurance policy submitted");
        Ok(insurance)
    }

    /// Policies with their status as of `today`.
    pub fn list(&self, session: &Session, today: NaiveDate) -> Result<Vec<Insurance>, ServiceError> {
        let user = session.user_id;
        let policies = if session.is_landlord() {
            self.stores
                .insurance
                .find(&|policy: &Insurance| policy.landlord_id == user)?
        } else {
            self.stores
                .insurance
                .find(&|policy: &Insurance| policy.tenant_id == user)?
        };
        Ok(policies
            .into_iter()
            .map(|mut policy| {
                policy.status = policy.effective_status(today);
                policy
            })
            .collect())
    }

    fn reviewable(&self, session: &Session, id: &InsuranceId) -> Result<Insurance, ServiceError> {
        let landlord = session.require_landlord()?;
        let policy = load(self.stores.insurance.as_ref(), id)?;
        if policy.landlord_id != landlord {
            return Err(ServiceError::Forbidden);
        }
        Ok(policy)
    }

    pub fn verify(&self, session: &Session, id: &InsuranceId, now: DateTime<Utc>) -> Result<Insurance, ServiceError> {
        let policy = self.reviewable(session, id)?;
        let policy = transition(self.stores.insurance.as_ref(), policy, InsuranceStatus::Verified, |_| {})?;
        self.stores.notify(Notification::new(
            policy.tenant_id,
            NotificationKind::InsuranceReviewed,
            format!("Your {} policy was verified", policy.provider),
            now,
        ))?;
        Ok(policy)
    }

    pub fn reject(
        &self,
        session: &Session,
        id: &InsuranceId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Insurance, ServiceError> {
        let reason = require_text("reason", "Reason", reason)?;
        let policy = self.reviewable(session, id)?;
        let policy = transition(self.stores.insurance.as_ref(), policy, InsuranceStatus::Rejected, |policy| {
            policy.rejection_reason = Some(reason);
        })?;
        self.stores.notify(Notification::new(
            policy.tenant_id,
            NotificationKind::InsuranceReviewed,
            format!("Your {} policy was rejected", policy.provider),
            now,
        ))?;
        Ok(policy)
    }
}
