use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use super::{
    load, require_text, require_upload, transition, BusinessRule, RepositoryError, ServiceError,
    Stores,
};
use crate::accounting::{AccountingView, PaymentFilters};
use crate::domain::{
    ListingId, NewPayment, Notification, NotificationKind, Payment, PaymentId, PaymentStatus,
    Receipt, ReceiptReview, Role, StatusFlow, UserId,
};
use crate::money::{format_usd, Cents};
use crate::session::Session;
use crate::uploads::{UploadKind, UploadService};

#[derive(Clone)]
pub struct PaymentService {
    stores: Stores,
    uploads: Arc<UploadService>,
}

impl PaymentService {
    pub fn new(stores: Stores, uploads: Arc<UploadService>) -> Self {
        Self { stores, uploads }
    }

    /// Landlord bills a tenant. When a lease is given it must be one of the
    /// landlord's own, and it decides the tenant and listing.
    pub fn create(&self, session: &Session, request: NewPayment, now: DateTime<Utc>) -> Result<Payment, ServiceError> {
        let landlord = session.require_landlord()?;
        if !request.amount.is_positive() {
            return Err(ServiceError::Invalid("Amount must be greater than 0".to_string()));
        }
        if request.amount.exceeds_max() {
            return Err(ServiceError::Invalid(format!(
                "Amount must be at most {}",
                format_usd(Cents::MAX_AMOUNT)
            )));
        }

        let (tenant_id, listing_id) = self.billed_parties(landlord, &request)?;

        let payment = self.stores.payments.insert(Payment {
            id: PaymentId::new(),
            landlord_id: landlord,
            tenant_id,
            lease_id: request.lease_id,
            listing_id,
            amount: request.amount,
            payment_type: request.payment_type,
            status: PaymentStatus::Pending,
            due_date: request.due_date,
            paid_date: None,
            description: request
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            receipt: None,
            created_at: now,
        })?;
        info!(payment = %payment.id, amount = payment.amount.0, "payment created");

        if let Some(tenant) = payment.tenant_id {
            self.stores.notify(Notification::new(
                tenant,
                NotificationKind::PaymentDue,
                format!(
                    "{} {} due on {}",
                    format_usd(payment.amount),
                    payment.payment_type.label().to_lowercase(),
                    payment.due_date
                ),
                now,
            ))?;
        }
        Ok(payment)
    }

    fn billed_parties(
        &self,
        landlord: UserId,
        request: &NewPayment,
    ) -> Result<(Option<UserId>, Option<ListingId>), ServiceError> {
        if let Some(lease_id) = &request.lease_id {
            let lease = load(self.stores.leases.as_ref(), lease_id)?;
            if lease.landlord_id != landlord {
                return Err(BusinessRule::ForeignLease.into());
            }
            if request.tenant_id.is_some_and(|tenant| Some(tenant) != lease.tenant_id) {
                return Err(ServiceError::Invalid("Tenant does not match the lease".to_string()));
            }
            if request.listing_id.is_some_and(|listing| listing != lease.listing_id) {
                return Err(ServiceError::Invalid("Listing does not match the lease".to_string()));
            }
            return Ok((lease.tenant_id, Some(lease.listing_id)));
        }

        if let Some(listing_id) = &request.listing_id {
            let listing = load(self.stores.listings.as_ref(), listing_id)?;
            if listing.landlord_id != landlord {
                return Err(ServiceError::Forbidden);
            }
        }
        if let Some(tenant_id) = &request.tenant_id {
            let tenant = load(self.stores.users.as_ref(), tenant_id)?;
            if tenant.role != Role::Tenant {
                return Err(ServiceError::Invalid("Payments can only be billed to a tenant".to_string()));
            }
        }
        Ok((request.tenant_id, request.listing_id))
    }

    /// Payments the caller may see: billed by a landlord, or owed by a tenant.
    pub fn visible(&self, session: &Session) -> Result<Vec<Payment>, ServiceError> {
        let user = session.user_id;
        if session.is_landlord() {
            Ok(self.stores.payments.find(&|payment: &Payment| payment.landlord_id == user)?)
        } else {
            Ok(self
                .stores
                .payments
                .find(&|payment: &Payment| payment.tenant_id == Some(user))?)
        }
    }

    /// Filtered, paged listing with summary cards over every matching record.
    pub fn accounting(
        &self,
        session: &Session,
        filters: PaymentFilters,
        page: usize,
        per_page: usize,
        today: NaiveDate,
    ) -> Result<AccountingView, ServiceError> {
        let payments = self.visible(session)?;
        Ok(AccountingView::build(&payments, filters, page, per_page, today))
    }

    pub fn get(&self, session: &Session, id: &PaymentId) -> Result<Payment, ServiceError> {
        let payment = load(self.stores.payments.as_ref(), id)?;
        if payment.landlord_id != session.user_id && payment.tenant_id != Some(session.user_id) {
            return Err(ServiceError::Forbidden);
        }
        Ok(payment)
    }

    fn billed_by(&self, session: &Session, id: &PaymentId) -> Result<Payment, ServiceError> {
        let landlord = session.require_landlord()?;
        let payment = load(self.stores.payments.as_ref(), id)?;
        if payment.landlord_id != landlord {
            return Err(ServiceError::Forbidden);
        }
        Ok(payment)
    }

    pub fn mark_paid(&self, session: &Session, id: &PaymentId, today: NaiveDate) -> Result<Payment, ServiceError> {
        let payment = self.billed_by(session, id)?;
        transition(self.stores.payments.as_ref(), payment, PaymentStatus::Paid, |payment| {
            payment.paid_date = Some(today);
        })
    }

    pub fn mark_failed(&self, session: &Session, id: &PaymentId) -> Result<Payment, ServiceError> {
        let payment = self.billed_by(session, id)?;
        transition(self.stores.payments.as_ref(), payment, PaymentStatus::Failed, |_| {})
    }

    /// Puts a failed payment back to pending.
    pub fn rebill(&self, session: &Session, id: &PaymentId, due_date: Option<NaiveDate>) -> Result<Payment, ServiceError> {
        let payment = self.billed_by(session, id)?;
        transition(self.stores.payments.as_ref(), payment, PaymentStatus::Pending, |payment| {
            if let Some(due_date) = due_date {
                payment.due_date = due_date;
            }
            payment.receipt = None;
        })
    }

    pub fn cancel(&self, session: &Session, id: &PaymentId) -> Result<Payment, ServiceError> {
        let payment = self.billed_by(session, id)?;
        transition(self.stores.payments.as_ref(), payment, PaymentStatus::Cancelled, |_| {})
    }

    /// Tenant attaches proof of payment. A rejected receipt may be replaced;
    /// one already awaiting review may not.
    pub fn submit_receipt(
        &self,
        session: &Session,
        id: &PaymentId,
        receipt_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Payment, ServiceError> {
        let tenant = session.require_tenant()?;
        let url = require_upload(
            &self.uploads,
            UploadKind::PaymentReceipt,
            Some(tenant),
            "receipt_url",
            "Receipt",
            receipt_url,
        )?;
        let mut payment = load(self.stores.payments.as_ref(), id)?;
        if payment.tenant_id != Some(tenant) {
            return Err(ServiceError::Forbidden);
        }
        if payment.status != PaymentStatus::Pending {
            return Err(ServiceError::InvalidTransition {
                entity: "payment",
                from: payment.status.label(),
                to: "PAID",
            });
        }
        if payment.has_receipt_awaiting_review() {
            return Err(ServiceError::Conflict("a receipt is already awaiting review".to_string()));
        }

        payment.receipt = Some(Receipt {
            url,
            submitted_at: now,
            review: ReceiptReview::Submitted,
        });
        self.stores
            .payments
            .update_if(payment.clone(), &|stored: &Payment| {
                stored.status == PaymentStatus::Pending && !stored.has_receipt_awaiting_review()
            })
            .map_err(stale_as_conflict)?;
        info!(payment = %payment.id, "receipt submitted");

        self.stores.notify(Notification::new(
            payment.landlord_id,
            NotificationKind::ReceiptSubmitted,
            format!("Receipt submitted for {}", format_usd(payment.amount)),
            now,
        ))?;
        Ok(payment)
    }

    /// Approving the receipt settles the payment.
    pub fn approve_receipt(&self, session: &Session, id: &PaymentId, now: DateTime<Utc>) -> Result<Payment, ServiceError> {
        let payment = self.billed_by(session, id)?;
        if !payment.has_receipt_awaiting_review() {
            return Err(BusinessRule::NoReceiptToReview.into());
        }

        let today = now.date_naive();
        let payment = transition(self.stores.payments.as_ref(), payment, PaymentStatus::Paid, |payment| {
            payment.paid_date = Some(today);
            if let Some(receipt) = payment.receipt.as_mut() {
                receipt.review = ReceiptReview::Approved;
            }
        })?;
        self.notify_review(&payment, "approved", now)?;
        Ok(payment)
    }

    /// Rejecting keeps the payment pending so the tenant can resubmit.
    pub fn reject_receipt(
        &self,
        session: &Session,
        id: &PaymentId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Payment, ServiceError> {
        let reason = require_text("reason", "Reason", reason)?;
        let mut payment = self.billed_by(session, id)?;
        if !payment.has_receipt_awaiting_review() {
            return Err(BusinessRule::NoReceiptToReview.into());
        }

        if let Some(receipt) = payment.receipt.as_mut() {
            receipt.review = ReceiptReview::Rejected { reason };
        }
        self.stores
            .payments
            .update_if(payment.clone(), &|stored: &Payment| {
                stored.status == PaymentStatus::Pending && stored.has_receipt_awaiting_review()
            })
            .map_err(stale_as_conflict)?;
        info!(payment = %payment.id, "receipt rejected");

        self.notify_review(&payment, "rejected", now)?;
        Ok(payment)
    }

    fn notify_review(&self, payment: &Payment, verdict: &str, now: DateTime<Utc>) -> Result<(), ServiceError> {
        let Some(tenant) = payment.tenant_id else {
            return Ok(());
        };
        self.stores.notify(Notification::new(
            tenant,
            NotificationKind::ReceiptReviewed,
            format!("Your receipt for {} was {verdict}", format_usd(payment.amount)),
            now,
        ))
    }
}

fn stale_as_conflict(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Stale => ServiceError::Conflict("payment was changed by another request".to_string()),
        other => other.into(),
    }
}
