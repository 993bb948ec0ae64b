use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Entity, InsuranceId, LeaseId, StatusFlow, UserId};
use crate::money::Cents;

/// Verified policies are flagged this many days before they lapse.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsuranceStatus {
    Pending,
    Verified,
    Rejected,
    ExpiringSoon,
    Expired,
}

impl StatusFlow for InsuranceStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use InsuranceStatus::*;
        matches!(
            (self, next),
            (Pending, Verified)
                | (Pending, Rejected)
                | (Verified, ExpiringSoon)
                | (Verified, Expired)
                | (ExpiringSoon, Expired)
        )
    }

    fn label(self) -> &'static str {
        match self {
            InsuranceStatus::Pending => "PENDING",
            InsuranceStatus::Verified => "VERIFIED",
            InsuranceStatus::Rejected => "REJECTED",
            InsuranceStatus::ExpiringSoon => "EXPIRING_SOON",
            InsuranceStatus::Expired => "EXPIRED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurance {
    pub id: InsuranceId,
    pub tenant_id: UserId,
    pub landlord_id: UserId,
    pub lease_id: Option<LeaseId>,
    pub provider: String,
    pub policy_number: String,
    pub coverage_amount: Cents,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub document_url: String,
    pub status: InsuranceStatus,
    pub rejection_reason: Option<String>,
}

impl Insurance {
    /// Status as of `today`. Only verified policies age; pending and rejected
    /// policies keep their review status.
    pub fn effective_status(&self, today: NaiveDate) -> InsuranceStatus {
        match self.status {
            InsuranceStatus::Verified | InsuranceStatus::ExpiringSoon => {
                if today > self.end_date {
                    InsuranceStatus::Expired
                } else if today + Duration::days(EXPIRY_WARNING_DAYS) >= self.end_date {
                    InsuranceStatus::ExpiringSoon
                } else {
                    InsuranceStatus::Verified
                }
            }
            other => other,
        }
    }
}

impl Entity for Insurance {
    type Id = InsuranceId;

    const KIND: &'static str = "insurance policy";

    fn id(&self) -> &InsuranceId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInsurance {
    pub landlord_id: UserId,
    pub lease_id: Option<LeaseId>,
    pub provider: String,
    pub policy_number: String,
    pub coverage_amount: Cents,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub document_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(status: InsuranceStatus) -> Insurance {
        Insurance {
            id: InsuranceId::new(),
            tenant_id: UserId::new(),
            landlord_id: UserId::new(),
            lease_id: None,
            provider: "Acme Mutual".to_string(),
            policy_number: "HO4-1182".to_string(),
            coverage_amount: Cents::from_dollars(100_000),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid"),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid"),
            document_url: "https://files.test/policy.pdf".to_string(),
            status,
            rejection_reason: None,
        }
    }

    #[test]
    fn verified_policies_age_towards_expiry() {
        let verified = policy(InsuranceStatus::Verified);
        let day = |m, d| NaiveDate::from_ymd_opt(2025, m, d).expect("valid");

        assert_eq!(verified.effective_status(day(6, 1)), InsuranceStatus::Verified);
        assert_eq!(
            verified.effective_status(day(12, 1)),
            InsuranceStatus::ExpiringSoon
        );
        assert_eq!(
            verified.effective_status(NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid")),
            InsuranceStatus::Expired
        );
    }

    #[test]
    fn pending_policies_keep_review_status() {
        let pending = policy(InsuranceStatus::Pending);
        let later = NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid");
        assert_eq!(pending.effective_status(later), InsuranceStatus::Pending);
    }
}
