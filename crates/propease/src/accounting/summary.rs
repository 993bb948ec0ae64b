use chrono::NaiveDate;
use serde::Serialize;

use super::PaymentFilters;
use crate::domain::{Payment, PaymentStatus, PaymentType};
use crate::money::{format_usd, Cents};

pub const EMPTY_STATE: &str = "No payments found";

pub const DEFAULT_PER_PAGE: usize = 10;

pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slices `items` into 1-based pages of at most [`MAX_PER_PAGE`].
    /// Out-of-range pages come back empty.
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let page = page.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page);
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCard {
    pub label: &'static str,
    pub amount: Cents,
    pub display: String,
    pub count: usize,
}

impl SummaryCard {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            amount: Cents::ZERO,
            display: format_usd(Cents::ZERO),
            count: 0,
        }
    }

    fn add(&mut self, amount: Cents) {
        self.amount += amount;
        self.count += 1;
        self.display = format_usd(self.amount);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub payment_type: PaymentType,
    pub label: &'static str,
    pub amount: Cents,
    pub display: String,
}

/// Cards at the top of the accounting page. Computed over every matching
/// record, not just the visible page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingSummary {
    pub collected: SummaryCard,
    pub pending: SummaryCard,
    pub overdue: SummaryCard,
    /// Collected amount per payment type; every type is always listed.
    pub breakdown: Vec<CategoryTotal>,
}

impl AccountingSummary {
    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a Payment>, today: NaiveDate) -> Self {
        let mut collected = SummaryCard::new("Total collected");
        let mut pending = SummaryCard::new("Pending");
        let mut overdue = SummaryCard::new("Overdue");
        let mut per_type = PaymentType::ordered().map(|payment_type| (payment_type, Cents::ZERO));

        for payment in payments {
            match payment.status {
                PaymentStatus::Paid => {
                    collected.add(payment.amount);
                    if let Some((_, total)) = per_type
                        .iter_mut()
                        .find(|(payment_type, _)| *payment_type == payment.payment_type)
                    {
                        *total += payment.amount;
                    }
                }
                PaymentStatus::Pending if payment.is_overdue(today) => overdue.add(payment.amount),
                PaymentStatus::Pending => pending.add(payment.amount),
                PaymentStatus::Failed | PaymentStatus::Cancelled => {}
            }
        }

        let breakdown = per_type
            .into_iter()
            .map(|(payment_type, amount)| CategoryTotal {
                payment_type,
                label: payment_type.label(),
                amount,
                display: format_usd(amount),
            })
            .collect();

        Self {
            collected,
            pending,
            overdue,
            breakdown,
        }
    }
}

/// Everything the accounting page renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingView {
    pub filters: PaymentFilters,
    pub summary: AccountingSummary,
    pub payments: Page<Payment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<&'static str>,
}

impl AccountingView {
    pub fn build(
        payments: &[Payment],
        filters: PaymentFilters,
        page: usize,
        per_page: usize,
        today: NaiveDate,
    ) -> Self {
        let mut matching: Vec<Payment> = payments
            .iter()
            .filter(|payment| filters.matches(payment))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.due_date.cmp(&a.due_date).then(b.created_at.cmp(&a.created_at)));

        let summary = AccountingSummary::from_payments(&matching, today);
        let empty_state = matching.is_empty().then_some(EMPTY_STATE);

        Self {
            filters,
            summary,
            payments: Page::paginate(matching, page, per_page),
            empty_state,
        }
    }
}
