//! Payment filtering, paging, and the summary cards of the accounting page.

mod filters;
mod summary;

pub use filters::{FilterChoice, Month, MonthParseError, PaymentFilters};
pub use summary::{
    AccountingSummary, AccountingView, CategoryTotal, Page, SummaryCard, DEFAULT_PER_PAGE,
    EMPTY_STATE, MAX_PER_PAGE,
};
