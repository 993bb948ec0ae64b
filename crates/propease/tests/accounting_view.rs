use chrono::{NaiveDate, TimeZone, Utc};
use propease::accounting::{AccountingView, FilterChoice, Month, PaymentFilters, EMPTY_STATE};
use propease::domain::{ListingId, Payment, PaymentId, PaymentStatus, PaymentType, UserId};
use propease::money::Cents;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn ledger() -> (ListingId, Vec<Payment>) {
    let landlord = UserId::new();
    let maple = ListingId::new();
    let birch = ListingId::new();
    let record = |listing: ListingId,
                  amount: i64,
                  payment_type: PaymentType,
                  status: PaymentStatus,
                  due: NaiveDate| Payment {
        id: PaymentId::new(),
        landlord_id: landlord,
        tenant_id: Some(UserId::new()),
        lease_id: None,
        listing_id: Some(listing),
        amount: Cents(amount),
        payment_type,
        status,
        due_date: due,
        paid_date: (status == PaymentStatus::Paid).then_some(due),
        description: None,
        receipt: None,
        created_at: Utc.with_ymd_and_hms(2025, 8, 20, 12, 0, 0).unwrap(),
    };

    let payments = vec![
        record(maple, 145_000, PaymentType::Rent, PaymentStatus::Paid, date(2025, 9, 1)),
        record(maple, 145_000, PaymentType::Rent, PaymentStatus::Pending, date(2025, 10, 1)),
        record(maple, 5_000, PaymentType::LateFee, PaymentStatus::Pending, date(2025, 10, 20)),
        record(birch, 120_000, PaymentType::Deposit, PaymentStatus::Paid, date(2025, 9, 15)),
        record(birch, 8_250, PaymentType::Utility, PaymentStatus::Cancelled, date(2025, 10, 5)),
    ];
    (maple, payments)
}

#[test]
fn empty_ledger_shows_zero_for_every_category() {
    let view = AccountingView::build(&[], PaymentFilters::default(), 1, 10, date(2025, 10, 15));

    assert_eq!(view.empty_state, Some(EMPTY_STATE));
    assert_eq!(EMPTY_STATE, "No payments found");
    assert_eq!(view.summary.collected.display, "$0.00");
    assert_eq!(view.summary.pending.display, "$0.00");
    assert_eq!(view.summary.overdue.display, "$0.00");
    assert_eq!(view.summary.breakdown.len(), PaymentType::ordered().len());
    assert!(view.summary.breakdown.iter().all(|category| category.display == "$0.00"));
    assert_eq!(view.payments.total_items, 0);
}

#[test]
fn cards_split_collected_pending_and_overdue() {
    let (_, payments) = ledger();

    let view = AccountingView::build(&payments, PaymentFilters::default(), 1, 10, date(2025, 10, 15));

    assert_eq!(view.empty_state, None);
    assert_eq!(view.summary.collected.display, "$2,650.00");
    assert_eq!(view.summary.collected.count, 2);
    assert_eq!(view.summary.overdue.display, "$1,450.00");
    assert_eq!(view.summary.pending.display, "$50.00");
    let utility = view
        .summary
        .breakdown
        .iter()
        .find(|category| category.payment_type == PaymentType::Utility)
        .expect("utility always listed");
    assert_eq!(utility.display, "$0.00");
}

#[test]
fn filters_narrow_the_summary_and_reset_restores_it() {
    let (maple, payments) = ledger();
    let today = date(2025, 10, 15);
    let unfiltered = AccountingView::build(&payments, PaymentFilters::default(), 1, 10, today);

    let mut filters = PaymentFilters {
        listing: FilterChoice::Only(maple),
        month: FilterChoice::Only(Month::of(date(2025, 10, 1))),
        ..PaymentFilters::default()
    };
    let narrowed = AccountingView::build(&payments, filters, 1, 10, today);
    assert_eq!(narrowed.payments.total_items, 2);
    assert_eq!(narrowed.summary.collected.display, "$0.00");

    filters.payment_type = FilterChoice::Only(PaymentType::Deposit);
    let nothing = AccountingView::build(&payments, filters, 1, 10, today);
    assert_eq!(nothing.empty_state, Some(EMPTY_STATE));

    filters.reset();
    assert!(filters.is_unfiltered());
    assert_eq!(AccountingView::build(&payments, filters, 1, 10, today), unfiltered);
}

#[test]
fn pages_are_ordered_by_due_date_descending() {
    let (_, payments) = ledger();

    let first = AccountingView::build(&payments, PaymentFilters::default(), 1, 2, date(2025, 10, 15));
    let second = AccountingView::build(&payments, PaymentFilters::default(), 2, 2, date(2025, 10, 15));

    assert_eq!(first.payments.total_pages, 3);
    assert_eq!(first.payments.items[0].due_date, date(2025, 10, 20));
    assert_eq!(first.payments.items[1].due_date, date(2025, 10, 5));
    assert_eq!(second.payments.items[0].due_date, date(2025, 10, 1));
    assert_eq!(first.summary, second.summary);
}
