use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::domain::{ListingId, Payment, PaymentStatus, PaymentType};

const ALL: &str = "ALL";

/// One filter selection. `All` is spelled `"ALL"` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterChoice<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> FilterChoice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            FilterChoice::All => true,
            FilterChoice::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FilterChoice::All)
    }
}

impl<T: Serialize> Serialize for FilterChoice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterChoice::All => serializer.serialize_str(ALL),
            FilterChoice::Only(value) => value.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
enum AllKeyword {
    #[serde(rename = "ALL")]
    All,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireChoice<T> {
    All(AllKeyword),
    Only(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FilterChoice<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireChoice::deserialize(deserializer)? {
            WireChoice::All(AllKeyword::All) => FilterChoice::All,
            WireChoice::Only(value) => FilterChoice::Only(value),
        })
    }
}

/// Calendar month, written `2025-10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Month::of(date) == *self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a month (expected YYYY-MM)")]
pub struct MonthParseError(String);

impl FromStr for Month {
    type Err = MonthParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || MonthParseError(raw.to_string());
        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Month::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// The accounting filter dialog. Every filter starts at `ALL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentFilters {
    pub status: FilterChoice<PaymentStatus>,
    #[serde(rename = "type")]
    pub payment_type: FilterChoice<PaymentType>,
    pub listing: FilterChoice<ListingId>,
    pub month: FilterChoice<Month>,
}

impl PaymentFilters {
    /// Back to the never-filtered state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_unfiltered(&self) -> bool {
        self.status.is_all()
            && self.payment_type.is_all()
            && self.listing.is_all()
            && self.month.is_all()
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        let listing = match (&self.listing, payment.listing_id) {
            (FilterChoice::All, _) => true,
            (FilterChoice::Only(wanted), Some(actual)) => *wanted == actual,
            (FilterChoice::Only(_), None) => false,
        };
        let month = match self.month {
            FilterChoice::All => true,
            FilterChoice::Only(month) => month.contains(payment.due_date),
        };

        self.status.admits(&payment.status)
            && self.payment_type.admits(&payment.payment_type)
            && listing
            && month
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_matches_the_never_filtered_state() {
        let untouched = PaymentFilters::default();
        let mut filters = PaymentFilters {
            status: FilterChoice::Only(PaymentStatus::Paid),
            payment_type: FilterChoice::Only(PaymentType::Rent),
            listing: FilterChoice::Only(ListingId::new()),
            month: FilterChoice::Only("2025-10".parse().expect("month")),
        };
        assert!(!filters.is_unfiltered());

        filters.reset();
        assert_eq!(filters, untouched);
        assert!(filters.is_unfiltered());
        assert_eq!(
            serde_json::to_value(filters).expect("serialize"),
            serde_json::json!({"status": "ALL", "type": "ALL", "listing": "ALL", "month": "ALL"})
        );
    }

    #[test]
    fn filters_read_from_the_wire() {
        let filters: PaymentFilters = serde_json::from_value(serde_json::json!({
            "status": "PENDING",
            "type": "ALL",
            "month": "2025-10"
        }))
        .expect("deserialize");
        assert_eq!(filters.status, FilterChoice::Only(PaymentStatus::Pending));
        assert!(filters.payment_type.is_all());
        assert!(filters.listing.is_all());
        assert_eq!(filters.month, FilterChoice::Only(Month::new(2025, 10).expect("month")));
    }

    #[test]
    fn month_parsing() {
        assert_eq!("2025-10".parse::<Month>().expect("month").to_string(), "2025-10");
        assert!("2025-13".parse::<Month>().is_err());
        assert!("October".parse::<Month>().is_err());
    }
}
