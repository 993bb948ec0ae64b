use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Whole-cent amount. All rent, deposits, and payments are stored this way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// Largest amount accepted from user input: $10,000,000.00.
    pub const MAX_AMOUNT: Cents = Cents(1_000_000_000);

    pub const fn from_dollars(dollars: i64) -> Self {
        Cents(dollars * 100)
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn exceeds_max(self) -> bool {
        self.0 > Self::MAX_AMOUNT.0 || self.0 < -Self::MAX_AMOUNT.0
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_usd(*self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("'{0}' has more than two decimal places")]
    TooPrecise(String),
    #[error("'{0}' is larger than $10,000,000.00")]
    TooLarge(String),
}

/// Parse user-entered dollars ("1200", "1,200.5", "$1,200.50", "-5") into cents.
pub fn parse_amount(raw: &str) -> Result<Cents, AmountParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountParseError::Empty);
    }

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let cleaned: String = unsigned
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',')
        .collect();

    let not_a_number = || AmountParseError::NotANumber(raw.to_string());
    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(not_a_number());
    }
    if !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
    {
        return Err(not_a_number());
    }
    if fraction.len() > 2 {
        return Err(AmountParseError::TooPrecise(raw.to_string()));
    }

    let dollars: i64 = if whole.is_empty() {
        0
    } else {
        // Digits only, so a parse failure means overflow.
        whole
            .parse()
            .map_err(|_| AmountParseError::TooLarge(raw.to_string()))?
    };
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| not_a_number())? * 10,
        _ => fraction.parse().map_err(|_| not_a_number())?,
    };

    let total = dollars
        .checked_mul(100)
        .and_then(|value| value.checked_add(cents))
        .map(|total| Cents(if negative { -total } else { total }))
        .ok_or_else(|| AmountParseError::TooLarge(raw.to_string()))?;
    if total.exceeds_max() {
        return Err(AmountParseError::TooLarge(raw.to_string()));
    }

    Ok(total)
}

/// Render cents as US dollars with thousands separators, e.g. `$1,234.50`.
pub fn format_usd(amount: Cents) -> String {
    let sign = if amount.0 < 0 { "-" } else { "" };
    let absolute = amount.0.unsigned_abs();
    let dollars = (absolute / 100).to_string();
    let cents = absolute % 100;

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (index, digit) in dollars.chars().enumerate() {
        if index > 0 && (dollars.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents:02}")
}
