//! Pure field validators. Each returns `None` for a valid value or the inline
//! message to show under the field.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::money::{format_usd, parse_amount, AmountParseError, Cents};

pub type Validator = fn(&str) -> Option<String>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn required(label: &str, value: &str) -> Option<String> {
    value
        .trim()
        .is_empty()
        .then(|| format!("{label} is required"))
}

fn too_large(label: &str) -> String {
    format!("{label} must be at most {}", format_usd(Cents::MAX_AMOUNT))
}

/// Amounts that must be strictly positive (income, rent).
pub fn positive_amount(label: &str, value: &str) -> Option<String> {
    if let Some(message) = required(label, value) {
        return Some(message);
    }
    match parse_amount(value) {
        Ok(amount) if amount.is_positive() => None,
        Ok(_) => Some(format!("{label} must be greater than 0")),
        Err(AmountParseError::TooLarge(_)) => Some(too_large(label)),
        Err(_) => Some(format!("{label} must be a valid number")),
    }
}

/// Amounts that may be zero but never negative (deposits).
pub fn non_negative_amount(label: &str, value: &str) -> Option<String> {
    if let Some(message) = required(label, value) {
        return Some(message);
    }
    match parse_amount(value) {
        Ok(amount) if amount.0 >= 0 => None,
        Ok(_) => Some(format!("{label} cannot be negative")),
        Err(AmountParseError::TooLarge(_)) => Some(too_large(label)),
        Err(_) => Some(format!("{label} must be a valid number")),
    }
}

pub fn min_count(label: &str, min: u32, value: &str) -> Option<String> {
    if let Some(message) = required(label, value) {
        return Some(message);
    }
    match value.trim().parse::<i64>() {
        Ok(count) if count >= i64::from(min) => None,
        Ok(_) => Some(format!("{label} must be at least {min}")),
        Err(_) => Some(format!("{label} must be a whole number")),
    }
}

pub fn date(label: &str, value: &str) -> Option<String> {
    if let Some(message) = required(label, value) {
        return Some(message);
    }
    parse_date(value)
        .is_none()
        .then(|| format!("{label} must be a valid date (YYYY-MM-DD)"))
}

pub fn email_address(label: &str, value: &str) -> Option<String> {
    if let Some(message) = required(label, value) {
        return Some(message);
    }
    let trimmed = value.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };
    (!valid).then(|| "Enter a valid email address".to_string())
}

pub fn phone_number(label: &str, value: &str) -> Option<String> {
    if let Some(message) = required(label, value) {
        return Some(message);
    }
    let mut digits = 0;
    for ch in value.trim().chars() {
        match ch {
            '0'..='9' => digits += 1,
            ' ' | '-' | '(' | ')' | '+' | '.' => {}
            _ => return Some("Enter a valid phone number".to_string()),
        }
    }
    (!(10..=15).contains(&digits)).then(|| "Enter a valid phone number".to_string())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

// Field-specific validators used by the wizard step tables.

pub fn full_name(value: &str) -> Option<String> {
    required("Full name", value)
}

pub fn email(value: &str) -> Option<String> {
    email_address("Email", value)
}

pub fn phone(value: &str) -> Option<String> {
    phone_number("Phone number", value)
}

pub fn date_of_birth(value: &str) -> Option<String> {
    date("Date of birth", value)
}

pub fn monthly_income(value: &str) -> Option<String> {
    positive_amount("Monthly income", value)
}

pub fn number_of_tenants(value: &str) -> Option<String> {
    min_count("Number of tenants", 1, value)
}

pub fn move_in_date(value: &str) -> Option<String> {
    date("Move-in date", value)
}

pub fn employer(value: &str) -> Option<String> {
    required("Employer", value)
}

pub fn position(value: &str) -> Option<String> {
    required("Position", value)
}

pub fn employment_start_date(value: &str) -> Option<String> {
    date("Start date", value)
}

pub fn previous_address(value: &str) -> Option<String> {
    required("Previous address", value)
}

pub fn previous_landlord_name(value: &str) -> Option<String> {
    required("Landlord name", value)
}

pub fn previous_landlord_phone(value: &str) -> Option<String> {
    phone_number("Landlord phone", value)
}

pub fn listing_reference(value: &str) -> Option<String> {
    if let Some(message) = required("Property", value) {
        return Some(message);
    }
    Uuid::parse_str(value.trim())
        .is_err()
        .then(|| "Select a property".to_string())
}

pub fn tenant_name(value: &str) -> Option<String> {
    required("Tenant name", value)
}

pub fn tenant_email(value: &str) -> Option<String> {
    email_address("Tenant email", value)
}

pub fn lease_start_date(value: &str) -> Option<String> {
    date("Start date", value)
}

pub fn lease_end_date(value: &str) -> Option<String> {
    date("End date", value)
}

pub fn rent_amount(value: &str) -> Option<String> {
    positive_amount("Rent amount", value)
}

pub fn security_deposit(value: &str) -> Option<String> {
    non_negative_amount("Security deposit", value)
}

pub fn payment_due_day(value: &str) -> Option<String> {
    if let Some(message) = required("Payment due day", value) {
        return Some(message);
    }
    match value.trim().parse::<u8>() {
        Ok(day) if (1..=28).contains(&day) => None,
        _ => Some("Payment due day must be between 1 and 28".to_string()),
    }
}

pub fn landlord_signature(value: &str) -> Option<String> {
    required("Signature", value)
}

/// Late fee may be left blank; when given it must be a positive amount.
pub fn late_fee(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return None;
    }
    positive_amount("Late fee", value)
}
