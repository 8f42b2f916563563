//! Field validators for Rentdesk forms
//!
//! Every validator returns `None` when the value is acceptable and a
//! message suitable for display next to the field otherwise. Validators
//! are pure; nothing here touches the network.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid name pattern"));

static AMOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]{1,2})?$").expect("valid amount pattern"));

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s()+-]+$").expect("valid phone pattern"));

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum name length, in characters
pub const MIN_NAME_LENGTH: usize = 2;

/// Minimum number of digits in a phone number
pub const MIN_PHONE_DIGITS: usize = 10;

pub fn validate_email(email: &str) -> Option<String> {
    if email.is_empty() {
        return Some("Email is required".to_string());
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Some("Please enter a valid email address".to_string());
    }
    None
}

pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Some("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain at least one number".to_string());
    }
    None
}

pub fn validate_confirm_password(password: &str, confirm_password: &str) -> Option<String> {
    if confirm_password.is_empty() {
        return Some("Please confirm your password".to_string());
    }
    if password != confirm_password {
        return Some("Passwords do not match".to_string());
    }
    None
}

/// Validate a personal name; `label` names the field in messages
/// (e.g. "First name")
pub fn validate_name(name: &str, label: &str) -> Option<String> {
    if name.is_empty() {
        return Some(format!("{} is required", label));
    }
    if name.chars().count() < MIN_NAME_LENGTH {
        return Some(format!(
            "{} must be at least {} characters long",
            label, MIN_NAME_LENGTH
        ));
    }
    if !NAME_PATTERN.is_match(name) {
        return Some(format!(
            "{} can only contain letters, spaces, hyphens, and apostrophes",
            label
        ));
    }
    None
}

/// Phone numbers are optional; an empty value is valid
pub fn validate_phone(phone: &str) -> Option<String> {
    if phone.is_empty() {
        return None;
    }
    if !PHONE_PATTERN.is_match(phone) {
        return Some("Please enter a valid phone number".to_string());
    }
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < MIN_PHONE_DIGITS {
        return Some(format!(
            "Phone number must be at least {} digits",
            MIN_PHONE_DIGITS
        ));
    }
    None
}

/// Dates are optional; a non-empty value must parse and must not lie in
/// the future
pub fn validate_date(date: &str) -> Option<String> {
    validate_date_at(date, Utc::now())
}

/// [`validate_date`] against a fixed "now"
pub fn validate_date_at(date: &str, now: DateTime<Utc>) -> Option<String> {
    if date.is_empty() {
        return None;
    }

    // Plain dates are midnight UTC, like an HTML date input
    let parsed = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(day) => day.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc()),
        Err(_) => DateTime::parse_from_rfc3339(date)
            .ok()
            .map(|stamp| stamp.with_timezone(&Utc)),
    };

    match parsed {
        None => Some("Please enter a valid date".to_string()),
        Some(when) if when > now => Some("Date cannot be in the future".to_string()),
        Some(_) => None,
    }
}

pub fn validate_required(value: &str, label: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{} is required", label));
    }
    None
}

/// A non-negative decimal with at most two fractional digits, such as a
/// rent amount or a room size. Empty values are accepted only when the
/// field is optional.
pub fn validate_amount(value: &str, label: &str, required: bool) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return if required {
            Some(format!("{} is required", label))
        } else {
            None
        };
    }
    if !AMOUNT_PATTERN.is_match(value) {
        return Some(format!(
            "{} must be a non-negative number with at most 2 decimal places",
            label
        ));
    }
    None
}

/// Field errors of one form, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a validator for `field`
    pub fn check(&mut self, field: &str, outcome: Option<String>) -> &mut Self {
        if let Some(message) = outcome {
            self.add(field, message);
        }
        self
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push((field.to_string(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The first message recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// `Ok(())` when no field failed
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationErrors {}
