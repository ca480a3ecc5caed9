//! Input validation for workflow payloads
//!
//! Client payloads arrive with every field optional so that missing or
//! malformed input produces a field-level message instead of a decode failure.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// A field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Default number of sales returned by a listing
pub const DEFAULT_SALES_LIMIT: i64 = 100;

/// Upper bound for any listing limit
pub const MAX_LISTING_LIMIT: i64 = 1000;

/// Require a quantity that is present and at least 1
pub fn require_positive_quantity(
    field: &'static str,
    value: Option<i64>,
    message: &str,
) -> ValidationResult<i32> {
    match value {
        Some(v) if v >= 1 => {
            i32::try_from(v).map_err(|_| ValidationError::new(field, "Quantity is too large"))
        }
        _ => Err(ValidationError::new(field, message)),
    }
}

/// Accept a missing count as 0, reject negatives
pub fn non_negative_count(field: &'static str, value: Option<i64>) -> ValidationResult<i32> {
    match value {
        None => Ok(0),
        Some(v) if v < 0 => Err(ValidationError::new(field, format!("{} cannot be negative", field))),
        Some(v) => i32::try_from(v).map_err(|_| ValidationError::new(field, "Value is too large")),
    }
}

/// Reject negative prices
pub fn validate_price(field: &'static str, price: Decimal) -> ValidationResult<Decimal> {
    if price < Decimal::ZERO {
        return Err(ValidationError::new(field, "Price cannot be negative"));
    }
    Ok(price)
}

/// Trim a required text field and reject it when blank
pub fn require_text(field: &'static str, value: Option<&str>, message: &str) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::new(field, message)),
    }
}

/// Parse a `YYYY-MM-DD` date filter
pub fn parse_date_filter(value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new("date", "Date must be formatted as YYYY-MM-DD"))
}

/// Resolve a listing limit: default when absent or below 1, capped at the maximum
pub fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    match limit {
        Some(l) if l >= 1 => l.min(MAX_LISTING_LIMIT),
        _ => default,
    }
}

/// Minimum length for account passwords
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Reject passwords shorter than [`MIN_PASSWORD_LENGTH`]
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_quantity_rules() {
        assert_eq!(require_positive_quantity("q", Some(3), "bad"), Ok(3));
        assert_eq!(
            require_positive_quantity("q", Some(0), "bad").unwrap_err().message,
            "bad"
        );
        assert!(require_positive_quantity("q", None, "bad").is_err());
        assert!(require_positive_quantity("q", Some(i64::MAX), "bad").is_err());
    }

    #[test]
    fn counts_default_to_zero() {
        assert_eq!(non_negative_count("suggestedQuantity", None), Ok(0));
        assert_eq!(non_negative_count("suggestedQuantity", Some(12)), Ok(12));
        assert!(non_negative_count("suggestedQuantity", Some(-1)).is_err());
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(require_text("name", Some("  Soap "), "required"), Ok("Soap".into()));
        assert!(require_text("name", Some("   "), "required").is_err());
        assert!(require_text("name", None, "required").is_err());
    }

    #[test]
    fn date_filter_parses_iso_dates() {
        assert_eq!(
            parse_date_filter("2024-12-23"),
            Ok(NaiveDate::from_ymd_opt(2024, 12, 23).unwrap())
        );
        assert!(parse_date_filter("23/12/2024").is_err());
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None, DEFAULT_SALES_LIMIT), 100);
        assert_eq!(clamp_limit(Some(0), DEFAULT_SALES_LIMIT), 100);
        assert_eq!(clamp_limit(Some(5), DEFAULT_SALES_LIMIT), 5);
        assert_eq!(clamp_limit(Some(50_000), DEFAULT_SALES_LIMIT), MAX_LISTING_LIMIT);
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("demo123").is_ok());
        assert_eq!(validate_password("abc").unwrap_err().field, "password");
    }
}
