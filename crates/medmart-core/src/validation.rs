//! # Validation Module
//!
//! Input validation utilities for MedMart.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/api)                                      │
//! │  └── Type validation (serde deserialization)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Account fields (email, password, names)                           │
//! │  ├── Catalog fields (sku, product name, price, stock)                  │
//! │  └── Checkout forms (address, card number, expiry, cvc)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE(email), UNIQUE(user_id, product_id)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use medmart_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("GLV-NIT-M").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum password length (argon2 input stays bounded).
pub const MAX_PASSWORD_LEN: usize = 128;

// =============================================================================
// Generic Helpers
// =============================================================================

/// Trims `value` and rejects it when empty or longer than `max` characters.
///
/// Returns the trimmed string.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Same as [`validate_required`] but empty input yields `None`.
pub fn validate_optional(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => validate_required(field, v, max).map(Some),
    }
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates an email address and returns it lowercased.
///
/// ## Rules
/// - Exactly one `@`, non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace, at most 254 characters
///
/// ## Example
/// ```rust
/// use medmart_core::validation::validate_email;
///
/// assert_eq!(validate_email(" Nurse@Clinic.org ").unwrap(), "nurse@clinic.org");
/// assert!(validate_email("nurse.clinic.org").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = validate_required("email", email, 254)?.to_lowercase();

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format("email", "must not contain spaces"));
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return Err(ValidationError::invalid_format("email", "missing @")),
    };

    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::invalid_format("email", "malformed address"));
    }

    match domain.find('.') {
        Some(idx) if idx > 0 && !domain.ends_with('.') => Ok(email),
        _ => Err(ValidationError::invalid_format("email", "malformed domain")),
    }
}

/// Validates a password.
///
/// ## Rules
/// - Between [`MIN_PASSWORD_LEN`] and [`MAX_PASSWORD_LEN`] characters
/// - Not trimmed: leading/trailing spaces count
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();

    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LEN,
        });
    }

    Ok(())
}

pub fn validate_full_name(name: &str) -> ValidationResult<String> {
    validate_required("full name", name, 120)
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use medmart_core::validation::validate_sku;
///
/// assert!(validate_sku("SYR-10ML-LL").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<String> {
    let sku = validate_required("sku", sku, 50)?;

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(sku)
}

/// Validates a product name (1..=200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    validate_required("name", name, 200)
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - No upper bound; stock is checked when the order is placed
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a listing price in cents.
///
/// ## Example
/// ```rust
/// use medmart_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level (zero allowed: listed but sold out).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Payment Validators
// =============================================================================

/// Normalizes and validates a card number.
///
/// Spaces and hyphens are stripped. The remaining digits must be 13 to 19
/// long and pass the Luhn checksum.
///
/// ## Example
/// ```rust
/// use medmart_core::validation::validate_card_number;
///
/// assert_eq!(validate_card_number("4242 4242 4242 4242").unwrap(), "4242424242424242");
/// assert!(validate_card_number("4242 4242 4242 4241").is_err());
/// ```
pub fn validate_card_number(number: &str) -> ValidationResult<String> {
    let digits: String = number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if digits.is_empty() {
        return Err(ValidationError::required("card number"));
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format("card number", "must contain only digits"));
    }

    if !(13..=19).contains(&digits.len()) {
        return Err(ValidationError::invalid_format("card number", "must be 13 to 19 digits"));
    }

    if !luhn_valid(&digits) {
        return Err(ValidationError::invalid_format("card number", "checksum failed"));
    }

    Ok(digits)
}

/// Luhn mod-10 checksum over an all-digit string.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// Validates a card expiry in `MM/YY` (or `MM/YYYY`) form.
///
/// A card is valid through the last day of its expiry month, so an expiry
/// equal to `today`'s month passes. Returns `(month, four-digit year)`.
pub fn validate_expiry(expiry: &str, today: NaiveDate) -> ValidationResult<(u32, i32)> {
    let expiry = validate_required("expiry", expiry, 7)?;

    let (mm, yy) = expiry
        .split_once('/')
        .ok_or_else(|| ValidationError::invalid_format("expiry", "expected MM/YY"))?;

    let month: u32 = mm
        .trim()
        .parse()
        .map_err(|_| ValidationError::invalid_format("expiry", "expected MM/YY"))?;
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "expiry month".to_string(),
            min: 1,
            max: 12,
        });
    }

    let yy = yy.trim();
    let year: i32 = yy
        .parse()
        .map_err(|_| ValidationError::invalid_format("expiry", "expected MM/YY"))?;
    let year = match yy.len() {
        2 => 2000 + year,
        4 => year,
        _ => return Err(ValidationError::invalid_format("expiry", "expected MM/YY")),
    };

    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::invalid_format("expiry", "card has expired"));
    }

    Ok((month, year))
}

/// Validates a card security code (3 or 4 digits).
pub fn validate_cvc(cvc: &str) -> ValidationResult<()> {
    let cvc = cvc.trim();

    if cvc.is_empty() {
        return Err(ValidationError::required("cvc"));
    }

    if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format("cvc", "must be 3 or 4 digits"));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
