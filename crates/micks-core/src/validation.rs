//! # Validation Module
//!
//! Input validation utilities for Micks Calculadora.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Intake form / admin UI                                       │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler → SalesService (Rust)                           │
//! │  ├── Type validation (deserialization, signed counts)                  │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── CHECK (count >= 0) constraints                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! String validators return the trimmed value so callers store exactly what
//! was checked.
//!
//! ## Usage
//! ```rust
//! use micks_core::plan::DeviceKind;
//! use micks_core::validation::{validate_device_count, validate_email};
//!
//! assert_eq!(validate_device_count(DeviceKind::Cellphones, 3).unwrap(), 3);
//! assert!(validate_device_count(DeviceKind::Cellphones, -1).is_err());
//! assert!(validate_email("ana@example.com").is_ok());
//! ```

use crate::error::ValidationError;
use crate::plan::DeviceKind;
use crate::{MAX_DEVICE_COUNT, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PHONE_LEN, MIN_PHONE_DIGITS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required_trimmed<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
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

    Ok(value)
}

/// Validates a customer name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 120 characters
/// - No control characters (the name ends up in e-mails and spreadsheets)
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = required_trimmed("name", name, MAX_NAME_LEN)?;

    if name.chars().any(char::is_control) {
        return Err(ValidationError::invalid_format(
            "name",
            "must not contain control characters",
        ));
    }

    Ok(name.to_string())
}

/// Validates an e-mail address.
///
/// ## Rules
/// - Must not be empty, at most 255 characters
/// - Shape `local@domain.tld`: exactly one `@`, no whitespace, and a domain
///   with a dot that is neither leading nor trailing
///
/// Deliverability is not checked.
///
/// ```rust
/// use micks_core::validation::validate_email;
///
/// assert_eq!(validate_email("  ana@example.com ").unwrap(), "ana@example.com");
/// assert!(validate_email("ana@localhost").is_err());
/// assert!(validate_email("ana example@x.com").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = required_trimmed("email", email, MAX_EMAIL_LEN)?;
    let invalid = || ValidationError::invalid_format("email", "must look like name@domain.tld");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let domain_ok = domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.starts_with('.');
    if !domain_ok {
        return Err(invalid());
    }

    Ok(email.to_string())
}

/// Validates a phone number.
///
/// ## Rules
/// - Must not be empty, at most 20 characters
/// - Digits plus `+ ( ) -` and spaces only
/// - At least 8 digits
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = required_trimmed("phone", phone, MAX_PHONE_LEN)?;

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | ' '))
    {
        return Err(ValidationError::invalid_format(
            "phone",
            "must contain only digits, spaces and + ( ) -",
        ));
    }

    if phone.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
        return Err(ValidationError::invalid_format(
            "phone",
            format!("must contain at least {MIN_PHONE_DIGITS} digits"),
        ));
    }

    Ok(phone.to_string())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 120 characters, the longest name that could match
///
/// ## Returns
/// The trimmed query, or `None` when nothing is left to filter on.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

/// Folds a customer name into its search and sort key.
///
/// Lowercases with Unicode rules and drops the diacritics of Latin letters,
/// so `"Ângela"`, `"ÂNGELA"` and `"angela"` share the key `"angela"`.
/// Letters outside that set are only lowercased.
pub fn fold_name(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ñ' => 'n',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ý' | 'ÿ' => 'y',
            other => other,
        })
        .collect()
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a device count.
///
/// ## Rules
/// - Must be non-negative (rejected, never clamped)
/// - Must not exceed MAX_DEVICE_COUNT (10 000)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Intake form: "How many smart TVs?"                                     │
/// │                                                                         │
/// │  User enters: -2                                                        │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_device_count(SmartTvs, -2) ← THIS FUNCTION                   │
/// │       │                                                                 │
/// │       ├── n < 0?      → Error: "smart_tvs must not be negative"        │
/// │       │                                                                 │
/// │       ├── n > 10000?  → Error: "smart_tvs must be between 0 and 10000" │
/// │       │                                                                 │
/// │       └── OK → u32 count, ready for compute()                          │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_device_count(kind: DeviceKind, count: i64) -> ValidationResult<u32> {
    if count < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: kind.as_str().to_string(),
        });
    }

    if count > i64::from(MAX_DEVICE_COUNT) {
        return Err(ValidationError::OutOfRange {
            field: kind.as_str().to_string(),
            min: 0,
            max: i64::from(MAX_DEVICE_COUNT),
        });
    }

    u32::try_from(count).map_err(|_| ValidationError::OutOfRange {
        field: kind.as_str().to_string(),
        min: 0,
        max: i64::from(MAX_DEVICE_COUNT),
    })
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ```rust
/// use micks_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id)
        .map_err(|_| ValidationError::invalid_format("id", "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
