//! Address validation.
//!
//! [`is_address_complete`] is the one completeness rule every checkout
//! surface uses: shipping quotes, the checkout gate and saved-address
//! selection all go through it. [`field_errors`] produces the inline,
//! non-blocking messages shown next to form fields; those messages never
//! affect completeness.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Address, AddressField, Country};

/// Fields that must be non-blank for an address to be complete.
const REQUIRED_TEXT_FIELDS: [AddressField; 5] = [
    AddressField::FirstName,
    AddressField::LastName,
    AddressField::Street,
    AddressField::City,
    AddressField::State,
];

/// Number of non-whitespace characters in a postal code.
fn postal_code_len(postal_code: &str) -> usize {
    postal_code.chars().filter(|c| !c.is_whitespace()).count()
}

/// True when the address can be quoted and shipped to.
///
/// Requires first name, last name, street, city and state to be non-blank
/// and the postal code to have at least the country's minimum number of
/// characters, ignoring whitespace.
#[must_use]
pub fn is_address_complete(address: &Address) -> bool {
    missing_fields(address).is_empty()
}

/// Required fields that are blank or too short, in form order.
#[must_use]
pub fn missing_fields(address: &Address) -> Vec<AddressField> {
    let mut missing: Vec<AddressField> = REQUIRED_TEXT_FIELDS
        .into_iter()
        .filter(|field| address.field(*field).trim().is_empty())
        .collect();

    if postal_code_len(&address.postal_code) < address.country.min_postal_code_len() {
        missing.push(AddressField::PostalCode);
    }
    missing
}

// =============================================================================
// Inline field validation
// =============================================================================

static US_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("Invalid regex"));

static CA_POSTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]\d[A-Za-z] ?\d[A-Za-z]\d$").expect("Invalid regex"));

static UK_POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{1,2}\d[A-Za-z\d]? ?\d[A-Za-z]{2}$").expect("Invalid regex")
});

static GENERIC_POSTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s\-]{3,20}$").expect("Invalid regex"));

/// Errors from [`validate_postal_code`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    #[error("ZIP code is required")]
    Required,
    #[error("Invalid US ZIP code format (e.g., 12345 or 12345-6789)")]
    UnitedStates,
    #[error("Invalid Canadian postal code format (e.g., K1A 0A6)")]
    Canada,
    #[error("Invalid UK postal code format")]
    UnitedKingdom,
    #[error("Invalid postal code format")]
    Other,
}

/// Check a postal code against its country's format.
///
/// # Errors
///
/// Returns the country-specific format error when the code does not match.
pub fn validate_postal_code(postal_code: &str, country: &Country) -> Result<(), PostalCodeError> {
    let cleaned = postal_code.trim();
    if cleaned.is_empty() {
        return Err(PostalCodeError::Required);
    }

    let (re, err) = match country {
        Country::UnitedStates => (&*US_ZIP_RE, PostalCodeError::UnitedStates),
        Country::Canada => (&*CA_POSTAL_RE, PostalCodeError::Canada),
        Country::UnitedKingdom => (&*UK_POSTCODE_RE, PostalCodeError::UnitedKingdom),
        Country::Other(_) => (&*GENERIC_POSTAL_RE, PostalCodeError::Other),
    };

    if re.is_match(cleaned) { Ok(()) } else { Err(err) }
}

/// An inline message for one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: AddressField,
    pub message: String,
}

impl FieldError {
    fn new(field: AddressField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Inline validation messages for every field that needs attention.
///
/// These are advisory: the form may be submitted with them present, and
/// completeness is decided by [`is_address_complete`] alone.
#[must_use]
pub fn field_errors(address: &Address) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for field in REQUIRED_TEXT_FIELDS {
        if address.field(field).trim().is_empty() {
            errors.push(FieldError::new(
                field,
                format!("{} is required", field.label()),
            ));
        }
    }

    let street = address.street.trim();
    if !street.is_empty() && street.chars().count() < 5 {
        errors.push(FieldError::new(
            AddressField::Street,
            "Address must be at least 5 characters",
        ));
    }

    let city = address.city.trim();
    if !city.is_empty() && city.chars().count() < 2 {
        errors.push(FieldError::new(
            AddressField::City,
            "City must be at least 2 characters",
        ));
    }

    if let Err(err) = validate_postal_code(&address.postal_code, &address.country) {
        errors.push(FieldError::new(AddressField::PostalCode, err.to_string()));
    }

    if let Some(phone) = address.phone.as_deref() {
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if digits < 10 {
            errors.push(FieldError::new(
                AddressField::Phone,
                "Phone number must be at least 10 digits",
            ));
        } else if digits > 15 {
            errors.push(FieldError::new(
                AddressField::Phone,
                "Phone number must be 15 digits or less",
            ));
        }
    }

    errors
}
