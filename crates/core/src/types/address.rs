//! Shipping addresses.
//!
//! An [`Address`] is a value: edits produce a new address rather than
//! mutating one in place. A [`SavedAddress`] is the backend's address-book
//! record and converts into an [`Address`] when selected at checkout.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::{AddressId, UserId};

// =============================================================================
// Country
// =============================================================================

/// Destination country.
///
/// Only the countries with dedicated postal rules get their own variant;
/// everything else is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Country {
    #[default]
    UnitedStates,
    Canada,
    UnitedKingdom,
    Other(String),
}

impl Country {
    /// Minimum number of non-whitespace characters in a postal code.
    #[must_use]
    pub const fn min_postal_code_len(&self) -> usize {
        match self {
            Self::UnitedStates | Self::UnitedKingdom => 5,
            Self::Canada => 6,
            Self::Other(_) => 3,
        }
    }

    /// Two-letter code sent to the backend.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::UnitedStates => "US",
            Self::Canada => "CA",
            Self::UnitedKingdom => "GB",
            Self::Other(code) => code,
        }
    }
}

impl FromStr for Country {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_ascii_uppercase().as_str() {
            "" | "US" | "USA" | "UNITED STATES" => Self::UnitedStates,
            "CA" | "CANADA" => Self::Canada,
            "GB" | "UK" | "UNITED KINGDOM" => Self::UnitedKingdom,
            _ => Self::Other(trimmed.to_owned()),
        })
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Country {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Country {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(country) = raw.parse::<Self>();
        Ok(country)
    }
}

// =============================================================================
// Address
// =============================================================================

/// Individually editable address fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    FirstName,
    LastName,
    Street,
    Apartment,
    City,
    State,
    PostalCode,
    Country,
    Phone,
}

impl AddressField {
    /// Label shown next to the field.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Street => "Street address",
            Self::Apartment => "Apartment, suite, etc.",
            Self::City => "City",
            Self::State => "State",
            Self::PostalCode => "ZIP code",
            Self::Country => "Country",
            Self::Phone => "Phone",
        }
    }
}

/// A shipping address as entered or selected at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    /// Serialized as `address` to match the backend's shipping payloads.
    #[serde(rename = "address")]
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(rename = "zipCode")]
    pub postal_code: String,
    #[serde(default)]
    pub country: Country,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Address {
    /// Return a copy of this address with one field replaced.
    ///
    /// Blank values for optional fields become `None`.
    #[must_use]
    pub fn with_field(&self, field: AddressField, value: &str) -> Self {
        let mut next = self.clone();
        let optional = || {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| value.to_owned())
        };
        match field {
            AddressField::FirstName => next.first_name = value.to_owned(),
            AddressField::LastName => next.last_name = value.to_owned(),
            AddressField::Street => next.street = value.to_owned(),
            AddressField::Apartment => next.apartment = optional(),
            AddressField::City => next.city = value.to_owned(),
            AddressField::State => next.state = value.to_owned(),
            AddressField::PostalCode => next.postal_code = value.to_owned(),
            AddressField::Country => {
                let Ok(country) = value.parse::<Country>();
                next.country = country;
            }
            AddressField::Phone => next.phone = optional(),
        }
        next
    }

    /// Current value of a field, empty for unset optional fields.
    #[must_use]
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::FirstName => &self.first_name,
            AddressField::LastName => &self.last_name,
            AddressField::Street => &self.street,
            AddressField::Apartment => self.apartment.as_deref().unwrap_or(""),
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::PostalCode => &self.postal_code,
            AddressField::Country => self.country.code(),
            AddressField::Phone => self.phone.as_deref().unwrap_or(""),
        }
    }

    /// Full name as printed on the label.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_owned()
    }

    /// One-line summary, e.g. `1 Main St, Troy, NY 12180`.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut line = self.street.trim().to_owned();
        if let Some(apartment) = self.apartment.as_deref().map(str::trim) {
            line.push(' ');
            line.push_str(apartment);
        }
        format!(
            "{line}, {}, {} {}",
            self.city.trim(),
            self.state.trim(),
            self.postal_code.trim()
        )
    }
}

// =============================================================================
// Saved addresses
// =============================================================================

/// Address-book label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressKind {
    #[default]
    Home,
    Work,
    Other,
}

/// An address stored in the user's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAddress {
    pub id: AddressId,
    pub user_id: UserId,
    #[serde(rename = "type", default)]
    pub kind: AddressKind,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub country: Country,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_true() -> bool {
    true
}

impl From<&SavedAddress> for Address {
    fn from(saved: &SavedAddress) -> Self {
        Self {
            first_name: saved.first_name.clone(),
            last_name: saved.last_name.clone(),
            street: saved.address1.clone(),
            apartment: saved.address2.clone().filter(|a| !a.trim().is_empty()),
            city: saved.city.clone(),
            state: saved.state.clone(),
            postal_code: saved.zip_code.clone(),
            country: saved.country.clone(),
            phone: saved.phone.clone().filter(|p| !p.trim().is_empty()),
        }
    }
}

/// How the checkout address was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSelection {
    /// Picked from the address book; every field comes from the record.
    Saved { id: AddressId, address: Address },
    /// Typed into the form.
    Manual(Address),
}

impl AddressSelection {
    /// The address regardless of how it was chosen.
    #[must_use]
    pub const fn address(&self) -> &Address {
        match self {
            Self::Saved { address, .. } | Self::Manual(address) => address,
        }
    }

    /// The address-book id when a saved address is selected.
    #[must_use]
    pub const fn saved_id(&self) -> Option<AddressId> {
        match self {
            Self::Saved { id, .. } => Some(*id),
            Self::Manual(_) => None,
        }
    }
}

impl From<&SavedAddress> for AddressSelection {
    fn from(saved: &SavedAddress) -> Self {
        Self::Saved {
            id: saved.id,
            address: Address::from(saved),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn jane() -> Address {
        Address {
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            street: "1 Main St".to_owned(),
            apartment: None,
            city: "Troy".to_owned(),
            state: "NY".to_owned(),
            postal_code: "12180".to_owned(),
            country: Country::UnitedStates,
            phone: None,
        }
    }

    #[test]
    fn test_country_parsing() {
        assert_eq!("us".parse::<Country>().unwrap(), Country::UnitedStates);
        assert_eq!("United States".parse::<Country>().unwrap(), Country::UnitedStates);
        assert_eq!("Canada".parse::<Country>().unwrap(), Country::Canada);
        assert_eq!("UK".parse::<Country>().unwrap(), Country::UnitedKingdom);
        assert_eq!(
            "DE".parse::<Country>().unwrap(),
            Country::Other("DE".to_owned())
        );
    }

    #[test]
    fn test_min_postal_code_len() {
        assert_eq!(Country::UnitedStates.min_postal_code_len(), 5);
        assert_eq!(Country::Canada.min_postal_code_len(), 6);
        assert_eq!(Country::UnitedKingdom.min_postal_code_len(), 5);
        assert_eq!(Country::Other("DE".to_owned()).min_postal_code_len(), 3);
    }

    #[test]
    fn test_with_field_returns_new_value() {
        let original = jane();
        let edited = original.with_field(AddressField::PostalCode, "");
        assert_eq!(original.postal_code, "12180");
        assert_eq!(edited.postal_code, "");
        assert_eq!(edited.field(AddressField::City), "Troy");
    }

    #[test]
    fn test_with_field_blank_optional_is_none() {
        let edited = jane().with_field(AddressField::Apartment, "   ");
        assert_eq!(edited.apartment, None);
        let edited = jane().with_field(AddressField::Phone, "5185550100");
        assert_eq!(edited.phone.as_deref(), Some("5185550100"));
    }

    #[test]
    fn test_address_wire_format() {
        let json = serde_json::to_value(jane()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "address": "1 Main St",
                "city": "Troy",
                "state": "NY",
                "zipCode": "12180",
                "country": "US"
            })
        );
    }

    #[test]
    fn test_saved_address_converts_every_field() {
        let saved: SavedAddress = serde_json::from_value(serde_json::json!({
            "id": 3,
            "userId": 9,
            "type": "Work",
            "firstName": "Jane",
            "lastName": "Doe",
            "address1": "1 Main St",
            "address2": "",
            "city": "Troy",
            "state": "NY",
            "zipCode": "12180",
            "country": "United States",
            "isDefault": true,
            "isActive": true,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(saved.kind, AddressKind::Work);
        let selection = AddressSelection::from(&saved);
        assert_eq!(selection.saved_id(), Some(AddressId::new(3)));
        assert_eq!(selection.address(), &jane());
    }

    #[test]
    fn test_one_line() {
        assert_eq!(jane().one_line(), "1 Main St, Troy, NY 12180");
        assert_eq!(jane().full_name(), "Jane Doe");
    }
}
