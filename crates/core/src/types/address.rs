//! Shipping address type.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, require_length};

/// A postal address an order ships to.
///
/// Stored as JSON on orders and profiles, so it carries no ID of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Check that every required line is present.
    ///
    /// # Errors
    ///
    /// Returns the first field that is missing or out of bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_length("full_name", &self.full_name, 2, 100)?;
        require_length("line1", &self.line1, 1, 200)?;
        require_length("city", &self.city, 1, 100)?;
        require_length("postal_code", &self.postal_code, 2, 20)?;

        let country = self.country.trim();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::Invalid {
                field: "country",
                reason: "must be a two-letter country code".to_owned(),
            });
        }

        Ok(())
    }
}
