//! Product domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use craftly_core::ProductSummary;
use craftly_core::validation::{ValidationError, require_length};

/// A product with the seller's public name attached.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductSummary,
    pub seller_name: String,
}

/// Fields a seller submits to list a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
}

impl NewProduct {
    /// Check listing fields.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_length("title", &self.title, 3, 120)?;
        require_length("description", &self.description, 0, 5000)?;
        require_length("category", &self.category, 2, 50)?;
        validate_price(self.price)?;
        validate_stock(self.stock)
    }
}

/// Partial update of a listing. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
}

impl ProductUpdate {
    /// Check whichever fields are present.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_length("title", title, 3, 120)?;
        }
        if let Some(description) = &self.description {
            require_length("description", description, 0, 5000)?;
        }
        if let Some(category) = &self.category {
            require_length("category", category, 2, 50)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }
}

fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO || price.scale() > 2 {
        return Err(ValidationError::Invalid {
            field: "price",
            reason: "must be positive with at most two decimal places".to_owned(),
        });
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<(), ValidationError> {
    if stock < 0 {
        return Err(ValidationError::Range {
            field: "stock",
            min: 0,
            max: i64::from(i32::MAX),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> NewProduct {
        NewProduct {
            title: "Walnut spoon".to_owned(),
            description: "Carved by hand".to_owned(),
            category: "woodwork".to_owned(),
            price: Decimal::new(2400, 2),
            image_url: None,
            stock: 4,
        }
    }

    #[test]
    fn test_valid_listing() {
        assert!(listing().validate().is_ok());
    }

    #[test]
    fn test_price_must_be_positive_cents() {
        let mut p = listing();
        p.price = Decimal::ZERO;
        assert!(p.validate().is_err());
        p.price = Decimal::new(1999, 3);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_negative_stock_rejected() {
        let mut p = listing();
        p.stock = -1;
        assert!(matches!(
            p.validate(),
            Err(ValidationError::Range { field: "stock", .. })
        ));
    }

    #[test]
    fn test_update_only_checks_present_fields() {
        assert!(ProductUpdate::default().validate().is_ok());
        let update = ProductUpdate {
            title: Some("ab".to_owned()),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_err());
    }
}
