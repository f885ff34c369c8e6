//! Product catalog filtering and sorting.
//!
//! The same filter runs in two places: the API applies it to listing
//! queries, and client view models re-apply it locally when the user
//! narrows an already-loaded list.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Money, ProductId, UserId};

/// The fields of a product a listing needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub seller_id: UserId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: i32,
    pub rating_average: f64,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Listing filter. Every unset field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of title or description.
    #[serde(default, rename = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Exact category, compared case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Inclusive lower price bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    /// Hide products with no stock.
    #[serde(default, rename = "in_stock")]
    pub in_stock_only: bool,
}

impl ProductFilter {
    /// Whether `product` passes every set criterion.
    #[must_use]
    pub fn matches(&self, product: &ProductSummary) -> bool {
        if let Some(query) = self.normalized_query() {
            let query = query.to_lowercase();
            let hit = product.title.to_lowercase().contains(&query)
                || product.description.to_lowercase().contains(&query);
            if !hit {
                return false;
            }
        }

        if let Some(category) = self.category.as_deref().map(str::trim)
            && !category.is_empty()
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }

        if self.min_price.is_some_and(|min| product.price.amount < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price.amount > max) {
            return false;
        }

        !(self.in_stock_only && product.stock <= 0)
    }

    /// The trimmed text query, or `None` when blank.
    #[must_use]
    pub fn normalized_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Most recently listed first.
    #[default]
    Newest,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Highest average rating first, ties broken by rating count.
    Rating,
    /// Alphabetical by title.
    #[serde(rename = "title")]
    TitleAsc,
}

impl ProductSort {
    /// Compare two products in this order.
    #[must_use]
    pub fn compare(self, a: &ProductSummary, b: &ProductSummary) -> Ordering {
        match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::PriceAsc => a.price.amount.cmp(&b.price.amount),
            Self::PriceDesc => b.price.amount.cmp(&a.price.amount),
            Self::Rating => b
                .rating_average
                .total_cmp(&a.rating_average)
                .then_with(|| b.rating_count.cmp(&a.rating_count)),
            Self::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        }
    }

    /// SQL `ORDER BY` clause for this order.
    #[must_use]
    pub const fn order_by_sql(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id ASC",
            Self::Rating => "rating_average DESC, rating_count DESC, id ASC",
            Self::TitleAsc => "lower(title) ASC, id ASC",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "rating" => Ok(Self::Rating),
            "title" => Ok(Self::TitleAsc),
            _ => Err(format!("invalid sort: {s}")),
        }
    }
}

/// Filter then sort a list of products. The sort is stable.
#[must_use]
pub fn apply(
    products: &[ProductSummary],
    filter: &ProductFilter,
    sort: ProductSort,
) -> Vec<ProductSummary> {
    let mut out: Vec<ProductSummary> = products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();
    out.sort_by(|a, b| sort.compare(a, b));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::CurrencyCode;

    fn product(id: i32, title: &str, cents: i64, day: u32) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(id),
            seller_id: UserId::new(1),
            title: title.to_owned(),
            description: format!("Handmade {title}"),
            category: "ceramics".to_owned(),
            price: Money::from_cents(cents, CurrencyCode::USD),
            image_url: None,
            stock: 3,
            rating_average: 0.0,
            rating_count: 0,
            created_at: Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap(),
        }
    }

    fn ids(products: &[ProductSummary]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = ProductFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&product(1, "Mug", 1200, 1)));
    }

    #[test]
    fn test_query_matches_title_or_description_case_insensitively() {
        let filter = ProductFilter {
            query: Some("  MUG ".to_owned()),
            ..ProductFilter::default()
        };
        assert!(filter.matches(&product(1, "Blue mug", 1200, 1)));

        let mut bowl = product(2, "Bowl", 1500, 1);
        assert!(!filter.matches(&bowl));
        bowl.description = "Pairs with the mug".to_owned();
        assert!(filter.matches(&bowl));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let filter = ProductFilter {
            min_price: Some(Decimal::new(1000, 2)),
            max_price: Some(Decimal::new(2000, 2)),
            ..ProductFilter::default()
        };
        assert!(filter.matches(&product(1, "a", 1000, 1)));
        assert!(filter.matches(&product(2, "b", 2000, 1)));
        assert!(!filter.matches(&product(3, "c", 999, 1)));
        assert!(!filter.matches(&product(4, "d", 2001, 1)));
    }

    #[test]
    fn test_category_and_stock() {
        let filter = ProductFilter {
            category: Some("Ceramics".to_owned()),
            in_stock_only: true,
            ..ProductFilter::default()
        };
        let mut p = product(1, "Vase", 3000, 1);
        assert!(filter.matches(&p));
        p.stock = 0;
        assert!(!filter.matches(&p));
        p.stock = 1;
        p.category = "textiles".to_owned();
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_sorts() {
        let products = vec![
            product(1, "banana stand", 500, 3),
            product(2, "Apple crate", 1500, 1),
            product(3, "cherry box", 1000, 2),
        ];
        let filter = ProductFilter::default();

        assert_eq!(ids(&apply(&products, &filter, ProductSort::Newest)), [1, 3, 2]);
        assert_eq!(ids(&apply(&products, &filter, ProductSort::PriceAsc)), [1, 3, 2]);
        assert_eq!(ids(&apply(&products, &filter, ProductSort::PriceDesc)), [2, 3, 1]);
        assert_eq!(ids(&apply(&products, &filter, ProductSort::TitleAsc)), [2, 1, 3]);
    }

    #[test]
    fn test_rating_sort_breaks_ties_by_count() {
        let mut a = product(1, "a", 100, 1);
        a.rating_average = 4.5;
        a.rating_count = 2;
        let mut b = product(2, "b", 100, 1);
        b.rating_average = 4.5;
        b.rating_count = 10;
        let mut c = product(3, "c", 100, 1);
        c.rating_average = 5.0;
        c.rating_count = 1;

        let sorted = apply(&[a, b, c], &ProductFilter::default(), ProductSort::Rating);
        assert_eq!(ids(&sorted), [3, 2, 1]);
    }

    #[test]
    fn test_sort_from_str() {
        assert_eq!("price_desc".parse::<ProductSort>(), Ok(ProductSort::PriceDesc));
        assert_eq!("title".parse::<ProductSort>(), Ok(ProductSort::TitleAsc));
        assert!("cheapest".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_filter_from_query_string_shape() {
        let filter: ProductFilter =
            serde_json::from_value(serde_json::json!({"q": "mug", "in_stock": true})).unwrap();
        assert_eq!(filter.query.as_deref(), Some("mug"));
        assert!(filter.in_stock_only);
    }
}
