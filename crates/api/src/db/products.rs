//! Product listing repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use craftly_core::{CurrencyCode, Money, ProductFilter, ProductId, ProductSort, ProductSummary, UserId};

use super::RepositoryError;
use crate::models::{NewProduct, ProductDetail, ProductUpdate};

/// Most rows a listing query returns.
pub const MAX_LISTING_ROWS: i64 = 200;

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.seller_id, p.title, p.description, p.category, \
     p.price, p.currency_code, p.image_url, p.stock, p.rating_average, p.rating_count, p.created_at";

/// Internal row type for product queries. Shared with the favourites query.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i32,
    seller_id: i32,
    title: String,
    description: String,
    category: String,
    price: Decimal,
    currency_code: String,
    image_url: Option<String>,
    stock: i32,
    rating_average: f64,
    rating_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for ProductSummary {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let currency_code = row
            .currency_code
            .parse::<CurrencyCode>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: ProductId::new(row.id),
            seller_id: UserId::new(row.seller_id),
            title: row.title,
            description: row.description,
            category: row.category,
            price: Money::new(row.price, currency_code),
            image_url: row.image_url,
            stock: row.stock,
            rating_average: row.rating_average,
            rating_count: row.rating_count,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductDetailRow {
    #[sqlx(flatten)]
    product: ProductRow,
    seller_name: String,
}

/// Escape `LIKE` wildcards so user input matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter` in `sort` order.
    ///
    /// Applies the same predicate as [`ProductFilter::matches`] in SQL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM craftly.product p WHERE TRUE"
        ));

        if let Some(query) = filter.normalized_query() {
            let pattern = like_pattern(query);
            qb.push(" AND (p.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category) = filter.category.as_deref().map(str::trim)
            && !category.is_empty()
        {
            qb.push(" AND lower(p.category) = lower(")
                .push_bind(category.to_owned())
                .push(")");
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND p.price <= ").push_bind(max);
        }
        if filter.in_stock_only {
            qb.push(" AND p.stock > 0");
        }

        qb.push(" ORDER BY ")
            .push(sort.order_by_sql())
            .push(" LIMIT ")
            .push_bind(MAX_LISTING_ROWS);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product with its seller's display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductDetailRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}, s.display_name AS seller_name
            FROM craftly.product p
            JOIN craftly.profile s ON s.user_id = p.seller_id
            WHERE p.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(ProductDetail {
                product: r.product.try_into()?,
                seller_name: r.seller_name,
            })),
            None => Ok(None),
        }
    }

    /// Create a listing owned by `seller_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        seller_id: UserId,
        product: &NewProduct,
    ) -> Result<ProductSummary, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO craftly.product AS p
                (seller_id, title, description, category, price, image_url, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(seller_id)
        .bind(product.title.trim())
        .bind(product.description.trim())
        .bind(product.category.trim())
        .bind(product.price)
        .bind(product.image_url.as_deref())
        .bind(product.stock)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Apply a partial update. Absent fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<ProductSummary, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE craftly.product AS p SET
                title = COALESCE($2, p.title),
                description = COALESCE($3, p.description),
                category = COALESCE($4, p.category),
                price = COALESCE($5, p.price),
                image_url = COALESCE($6, p.image_url),
                stock = COALESCE($7, p.stock),
                updated_at = now()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.title.as_deref().map(str::trim))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.category.as_deref().map(str::trim))
        .bind(update.price)
        .bind(update.image_url.as_deref())
        .bind(update.stock)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a listing.
    ///
    /// Returns `true` if the product existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM craftly.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            r"
            SELECT DISTINCT lower(category) AS category
            FROM craftly.product
            ORDER BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }
}
