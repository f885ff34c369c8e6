//! Shopping cart repository.
//!
//! A cart is the set of `cart_item` rows for a user, at most one per product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use craftly_core::validation::MAX_LINE_QUANTITY;
use craftly_core::{CurrencyCode, Money, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartLine};

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    product_id: i32,
    title: String,
    image_url: Option<String>,
    price: Decimal,
    currency_code: String,
    quantity: i32,
    stock: i32,
    added_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let currency_code = row
            .currency_code
            .parse::<CurrencyCode>()
            .map_err(RepositoryError::DataCorruption)?;
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative cart quantity: {}", row.quantity))
        })?;

        Ok(Self {
            product_id: ProductId::new(row.product_id),
            title: row.title,
            image_url: row.image_url,
            unit_price: Money::new(row.price, currency_code),
            quantity,
            stock: row.stock,
            added_at: row.added_at,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.product_id, p.title, p.image_url, p.price, p.currency_code,
                   c.quantity, p.stock, c.added_at
            FROM craftly.cart_item c
            JOIN craftly.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.added_at ASC, c.product_id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<CartLine>, _>>()?;
        Ok(Cart::from_lines(lines))
    }

    /// Add `quantity` units of a product, incrementing an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the resulting quantity exceeds
    /// the stock or the per-line limit.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT stock FROM craftly.product WHERE id = $1 FOR SHARE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        check_line_quantity(i64::from(quantity), stock)?;
        let cap = line_cap(stock);

        // The conflict path locks the existing line, so concurrent adds
        // apply one after the other against the latest quantity.
        let stored = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO craftly.cart_item AS line (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE
                SET quantity = line.quantity + EXCLUDED.quantity
                WHERE line.quantity + EXCLUDED.quantity <= $4
            RETURNING quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .bind(cap)
        .fetch_optional(&mut *tx)
        .await?;

        if stored.is_none() {
            let existing = sqlx::query_scalar::<_, i32>(
                "SELECT quantity FROM craftly.cart_item WHERE user_id = $1 AND product_id = $2",
            )
            .bind(user_id)
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;
            check_line_quantity(i64::from(existing) + i64::from(quantity), stock)?;
            return Err(RepositoryError::Conflict(
                "cart line quantity limit reached".to_string(),
            ));
        }

        tx.commit().await?;
        self.get(user_id).await
    }

    /// Set the quantity of an existing line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    /// Returns `RepositoryError::Conflict` if the quantity exceeds the stock.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        if quantity == 0 {
            if !self.remove(user_id, product_id).await? {
                return Err(RepositoryError::NotFound);
            }
            return self.get(user_id).await;
        }

        let mut tx = self.pool.begin().await?;

        let stock = sqlx::query_scalar::<_, i32>(
            r"
            SELECT p.stock
            FROM craftly.cart_item c
            JOIN craftly.product p ON p.id = c.product_id
            WHERE c.user_id = $1 AND c.product_id = $2
            FOR UPDATE OF c
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        check_line_quantity(i64::from(quantity), stock)?;

        sqlx::query(
            r"
            UPDATE craftly.cart_item SET quantity = $3
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get(user_id).await
    }

    /// Remove a line. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM craftly.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM craftly.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// The largest quantity a single cart line may hold for this stock level.
fn line_cap(stock: i32) -> i32 {
    stock.min(i32::try_from(MAX_LINE_QUANTITY).unwrap_or(i32::MAX))
}

fn check_line_quantity(total: i64, stock: i32) -> Result<(), RepositoryError> {
    if total > i64::from(MAX_LINE_QUANTITY) {
        return Err(RepositoryError::Conflict(format!(
            "at most {MAX_LINE_QUANTITY} of one item per order"
        )));
    }
    if total > i64::from(stock) {
        return Err(RepositoryError::Conflict(format!(
            "only {stock} left in stock"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_line_quantity() {
        assert!(check_line_quantity(3, 3).is_ok());
        assert!(matches!(
            check_line_quantity(4, 3),
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            check_line_quantity(100, 500),
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[test]
    fn test_line_cap_is_stock_or_per_line_limit() {
        assert_eq!(line_cap(3), 3);
        assert_eq!(line_cap(99), 99);
        assert_eq!(line_cap(500), 99);
        assert_eq!(line_cap(0), 0);
    }
}
