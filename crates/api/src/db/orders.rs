//! Order repository.
//!
//! Checkout, cancellation and status changes each run in one transaction.
//! Checkout locks the product rows it draws stock from.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor, PgPool};
use thiserror::Error;

use craftly_core::{
    CurrencyCode, Money, NotificationKind, OrderId, OrderItemId, OrderStatus, ProductId,
    ShippingAddress, UserId,
};

use super::{RepositoryError, notifications};
use crate::models::{Order, OrderItem};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line asks for more than the seller has.
    #[error("not enough stock for \"{0}\"")]
    OutOfStock(String),

    /// Cart lines priced in different currencies.
    #[error("cart contains items in more than one currency")]
    MixedCurrency,

    /// Status change the order lifecycle does not allow.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: OrderStatus,
    shipping_address: Json<ShippingAddress>,
    subtotal: Decimal,
    currency_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: Option<i32>,
    seller_id: i32,
    title: String,
    unit_price: Decimal,
    quantity: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct CheckoutLineRow {
    product_id: i32,
    seller_id: i32,
    title: String,
    price: Decimal,
    currency_code: String,
    quantity: i32,
    stock: i32,
}

const ORDER_COLUMNS: &str = "id, user_id, status, shipping_address, subtotal, currency_code, \
     created_at, updated_at";

fn parse_currency(code: &str) -> Result<CurrencyCode, RepositoryError> {
    code.parse().map_err(RepositoryError::DataCorruption)
}

fn quantity_from_db(quantity: i32) -> Result<u32, RepositoryError> {
    u32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("invalid quantity: {quantity}")))
}

/// Attach item rows to their order rows, keeping the order rows' order.
fn assemble(rows: Vec<OrderRow>, items: Vec<OrderItemRow>) -> Result<Vec<Order>, RepositoryError> {
    let currencies: HashMap<i32, CurrencyCode> = rows
        .iter()
        .map(|r| Ok((r.id, parse_currency(&r.currency_code)?)))
        .collect::<Result<_, RepositoryError>>()?;

    let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in items {
        let currency = currencies
            .get(&item.order_id)
            .copied()
            .unwrap_or_default();
        by_order.entry(item.order_id).or_default().push(OrderItem {
            id: OrderItemId::new(item.id),
            product_id: item.product_id.map(ProductId::new),
            seller_id: UserId::new(item.seller_id),
            title: item.title,
            unit_price: Money::new(item.unit_price, currency),
            quantity: quantity_from_db(item.quantity)?,
        });
    }

    rows.into_iter()
        .map(|r| {
            let currency = parse_currency(&r.currency_code)?;
            Ok(Order {
                id: OrderId::new(r.id),
                user_id: UserId::new(r.user_id),
                status: r.status,
                items: by_order.remove(&r.id).unwrap_or_default(),
                shipping_address: r.shipping_address.0,
                subtotal: Money::new(r.subtotal, currency),
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
        })
        .collect()
}

/// Item rows for `order_ids`, optionally only one seller's lines.
async fn load_items<'e, E>(
    executor: E,
    order_ids: &[i32],
    seller_id: Option<UserId>,
) -> Result<Vec<OrderItemRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, order_id, product_id, seller_id, title, unit_price, quantity
        FROM craftly.order_item
        WHERE order_id = ANY($1)
          AND ($2::INTEGER IS NULL OR seller_id = $2)
        ORDER BY order_id, id
        ",
    )
    .bind(order_ids)
    .bind(seller_id)
    .fetch_all(executor)
    .await
}

/// Put the stock of every line of `order_id` back on its product.
async fn restore_stock(conn: &mut PgConnection, order_id: OrderId) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE craftly.product p
        SET stock = p.stock + i.quantity, updated_at = now()
        FROM craftly.order_item i
        WHERE i.order_id = $1 AND i.product_id = p.id
        ",
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(())
}

async fn sellers_of(conn: &mut PgConnection, order_id: OrderId) -> Result<Vec<UserId>, sqlx::Error> {
    sqlx::query_scalar::<_, UserId>(
        "SELECT DISTINCT seller_id FROM craftly.order_item WHERE order_id = $1 ORDER BY seller_id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

async fn set_status(
    conn: &mut PgConnection,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE craftly.order SET status = $2, updated_at = now() WHERE id = $1")
        .bind(order_id)
        .bind(status)
        .execute(conn)
        .await?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into a pending order.
    ///
    /// Locks every product in the cart, checks and decrements stock,
    /// snapshots titles and prices, clears the cart and notifies each seller.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` if the cart has no lines.
    /// Returns `OrderError::OutOfStock` if any line exceeds current stock.
    pub async fn checkout(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CheckoutLineRow>(
            r"
            SELECT c.product_id, p.seller_id, p.title, p.price, p.currency_code,
                   c.quantity, p.stock
            FROM craftly.cart_item c
            JOIN craftly.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY p.id
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let Some(first) = lines.first() else {
            return Err(OrderError::EmptyCart);
        };
        let currency = parse_currency(&first.currency_code)?;

        let mut subtotal = Decimal::ZERO;
        for line in &lines {
            if parse_currency(&line.currency_code)? != currency {
                return Err(OrderError::MixedCurrency);
            }
            if line.quantity > line.stock {
                return Err(OrderError::OutOfStock(line.title.clone()));
            }
            subtotal += line.price * Decimal::from(line.quantity);
        }

        let order_id = sqlx::query_scalar::<_, OrderId>(
            r"
            INSERT INTO craftly.order (user_id, shipping_address, subtotal, currency_code)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(Json(address))
        .bind(subtotal)
        .bind(currency.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO craftly.order_item
                    (order_id, product_id, seller_id, title, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.seller_id)
            .bind(&line.title)
            .bind(line.price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE craftly.product SET stock = stock - $2, updated_at = now() WHERE id = $1",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM craftly.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let mut sellers: Vec<i32> = lines.iter().map(|l| l.seller_id).collect();
        sellers.sort_unstable();
        sellers.dedup();
        for seller in sellers {
            let titles: Vec<&str> = lines
                .iter()
                .filter(|l| l.seller_id == seller)
                .map(|l| l.title.as_str())
                .collect();
            notifications::insert(
                &mut *tx,
                UserId::new(seller),
                NotificationKind::Order,
                &format!("New order #{order_id}"),
                &format!("Ordered: {}", titles.join(", ")),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %order_id, user_id = %user_id, lines = lines.len(), "Order placed");

        self.get(order_id)
            .await?
            .ok_or(OrderError::Repository(RepositoryError::NotFound))
    }

    /// Get any order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM craftly.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let items = load_items(self.pool, &[id.as_i32()], None).await?;
        Ok(assemble(rows, items)?.into_iter().next())
    }

    /// Get an order only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self.get(id).await?.filter(|o| o.user_id == user_id))
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM craftly.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let items = load_items(self.pool, &ids, None).await?;
        assemble(rows, items)
    }

    /// Orders containing the seller's products, newest first.
    ///
    /// Only the seller's own lines are included; `subtotal` is still the
    /// whole order's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(&self, seller_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM craftly.order o
            WHERE EXISTS (
                SELECT 1 FROM craftly.order_item i
                WHERE i.order_id = o.id AND i.seller_id = $1
            )
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let items = load_items(self.pool, &ids, Some(seller_id)).await?;
        assemble(rows, items)
    }

    /// Buyer cancels their own order while it is pending or processing.
    ///
    /// Stock is returned to the products and the sellers are notified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if the order isn't the user's.
    /// Returns `OrderError::InvalidTransition` once the order has shipped.
    pub async fn cancel(&self, user_id: UserId, id: OrderId) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM craftly.order WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !status.is_cancellable() {
            return Err(OrderError::InvalidTransition {
                from: status,
                to: OrderStatus::Cancelled,
            });
        }

        restore_stock(&mut tx, id).await?;
        set_status(&mut tx, id, OrderStatus::Cancelled).await?;

        for seller in sellers_of(&mut tx, id).await? {
            notifications::insert(
                &mut *tx,
                seller,
                NotificationKind::Order,
                &format!("Order #{id} cancelled"),
                "The buyer cancelled this order.",
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %id, user_id = %user_id, "Order cancelled by buyer");

        self.get(id)
            .await?
            .ok_or(OrderError::Repository(RepositoryError::NotFound))
    }

    /// Move an order to `next` (admin operation) and notify the buyer.
    ///
    /// Cancelling restores stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if the order doesn't exist.
    /// Returns `OrderError::InvalidTransition` if the lifecycle forbids the move.
    pub async fn update_status(&self, id: OrderId, next: OrderStatus) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let (status, buyer) = sqlx::query_as::<_, (OrderStatus, UserId)>(
            "SELECT status, user_id FROM craftly.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: status,
                to: next,
            });
        }

        if next == OrderStatus::Cancelled {
            restore_stock(&mut tx, id).await?;
        }
        set_status(&mut tx, id, next).await?;

        notifications::insert(
            &mut *tx,
            buyer,
            NotificationKind::Order,
            &format!("Order #{id} {next}"),
            &format!("Your order is now {next}."),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %id, from = %status, to = %next, "Order status changed");

        self.get(id)
            .await?
            .ok_or(OrderError::Repository(RepositoryError::NotFound))
    }
}
