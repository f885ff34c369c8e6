//! Cart, favourite and order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use craftly_core::{
    CurrencyCode, Money, OrderId, OrderItemId, OrderStatus, ProductId, ProductSummary,
    ShippingAddress, UserId,
};

/// One product line in a cart, joined with the product's current listing.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    /// Units the seller currently has in stock.
    pub stock: i32,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A user's cart.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub subtotal: Money,
    /// Total units across all lines.
    pub item_count: u32,
}

impl Cart {
    /// Build a cart and its totals from its lines.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let subtotal = lines.iter().map(CartLine::line_total).sum();
        let item_count = lines.iter().map(|l| l.quantity).sum();
        Self {
            lines,
            subtotal,
            item_count,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A favourited product.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteItem {
    pub product: ProductSummary,
    pub added_at: DateTime<Utc>,
}

/// A line of a placed order. Title and price are snapshots taken at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted.
    pub product_id: Option<ProductId>,
    pub seller_id: UserId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub subtotal: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sellers with at least one line in this order, deduplicated.
    #[must_use]
    pub fn seller_ids(&self) -> Vec<UserId> {
        let mut sellers: Vec<UserId> = self.items.iter().map(|i| i.seller_id).collect();
        sellers.sort_unstable();
        sellers.dedup();
        sellers
    }

    /// Currency the order was charged in.
    #[must_use]
    pub const fn currency_code(&self) -> CurrencyCode {
        self.subtotal.currency_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, cents: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            title: format!("item {id}"),
            image_url: None,
            unit_price: Money::from_cents(cents, CurrencyCode::USD),
            quantity,
            stock: 10,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart::from_lines(vec![line(1, 1250, 2), line(2, 300, 3)]);
        assert_eq!(cart.subtotal, Money::from_cents(3400, CurrencyCode::USD));
        assert_eq!(cart.item_count, 5);
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::from_lines(Vec::new());
        assert!(cart.is_empty());
        assert_eq!(cart.item_count, 0);
        assert!(!cart.subtotal.is_positive());
    }

    #[test]
    fn test_order_seller_ids_dedup() {
        let item = |id: i32, seller: i32| OrderItem {
            id: OrderItemId::new(id),
            product_id: Some(ProductId::new(id)),
            seller_id: UserId::new(seller),
            title: "x".to_owned(),
            unit_price: Money::from_cents(100, CurrencyCode::USD),
            quantity: 1,
        };
        let order = Order {
            id: OrderId::new(1),
            user_id: UserId::new(9),
            status: OrderStatus::Pending,
            items: vec![item(1, 4), item(2, 3), item(3, 4)],
            shipping_address: ShippingAddress {
                full_name: "Ada Maker".to_owned(),
                line1: "1 Loom St".to_owned(),
                line2: None,
                city: "Portland".to_owned(),
                region: None,
                postal_code: "97201".to_owned(),
                country: "US".to_owned(),
                phone: None,
            },
            subtotal: Money::from_cents(300, CurrencyCode::USD),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.seller_ids(), vec![UserId::new(3), UserId::new(4)]);
    }
}
