//! Wire types returned and accepted by the API.
//!
//! Responses are deserialized into these; request bodies are serialized
//! from them. Shared value types (IDs, money, statuses, addresses, product
//! summaries) come from `craftly-core`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use craftly_core::{
    ConversationId, Email, MessageId, Money, NotificationId, NotificationKind, OrderId,
    OrderItemId, OrderStatus, ProductId, ProductSummary, ReviewId, Role, ShippingAddress, UserId,
};

// =============================================================================
// Accounts
// =============================================================================

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub display_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product with its seller's name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductSummary,
    pub seller_name: String,
}

/// Fields for a new listing.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub stock: i32,
}

/// Partial listing update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
}

// =============================================================================
// Cart, favourites and orders
// =============================================================================

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub stock: i32,
    pub added_at: DateTime<Utc>,
}

/// The caller's cart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub subtotal: Money,
    pub item_count: u32,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for `product_id`, if it is in the cart.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuantityRequest {
    pub quantity: u32,
}

/// A favourited product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FavoriteItem {
    pub product: ProductSummary,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FavoriteStatus {
    pub favorite: bool,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub seller_id: UserId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
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

#[derive(Debug, Serialize)]
pub(crate) struct CheckoutRequest<'a> {
    pub shipping_address: &'a ShippingAddress,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusRequest {
    pub status: OrderStatus,
}

// =============================================================================
// Profiles and notifications
// =============================================================================

/// The caller's profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub email: Email,
    pub roles: Vec<Role>,
    pub display_name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub default_address: Option<ShippingAddress>,
    pub updated_at: DateTime<Utc>,
}

/// Another user's public profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub roles: Vec<Role>,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdatedResponse {
    pub updated: u64,
}

// =============================================================================
// Reviews
// =============================================================================

/// A product review.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Review submission.
#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub product_id: ProductId,
    pub rating: i16,
    pub comment: String,
}

// =============================================================================
// Chat
// =============================================================================

/// A conversation as seen by the caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub other_user_id: UserId,
    pub other_display_name: String,
    pub last_message: Option<String>,
    pub last_sender_id: Option<UserId>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartRequest {
    pub participant_id: UserId,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    pub text: &'a str,
}
