//! Domain models for the marketplace API.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Most of them serialize directly as API responses.

pub mod conversation;
pub mod order;
pub mod product;
pub mod profile;
pub mod review;
pub mod session;
pub mod user;

pub use conversation::{Conversation, Message};
pub use order::{Cart, CartLine, FavoriteItem, Order, OrderItem};
pub use product::{NewProduct, ProductDetail, ProductUpdate};
pub use profile::{Notification, Profile, ProfileUpdate, PublicProfile};
pub use review::{NewReview, Review};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
