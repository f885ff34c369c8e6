//! Business logic services for the marketplace API.
//!
//! # Services
//!
//! - `auth` - Registration, login and password management (Argon2id)
//! - `catalog` - Product listing cache in front of the product repository
//! - `chat` - In-process broadcast hub for live conversation streams

pub mod auth;
pub mod catalog;
pub mod chat;

pub use auth::{AuthError, AuthService};
pub use catalog::CatalogCache;
pub use chat::ChatHub;
