//! Craftly Core - Shared types library.
//!
//! This crate provides common types used across all Craftly components:
//! - `api` - The marketplace REST backend
//! - `client` - Typed SDK with repositories and view models
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Validation rules live here so the
//! server and the client reject exactly the same input.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`validation`] - Input predicates (passwords, ratings, review comments)
//! - [`conversation`] - Deterministic conversation IDs
//! - [`cache`] - Single-entry TTL cache slot
//! - [`catalog`] - Product filtering and sorting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod catalog;
pub mod conversation;
pub mod types;
pub mod validation;

pub use cache::TtlSlot;
pub use catalog::{ProductFilter, ProductSort, ProductSummary};
pub use conversation::{ConversationError, ConversationId};
pub use types::*;
pub use validation::ValidationError;
