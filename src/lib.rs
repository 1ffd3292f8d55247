//! Vapeshop Commerce
//!
//! Storefront state and back-office functions for a retail vape shop.
//!
//! ## Features
//! - Shopping cart store with saved carts, share codes and versioned persistence
//! - Wishlist with guest sessions and guest-to-account migration
//! - Theme and icon customisation registry
//! - Payment gateway notifications (PayFast)
//! - Product bulk import
//! - Remote settings, abandoned-cart capture and a client logging sink

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::aggregates::{CartItem, CartStore, Order, Wishlist};
pub use storage::{KeyValueStorage, PersistedCart};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Setting not found: {0}")]
    SettingNotFound(String),

    #[error("Abandoned cart not found: {0}")]
    AbandonedCartNotFound(String),

    #[error("Payment amount mismatch: expected {expected}, received {received}")]
    AmountMismatch { expected: rust_decimal::Decimal, received: rust_decimal::Decimal },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Order(#[from] domain::aggregates::OrderError),

    #[error(transparent)]
    Cart(#[from] domain::aggregates::CartError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Publish error: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
