//! PostgreSQL implementations of the service ports.

pub mod abandoned;
pub mod logs;
pub mod orders;
pub mod products;
pub mod settings;
pub mod wishlist;

pub use abandoned::PgAbandonedCartRepository;
pub use logs::PgLogRepository;
pub use orders::PgOrderRepository;
pub use products::PgProductRepository;
pub use settings::PgSettingsStore;
pub use wishlist::PgWishlistRepository;
