//! Application services
//!
//! Each service owns its persistence port as a trait object so the HTTP layer
//! and the tests can swap in different backends.

pub mod abandoned;
pub mod events;
pub mod import;
pub mod logging;
pub mod orders;
pub mod payments;
pub mod settings;
pub mod theme;
pub mod wishlist;

pub use abandoned::{AbandonedCart, AbandonedCartRepository, AbandonedCartService};
pub use events::{EventPublisher, NatsPublisher};
pub use import::{ImportRequest, ImportService, InsertOutcome, ProductImportRepository};
pub use logging::{LogEvent, LogLevel, LogRepository, LogService};
pub use orders::{OrderRepository, OrderService};
pub use payments::{PayfastNotification, PaymentsService};
pub use settings::SettingsStore;
pub use theme::ThemeService;
pub use wishlist::{WishlistOutcome, WishlistOwner, WishlistRepository, WishlistService};
