//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;
pub mod share_code;
pub mod wishlist;

pub use cart::{AbandonedCartSnapshot, CartError, CartItem, CartMetadata, CartStore, CatalogLookup, SavedCart, StockIssue, StockLevels, StockLookup, StockValidation};
pub use order::{GatewayStatus, Order, OrderError, OrderRecord, OrderStatus, PaymentStatus, StatusChange};
pub use product::{screen_rows, ImportSummary, ProductImportRow, DETAIL_LIMIT};
pub use share_code::{ShareCodeError, SharedLine};
pub use wishlist::{Wishlist, WishlistItem};
