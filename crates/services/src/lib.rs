//! Application services for the storefront core.
//!
//! Each service wraps the document store with one aggregate's operations and
//! the cross-aggregate orchestration the domain layer cannot do alone. The
//! substantial piece is [`OrderService::place_order`], which turns a cart into
//! an order and decrements stock in one store transaction.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod notify;
pub mod orders;
pub mod reviews;
pub mod wishlist;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use error::{Result, ServiceError};
pub use inventory::InventoryLedger;
pub use notify::{LoggingNotifier, Notifier, NotifyError, RecordingNotifier, SentNotification};
pub use orders::{AddressUpdate, DeliveryReport, OrderService, PlaceOrder};
pub use reviews::{NewReview, ProductReviewQuery, ReviewService};
pub use wishlist::WishlistService;
