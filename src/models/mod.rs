//! Domain models for the entitlement & live session core.
//!
//! All monetary amounts are integer cents (i64, >= 0) so pricing arithmetic
//! stays exact. Timestamps are server-assigned UTC.

pub mod catalog;
pub mod live;
pub mod subscription;

pub use catalog::{ContentItem, TierDefinition};
pub use live::{LiveAccessConfig, LiveMessage, MessageKind, Tipper};
pub use subscription::{PurchaseRecord, SubscriptionRecord, SubscriptionStatus};
