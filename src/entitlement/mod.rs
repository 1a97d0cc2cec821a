//! The entitlement core: per-viewer ledger snapshot, the pure access
//! resolver, and the pricing negotiator.

pub mod ledger;
pub mod pricing;
pub mod resolver;

pub use ledger::EntitlementLedger;
pub use pricing::{negotiate, ChangeKind, PricingQuote};
pub use resolver::{resolve, AccessDecision, DenyReason, GrantReason};
