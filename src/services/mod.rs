//! Pipeline services.
//!
//! The collection pipeline is split into focused services: per-conversation
//! collection, digest aggregation, email delivery, and the orchestrator that
//! sequences them for one run.

pub mod aggregator;
pub mod collector;
pub mod delivery;
pub mod digest_service;

pub use aggregator::DigestBuilder;
pub use collector::{collect, day_start, CollectOptions, Collected, HISTORY_SCAN_CAP};
pub use delivery::DeliveryService;
pub use digest_service::{DigestService, RunOutcome};
