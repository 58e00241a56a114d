//! Plan limits and the cached per-user subscription snapshot.

mod provider;
mod snapshot;

pub use provider::{DEFAULT_SNAPSHOT_TTL, SnapshotProvider};
pub use snapshot::{FREE_PLAN_SLUG, PlanInterval, PlanLimits, SubscriptionSnapshot};
