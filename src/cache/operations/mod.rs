//! Redis adapters for the store seams.
pub mod cache;
pub mod rate_limit;

pub use cache::RedisCache;
pub use rate_limit::RedisCounterStore;
