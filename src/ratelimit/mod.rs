//! Per-action sliding-window rate limiting.
//!
//! Every limited action is named in [`LimiterTable`]; handlers resolve an
//! identifier with [`resolve_identifier`] and consult the shared
//! [`RateLimiter`] held in application state.

mod clock;
mod identifier;
mod limiter;
mod table;

pub use clock::{Clock, ManualClock, SystemClock};
pub use identifier::{client_address, resolve_identifier};
pub use limiter::{FailurePolicy, RateLimitOutcome, RateLimiter};
pub use table::{LimiterConfig, LimiterName, LimiterTable};
