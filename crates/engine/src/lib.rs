//! Price monitoring and alert dispatch engine.
//!
//! The engine runs a periodic tick loop: refresh a bounded batch of
//! tracked product prices, record significant observations, discover new
//! catalog products when due, and email subscribers whose alert
//! conditions are met — under a per-subscription cooldown and a
//! per-recipient rate limit.

pub mod alerts;
pub mod discovery;
pub mod history;
pub mod ratelimit;
pub mod refresh;
pub mod scheduler;

pub use alerts::AlertEvaluator;
pub use discovery::{should_discover_this_tick, DiscoveryRunner};
pub use history::PriceRecorder;
pub use ratelimit::AlertRateLimiter;
pub use refresh::{PriceRefresher, RefreshOutcome};
pub use scheduler::{MonitorEngine, TickSummary};
