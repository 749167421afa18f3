//! Dual-level rate limiting for the sitebridge gateway.
//!
//! Two rolling windows protect a shared, metered AI quota: one per observed
//! client identifier and one process-wide singleton. The global ceiling is
//! checked before any per-client bookkeeping so the shared resource is
//! protected first. Decisions are advisory and in-process only; when several
//! instances run, each enforces its own global ceiling.

pub mod limiter;
pub mod window;

pub use limiter::{Decision, DenyReason, RateLimitConfig, RateLimiter};
pub use window::RateWindow;
