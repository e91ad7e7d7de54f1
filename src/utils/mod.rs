//! # Utility Modules
//!
//! Supporting utilities for logging, metrics, and timing.
//!
//! ## Components
//! - **Logging**: Structured logging configuration (tracing-subscriber)
//! - **Metrics**: Thread-safe observability counters, including the
//!   per-reason drop counters that make silent drops visible internally
//! - **Timeout**: Default time ceilings for the read path and shutdown

pub mod logging;
pub mod metrics;
pub mod timeout;

pub use metrics::Metrics;
