//! Timeout defaults for the read path and server lifecycle.
//!
//! The read ceilings exist for the same reason the byte ceiling does: a
//! slow or silent sender must not hold a session task, and exceeding a
//! ceiling is treated exactly like a verification failure (silent close).

use std::time::Duration;

/// Hard ceiling on the whole inbound read; matches the deployed
/// clients' own 5-second wait.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle gap after the first bytes that ends the message, for clients
/// that keep their write side open while waiting for the reply.
pub const DEFAULT_READ_IDLE_GRACE: Duration = Duration::from_millis(250);

/// How long a graceful shutdown waits for in-flight sessions.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
