//! # keep-protocol
//!
//! Authenticated packet ingestion core for the keep service: canonical
//! message encoding, Ed25519 verification against a self-asserted key,
//! and the accept/drop decision that gates everything downstream.
//!
//! ## Pipeline
//! ```text
//! bytes -> decode -> Packet -> sign payload -> verify -> dispatch -> reply | silent drop
//! ```
//!
//! ## Modules
//! - [`core`]: the [`Packet`](core::packet::Packet) entity and its
//!   canonical wire codec
//! - [`protocol`]: signing contract, verification state machine, and
//!   `(typ, dst)` handler routing
//! - [`service`]: one-shot sessions and the TCP accept loop
//! - [`config`], [`error`], [`utils`]: configuration, error taxonomy,
//!   logging/metrics/timeouts
//!
//! ## Security Properties
//! - Only packets whose Ed25519 signature verifies over the canonical
//!   sign payload are actioned
//! - Every rejection is silent: no reply, no error frame, just a closed
//!   connection, so a remote peer cannot probe which check failed
//! - Size and time ceilings bound what any single connection can cost
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use keep_protocol::config::KeepConfig;
//! use keep_protocol::protocol::dispatcher::Dispatcher;
//! use keep_protocol::protocol::verifier::AllowAll;
//! use keep_protocol::service::server;
//!
//! #[tokio::main]
//! async fn main() -> keep_protocol::error::Result<()> {
//!     let config = KeepConfig::from_env()?;
//!     config.validate_strict()?;
//!     keep_protocol::utils::logging::init(&config.logging)?;
//!     server::run(&config, Arc::new(Dispatcher::with_defaults()), Arc::new(AllowAll)).await
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use crate::core::packet::{Packet, PacketType};
pub use crate::error::{DecodeError, DropReason, ProtocolError, Result};
pub use crate::protocol::dispatcher::Dispatcher;
pub use crate::protocol::verifier::{AllowAll, Allowlist, TrustCheck, Verdict};
pub use crate::service::session::Outcome;
