//! # Service Layer
//!
//! Connection-facing plumbing: one [`session`] per accepted connection,
//! driven by the [`server`] accept loop.
//!
//! The protocol is strictly one-shot: each connection carries at most
//! one decode/verify/dispatch/reply cycle and is then closed. Sessions
//! share nothing mutable; the dispatcher and trust check are read-only
//! behind `Arc`.

pub mod server;
pub mod session;
