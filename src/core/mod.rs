//! # Core Protocol Components
//!
//! The packet entity and its canonical wire codec.
//!
//! ## Components
//! - **Packet**: the single message entity (typ/id/src/dst/body/sig/pk)
//! - **Codec**: canonical tagged-field encoding, shared by signer and verifier
//!
//! ## Wire Format
//! ```text
//! [field tag (varint)] [value (varint | length-prefixed bytes)] ...
//! ```
//!
//! ## Security
//! - Canonical form: fixed field order, defaults omitted, so equal packets
//!   always encode to identical bytes (the sign/verify payload invariant)
//! - Length validation before allocation; decode never dispatches on content

pub mod codec;
pub mod packet;
