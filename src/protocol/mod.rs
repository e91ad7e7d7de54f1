//! # Protocol Logic
//!
//! Everything between "bytes decoded" and "reply encoded": the signing
//! contract, the verification state machine, and handler routing.
//!
//! ## Components
//! - **Signer**: the client-side contract (keygen, sign a packet)
//! - **Verifier**: accept/drop decision over the sign payload
//! - **Dispatcher**: `(typ, dst)` routing to pluggable handlers

pub mod dispatcher;
pub mod signer;
pub mod verifier;
