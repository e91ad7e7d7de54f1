//! # Error Types
//!
//! Error handling for the keep ingestion pipeline.
//!
//! Two taxonomies live here and they are deliberately separate:
//!
//! - [`ProtocolError`] is the crate-level error type returned through
//!   `Result` by fallible operations (decoding, config loading, I/O).
//! - [`DropReason`] classifies why an inbound packet was silently
//!   discarded. It is **never** written to the wire: a rejected sender
//!   observes only a closed connection, regardless of which reason
//!   fired. The reason exists for logs and metrics alone.
//!
//! All errors implement `std::error::Error` for interoperability.

use std::io;
use thiserror::Error;

/// Errors produced while decoding one wire packet.
///
/// The decoder reads exactly one canonical message per buffer; each
/// variant maps onto one [`DropReason`] when it occurs inside a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A varint or length-delimited field ran past the end of the buffer.
    #[error("packet truncated mid-field")]
    Truncated,

    /// Structurally invalid input: unknown field number, wrong wire type,
    /// unknown enum discriminant, or invalid UTF-8 in a string field.
    #[error("malformed packet: {0}")]
    Malformed(&'static str),

    /// Bytes remained after one complete message was decoded.
    #[error("trailing bytes after one complete packet")]
    TrailingBytes,
}

/// Primary error type for all protocol operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Why an inbound packet was dropped.
///
/// Every variant is locally terminal and silent: the session closes
/// without writing a byte, so a remote peer cannot distinguish one
/// reason from another. Surfaced only through tracing and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Wire bytes ended mid-field.
    Truncated,
    /// Wire bytes were structurally invalid.
    Malformed,
    /// Bytes remained after one complete message.
    TrailingBytes,
    /// No signature present.
    Unsigned,
    /// Signature present but the embedded public key is not 32 bytes.
    MalformedKey,
    /// Signature present but not a valid Ed25519 signature length.
    MalformedSignature,
    /// Signature did not verify over the sign payload.
    BadSignature,
    /// Signature verified but the trust check refused the key.
    Untrusted,
    /// Inbound bytes exceeded the per-packet ceiling.
    Oversize,
    /// The sender produced no complete message within the read deadline.
    Timeout,
}

impl DropReason {
    /// Stable lowercase label, used as a metrics/log field value.
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Truncated => "truncated",
            DropReason::Malformed => "malformed",
            DropReason::TrailingBytes => "trailing_bytes",
            DropReason::Unsigned => "unsigned",
            DropReason::MalformedKey => "malformed_key",
            DropReason::MalformedSignature => "malformed_signature",
            DropReason::BadSignature => "bad_signature",
            DropReason::Untrusted => "untrusted",
            DropReason::Oversize => "oversize",
            DropReason::Timeout => "timeout",
        }
    }
}

impl From<&DecodeError> for DropReason {
    fn from(err: &DecodeError) -> Self {
        match err {
            DecodeError::Truncated => DropReason::Truncated,
            DecodeError::Malformed(_) => DropReason::Malformed,
            DecodeError::TrailingBytes => DropReason::TrailingBytes,
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
