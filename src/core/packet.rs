//! # Packet Entity
//!
//! The single message type of the keep protocol. A packet is built fresh
//! by a sender, transmitted once, decoded once, and discarded after
//! handling; it carries no identity beyond the one message.
//!
//! `sig` and `pk` authenticate the packet: `sig` is an Ed25519 signature
//! over the [sign payload](Packet::sign_payload) and `pk` is the raw
//! 32-byte public key the sender asserts for itself. Both are empty on
//! unsigned packets and on replies.

use crate::error::DecodeError;

/// Ed25519 public keys are exactly this many bytes on the wire.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 signatures are exactly this many bytes on the wire.
pub const SIGNATURE_LEN: usize = 64;

/// Message kind discriminant.
///
/// Only `Ask` is exercised by the deployed clients; the enum is open for
/// growth, but any discriminant not listed here fails decoding as
/// malformed rather than being carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PacketType {
    /// A request expecting at most one reply.
    #[default]
    Ask = 0,
}

impl PacketType {
    /// Wire discriminant for canonical encoding.
    pub fn as_wire(self) -> u64 {
        self as u64
    }

    /// Parse a wire discriminant.
    pub fn from_wire(value: u64) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(PacketType::Ask),
            _ => Err(DecodeError::Malformed("unknown packet type")),
        }
    }
}

/// The sole message entity of the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    /// Message kind.
    pub typ: PacketType,
    /// Correlation identifier, caller-assigned; replies echo it.
    pub id: String,
    /// Claimed sender identity (e.g. `human:tester`).
    pub src: String,
    /// Target identity or service name.
    pub dst: String,
    /// Opaque application payload.
    pub body: String,
    /// Signature over the sign payload; empty when unsigned.
    pub sig: Vec<u8>,
    /// Raw public key asserted by the sender; empty when unsigned.
    pub pk: Vec<u8>,
}

impl Packet {
    /// Build an unsigned `Ask` packet.
    pub fn ask(id: &str, src: &str, dst: &str, body: &str) -> Self {
        Self {
            typ: PacketType::Ask,
            id: id.to_string(),
            src: src.to_string(),
            dst: dst.to_string(),
            body: body.to_string(),
            sig: Vec::new(),
            pk: Vec::new(),
        }
    }

    /// Structural validity of the authentication fields.
    ///
    /// `pk` must be empty or exactly 32 bytes; `sig` empty or exactly 64.
    /// Malformed packets are rejected before any signature math runs.
    pub fn is_well_formed(&self) -> bool {
        (self.pk.is_empty() || self.pk.len() == PUBLIC_KEY_LEN)
            && (self.sig.is_empty() || self.sig.len() == SIGNATURE_LEN)
    }

    /// Whether the packet carries a signature at all.
    pub fn is_signed(&self) -> bool {
        !self.sig.is_empty()
    }

    /// The exact bytes a signature covers: the canonical encoding of this
    /// packet with `sig` and `pk` cleared.
    ///
    /// Signer and verifier both call this; the byte-for-byte equality of
    /// the two computations is the central correctness invariant of the
    /// protocol.
    pub fn sign_payload(&self) -> Vec<u8> {
        let mut unsigned = self.clone();
        unsigned.sig.clear();
        unsigned.pk.clear();
        unsigned.to_bytes()
    }

    /// Build the reply to this packet with the given body.
    ///
    /// Fixed population policy (clients correlate replies by `id`):
    /// `typ` and `id` echo the request, `src`/`dst` are swapped so the
    /// service answers as the identity it was asked as, and `sig`/`pk`
    /// stay empty; replies are not signed.
    pub fn reply(&self, body: &str) -> Self {
        Self {
            typ: self.typ,
            id: self.id.clone(),
            src: self.dst.clone(),
            dst: self.src.clone(),
            body: body.to_string(),
            sig: Vec::new(),
            pk: Vec::new(),
        }
    }
}
