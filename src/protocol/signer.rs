//! # Signing Contract
//!
//! The client side of the protocol, kept in-crate so tests and embedded
//! clients exercise exactly the canonicalizer the verifier uses:
//!
//! 1. Build a [`Packet`] with every field except `sig` and `pk`.
//! 2. Its canonical encoding at that point is the sign payload.
//! 3. Sign the payload with Ed25519.
//! 4. Set `sig` and `pk`, encode the full packet, send.
//!
//! The server reconstructs steps 1-2 from the decoded packet and
//! verifies.

use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;

use crate::core::packet::Packet;

/// Generate an ephemeral Ed25519 signing key.
pub fn generate_key() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Sign `packet` in place with `key`.
///
/// Any stale `sig`/`pk` already on the packet is discarded before the
/// sign payload is computed, so re-signing with a different key is safe.
pub fn sign_packet(packet: &mut Packet, key: &SigningKey) {
    packet.sig.clear();
    packet.pk.clear();
    let payload = packet.sign_payload();
    packet.sig = key.sign(&payload).to_bytes().to_vec();
    packet.pk = key.verifying_key().to_bytes().to_vec();
}

/// Convenience for building a signed packet in one expression.
pub fn signed(mut packet: Packet, key: &SigningKey) -> Packet {
    sign_packet(&mut packet, key);
    packet
}
