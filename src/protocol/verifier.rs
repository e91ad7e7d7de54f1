//! # Verifier
//!
//! The accept/drop decision that gates every other behavior. One inbound
//! packet runs through a fixed sequence of checks with terminal outcomes
//! only; the result is a pure [`Verdict`] value, never a wire-visible
//! error (four distinct reject reasons must stay indistinguishable to
//! the sender (the anti-oracle property).
//!
//! Trust model: the public key is **self-asserted**. A successful
//! signature check proves only that the sender holds the private key
//! matching the `pk` it embedded, not that the key is authorized. The
//! authorization question is delegated to a pluggable [`TrustCheck`]
//! consulted after signature success; the default [`AllowAll`] keeps the
//! pure proof-of-possession behavior.

use std::collections::HashSet;

use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};

use crate::core::packet::{Packet, PUBLIC_KEY_LEN, SIGNATURE_LEN};
use crate::error::DropReason;

/// Terminal outcome of verifying one inbound packet.
#[derive(Debug)]
pub enum Verdict {
    /// Signature verified and the key passed the trust check.
    Accept {
        packet: Packet,
        /// The key that actually verified, for handlers and diagnostics.
        verified_key: [u8; PUBLIC_KEY_LEN],
    },
    /// Rejected; `DropReason` is diagnostics-only and never hits the wire.
    Drop(DropReason),
}

/// Post-signature authorization hook.
///
/// Implementations must be cheap and read-only during request handling;
/// registry updates happen out-of-band.
pub trait TrustCheck: Send + Sync {
    /// Whether `pk` may act as `src`. Called only after the signature
    /// over the sign payload has verified.
    fn is_trusted(&self, pk: &[u8; PUBLIC_KEY_LEN], src: &str) -> bool;
}

/// Default policy: proof of possession is enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl TrustCheck for AllowAll {
    fn is_trusted(&self, _pk: &[u8; PUBLIC_KEY_LEN], _src: &str) -> bool {
        true
    }
}

/// Explicit key registry: only enumerated public keys are accepted,
/// whatever `src` they claim.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    keys: HashSet<[u8; PUBLIC_KEY_LEN]>,
}

impl Allowlist {
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = [u8; PUBLIC_KEY_LEN]>,
    {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl TrustCheck for Allowlist {
    fn is_trusted(&self, pk: &[u8; PUBLIC_KEY_LEN], _src: &str) -> bool {
        self.keys.contains(pk)
    }
}

/// Run the verification state machine over one decoded packet.
///
/// Check order is fixed and shape checks run before any signature math:
/// unsigned, then key length, then signature length, then the Ed25519
/// verify over the sign payload, then the trust check.
pub fn verify(packet: Packet, trust: &dyn TrustCheck) -> Verdict {
    if packet.sig.is_empty() {
        return Verdict::Drop(DropReason::Unsigned);
    }

    let pk: [u8; PUBLIC_KEY_LEN] = match packet.pk.as_slice().try_into() {
        Ok(pk) => pk,
        Err(_) => return Verdict::Drop(DropReason::MalformedKey),
    };

    let sig_bytes: [u8; SIGNATURE_LEN] = match packet.sig.as_slice().try_into() {
        Ok(sig) => sig,
        Err(_) => return Verdict::Drop(DropReason::MalformedSignature),
    };

    // 32 bytes that do not decode to a curve point fail the signature
    // check, same as a wrong key would.
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk) else {
        return Verdict::Drop(DropReason::BadSignature);
    };
    let signature = Signature::from_bytes(&sig_bytes);

    let payload = packet.sign_payload();
    if verifying_key.verify(&payload, &signature).is_err() {
        return Verdict::Drop(DropReason::BadSignature);
    }

    if !trust.is_trusted(&pk, &packet.src) {
        return Verdict::Drop(DropReason::Untrusted);
    }

    Verdict::Accept {
        packet,
        verified_key: pk,
    }
}
