//! # Session
//!
//! Drives one connection end-to-end: read the inbound bytes (bounded in
//! size and time), decode exactly one packet, verify, dispatch, write
//! the reply iff one was produced, close.
//!
//! Every failure mode (decode error, verification failure, oversize,
//! timeout) ends the session with **zero bytes written**, observably
//! identical to a network-level hang from the sender's side. The reason
//! is surfaced only through tracing and metrics.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, trace, warn};

use crate::config::LimitsConfig;
use crate::core::packet::Packet;
use crate::error::DropReason;
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::verifier::{verify, TrustCheck, Verdict};
use crate::utils::metrics::Metrics;

/// Outcome of one ingestion cycle.
///
/// Rejection is a value, not an error: nothing here can leak onto the
/// wire, and the drop reason feeds diagnostics only.
#[derive(Debug)]
pub enum Outcome {
    /// Packet authenticated; the handler's reply, if any.
    Deliver(Option<Packet>),
    /// Packet silently discarded.
    Drop(DropReason),
}

/// The pure pipeline: bytes in, verdict out. No I/O, so the whole
/// accept/drop surface is testable without sockets.
pub fn ingest(bytes: &[u8], dispatcher: &Dispatcher, trust: &dyn TrustCheck) -> Outcome {
    let packet = match Packet::from_bytes(bytes) {
        Ok(packet) => packet,
        Err(err) => {
            debug!(error = %err, "decode failed");
            return Outcome::Drop(DropReason::from(&err));
        }
    };

    match verify(packet, trust) {
        Verdict::Accept { packet, verified_key } => {
            trace!(
                id = %packet.id,
                src = %packet.src,
                key = %hex::encode(verified_key),
                "packet authenticated"
            );
            Outcome::Deliver(dispatcher.dispatch(&packet))
        }
        Verdict::Drop(reason) => Outcome::Drop(reason),
    }
}

/// Run one session over `stream` and return its outcome (for the accept
/// loop's bookkeeping; by then all wire effects already happened).
pub async fn run<S>(
    mut stream: S,
    limits: &LimitsConfig,
    dispatcher: &Dispatcher,
    trust: &dyn TrustCheck,
    metrics: &Metrics,
) -> Outcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let buf = match read_one_message(&mut stream, limits).await {
        Ok(buf) => buf,
        Err(reason) => {
            metrics.record_drop(reason);
            debug!(reason = %reason, "session dropped while reading");
            return Outcome::Drop(reason);
        }
    };
    metrics.record_bytes_received(buf.len() as u64);

    let outcome = ingest(&buf, dispatcher, trust);
    match &outcome {
        Outcome::Deliver(reply) => {
            metrics.packet_accepted();
            if let Some(reply) = reply {
                let mut out = BytesMut::new();
                reply.encode_into(&mut out);
                if let Err(e) = write_reply(&mut stream, &out).await {
                    warn!(error = %e, "failed to write reply");
                } else {
                    metrics.reply_sent(out.len() as u64);
                }
            }
        }
        Outcome::Drop(reason) => {
            metrics.record_drop(*reason);
            debug!(reason = %reason, "packet dropped");
        }
    }
    outcome
}

/// Read "the rest of what's available": the protocol has no length
/// framing, so one message is whatever arrives before the client
/// half-closes or goes idle.
///
/// Two ceilings apply, and overrunning either is treated exactly like a
/// verification failure: `read_timeout` bounds the whole read (a silent
/// or slow sender cannot hold the task), and `max_packet_bytes` bounds
/// buffering (reading stops as soon as the ceiling is crossed). After
/// the first bytes arrive, a short idle grace ends the message for
/// clients that keep their write side open while waiting for the reply.
async fn read_one_message<S>(stream: &mut S, limits: &LimitsConfig) -> Result<BytesMut, DropReason>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(4096);
    let deadline = Instant::now() + limits.read_timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            if buf.is_empty() {
                return Err(DropReason::Timeout);
            }
            return Ok(buf);
        }
        let wait = if buf.is_empty() {
            remaining
        } else {
            remaining.min(limits.read_idle_grace)
        };

        match timeout(wait, stream.read_buf(&mut buf)).await {
            // Idle: either nothing ever arrived, or the message is done.
            Err(_elapsed) => {
                if buf.is_empty() {
                    return Err(DropReason::Timeout);
                }
                return Ok(buf);
            }
            // EOF: the client half-closed after sending.
            Ok(Ok(0)) => return Ok(buf),
            Ok(Ok(_)) => {
                if buf.len() > limits.max_packet_bytes {
                    return Err(DropReason::Oversize);
                }
            }
            Ok(Err(e)) => {
                debug!(error = %e, "read error, treating as timeout");
                return Err(DropReason::Timeout);
            }
        }
    }
}

async fn write_reply<S>(stream: &mut S, bytes: &[u8]) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(bytes).await?;
    stream.flush().await?;
    stream.shutdown().await
}
