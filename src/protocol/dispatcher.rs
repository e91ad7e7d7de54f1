use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::core::packet::{Packet, PacketType};

type HandlerFn = dyn Fn(&Packet) -> Option<Packet> + Send + Sync + 'static;

/// Routing key: packet type plus destination; `None` destination is the
/// wildcard slot for that type.
type RouteKey = (PacketType, Option<Cow<'static, str>>);

/// Routes authenticated packets to handlers by `(typ, dst)`.
///
/// Invoked only on [`Verdict::Accept`](crate::protocol::verifier::Verdict);
/// the dispatcher never sees a packet that failed verification. Handlers
/// return `Some(reply)` to emit exactly one reply or `None` to close the
/// connection without writing; an unrouted packet behaves like `None`.
///
/// Registration happens at startup; dispatch takes the read side only,
/// so the message path is lock-contention free in practice.
pub struct Dispatcher {
    handlers: RwLock<HashMap<RouteKey, Box<HandlerFn>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// A dispatcher with the stock wiring: `Ask` to any destination gets
    /// the canned `done` reply. Placeholder for real business logic,
    /// which plugs in through [`register`](Self::register).
    pub fn with_defaults() -> Self {
        let d = Self::new();
        d.register_any(PacketType::Ask, |packet| Some(packet.reply("done")));
        d
    }

    /// Register a handler for an exact `(typ, dst)` route. An exact
    /// route wins over a wildcard for the same type.
    pub fn register<F>(&self, typ: PacketType, dst: impl Into<Cow<'static, str>>, handler: F)
    where
        F: Fn(&Packet) -> Option<Packet> + Send + Sync + 'static,
    {
        self.insert((typ, Some(dst.into())), Box::new(handler));
    }

    /// Register a wildcard handler for every destination of `typ`.
    pub fn register_any<F>(&self, typ: PacketType, handler: F)
    where
        F: Fn(&Packet) -> Option<Packet> + Send + Sync + 'static,
    {
        self.insert((typ, None), Box::new(handler));
    }

    fn insert(&self, key: RouteKey, handler: Box<HandlerFn>) {
        // Poisoning can only come from a panicking registration; recover
        // the map rather than wedging every future session.
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handlers.insert(key, handler);
    }

    /// Route one authenticated packet. `None` means no reply is sent.
    pub fn dispatch(&self, packet: &Packet) -> Option<Packet> {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let exact: RouteKey = (packet.typ, Some(Cow::Owned(packet.dst.clone())));
        let handler = handlers
            .get(&exact)
            .or_else(|| handlers.get(&(packet.typ, None)));

        match handler {
            Some(handler) => handler(packet),
            None => {
                debug!(typ = ?packet.typ, dst = %packet.dst, "no route for packet");
                None
            }
        }
    }
}
