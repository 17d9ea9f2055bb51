//! Packet handlers, grouped in priority buckets per packet id.
//!
//! Dispatch walks the buckets in ascending priority. A handler may
//! discard the packet, which ends the chain for that packet only.

use std::{collections::BTreeMap, sync::Arc};

use fnv::FnvHashMap;

use crate::{
    batch::PacketBatch,
    error::NetResult,
    packet::{Packet, PacketId},
    transport::Session,
    Server,
};

/// Dispatch priority. Lower values run first.
pub type Priority = i32;

/// Everything a handler may touch while processing a packet.
pub struct HandlerContext<'a, S: Server> {
    /// The player bound to the session, if any.
    pub player: Option<&'a S::Player>,
    pub session: &'a dyn Session,
    pub server: &'a S,
}

impl<'a, S: Server> HandlerContext<'a, S> {
    /// Sends `packet` back over the session in a batch of its own.
    /// Discarded packets are not sent.
    pub fn reply(&self, packet: &mut Packet, priority: u8) -> NetResult<bool> {
        PacketBatch::send_packet(packet, self.session, priority)
    }
}

/// Reacts to a decoded packet.
pub trait PacketHandler<S: Server>: Send + Sync {
    /// Returns true if the packet was meaningfully handled.
    fn handle(&self, packet: &mut Packet, ctx: &HandlerContext<'_, S>) -> bool;
}

impl<S, F> PacketHandler<S> for F
where
    S: Server,
    F: Fn(&mut Packet, &HandlerContext<'_, S>) -> bool + Send + Sync,
{
    fn handle(&self, packet: &mut Packet, ctx: &HandlerContext<'_, S>) -> bool {
        self(packet, ctx)
    }
}

pub type SharedHandler<S> = Arc<dyn PacketHandler<S>>;

/// Result of running a handler chain over one packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Any handler returned true.
    pub handled: bool,
    /// The chain stopped because the packet was discarded.
    pub discarded: bool,
}

/// Runs `buckets` over `packet` in order.
pub fn run_chain<S: Server>(
    buckets: &[Vec<SharedHandler<S>>],
    packet: &mut Packet,
    ctx: &HandlerContext<'_, S>,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for handler in buckets.iter().flatten() {
        if packet.is_discarded() {
            outcome.discarded = true;
            return outcome;
        }
        outcome.handled |= handler.handle(packet, ctx);
    }
    outcome.discarded = packet.is_discarded();
    outcome
}

/// Handlers keyed by packet id, then priority.
pub struct HandlerRegistry<S: Server> {
    handlers: FnvHashMap<PacketId, BTreeMap<Priority, Vec<SharedHandler<S>>>>,
}

impl<S: Server> Default for HandlerRegistry<S> {
    fn default() -> Self {
        Self {
            handlers: FnvHashMap::default(),
        }
    }
}

impl<S: Server> HandlerRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` to the bucket for `priority`.
    ///
    /// Negative priorities are rejected. Handlers sharing a priority
    /// currently run in registration order, but callers must not rely
    /// on that.
    pub fn register_packet_handler(
        &mut self,
        id: PacketId,
        handler: impl PacketHandler<S> + 'static,
        priority: Priority,
    ) -> bool {
        if priority < 0 {
            tracing::warn!("refusing handler for packet 0x{id:02x} with negative priority {priority}");
            return false;
        }
        self.handlers
            .entry(id)
            .or_default()
            .entry(priority)
            .or_default()
            .push(Arc::new(handler));
        true
    }

    /// Clears the bucket for `priority`.
    pub fn deregister_packet_handlers(&mut self, id: PacketId, priority: Priority) {
        if let Some(buckets) = self.handlers.get_mut(&id) {
            buckets.remove(&priority);
            if buckets.is_empty() {
                self.handlers.remove(&id);
            }
        }
    }

    /// The buckets for `id`, lowest priority first.
    pub fn get_packet_handlers(&self, id: PacketId) -> Vec<Vec<SharedHandler<S>>> {
        self.handlers
            .get(&id)
            .map(|buckets| buckets.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn dispatch(&self, packet: &mut Packet, ctx: &HandlerContext<'_, S>) -> DispatchOutcome {
        run_chain(&self.get_packet_handlers(packet.id()), packet, ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use parking_lot::Mutex;

    use super::*;
    use crate::{
        config::ServerIdentity,
        packet::{play::PlayStatus, PacketKind},
        transport::{memory::MemorySession, RawPacket, Reliability},
    };

    #[derive(Default)]
    struct Recorder {
        identity: ServerIdentity,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Server for Recorder {
        type Player = ();

        fn identity(&self) -> &ServerIdentity {
            &self.identity
        }

        fn player_by_session(&self, _: &dyn Session) -> Option<()> {
            None
        }

        fn handle_raw(&self, _: RawPacket) {}

        fn handle_disconnect(&self, _: Option<()>, _: &dyn Session) {}
    }

    fn record(name: &'static str, result: bool) -> impl PacketHandler<Recorder> {
        move |_: &mut Packet, ctx: &HandlerContext<'_, Recorder>| {
            ctx.server.calls.lock().push(name);
            result
        }
    }

    fn session() -> MemorySession {
        MemorySession::new("127.0.0.1:19132".parse::<SocketAddr>().unwrap())
    }

    fn dispatch(registry: &HandlerRegistry<Recorder>, server: &Recorder) -> DispatchOutcome {
        let session = session();
        let ctx = HandlerContext {
            player: None,
            session: &session,
            server,
        };
        let mut packet = Packet::new(PlayStatus::default());
        registry.dispatch(&mut packet, &ctx)
    }

    #[test]
    fn runs_in_priority_order() {
        let server = Recorder::default();
        let mut registry = HandlerRegistry::new();
        assert!(registry.register_packet_handler(PlayStatus::ID, record("five", false), 5));
        assert!(registry.register_packet_handler(PlayStatus::ID, record("one", false), 1));
        assert!(registry.register_packet_handler(PlayStatus::ID, record("three", true), 3));

        let outcome = dispatch(&registry, &server);
        assert_eq!(*server.calls.lock(), ["one", "three", "five"]);
        assert!(outcome.handled);
        assert!(!outcome.discarded);
    }

    #[test]
    fn discard_stops_the_chain() {
        let server = Recorder::default();
        let mut registry = HandlerRegistry::new();
        registry.register_packet_handler(PlayStatus::ID, record("late", true), 9);
        registry.register_packet_handler(
            PlayStatus::ID,
            |packet: &mut Packet, ctx: &HandlerContext<'_, Recorder>| {
                ctx.server.calls.lock().push("discarder");
                packet.discard();
                false
            },
            2,
        );
        registry.register_packet_handler(PlayStatus::ID, record("same bucket", true), 2);

        let outcome = dispatch(&registry, &server);
        assert_eq!(*server.calls.lock(), ["discarder"]);
        assert_eq!(
            outcome,
            DispatchOutcome {
                handled: false,
                discarded: true
            }
        );
    }

    #[test]
    fn unhandled_when_every_handler_declines() {
        let server = Recorder::default();
        let mut registry = HandlerRegistry::new();
        registry.register_packet_handler(PlayStatus::ID, record("a", false), 0);
        registry.register_packet_handler(PlayStatus::ID, record("b", false), 0);
        assert!(!dispatch(&registry, &server).handled);
        assert_eq!(server.calls.lock().len(), 2);

        let empty = HandlerRegistry::new();
        assert_eq!(dispatch(&empty, &server), DispatchOutcome::default());
    }

    #[test]
    fn negative_priority_is_rejected() {
        let mut registry = HandlerRegistry::<Recorder>::new();
        assert!(!registry.register_packet_handler(PlayStatus::ID, record("x", true), -1));
        assert!(registry.get_packet_handlers(PlayStatus::ID).is_empty());
    }

    #[test]
    fn deregister_clears_one_bucket() {
        let mut registry = HandlerRegistry::<Recorder>::new();
        registry.register_packet_handler(PlayStatus::ID, record("a", true), 1);
        registry.register_packet_handler(PlayStatus::ID, record("b", true), 1);
        registry.register_packet_handler(PlayStatus::ID, record("c", true), 4);

        let buckets = registry.get_packet_handlers(PlayStatus::ID);
        assert_eq!(buckets.iter().map(Vec::len).collect::<Vec<_>>(), [2, 1]);

        registry.deregister_packet_handlers(PlayStatus::ID, 1);
        assert_eq!(registry.get_packet_handlers(PlayStatus::ID).len(), 1);
        registry.deregister_packet_handlers(PlayStatus::ID, 4);
        assert!(registry.get_packet_handlers(PlayStatus::ID).is_empty());
    }

    #[test]
    fn reply_sends_reliable_ordered() {
        let server = Recorder::default();
        let session = session();
        let ctx = HandlerContext {
            player: None,
            session: &session,
            server: &server,
        };
        let mut packet = Packet::new(PlayStatus {
            status: PlayStatus::PLAYER_SPAWN,
        });
        assert!(ctx.reply(&mut packet, 3).unwrap());

        let sent = session.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reliability, Reliability::ReliableOrdered);
        assert_eq!(sent[0].priority, 3);
        assert_eq!(sent[0].buffer, [7, 0x02, 0, 0, 3, 0, 0, 0]);
        let batch = PacketBatch::decode(&sent[0].buffer).unwrap();
        assert_eq!(batch.buffers(), [vec![0x02, 0, 0, 3, 0, 0, 0]]);

        packet.discard();
        assert!(!ctx.reply(&mut packet, 3).unwrap());
        assert!(session.sent().is_empty());
    }
}
