//! Drives a [`Transport`] once per tick and dispatches what it delivers.
//!
//! Each tick:
//!
//! 1. the transport clock advances once,
//! 2. every active session gets one unit of work on the worker pool,
//!    which drains its ready payloads and dispatches them in arrival
//!    order,
//! 3. sessionless messages go to [`Server::handle_raw`],
//! 4. every session that went away is reported to
//!    [`Server::handle_disconnect`] once, after its last unit of work
//!    has finished. A session still being drained is reported on a
//!    later tick.
//!
//! A session whose previous unit of work is still running is skipped
//! for the tick, so one backlogged session holds at most one worker.
pub mod stats;

use std::{
    net::{IpAddr, SocketAddr},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use anyhow::Context;
use fnv::FnvHashSet;
use gravel_utils::TickLoop;
use parking_lot::{Condvar, Mutex, RwLock};
use rayon::{ThreadPool, ThreadPoolBuilder};

use self::stats::{DispatchStats, StatsSnapshot};
use crate::{
    batch::PacketBatch,
    config::{AdapterConfig, ServerIdentity},
    error::{NetError, NetResult},
    handler::{run_chain, DispatchOutcome, HandlerContext, PacketHandler, Priority, SharedHandler},
    packet::{Packet, PacketBody, PacketId},
    registry::Registry,
    transport::{RawPacket, Session, Transport},
};

/// The game side of the adapter.
pub trait Server: Send + Sync + 'static {
    /// Whatever the server binds to a session.
    type Player: Send + Sync;

    fn identity(&self) -> &ServerIdentity;

    fn player_by_session(&self, session: &dyn Session) -> Option<Self::Player>;

    /// Receives messages that arrived outside any session.
    fn handle_raw(&self, packet: RawPacket);

    /// Called once per closed session, with its last known player.
    fn handle_disconnect(&self, player: Option<Self::Player>, session: &dyn Session);
}

struct Shared<T, S: Server> {
    transport: T,
    server: S,
    registry: RwLock<Registry<S>>,
    stats: DispatchStats,
    in_flight: Mutex<FnvHashSet<SocketAddr>>,
    idle: Condvar,
    pending_disconnects: Mutex<Vec<Arc<dyn Session>>>,
}

/// Clears a session's in-flight mark, even if its worker panics.
struct InFlight<'a, T, S: Server> {
    shared: &'a Shared<T, S>,
    address: SocketAddr,
}

impl<T, S: Server> Drop for InFlight<'_, T, S> {
    fn drop(&mut self) {
        self.shared.in_flight.lock().remove(&self.address);
        self.shared.idle.notify_all();
    }
}

impl<T: Transport, S: Server> Shared<T, S> {
    fn process_session(&self, session: &dyn Session) {
        let span = tracing::debug_span!("session", address = %session.address());
        let _enter = span.enter();

        for payload in session.ready_packets() {
            // handlers may bind a player while the previous payload is processed
            let player = self.server.player_by_session(session);
            let batch = match PacketBatch::decode(&payload) {
                Ok(batch) => batch,
                Err(e) => {
                    self.stats.batch_failed();
                    tracing::warn!("dropping payload of {} bytes: {e}", payload.len());
                    continue;
                }
            };

            for buffer in batch.into_buffers() {
                let decoded = self.registry.read().packets.decode_packet(buffer);
                match decoded {
                    Ok(mut packet) => {
                        self.dispatch(&mut packet, player.as_ref(), session);
                    }
                    Err(NetError::UnregisteredPacket(id)) => {
                        self.stats.decode_failed();
                        tracing::debug!("no packet registered for id 0x{id:02x}");
                    }
                    Err(e) => {
                        self.stats.decode_failed();
                        tracing::warn!("failed to decode packet: {e}");
                    }
                }
            }
        }
    }

    fn dispatch(
        &self,
        packet: &mut Packet,
        player: Option<&S::Player>,
        session: &dyn Session,
    ) -> DispatchOutcome {
        let handlers = self.registry.read().handlers.get_packet_handlers(packet.id());
        let ctx = HandlerContext {
            player,
            session,
            server: &self.server,
        };
        let outcome = run_chain(&handlers, packet, &ctx);

        self.stats.packet_dispatched();
        if outcome.discarded {
            self.stats.packet_discarded();
        }
        if !outcome.handled {
            self.stats.packet_unhandled();
            tracing::debug!("unhandled packet 0x{:02x}", packet.id());
        }
        outcome
    }
}

/// Connects a transport, a server and a [`Registry`].
pub struct DispatchAdapter<T: Transport, S: Server> {
    shared: Arc<Shared<T, S>>,
    pool: ThreadPool,
    config: AdapterConfig,
}

impl<T: Transport, S: Server> DispatchAdapter<T, S> {
    /// Applies the server identity to the transport and starts the
    /// session worker pool.
    pub fn new(
        transport: T,
        server: S,
        registry: Registry<S>,
        config: AdapterConfig,
    ) -> anyhow::Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.get())
            .thread_name(|i| format!("gravel-session-{i}"))
            .panic_handler(|_| tracing::error!("session worker panicked"))
            .build()
            .context("failed to start session workers")?;

        transport.configure(server.identity());
        tracing::info!(
            "dispatching for {} on {}:{} with {} workers",
            server.identity().name,
            server.identity().address,
            server.identity().port,
            config.worker_threads
        );

        Ok(Self {
            shared: Arc::new(Shared {
                transport,
                server,
                registry: RwLock::new(registry),
                stats: DispatchStats::default(),
                in_flight: Mutex::new(FnvHashSet::default()),
                idle: Condvar::new(),
                pending_disconnects: Mutex::new(Vec::new()),
            }),
            pool,
            config,
        })
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    pub fn server(&self) -> &S {
        &self.shared.server
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Runs one tick. Session work is queued on the pool and may still
    /// be running when this returns; see [`Self::wait_idle`].
    pub fn tick(&self) {
        let shared = &self.shared;
        shared.transport.tick();

        for session in shared.transport.sessions() {
            let address = session.address();
            if !shared.in_flight.lock().insert(address) {
                shared.stats.session_skipped();
                tracing::trace!("session {address} still busy, skipping");
                continue;
            }

            let shared = Arc::clone(shared);
            self.pool.spawn(move || {
                let _in_flight = InFlight {
                    shared: &shared,
                    address,
                };
                shared.process_session(session.as_ref());
            });
        }

        for packet in shared.transport.raw_packets() {
            shared.server.handle_raw(packet);
        }

        let mut disconnected = std::mem::take(&mut *shared.pending_disconnects.lock());
        disconnected.extend(shared.transport.disconnected_sessions());
        for session in disconnected {
            let address = session.address();
            if shared.in_flight.lock().contains(&address) {
                tracing::trace!("session {address} disconnected while busy, deferring");
                shared.pending_disconnects.lock().push(session);
                continue;
            }
            tracing::debug!("session {address} disconnected");
            let player = shared.server.player_by_session(session.as_ref());
            shared.server.handle_disconnect(player, session.as_ref());
        }
    }

    /// Blocks until no session work is running, or `timeout` passes.
    /// Returns whether the adapter went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut in_flight = self.shared.in_flight.lock();
        while !in_flight.is_empty() {
            if self.shared.idle.wait_until(&mut in_flight, deadline).timed_out() {
                return in_flight.is_empty();
            }
        }
        true
    }

    /// Ticks at the configured rate until `stop` is raised.
    pub fn run(&self, stop: &AtomicBool) {
        let ticks = TickLoop::new(self.config.ticks_per_second, || {
            if stop.load(Ordering::Acquire) {
                return false;
            }
            self.tick();
            true
        })
        .run();
        tracing::info!("dispatch loop stopped after {ticks} ticks");
    }

    /// Dispatches a packet as if it had arrived from `session`.
    pub fn dispatch(&self, packet: &mut Packet, session: &dyn Session) -> DispatchOutcome {
        let player = self.shared.server.player_by_session(session);
        self.shared.dispatch(packet, player.as_ref(), session)
    }

    /// Sends one packet in a batch of its own. Discarded packets are
    /// not sent.
    pub fn send_packet(
        &self,
        packet: &mut Packet,
        session: &dyn Session,
        priority: u8,
    ) -> NetResult<bool> {
        PacketBatch::send_packet(packet, session, priority)
    }

    pub fn send_batch(&self, batch: &PacketBatch, session: &dyn Session, priority: u8) -> NetResult<()> {
        batch.send_to(session, priority)
    }

    pub fn get_session(&self, ip: IpAddr, port: u16) -> Option<Arc<dyn Session>> {
        self.shared.transport.session(SocketAddr::new(ip, port))
    }

    pub fn register_packet(
        &self,
        id: PacketId,
        factory: impl Fn() -> Box<dyn PacketBody> + Send + Sync + 'static,
    ) {
        self.shared.registry.write().packets.register(id, factory);
    }

    pub fn get_packet(&self, id: PacketId) -> NetResult<Packet> {
        self.shared.registry.read().packets.get(id)
    }

    pub fn delete_packet(&self, id: PacketId) -> bool {
        self.shared.registry.write().packets.deregister(id)
    }

    pub fn is_packet_registered(&self, id: PacketId) -> bool {
        self.shared.registry.read().packets.is_registered(id)
    }

    pub fn register_packet_handler(
        &self,
        id: PacketId,
        handler: impl PacketHandler<S> + 'static,
        priority: Priority,
    ) -> bool {
        self.shared
            .registry
            .write()
            .handlers
            .register_packet_handler(id, handler, priority)
    }

    pub fn get_packet_handlers(&self, id: PacketId) -> Vec<Vec<SharedHandler<S>>> {
        self.shared.registry.read().handlers.get_packet_handlers(id)
    }

    pub fn deregister_packet_handlers(&self, id: PacketId, priority: Priority) {
        self.shared
            .registry
            .write()
            .handlers
            .deregister_packet_handlers(id, priority);
    }
}
