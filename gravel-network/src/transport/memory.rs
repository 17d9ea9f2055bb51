//! A transport that lives entirely in memory.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use fnv::FnvHashMap;
use parking_lot::{Mutex, RwLock};

use super::{RawPacket, Reliability, Session, Transport};
use crate::{
    config::ServerIdentity,
    error::{NetError, NetResult},
};

/// A payload handed to [`MemorySession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPayload {
    pub buffer: Vec<u8>,
    pub reliability: Reliability,
    pub priority: u8,
}

#[derive(Debug)]
pub struct MemorySession {
    address: SocketAddr,
    inbound: (flume::Sender<Vec<u8>>, flume::Receiver<Vec<u8>>),
    outbound: (flume::Sender<SentPayload>, flume::Receiver<SentPayload>),
    closed: AtomicBool,
}

impl MemorySession {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            inbound: flume::unbounded(),
            outbound: flume::unbounded(),
            closed: AtomicBool::new(false),
        }
    }

    /// Queues a payload for the next [`Session::ready_packets`].
    pub fn deliver(&self, buffer: Vec<u8>) {
        // both ends are owned here, so the channel cannot be disconnected
        let _ = self.inbound.0.send(buffer);
    }

    /// Drains everything sent to this session so far.
    pub fn sent(&self) -> Vec<SentPayload> {
        self.outbound.1.try_iter().collect()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Session for MemorySession {
    fn address(&self) -> SocketAddr {
        self.address
    }

    fn ready_packets(&self) -> Vec<Vec<u8>> {
        self.inbound.1.try_iter().collect()
    }

    fn send(&self, buffer: Vec<u8>, reliability: Reliability, priority: u8) -> NetResult<()> {
        if self.is_closed() {
            return Err(NetError::Transport(format!("session {} is closed", self.address)));
        }
        self.outbound
            .0
            .send(SentPayload {
                buffer,
                reliability,
                priority,
            })
            .map_err(|e| NetError::Transport(e.to_string()))
    }
}

/// Sessions, raw messages and disconnects driven by the caller.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sessions: RwLock<FnvHashMap<SocketAddr, Arc<MemorySession>>>,
    disconnected: Mutex<Vec<Arc<MemorySession>>>,
    raw: Mutex<Vec<RawPacket>>,
    identity: RwLock<Option<ServerIdentity>>,
    ticks: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for `address`, or returns the existing one.
    pub fn connect(&self, address: SocketAddr) -> Arc<MemorySession> {
        self.sessions
            .write()
            .entry(address)
            .or_insert_with(|| Arc::new(MemorySession::new(address)))
            .clone()
    }

    /// Closes the session for `address`. It is reported by the next
    /// [`Transport::disconnected_sessions`] call.
    pub fn disconnect(&self, address: SocketAddr) -> bool {
        match self.sessions.write().remove(&address) {
            Some(session) => {
                session.close();
                self.disconnected.lock().push(session);
                true
            }
            None => false,
        }
    }

    /// Queues a message from an address without a session.
    pub fn push_raw(&self, address: SocketAddr, buffer: Vec<u8>) {
        self.raw.lock().push(RawPacket { address, buffer });
    }

    /// How many times the clock was advanced.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// The identity last applied through [`Transport::configure`].
    pub fn identity(&self) -> Option<ServerIdentity> {
        self.identity.read().clone()
    }
}

impl Transport for MemoryTransport {
    fn configure(&self, identity: &ServerIdentity) {
        tracing::debug!(
            "advertising {} ({} {}, {} players max)",
            identity.name,
            identity.protocol,
            identity.game_version,
            identity.max_players
        );
        *self.identity.write() = Some(identity.clone());
    }

    fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        self.sessions
            .read()
            .values()
            .map(|s| s.clone() as Arc<dyn Session>)
            .collect()
    }

    fn disconnected_sessions(&self) -> Vec<Arc<dyn Session>> {
        std::mem::take(&mut *self.disconnected.lock())
            .into_iter()
            .map(|s| s as Arc<dyn Session>)
            .collect()
    }

    fn raw_packets(&self) -> Vec<RawPacket> {
        std::mem::take(&mut *self.raw.lock())
    }

    fn session(&self, address: SocketAddr) -> Option<Arc<dyn Session>> {
        self.sessions
            .read()
            .get(&address)
            .map(|s| s.clone() as Arc<dyn Session>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn ready_packets_drain_in_order() {
        let session = MemorySession::new(addr(1));
        session.deliver(vec![1]);
        session.deliver(vec![2]);
        assert_eq!(session.ready_packets(), [vec![1], vec![2]]);
        assert!(session.ready_packets().is_empty());
    }

    #[test]
    fn closed_session_refuses_sends() {
        let transport = MemoryTransport::new();
        let session = transport.connect(addr(2));
        session.send(vec![9], Reliability::Reliable, 0).unwrap();
        assert_eq!(session.sent().len(), 1);

        assert!(transport.disconnect(addr(2)));
        assert!(!transport.disconnect(addr(2)));
        assert!(matches!(
            session.send(vec![9], Reliability::Reliable, 0),
            Err(NetError::Transport(_))
        ));
    }

    #[test]
    fn disconnects_are_reported_once() {
        let transport = MemoryTransport::new();
        transport.connect(addr(3));
        transport.connect(addr(4));
        assert_eq!(transport.sessions().len(), 2);

        transport.disconnect(addr(3));
        let gone = transport.disconnected_sessions();
        assert_eq!(gone.len(), 1);
        assert_eq!(gone[0].address(), addr(3));
        assert!(transport.disconnected_sessions().is_empty());
        assert!(transport.session(addr(3)).is_none());
        assert!(transport.session(addr(4)).is_some());
    }

    #[test]
    fn raw_packets_drain() {
        let transport = MemoryTransport::new();
        transport.push_raw(addr(5), vec![0x01]);
        assert_eq!(
            transport.raw_packets(),
            [RawPacket {
                address: addr(5),
                buffer: vec![0x01]
            }]
        );
        assert!(transport.raw_packets().is_empty());
    }
}
