//! The contract the dispatch layer expects from a datagram transport.
//!
//! The transport owns sessions, reliability and the wire framing
//! below packet batches. This layer only drains ready payloads and
//! hands encoded batches back.
pub mod memory;

use std::{fmt::Debug, net::SocketAddr, sync::Arc};

use crate::{config::ServerIdentity, error::NetResult};

/// Delivery guarantees a transport may offer for an outbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reliability {
    Unreliable,
    UnreliableSequenced,
    Reliable,
    ReliableOrdered,
    ReliableSequenced,
}

/// A message that arrived outside any established session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub address: SocketAddr,
    pub buffer: Vec<u8>,
}

/// One connected peer.
pub trait Session: Debug + Send + Sync {
    fn address(&self) -> SocketAddr;

    /// Drains the payloads that became ready since the last call,
    /// in arrival order.
    fn ready_packets(&self) -> Vec<Vec<u8>>;

    fn send(&self, buffer: Vec<u8>, reliability: Reliability, priority: u8) -> NetResult<()>;
}

pub trait Transport: Send + Sync + 'static {
    /// Applies the advertised server identity.
    fn configure(&self, identity: &ServerIdentity);

    /// Advances the internal clock once.
    fn tick(&self);

    /// Currently active sessions.
    fn sessions(&self) -> Vec<Arc<dyn Session>>;

    /// Sessions that disconnected since the last call. Each session
    /// is reported once.
    fn disconnected_sessions(&self) -> Vec<Arc<dyn Session>>;

    /// Drains messages not tied to a session.
    fn raw_packets(&self) -> Vec<RawPacket>;

    fn session(&self, address: SocketAddr) -> Option<Arc<dyn Session>>;
}
