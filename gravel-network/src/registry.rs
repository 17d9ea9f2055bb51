//! Packet id -> factory mapping, and the registry bundle the adapter owns.

use std::sync::Arc;

use fnv::FnvHashMap;

use crate::{
    error::{NetError, NetResult},
    handler::HandlerRegistry,
    io::ByteCursor,
    packet::{play, Packet, PacketBody, PacketId, PacketKind},
    Server,
};

/// Packet factories and handler chains, populated before ticking starts
/// and handed to the [`crate::DispatchAdapter`].
pub struct Registry<S: Server> {
    pub packets: PacketRegistry,
    pub handlers: HandlerRegistry<S>,
}

impl<S: Server> Default for Registry<S> {
    fn default() -> Self {
        Self {
            packets: PacketRegistry::new(),
            handlers: HandlerRegistry::new(),
        }
    }
}

impl<S: Server> Registry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that already knows every packet in [`play`].
    pub fn with_default_packets() -> Self {
        let mut registry = Self::new();
        play::register_default_packets(&mut registry.packets);
        registry
    }
}

/// Produces a fresh, empty packet body.
pub type PacketFactory = Arc<dyn Fn() -> Box<dyn PacketBody> + Send + Sync>;

/// The id -> factory table.
#[derive(Default, Clone)]
pub struct PacketRegistry {
    factories: FnvHashMap<PacketId, PacketFactory>,
}

impl std::fmt::Debug for PacketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.factories.keys().collect();
        ids.sort();
        f.debug_struct("PacketRegistry").field("ids", &ids).finish()
    }
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `id` with `factory`.
    ///
    /// A previous factory for the same id is replaced. Two
    /// components registering the same id silently shadow
    /// each other, so the replacement is logged.
    pub fn register(
        &mut self,
        id: PacketId,
        factory: impl Fn() -> Box<dyn PacketBody> + Send + Sync + 'static,
    ) {
        if self.factories.insert(id, Arc::new(factory)).is_some() {
            tracing::warn!("packet id 0x{id:02x} registered twice, replacing previous factory");
        }
    }

    /// Registers the default instance of `P` under its id.
    pub fn register_kind<P: PacketKind>(&mut self) {
        self.register(P::ID, || Box::new(P::default()));
    }

    /// A new empty packet for `id`.
    pub fn get(&self, id: PacketId) -> NetResult<Packet> {
        self.factories
            .get(&id)
            .map(|factory| Packet::from_body(factory()))
            .ok_or(NetError::UnregisteredPacket(id))
    }

    /// Returns true if a factory was removed.
    pub fn deregister(&mut self, id: PacketId) -> bool {
        self.factories.remove(&id).is_some()
    }

    pub fn is_registered(&self, id: PacketId) -> bool {
        self.factories.contains_key(&id)
    }

    /// Builds the packet named by the id at the start of `buffer`
    /// and decodes header and body from it.
    pub fn decode_packet(&self, buffer: Vec<u8>) -> NetResult<Packet> {
        let mut stream = ByteCursor::from(buffer);
        let id = stream.peek_uvarint32()?;
        let mut packet = self.get(id)?.with_stream(stream);
        packet.decode()?;
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::play::{Disconnect, PlayStatus};

    #[test]
    fn register_and_get() {
        let mut registry = PacketRegistry::new();
        assert!(!registry.is_registered(PlayStatus::ID));
        assert!(matches!(
            registry.get(PlayStatus::ID),
            Err(NetError::UnregisteredPacket(0x02))
        ));

        registry.register_kind::<PlayStatus>();
        assert!(registry.is_registered(PlayStatus::ID));
        let packet = registry.get(PlayStatus::ID).unwrap();
        assert_eq!(packet.id(), PlayStatus::ID);
        assert!(packet.buffer().is_empty());

        assert!(registry.deregister(PlayStatus::ID));
        assert!(!registry.deregister(PlayStatus::ID));
        assert!(!registry.is_registered(PlayStatus::ID));
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = PacketRegistry::new();
        registry.register(0x02, || Box::new(PlayStatus { status: 1 }));
        registry.register(0x02, || Box::new(PlayStatus { status: 2 }));
        let packet = registry.get(0x02).unwrap();
        assert_eq!(packet.body_as::<PlayStatus>().unwrap().status, 2);
    }

    #[test]
    fn decode_packet_from_bytes() {
        let mut registry = PacketRegistry::new();
        registry.register_kind::<Disconnect>();

        let mut outbound = Packet::new(Disconnect {
            hide_screen: true,
            message: "kicked".into(),
        });
        outbound.encode().unwrap();

        let packet = registry.decode_packet(outbound.into_buffer()).unwrap();
        let body = packet.body_as::<Disconnect>().unwrap();
        assert!(body.hide_screen);
        assert_eq!(body.message, "kicked");

        assert!(matches!(
            registry.decode_packet(vec![0x7e, 0, 0]),
            Err(NetError::UnregisteredPacket(0x7e))
        ));
        assert!(matches!(
            registry.decode_packet(vec![0x05, 0, 0, 1]),
            Err(NetError::MalformedData(_))
        ));
    }

    #[test]
    fn non_utf8_message_still_decodes() {
        let mut registry = PacketRegistry::new();
        registry.register_kind::<Disconnect>();

        let packet = registry.decode_packet(vec![0x05, 0, 0, 0, 2, 0xff, 0xfe]).unwrap();
        let body = packet.body_as::<Disconnect>().unwrap();
        assert!(!body.hide_screen);
        assert_eq!(body.message, "\u{fffd}\u{fffd}");
    }
}
