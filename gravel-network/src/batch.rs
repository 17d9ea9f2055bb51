//! Several packets framed into one transport message.
//!
//! Each sub-buffer is prefixed with its length as an unsigned varint
//! and carries its own packet header.

use crate::{
    error::{NetError, NetResult},
    io::ByteCursor,
    packet::Packet,
    transport::{Reliability, Session},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketBatch {
    buffers: Vec<Vec<u8>>,
}

impl PacketBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `packet` and appends it.
    ///
    /// Discarded packets are left out and `false` is returned.
    pub fn add_packet(&mut self, packet: &mut Packet) -> NetResult<bool> {
        if packet.is_discarded() {
            return Ok(false);
        }
        packet.encode()?;
        self.buffers.push(packet.buffer().to_vec());
        Ok(true)
    }

    /// Appends an already encoded packet.
    pub fn add_buffer(&mut self, buffer: Vec<u8>) {
        self.buffers.push(buffer);
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    pub fn into_buffers(self) -> Vec<Vec<u8>> {
        self.buffers
    }

    pub fn encode(&self) -> NetResult<Vec<u8>> {
        let mut stream = ByteCursor::with_capacity(self.buffers.iter().map(|b| b.len() + 2).sum());
        for buffer in &self.buffers {
            let len = u32::try_from(buffer.len())
                .map_err(|_| NetError::malformed("batched packet is too large"))?;
            stream.put_uvarint32(len)?;
            stream.put_bytes(buffer)?;
        }
        Ok(stream.into_inner())
    }

    /// Wraps `packet` in its own batch and sends it.
    ///
    /// Returns `false` without sending if the packet is discarded.
    pub fn send_packet(packet: &mut Packet, session: &dyn Session, priority: u8) -> NetResult<bool> {
        let mut batch = Self::new();
        if !batch.add_packet(packet)? {
            return Ok(false);
        }
        batch.send_to(session, priority)?;
        Ok(true)
    }

    /// Sends the framed batch, reliable and ordered. Empty batches
    /// are not sent.
    pub fn send_to(&self, session: &dyn Session, priority: u8) -> NetResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        session.send(self.encode()?, Reliability::ReliableOrdered, priority)
    }

    /// Splits `buffer` into sub-buffers, preserving order.
    pub fn decode(buffer: &[u8]) -> NetResult<Self> {
        let mut stream = ByteCursor::from(buffer);
        let mut buffers = Vec::new();
        while stream.remaining() > 0 {
            let len = stream.get_uvarint32()? as usize;
            if len == 0 {
                return Err(NetError::malformed("empty packet in batch"));
            }
            buffers.push(stream.get_bytes(len)?);
        }
        Ok(Self { buffers })
    }
}

impl FromIterator<Vec<u8>> for PacketBatch {
    fn from_iter<T: IntoIterator<Item = Vec<u8>>>(iter: T) -> Self {
        Self {
            buffers: iter.into_iter().collect(),
        }
    }
}
