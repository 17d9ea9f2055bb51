//! Packets: the shared header, the base packet and the typed bodies.
//!
//! Every packet starts with
//! `[unsigned varint id][extra byte 0][extra byte 1]`. The extra bytes
//! are reserved for sub-client addressing and must be zero.
pub mod play;

use std::{any::Any, fmt::Debug};

use crate::{
    error::{NetError, NetResult},
    io::{uvarint32_len, ByteCursor},
};

/// Numeric packet type identifier.
pub type PacketId = u32;

/// The typed payload of a packet.
pub trait PacketBody: Any + Debug + Send + Sync {
    /// The id of this packet type.
    fn id(&self) -> PacketId;

    /// Writes the payload after the header.
    fn encode(&self, stream: &mut ByteCursor) -> NetResult<()>;

    /// Reads the payload following the header.
    fn decode(&mut self, stream: &mut ByteCursor) -> NetResult<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Packet bodies with a statically known id.
pub trait PacketKind: PacketBody + Default {
    const ID: PacketId;
}

/// A packet: header state, payload buffer and typed body.
#[derive(Debug)]
pub struct Packet {
    id: PacketId,
    extra_bytes: [u8; 2],
    discarded: bool,
    stream: ByteCursor,
    body: Box<dyn PacketBody>,
}

impl Packet {
    /// Creates an outbound packet with an empty buffer.
    pub fn new(body: impl PacketBody) -> Self {
        Self::from_body(Box::new(body))
    }

    pub fn from_body(body: Box<dyn PacketBody>) -> Self {
        Self {
            id: body.id(),
            extra_bytes: [0; 2],
            discarded: false,
            stream: ByteCursor::new(),
            body,
        }
    }

    /// Replaces the payload buffer, e.g. with bytes to decode.
    pub fn with_stream(mut self, stream: ByteCursor) -> Self {
        self.stream = stream;
        self
    }

    pub fn id(&self) -> PacketId {
        self.id
    }

    pub fn extra_bytes(&self) -> [u8; 2] {
        self.extra_bytes
    }

    pub fn set_extra_bytes(&mut self, extra_bytes: [u8; 2]) {
        self.extra_bytes = extra_bytes;
    }

    /// Stops any further handler from seeing this packet,
    /// and keeps it off every outbound path.
    pub fn discard(&mut self) {
        self.discarded = true;
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn stream(&self) -> &ByteCursor {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut ByteCursor {
        &mut self.stream
    }

    /// The encoded bytes.
    pub fn buffer(&self) -> &[u8] {
        self.stream.as_slice()
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.stream.into_inner()
    }

    pub fn body(&self) -> &dyn PacketBody {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut dyn PacketBody {
        self.body.as_mut()
    }

    /// The body as its concrete type.
    pub fn body_as<T: PacketBody>(&self) -> Option<&T> {
        self.body.as_any().downcast_ref()
    }

    pub fn body_as_mut<T: PacketBody>(&mut self) -> Option<&mut T> {
        self.body.as_any_mut().downcast_mut()
    }

    /// Rewinds the stream and writes the header in place.
    pub fn encode_header(&mut self) -> NetResult<()> {
        self.stream.reset_stream();
        self.stream.put_uvarint32(self.id)?;
        self.stream.put_u8(self.extra_bytes[0])?;
        self.stream.put_u8(self.extra_bytes[1])
    }

    pub fn decode_header(&mut self) -> NetResult<()> {
        let id = self.stream.get_uvarint32()?;
        if id != self.id {
            return Err(NetError::ProtocolMismatch(format!(
                "packet id 0x{id:02x} does not match expected 0x{:02x}",
                self.id
            )));
        }

        self.extra_bytes = [self.stream.get_u8()?, self.stream.get_u8()?];
        if self.extra_bytes != [0, 0] {
            return Err(NetError::ProtocolMismatch(format!(
                "extra bytes {:?} are not zero",
                self.extra_bytes
            )));
        }
        Ok(())
    }

    /// Steps over the id without reading it.
    pub fn skip_id(&mut self) -> NetResult<()> {
        self.stream.skip(uvarint32_len(self.id))
    }

    /// Steps over the two extra bytes without reading them.
    pub fn skip_split_bytes(&mut self) -> NetResult<()> {
        self.stream.skip(2)
    }

    pub fn encode_body(&mut self) -> NetResult<()> {
        self.body.encode(&mut self.stream)
    }

    pub fn decode_body(&mut self) -> NetResult<()> {
        self.body.decode(&mut self.stream)
    }

    /// Writes header and body, dropping anything left over
    /// from a previous encode.
    pub fn encode(&mut self) -> NetResult<()> {
        self.encode_header()?;
        self.encode_body()?;
        self.stream.truncate();
        Ok(())
    }

    pub fn decode(&mut self) -> NetResult<()> {
        self.decode_header()?;
        self.decode_body()
    }
}

macro_rules! def_packets {
    (
        $(
            $(#[$meta:meta])*
            $packet_name:ident = $id:expr => {
                $(
                    $field_name:ident: $field_ty:ty
                ),* $(,)?
            }
        ),* $(,)?
    ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq)]
            pub struct $packet_name {
                $(
                    pub $field_name: $field_ty
                ),*
            }

            impl crate::packet::PacketKind for $packet_name {
                const ID: crate::packet::PacketId = $id;
            }

            impl crate::packet::PacketBody for $packet_name {
                fn id(&self) -> crate::packet::PacketId {
                    $id
                }

                #[allow(unused_variables)]
                fn encode(&self, stream: &mut crate::io::ByteCursor) -> crate::error::NetResult<()> {
                    $(
                        crate::io::Writable::write_to(&self.$field_name, stream)?;
                    )*
                    Ok(())
                }

                #[allow(unused_variables)]
                fn decode(&mut self, stream: &mut crate::io::ByteCursor) -> crate::error::NetResult<()> {
                    $(
                        self.$field_name = <$field_ty as crate::io::Readable>::read_from(stream)?;
                    )*
                    Ok(())
                }

                fn as_any(&self) -> &dyn std::any::Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                    self
                }
            }
        )*
    };
}
pub(crate) use def_packets;
