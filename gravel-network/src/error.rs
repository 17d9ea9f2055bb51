use std::borrow::Cow;

use thiserror::Error;

use crate::packet::PacketId;

/// Errors raised while encoding, decoding or routing packets.
#[derive(Error, Debug)]
pub enum NetError {
    /// Buffer underflow, an over-long varint, or a value that cannot
    /// be represented on the wire.
    #[error("malformed data: {0}")]
    MalformedData(Cow<'static, str>),
    /// Header id mismatch or nonzero reserved bytes.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),
    #[error("no packet registered with id 0x{0:02x}")]
    UnregisteredPacket(PacketId),
    /// A dynamic value tag with no codec.
    #[error("unsupported {kind} value type {tag}")]
    UnsupportedValueType { kind: &'static str, tag: u32 },
    #[error("transport error: {0}")]
    Transport(String),
}

pub type NetResult<T> = std::result::Result<T, NetError>;

impl NetError {
    pub(crate) fn malformed(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedData(msg.into())
    }
}

impl From<std::io::Error> for NetError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::malformed("unexpected end of buffer"),
            _ => Self::MalformedData(e.to_string().into()),
        }
    }
}
