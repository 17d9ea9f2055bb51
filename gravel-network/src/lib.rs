//! Bedrock networking: the wire codec and the packet dispatch engine.
//!
//! Raw transport payloads are split by [`batch::PacketBatch`], decoded into
//! typed [`packet::Packet`]s through the [`registry::PacketRegistry`] and run
//! through the priority-ordered chains of the [`handler::HandlerRegistry`].
//! [`adapter::DispatchAdapter`] ties those together with a
//! [`transport::Transport`] once per tick.
pub mod adapter;
pub mod batch;
pub mod config;
pub mod error;
pub mod handler;
pub mod io;
pub mod packet;
pub mod registry;
pub mod transport;

pub use adapter::{DispatchAdapter, Server};
pub use error::{NetError, NetResult};

/// Protocol constants advertised to clients.
pub mod info {
    /// Network protocol number of the supported game version.
    pub const LATEST_PROTOCOL: u32 = 201;
    /// Game version advertised alongside the protocol number.
    pub const GAME_VERSION_NETWORK: &str = "1.2.10";
}
