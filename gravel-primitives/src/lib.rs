//! Bedrock primitive types shared by the wire codecs.

pub mod position;
pub mod attribute;
pub mod metadata;
pub mod gamerule;
pub mod pack;
pub mod item;
