//! The entity metadata format.
//!
//! Entity data is a set of `key -> value` pairs where every
//! value carries a type tag on the wire.

use ahash::HashMap;
use thiserror::Error;

use crate::{
    item::ItemStack,
    position::{BlockPosition, Vector3},
};

/// The metadata store.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct EntityData {
    values: HashMap<u32, EntityDatum>,
}

impl EntityData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: u32, value: EntityDatum) -> Option<EntityDatum> {
        self.values.insert(key, value)
    }

    pub fn fetch(&self, key: u32) -> Result<&EntityDatum, MetadataError> {
        if let Some(v) = self.values.get(&key) {
            Ok(v)
        } else {
            Err(MetadataError::NotPresent(key))
        }
    }

    pub fn values(&self) -> impl Iterator<Item = (u32, &EntityDatum)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(u32, EntityDatum)> for EntityData {
    fn from_iter<T: IntoIterator<Item = (u32, EntityDatum)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Wire type tags.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityDataType {
    Byte = 0,
    Short = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Slot = 5,
    Position = 6,
    Long = 7,
    Vector = 8,
}

impl EntityDataType {
    pub fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => Self::Byte,
            1 => Self::Short,
            2 => Self::Int,
            3 => Self::Float,
            4 => Self::String,
            5 => Self::Slot,
            6 => Self::Position,
            7 => Self::Long,
            8 => Self::Vector,
            _ => return None,
        })
    }

    pub fn tag(self) -> u32 {
        self as u32
    }
}

/// An item present in the metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityDatum {
    Byte(u8),
    Short(i16),
    Int(i32),
    Float(f32),
    String(String),
    Slot(ItemStack),
    Position(BlockPosition),
    Long(i64),
    Vector(Vector3),
}

impl EntityDatum {
    pub fn data_type(&self) -> EntityDataType {
        match self {
            EntityDatum::Byte(_) => EntityDataType::Byte,
            EntityDatum::Short(_) => EntityDataType::Short,
            EntityDatum::Int(_) => EntityDataType::Int,
            EntityDatum::Float(_) => EntityDataType::Float,
            EntityDatum::String(_) => EntityDataType::String,
            EntityDatum::Slot(_) => EntityDataType::Slot,
            EntityDatum::Position(_) => EntityDataType::Position,
            EntityDatum::Long(_) => EntityDataType::Long,
            EntityDatum::Vector(_) => EntityDataType::Vector,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata entry {0} not present")]
    NotPresent(u32),
}
