//! Entity attributes.
//!
//! Attributes are name-keyed float ranges (health,
//! hunger, movement speed...). Only the names in
//! [`KNOWN_ATTRIBUTES`] are understood by clients.

use ahash::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name, minimum, maximum and default value of
/// every attribute clients understand.
pub const KNOWN_ATTRIBUTES: &[(&str, f32, f32, f32)] = &[
    ("minecraft:absorption", 0.0, f32::MAX, 0.0),
    ("minecraft:player.saturation", 0.0, 20.0, 5.0),
    ("minecraft:player.exhaustion", 0.0, 5.0, 0.0),
    ("minecraft:knockback_resistance", 0.0, 1.0, 0.0),
    ("minecraft:health", 0.0, 20.0, 20.0),
    ("minecraft:movement", 0.0, f32::MAX, 0.1),
    ("minecraft:underwater_movement", 0.0, f32::MAX, 0.02),
    ("minecraft:lava_movement", 0.0, f32::MAX, 0.02),
    ("minecraft:follow_range", 0.0, 2048.0, 16.0),
    ("minecraft:player.hunger", 0.0, 20.0, 20.0),
    ("minecraft:attack_damage", 0.0, f32::MAX, 1.0),
    ("minecraft:player.level", 0.0, 24791.0, 0.0),
    ("minecraft:player.experience", 0.0, 1.0, 0.0),
    ("minecraft:luck", -1024.0, 1024.0, 0.0),
    ("minecraft:fall_damage", 0.0, f32::MAX, 1.0),
    ("minecraft:horse.jump_strength", 0.0, 2.0, 0.7),
    ("minecraft:zombie.spawn_reinforcements", 0.0, 1.0, 0.0),
];

/// Returns true if `name` is an attribute clients understand.
pub fn attribute_exists(name: &str) -> bool {
    KNOWN_ATTRIBUTES.iter().any(|(n, ..)| *n == name)
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttributeError {
    #[error("unknown attribute {0:?}")]
    Unknown(String),
}

/// A single attribute record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub value: f32,
    pub default: f32,
}

impl Attribute {
    pub fn new(name: impl Into<String>, min: f32, max: f32, value: f32, default: f32) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            value,
            default,
        }
    }

    /// Creates a known attribute at its default value.
    pub fn known(name: &str) -> Result<Self, AttributeError> {
        KNOWN_ATTRIBUTES
            .iter()
            .find(|(n, ..)| *n == name)
            .map(|&(n, min, max, default)| Self::new(n, min, max, default, default))
            .ok_or_else(|| AttributeError::Unknown(name.to_string()))
    }

    /// Sets the current value, clamped into `[min, max]`.
    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }
}

/// A set of attributes keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    attributes: HashMap<String, Attribute>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an attribute, replacing any
    /// previous attribute with the same name.
    pub fn set(&mut self, attribute: Attribute) {
        self.attributes.insert(attribute.name.clone(), attribute);
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }
}

impl FromIterator<Attribute> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        let mut map = Self::new();
        for attribute in iter {
            map.set(attribute);
        }
        map
    }
}
