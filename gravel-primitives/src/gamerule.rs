//! Game rules.

use serde::{Deserialize, Serialize};

/// The value of a game rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameRuleValue {
    Bool(bool),
    UInt(u32),
    Float(f32),
}

impl GameRuleValue {
    /// Wire type tag of this value.
    pub fn tag(&self) -> u8 {
        match self {
            GameRuleValue::Bool(_) => 1,
            GameRuleValue::UInt(_) => 2,
            GameRuleValue::Float(_) => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRule {
    pub name: String,
    pub value: GameRuleValue,
}

impl GameRule {
    pub fn new(name: impl Into<String>, value: GameRuleValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An ordered table of game rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameRules(pub Vec<GameRule>);

impl GameRules {
    /// Sets `name` to `value`, replacing a rule of the same name.
    pub fn set(&mut self, name: &str, value: GameRuleValue) {
        match self.0.iter_mut().find(|r| r.name == name) {
            Some(rule) => rule.value = value,
            None => self.0.push(GameRule::new(name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<GameRuleValue> {
        self.0.iter().find(|r| r.name == name).map(|r| r.value)
    }
}
