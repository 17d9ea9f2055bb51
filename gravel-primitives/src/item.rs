use serde::{Deserialize, Serialize};

/// Represents an item stack in a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item ID. `0` is air.
    pub id: i32,
    /// Number of items stacked in this item.
    pub count: i32,
}

impl ItemStack {
    pub const EMPTY: Self = Self { id: 0, count: 0 };

    pub fn new(id: i32, count: i32) -> Self {
        Self { id, count }
    }

    pub fn is_empty(&self) -> bool {
        self.id == 0 || self.count <= 0
    }
}
