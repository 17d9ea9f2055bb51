//! Codecs for the composite values embedded in packets.

use gravel_primitives::{
    attribute::{attribute_exists, Attribute, AttributeMap},
    gamerule::{GameRule, GameRuleValue, GameRules},
    item::ItemStack,
    metadata::{EntityData, EntityDataType, EntityDatum},
    pack::ResourcePackInfo,
    position::{BlockPosition, Rotation, Vector3},
};
use uuid::Uuid;

use super::{ByteCursor, Readable, Writable};
use crate::error::{NetError, NetResult};

fn count_u32(len: usize, what: &'static str) -> NetResult<u32> {
    u32::try_from(len).map_err(|_| NetError::malformed(format!("too many {what}")))
}

impl ByteCursor {
    pub fn put_runtime_id(&mut self, id: u64) -> NetResult<()> {
        self.put_uvarint64(id)
    }

    pub fn get_runtime_id(&mut self) -> NetResult<u64> {
        self.get_uvarint64()
    }

    pub fn put_unique_id(&mut self, id: i64) -> NetResult<()> {
        self.put_varint64(id)
    }

    pub fn get_unique_id(&mut self) -> NetResult<i64> {
        self.get_varint64()
    }

    pub fn put_vector(&mut self, vector: &Vector3) -> NetResult<()> {
        self.put_f32(vector.x)?;
        self.put_f32(vector.y)?;
        self.put_f32(vector.z)
    }

    pub fn get_vector(&mut self) -> NetResult<Vector3> {
        Ok(Vector3::new(self.get_f32()?, self.get_f32()?, self.get_f32()?))
    }

    /// Yaw then pitch, then head yaw for player-like entities.
    pub fn put_rotation(&mut self, rotation: &Rotation, is_player: bool) -> NetResult<()> {
        self.put_f32(rotation.yaw)?;
        self.put_f32(rotation.pitch)?;
        if is_player {
            self.put_f32(rotation.head_yaw)?;
        }
        Ok(())
    }

    pub fn get_rotation(&mut self, is_player: bool) -> NetResult<Rotation> {
        let yaw = self.get_f32()?;
        let pitch = self.get_f32()?;
        let head_yaw = if is_player { self.get_f32()? } else { 0.0 };
        Ok(Rotation::new(yaw, pitch, head_yaw))
    }

    /// x and z are signed varints, y is unsigned.
    pub fn put_block_position(&mut self, position: &BlockPosition) -> NetResult<()> {
        self.put_varint32(position.x)?;
        self.put_uvarint32(position.y)?;
        self.put_varint32(position.z)
    }

    pub fn get_block_position(&mut self) -> NetResult<BlockPosition> {
        Ok(BlockPosition::new(
            self.get_varint32()?,
            self.get_uvarint32()?,
            self.get_varint32()?,
        ))
    }

    pub fn put_attributes(&mut self, attributes: &AttributeMap) -> NetResult<()> {
        self.put_uvarint32(count_u32(attributes.len(), "attributes")?)?;
        for attribute in attributes.iter() {
            self.put_f32(attribute.min)?;
            self.put_f32(attribute.max)?;
            self.put_f32(attribute.value)?;
            self.put_f32(attribute.default)?;
            self.put_string(&attribute.name)?;
        }
        Ok(())
    }

    /// Entries with unknown names are dropped.
    pub fn get_attributes(&mut self) -> NetResult<AttributeMap> {
        let mut attributes = AttributeMap::new();
        let count = self.get_uvarint32()?;
        for _ in 0..count {
            let min = self.get_f32()?;
            let max = self.get_f32()?;
            let value = self.get_f32()?;
            let default = self.get_f32()?;
            let name = self.get_string()?;

            if attribute_exists(&name) {
                attributes.set(Attribute::new(name, min, max, value, default));
            } else {
                tracing::trace!("dropping unknown attribute {name:?}");
            }
        }
        Ok(attributes)
    }

    pub fn put_entity_data(&mut self, data: &EntityData) -> NetResult<()> {
        self.put_uvarint32(count_u32(data.len(), "entity data entries")?)?;
        for (key, datum) in data.values() {
            self.put_uvarint32(key)?;
            self.put_uvarint32(datum.data_type().tag())?;
            match datum {
                EntityDatum::Byte(v) => self.put_u8(*v)?,
                EntityDatum::Short(v) => self.put_i16(*v)?,
                EntityDatum::Int(v) => self.put_varint32(*v)?,
                EntityDatum::Float(v) => self.put_f32(*v)?,
                EntityDatum::String(v) => self.put_string(v)?,
                EntityDatum::Long(v) => self.put_varint64(*v)?,
                EntityDatum::Slot(_) | EntityDatum::Position(_) | EntityDatum::Vector(_) => {
                    return Err(NetError::UnsupportedValueType {
                        kind: "entity data",
                        tag: datum.data_type().tag(),
                    })
                }
            }
        }
        Ok(())
    }

    pub fn get_entity_data(&mut self) -> NetResult<EntityData> {
        let mut data = EntityData::new();
        let count = self.get_uvarint32()?;
        for _ in 0..count {
            let key = self.get_uvarint32()?;
            let tag = self.get_uvarint32()?;
            let datum = match EntityDataType::from_tag(tag) {
                Some(EntityDataType::Byte) => EntityDatum::Byte(self.get_u8()?),
                Some(EntityDataType::Short) => EntityDatum::Short(self.get_i16()?),
                Some(EntityDataType::Int) => EntityDatum::Int(self.get_varint32()?),
                Some(EntityDataType::Float) => EntityDatum::Float(self.get_f32()?),
                Some(EntityDataType::String) => EntityDatum::String(self.get_string()?),
                Some(EntityDataType::Long) => EntityDatum::Long(self.get_varint64()?),
                Some(EntityDataType::Slot | EntityDataType::Position | EntityDataType::Vector)
                | None => {
                    return Err(NetError::UnsupportedValueType {
                        kind: "entity data",
                        tag,
                    })
                }
            };
            data.insert(key, datum);
        }
        Ok(data)
    }

    pub fn put_game_rules(&mut self, rules: &GameRules) -> NetResult<()> {
        self.put_uvarint32(count_u32(rules.0.len(), "game rules")?)?;
        for rule in &rules.0 {
            self.put_string(&rule.name)?;
            self.put_u8(rule.value.tag())?;
            match rule.value {
                GameRuleValue::Bool(v) => self.put_bool(v)?,
                GameRuleValue::UInt(v) => self.put_uvarint32(v)?,
                GameRuleValue::Float(v) => self.put_f32(v)?,
            }
        }
        Ok(())
    }

    pub fn get_game_rules(&mut self) -> NetResult<GameRules> {
        let count = self.get_uvarint32()?;
        let mut rules = Vec::new();
        for _ in 0..count {
            let name = self.get_string()?;
            let value = match self.get_u8()? {
                1 => GameRuleValue::Bool(self.get_bool()?),
                2 => GameRuleValue::UInt(self.get_uvarint32()?),
                3 => GameRuleValue::Float(self.get_f32()?),
                tag => {
                    return Err(NetError::UnsupportedValueType {
                        kind: "game rule",
                        tag: u32::from(tag),
                    })
                }
            };
            rules.push(GameRule::new(name, value));
        }
        Ok(GameRules(rules))
    }

    /// Writes a pack list, either with its metadata (16-bit count, sizes)
    /// or without (varint count).
    pub fn put_packs(&mut self, packs: &[ResourcePackInfo], with_metadata: bool) -> NetResult<()> {
        if with_metadata {
            let count = i16::try_from(packs.len())
                .map_err(|_| NetError::malformed("too many resource packs"))?;
            self.put_i16(count)?;
            for pack in packs {
                self.put_string(&pack.id)?;
                self.put_string(&pack.version)?;
                self.put_u64(pack.size)?;
                self.put_string("")?;
                self.put_string("")?;
            }
        } else {
            self.put_uvarint32(count_u32(packs.len(), "resource packs")?)?;
            for pack in packs {
                self.put_string(&pack.id)?;
                self.put_string(&pack.version)?;
                self.put_string("")?;
            }
        }
        Ok(())
    }

    pub fn get_packs(&mut self, with_metadata: bool) -> NetResult<Vec<ResourcePackInfo>> {
        let count = if with_metadata {
            u32::try_from(self.get_i16()?)
                .map_err(|_| NetError::malformed("negative resource pack count"))?
        } else {
            self.get_uvarint32()?
        };
        let mut packs = Vec::new();
        for _ in 0..count {
            let id = self.get_string()?;
            let version = self.get_string()?;
            let size = if with_metadata {
                let size = self.get_u64()?;
                self.get_string_bytes()?;
                size
            } else {
                0
            };
            self.get_string_bytes()?;
            packs.push(ResourcePackInfo::new(id, version, size));
        }
        Ok(packs)
    }

    /// Item id, count, then two reserved zero fields.
    pub fn put_slot(&mut self, item: &ItemStack) -> NetResult<()> {
        self.put_varint32(item.id)?;
        self.put_varint32(item.count)?;
        self.put_varint32(0)?;
        self.put_varint32(0)
    }

    pub fn get_slot(&mut self) -> NetResult<ItemStack> {
        let item = ItemStack::new(self.get_varint32()?, self.get_varint32()?);
        self.get_varint32()?;
        self.get_varint32()?;
        Ok(item)
    }

    /// Four little-endian words in the order `[1, 0, 3, 2]`
    /// of the big-endian word split of the UUID.
    pub fn put_uuid(&mut self, uuid: &Uuid) -> NetResult<()> {
        let parts = uuid_words(uuid);
        self.put_u32(parts[1])?;
        self.put_u32(parts[0])?;
        self.put_u32(parts[3])?;
        self.put_u32(parts[2])
    }

    pub fn get_uuid(&mut self) -> NetResult<Uuid> {
        let unordered = [self.get_u32()?, self.get_u32()?, self.get_u32()?, self.get_u32()?];
        let parts = [unordered[1], unordered[0], unordered[3], unordered[2]];
        let value = parts
            .iter()
            .fold(0u128, |acc, word| (acc << 32) | u128::from(*word));
        Ok(Uuid::from_u128(value))
    }
}

fn uuid_words(uuid: &Uuid) -> [u32; 4] {
    let value = uuid.as_u128();
    [
        (value >> 96) as u32,
        (value >> 64) as u32,
        (value >> 32) as u32,
        value as u32,
    ]
}

/// Runtime entity id, an unsigned varlong.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RuntimeId(pub u64);

/// Unique entity id, a zig-zag varlong.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UniqueId(pub i64);

/// The rotation of a player-like entity, head yaw included.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadRotation(pub Rotation);

/// Pack list carrying sizes, as sent when offering packs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackInfoList(pub Vec<ResourcePackInfo>);

/// Pack list without metadata, as sent in the pack stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackStackList(pub Vec<ResourcePackInfo>);

macro_rules! composite_impl {
    (
        $({$ty:ty, |$r:ident| $read:expr, |$s:ident, $w:ident| $write:expr}),*
    ) => {
        $(
            impl Readable for $ty {
                fn read_from($r: &mut ByteCursor) -> NetResult<Self> {
                    $read
                }
            }

            impl Writable for $ty {
                fn write_to(&self, $w: &mut ByteCursor) -> NetResult<()> {
                    let $s = self;
                    $write
                }
            }
        )*
    };
}

composite_impl!(
    {RuntimeId, |d| Ok(RuntimeId(d.get_runtime_id()?)), |s, t| t.put_runtime_id(s.0)},
    {UniqueId, |d| Ok(UniqueId(d.get_unique_id()?)), |s, t| t.put_unique_id(s.0)},
    {Vector3, |d| d.get_vector(), |s, t| t.put_vector(s)},
    {Rotation, |d| d.get_rotation(false), |s, t| t.put_rotation(s, false)},
    {HeadRotation, |d| Ok(HeadRotation(d.get_rotation(true)?)), |s, t| t.put_rotation(&s.0, true)},
    {BlockPosition, |d| d.get_block_position(), |s, t| t.put_block_position(s)},
    {AttributeMap, |d| d.get_attributes(), |s, t| t.put_attributes(s)},
    {EntityData, |d| d.get_entity_data(), |s, t| t.put_entity_data(s)},
    {GameRules, |d| d.get_game_rules(), |s, t| t.put_game_rules(s)},
    {PackInfoList, |d| Ok(PackInfoList(d.get_packs(true)?)), |s, t| t.put_packs(&s.0, true)},
    {PackStackList, |d| Ok(PackStackList(d.get_packs(false)?)), |s, t| t.put_packs(&s.0, false)},
    {ItemStack, |d| d.get_slot(), |s, t| t.put_slot(s)},
    {Uuid, |d| d.get_uuid(), |s, t| t.put_uuid(s)}
);
