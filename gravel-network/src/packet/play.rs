//! Play-phase packets.
use gravel_primitives::{
    attribute::AttributeMap,
    gamerule::GameRules,
    metadata::EntityData,
    position::{BlockPosition, Vector3},
};
use uuid::Uuid;

use crate::{
    io::{
        composite::{HeadRotation, PackInfoList, PackStackList, RuntimeId, UniqueId},
        VarUInt,
    },
    packet::{def_packets, PacketKind},
    registry::PacketRegistry,
};

def_packets! {
    PlayStatus = 0x02 => {
        status: i32
    },
    Disconnect = 0x05 => {
        hide_screen: bool,
        message: String
    },
    /// Packs offered to a joining client.
    ResourcePacksInfo = 0x06 => {
        must_accept: bool,
        behaviour_packs: PackInfoList,
        resource_packs: PackInfoList
    },
    /// The order packs are applied in.
    ResourcePackStack = 0x07 => {
        must_accept: bool,
        behaviour_packs: PackStackList,
        resource_packs: PackStackList
    },
    AddPlayer = 0x0c => {
        uuid: Uuid,
        username: String,
        unique_id: UniqueId,
        runtime_id: RuntimeId,
        position: Vector3,
        motion: Vector3,
        rotation: HeadRotation
    },
    MoveEntity = 0x12 => {
        runtime_id: RuntimeId,
        position: Vector3,
        rotation: HeadRotation,
        on_ground: bool,
        teleported: bool
    },
    MovePlayer = 0x13 => {
        runtime_id: RuntimeId,
        position: Vector3,
        rotation: HeadRotation,
        mode: u8,
        on_ground: bool,
        ridden_runtime_id: RuntimeId
    },
    UpdateBlock = 0x15 => {
        position: BlockPosition,
        block_runtime_id: VarUInt,
        flags: VarUInt
    },
    UpdateAttributes = 0x1d => {
        runtime_id: RuntimeId,
        attributes: AttributeMap
    },
    SetEntityData = 0x27 => {
        runtime_id: RuntimeId,
        data: EntityData
    },
    GameRulesChanged = 0x48 => {
        rules: GameRules
    }
}

/// Registers every packet in this module.
pub fn register_default_packets(registry: &mut PacketRegistry) {
    registry.register_kind::<PlayStatus>();
    registry.register_kind::<Disconnect>();
    registry.register_kind::<ResourcePacksInfo>();
    registry.register_kind::<ResourcePackStack>();
    registry.register_kind::<AddPlayer>();
    registry.register_kind::<MoveEntity>();
    registry.register_kind::<MovePlayer>();
    registry.register_kind::<UpdateBlock>();
    registry.register_kind::<UpdateAttributes>();
    registry.register_kind::<SetEntityData>();
    registry.register_kind::<GameRulesChanged>();
}

impl PlayStatus {
    pub const LOGIN_SUCCESS: i32 = 0;
    pub const LOGIN_FAILED_CLIENT: i32 = 1;
    pub const LOGIN_FAILED_SERVER: i32 = 2;
    pub const PLAYER_SPAWN: i32 = 3;
}

impl MovePlayer {
    pub const MODE_NORMAL: u8 = 0;
    pub const MODE_RESET: u8 = 1;
    pub const MODE_TELEPORT: u8 = 2;
    pub const MODE_PITCH: u8 = 3;
}

/// Ids of the packets [`register_default_packets`] registers.
pub const DEFAULT_PACKET_IDS: &[crate::packet::PacketId] = &[
    PlayStatus::ID,
    Disconnect::ID,
    ResourcePacksInfo::ID,
    ResourcePackStack::ID,
    AddPlayer::ID,
    MoveEntity::ID,
    MovePlayer::ID,
    UpdateBlock::ID,
    UpdateAttributes::ID,
    SetEntityData::ID,
    GameRulesChanged::ID,
];

#[cfg(test)]
mod tests {
    use gravel_primitives::{
        attribute::Attribute, gamerule::GameRuleValue, metadata::EntityDatum,
        pack::ResourcePackInfo, position::Rotation,
    };

    use super::*;
    use crate::{
        io::ByteCursor,
        packet::{Packet, PacketBody},
    };

    fn decode_as<T: PacketKind + Clone>(body: T) -> T {
        let mut packet = Packet::new(body);
        packet.encode().unwrap();
        let mut decoded = Packet::new(T::default()).with_stream(ByteCursor::from(packet.buffer()));
        decoded.decode().unwrap();
        assert_eq!(decoded.stream().remaining(), 0);
        decoded.body_as::<T>().unwrap().clone()
    }

    #[test]
    fn default_ids_are_registered() {
        let mut registry = PacketRegistry::new();
        register_default_packets(&mut registry);
        for id in DEFAULT_PACKET_IDS {
            assert!(registry.is_registered(*id));
            assert_eq!(registry.get(*id).unwrap().id(), *id);
        }
    }

    #[test]
    fn add_player() {
        let body = AddPlayer {
            uuid: Uuid::from_u128(0x1234_5678_9abc_def0_0fed_cba9_8765_4321),
            username: "Steve".into(),
            unique_id: UniqueId(-12),
            runtime_id: RuntimeId(12),
            position: Vector3::new(0.5, 64.0, -0.5),
            motion: Vector3::ZERO,
            rotation: HeadRotation(Rotation::new(10.0, 20.0, 30.0)),
        };
        assert_eq!(decode_as(body.clone()), body);
    }

    #[test]
    fn move_player_layout() {
        let body = MovePlayer {
            runtime_id: RuntimeId(1),
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: HeadRotation(Rotation::new(4.0, 5.0, 6.0)),
            mode: MovePlayer::MODE_TELEPORT,
            on_ground: true,
            ridden_runtime_id: RuntimeId(0),
        };
        let mut packet = Packet::new(body.clone());
        packet.encode().unwrap();
        // header (3) + runtime id (1) + vector (12) + rotation (12) + mode, ground, ridden
        assert_eq!(packet.buffer().len(), 3 + 1 + 12 + 12 + 3);
        assert_eq!(decode_as(body.clone()), body);
    }

    #[test]
    fn composite_bodies() {
        let mut attributes = gravel_primitives::attribute::AttributeMap::new();
        attributes.set(Attribute::known("minecraft:health").unwrap());
        let update = UpdateAttributes {
            runtime_id: RuntimeId(7),
            attributes,
        };
        assert_eq!(decode_as(update.clone()), update);

        let data = SetEntityData {
            runtime_id: RuntimeId(7),
            data: [(4, EntityDatum::String("Steve".into()))].into_iter().collect(),
        };
        assert_eq!(decode_as(data.clone()), data);

        let mut rules = GameRules::default();
        rules.set("showcoordinates", GameRuleValue::Bool(true));
        let rules = GameRulesChanged { rules };
        assert_eq!(decode_as(rules.clone()), rules);

        let block = UpdateBlock {
            position: BlockPosition::new(-20, 70, 3),
            block_runtime_id: VarUInt(1),
            flags: VarUInt(0b11),
        };
        assert_eq!(decode_as(block.clone()), block);
    }

    #[test]
    fn resource_pack_packets() {
        let pack = ResourcePackInfo::new("5c2a3b6e-0d1e-4b3e-9f3a-2a1b0c9d8e7f", "1.0.0", 2048);
        let info = ResourcePacksInfo {
            must_accept: true,
            behaviour_packs: PackInfoList::default(),
            resource_packs: PackInfoList(vec![pack.clone()]),
        };
        assert_eq!(decode_as(info.clone()), info);

        let stack = ResourcePackStack {
            must_accept: false,
            behaviour_packs: PackStackList::default(),
            resource_packs: PackStackList(vec![ResourcePackInfo { size: 0, ..pack }]),
        };
        assert_eq!(decode_as(stack.clone()), stack);
    }

    #[test]
    fn body_reports_its_id() {
        assert_eq!(GameRulesChanged::default().id(), 0x48);
        assert_eq!(Disconnect::ID, 0x05);
    }
}
