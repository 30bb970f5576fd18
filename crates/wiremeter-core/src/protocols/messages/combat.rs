//! Area-of-interest deltas and the damage events they carry.

use super::entity::AttrCollection;
use super::error::{MessageError, missing};
use super::layout;
use crate::protocols::wire::{WireReader, WireType};

/// One damage or heal record as it appears on the wire.
///
/// `value` and `lucky_value` keep field presence: a lucky hit is defined
/// by the lucky value being present at all, not by its magnitude.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatEvent {
    /// Skill id owning the event.
    pub owner_id: u64,
    pub attacker_uuid: u64,
    /// Non-zero when a summon attributes the event to its summoner.
    pub top_summoner_id: u64,
    pub value: Option<u64>,
    pub lucky_value: Option<u64>,
    pub type_flag: u32,
    pub type_code: u32,
    pub is_miss: bool,
    pub is_dead: bool,
    pub hp_lessen: u64,
    /// Element tag; labels resolve in the analysis layer.
    pub property: u32,
    pub damage_source: u32,
}

impl CombatEvent {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        use layout::combat_event as f;
        let mut reader = WireReader::new(body);
        let mut event = Self::default();
        let mut has_attacker = false;
        while !reader.is_empty() {
            match reader.read_key()? {
                (f::OWNER_ID, WireType::Varint) => event.owner_id = reader.read_varint()?,
                (f::ATTACKER_UUID, WireType::Varint) => {
                    event.attacker_uuid = reader.read_varint()?;
                    has_attacker = true;
                }
                (f::TOP_SUMMONER_ID, WireType::Varint) => {
                    event.top_summoner_id = reader.read_varint()?;
                }
                (f::VALUE, WireType::Varint) => event.value = Some(reader.read_varint()?),
                (f::LUCKY_VALUE, WireType::Varint) => {
                    event.lucky_value = Some(reader.read_varint()?);
                }
                (f::TYPE_FLAG, WireType::Varint) => {
                    event.type_flag = reader.read_varint()? as u32;
                }
                (f::TYPE_CODE, WireType::Varint) => {
                    event.type_code = reader.read_varint()? as u32;
                }
                (f::IS_MISS, WireType::Varint) => event.is_miss = reader.read_varint()? != 0,
                (f::IS_DEAD, WireType::Varint) => event.is_dead = reader.read_varint()? != 0,
                (f::HP_LESSEN, WireType::Varint) => event.hp_lessen = reader.read_varint()?,
                (f::PROPERTY, WireType::Varint) => {
                    event.property = reader.read_varint()? as u32;
                }
                (f::DAMAGE_SOURCE, WireType::Varint) => {
                    event.damage_source = reader.read_varint()? as u32;
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        if !has_attacker {
            return Err(missing("CombatEvent", f::ATTACKER_UUID));
        }
        Ok(event)
    }

    /// Heal events are typed, not sign-flagged.
    pub fn is_heal(&self) -> bool {
        self.type_code == layout::TYPE_CODE_HEAL
    }
}

/// Per-entity batch of attribute changes and damage events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AoiSyncDelta {
    pub uuid: u64,
    pub attrs: Option<AttrCollection>,
    pub events: Vec<CombatEvent>,
}

impl AoiSyncDelta {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut uuid = None;
        let mut attrs = None;
        let mut events = Vec::new();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::aoi_delta::UUID, WireType::Varint) => {
                    uuid = Some(reader.read_varint()?);
                }
                (layout::aoi_delta::ATTRS, WireType::LengthDelimited) => {
                    attrs = Some(AttrCollection::decode(reader.read_bytes()?)?);
                }
                (layout::aoi_delta::DAMAGE_EVENTS, WireType::LengthDelimited) => {
                    events = decode_event_list(reader.read_bytes()?)?;
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self {
            uuid: uuid.ok_or(missing("AoiSyncDelta", layout::aoi_delta::UUID))?,
            attrs,
            events,
        })
    }
}

fn decode_event_list(body: &[u8]) -> Result<Vec<CombatEvent>, MessageError> {
    let mut reader = WireReader::new(body);
    let mut events = Vec::new();
    while !reader.is_empty() {
        match reader.read_key()? {
            (layout::combat_event_list::EVENTS, WireType::LengthDelimited) => {
                events.push(CombatEvent::decode(reader.read_bytes()?)?);
            }
            (_, wire_type) => reader.skip(wire_type)?,
        }
    }
    Ok(events)
}

/// Deltas for entities near the local player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncNearDeltaInfo {
    pub deltas: Vec<AoiSyncDelta>,
}

impl SyncNearDeltaInfo {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut deltas = Vec::new();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::sync_near_delta::DELTAS, WireType::LengthDelimited) => {
                    deltas.push(AoiSyncDelta::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self { deltas })
    }
}

/// Delta addressed at the local player; its uuid is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncToMeDeltaInfo {
    pub delta: AoiSyncDelta,
}

impl SyncToMeDeltaInfo {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut delta = None;
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::sync_to_me_delta::DELTA, WireType::LengthDelimited) => {
                    delta = Some(AoiSyncDelta::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self {
            delta: delta.ok_or(missing("SyncToMeDeltaInfo", layout::sync_to_me_delta::DELTA))?,
        })
    }
}

/// Clock sync that piggybacks one AoI delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncServerTime {
    pub server_ts: u64,
    pub delta: Option<AoiSyncDelta>,
}

impl SyncServerTime {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut message = Self::default();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::sync_server_time::SERVER_TS, WireType::Varint) => {
                    message.server_ts = reader.read_varint()?;
                }
                (layout::sync_server_time::DELTA, WireType::LengthDelimited) => {
                    message.delta = Some(AoiSyncDelta::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(message)
    }
}
