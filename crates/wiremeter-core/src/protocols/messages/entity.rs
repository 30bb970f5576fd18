//! Entity registration and container snapshots.

use super::error::{MessageError, missing};
use super::layout;
use crate::protocols::wire::{WireReader, WireType};

/// One `(attr_id, raw bytes)` pair; the byte interpretation lives in
/// `protocols::attrs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrEntry {
    pub id: u32,
    pub raw: Vec<u8>,
}

impl AttrEntry {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut id = None;
        let mut raw = Vec::new();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::attr_entry::ID, WireType::Varint) => {
                    id = Some(reader.read_varint()? as u32);
                }
                (layout::attr_entry::RAW, WireType::LengthDelimited) => {
                    raw = reader.read_bytes()?.to_vec();
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self {
            id: id.ok_or(missing("AttrEntry", layout::attr_entry::ID))?,
            raw,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrCollection {
    pub attrs: Vec<AttrEntry>,
}

impl AttrCollection {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut attrs = Vec::new();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::attr_collection::ATTRS, WireType::LengthDelimited) => {
                    attrs.push(AttrEntry::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self { attrs })
    }
}

/// Base data pushed with a player entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharBase {
    pub name: Option<String>,
    pub fight_point: Option<u64>,
    pub level: Option<u32>,
}

impl CharBase {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut base = Self::default();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::char_base::NAME, WireType::LengthDelimited) => {
                    base.name = Some(String::from_utf8_lossy(reader.read_bytes()?).into_owned());
                }
                (layout::char_base::FIGHT_POINT, WireType::Varint) => {
                    base.fight_point = Some(reader.read_varint()?);
                }
                (layout::char_base::LEVEL, WireType::Varint) => {
                    base.level = Some(reader.read_varint()? as u32);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(base)
    }
}

/// Base data pushed with a monster entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonsterBase {
    pub name: Option<String>,
    pub hp: Option<u64>,
    pub max_hp: Option<u64>,
    pub monster_id: Option<u32>,
}

impl MonsterBase {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut base = Self::default();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::monster_base::NAME, WireType::LengthDelimited) => {
                    base.name = Some(String::from_utf8_lossy(reader.read_bytes()?).into_owned());
                }
                (layout::monster_base::HP, WireType::Varint) => {
                    base.hp = Some(reader.read_varint()?);
                }
                (layout::monster_base::MAX_HP, WireType::Varint) => {
                    base.max_hp = Some(reader.read_varint()?);
                }
                (layout::monster_base::MONSTER_ID, WireType::Varint) => {
                    base.monster_id = Some(reader.read_varint()? as u32);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(base)
    }
}

/// Attribute collection plus whichever base data the entity class carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityContainer {
    pub attrs: Option<AttrCollection>,
    pub char_base: Option<CharBase>,
    pub monster_base: Option<MonsterBase>,
}

impl EntityContainer {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut container = Self::default();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::container::ATTRS, WireType::LengthDelimited) => {
                    container.attrs = Some(AttrCollection::decode(reader.read_bytes()?)?);
                }
                (layout::container::CHAR_BASE, WireType::LengthDelimited) => {
                    container.char_base = Some(CharBase::decode(reader.read_bytes()?)?);
                }
                (layout::container::MONSTER_BASE, WireType::LengthDelimited) => {
                    container.monster_base = Some(MonsterBase::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(container)
    }
}

/// One entity entering the area of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAppear {
    pub uuid: u64,
    pub container: Option<EntityContainer>,
}

impl EntityAppear {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut uuid = None;
        let mut container = None;
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::entity_appear::UUID, WireType::Varint) => {
                    uuid = Some(reader.read_varint()?);
                }
                (layout::entity_appear::CONTAINER, WireType::LengthDelimited) => {
                    container = Some(EntityContainer::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self {
            uuid: uuid.ok_or(missing("EntityAppear", layout::entity_appear::UUID))?,
            container,
        })
    }
}

/// Bulk registration of nearby entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncNearEntities {
    pub appear: Vec<EntityAppear>,
}

impl SyncNearEntities {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut appear = Vec::new();
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::sync_near_entities::APPEAR, WireType::LengthDelimited) => {
                    appear.push(EntityAppear::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self { appear })
    }
}

/// Single-entity snapshot or patch; SyncContainerDirtyData shares the
/// shape, just sparser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncContainerData {
    pub uuid: u64,
    pub container: Option<EntityContainer>,
}

impl SyncContainerData {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut uuid = None;
        let mut container = None;
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::sync_container::UUID, WireType::Varint) => {
                    uuid = Some(reader.read_varint()?);
                }
                (layout::sync_container::CONTAINER, WireType::LengthDelimited) => {
                    container = Some(EntityContainer::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self {
            uuid: uuid.ok_or(missing("SyncContainerData", layout::sync_container::UUID))?,
            container,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AttrEntry, EntityAppear, SyncContainerData, SyncNearEntities};
    use crate::protocols::messages::error::MessageError;
    use crate::protocols::messages::layout;
    use crate::protocols::wire::WireWriter;

    fn attr_entry(id: u32, raw: &[u8]) -> WireWriter {
        let mut w = WireWriter::new();
        w.field_varint(layout::attr_entry::ID, id.into());
        w.field_bytes(layout::attr_entry::RAW, raw);
        w
    }

    #[test]
    fn attr_entry_round_trip() {
        let bytes = attr_entry(0x2c38, &[0, 0, 0, 9]).into_bytes();
        let entry = AttrEntry::decode(&bytes).unwrap();
        assert_eq!(entry.id, 0x2c38);
        assert_eq!(entry.raw, vec![0, 0, 0, 9]);
    }

    #[test]
    fn attr_entry_requires_id() {
        let mut w = WireWriter::new();
        w.field_bytes(layout::attr_entry::RAW, &[1]);
        let err = AttrEntry::decode(w.as_bytes()).unwrap_err();
        assert!(matches!(err, MessageError::MissingField { .. }));
    }

    #[test]
    fn near_entities_with_char_base() {
        let mut base = WireWriter::new();
        base.field_string(layout::char_base::NAME, "Alice");
        base.field_varint(layout::char_base::FIGHT_POINT, 4321);
        base.field_varint(layout::char_base::LEVEL, 60);

        let mut container = WireWriter::new();
        container.field_message(layout::container::CHAR_BASE, &base);

        let mut appear = WireWriter::new();
        appear.field_varint(layout::entity_appear::UUID, (77u64 << 16) | 1);
        appear.field_message(layout::entity_appear::CONTAINER, &container);

        let mut msg = WireWriter::new();
        msg.field_message(layout::sync_near_entities::APPEAR, &appear);

        let decoded = SyncNearEntities::decode(msg.as_bytes()).unwrap();
        assert_eq!(decoded.appear.len(), 1);
        let entity = &decoded.appear[0];
        assert_eq!(entity.uuid & 0xffff, 1);
        let base = entity
            .container
            .as_ref()
            .and_then(|c| c.char_base.as_ref())
            .unwrap();
        assert_eq!(base.name.as_deref(), Some("Alice"));
        assert_eq!(base.fight_point, Some(4321));
        assert_eq!(base.level, Some(60));
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut appear = WireWriter::new();
        appear.field_varint(layout::entity_appear::UUID, 99);
        appear.field_varint(900, 5);
        appear.field_bytes(901, b"future schema growth");
        let decoded = EntityAppear::decode(appear.as_bytes()).unwrap();
        assert_eq!(decoded.uuid, 99);
        assert!(decoded.container.is_none());
    }

    #[test]
    fn container_data_requires_uuid() {
        let mut w = WireWriter::new();
        w.field_bytes(layout::sync_container::CONTAINER, &[]);
        let err = SyncContainerData::decode(w.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            MessageError::MissingField {
                message: "SyncContainerData",
                ..
            }
        ));
    }

    #[test]
    fn truncated_nested_message_is_an_error() {
        let mut w = WireWriter::new();
        w.field_varint(layout::entity_appear::UUID, 7);
        let mut bytes = w.into_bytes();
        // declare a nested container longer than what follows
        bytes.extend_from_slice(&[(layout::entity_appear::CONTAINER << 3 | 2) as u8, 0x20, 0x01]);
        let err = EntityAppear::decode(&bytes).unwrap_err();
        assert!(matches!(err, MessageError::Wire(_)));
    }
}
