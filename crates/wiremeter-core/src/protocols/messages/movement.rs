//! Movement messages, decoded speculatively for unknown method ids.
//!
//! There is no registry entry telling us which methods carry movement, so
//! the dispatcher tries `NewMove` then `UserControlInfo` and keeps the
//! first that decodes. The required `move_version` keeps arbitrary bytes
//! from passing as a position.

use super::error::{MessageError, missing};
use super::layout;
use crate::protocols::wire::{WireReader, WireType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovePosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub dir: i32,
    pub move_version: u32,
}

impl MovePosition {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        use layout::move_position as f;
        let mut reader = WireReader::new(body);
        let mut x = 0.0;
        let mut y = 0.0;
        let mut z = 0.0;
        let mut dir = 0;
        let mut move_version = None;
        while !reader.is_empty() {
            match reader.read_key()? {
                (f::X, WireType::Fixed32) => x = reader.read_f32()?,
                (f::Y, WireType::Fixed32) => y = reader.read_f32()?,
                (f::Z, WireType::Fixed32) => z = reader.read_f32()?,
                (f::DIR, WireType::Varint) => dir = reader.read_sint32()?,
                (f::MOVE_VERSION, WireType::Varint) => {
                    move_version = Some(reader.read_varint()? as u32);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self {
            x,
            y,
            z,
            dir,
            move_version: move_version.ok_or(missing("MovePosition", f::MOVE_VERSION))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewMove {
    pub position: MovePosition,
}

impl NewMove {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut position = None;
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::new_move::POSITION, WireType::LengthDelimited) => {
                    position = Some(MovePosition::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self {
            position: position.ok_or(missing("NewMove", layout::new_move::POSITION))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserControlInfo {
    pub uuid: Option<u64>,
    pub position: MovePosition,
}

impl UserControlInfo {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        let mut reader = WireReader::new(body);
        let mut uuid = None;
        let mut position = None;
        while !reader.is_empty() {
            match reader.read_key()? {
                (layout::user_control::UUID, WireType::Varint) => {
                    uuid = Some(reader.read_varint()?);
                }
                (layout::user_control::POSITION, WireType::LengthDelimited) => {
                    position = Some(MovePosition::decode(reader.read_bytes()?)?);
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(Self {
            uuid,
            position: position.ok_or(missing("UserControlInfo", layout::user_control::POSITION))?,
        })
    }
}
