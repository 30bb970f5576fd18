//! Typed message decoders.
//!
//! The method id inside a notify header selects one of these shapes; the
//! field numbers in `layout` are the schema registry. Decoders skip
//! unknown fields (the server grows its schema without notice) and fail
//! the current frame, never the flow, when a required field is absent.

pub mod combat;
pub mod entity;
pub mod error;
pub mod layout;
pub mod movement;

pub use combat::{AoiSyncDelta, CombatEvent, SyncNearDeltaInfo, SyncServerTime, SyncToMeDeltaInfo};
pub use entity::{
    AttrCollection, AttrEntry, CharBase, EntityAppear, EntityContainer, MonsterBase,
    SyncContainerData, SyncNearEntities,
};
pub use error::MessageError;
pub use movement::{MovePosition, NewMove, UserControlInfo};
