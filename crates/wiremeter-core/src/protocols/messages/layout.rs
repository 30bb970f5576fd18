//! Field numbers for every decoded message — the schema registry.

pub mod attr_entry {
    pub const ID: u32 = 1;
    pub const RAW: u32 = 2;
}

pub mod attr_collection {
    pub const ATTRS: u32 = 1;
}

pub mod char_base {
    pub const NAME: u32 = 1;
    pub const FIGHT_POINT: u32 = 2;
    pub const LEVEL: u32 = 3;
}

pub mod monster_base {
    pub const NAME: u32 = 1;
    pub const HP: u32 = 2;
    pub const MAX_HP: u32 = 3;
    pub const MONSTER_ID: u32 = 4;
}

pub mod container {
    pub const ATTRS: u32 = 1;
    pub const CHAR_BASE: u32 = 2;
    pub const MONSTER_BASE: u32 = 3;
}

pub mod entity_appear {
    pub const UUID: u32 = 1;
    pub const CONTAINER: u32 = 2;
}

pub mod sync_near_entities {
    pub const APPEAR: u32 = 1;
}

/// Shared by SyncContainerData and SyncContainerDirtyData; the dirty
/// variant just carries a sparse container.
pub mod sync_container {
    pub const UUID: u32 = 1;
    pub const CONTAINER: u32 = 2;
}

pub mod combat_event {
    pub const OWNER_ID: u32 = 1;
    pub const ATTACKER_UUID: u32 = 2;
    pub const TOP_SUMMONER_ID: u32 = 3;
    pub const VALUE: u32 = 4;
    pub const LUCKY_VALUE: u32 = 5;
    pub const TYPE_FLAG: u32 = 6;
    pub const TYPE_CODE: u32 = 7;
    pub const IS_MISS: u32 = 8;
    pub const IS_DEAD: u32 = 9;
    pub const HP_LESSEN: u32 = 10;
    pub const PROPERTY: u32 = 11;
    pub const DAMAGE_SOURCE: u32 = 12;
}

pub mod combat_event_list {
    pub const EVENTS: u32 = 1;
}

pub mod aoi_delta {
    pub const UUID: u32 = 1;
    pub const ATTRS: u32 = 2;
    pub const DAMAGE_EVENTS: u32 = 3;
}

pub mod sync_near_delta {
    pub const DELTAS: u32 = 1;
}

pub mod sync_to_me_delta {
    pub const DELTA: u32 = 1;
}

pub mod sync_server_time {
    pub const SERVER_TS: u32 = 1;
    pub const DELTA: u32 = 2;
}

pub mod move_position {
    pub const X: u32 = 1;
    pub const Y: u32 = 2;
    pub const Z: u32 = 3;
    pub const DIR: u32 = 4;
    pub const MOVE_VERSION: u32 = 5;
}

pub mod new_move {
    pub const POSITION: u32 = 1;
}

pub mod user_control {
    pub const UUID: u32 = 1;
    pub const POSITION: u32 = 2;
}

/// Type code marking a heal in a combat event.
pub const TYPE_CODE_HEAL: u32 = 1;
