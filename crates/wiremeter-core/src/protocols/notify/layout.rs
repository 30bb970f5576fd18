pub const SERVICE_ID_RANGE: std::ops::Range<usize> = 0..8;
pub const STUB_ID_RANGE: std::ops::Range<usize> = 8..12;
pub const METHOD_ID_RANGE: std::ops::Range<usize> = 12..16;
pub const HEADER_LEN: usize = 16;

/// The game's combat/entity sync service.
pub const COMBAT_SERVICE_ID: u64 = 0x0000_0000_6333_5342;

/// Method ids routed to typed decoders. Anything else on the combat
/// service gets the opportunistic movement decode.
pub mod method {
    pub const SYNC_NEAR_ENTITIES: u32 = 0x0000_0006;
    pub const SYNC_CONTAINER_DATA: u32 = 0x0000_0015;
    pub const SYNC_CONTAINER_DIRTY_DATA: u32 = 0x0000_0016;
    pub const SYNC_SERVER_TIME: u32 = 0x0000_002b;
    pub const SYNC_NEAR_DELTA_INFO: u32 = 0x0000_002d;
    pub const SYNC_TO_ME_DELTA_INFO: u32 = 0x0000_002e;
}
