/// String blob: u32 LE length, 4 reserved bytes, UTF-8 payload, 4
/// reserved bytes. The trailer is tolerated missing on truncated
/// captures; it carries nothing.
pub const STRING_LEN_RANGE: std::ops::Range<usize> = 0..4;
pub const STRING_PAYLOAD_OFFSET: usize = 8;

/// Numeric blob: one big-endian u32 at the front; longer blobs keep
/// their tail reserved.
pub const NUMERIC_LEN: usize = 4;

/// Recognized attribute ids.
pub mod attr {
    pub const NAME: u32 = 0x01;
    pub const MONSTER_TYPE_ID: u32 = 0x0a;
    pub const PROFESSION_ID: u32 = 0xdc;
    pub const LEVEL: u32 = 0x2710;
    pub const FIGHT_POINT: u32 = 0x272e;
    pub const RANK_LEVEL: u32 = 0x274c;
    pub const CUR_HP: u32 = 0x2c2e;
    pub const MAX_HP: u32 = 0x2c38;
    pub const REDUCTION_LEVEL: u32 = 0x64696d;
    pub const ELEMENT_FLAG: u32 = 0x646d6c;
    pub const REDUCTION_ID: u32 = 0x6f6c65;
}
