use std::io::{Read, Seek, SeekFrom};

use pcap_parser::Linktype;

use super::error::ReplaySourceError;

pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], ReplaySourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

/// PCAPNG enhanced-packet timestamps at the default microsecond resolution.
pub fn pcapng_ts_to_seconds(ts_high: u32, ts_low: u32) -> f64 {
    let ticks = ((ts_high as u64) << 32) | ts_low as u64;
    ticks as f64 * 1e-6
}

/// Linktype for an interface id, falling back to Ethernet when the
/// interface-description block never arrived.
pub fn linktype_for_interface(linktypes: &[Linktype], if_id: u32) -> Linktype {
    linktypes
        .get(if_id as usize)
        .copied()
        .unwrap_or(Linktype::ETHERNET)
}
