/// Block-section magic distinguishing PCAPNG from legacy PCAP.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

/// Read buffer handed to the pcap-parser readers.
pub const READER_BUFFER_SIZE: usize = 65_536;
