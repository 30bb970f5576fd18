/// Per-packet scratch buffer; the largest capture libpcap will hand us.
pub const SNAPLEN: i32 = 65_535;

/// Kernel ring size. Combat bursts arrive in clumps; 10 MiB keeps the
/// kernel from dropping under them.
pub const BUFFER_BYTES: i32 = 10 * 1024 * 1024;

/// Read timeout so stop flags are observed between packets.
pub const READ_TIMEOUT_MS: i32 = 200;

/// Only TCP ever carries the game protocol; ports are not restricted,
/// the service-id filter downstream does the narrowing.
pub const BPF_FILTER: &str = "tcp";
