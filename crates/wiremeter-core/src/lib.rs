use std::collections::HashMap;

use serde::{Deserialize, Serialize};

mod analysis;
mod protocols;
mod session;
mod sink;
mod source;

pub use analysis::{Pipeline, run_source};
pub use protocols::notify::COMBAT_SERVICE_ID;
pub use session::CaptureSession;
pub use sink::{CombatRecord, EnemySnapshot, LocalPosition, Sink};
pub use source::{
    DeviceInfo, LiveSource, PacketEvent, PacketSource, ReplayFileSource, SourceError,
    default_device_index, list_devices,
};

pub const DEFAULT_MAX_FRAME_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_MAX_FLOW_BUFFER_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_MAX_ENVELOPE_NESTING: usize = 4;

/// Pipeline tuning knobs.
///
/// Every field has a default, so a partial JSON document deserializes into
/// a usable configuration.
///
/// # Examples
/// ```
/// let config: wiremeter_core::CaptureConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config.max_envelope_nesting, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture-device index; unset picks the first non-loopback device
    /// with an IPv4 address.
    pub selected_device: Option<usize>,
    /// Upper bound on a single application frame, compressed or not.
    pub max_frame_bytes: usize,
    /// Per-flow accumulator cap; a flow exceeding it is discarded whole.
    pub max_flow_buffer_bytes: usize,
    /// Recursion bound for container envelopes.
    pub max_envelope_nesting: usize,
    /// Service id whose notifications are decoded; everything else is
    /// dropped silently.
    pub service_id: u64,
    /// Type-flag bit marking a critical hit. Empirical; override if the
    /// client build changes the layout.
    pub crit_flag_mask: u32,
    /// Type-flag bit marking a lucky-cause hit. Empirical, same caveat.
    pub cause_lucky_flag_mask: u32,
    /// Localized display-name remap for monsters; raw names pass through
    /// when no mapping exists.
    pub monster_names: HashMap<String, String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            selected_device: None,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            max_flow_buffer_bytes: DEFAULT_MAX_FLOW_BUFFER_BYTES,
            max_envelope_nesting: DEFAULT_MAX_ENVELOPE_NESTING,
            service_id: COMBAT_SERVICE_ID,
            crit_flag_mask: 0x1,
            cause_lucky_flag_mask: 0x4,
            monster_names: HashMap::new(),
        }
    }
}

/// Per-kind counters for everything the pipeline drops or suppresses.
///
/// Frame-level errors never propagate to the sink; these counters are the
/// observability contract for that policy.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCounters {
    pub packets: u64,
    pub tcp_segments: u64,
    pub frames: u64,
    /// Bytes skipped by the one-byte resynchronization walk.
    pub resync_bytes: u64,
    pub flows_dropped: u64,
    pub nesting_limit_hits: u64,
    pub envelope_failures: u64,
    pub decompress_failures: u64,
    pub notify_failures: u64,
    /// Notify frames carrying a service id other than the configured one.
    pub foreign_service: u64,
    pub schema_failures: u64,
    pub attr_failures: u64,
    /// Uuids whose low 16 bits match neither known discriminator.
    pub unknown_class: u64,
    /// Damage events whose type flag has bits outside both known masks.
    pub unexpected_type_flags: u64,
    pub events_emitted: u64,
}

#[cfg(test)]
mod tests {
    use super::CaptureConfig;

    #[test]
    fn config_defaults_match_documented_caps() {
        let config = CaptureConfig::default();
        assert_eq!(config.max_frame_bytes, 2 * 1024 * 1024);
        assert_eq!(config.max_flow_buffer_bytes, 4 * 1024 * 1024);
        assert_eq!(config.max_envelope_nesting, 4);
        assert_eq!(config.service_id, 0x6333_5342);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = CaptureConfig {
            selected_device: Some(2),
            ..CaptureConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: CaptureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.selected_device, Some(2));
        assert_eq!(back.service_id, config.service_id);
    }
}
