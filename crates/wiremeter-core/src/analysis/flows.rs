use std::collections::HashMap;
use std::net::IpAddr;

use super::reassembly::{DrainOutcome, FrameBuffer};
use super::tcp::TcpSegment;

/// Directed flow identity; each direction of a connection reassembles
/// independently.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct FlowKey {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
}

impl FlowKey {
    pub(crate) fn from_segment(segment: &TcpSegment<'_>) -> Self {
        Self {
            src_ip: segment.src_ip,
            src_port: segment.src_port,
            dst_ip: segment.dst_ip,
            dst_port: segment.dst_port,
        }
    }
}

/// Flows idle longer than this are reclaimed.
const FLOW_IDLE_TIMEOUT_S: f64 = 60.0;

#[derive(Debug, Default)]
pub(crate) struct AppendOutcome {
    pub drained: DrainOutcome,
    /// The flow blew through its buffer cap and was discarded whole.
    pub flow_dropped: bool,
}

/// All live flow buffers, keyed by directed 4-tuple.
#[derive(Debug)]
pub(crate) struct FlowTable {
    flows: HashMap<FlowKey, FlowState>,
    max_frame_bytes: usize,
    max_flow_buffer_bytes: usize,
}

#[derive(Debug, Default)]
struct FlowState {
    buffer: FrameBuffer,
    last_seen: Option<f64>,
}

impl FlowTable {
    pub(crate) fn new(max_frame_bytes: usize, max_flow_buffer_bytes: usize) -> Self {
        Self {
            flows: HashMap::new(),
            max_frame_bytes,
            max_flow_buffer_bytes,
        }
    }

    /// Appends one observed payload and drains whatever frames complete.
    pub(crate) fn append(&mut self, key: FlowKey, payload: &[u8], ts: Option<f64>) -> AppendOutcome {
        let state = self.flows.entry(key.clone()).or_default();
        state.buffer.push(payload);
        if ts.is_some() {
            state.last_seen = ts;
        }
        let drained = state.buffer.drain_frames(self.max_frame_bytes);
        let mut outcome = AppendOutcome {
            drained,
            flow_dropped: false,
        };
        if state.buffer.len() > self.max_flow_buffer_bytes {
            self.flows.remove(&key);
            outcome.flow_dropped = true;
        }
        outcome
    }

    /// Reclaims flows with no traffic since `now - FLOW_IDLE_TIMEOUT_S`.
    pub(crate) fn prune_idle(&mut self, now: f64) -> usize {
        let before = self.flows.len();
        self.flows.retain(|_, state| match state.last_seen {
            Some(seen) => now - seen < FLOW_IDLE_TIMEOUT_S,
            None => true,
        });
        before - self.flows.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.flows.len()
    }
}
