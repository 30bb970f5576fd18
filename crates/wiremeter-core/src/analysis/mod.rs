//! The capture-to-event pipeline.
//!
//! One synchronous path per packet: TCP slicing, per-flow reassembly,
//! envelope parsing with bounded container recursion, optional
//! decompression, notify routing, schema decoding, and entity/event
//! dispatch. Nothing in here may kill the flow of traffic: every
//! per-frame failure is counted and the next frame parses as if nothing
//! happened. Only the reassembler's buffer cap ever resets a flow.

mod dispatcher;
mod entities;
mod flows;
mod reassembly;
mod tcp;

use dispatcher::EntityDispatcher;
use flows::{FlowKey, FlowTable};
use tcp::parse_tcp_segment;

use crate::protocols::envelope::{MessageType, codec, parse_envelope};
use crate::protocols::messages::{
    SyncContainerData, SyncNearDeltaInfo, SyncNearEntities, SyncServerTime, SyncToMeDeltaInfo,
};
use crate::protocols::notify::{method, parse_notify};
use crate::sink::Sink;
use crate::source::{PacketEvent, PacketSource, SourceError};
use crate::{CaptureConfig, PipelineCounters};

/// Packets between idle-flow sweeps.
const PRUNE_INTERVAL: u64 = 4096;

/// The synchronous per-packet decoding pipeline.
///
/// Owns all per-capture state: flow buffers, the entity dispatcher, and
/// the error counters. Built fresh on every capture start, so a device
/// switch can never replay state across devices.
pub struct Pipeline<S: Sink> {
    config: CaptureConfig,
    flows: FlowTable,
    dispatcher: EntityDispatcher<S>,
    counters: PipelineCounters,
}

impl<S: Sink> Pipeline<S> {
    pub fn new(config: CaptureConfig, sink: S) -> Self {
        let flows = FlowTable::new(config.max_frame_bytes, config.max_flow_buffer_bytes);
        let dispatcher = EntityDispatcher::new(
            config.monster_names.clone(),
            config.crit_flag_mask,
            config.cause_lucky_flag_mask,
            sink,
        );
        Self {
            config,
            flows,
            dispatcher,
            counters: PipelineCounters::default(),
        }
    }

    /// Decodes one captured frame to completion.
    pub fn handle_packet(&mut self, event: &PacketEvent) {
        self.counters.packets += 1;
        let segment = match parse_tcp_segment(event.linktype, &event.data) {
            Ok(Some(segment)) => segment,
            Ok(None) => return,
            Err(err) => {
                log::debug!("undissectable frame: {err}");
                return;
            }
        };
        self.counters.tcp_segments += 1;

        let key = FlowKey::from_segment(&segment);
        let outcome = self.flows.append(key, segment.payload, event.ts);
        self.counters.resync_bytes += outcome.drained.skipped_bytes;
        if outcome.flow_dropped {
            self.counters.flows_dropped += 1;
            log::warn!("flow buffer cap exceeded, flow discarded");
        }
        for frame in &outcome.drained.frames {
            self.counters.frames += 1;
            self.process_frame(frame, 0);
        }

        if let Some(ts) = event.ts {
            if self.counters.packets % PRUNE_INTERVAL == 0 {
                let removed = self.flows.prune_idle(ts);
                if removed > 0 {
                    log::debug!("pruned {removed} idle flows, {} live", self.flows.len());
                }
            }
        }
    }

    pub fn counters(&self) -> &PipelineCounters {
        &self.counters
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.dispatcher.sink_mut()
    }

    pub fn into_sink(self) -> S {
        self.dispatcher.into_sink()
    }

    fn process_frame(&mut self, frame: &[u8], depth: usize) {
        if depth > self.config.max_envelope_nesting {
            self.counters.nesting_limit_hits += 1;
            log::warn!("envelope nesting beyond {}", self.config.max_envelope_nesting);
            return;
        }
        let env = match parse_envelope(frame) {
            Ok(env) => env,
            Err(err) => {
                self.counters.envelope_failures += 1;
                log::debug!("envelope parse failed: {err}");
                return;
            }
        };
        match env.msg_type {
            MessageType::Notify => self.process_notify(env.compressed, env.body),
            // reserved; must not disturb the flow
            MessageType::Return => {}
            msg_type if msg_type.is_container() => {
                // the compression bit on a container covers the whole
                // nested frame
                if env.compressed {
                    match codec::decompress(env.body, self.config.max_frame_bytes) {
                        Ok(nested) => self.process_frame(&nested, depth + 1),
                        Err(err) => {
                            self.counters.decompress_failures += 1;
                            log::debug!("container decompression failed: {err}");
                        }
                    }
                } else {
                    self.process_frame(env.body, depth + 1);
                }
            }
            _ => {}
        }
    }

    /// Routes one notify body: service filter first, decompression only
    /// for frames that survive it.
    fn process_notify(&mut self, compressed: bool, payload: &[u8]) {
        let notify = match parse_notify(payload) {
            Ok(notify) => notify,
            Err(err) => {
                self.counters.notify_failures += 1;
                log::debug!("notify header parse failed: {err}");
                return;
            }
        };
        if notify.service_id != self.config.service_id {
            self.counters.foreign_service += 1;
            return;
        }
        if compressed {
            match codec::decompress(notify.body, self.config.max_frame_bytes) {
                Ok(body) => self.route_method(notify.method_id, &body),
                Err(err) => {
                    self.counters.decompress_failures += 1;
                    log::debug!("notify decompression failed: {err}");
                }
            }
        } else {
            self.route_method(notify.method_id, notify.body);
        }
    }

    fn route_method(&mut self, method_id: u32, body: &[u8]) {
        let result = match method_id {
            method::SYNC_NEAR_ENTITIES => SyncNearEntities::decode(body)
                .map(|msg| self.dispatcher.handle_near_entities(msg, &mut self.counters)),
            method::SYNC_CONTAINER_DATA | method::SYNC_CONTAINER_DIRTY_DATA => {
                SyncContainerData::decode(body)
                    .map(|msg| self.dispatcher.handle_container_update(msg, &mut self.counters))
            }
            method::SYNC_SERVER_TIME => SyncServerTime::decode(body)
                .map(|msg| self.dispatcher.handle_server_time(msg, &mut self.counters)),
            method::SYNC_NEAR_DELTA_INFO => SyncNearDeltaInfo::decode(body)
                .map(|msg| self.dispatcher.handle_near_deltas(msg.deltas, &mut self.counters)),
            method::SYNC_TO_ME_DELTA_INFO => SyncToMeDeltaInfo::decode(body)
                .map(|msg| self.dispatcher.handle_to_me_delta(msg, &mut self.counters)),
            _ => {
                self.dispatcher.handle_unknown_method(body);
                Ok(())
            }
        };
        if let Err(err) = result {
            self.counters.schema_failures += 1;
            log::debug!("schema decode failed for method {method_id:#x}: {err}");
        }
    }
}

/// Drives a packet source to exhaustion through the pipeline.
pub fn run_source<P: PacketSource, S: Sink>(
    source: &mut P,
    pipeline: &mut Pipeline<S>,
) -> Result<(), SourceError> {
    while let Some(event) = source.next_packet()? {
        pipeline.handle_packet(&event);
    }
    Ok(())
}
