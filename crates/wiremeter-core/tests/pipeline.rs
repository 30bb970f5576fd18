//! End-to-end pipeline tests: synthetic Ethernet/IPv4/TCP packets in,
//! sink calls out. Frame and schema bytes are hand-encoded here so the
//! tests stay an independent check on the wire layout.

use etherparse::PacketBuilder;
use pcap_parser::Linktype;
use wiremeter_core::{
    CaptureConfig, CombatRecord, EnemySnapshot, LocalPosition, PacketEvent, Pipeline, Sink,
};

const COMBAT_SERVICE: u64 = 0x0000_0000_6333_5342;
const NOTIFY: u16 = 0x0002;
const ECHO: u16 = 0x0004;
const FRAME_UP: u16 = 0x0005;
const COMPRESSED: u16 = 0x8000;

const METHOD_NEAR_ENTITIES: u32 = 0x06;
const METHOD_CONTAINER_DIRTY: u32 = 0x16;
const METHOD_NEAR_DELTA: u32 = 0x2d;

const ATTACKER: u64 = (0x10 << 16) | 1;
const TARGET: u64 = (0xabcd << 16) | 2;

// --- minimal tag/value encoder, mirroring the production layout ---

#[derive(Default, Clone)]
struct Enc {
    out: Vec<u8>,
}

impl Enc {
    fn varint(mut self, mut value: u64) -> Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.out.push(byte);
                return self;
            }
            self.out.push(byte | 0x80);
        }
    }

    fn field_varint(self, field: u32, value: u64) -> Self {
        self.varint(u64::from(field) << 3).varint(value)
    }

    fn field_bytes(self, field: u32, bytes: &[u8]) -> Self {
        let mut enc = self.varint((u64::from(field) << 3) | 2).varint(bytes.len() as u64);
        enc.out.extend_from_slice(bytes);
        enc
    }

    fn field_msg(self, field: u32, msg: &Enc) -> Self {
        self.field_bytes(field, &msg.out)
    }
}

/// String attribute blob: u32 LE length, 4 reserved, UTF-8, 4 reserved.
fn string_attr_blob(value: &str) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&(value.len() as u32).to_le_bytes());
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(value.as_bytes());
    blob.extend_from_slice(&[0u8; 4]);
    blob
}

fn attr_entry(id: u32, raw: &[u8]) -> Enc {
    Enc::default().field_varint(1, id.into()).field_bytes(2, raw)
}

fn attr_collection(entries: &[Enc]) -> Enc {
    let mut collection = Enc::default();
    for entry in entries {
        collection = collection.field_msg(1, entry);
    }
    collection
}

/// CombatEvent: owner=1, attacker=2, value=4, type_flag=6, property=11.
fn damage_event(attacker: u64, value: u64, type_flag: u32, property: u32) -> Enc {
    Enc::default()
        .field_varint(1, 2201)
        .field_varint(2, attacker)
        .field_varint(4, value)
        .field_varint(6, type_flag.into())
        .field_varint(11, property.into())
}

/// AoiSyncDelta: uuid=1, attrs=2, damage_events=3 (list of events=1).
fn delta(uuid: u64, events: &[Enc]) -> Enc {
    let mut list = Enc::default();
    for event in events {
        list = list.field_msg(1, event);
    }
    Enc::default().field_varint(1, uuid).field_msg(3, &list)
}

fn near_delta_body(deltas: &[Enc]) -> Vec<u8> {
    let mut body = Enc::default();
    for d in deltas {
        body = body.field_msg(1, d);
    }
    body.out
}

fn notify_frame(service_id: u64, method_id: u32, schema_body: &[u8]) -> Vec<u8> {
    frame(NOTIFY, &notify_payload(service_id, method_id, schema_body))
}

fn notify_payload(service_id: u64, method_id: u32, schema_body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&service_id.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&method_id.to_be_bytes());
    payload.extend_from_slice(schema_body);
    payload
}

fn frame(type_and_flags: u16, body: &[u8]) -> Vec<u8> {
    let size = (6 + body.len()) as u32;
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(&type_and_flags.to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn s1_frame() -> Vec<u8> {
    let event = damage_event(ATTACKER, 1234, 1, 4);
    notify_frame(
        COMBAT_SERVICE,
        METHOD_NEAR_DELTA,
        &near_delta_body(&[delta(TARGET, &[event])]),
    )
}

// --- packet plumbing ---

fn tcp_packet(src_port: u16, payload: &[u8]) -> PacketEvent {
    let builder = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
        .ipv4([192, 168, 1, 20], [101, 35, 7, 9], 64)
        .tcp(src_port, 16000, 1, 64_000);
    let mut data = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut data, payload).unwrap();
    PacketEvent {
        ts: Some(1.0),
        linktype: Linktype::ETHERNET,
        data,
    }
}

fn feed(pipeline: &mut Pipeline<RecordingSink>, payload: &[u8]) {
    pipeline.handle_packet(&tcp_packet(40100, payload));
}

fn pipeline() -> Pipeline<RecordingSink> {
    Pipeline::new(CaptureConfig::default(), RecordingSink::default())
}

// --- recording sink ---

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Name(u64, String),
    Profession(u64, &'static str),
    FightPoint(u64, u64),
    Level(u64, u32),
    RankLevel(u64, u32),
    EnemyName(u64, String),
    EnemyId(u64, u32),
    EnemyHp(u64, u64),
    EnemyMaxHp(u64, u64),
    EnemyReductionLevel(u64, u32),
    EnemyReductionId(u64, u32),
    EnemyElement(u64, &'static str),
    AddEnemy(u64, EnemySnapshot),
    PlayerDamage(CombatRecord),
    DamageToPlayer(CombatRecord),
    Position(LocalPosition),
}

#[derive(Debug, Default)]
struct RecordingSink {
    calls: Vec<Call>,
}

impl Sink for RecordingSink {
    fn set_name(&mut self, uid: u64, name: String) {
        self.calls.push(Call::Name(uid, name));
    }
    fn set_profession(&mut self, uid: u64, profession: &'static str) {
        self.calls.push(Call::Profession(uid, profession));
    }
    fn set_fight_point(&mut self, uid: u64, value: u64) {
        self.calls.push(Call::FightPoint(uid, value));
    }
    fn set_level(&mut self, uid: u64, value: u32) {
        self.calls.push(Call::Level(uid, value));
    }
    fn set_rank_level(&mut self, uid: u64, value: u32) {
        self.calls.push(Call::RankLevel(uid, value));
    }
    fn set_enemy_name(&mut self, uid: u64, name: String) {
        self.calls.push(Call::EnemyName(uid, name));
    }
    fn set_enemy_id(&mut self, uid: u64, id: u32) {
        self.calls.push(Call::EnemyId(uid, id));
    }
    fn set_enemy_hp(&mut self, uid: u64, hp: u64) {
        self.calls.push(Call::EnemyHp(uid, hp));
    }
    fn set_enemy_max_hp(&mut self, uid: u64, max_hp: u64) {
        self.calls.push(Call::EnemyMaxHp(uid, max_hp));
    }
    fn set_enemy_reduction_level(&mut self, uid: u64, value: u32) {
        self.calls.push(Call::EnemyReductionLevel(uid, value));
    }
    fn set_enemy_reduction_id(&mut self, uid: u64, value: u32) {
        self.calls.push(Call::EnemyReductionId(uid, value));
    }
    fn set_enemy_element(&mut self, uid: u64, element: &'static str) {
        self.calls.push(Call::EnemyElement(uid, element));
    }
    fn add_enemy(&mut self, uid: u64, snapshot: EnemySnapshot) {
        self.calls.push(Call::AddEnemy(uid, snapshot));
    }
    fn process_player_damage(&mut self, record: CombatRecord) {
        self.calls.push(Call::PlayerDamage(record));
    }
    fn process_damage_to_player(&mut self, record: CombatRecord) {
        self.calls.push(Call::DamageToPlayer(record));
    }
    fn set_local_position(&mut self, position: LocalPosition) {
        self.calls.push(Call::Position(position));
    }
}

// --- scenarios ---

#[test]
fn single_damage_frame_reaches_the_sink() {
    let mut pipeline = pipeline();
    feed(&mut pipeline, &s1_frame());

    let calls = pipeline.into_sink().calls;
    assert_eq!(calls.len(), 1);
    let Call::PlayerDamage(record) = &calls[0] else {
        panic!("expected a player damage call, got {calls:?}");
    };
    assert_eq!(record.attacker_id, 0x10);
    assert_eq!(record.target_id, 0xabcd);
    assert_eq!(record.skill_id, 2201);
    assert_eq!(record.value, 1234);
    assert!(record.is_crit);
    assert!(!record.is_cause_lucky);
    assert_eq!(record.element, "Thunder");
}

#[test]
fn compressed_container_matches_plain_delivery() {
    let mut direct = pipeline();
    feed(&mut direct, &s1_frame());

    let packed = zstd::stream::encode_all(s1_frame().as_slice(), 0).unwrap();
    let container = frame(ECHO | COMPRESSED, &packed);
    let mut via_container = pipeline();
    feed(&mut via_container, &container);

    assert_eq!(direct.into_sink().calls, via_container.into_sink().calls);
}

#[test]
fn container_unwrap_is_lossless() {
    let mut direct = pipeline();
    feed(&mut direct, &s1_frame());

    let container = frame(FRAME_UP, &s1_frame());
    let mut wrapped = pipeline();
    feed(&mut wrapped, &container);

    assert_eq!(direct.into_sink().calls, wrapped.into_sink().calls);
}

#[test]
fn compressed_notify_body_matches_plain() {
    let event = damage_event(ATTACKER, 777, 0, 2);
    let schema = near_delta_body(&[delta(TARGET, &[event])]);

    let mut plain = pipeline();
    feed(
        &mut plain,
        &notify_frame(COMBAT_SERVICE, METHOD_NEAR_DELTA, &schema),
    );

    let packed = zstd::stream::encode_all(schema.as_slice(), 0).unwrap();
    let compressed_frame = frame(
        NOTIFY | COMPRESSED,
        &notify_payload(COMBAT_SERVICE, METHOD_NEAR_DELTA, &packed),
    );
    let mut compressed = pipeline();
    feed(&mut compressed, &compressed_frame);

    let plain_calls = plain.into_sink().calls;
    assert_eq!(plain_calls.len(), 1);
    assert_eq!(plain_calls, compressed.into_sink().calls);
}

#[test]
fn resync_locks_onto_the_frame_after_garbage() {
    let mut pipeline = pipeline();
    let mut payload = vec![0x00, 0x00, 0x00, 0x00];
    payload.extend_from_slice(&s1_frame());
    feed(&mut pipeline, &payload);

    assert_eq!(pipeline.counters().resync_bytes, 4);
    assert_eq!(pipeline.counters().frames, 1);
    let calls = pipeline.into_sink().calls;
    assert!(matches!(calls.as_slice(), [Call::PlayerDamage(_)]));
}

#[test]
fn wrong_service_id_produces_no_calls() {
    let mut pipeline = pipeline();
    let event = damage_event(ATTACKER, 1234, 1, 4);
    let body = near_delta_body(&[delta(TARGET, &[event])]);
    feed(&mut pipeline, &notify_frame(0x1, METHOD_NEAR_DELTA, &body));

    assert_eq!(pipeline.counters().foreign_service, 1);
    assert!(pipeline.into_sink().calls.is_empty());
}

#[test]
fn string_attribute_sets_player_name() {
    let mut pipeline = pipeline();
    // SyncContainerDirtyData: uuid=1, container=2 { attrs=1 { attrs=1 } }
    let entry = attr_entry(0x01, &string_attr_blob("Alice"));
    let container = Enc::default().field_msg(1, &attr_collection(&[entry]));
    let body = Enc::default()
        .field_varint(1, ATTACKER)
        .field_msg(2, &container)
        .out;
    feed(
        &mut pipeline,
        &notify_frame(COMBAT_SERVICE, METHOD_CONTAINER_DIRTY, &body),
    );

    let calls = pipeline.into_sink().calls;
    assert_eq!(calls, vec![Call::Name(0x10, "Alice".to_string())]);
}

#[test]
fn profession_attribute_maps_to_display_name() {
    let mut pipeline = pipeline();
    // SyncNearEntities: appear=1 { uuid=1, container=2 }
    let entry = attr_entry(0xdc, &23u32.to_be_bytes());
    let container = Enc::default().field_msg(1, &attr_collection(&[entry]));
    let appear = Enc::default()
        .field_varint(1, ATTACKER)
        .field_msg(2, &container);
    let body = Enc::default().field_msg(1, &appear).out;
    feed(
        &mut pipeline,
        &notify_frame(COMBAT_SERVICE, METHOD_NEAR_ENTITIES, &body),
    );

    let calls = pipeline.into_sink().calls;
    assert_eq!(calls, vec![Call::Profession(0x10, "涤罪恶火_战斧")]);
}

#[test]
fn frame_split_across_segments_still_decodes() {
    let mut pipeline = pipeline();
    let bytes = s1_frame();
    let (head, tail) = bytes.split_at(bytes.len() / 2);
    feed(&mut pipeline, head);
    assert!(pipeline.sink_mut().calls.is_empty());
    feed(&mut pipeline, tail);

    let calls = pipeline.into_sink().calls;
    assert!(matches!(calls.as_slice(), [Call::PlayerDamage(_)]));
}

#[test]
fn player_to_player_damage_is_filtered() {
    let mut pipeline = pipeline();
    let other_player = (0x33u64 << 16) | 1;
    let event = damage_event(ATTACKER, 555, 0, 0);
    let body = near_delta_body(&[delta(other_player, &[event])]);
    feed(
        &mut pipeline,
        &notify_frame(COMBAT_SERVICE, METHOD_NEAR_DELTA, &body),
    );

    assert!(pipeline.into_sink().calls.is_empty());
}

#[test]
fn runaway_nesting_is_bounded() {
    let mut pipeline = pipeline();
    let mut nested = s1_frame();
    for _ in 0..8 {
        nested = frame(ECHO, &nested);
    }
    feed(&mut pipeline, &nested);

    assert_eq!(pipeline.counters().nesting_limit_hits, 1);
    assert!(pipeline.into_sink().calls.is_empty());
}

#[test]
fn nesting_within_the_bound_unwraps() {
    let mut pipeline = pipeline();
    let nested = frame(ECHO, &frame(FRAME_UP, &s1_frame()));
    feed(&mut pipeline, &nested);

    let calls = pipeline.into_sink().calls;
    assert!(matches!(calls.as_slice(), [Call::PlayerDamage(_)]));
}

#[test]
fn corrupt_compressed_frame_is_dropped_not_fatal() {
    let mut pipeline = pipeline();
    let bogus = frame(ECHO | COMPRESSED, &[0xde, 0xad, 0xbe, 0xef]);
    feed(&mut pipeline, &bogus);
    assert_eq!(pipeline.counters().decompress_failures, 1);

    // the flow keeps working
    feed(&mut pipeline, &s1_frame());
    let calls = pipeline.into_sink().calls;
    assert!(matches!(calls.as_slice(), [Call::PlayerDamage(_)]));
}

#[test]
fn schema_garbage_is_dropped_not_fatal() {
    let mut pipeline = pipeline();
    feed(
        &mut pipeline,
        &notify_frame(COMBAT_SERVICE, METHOD_NEAR_DELTA, &[0xff, 0xff, 0x07]),
    );
    assert_eq!(pipeline.counters().schema_failures, 1);

    feed(&mut pipeline, &s1_frame());
    let calls = pipeline.into_sink().calls;
    assert!(matches!(calls.as_slice(), [Call::PlayerDamage(_)]));
}

#[test]
fn fresh_pipeline_has_no_memory_of_old_flows() {
    // device switch is modeled as a new pipeline: half a frame left in
    // an old flow must not complete in the new one
    let bytes = s1_frame();
    let (head, tail) = bytes.split_at(10);

    let mut before = pipeline();
    feed(&mut before, head);
    assert!(before.into_sink().calls.is_empty());

    let mut after = pipeline();
    feed(&mut after, tail);
    assert!(after.into_sink().calls.is_empty());
}

#[test]
fn return_frames_are_acknowledged_silently() {
    let mut pipeline = pipeline();
    feed(&mut pipeline, &frame(0x0003, b"reserved"));
    assert_eq!(pipeline.counters().frames, 1);
    assert_eq!(pipeline.counters().envelope_failures, 0);
    assert!(pipeline.into_sink().calls.is_empty());
}
