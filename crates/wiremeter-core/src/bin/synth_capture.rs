//! Writes a legacy PCAP containing a scripted combat exchange.
//!
//! The output exercises the whole decode path: entity registration,
//! attribute patches, a damage burst, a compressed container, and a
//! local-player delta. Point the CLI's `replay` command at it:
//!
//! `synth-capture demo-session.pcap && wiremeter replay demo-session.pcap`

use std::env;
use std::fs;
use std::path::PathBuf;

use etherparse::PacketBuilder;

const COMBAT_SERVICE: u64 = 0x0000_0000_6333_5342;
const NOTIFY: u16 = 0x0002;
const ECHO: u16 = 0x0004;
const COMPRESSED: u16 = 0x8000;

const METHOD_NEAR_ENTITIES: u32 = 0x06;
const METHOD_CONTAINER_DIRTY: u32 = 0x16;
const METHOD_NEAR_DELTA: u32 = 0x2d;
const METHOD_TO_ME_DELTA: u32 = 0x2e;

const LOCAL_PLAYER: u64 = (0x10 << 16) | 1;
const MONSTER: u64 = (0x900a << 16) | 2;

const ATTR_NAME: u32 = 0x01;
const ATTR_PROFESSION: u32 = 0xdc;
const ATTR_REDUCTION_LEVEL: u32 = 0x64696d;
const ATTR_ELEMENT: u32 = 0x646d6c;

fn main() -> Result<(), String> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demo-session.pcap"));

    let frames = script();
    let mut capture = pcap_header();
    for (index, frame_bytes) in frames.iter().enumerate() {
        let packet = tcp_packet(frame_bytes);
        capture.extend_from_slice(&record_header(index as u32, packet.len()));
        capture.extend_from_slice(&packet);
    }

    fs::write(&path, capture).map_err(|err| format!("write {}: {err}", path.display()))?;
    println!("wrote {} frames to {}", frames.len(), path.display());
    Ok(())
}

fn script() -> Vec<Vec<u8>> {
    let near_entities = {
        let char_base = Enc::new()
            .field_bytes(1, "Alice".as_bytes())
            .field_varint(2, 18_500)
            .field_varint(3, 60);
        let player_attrs = attr_collection(&[attr_entry(ATTR_PROFESSION, &23u32.to_be_bytes())]);
        let player_container = Enc::new().field_msg(1, &player_attrs).field_msg(2, &char_base);
        let player = Enc::new()
            .field_varint(1, LOCAL_PLAYER)
            .field_msg(2, &player_container);

        let monster_base = Enc::new()
            .field_bytes(1, "岩甲守卫".as_bytes())
            .field_varint(2, 84_000)
            .field_varint(3, 100_000)
            .field_varint(4, 9001);
        let monster_container = Enc::new().field_msg(3, &monster_base);
        let monster = Enc::new()
            .field_varint(1, MONSTER)
            .field_msg(2, &monster_container);

        let body = Enc::new().field_msg(1, &player).field_msg(1, &monster);
        notify_frame(METHOD_NEAR_ENTITIES, &body.out)
    };

    let dirty_patch = {
        let attrs = attr_collection(&[
            attr_entry(ATTR_REDUCTION_LEVEL, &3u32.to_be_bytes()),
            attr_entry(ATTR_ELEMENT, &4u32.to_be_bytes()),
            attr_entry(ATTR_NAME, &string_attr_blob("岩甲守卫")),
        ]);
        let container = Enc::new().field_msg(1, &attrs);
        let body = Enc::new().field_varint(1, MONSTER).field_msg(2, &container);
        notify_frame(METHOD_CONTAINER_DIRTY, &body.out)
    };

    let damage_burst = {
        let hits = [
            damage_event(LOCAL_PLAYER, 1_234, 1, 4),
            damage_event(LOCAL_PLAYER, 2_500, 0, 4),
            damage_event(LOCAL_PLAYER, 4_444, 5, 4),
        ];
        let body = near_delta_body(&[delta(MONSTER, &hits)]);
        notify_frame(METHOD_NEAR_DELTA, &body)
    };

    let retaliation = {
        let body = near_delta_body(&[delta(LOCAL_PLAYER, &[damage_event(MONSTER, 900, 0, 6)])]);
        notify_frame(METHOD_NEAR_DELTA, &body)
    };

    let compressed_container = {
        let inner = {
            let body = near_delta_body(&[delta(MONSTER, &[damage_event(LOCAL_PLAYER, 7_777, 1, 4)])]);
            notify_frame(METHOD_NEAR_DELTA, &body)
        };
        let packed = zstd::stream::encode_all(inner.as_slice(), 0).expect("zstd encode");
        frame(ECHO | COMPRESSED, &packed)
    };

    let to_me = {
        let body = Enc::new().field_msg(1, &delta(LOCAL_PLAYER, &[])).out;
        notify_frame(METHOD_TO_ME_DELTA, &body)
    };

    vec![
        near_entities,
        dirty_patch,
        to_me,
        damage_burst,
        retaliation,
        compressed_container,
    ]
}

// --- frame and schema encoding ---

struct Enc {
    out: Vec<u8>,
}

impl Enc {
    fn new() -> Self {
        Self { out: Vec::new() }
    }

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
        let mut enc = self
            .varint((u64::from(field) << 3) | 2)
            .varint(bytes.len() as u64);
        enc.out.extend_from_slice(bytes);
        enc
    }

    fn field_msg(self, field: u32, msg: &Enc) -> Self {
        self.field_bytes(field, &msg.out)
    }
}

fn attr_entry(id: u32, raw: &[u8]) -> Enc {
    Enc::new().field_varint(1, id.into()).field_bytes(2, raw)
}

fn attr_collection(entries: &[Enc]) -> Enc {
    let mut collection = Enc::new();
    for entry in entries {
        collection = collection.field_msg(1, entry);
    }
    collection
}

fn string_attr_blob(value: &str) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&(value.len() as u32).to_le_bytes());
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(value.as_bytes());
    blob.extend_from_slice(&[0u8; 4]);
    blob
}

fn damage_event(attacker: u64, value: u64, type_flag: u32, property: u32) -> Enc {
    Enc::new()
        .field_varint(1, 2201)
        .field_varint(2, attacker)
        .field_varint(4, value)
        .field_varint(6, type_flag.into())
        .field_varint(11, property.into())
}

fn delta(uuid: u64, events: &[Enc]) -> Enc {
    let mut list = Enc::new();
    for event in events {
        list = list.field_msg(1, event);
    }
    Enc::new().field_varint(1, uuid).field_msg(3, &list)
}

fn near_delta_body(deltas: &[Enc]) -> Vec<u8> {
    let mut body = Enc::new();
    for d in deltas {
        body = body.field_msg(1, d);
    }
    body.out
}

fn notify_frame(method_id: u32, schema_body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&COMBAT_SERVICE.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&method_id.to_be_bytes());
    payload.extend_from_slice(schema_body);
    frame(NOTIFY, &payload)
}

fn frame(type_and_flags: u16, body: &[u8]) -> Vec<u8> {
    let size = (6 + body.len()) as u32;
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(&type_and_flags.to_be_bytes());
    out.extend_from_slice(body);
    out
}

// --- packet and capture-file encoding ---

fn tcp_packet(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
        .ipv4([101, 35, 7, 9], [192, 168, 1, 20], 64)
        .tcp(16000, 52341, 1, 64_000);
    let mut packet = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut packet, payload).expect("packet build");
    packet
}

fn pcap_header() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65_535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // Ethernet
    out
}

fn record_header(index: u32, len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(1_700_000_000 + index).to_le_bytes());
    out.extend_from_slice(&(index * 1000).to_le_bytes());
    out.extend_from_slice(&(len as u32).to_le_bytes());
    out.extend_from_slice(&(len as u32).to_le_bytes());
    out
}
