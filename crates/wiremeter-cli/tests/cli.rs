use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, is_match};
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("wiremeter"))
}

/// Legacy PCAP wrapper around raw Ethernet frames.
fn legacy_pcap(packets: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65_535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for data in packets {
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    out
}

fn varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn field_varint(out: &mut Vec<u8>, field: u32, value: u64) {
    varint(out, u64::from(field) << 3);
    varint(out, value);
}

fn field_bytes(out: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    varint(out, (u64::from(field) << 3) | 2);
    varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

/// One notify frame carrying a single player-on-monster damage event.
fn damage_frame() -> Vec<u8> {
    let mut event = Vec::new();
    field_varint(&mut event, 1, 2201); // skill
    field_varint(&mut event, 2, (0x10 << 16) | 1); // player attacker
    field_varint(&mut event, 4, 1234); // value
    field_varint(&mut event, 6, 1); // crit flag
    field_varint(&mut event, 11, 4); // thunder

    let mut list = Vec::new();
    field_bytes(&mut list, 1, &event);
    let mut delta = Vec::new();
    field_varint(&mut delta, 1, (0xabcd << 16) | 2); // monster target
    field_bytes(&mut delta, 3, &list);
    let mut body = Vec::new();
    field_bytes(&mut body, 1, &delta);

    let mut payload = Vec::new();
    payload.extend_from_slice(&0x0000_0000_6333_5342u64.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&0x2du32.to_be_bytes());
    payload.extend_from_slice(&body);

    let size = (6 + payload.len()) as u32;
    let mut frame = Vec::new();
    frame.extend_from_slice(&size.to_be_bytes());
    frame.extend_from_slice(&0x0002u16.to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}

fn tcp_packet(payload: &[u8]) -> Vec<u8> {
    let builder = etherparse::PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
        .ipv4([101, 35, 7, 9], [192, 168, 1, 20], 64)
        .tcp(16000, 52341, 1, 64_000);
    let mut packet = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut packet, payload).expect("packet build");
    packet
}

fn sample_capture(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("session.pcap");
    let capture = legacy_pcap(&[tcp_packet(&damage_frame())]);
    std::fs::write(&path, capture).expect("write capture");
    path
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("devices").and(contains("live")).and(contains("replay")));
}

#[test]
fn version_includes_commit() {
    cmd().arg("--version").assert().success().stdout(
        contains("commit")
            .and(contains("built"))
            .and(is_match(r"commit\s+\w+").expect("regex")),
    );
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcap");

    cmd()
        .arg("replay")
        .arg(missing)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn invalid_extension_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.txt");
    std::fs::write(&input, "dummy").expect("write file");

    cmd()
        .arg("replay")
        .arg(input)
        .assert()
        .failure()
        .stderr(contains("error: unsupported input format").and(contains("hint: expected")));
}

#[test]
fn glob_no_match_errors() {
    let temp = TempDir::new().expect("tempdir");
    let pattern = temp.path().join("*.pcap");

    cmd()
        .arg("replay")
        .arg(pattern.to_string_lossy().to_string())
        .assert()
        .failure()
        .stderr(contains("error: no files match pattern").and(contains("hint:")));
}

#[test]
fn glob_multiple_matches_errors() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::write(temp.path().join("a.pcap"), []).expect("write file");
    std::fs::write(temp.path().join("b.pcap"), []).expect("write file");
    let pattern = temp.path().join("*.pcap");

    cmd()
        .arg("replay")
        .arg(pattern.to_string_lossy().to_string())
        .assert()
        .failure()
        .stderr(contains("error: multiple files match pattern").and(contains("hint:")));
}

#[test]
fn replay_streams_events_and_reports_counters() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);

    let assert = cmd().arg("replay").arg(&input).assert().success();
    let output = assert.get_output();

    let stdout = String::from_utf8(output.stdout.clone()).expect("utf8 stdout");
    let events: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid JSON line"))
        .collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "player_damage");
    assert_eq!(events[0]["record"]["value"], 1234);
    assert_eq!(events[0]["record"]["is_crit"], true);
    assert_eq!(events[0]["record"]["element"], "Thunder");

    let stderr = String::from_utf8(output.stderr.clone()).expect("utf8 stderr");
    let report_line = stderr
        .lines()
        .find(|line| line.starts_with('{'))
        .expect("report on stderr");
    let report: Value = serde_json::from_str(report_line).expect("valid report");
    assert_eq!(report["counters"]["packets"], 1);
    assert_eq!(report["counters"]["frames"], 1);
    assert_eq!(report["counters"]["events_emitted"], 1);
}

#[test]
fn replay_writes_report_file() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let report = temp.path().join("counters.json");

    cmd()
        .arg("replay")
        .arg(&input)
        .arg("--report")
        .arg(&report)
        .arg("--pretty")
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());

    let content = std::fs::read_to_string(&report).expect("read report");
    let json: Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(json["tool"]["name"], "wiremeter");
    assert!(json["counters"].get("resync_bytes").is_some());
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);

    cmd()
        .arg("replay")
        .arg(&input)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure();
}

#[test]
fn bad_config_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let config = temp.path().join("config.json");
    std::fs::write(&config, "{ not json").expect("write config");

    cmd()
        .arg("replay")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("error: invalid config").and(contains("hint:")));
}

#[test]
fn config_service_id_filter_applies() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let config = temp.path().join("config.json");
    std::fs::write(&config, r#"{"service_id": 1}"#).expect("write config");

    let assert = cmd()
        .arg("replay")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    assert!(stdout.trim().is_empty());
}
