//! wiremeter command-line interface.
//!
//! Thin wrapper over `wiremeter-core`: lists capture devices, meters live
//! traffic, and replays recorded captures. Combat events stream to stdout
//! as JSON lines; counters reports and diagnostics go to stderr. A
//! non-zero exit code means the capture could not be opened or the input
//! could not be read.
//!
//! Typical usage:
//! - `wiremeter devices`
//! - `wiremeter live --device 1`
//! - `wiremeter replay session.pcap --report counters.json`

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glob::glob;
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use wiremeter_core::{
    CaptureConfig, CaptureSession, CombatRecord, EnemySnapshot, LocalPosition, Pipeline,
    PipelineCounters, ReplayFileSource, Sink, default_device_index, list_devices, run_source,
};

#[derive(Parser, Debug)]
#[command(name = "wiremeter")]
#[command(
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (commit ",
        env!("WIREMETER_BUILD_COMMIT"),
        ", built ",
        env!("WIREMETER_BUILD_DATE"),
        ")"
    )
)]
#[command(
    about = "Passive combat meter: reconstructs damage events from observed game traffic.",
    long_about = None,
    after_help = "Examples:\n  wiremeter devices\n  wiremeter live --device 1 --duration-s 60\n  wiremeter replay session.pcap --report counters.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List capture devices with their enumeration indices.
    Devices {
        /// Output the device list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Capture live traffic and stream combat events as JSON lines.
    Live {
        /// Device index from `wiremeter devices`; default picks the
        /// first non-loopback device with an IPv4 address
        #[arg(short, long)]
        device: Option<usize>,

        /// Pipeline configuration (JSON); flags override its fields
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many seconds (runs until killed when unset)
        #[arg(long)]
        duration_s: Option<u64>,

        /// Seconds between counters reports on stderr; 0 disables them
        #[arg(long, default_value_t = 10)]
        stats_interval_s: u64,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Replay a recorded capture file through the pipeline.
    Replay {
        /// Path to a .pcap or .pcapng file (glob patterns accepted)
        input: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the counters report to a file instead of stderr
        #[arg(short = 'o', long)]
        report: Option<PathBuf>,

        /// Pretty-print the counters report
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact report output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Devices { json } => cmd_devices(json),
        Commands::Live {
            device,
            config,
            duration_s,
            stats_interval_s,
            quiet,
        } => cmd_live(device, config, duration_s, stats_interval_s, quiet),
        Commands::Replay {
            input,
            config,
            report,
            pretty,
            compact,
            quiet,
        } => cmd_replay(input, config, report, pretty, compact, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_devices(json: bool) -> Result<(), CliError> {
    let devices = list_devices().map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("is the capture backend (libpcap/Npcap) installed?".to_string()),
        )
    })?;

    if json {
        let out = serde_json::to_string_pretty(&devices).context("device list serialization")?;
        println!("{}", out);
        return Ok(());
    }

    let default = default_device_index(&devices);
    for device in &devices {
        let marker = if default == Some(device.index) { "*" } else { " " };
        let description = device.description.as_deref().unwrap_or("-");
        let addresses = device
            .addresses
            .iter()
            .map(|addr| addr.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{marker} {index:>3}  {name}  {description}  [{addresses}]",
            index = device.index,
            name = device.name,
        );
    }
    Ok(())
}

fn cmd_live(
    device: Option<usize>,
    config_path: Option<PathBuf>,
    duration_s: Option<u64>,
    stats_interval_s: u64,
    quiet: bool,
) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    if device.is_some() {
        config.selected_device = device;
    }

    let mut session = CaptureSession::new(config, JsonlSink::new());
    session.start().map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("check the device index with `wiremeter devices`; capture usually needs elevated privileges".to_string()),
        )
    })?;
    if !quiet {
        eprintln!("OK: capture running");
    }

    let started = Instant::now();
    let mut last_stats = Instant::now();
    let stats_interval = Duration::from_secs(stats_interval_s);
    loop {
        thread::sleep(Duration::from_millis(250));
        if stats_interval_s > 0 && last_stats.elapsed() >= stats_interval {
            last_stats = Instant::now();
            if !quiet {
                report_counters(&session.counters());
            }
        }
        if let Some(limit) = duration_s {
            if started.elapsed() >= Duration::from_secs(limit) {
                break;
            }
        }
        if !session.is_running() {
            return Err(CliError::new(
                "capture worker stopped unexpectedly",
                Some("run with RUST_LOG=warn for the capture error".to_string()),
            ));
        }
    }

    session.stop();
    if !quiet {
        report_counters(&session.counters());
        eprintln!("OK: capture stopped");
    }
    Ok(())
}

fn cmd_replay(
    input: PathBuf,
    config_path: Option<PathBuf>,
    report: Option<PathBuf>,
    pretty: bool,
    compact: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let config = load_config(config_path)?;

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;

    let mut source = ReplayFileSource::open(&resolved_input)
        .map_err(|err| CliError::new(err.to_string(), None))?;
    let mut pipeline = Pipeline::new(config, JsonlSink::new());
    run_source(&mut source, &mut pipeline).map_err(|err| {
        CliError::new(
            format!("replay failed: {err}"),
            Some("check capture integrity".to_string()),
        )
    })?;

    let counters = pipeline.counters().clone();
    let report_doc = ReplayReport {
        tool: ToolInfo {
            name: "wiremeter",
            version: env!("CARGO_PKG_VERSION"),
        },
        generated_at: now_rfc3339(),
        input: InputInfo {
            path: resolved_input.display().to_string(),
            bytes: meta.len(),
        },
        counters,
    };
    let json = serialize_json(&report_doc, pretty, compact)?;

    match report {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            if !quiet {
                eprintln!("OK: report written -> {}", path.display());
            }
        }
        None => eprintln!("{}", json),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    tool: ToolInfo,
    generated_at: String,
    input: InputInfo,
    counters: PipelineCounters,
}

#[derive(Debug, Serialize)]
struct ToolInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct InputInfo {
    path: String,
    bytes: u64,
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn report_counters(counters: &PipelineCounters) {
    match serde_json::to_string(counters) {
        Ok(json) => eprintln!("stats: {json}"),
        Err(err) => eprintln!("stats unavailable: {err}"),
    }
}

fn serialize_json<T: Serialize>(
    value: &T,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn load_config(path: Option<PathBuf>) -> Result<CaptureConfig, CliError> {
    let Some(path) = path else {
        return Ok(CaptureConfig::default());
    };
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| {
        CliError::new(
            format!("invalid config {}: {err}", path.display()),
            Some("fields are optional; see CaptureConfig defaults".to_string()),
        )
    })
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        ));
    }
    if matches.len() > 1 {
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches)",
                pattern,
                matches.len()
            ),
            Some("pass a single capture file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}

/// Streams every sink call as one tagged JSON line on stdout.
struct JsonlSink {
    out: std::io::Stdout,
}

impl JsonlSink {
    fn new() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }

    fn emit(&mut self, value: serde_json::Value) {
        let mut lock = self.out.lock();
        // a closed stdout pipe drops the event
        let _ = writeln!(lock, "{value}");
    }
}

impl Sink for JsonlSink {
    fn set_name(&mut self, uid: u64, name: String) {
        self.emit(serde_json::json!({"event": "name", "uid": uid, "name": name}));
    }
    fn set_profession(&mut self, uid: u64, profession: &'static str) {
        self.emit(serde_json::json!({"event": "profession", "uid": uid, "profession": profession}));
    }
    fn set_fight_point(&mut self, uid: u64, value: u64) {
        self.emit(serde_json::json!({"event": "fight_point", "uid": uid, "value": value}));
    }
    fn set_level(&mut self, uid: u64, value: u32) {
        self.emit(serde_json::json!({"event": "level", "uid": uid, "value": value}));
    }
    fn set_rank_level(&mut self, uid: u64, value: u32) {
        self.emit(serde_json::json!({"event": "rank_level", "uid": uid, "value": value}));
    }
    fn set_enemy_name(&mut self, uid: u64, name: String) {
        self.emit(serde_json::json!({"event": "enemy_name", "uid": uid, "name": name}));
    }
    fn set_enemy_id(&mut self, uid: u64, id: u32) {
        self.emit(serde_json::json!({"event": "enemy_id", "uid": uid, "id": id}));
    }
    fn set_enemy_hp(&mut self, uid: u64, hp: u64) {
        self.emit(serde_json::json!({"event": "enemy_hp", "uid": uid, "hp": hp}));
    }
    fn set_enemy_max_hp(&mut self, uid: u64, max_hp: u64) {
        self.emit(serde_json::json!({"event": "enemy_max_hp", "uid": uid, "max_hp": max_hp}));
    }
    fn set_enemy_reduction_level(&mut self, uid: u64, value: u32) {
        self.emit(serde_json::json!({"event": "enemy_reduction_level", "uid": uid, "value": value}));
    }
    fn set_enemy_reduction_id(&mut self, uid: u64, value: u32) {
        self.emit(serde_json::json!({"event": "enemy_reduction_id", "uid": uid, "value": value}));
    }
    fn set_enemy_element(&mut self, uid: u64, element: &'static str) {
        self.emit(serde_json::json!({"event": "enemy_element", "uid": uid, "element": element}));
    }
    fn add_enemy(&mut self, uid: u64, snapshot: EnemySnapshot) {
        self.emit(serde_json::json!({"event": "enemy", "uid": uid, "enemy": snapshot}));
    }
    fn process_player_damage(&mut self, record: CombatRecord) {
        self.emit(serde_json::json!({"event": "player_damage", "record": record}));
    }
    fn process_damage_to_player(&mut self, record: CombatRecord) {
        self.emit(serde_json::json!({"event": "damage_to_player", "record": record}));
    }
    fn set_local_position(&mut self, position: LocalPosition) {
        self.emit(serde_json::json!({"event": "position", "position": position}));
    }
}
