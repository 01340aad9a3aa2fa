use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Engine config file (JSON). Unset fields keep their defaults.
    #[arg(short, long, env = "THERMO_TREND_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Fixed UTC offset for calendar logic, e.g. "+08:00". Defaults to the
    /// system time zone.
    #[arg(long, env = "THERMO_TREND_UTC_OFFSET", global = true, value_parser = parse_offset)]
    pub utc_offset: Option<FixedOffset>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Parser, Debug)]
pub enum Commands {
    /// Resample a reading file once and print the chart as JSON
    Resample(ResampleArgs),
    /// Keep a chart current from JSON-lines commands on stdin
    Watch(WatchArgs),
    /// Generate synthetic readings
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
pub struct ResampleArgs {
    /// JSON array of readings
    #[arg(short, long)]
    pub input: PathBuf,

    /// Time window in hours
    #[arg(short, long, default_value_t = 24)]
    pub window: u32,

    /// Render surface width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// End of the window (RFC 3339). Defaults to the newest reading.
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,

    /// Pretty-print the output
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// JSON array of readings, re-read whenever the window changes
    #[arg(short, long)]
    pub input: PathBuf,

    /// Initial time window in hours
    #[arg(short, long, default_value_t = 24)]
    pub window: u32,

    /// Initial render surface width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,
}

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Hours of readings to generate
    #[arg(long, default_value_t = 24)]
    pub hours: u32,

    /// Seconds between readings
    #[arg(long, default_value_t = 60)]
    pub interval_secs: u32,

    /// First timestamp, RFC 3339 or local ISO-8601. Defaults to `hours` ago.
    #[arg(long)]
    pub start: Option<String>,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file; stdout if omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    s.parse::<FixedOffset>()
        .map_err(|err| format!("invalid UTC offset {s:?}: {err}"))
}
