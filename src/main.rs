use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, TimeDelta, TimeZone, Timelike, Utc};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thermo_trend::cli::{Args, Commands, ResampleArgs, SimulateArgs, WatchArgs};
use thermo_trend::config::EngineConfig;
use thermo_trend::engine::Engine;
use thermo_trend::events::{Command, Update};
use thermo_trend::monitor::Monitor;
use thermo_trend::reading::parse_timestamp;
use thermo_trend::simulate::Simulation;
use thermo_trend::store::{JsonFileStore, ReadingStore, SharedStore};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Logs go to stderr so that stdout stays machine-readable, or to a file when
/// one is given. The returned guard flushes the file writer on drop.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("not a file path: {}", path.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            Ok(None)
        }
    }
}

async fn resample_file<Tz>(args: ResampleArgs, config: EngineConfig, tz: Tz) -> Result<()>
where
    Tz: TimeZone + Send + Sync + 'static,
{
    let mut store = JsonFileStore::new(&args.input, tz.clone());
    if let Some(end) = args.end {
        store = store.ending_at(end);
    }
    let readings = store.readings(args.window).await?;

    let engine = Engine::new(config, tz);
    let bundle = engine.resample(&readings, args.window, args.width);

    let mut out = BufWriter::new(io::stdout().lock());
    if args.pretty {
        serde_json::to_writer_pretty(&mut out, &bundle)?;
    } else {
        serde_json::to_writer(&mut out, &bundle)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

async fn watch<Tz>(args: WatchArgs, config: EngineConfig, tz: Tz) -> Result<()>
where
    Tz: TimeZone + Send + Sync + 'static,
{
    let store: SharedStore = Arc::new(JsonFileStore::new(&args.input, tz.clone()));
    let engine = Engine::new(config, tz.clone());

    let (tx, rx) = mpsc::channel(1000);
    let (updates_tx, mut updates_rx) = mpsc::channel::<Update>(1000);

    let monitor = Monitor::new(engine, store, args.window, args.width, updates_tx);
    let monitor_handle = task::spawn(monitor.run(rx));

    let printer_handle = task::spawn(async move {
        let mut out = tokio::io::stdout();
        while let Some(update) = updates_rx.recv().await {
            let mut line = serde_json::to_vec(&update)?;
            line.push(b'\n');
            out.write_all(&line).await?;
            out.flush().await?;
        }
        Ok::<(), anyhow::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message = match serde_json::from_str::<Command>(line) {
            Ok(command) => command.into_message(&tz),
            Err(err) => Err(err.into()),
        };
        match message {
            Ok(message) => {
                if tx.send(message).await.is_err() {
                    tracing::warn!("monitor stopped, no longer reading input");
                    break;
                }
            }
            Err(err) => tracing::warn!(error = %err, line, "ignoring input line"),
        }
    }

    // closing the input ends the monitor, which in turn ends the printer
    drop(tx);
    let monitor = monitor_handle.await??;
    printer_handle.await??;
    tracing::debug!(
        width_px = monitor.width_px(),
        locale = monitor.locale(),
        points = monitor.current().map_or(0, |bundle| bundle.points.len()),
        "monitor stopped"
    );
    Ok(())
}

fn simulate<Tz: TimeZone>(args: SimulateArgs, tz: Tz) -> Result<()> {
    let start = match &args.start {
        Some(text) => parse_timestamp(text, &tz)?,
        None => {
            let now = Utc::now();
            let now = now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now);
            TimeDelta::try_hours(i64::from(args.hours))
                .and_then(|span| now.checked_sub_signed(span))
                .with_context(|| format!("--hours {} reaches before the supported date range", args.hours))?
        }
    };
    let simulation = Simulation {
        start,
        hours: args.hours,
        interval: TimeDelta::seconds(i64::from(args.interval_secs)),
        ..Default::default()
    };

    let readings = match args.seed {
        Some(seed) => simulation.generate(&mut StdRng::seed_from_u64(seed)),
        None => simulation.generate(&mut rand::rng()),
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut out, &readings)?;
            writeln!(out)?;
            out.flush()?;
        }
        None => {
            let mut out = BufWriter::new(io::stdout().lock());
            serde_json::to_writer_pretty(&mut out, &readings)?;
            writeln!(out)?;
            out.flush()?;
        }
    }

    tracing::info!(count = readings.len(), %start, "generated readings");
    Ok(())
}

async fn dispatch<Tz>(command: Commands, config: EngineConfig, tz: Tz) -> Result<()>
where
    Tz: TimeZone + Send + Sync + 'static,
{
    match command {
        Commands::Resample(args) => resample_file(args, config, tz).await,
        Commands::Watch(args) => watch(args, config, tz).await,
        Commands::Simulate(args) => simulate(args, tz),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(args.log_file.as_deref())?;

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match args.utc_offset {
        Some(offset) => dispatch(args.command, config, offset).await,
        None => dispatch(args.command, config, Local).await,
    }
}
