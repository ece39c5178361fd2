//! satring - always-full audio ring CLI

use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use satring::audio::RampSource;
use satring::config::{Args, Command, RingConfig};
use satring::stream::{check_ramp, StreamEngine};
use satring::ReadOutcome;

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RingConfig::load(path)?,
        None => RingConfig::load_default()?,
    };

    init_logging(&args, &config)?;

    match args.command.unwrap_or_default() {
        Command::Info => cmd_info(&config),
        Command::Run { seconds, window_ms } => cmd_run(config, seconds, window_ms),
        Command::SampleConfig { output } => cmd_sample_config(&config, output),
    }
}

fn init_logging(args: &Args, config: &RingConfig) -> Result<()> {
    let level = if args.verbose > 0 || args.quiet {
        args.log_level().to_string()
    } else {
        config.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(log_file) = &args.log {
        let file = std::fs::File::create(log_file)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Print the commented sample, or save the effective configuration
fn cmd_sample_config(config: &RingConfig, output: Option<String>) -> Result<()> {
    match output {
        Some(path) => {
            config.save(&path)?;
            println!("Configuration written to {}", path);
        }
        None => print!("{}", RingConfig::sample_config()),
    }
    Ok(())
}

/// Show ring geometry
fn cmd_info(config: &RingConfig) -> Result<()> {
    let format = config.format();
    let geometry = config.to_geometry()?;

    println!("Ring geometry:\n");
    println!("  Format:          {}", format);
    println!(
        "  Window:          {} frames ({:.1} ms)",
        geometry.user_capacity_frames(),
        geometry.user_capacity_frames() as f64 * 1000.0 / format.sample_rate as f64
    );
    println!("  Safety margin:   {} frames", geometry.safety_margin().frames());
    println!("  Total capacity:  {} frames", geometry.total_capacity_frames());
    println!("  Bytes per frame: {}", geometry.bytes_per_frame());
    println!("  Storage:         {} bytes", geometry.total_capacity_bytes());
    println!("  Snapshot size:   {} bytes", geometry.user_capacity_bytes());
    println!();

    Ok(())
}

/// Stream a ramp through the ring and check snapshots
fn cmd_run(mut config: RingConfig, seconds: u64, window_ms: Option<u32>) -> Result<()> {
    if let Some(ms) = window_ms {
        config.window_ms = ms;
        config.user_capacity_frames = 0;
    }
    let stream_config = config.to_stream_config()?;
    let format = stream_config.format.clone();

    println!("satring - {} ring, {}\n", format, stream_config.geometry);

    let mut engine = StreamEngine::new(stream_config);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping...");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    if let Err(e) = engine.start(Box::new(RampSource::new(format.clone()))) {
        error!("Failed to start engine: {}", e);
        if e.is_recoverable() {
            warn!("Try a shorter window (--window-ms) to reduce ring storage");
        }
        return Err(e.into());
    }
    let snapshots = engine
        .snapshots()
        .ok_or_else(|| anyhow::anyhow!("engine started without a snapshot channel"))?;

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let (mut not_full, mut contiguous, mut torn) = (0u64, 0u64, 0u64);

    while running.load(Ordering::SeqCst) && engine.is_running() && Instant::now() < deadline {
        let Ok(snapshot) = snapshots.recv_timeout(Duration::from_millis(100)) else {
            continue;
        };

        match snapshot.outcome {
            ReadOutcome::NotFull => {
                not_full += 1;
                println!("  #{:<5} not full yet", snapshot.sequence);
            }
            ReadOutcome::ReadSuccess => {
                let report = check_ramp(&snapshot.data, &format);
                if report.is_contiguous() {
                    contiguous += 1;
                    println!(
                        "  #{:<5} {} frames from #{}",
                        snapshot.sequence, report.frames, report.first_value
                    );
                } else {
                    torn += 1;
                    warn!(
                        "Snapshot {} torn: {} discontinuities, {} mismatched frames",
                        snapshot.sequence, report.discontinuities, report.mismatched_frames
                    );
                }
            }
        }
    }

    engine.stop()?;
    println!(
        "\nSnapshots: {} not full, {} contiguous, {} torn, {} dropped",
        not_full,
        contiguous,
        torn,
        engine.stats().snapshots_dropped.load(Ordering::Relaxed)
    );

    Ok(())
}
