//! sensorlog CLI
//!
//! Records sensor sample streams to per-sensor CSV files.

use clap::{Parser, Subcommand};
use sensorlog::{
    config::Config,
    hub::{synthetic::DEFAULT_RATE_HZ, SensorHub, SyntheticHub},
    Recorder, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "sensorlog")]
#[command(version = VERSION)]
#[command(about = "Capture sensor sample streams to CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a capture session
    Start {
        /// Sources to capture, comma-separated (see `sensorlog sources`)
        #[arg(long)]
        sources: Option<String>,

        /// Output directory (defaults to the configured capture directory)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Synthetic sample rate per source, in Hz
        #[arg(long, default_value_t = DEFAULT_RATE_HZ)]
        rate: u32,

        /// Stop automatically after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// List available sources
    Sources,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            sources,
            output,
            rate,
            duration,
        } => cmd_start(sources, output, rate, duration),
        Commands::Sources => cmd_sources(),
        Commands::Config => cmd_config(),
    }
}

fn cmd_start(sources: Option<String>, output: Option<PathBuf>, rate: u32, duration: Option<u64>) {
    let config = Config::load().unwrap_or_default();

    let keys = match sources {
        Some(s) => Config::parse_sources(&s),
        None => config.sources.clone(),
    };
    if keys.is_empty() {
        eprintln!("Error: at least one source must be requested");
        std::process::exit(1);
    }

    let output_dir = match output {
        Some(dir) => dir,
        None => {
            if let Err(e) = config.ensure_directories() {
                eprintln!("Warning: Could not create capture directory: {e}");
            }
            config.output_dir.clone()
        }
    };

    println!("sensorlog v{VERSION}");
    println!("  Sources: {}", keys.join(", "));
    println!("  Output:  {}", output_dir.display());
    println!("  Rate:    {rate} Hz");
    println!();

    let hub = Arc::new(SyntheticHub::new(rate));
    let recorder = Recorder::new(hub, output_dir);

    if let Err(e) = recorder.start(&keys) {
        eprintln!("Error starting capture: {e}");
        std::process::exit(1);
    }

    if let Some(id) = recorder.session_id() {
        println!("  Session: {id}");
    }
    for (source, path) in recorder.active_sources() {
        println!("  {} -> {}", source.key, path.display());
    }
    println!();
    println!("Press Ctrl+C to stop");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let started = Instant::now();
    while running.load(Ordering::SeqCst) {
        if let Some(secs) = duration {
            if started.elapsed() >= Duration::from_secs(secs) {
                break;
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping capture...");
    recorder.stop();
    println!("Done.");
}

fn cmd_sources() {
    let hub = SyntheticHub::default();

    println!("Available sources:");
    for source in hub.catalog() {
        println!(
            "  {:<10} type {:>2}  {} value(s)  ({})",
            source.key, source.type_code, source.arity, source.name
        );
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
