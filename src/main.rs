//! IR Pulse CLI
//!
//! Real-time IR signal fluctuation analyzer for typing event detection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ir_pulse::{
    camera::SyntheticCamera,
    config::Config,
    core::Calibrator,
    core::FrameFeatureExtractor,
    session::{run_calibration, spawn_reporter, RecordingSession, SessionStats},
    storage::{JsonReportSink, SessionWriter},
    VERSION,
};

#[derive(Parser)]
#[command(name = "ir-pulse")]
#[command(version = VERSION)]
#[command(about = "Real-time IR signal fluctuation analyzer for typing event detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a session and detect typing events
    Record {
        /// Stop after this many frames (0 = run until Ctrl+C)
        #[arg(long, default_value = "0")]
        frames: u64,

        /// Frame width of the built-in synthetic source
        #[arg(long, default_value = "640")]
        width: u32,

        /// Frame height of the built-in synthetic source
        #[arg(long, default_value = "480")]
        height: u32,
    },

    /// Derive the detection threshold from an idle and an active phase
    Calibrate,

    /// Show configuration and cumulative statistics
    Status,

    /// Show configuration
    Config,
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Record {
            frames,
            width,
            height,
        } => cmd_record(frames, width, height),
        Commands::Calibrate => cmd_calibrate(),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn cmd_record(frames: u64, width: u32, height: u32) {
    println!("IR Pulse v{VERSION}");
    println!();

    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: could not create directories: {e}");
    }

    println!("Starting recording...");
    println!("  Window capacity: {} frames", config.window_capacity);
    println!("  Detection threshold: {}", config.detection_threshold);
    println!(
        "  Report interval: {}s (min {} samples)",
        config.report_interval.as_secs(),
        config.report_min_samples
    );
    println!("  Data directory: {:?}", config.data_path);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let stats = Arc::new(SessionStats::with_persistence(config.stats_path()));
    let mut session = RecordingSession::with_stats(&config, stats.clone());
    println!("Session ID: {}", session.session_id());

    // Ctrl+C clears the shared recording flag; the loop notices at the next
    // frame boundary.
    let running = session.running_flag();
    ctrlc_handler(running.clone());

    let reporter = spawn_reporter(
        session.skewness_log(),
        session.threshold_cell(),
        running.clone(),
        stats.clone(),
        config.report_interval,
        config.report_min_samples,
        Box::new(JsonReportSink::new(config.reports_path())),
    );

    let mut camera = SyntheticCamera::new(width, height);
    if frames > 0 {
        camera = camera.with_frame_limit(frames);
    }

    let writer = SessionWriter::new(&config.data_path);
    let result = session.run(&mut camera, &writer);

    running.store(false, Ordering::SeqCst);
    let _ = reporter.join();

    if let Err(e) = stats.save() {
        eprintln!("Warning: could not save session stats: {e}");
    }

    println!();
    match result {
        Ok(summary) => {
            println!(
                "Recording stopped: {} frames, {} events",
                summary.frames, summary.events
            );
            println!();
            println!("{}", stats.summary());
        }
        Err(e) => {
            eprintln!("Recording failed: {e}");
            eprintln!("Accumulated logs were flushed to {:?}", config.data_path);
            std::process::exit(1);
        }
    }
}

fn cmd_calibrate() {
    println!("IR Pulse v{VERSION} - threshold calibration");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: could not create directories: {e}");
    }

    println!(
        "Phase 1: keep your hands still for {} seconds.",
        config.baseline_duration.as_secs()
    );
    println!(
        "Phase 2: type normally for {} seconds.",
        config.active_duration.as_secs()
    );
    println!();

    let extractor = FrameFeatureExtractor::new(config.binarize_cutoff, config.blob_noise_floor);
    let mut calibrator = Calibrator::new(config.baseline_duration, config.active_duration);
    let mut camera = SyntheticCamera::new(640, 480);

    match run_calibration(&mut camera, &extractor, &mut calibrator) {
        Ok(profile) => {
            println!("Calibration complete:");
            println!("  Baseline skewness: {:.6}", profile.baseline_skewness);
            println!("  Active skewness:   {:.6}", profile.active_skewness);
            println!("  Derived threshold: {:.6}", profile.derived_threshold);

            let writer = SessionWriter::new(&config.data_path);
            match writer.write_calibration(&profile) {
                Ok(path) => println!("Artifact written to {path:?}"),
                Err(e) => eprintln!("Warning: could not write calibration artifact: {e}"),
            }

            config.detection_threshold = profile.derived_threshold;
            if let Err(e) = config.save() {
                eprintln!("Error saving config: {e}");
                std::process::exit(1);
            }

            let stats = SessionStats::with_persistence(config.stats_path());
            stats.record_calibration_applied();
            if let Err(e) = stats.save() {
                eprintln!("Warning: could not save session stats: {e}");
            }
        }
        Err(e) => {
            eprintln!("Calibration failed: {e}");
            eprintln!(
                "Detection threshold is unchanged ({}).",
                config.detection_threshold
            );
            std::process::exit(1);
        }
    }
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("IR Pulse Status");
    println!("===============");
    println!();
    println!("Configuration:");
    println!("  Window capacity: {} frames", config.window_capacity);
    println!("  Binarize cutoff: {}", config.binarize_cutoff);
    println!("  Blob noise floor: {} px", config.blob_noise_floor);
    println!("  Detection threshold: {}", config.detection_threshold);
    println!(
        "  Calibration phases: {}s idle / {}s active",
        config.baseline_duration.as_secs(),
        config.active_duration.as_secs()
    );
    println!();

    let stats_path = config.stats_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(frames) = stats.get("frames_processed") {
                    println!("  Frames processed: {frames}");
                }
                if let Some(windows) = stats.get("windows_analyzed") {
                    println!("  Windows analyzed: {windows}");
                }
                if let Some(events) = stats.get("events_detected") {
                    println!("  Events detected: {events}");
                }
                if let Some(reports) = stats.get("reports_published") {
                    println!("  Reports published: {reports}");
                }
                if let Some(calibrations) = stats.get("calibrations_applied") {
                    println!("  Calibrations applied: {calibrations}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
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

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
