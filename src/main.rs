//! # SH2 Bridge
//!
//! Stream orientation and motion readings from a BNO08x sensor hub.
//!
//! This application opens the configured link, identifies the hub, enables
//! the configured reports, and then keeps decoding frames, logging the
//! current orientation and writing telemetry records.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use sh2_bridge::config::{Config, LoggingConfig, TelemetryConfig};
use sh2_bridge::error::BridgeError;
use sh2_bridge::session::{Reader, Session};
use sh2_bridge::telemetry::TelemetryLogger;
use sh2_bridge::transport::{I2cTransport, StreamTransport, Transport, TransportKind};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "sh2-bridge.log";

/// Interval between orientation status messages
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Main entry point for SH2 Bridge application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Open the I2C or serial link to the sensor hub
///
/// 2. **Bring-up**
///    - Soft reset, then wait for the hub to settle
///    - Request the Product ID and wait for the response
///    - Enable every configured report
///
/// 3. **Main Loop**
///    - Decode one frame per cycle
///    - Log heading / pitch / roll once per second
///    - Write telemetry snapshots at the configured interval
///
/// 4. **Graceful Shutdown**
///    - Stop on Ctrl+C and close the link
///
/// # Errors
///
/// Returns error if:
/// - Configuration is missing or invalid
/// - The I2C bus or serial port cannot be opened
/// - The hub does not answer the Product ID request
///
/// # Examples
///
/// Run the application:
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO sh2_bridge: SH2 Bridge v0.1.0 starting...
/// INFO sh2_bridge::transport::i2c: Opened sensor hub link at /dev/i2c-1 (address 0x4a)
/// INFO sh2_bridge::session: Sensor hub identified: part 10004563 v3.2.7 build 16
/// INFO sh2_bridge: Heading 12.4° pitch -0.3° roll 1.1° (High)
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path(std::env::args());
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    // Initialize logging; the guard must outlive the runtime
    let _log_guard = init_logging(&config.logging)?;

    info!("SH2 Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Configuration loaded from {}", path.display());

    match config.transport.kind {
        TransportKind::I2c => {
            let transport = I2cTransport::open(&config.transport.bus, config.transport.address)?;
            drive(transport, &config).await
        }
        TransportKind::Serial => {
            let transport = StreamTransport::open_with_paths(
                &[config.transport.port.as_str()],
                config.transport.baud_rate,
                config.transport.cargo_read,
                config.transport.read_timeout(),
            )?;
            drive(transport, &config).await
        }
    }
}

/// Bring the hub up over `transport` and stream until Ctrl+C
async fn drive<T: Transport>(transport: T, config: &Config) -> Result<()> {
    let mut session = Session::with_options(transport, config.session.options());

    session.soft_reset().await?;
    sleep(config.session.reset_settle()).await;

    session
        .check_id()
        .await
        .context("Sensor hub did not identify itself")?;

    for feature in &config.features {
        session
            .enable_feature(feature.report, feature.interval_us)
            .await?;
    }

    info!("Streaming {} report(s)", config.features.len());
    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = run(&mut session, &config.telemetry) => result?,

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    session.close().await?;
    Ok(())
}

/// Resolve the configuration path from the command line
fn config_path<I: IntoIterator<Item = String>>(args: I) -> PathBuf {
    args.into_iter()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Install the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. When a directory
/// is configured, output goes to a daily-rolling file through a non-blocking
/// writer whose guard is returned.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid logging level: {}", config.level))?;

    match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

/// Decode frames until an unrecoverable error
///
/// Each frame is awaited to completion before anything else happens, so a
/// half-read frame is never abandoned.
async fn run<T: Transport>(session: &mut Session<T>, telemetry: &TelemetryConfig) -> Result<()> {
    let mut logger = if telemetry.enabled {
        Some(TelemetryLogger::new(telemetry)?)
    } else {
        None
    };
    let telemetry_interval = Duration::from_millis(telemetry.log_interval_ms);

    let mut last_status = Instant::now();
    let mut last_telemetry = Instant::now();
    let mut frames: u64 = 0;
    let mut dropped: u64 = 0;

    loop {
        match session.process_one().await {
            Ok(_) => frames += 1,
            Err(BridgeError::Transport(e)) if e.kind() == std::io::ErrorKind::TimedOut => {
                debug!("No frame within read timeout");
            }
            Err(e) if e.is_desync() => {
                dropped += 1;
                warn!("Dropped frame: {}", e);
                if let Err(e) = session.resync().await {
                    warn!("Resync failed: {}", e);
                }
            }
            Err(e) => {
                dropped += 1;
                warn!("Dropped frame: {}", e);
            }
        }

        if last_status.elapsed() >= STATUS_INTERVAL {
            log_orientation(session.readings());
            debug!("Frames decoded: {}, dropped: {}", frames, dropped);
            last_status = Instant::now();
        }

        if let Some(logger) = logger.as_mut() {
            if last_telemetry.elapsed() >= telemetry_interval {
                let snapshot = session.readings().snapshot();
                if let Err(e) = logger.log_snapshot(&snapshot) {
                    warn!("Failed to write telemetry: {}", e);
                }
                last_telemetry = Instant::now();
            }
        }
    }
}

/// Log the current orientation, preferring the rotation vector
fn log_orientation(reader: &Reader) {
    use sh2_bridge::sh2::report::ReportId;

    let orientation = reader
        .quaternion()
        .map(|q| (q, ReportId::RotationVector))
        .or_else(|| {
            reader
                .game_quaternion()
                .map(|q| (q, ReportId::GameRotationVector))
        });

    match orientation {
        Some((q, report)) => {
            let angles = q.to_euler();
            info!(
                "Heading {:.1}° pitch {:.1}° roll {:.1}° ({:?})",
                angles.heading(),
                angles.pitch,
                angles.roll,
                reader.accuracy(report)
            );
        }
        None => debug!("No orientation reading yet"),
    }

    if let Some(stability) = reader.stability() {
        debug!("Stability: {}", stability);
    }
}
