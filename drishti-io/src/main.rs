//! DrishtiIO - Camera tracking daemon
//!
//! Listens for tracker datagrams, converts them into camera frames and either
//! publishes them over UDP or logs them.
//!
//! ```text
//! drishti-io [<config>] | --config/-c <path> [--port <port>]
//! ```

use drishti_io::config::AppConfig;
use drishti_io::driver::{FrameDriver, FrameSink, LogSink};
use drishti_io::error::{Error, Result};
use drishti_io::session::TrackingSession;
use drishti_io::streaming::spawn_publisher;
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default config file, relative to the working directory
const DEFAULT_CONFIG_PATH: &str = "drishti.toml";

/// Command line options
struct CliArgs {
    config_path: String,
    port: Option<u16>,
}

/// Parse command line arguments.
///
/// Supports:
/// - `drishti-io <path>` (positional)
/// - `drishti-io --config <path>` / `-c <path>` (flag-based)
/// - `--port <port>` overrides `[tracking] port`
///
/// Defaults to `drishti.toml` if no config is given.
fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = env::args().collect();

    let mut config_path = None;
    let mut port = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" if i + 1 < args.len() => {
                config_path = Some(args[i + 1].clone());
                i += 1;
            }
            "--port" | "-p" if i + 1 < args.len() => {
                let value = &args[i + 1];
                port = Some(value.parse::<u16>().map_err(|_| {
                    Error::InvalidParameter(format!("invalid port: {}", value))
                })?);
                i += 1;
            }
            arg if !arg.starts_with('-') && config_path.is_none() => {
                config_path = Some(arg.to_string());
            }
            arg => {
                return Err(Error::InvalidParameter(format!(
                    "unexpected argument: {}",
                    arg
                )));
            }
        }
        i += 1;
    }

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
        port,
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;

    // Config decides the log level, so it is loaded before the logger exists
    let mut config = AppConfig::load(&args.config_path)?;
    if let Some(port) = args.port {
        config.tracking.port = port;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("DrishtiIO v{} starting...", env!("CARGO_PKG_VERSION"));
    if Path::new(&args.config_path).exists() {
        log::info!("Using config: {}", args.config_path);
    } else {
        log::warn!("Config {} not found, using defaults", args.config_path);
    }

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // =========================================================================
    // Tracking input
    // =========================================================================
    let mut session = TrackingSession::new();
    session.start(config.tracking.port);
    if let Some(fault) = session.last_error() {
        return Err(Error::Other(fault.to_string()));
    }

    // =========================================================================
    // Output
    // =========================================================================
    let mut publisher_handle = None;
    let mut sink: Box<dyn FrameSink> = if config.publisher.enabled {
        let (sink, handle) = spawn_publisher(&config.publisher, Arc::clone(&running))?;
        publisher_handle = Some(handle);
        Box::new(sink)
    } else {
        log::info!("Publisher disabled, frames are logged at debug level");
        Box::new(LogSink)
    };

    log::info!(
        "Convention {:?}, scale {}, sensor {:?}, {}/{} fps",
        config.transform.convention,
        config.transform.scale,
        config.transform.sensor_source,
        config.tracking.frame_rate.numerator,
        config.tracking.frame_rate.denominator
    );
    log::info!("DrishtiIO running. Press Ctrl-C to stop.");

    let mut driver = FrameDriver::new(config.transform, config.tracking.frame_rate);
    driver.run(&session, sink.as_mut(), &running, &config.driver);

    // =========================================================================
    // Shutdown
    // =========================================================================
    session.stop();
    drop(sink);
    if let Some(handle) = publisher_handle {
        if handle.join().is_err() {
            log::error!("UDP publisher thread panicked");
        }
    }

    let stats = session.stats();
    log::info!(
        "Datagrams: {} accepted, {} malformed, {} unrecognized",
        stats.accepted,
        stats.malformed,
        stats.unrecognized
    );
    log::info!("DrishtiIO stopped");
    Ok(())
}
