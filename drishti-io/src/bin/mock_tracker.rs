//! Mock tracker for hardware-free testing
//!
//! Streams a synthetic camera move (slow orbit with a pan sweep and a focus
//! pull) in any of the tracker wire formats.
//!
//! ```text
//! mock-tracker <target> [--format legacy|binary|ascii] [--rate <hz>]
//! ```
//!
//! | Format | Parameters | Constants |
//! |--------|------------|-----------|
//! | legacy | 124-byte datagram, Euler | chip size inside every datagram |
//! | binary | `DMC01 PB` struct, matrix pose | `DMC01 CB` once per second |
//! | ascii  | `DMC01 PA` tokens, Euler pose | `DMC01 CA` once per second |

use drishti_io::core::math::rotation_matrix;
use drishti_io::core::{
    EulerPose, FormatFlags, Pose, Rotation, TrackingConstants, TrackingParameters,
};
use drishti_io::error::{Error, Result};
use drishti_io::protocol::{
    encode_constants_ascii, encode_constants_binary, encode_legacy, encode_parameters_ascii,
    encode_parameters_binary,
};
use std::env;
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Legacy,
    Binary,
    Ascii,
}

struct Args {
    target: String,
    format: Format,
    rate: f64,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = env::args().collect();

    let mut target = None;
    let mut format = Format::Legacy;
    let mut rate = 25.0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--format" | "-f" if i + 1 < args.len() => {
                format = match args[i + 1].as_str() {
                    "legacy" => Format::Legacy,
                    "binary" => Format::Binary,
                    "ascii" => Format::Ascii,
                    other => {
                        return Err(Error::InvalidParameter(format!("unknown format: {}", other)));
                    }
                };
                i += 1;
            }
            "--rate" | "-r" if i + 1 < args.len() => {
                rate = args[i + 1]
                    .parse::<f64>()
                    .ok()
                    .filter(|r| *r > 0.0 && r.is_finite())
                    .ok_or_else(|| {
                        Error::InvalidParameter(format!("invalid rate: {}", args[i + 1]))
                    })?;
                i += 1;
            }
            arg if !arg.starts_with('-') && target.is_none() => {
                target = Some(arg.to_string());
            }
            arg => {
                return Err(Error::InvalidParameter(format!("unexpected argument: {}", arg)));
            }
        }
        i += 1;
    }

    let target = target.ok_or_else(|| {
        Error::InvalidParameter(
            "usage: mock-tracker <target> [--format legacy|binary|ascii] [--rate <hz>]"
                .to_string(),
        )
    })?;

    Ok(Args {
        target,
        format,
        rate,
    })
}

fn constants() -> TrackingConstants {
    TrackingConstants {
        id: 1,
        chip_width: 23.76,
        chip_height: 13.365,
        fake_chip_width: 23.76,
        fake_chip_height: 13.365,
        ..TrackingConstants::default()
    }
}

/// Synthetic camera move at `counter`
fn sample(counter: u32, rate: f64, format: Format) -> TrackingParameters {
    let t = counter as f64 / rate;
    let angle = 0.2 * t;

    let euler = EulerPose {
        x: 3.0 * angle.cos(),
        y: 3.0 * angle.sin(),
        z: 1.6 + 0.1 * (0.5 * t).sin(),
        pan: (angle.to_degrees() + 180.0) % 360.0 - 180.0,
        tilt: -5.0 + 3.0 * (0.3 * t).sin(),
        roll: 0.5 * (0.7 * t).sin(),
    };

    let pose = match format {
        Format::Binary => {
            let mut m = rotation_matrix(Rotation {
                yaw: euler.pan,
                pitch: euler.tilt,
                roll: euler.roll,
            });
            m[3] = [euler.x, euler.y, euler.z, 1.0];
            Pose::Matrix(m)
        }
        Format::Legacy | Format::Ascii => Pose::Euler(euler),
    };

    let mut params = TrackingParameters::new(
        FormatFlags::FIELD_OF_VIEW | FormatFlags::VERTICAL,
        pose,
    );
    params.id = 1;
    params.fov = 30.0 + 10.0 * (0.1 * t).sin();
    params.k1 = 0.002;
    params.focus_distance = 2.5 + (0.25 * t).sin();
    params.aperture = 2.8;
    params.counter = counter;
    params
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(&args.target)?;
    log::info!(
        "Mock tracker sending {:?} at {} Hz to {}",
        args.format,
        args.rate,
        args.target
    );

    let constants = constants();
    let period = Duration::from_secs_f64(1.0 / args.rate);
    let constants_every = args.rate.round().max(1.0) as u32;
    let start = Instant::now();
    let mut counter: u32 = 0;

    while running.load(Ordering::Relaxed) {
        let params = sample(counter, args.rate, args.format);

        let mut datagrams = Vec::with_capacity(2);
        if counter % constants_every == 0 {
            match args.format {
                Format::Binary => datagrams.push(encode_constants_binary(&constants)),
                Format::Ascii => datagrams.push(encode_constants_ascii(&constants)),
                Format::Legacy => {}
            }
        }
        datagrams.push(match args.format {
            Format::Legacy => encode_legacy(&params, &constants),
            Format::Binary => encode_parameters_binary(&params),
            Format::Ascii => encode_parameters_ascii(&params),
        });

        for datagram in &datagrams {
            if let Err(e) = socket.send(datagram) {
                // Connection refused just means nobody is listening yet
                log::debug!("Send failed: {}", e);
            }
        }

        if counter % (constants_every * 10) == 0 {
            log::info!("Sent frame {}", counter);
        }
        counter = counter.wrapping_add(1);

        // Schedule against the start time so the rate does not drift
        let next = start + period.mul_f64(counter as f64);
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    log::info!("Mock tracker stopped after {} frames", counter);
    Ok(())
}
