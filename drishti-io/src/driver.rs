//! Polling driver
//!
//! Pulls samples out of a [`TrackingSession`], runs the frame transform and
//! hands the results to a [`FrameSink`].
//!
//! Per step:
//!
//! 1. Nothing queued, session not running and a transport fault present:
//!    report the fault, the run loop backs off.
//! 2. Queued constants replace the cached ones (latest wins).
//! 3. Parameters queued when the step began become one frame each, in arrival
//!    order. Samples arriving before any constants are dropped.
//! 4. A static record precedes the first frame and any frame whose sensor
//!    size differs from the last one announced. A record the sink refused is
//!    offered again with the next frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{CameraFrameRecord, CameraStaticRecord, FrameRate, TrackingConstants};
use crate::error::{Result, TransportFault};
use crate::session::TrackingSession;
use crate::transform::{TransformConfig, frame_from_tracking};

/// Consumer of transformed records
pub trait FrameSink {
    /// Sensor size announcement
    fn on_static(&mut self, record: &CameraStaticRecord) -> Result<()>;

    /// One camera frame
    fn on_frame(&mut self, record: &CameraFrameRecord) -> Result<()>;
}

/// Sink that only logs, used when no publisher is configured
#[derive(Debug, Default)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn on_static(&mut self, record: &CameraStaticRecord) -> Result<()> {
        log::info!(
            "Sensor {:.3} x {:.3} mm",
            record.sensor_width,
            record.sensor_height
        );
        Ok(())
    }

    fn on_frame(&mut self, record: &CameraFrameRecord) -> Result<()> {
        log::debug!(
            "Frame {}: pos {:?} rot ({:.2}, {:.2}, {:.2}) focal {:.2}",
            record.scene_time.frame,
            record.position,
            record.rotation.yaw,
            record.rotation.pitch,
            record.rotation.roll,
            record.focal_length
        );
        Ok(())
    }
}

/// Driver loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Sleep between steps
    pub poll_interval_ms: u64,
    /// Sleep after a step that reported a transport fault
    pub error_backoff_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            error_backoff_ms: 1000,
        }
    }
}

/// What one step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing queued
    Idle,
    /// Nothing queued and the session is down with a fault
    Fault(TransportFault),
    /// Samples were consumed
    Processed {
        frames: usize,
        statics: usize,
        /// Parameters dropped while waiting for constants
        dropped: usize,
    },
}

/// Frame driver state between steps
pub struct FrameDriver {
    transform: TransformConfig,
    frame_rate: FrameRate,
    constants: Option<TrackingConstants>,
    /// Sensor size announced by the last static record
    last_sensor_size: Option<(f64, f64)>,
}

impl FrameDriver {
    pub fn new(transform: TransformConfig, frame_rate: FrameRate) -> Self {
        Self {
            transform,
            frame_rate,
            constants: None,
            last_sensor_size: None,
        }
    }

    /// Most recent constants, if any have arrived
    pub fn constants(&self) -> Option<&TrackingConstants> {
        self.constants.as_ref()
    }

    /// Drain the session once
    pub fn step<S: FrameSink + ?Sized>(
        &mut self,
        session: &TrackingSession,
        sink: &mut S,
    ) -> StepOutcome {
        let available = session.poll();
        if !available.any() {
            return match session.last_error() {
                // Faults outlive a restart; only a stopped session backs off
                Some(fault) if !session.is_running() => StepOutcome::Fault(fault),
                _ => StepOutcome::Idle,
            };
        }

        // Only samples queued at entry; later arrivals wait for the next step
        let (queued_parameters, queued_constants) = session.queued();

        for _ in 0..queued_constants {
            let Some(constants) = session.try_take_constants() else {
                break;
            };
            if self.constants.is_none() {
                log::info!(
                    "Tracking constants received: {}x{} px, chip {} x {} mm",
                    constants.image_width,
                    constants.image_height,
                    constants.chip_width,
                    constants.chip_height
                );
            }
            self.constants = Some(constants);
        }

        let mut frames = 0;
        let mut statics = 0;
        let mut dropped = 0;

        for _ in 0..queued_parameters {
            let Some(params) = session.try_take_parameters() else {
                break;
            };
            let Some(constants) = self.constants else {
                log::debug!(
                    "Dropping parameters (counter {}) until constants arrive",
                    params.counter
                );
                dropped += 1;
                continue;
            };

            let frame = frame_from_tracking(&params, &constants, self.frame_rate, &self.transform);

            let sensor_size = frame.sensor_size();
            if self.last_sensor_size != Some(sensor_size) {
                match sink.on_static(&CameraStaticRecord::from_frame(&frame)) {
                    Ok(()) => {
                        self.last_sensor_size = Some(sensor_size);
                        statics += 1;
                    }
                    Err(e) => log::warn!("Failed to deliver static record: {}", e),
                }
            }

            if let Err(e) = sink.on_frame(&frame) {
                log::warn!("Failed to deliver frame {}: {}", params.counter, e);
            }
            frames += 1;
        }

        StepOutcome::Processed {
            frames,
            statics,
            dropped,
        }
    }

    /// Step until `running` is cleared (blocking)
    pub fn run<S: FrameSink + ?Sized>(
        &mut self,
        session: &TrackingSession,
        sink: &mut S,
        running: &AtomicBool,
        config: &DriverConfig,
    ) {
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        let backoff = Duration::from_millis(config.error_backoff_ms);

        log::info!(
            "Frame driver started ({:.3} fps, {:?})",
            self.frame_rate.as_fps(),
            self.transform.convention
        );

        while running.load(Ordering::Relaxed) {
            match self.step(session, sink) {
                StepOutcome::Fault(fault) => {
                    log::warn!("{}", fault);
                    thread::sleep(backoff);
                }
                _ => thread::sleep(poll_interval),
            }
        }

        log::info!("Frame driver stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TrackingParameters;

    #[derive(Default)]
    struct RecordingSink {
        statics: Vec<CameraStaticRecord>,
        frames: Vec<CameraFrameRecord>,
    }

    impl FrameSink for RecordingSink {
        fn on_static(&mut self, record: &CameraStaticRecord) -> Result<()> {
            self.statics.push(*record);
            Ok(())
        }

        fn on_frame(&mut self, record: &CameraFrameRecord) -> Result<()> {
            self.frames.push(*record);
            Ok(())
        }
    }

    fn params(counter: u32) -> TrackingParameters {
        let mut params = TrackingParameters::default();
        params.counter = counter;
        params
    }

    fn chip(width: f64, height: f64) -> TrackingConstants {
        TrackingConstants {
            chip_width: width,
            chip_height: height,
            ..TrackingConstants::default()
        }
    }

    fn driver() -> FrameDriver {
        FrameDriver::new(TransformConfig::default(), FrameRate::new(25, 1))
    }

    #[test]
    fn test_idle_and_fault() {
        let mut session = TrackingSession::new();
        let mut sink = RecordingSink::default();
        let mut driver = driver();

        assert_eq!(driver.step(&session, &mut sink), StepOutcome::Idle);

        // Asking an idle session for its address records a fault
        assert!(session.local_addr().is_none());
        assert_eq!(
            driver.step(&session, &mut sink),
            StepOutcome::Fault(TransportFault::NoHandleOnPort(0))
        );
    }

    #[test]
    fn test_parameters_dropped_until_constants_arrive() {
        let session = TrackingSession::new();
        let mut sink = RecordingSink::default();
        let mut driver = driver();

        session.inject_parameters(params(1));
        assert_eq!(
            driver.step(&session, &mut sink),
            StepOutcome::Processed {
                frames: 0,
                statics: 0,
                dropped: 1
            }
        );
        assert!(sink.frames.is_empty());

        session.inject_constants(chip(9.6, 5.4));
        session.inject_parameters(params(2));
        assert_eq!(
            driver.step(&session, &mut sink),
            StepOutcome::Processed {
                frames: 1,
                statics: 1,
                dropped: 0
            }
        );
        assert_eq!(sink.frames[0].scene_time.frame, 2);
    }

    #[test]
    fn test_static_record_first_frame_and_on_change_only() {
        let session = TrackingSession::new();
        let mut sink = RecordingSink::default();
        let mut driver = driver();

        session.inject_constants(chip(9.6, 5.4));
        for counter in 0..3 {
            session.inject_parameters(params(counter));
        }
        driver.step(&session, &mut sink);
        assert_eq!(sink.frames.len(), 3);
        assert_eq!(sink.statics.len(), 1);
        assert_eq!(sink.statics[0].sensor_width, 9.6);
        assert!(sink.statics[0].focal_length_supported);
        assert!(sink.statics[0].focus_distance_supported);

        // Same size again: no new static record
        session.inject_constants(chip(9.6, 5.4));
        session.inject_parameters(params(3));
        driver.step(&session, &mut sink);
        assert_eq!(sink.statics.len(), 1);

        // Height change
        session.inject_constants(chip(9.6, 6.0));
        session.inject_parameters(params(4));
        driver.step(&session, &mut sink);
        assert_eq!(sink.statics.len(), 2);
        assert_eq!(sink.statics[1].sensor_height, 6.0);

        // Width change
        session.inject_constants(chip(12.0, 6.0));
        session.inject_parameters(params(5));
        driver.step(&session, &mut sink);
        assert_eq!(sink.statics.len(), 3);

        assert_eq!(sink.frames.len(), 6);
        let counters: Vec<u32> = sink.frames.iter().map(|f| f.scene_time.frame).collect();
        assert_eq!(counters, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_latest_constants_win() {
        let session = TrackingSession::new();
        let mut sink = RecordingSink::default();
        let mut driver = driver();

        session.inject_constants(chip(1.0, 1.0));
        session.inject_constants(chip(2.0, 2.0));
        session.inject_parameters(params(0));
        driver.step(&session, &mut sink);

        assert_eq!(driver.constants().map(|c| c.chip_width), Some(2.0));
        assert_eq!(sink.frames[0].sensor_size(), (2.0, 2.0));
        assert_eq!(sink.statics.len(), 1);
    }

    /// Refuses the first `failures` static records
    #[derive(Default)]
    struct FlakySink {
        failures: usize,
        inner: RecordingSink,
    }

    impl FrameSink for FlakySink {
        fn on_static(&mut self, record: &CameraStaticRecord) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(crate::error::Error::Other("channel full".to_string()));
            }
            self.inner.on_static(record)
        }

        fn on_frame(&mut self, record: &CameraFrameRecord) -> Result<()> {
            self.inner.on_frame(record)
        }
    }

    /// Queues another sample for every frame it receives
    struct RefillSink<'a> {
        session: &'a TrackingSession,
        frames: usize,
    }

    impl FrameSink for RefillSink<'_> {
        fn on_static(&mut self, _record: &CameraStaticRecord) -> Result<()> {
            Ok(())
        }

        fn on_frame(&mut self, record: &CameraFrameRecord) -> Result<()> {
            self.frames += 1;
            self.session
                .inject_parameters(params(record.scene_time.frame + 100));
            Ok(())
        }
    }

    #[test]
    fn test_refused_static_record_is_retried() {
        let session = TrackingSession::new();
        let mut sink = FlakySink {
            failures: 1,
            ..FlakySink::default()
        };
        let mut driver = driver();

        session.inject_constants(chip(9.6, 5.4));
        for counter in 0..5 {
            session.inject_parameters(params(counter));
        }

        assert_eq!(
            driver.step(&session, &mut sink),
            StepOutcome::Processed {
                frames: 5,
                statics: 1,
                dropped: 0
            }
        );
        assert_eq!(sink.inner.frames.len(), 5);
        assert_eq!(sink.inner.statics.len(), 1);
        assert_eq!(sink.inner.statics[0].sensor_height, 5.4);

        // Announced once it got through
        session.inject_parameters(params(5));
        driver.step(&session, &mut sink);
        assert_eq!(sink.inner.statics.len(), 1);
    }

    #[test]
    fn test_step_is_bounded_by_queue_at_entry() {
        let session = TrackingSession::new();
        let mut driver = driver();

        session.inject_constants(chip(9.6, 5.4));
        for counter in 0..3 {
            session.inject_parameters(params(counter));
        }

        let mut sink = RefillSink {
            session: &session,
            frames: 0,
        };
        assert_eq!(
            driver.step(&session, &mut sink),
            StepOutcome::Processed {
                frames: 3,
                statics: 1,
                dropped: 0
            }
        );
        assert_eq!(sink.frames, 3);
        assert_eq!(session.queued(), (3, 0));
    }

    #[test]
    fn test_fault_after_restart_does_not_back_off() {
        let blocker = std::net::UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = blocker.local_addr().unwrap().port();
        let mut sink = RecordingSink::default();
        let mut driver = driver();

        let mut session = TrackingSession::new();
        session.start(port);
        assert_eq!(
            driver.step(&session, &mut sink),
            StepOutcome::Fault(TransportFault::CannotCreateHandle(port))
        );

        drop(blocker);
        session.start(port);
        assert!(session.is_running());
        assert!(session.last_error().is_some());
        assert_eq!(driver.step(&session, &mut sink), StepOutcome::Idle);
    }

    #[test]
    fn test_run_exits_when_flag_cleared() {
        let session = TrackingSession::new();
        let mut sink = RecordingSink::default();
        let mut driver = driver();
        let running = AtomicBool::new(false);

        driver.run(&session, &mut sink, &running, &DriverConfig::default());
        assert!(sink.frames.is_empty());
    }
}
