//! The motion-to-publish controller.
//!
//! A single state machine drives both camera policies:
//!
//! ```text
//! Idle ──motion──▶ CheckDaylight ──dark──▶ Idle
//!                       │
//!                    daylight
//!                       ▼
//!                    Warming ──capture policy──────────────┐
//!                       │                                  │
//!                 session policy                           │
//!                       ▼                                  ▼
//!                    Confirm ──confirmed──▶ CaptureAndPublish ──▶ Cooldown ──▶ Idle
//!                       │
//!                    expired
//!                       ▼
//!                    Teardown ──▶ Idle
//! ```
//!
//! Daylight is evaluated once per motion event. Every wait goes through
//! [`Controller::pause`], which sleeps in slices of at most one second and
//! gives up as soon as the shared `running` flag clears, so a shutdown signal
//! is honoured promptly even during the post-publish cooldown.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::camera::{CaptureService, Confirmation};
use crate::common::constants::SLEEP_SLICE;
use crate::common::utils::format_duration;
use crate::config::{CameraPolicy, Config, NightMode};
use crate::geo::DaylightOracle;
use crate::logger::Log;
use crate::publish::Publisher;
use crate::sensor::MotionSensor;
use crate::time_source::Clock;
use crate::{log_debug, log_info};

#[cfg(test)]
mod tests;

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Polling for motion.
    Idle,
    /// Motion seen; deciding whether it is light enough.
    CheckDaylight,
    /// Opening the camera and waiting for it to settle.
    Warming,
    /// Camera ready; waiting for renewed motion.
    Confirm,
    CaptureAndPublish,
    /// Post-publish debounce.
    Cooldown,
    /// Releasing the camera after an unconfirmed event.
    Teardown,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "Idle",
            ControllerState::CheckDaylight => "CheckDaylight",
            ControllerState::Warming => "Warming",
            ControllerState::Confirm => "Confirm",
            ControllerState::CaptureAndPublish => "CaptureAndPublish",
            ControllerState::Cooldown => "Cooldown",
            ControllerState::Teardown => "Teardown",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delays used by the controller. The confirm window belongs to the
/// [`CaptureService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_interval: Duration,
    /// Warm-up before a capture-policy capture.
    pub preview_delay: Duration,
    /// Warm-up before the session-policy confirm window opens.
    pub focus_delay: Duration,
    /// Cooldown after each publish.
    pub motion_timeout: Duration,
}

impl Timing {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            preview_delay: config.preview_delay(),
            focus_delay: config.focus_delay(),
            motion_timeout: config.motion_timeout(),
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Everything the controller needs, bundled to keep `Controller::new` readable.
pub struct ControllerParams {
    pub oracle: DaylightOracle,
    pub sensor: Box<dyn MotionSensor>,
    pub camera: CaptureService,
    pub publisher: Box<dyn Publisher>,
    pub clock: Arc<dyn Clock>,
    pub running: Arc<AtomicBool>,
    pub timing: Timing,
    pub policy: CameraPolicy,
    pub night_mode: NightMode,
    pub log: Arc<dyn Log>,
}

pub struct Controller {
    oracle: DaylightOracle,
    sensor: Box<dyn MotionSensor>,
    camera: CaptureService,
    publisher: Box<dyn Publisher>,
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
    timing: Timing,
    policy: CameraPolicy,
    night_mode: NightMode,
    log: Arc<dyn Log>,
    state: ControllerState,
    publishes: usize,
}

impl Controller {
    pub fn new(params: ControllerParams) -> Self {
        Self {
            oracle: params.oracle,
            sensor: params.sensor,
            camera: params.camera,
            publisher: params.publisher,
            clock: params.clock,
            running: params.running,
            timing: params.timing,
            policy: params.policy,
            night_mode: params.night_mode,
            log: params.log,
            state: ControllerState::Idle,
            publishes: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn camera(&self) -> &CaptureService {
        &self.camera
    }

    /// Successful publishes so far.
    pub fn publish_count(&self) -> usize {
        self.publishes
    }

    /// Run until the `running` flag clears. The camera is closed on the way
    /// out, also when a step fails.
    pub fn run(&mut self) -> Result<()> {
        log_info!(
            self.log,
            "Watching for motion ({} camera policy).",
            self.policy.as_str()
        );

        let result = self.run_loop();
        let closed = self.camera.close();
        result.and(closed)
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.running.load(Ordering::SeqCst) {
            self.step()?;
        }
        Ok(())
    }

    /// Perform one transition.
    pub fn step(&mut self) -> Result<()> {
        let next = match self.state {
            ControllerState::Idle => self.idle()?,
            ControllerState::CheckDaylight => self.check_daylight(),
            ControllerState::Warming => self.warm_up()?,
            ControllerState::Confirm => self.confirm()?,
            ControllerState::CaptureAndPublish => self.capture_and_publish()?,
            ControllerState::Cooldown => {
                log_debug!(
                    self.log,
                    "Cooling down for {}.",
                    format_duration(self.timing.motion_timeout)
                );
                self.pause(self.timing.motion_timeout);
                ControllerState::Idle
            }
            ControllerState::Teardown => {
                self.camera.close()?;
                ControllerState::Idle
            }
        };

        if next != self.state {
            log_debug!(self.log, "State: {} -> {}", self.state, next);
        }
        self.state = next;
        Ok(())
    }

    fn idle(&mut self) -> Result<ControllerState> {
        if self.sensor.motion_present()? {
            log_info!(self.log, "Motion detected.");
            return Ok(ControllerState::CheckDaylight);
        }

        self.pause(self.timing.poll_interval);
        Ok(ControllerState::Idle)
    }

    fn check_daylight(&mut self) -> ControllerState {
        let now = self.clock.now();
        if self.oracle.is_daylight(now) {
            return ControllerState::Warming;
        }

        log_info!(self.log, "It is too dark to take a picture, skipping.");
        if self.night_mode == NightMode::Wait {
            let wait = self.oracle.duration_until_next_daylight(now);
            log_info!(self.log, "Waiting {} for daylight.", format_duration(wait));
            self.pause(wait);
        }
        ControllerState::Idle
    }

    fn warm_up(&mut self) -> Result<ControllerState> {
        self.camera.open()?;

        let delay = match self.policy {
            CameraPolicy::Capture => self.timing.preview_delay,
            CameraPolicy::Session => self.timing.focus_delay,
        };
        if !self.pause(delay) {
            return Ok(ControllerState::Teardown);
        }

        Ok(match self.policy {
            CameraPolicy::Capture => ControllerState::CaptureAndPublish,
            CameraPolicy::Session => {
                self.camera.arm(self.clock.now());
                ControllerState::Confirm
            }
        })
    }

    fn confirm(&mut self) -> Result<ControllerState> {
        let motion = self.sensor.motion_present()?;
        match self.camera.confirm_or_expire(motion, self.clock.now())? {
            Confirmation::Confirmed => {
                log_info!(self.log, "Motion confirmed.");
                Ok(ControllerState::CaptureAndPublish)
            }
            Confirmation::Pending => {
                if self.pause(self.timing.poll_interval) {
                    Ok(ControllerState::Confirm)
                } else {
                    Ok(ControllerState::Teardown)
                }
            }
            Confirmation::Expired => Ok(ControllerState::Teardown),
        }
    }

    fn capture_and_publish(&mut self) -> Result<ControllerState> {
        let outcome = match self.camera.capture() {
            Ok(path) => self.publisher.publish(&path),
            Err(e) => Err(e),
        };
        let closed = self.camera.close();

        outcome?;
        closed?;
        self.publishes += 1;
        Ok(ControllerState::Cooldown)
    }

    /// Sleep for `duration` in slices, stopping early on shutdown.
    ///
    /// Returns `false` if the wait was cut short.
    pub fn pause(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if !self.running.load(Ordering::SeqCst) {
                return false;
            }
            let slice = remaining.min(SLEEP_SLICE);
            self.clock.sleep(slice);
            remaining -= slice;
        }
        self.running.load(Ordering::SeqCst)
    }
}
