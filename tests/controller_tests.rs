//! End-to-end controller scenarios on a simulated clock.
//!
//! The sensor is scripted against the clock's elapsed time, the camera counts
//! opens and closes, and the publisher records what it was asked to post.

use anyhow::Result;
use birdorsquirrel::camera::{CameraDevice, CameraSession, CameraSettings, CaptureService};
use birdorsquirrel::config::{CameraPolicy, NightMode};
use birdorsquirrel::core::{Controller, ControllerParams, ControllerState, Timing};
use birdorsquirrel::error::{ConfigError, find_config_error};
use birdorsquirrel::geo::{DaylightOracle, Location};
use birdorsquirrel::logger::{Level, Log, MemoryLog};
use birdorsquirrel::publish::{Credentials, Publisher};
use birdorsquirrel::sensor::MotionSensor;
use birdorsquirrel::time_source::SimulatedClock;
use chrono::{NaiveTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedSensor {
    clock: Arc<SimulatedClock>,
    motion_at: Box<dyn Fn(Duration) -> bool>,
}

impl MotionSensor for ScriptedSensor {
    fn motion_present(&mut self) -> Result<bool> {
        Ok((self.motion_at)(self.clock.elapsed()))
    }
}

#[derive(Default)]
struct CameraLog {
    opens: usize,
    closes: usize,
    captures: usize,
}

struct CountingCamera(Arc<Mutex<CameraLog>>);

struct CountingSession(Arc<Mutex<CameraLog>>);

impl CameraDevice for CountingCamera {
    fn open(&mut self, _settings: &CameraSettings) -> Result<Box<dyn CameraSession>> {
        self.0.lock().unwrap().opens += 1;
        Ok(Box::new(CountingSession(Arc::clone(&self.0))))
    }
}

impl CameraSession for CountingSession {
    fn capture(&mut self) -> Result<PathBuf> {
        self.0.lock().unwrap().captures += 1;
        Ok(PathBuf::from("/tmp/twitter-photo.jpg"))
    }

    fn close(&mut self) -> Result<()> {
        self.0.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Records every post; optionally requests shutdown afterwards.
struct RecordingPublisher {
    posted: Arc<Mutex<Vec<PathBuf>>>,
    stop_after: Option<Arc<AtomicBool>>,
}

impl Publisher for RecordingPublisher {
    fn publish(&self, image: &Path) -> Result<()> {
        self.posted.lock().unwrap().push(image.to_path_buf());
        if let Some(running) = &self.stop_after {
            running.store(false, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct Scenario {
    hour: u32,
    policy: CameraPolicy,
    night_mode: NightMode,
    stop_after_publish: bool,
    motion_at: Box<dyn Fn(Duration) -> bool>,
}

impl Scenario {
    fn at(hour: u32) -> Self {
        Self {
            hour,
            policy: CameraPolicy::Session,
            night_mode: NightMode::Skip,
            stop_after_publish: false,
            motion_at: Box::new(|_| true),
        }
    }

    fn motion(mut self, motion_at: impl Fn(Duration) -> bool + 'static) -> Self {
        self.motion_at = Box::new(motion_at);
        self
    }

    fn build(self) -> Rig {
        let location = Location::new(
            "San Francisco, United States",
            37.7749,
            -122.4194,
            chrono_tz::America::Los_Angeles,
        )
        .unwrap();
        let oracle = DaylightOracle::manual(
            location,
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        );

        let start = chrono_tz::America::Los_Angeles
            .with_ymd_and_hms(2024, 6, 15, self.hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let clock = Arc::new(SimulatedClock::new(start));
        let running = Arc::new(AtomicBool::new(true));
        let memory = MemoryLog::new();
        let log: Arc<dyn Log> = Arc::new(memory.clone());
        let camera_log = Arc::new(Mutex::new(CameraLog::default()));
        let posted = Arc::new(Mutex::new(Vec::new()));

        let controller = Controller::new(ControllerParams {
            oracle,
            sensor: Box::new(ScriptedSensor {
                clock: Arc::clone(&clock),
                motion_at: self.motion_at,
            }),
            camera: CaptureService::new(
                Box::new(CountingCamera(Arc::clone(&camera_log))),
                CameraSettings::default(),
                Duration::from_secs(60),
                Arc::clone(&log),
            ),
            publisher: Box::new(RecordingPublisher {
                posted: Arc::clone(&posted),
                stop_after: self.stop_after_publish.then(|| Arc::clone(&running)),
            }),
            clock: clock.clone(),
            running: Arc::clone(&running),
            timing: Timing::default(),
            policy: self.policy,
            night_mode: self.night_mode,
            log,
        });

        Rig {
            controller,
            clock,
            memory,
            camera_log,
            posted,
        }
    }
}

struct Rig {
    controller: Controller,
    clock: Arc<SimulatedClock>,
    memory: MemoryLog,
    camera_log: Arc<Mutex<CameraLog>>,
    posted: Arc<Mutex<Vec<PathBuf>>>,
}

impl Rig {
    /// Step until `state` is reached after at least one step, or panic.
    fn step_until(&mut self, state: ControllerState, max_steps: usize) -> usize {
        for taken in 1..=max_steps {
            self.controller.step().unwrap();
            if self.controller.state() == state {
                return taken;
            }
        }
        panic!("controller never reached {state} within {max_steps} steps");
    }

    fn opens_and_closes(&self) -> (usize, usize) {
        let log = self.camera_log.lock().unwrap();
        (log.opens, log.closes)
    }

    fn posts(&self) -> usize {
        self.posted.lock().unwrap().len()
    }
}

#[test]
fn test_afternoon_motion_publishes_once_then_cools_down() {
    let mut rig = Scenario::at(14)
        .motion(|t| t < Duration::from_secs(10))
        .build();

    rig.step_until(ControllerState::Cooldown, 10);
    assert_eq!(rig.posts(), 1);
    assert_eq!(rig.clock.elapsed(), Duration::from_secs(3));

    rig.step_until(ControllerState::Idle, 1);
    assert_eq!(rig.clock.elapsed(), Duration::from_secs(63));

    // Quiet sensor afterwards: nothing more happens
    for _ in 0..100 {
        rig.controller.step().unwrap();
    }
    assert_eq!(rig.posts(), 1);
    assert_eq!(rig.controller.publish_count(), 1);
    assert_eq!(rig.opens_and_closes(), (1, 1));
    assert_eq!(rig.camera_log.lock().unwrap().captures, 1);
    assert_eq!(
        rig.posted.lock().unwrap()[0],
        PathBuf::from("/tmp/twitter-photo.jpg")
    );
    assert!(rig.memory.contains(Level::Info, "Picture taken."));
}

#[test]
fn test_night_motion_skips_camera_and_publisher() {
    let mut rig = Scenario::at(2).build();

    rig.step_until(ControllerState::CheckDaylight, 1);
    rig.step_until(ControllerState::Idle, 1);

    assert_eq!(rig.opens_and_closes(), (0, 0));
    assert_eq!(rig.posts(), 0);
    assert_eq!(rig.clock.elapsed(), Duration::ZERO);
    assert!(rig.memory.contains(Level::Info, "too dark"));
}

#[test]
fn test_unconfirmed_motion_tears_down_without_publishing() {
    let mut rig = Scenario::at(14)
        .motion(|t| t < Duration::from_millis(1))
        .build();

    rig.step_until(ControllerState::Confirm, 5);
    assert_eq!(rig.clock.elapsed(), Duration::from_secs(3));

    rig.step_until(ControllerState::Teardown, 2_000);
    assert!(rig.clock.elapsed() >= Duration::from_secs(63));
    assert!(!rig.controller.camera().is_open());

    rig.step_until(ControllerState::Idle, 1);
    assert_eq!(rig.posts(), 0);
    assert_eq!(rig.opens_and_closes(), (1, 1));
    assert!(rig.memory.contains(Level::Info, "No motion confirmed"));
}

#[test]
fn test_capture_policy_skips_confirmation() {
    let mut scenario = Scenario::at(9).motion(|t| t.is_zero());
    scenario.policy = CameraPolicy::Capture;
    let mut rig = scenario.build();

    let steps = rig.step_until(ControllerState::CaptureAndPublish, 5);
    assert_eq!(steps, 3);
    assert_eq!(rig.clock.elapsed(), Duration::from_secs(5));

    rig.step_until(ControllerState::Idle, 2);
    assert_eq!(rig.posts(), 1);
    assert_eq!(rig.clock.elapsed(), Duration::from_secs(65));
    assert_eq!(rig.opens_and_closes(), (1, 1));
}

#[test]
fn test_wait_night_mode_sleeps_until_dawn() {
    let mut scenario = Scenario::at(21).motion(|t| t.is_zero());
    scenario.night_mode = NightMode::Wait;
    let mut rig = scenario.build();

    rig.step_until(ControllerState::CheckDaylight, 1);
    rig.step_until(ControllerState::Idle, 1);

    assert_eq!(rig.clock.elapsed(), Duration::from_secs(9 * 3600));
    assert_eq!(rig.opens_and_closes(), (0, 0));
    assert!(rig.memory.contains(Level::Info, "Waiting"));
}

#[test]
fn test_run_stops_on_shutdown_and_releases_camera() {
    let mut scenario = Scenario::at(14);
    scenario.stop_after_publish = true;
    let mut rig = scenario.build();

    rig.controller.run().unwrap();

    assert_eq!(rig.posts(), 1);
    assert_eq!(rig.opens_and_closes(), (1, 1));
    assert!(!rig.controller.camera().is_open());
    // Cooldown was cut short by the shutdown request
    assert!(rig.clock.elapsed() < Duration::from_secs(63));
}

#[test]
fn test_every_open_is_matched_by_a_close() {
    // Every ten minutes: one confirmed visit, then one that never returns
    let mut rig = Scenario::at(13)
        .motion(|t| matches!(t.as_secs() % 600, 0..=1 | 10..=11 | 300..=301))
        .build();

    for _ in 0..200_000 {
        rig.controller.step().unwrap();
        let (opens, closes) = rig.opens_and_closes();
        let open_now = usize::from(rig.controller.camera().is_open());
        assert_eq!(opens, closes + open_now);
        if rig.clock.elapsed() >= Duration::from_secs(3500) {
            break;
        }
    }

    assert_eq!(rig.posts(), 6);
    assert_eq!(rig.opens_and_closes().0, 12);
    assert_eq!(rig.controller.camera().open_count(), 12);
}

#[test]
fn test_missing_credential_is_a_configuration_error() {
    let env = |key: &str| match key {
        "TWITTER_CONSUMER_KEY" => Some("ck".to_string()),
        "TWITTER_CONSUMER_SECRET" => Some("cs".to_string()),
        "TWITTER_ACCESS_TOKEN" => Some("   ".to_string()),
        _ => None,
    };

    let err = Credentials::resolve(env, None).unwrap_err();
    assert_eq!(err, ConfigError::MissingCredential("TWITTER_ACCESS_TOKEN"));

    let wrapped = anyhow::Error::new(err).context("Startup failed");
    assert!(matches!(
        find_config_error(&wrapped),
        Some(ConfigError::MissingCredential(_))
    ));
}
