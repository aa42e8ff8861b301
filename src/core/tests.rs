use super::*;
use crate::camera::{CameraDevice, CameraSession, CameraSettings};
use crate::geo::Location;
use crate::logger::{Level, MemoryLog};
use crate::publish::MockPublisher;
use crate::sensor::MockMotionSensor;
use crate::time_source::SimulatedClock;
use chrono::{NaiveTime, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Default)]
struct DeviceLog {
    opens: usize,
    closes: usize,
}

struct FakeDevice(Arc<Mutex<DeviceLog>>);

struct FakeSession(Arc<Mutex<DeviceLog>>);

impl CameraDevice for FakeDevice {
    fn open(&mut self, _settings: &CameraSettings) -> Result<Box<dyn CameraSession>> {
        self.0.lock().unwrap().opens += 1;
        Ok(Box::new(FakeSession(Arc::clone(&self.0))))
    }
}

impl CameraSession for FakeSession {
    fn capture(&mut self) -> Result<PathBuf> {
        Ok(PathBuf::from("/tmp/twitter-photo.jpg"))
    }

    fn close(&mut self) -> Result<()> {
        self.0.lock().unwrap().closes += 1;
        Ok(())
    }
}

struct Harness {
    controller: Controller,
    device: Arc<Mutex<DeviceLog>>,
    memory: MemoryLog,
    clock: Arc<SimulatedClock>,
}

/// Controller at `hour`:00 Los Angeles time with a 06:00-20:00 window.
fn harness(hour: u32, sensor: MockMotionSensor, publisher: MockPublisher) -> Harness {
    let location = Location::new(
        "San Francisco",
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
        .with_ymd_and_hms(2024, 6, 15, hour, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    let clock = Arc::new(SimulatedClock::new(start));
    let memory = MemoryLog::new();
    let log: Arc<dyn Log> = Arc::new(memory.clone());
    let device = Arc::new(Mutex::new(DeviceLog::default()));

    let camera = CaptureService::new(
        Box::new(FakeDevice(Arc::clone(&device))),
        CameraSettings::default(),
        Duration::from_secs(60),
        Arc::clone(&log),
    );

    let controller = Controller::new(ControllerParams {
        oracle,
        sensor: Box::new(sensor),
        camera,
        publisher: Box::new(publisher),
        clock: clock.clone(),
        running: Arc::new(AtomicBool::new(true)),
        timing: Timing::default(),
        policy: CameraPolicy::Session,
        night_mode: NightMode::Skip,
        log,
    });

    Harness {
        controller,
        device,
        memory,
        clock,
    }
}

#[test]
fn test_dark_motion_never_touches_camera_or_publisher() {
    let mut sensor = MockMotionSensor::new();
    sensor.expect_motion_present().times(1).returning(|| Ok(true));
    let mut publisher = MockPublisher::new();
    publisher.expect_publish().never();

    let mut h = harness(2, sensor, publisher);
    h.controller.step().unwrap();
    assert_eq!(h.controller.state(), ControllerState::CheckDaylight);
    h.controller.step().unwrap();
    assert_eq!(h.controller.state(), ControllerState::Idle);

    assert_eq!(h.device.lock().unwrap().opens, 0);
    assert!(h.memory.contains(Level::Info, "too dark"));
}

#[test]
fn test_confirmed_motion_publishes_once() {
    let mut sensor = MockMotionSensor::new();
    sensor.expect_motion_present().times(2).returning(|| Ok(true));
    let mut publisher = MockPublisher::new();
    publisher
        .expect_publish()
        .withf(|path| path.ends_with("twitter-photo.jpg"))
        .times(1)
        .returning(|_| Ok(()));

    let mut h = harness(14, sensor, publisher);
    for _ in 0..6 {
        h.controller.step().unwrap();
    }

    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert_eq!(h.controller.publish_count(), 1);
    assert_eq!(h.clock.elapsed(), Duration::from_secs(3 + 60));
    let device = h.device.lock().unwrap();
    assert_eq!((device.opens, device.closes), (1, 1));
}

#[test]
fn test_publish_failure_still_releases_camera() {
    let mut sensor = MockMotionSensor::new();
    sensor.expect_motion_present().returning(|| Ok(true));
    let mut publisher = MockPublisher::new();
    publisher
        .expect_publish()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("HTTP 503")));

    let mut h = harness(14, sensor, publisher);
    for _ in 0..4 {
        h.controller.step().unwrap();
    }
    assert_eq!(h.controller.state(), ControllerState::CaptureAndPublish);

    let err = h.controller.step().unwrap_err();
    assert!(err.to_string().contains("HTTP 503"));
    assert!(!h.controller.camera().is_open());
    let device = h.device.lock().unwrap();
    assert_eq!((device.opens, device.closes), (1, 1));
}

#[test]
fn test_sensor_failure_in_run_closes_camera() {
    let mut sensor = MockMotionSensor::new();
    let mut calls = 0;
    sensor.expect_motion_present().returning(move || {
        calls += 1;
        if calls == 1 {
            Ok(true)
        } else {
            Err(anyhow::anyhow!("GPIO read failed"))
        }
    });
    let mut publisher = MockPublisher::new();
    publisher.expect_publish().never();

    let mut h = harness(14, sensor, publisher);
    let err = h.controller.run().unwrap_err();
    assert!(err.to_string().contains("GPIO read failed"));

    let device = h.device.lock().unwrap();
    assert_eq!((device.opens, device.closes), (1, 1));
}

#[test]
fn test_pause_stops_on_shutdown() {
    let sensor = MockMotionSensor::new();
    let publisher = MockPublisher::new();
    let h = harness(14, sensor, publisher);

    assert!(h.controller.pause(Duration::from_millis(2500)));
    assert_eq!(h.clock.elapsed(), Duration::from_millis(2500));

    h.controller.running.store(false, Ordering::SeqCst);
    assert!(!h.controller.pause(Duration::from_secs(60)));
    assert_eq!(h.clock.elapsed(), Duration::from_millis(2500));
}

#[test]
fn test_state_names() {
    assert_eq!(ControllerState::CaptureAndPublish.to_string(), "CaptureAndPublish");
    assert_eq!(ControllerState::Idle.as_str(), "Idle");
}
