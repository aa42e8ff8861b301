//! The capture service: one stateful owner of the camera session.
//!
//! Both lifecycle policies go through the same operations. The capture policy
//! uses `open` → `capture` → `close`. The session policy adds `arm` and
//! `confirm_or_expire` between opening and capturing, and the service closes
//! the session itself when the confirm window runs out.
//!
//! Every successful `open` is matched by exactly one `close`, whether it comes
//! from the caller, from expiry, or from `Drop`.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::{CameraDevice, CameraSession, CameraSettings};
use crate::logger::Log;
use crate::{log_debug, log_info, log_warning};

/// Outcome of checking for renewed motion while the session is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Motion seen again: capture now.
    Confirmed,
    /// No motion yet, window still open.
    Pending,
    /// Window elapsed without motion; the camera has been closed.
    Expired,
}

pub struct CaptureService {
    device: Box<dyn CameraDevice>,
    settings: CameraSettings,
    confirm_window: Duration,
    session: Option<Box<dyn CameraSession>>,
    deadline: Option<DateTime<Utc>>,
    opens: usize,
    closes: usize,
    log: Arc<dyn Log>,
}

impl CaptureService {
    pub fn new(
        device: Box<dyn CameraDevice>,
        settings: CameraSettings,
        confirm_window: Duration,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            device,
            settings,
            confirm_window,
            session: None,
            deadline: None,
            opens: 0,
            closes: 0,
            log,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Open a session unless one is already open.
    pub fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let session = self
            .device
            .open(&self.settings)
            .context("Failed to open camera")?;
        self.session = Some(session);
        self.opens += 1;
        log_debug!(self.log, "Camera opened.");
        Ok(())
    }

    /// Start the confirm window at `now`.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        let window = ChronoDuration::from_std(self.confirm_window)
            .unwrap_or_else(|_| ChronoDuration::zero());
        self.deadline = Some(now + window);
    }

    /// Confirm on renewed motion, otherwise expire once the window has passed.
    ///
    /// An unarmed service has no window left, so a quiet sensor expires it.
    pub fn confirm_or_expire(&mut self, motion: bool, now: DateTime<Utc>) -> Result<Confirmation> {
        if motion {
            self.deadline = None;
            return Ok(Confirmation::Confirmed);
        }

        match self.deadline {
            Some(deadline) if now < deadline => Ok(Confirmation::Pending),
            _ => {
                self.deadline = None;
                log_info!(self.log, "No motion confirmed, releasing camera.");
                self.close()?;
                Ok(Confirmation::Expired)
            }
        }
    }

    /// Capture a still with the open session.
    pub fn capture(&mut self) -> Result<PathBuf> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("Camera is not open"))?;
        let path = session.capture().context("Failed to capture picture")?;
        log_info!(self.log, "Picture taken.");
        Ok(path)
    }

    /// Close the session if open. The session counts as released even when
    /// the driver reports an error while closing.
    pub fn close(&mut self) -> Result<()> {
        self.deadline = None;
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        self.closes += 1;
        let result = session.close().context("Failed to close camera");
        log_debug!(self.log, "Camera closed.");
        result
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Sessions opened over the service's lifetime.
    pub fn open_count(&self) -> usize {
        self.opens
    }

    /// Sessions closed over the service's lifetime.
    pub fn close_count(&self) -> usize {
        self.closes
    }
}

impl Drop for CaptureService {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log_warning!(self.log, "{e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLog;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        opens: usize,
        closes: usize,
        captures: usize,
    }

    struct FakeDevice {
        counters: Rc<RefCell<Counters>>,
        fail_capture: bool,
    }

    struct FakeSession {
        counters: Rc<RefCell<Counters>>,
        path: PathBuf,
        fail_capture: bool,
    }

    impl CameraDevice for FakeDevice {
        fn open(&mut self, settings: &CameraSettings) -> Result<Box<dyn CameraSession>> {
            self.counters.borrow_mut().opens += 1;
            Ok(Box::new(FakeSession {
                counters: Rc::clone(&self.counters),
                path: settings.image_path.clone(),
                fail_capture: self.fail_capture,
            }))
        }
    }

    impl CameraSession for FakeSession {
        fn capture(&mut self) -> Result<PathBuf> {
            if self.fail_capture {
                anyhow::bail!("sensor timeout");
            }
            self.counters.borrow_mut().captures += 1;
            Ok(self.path.clone())
        }

        fn close(&mut self) -> Result<()> {
            self.counters.borrow_mut().closes += 1;
            Ok(())
        }
    }

    fn service(fail_capture: bool) -> (CaptureService, Rc<RefCell<Counters>>, MemoryLog) {
        let counters = Rc::new(RefCell::new(Counters::default()));
        let memory = MemoryLog::new();
        let service = CaptureService::new(
            Box::new(FakeDevice {
                counters: Rc::clone(&counters),
                fail_capture,
            }),
            CameraSettings::default(),
            Duration::from_secs(60),
            Arc::new(memory.clone()),
        );
        (service, counters, memory)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 21, 0, 0).unwrap() + ChronoDuration::seconds(secs)
    }

    #[test]
    fn test_capture_policy_cycle() {
        let (mut service, counters, memory) = service(false);
        service.open().unwrap();
        assert!(service.is_open());

        let path = service.capture().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/twitter-photo.jpg"));
        service.close().unwrap();

        assert!(!service.is_open());
        assert_eq!(service.open_count(), 1);
        assert_eq!(service.close_count(), 1);
        assert_eq!(counters.borrow().captures, 1);
        assert!(memory.contains(crate::logger::Level::Info, "Picture taken."));
    }

    #[test]
    fn test_open_is_idempotent() {
        let (mut service, counters, _) = service(false);
        service.open().unwrap();
        service.open().unwrap();
        assert_eq!(counters.borrow().opens, 1);
        assert_eq!(service.open_count(), 1);
    }

    #[test]
    fn test_confirm_pending_then_confirmed() {
        let (mut service, _, _) = service(false);
        service.open().unwrap();
        service.arm(at(0));

        assert_eq!(
            service.confirm_or_expire(false, at(30)).unwrap(),
            Confirmation::Pending
        );
        assert_eq!(
            service.confirm_or_expire(true, at(31)).unwrap(),
            Confirmation::Confirmed
        );
        assert!(service.is_open());
    }

    #[test]
    fn test_expiry_closes_camera() {
        let (mut service, counters, _) = service(false);
        service.open().unwrap();
        service.arm(at(0));

        assert_eq!(
            service.confirm_or_expire(false, at(59)).unwrap(),
            Confirmation::Pending
        );
        assert_eq!(
            service.confirm_or_expire(false, at(60)).unwrap(),
            Confirmation::Expired
        );
        assert!(!service.is_open());
        assert_eq!(counters.borrow().closes, 1);
    }

    #[test]
    fn test_capture_without_session_fails() {
        let (mut service, _, _) = service(false);
        assert!(service.capture().is_err());
    }

    #[test]
    fn test_capture_failure_keeps_session_for_caller_to_close() {
        let (mut service, counters, _) = service(true);
        service.open().unwrap();
        assert!(service.capture().is_err());
        assert!(service.is_open());
        service.close().unwrap();
        assert_eq!(counters.borrow().closes, 1);
    }

    #[test]
    fn test_drop_closes_open_session() {
        let (mut service, counters, _) = service(false);
        service.open().unwrap();
        drop(service);
        assert_eq!(counters.borrow().opens, 1);
        assert_eq!(counters.borrow().closes, 1);
    }

    #[test]
    fn test_close_without_session_is_noop() {
        let (mut service, counters, _) = service(false);
        service.close().unwrap();
        assert_eq!(service.close_count(), 0);
        assert_eq!(counters.borrow().closes, 0);
    }
}
