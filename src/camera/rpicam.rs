//! `rpicam-still` driver.
//!
//! The process is started in signal mode (`-t 0 --signal`) so the sensor stays
//! initialised between captures: SIGUSR1 writes a frame to the output path and
//! SIGUSR2 makes the process exit. Opening the session is therefore the
//! expensive part, which is exactly what the session policy amortises.

use anyhow::{Context, Result, bail};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Instant, SystemTime};

use super::{CameraDevice, CameraSession, CameraSettings};
use crate::common::constants::*;
use crate::config::Config;

/// Launches `rpicam-still` (or a compatible command) per session.
#[derive(Debug, Clone)]
pub struct RpicamStill {
    command: String,
}

impl RpicamStill {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .camera_command
                .as_deref()
                .unwrap_or(DEFAULT_CAMERA_COMMAND),
        )
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Command-line arguments for a signal-mode session.
pub fn build_args(settings: &CameraSettings) -> Vec<String> {
    let mut args = vec![
        "-t".to_string(),
        "0".to_string(),
        "--signal".to_string(),
        "-o".to_string(),
        settings.image_path.display().to_string(),
    ];
    if settings.vflip {
        args.push("--vflip".to_string());
    }
    args.extend([
        "--brightness".to_string(),
        format!("{:.2}", settings.libcamera_brightness()),
        "--contrast".to_string(),
        format!("{:.2}", settings.libcamera_contrast()),
        "-n".to_string(),
    ]);
    args
}

impl CameraDevice for RpicamStill {
    fn open(&mut self, settings: &CameraSettings) -> Result<Box<dyn CameraSession>> {
        let child = Command::new(&self.command)
            .args(build_args(settings))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start camera command '{}'", self.command))?;

        Ok(Box::new(RpicamSession {
            child,
            image_path: settings.image_path.clone(),
            closed: false,
        }))
    }
}

struct RpicamSession {
    child: Child,
    image_path: PathBuf,
    closed: bool,
}

impl RpicamSession {
    fn pid(&self) -> Pid {
        Pid::from_raw(self.child.id() as i32)
    }

    fn exited(&mut self) -> Result<bool> {
        Ok(self
            .child
            .try_wait()
            .context("Failed to query camera process")?
            .is_some())
    }
}

/// Modification time and size, or `None` if the file is absent.
fn file_stamp(path: &Path) -> Option<(SystemTime, u64)> {
    let metadata = fs::metadata(path).ok()?;
    Some((metadata.modified().ok()?, metadata.len()))
}

impl CameraSession for RpicamSession {
    fn capture(&mut self) -> Result<PathBuf> {
        if self.closed || self.exited()? {
            bail!("Camera process is not running");
        }

        let before = file_stamp(&self.image_path);
        kill(self.pid(), Signal::SIGUSR1).context("Failed to signal camera process")?;

        let started = Instant::now();
        loop {
            if let Some(stamp) = file_stamp(&self.image_path)
                && stamp.1 > 0
                && Some(stamp) != before
            {
                return Ok(self.image_path.clone());
            }

            if self.exited()? {
                bail!("Camera process exited during capture");
            }
            if started.elapsed() >= CAPTURE_TIMEOUT {
                bail!(
                    "Timed out after {}s waiting for {}",
                    CAPTURE_TIMEOUT.as_secs(),
                    self.image_path.display()
                );
            }
            std::thread::sleep(CAMERA_POLL_INTERVAL);
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.exited()? {
            return Ok(());
        }

        // Ask politely first; rpicam-still releases the sensor on SIGUSR2.
        let _ = kill(self.pid(), Signal::SIGUSR2);

        let started = Instant::now();
        while started.elapsed() < CAMERA_EXIT_GRACE {
            if self.exited()? {
                return Ok(());
            }
            std::thread::sleep(CAMERA_POLL_INTERVAL);
        }

        self.child.kill().context("Failed to kill camera process")?;
        self.child.wait().context("Failed to reap camera process")?;
        Ok(())
    }
}

impl Drop for RpicamSession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
