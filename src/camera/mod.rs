//! Camera access.
//!
//! ## Module Structure
//!
//! - [`capture`]: [`CaptureService`], the single stateful owner of the camera
//!   session used by the controller for both lifecycle policies
//! - [`rpicam`]: driver for the `rpicam-still` process on Raspberry Pi OS
//!
//! Drivers implement [`CameraDevice`] (open a session with fixed settings) and
//! [`CameraSession`] (capture, close). Settings are decided once at startup and
//! never vary per capture.

pub mod capture;
pub mod rpicam;

pub use capture::{CaptureService, Confirmation};
pub use rpicam::RpicamStill;

use anyhow::Result;
use std::path::PathBuf;

use crate::common::constants::*;
use crate::config::Config;

/// Image-quality settings applied when a session opens.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub image_path: PathBuf,
    pub vflip: bool,
    /// 0..=100, 50 is neutral.
    pub brightness: u8,
    /// -100..=100, 0 is neutral.
    pub contrast: i8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from(DEFAULT_IMAGE_PATH),
            vflip: DEFAULT_VFLIP,
            brightness: DEFAULT_BRIGHTNESS,
            contrast: DEFAULT_CONTRAST,
        }
    }
}

impl CameraSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image_path: config.image_path(),
            vflip: config.vflip.unwrap_or(DEFAULT_VFLIP),
            brightness: config.brightness.unwrap_or(DEFAULT_BRIGHTNESS),
            contrast: config.contrast.unwrap_or(DEFAULT_CONTRAST),
        }
    }

    /// Brightness on libcamera's -1.0..=1.0 scale.
    pub fn libcamera_brightness(&self) -> f64 {
        (f64::from(self.brightness) - 50.0) / 50.0
    }

    /// Contrast on libcamera's 0.0..=2.0 scale, 1.0 neutral.
    pub fn libcamera_contrast(&self) -> f64 {
        1.0 + f64::from(self.contrast) / 100.0
    }
}

/// A camera that can be opened.
pub trait CameraDevice {
    fn open(&mut self, settings: &CameraSettings) -> Result<Box<dyn CameraSession>>;
}

/// An open camera. `close` must be idempotent.
pub trait CameraSession {
    /// Write a still to the configured path and return that path.
    fn capture(&mut self) -> Result<PathBuf>;

    fn close(&mut self) -> Result<()>;
}
