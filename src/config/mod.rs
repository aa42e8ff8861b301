//! Settings for birdorsquirrel, loaded from TOML with environment overrides.
//!
//! ## Configuration Sources
//!
//! 1. `--config DIR` → `DIR/birdorsquirrel.toml`
//! 2. **XDG_CONFIG_HOME**/birdorsquirrel/birdorsquirrel.toml
//! 3. Built-in defaults when no file exists
//!
//! The `CITY` and `TWITTER_*` environment variables take precedence over the
//! file, so secrets can live in a systemd `EnvironmentFile` instead.
//!
//! ## Configuration Structure
//!
//! ```toml
//! #[Location]
//! city = "San Francisco, United States"  # or latitude/longitude below
//! # latitude = 37.7749
//! # longitude = -122.4194
//! # timezone = "America/Los_Angeles"     # derived from coordinates if omitted
//! daylight_bounds = "civil"              # "civil" (dawn/dusk) or "sunrise"
//! # dawn = "06:00:00"                    # manual window, replaces the ephemeris
//! # dusk = "20:00:00"
//! night_mode = "skip"                    # "skip" or "wait" until dawn
//!
//! #[Sensor]
//! sensor_pin = 3                         # BCM numbering
//! sensor_polarity = "active_low"         # "active_low" (beam break) or "active_high" (PIR)
//! poll_interval_ms = 50
//!
//! #[Camera]
//! camera_policy = "session"              # "session" or "capture"
//! camera_command = "rpicam-still"
//! image_path = "/tmp/twitter-photo.jpg"
//! vflip = true
//! brightness = 50                        # 0-100
//! contrast = 10                          # -100-100
//!
//! #[Timing] (seconds)
//! preview_delay = 5
//! focus_delay = 3
//! confirm_window = 60
//! motion_timeout = 60
//!
//! log_file = "/var/log/birdorsquirrel.log"  # "" disables file logging
//!
//! [twitter]
//! consumer_key = "..."
//! consumer_secret = "..."
//! access_token = "..."
//! access_token_secret = "..."
//! ```

pub mod loading;
pub mod validation;

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::constants::*;
use crate::logger::Log;

pub use loading::{config_path, load, load_from_path, parse};

/// Which solar events bound the daylight window.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DaylightBounds {
    /// Civil dawn to civil dusk (sun 6° below the horizon).
    #[default]
    Civil,
    /// Sunrise to sunset.
    Sunrise,
}

impl DaylightBounds {
    pub fn as_str(&self) -> &'static str {
        match self {
            DaylightBounds::Civil => "civil",
            DaylightBounds::Sunrise => "sunrise",
        }
    }
}

/// Electrical meaning of the motion input.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignalPolarity {
    /// Pin reads low while motion is present (beam-break sensors).
    #[default]
    ActiveLow,
    /// Pin reads high while motion is present (PIR modules).
    ActiveHigh,
}

impl SignalPolarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalPolarity::ActiveLow => "active_low",
            SignalPolarity::ActiveHigh => "active_high",
        }
    }
}

/// Camera lifecycle policy.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraPolicy {
    /// Open, focus, wait for renewed motion within the confirm window.
    #[default]
    Session,
    /// Open, preview, capture, close within a single motion event.
    Capture,
}

impl CameraPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraPolicy::Session => "session",
            CameraPolicy::Capture => "capture",
        }
    }
}

/// What to do with motion detected outside the daylight window.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NightMode {
    /// Log the skip and go straight back to watching.
    #[default]
    Skip,
    /// Log the skip and sleep until the next daylight window starts.
    Wait,
}

/// Secrets from the `[twitter]` table. Values never appear in Debug output.
#[derive(Deserialize, Clone, PartialEq, Default)]
pub struct TwitterSettings {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
}

impl fmt::Debug for TwitterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| if value.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("TwitterSettings")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .finish()
    }
}

/// Settings file contents. Every field is optional and falls back to the
/// defaults in `common::constants`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub daylight_bounds: Option<DaylightBounds>,
    pub dawn: Option<String>, // manual window start, HH:MM:SS
    pub dusk: Option<String>, // manual window end, HH:MM:SS
    pub night_mode: Option<NightMode>,

    pub sensor_pin: Option<u8>,
    pub sensor_polarity: Option<SignalPolarity>,
    pub poll_interval_ms: Option<u64>,

    pub camera_policy: Option<CameraPolicy>,
    pub camera_command: Option<String>,
    pub image_path: Option<PathBuf>,
    pub vflip: Option<bool>,
    pub brightness: Option<u8>,
    pub contrast: Option<i8>,

    pub preview_delay: Option<u64>,  // seconds
    pub focus_delay: Option<u64>,    // seconds
    pub confirm_window: Option<u64>, // seconds
    pub motion_timeout: Option<u64>, // seconds

    pub log_file: Option<String>,

    pub twitter: Option<TwitterSettings>,
}

impl Config {
    /// Load from the default location or from `custom_dir`.
    pub fn load(custom_dir: Option<&std::path::Path>) -> anyhow::Result<Self> {
        loading::load(custom_dir)
    }

    pub fn city(&self) -> &str {
        self.city.as_deref().unwrap_or(DEFAULT_CITY)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn preview_delay(&self) -> Duration {
        Duration::from_secs(self.preview_delay.unwrap_or(DEFAULT_PREVIEW_DELAY_SECS))
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_secs(self.focus_delay.unwrap_or(DEFAULT_FOCUS_DELAY_SECS))
    }

    pub fn confirm_window(&self) -> Duration {
        Duration::from_secs(self.confirm_window.unwrap_or(DEFAULT_CONFIRM_WINDOW_SECS))
    }

    pub fn motion_timeout(&self) -> Duration {
        Duration::from_secs(self.motion_timeout.unwrap_or(DEFAULT_MOTION_TIMEOUT_SECS))
    }

    pub fn image_path(&self) -> PathBuf {
        self.image_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_PATH))
    }

    /// Log file path, or `None` when file logging is disabled with `log_file = ""`.
    pub fn log_file(&self) -> Option<PathBuf> {
        match self.log_file.as_deref() {
            Some("") => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    /// Summarize the effective settings (never the secrets).
    pub fn log_config(&self, log: &dyn Log) {
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => format!("{lat:.4}°, {lon:.4}°"),
            _ => self.city().to_string(),
        };
        log.info(&format!("Location: {location}"));

        match (self.dawn.as_deref(), self.dusk.as_deref()) {
            (Some(dawn), Some(dusk)) => {
                log.info(&format!("Daylight window: manual {dawn} - {dusk}"));
            }
            _ => log.info(&format!(
                "Daylight window: {}",
                self.daylight_bounds.unwrap_or_default().as_str()
            )),
        }

        log.info(&format!(
            "Sensor: BCM {} ({})",
            self.sensor_pin.unwrap_or(DEFAULT_SENSOR_PIN),
            self.sensor_polarity.unwrap_or_default().as_str()
        ));
        log.info(&format!(
            "Camera: {} policy via {}",
            self.camera_policy.unwrap_or_default().as_str(),
            self.camera_command.as_deref().unwrap_or(DEFAULT_CAMERA_COMMAND)
        ));
        log.debug(&format!(
            "Timing: preview {}s, focus {}s, confirm {}s, cooldown {}s, poll {}ms",
            self.preview_delay().as_secs(),
            self.focus_delay().as_secs(),
            self.confirm_window().as_secs(),
            self.motion_timeout().as_secs(),
            self.poll_interval().as_millis()
        ));
    }
}
