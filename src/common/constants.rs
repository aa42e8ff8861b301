//! Application-wide constants and defaults.
//!
//! Timing values are carried over from the field-tested script and are not
//! tuned beyond that; every one of them can be overridden in the settings file.

use std::time::Duration;

// # Application Identity

pub const APP_NAME: &str = "birdorsquirrel";
pub const CONFIG_FILE_NAME: &str = "birdorsquirrel.toml";
pub const LOCK_FILE_NAME: &str = "birdorsquirrel.lock";

// # Controller Timing

/// Sleep after a publish before watching for motion again.
pub const DEFAULT_MOTION_TIMEOUT_SECS: u64 = 60;
/// How long renewed motion may take to show up once the camera is focused.
pub const DEFAULT_CONFIRM_WINDOW_SECS: u64 = 60;
/// Focus delay for the session-scoped camera policy.
pub const DEFAULT_FOCUS_DELAY_SECS: u64 = 3;
/// Preview warm-up for the capture-scoped camera policy.
pub const DEFAULT_PREVIEW_DELAY_SECS: u64 = 5;
/// Motion sensor polling period.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Upper bound on a single uninterruptible sleep slice.
pub const SLEEP_SLICE: Duration = Duration::from_secs(1);

pub const MINIMUM_POLL_INTERVAL_MS: u64 = 1;
pub const MAXIMUM_POLL_INTERVAL_MS: u64 = 5_000;
pub const MAXIMUM_DELAY_SECS: u64 = 3_600;

// # Location

pub const DEFAULT_CITY: &str = "San Francisco, United States";

// # Hardware

/// BCM pin the motion sensor is wired to.
pub const DEFAULT_SENSOR_PIN: u8 = 3;
pub const MAXIMUM_BCM_PIN: u8 = 27;

pub const DEFAULT_CAMERA_COMMAND: &str = "rpicam-still";
pub const DEFAULT_IMAGE_PATH: &str = "/tmp/twitter-photo.jpg";
pub const DEFAULT_VFLIP: bool = true;
pub const DEFAULT_BRIGHTNESS: u8 = 50;
pub const DEFAULT_CONTRAST: i8 = 10;
pub const MAXIMUM_BRIGHTNESS: u8 = 100;
pub const MINIMUM_CONTRAST: i8 = -100;
pub const MAXIMUM_CONTRAST: i8 = 100;

/// How long a signalled capture may take to land on disk.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);
/// Grace period for the camera process to exit before it is killed.
pub const CAMERA_EXIT_GRACE: Duration = Duration::from_secs(2);
pub const CAMERA_POLL_INTERVAL: Duration = Duration::from_millis(50);

// # Publishing

pub const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
pub const CREATE_POST_URL: &str = "https://api.twitter.com/2/tweets";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "TWITTER_CONSUMER_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "TWITTER_ACCESS_TOKEN";
pub const ENV_ACCESS_TOKEN_SECRET: &str = "TWITTER_ACCESS_TOKEN_SECRET";
pub const ENV_CITY: &str = "CITY";

// # Logging

pub const DEFAULT_LOG_FILE: &str = "/var/log/birdorsquirrel.log";

// # Exit Codes

pub const EXIT_FAILURE: i32 = 1;
