//! Configuration validation functionality.
//!
//! Rejects settings that would make the controller misbehave: coordinates out
//! of range, half-specified windows, camera values the driver cannot express.

use chrono::NaiveTime;

use super::Config;
use crate::common::constants::*;
use crate::error::ConfigError;

/// Validate every field that is present; absent fields use safe defaults.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_location(config)?;
    validate_manual_window(config)?;

    if let Some(pin) = config.sensor_pin
        && pin > MAXIMUM_BCM_PIN
    {
        return Err(ConfigError::invalid(
            "sensor_pin",
            format!("BCM pin must be between 0 and {MAXIMUM_BCM_PIN} (got {pin})"),
        ));
    }

    if let Some(interval) = config.poll_interval_ms
        && !(MINIMUM_POLL_INTERVAL_MS..=MAXIMUM_POLL_INTERVAL_MS).contains(&interval)
    {
        return Err(ConfigError::invalid(
            "poll_interval_ms",
            format!(
                "must be between {MINIMUM_POLL_INTERVAL_MS} and {MAXIMUM_POLL_INTERVAL_MS} ms (got {interval})"
            ),
        ));
    }

    for (field, value) in [
        ("preview_delay", config.preview_delay),
        ("focus_delay", config.focus_delay),
        ("confirm_window", config.confirm_window),
        ("motion_timeout", config.motion_timeout),
    ] {
        if let Some(secs) = value
            && secs > MAXIMUM_DELAY_SECS
        {
            return Err(ConfigError::invalid(
                field,
                format!("must be at most {MAXIMUM_DELAY_SECS} seconds (got {secs})"),
            ));
        }
    }

    if let Some(brightness) = config.brightness
        && brightness > MAXIMUM_BRIGHTNESS
    {
        return Err(ConfigError::invalid(
            "brightness",
            format!("must be between 0 and {MAXIMUM_BRIGHTNESS} (got {brightness})"),
        ));
    }

    if let Some(contrast) = config.contrast
        && !(MINIMUM_CONTRAST..=MAXIMUM_CONTRAST).contains(&contrast)
    {
        return Err(ConfigError::invalid(
            "contrast",
            format!("must be between {MINIMUM_CONTRAST} and {MAXIMUM_CONTRAST} (got {contrast})"),
        ));
    }

    if let Some(command) = config.camera_command.as_deref()
        && command.trim().is_empty()
    {
        return Err(ConfigError::invalid("camera_command", "must not be empty"));
    }

    if let Some(path) = config.image_path.as_ref()
        && path.as_os_str().is_empty()
    {
        return Err(ConfigError::invalid("image_path", "must not be empty"));
    }

    Ok(())
}

fn validate_location(config: &Config) -> Result<(), ConfigError> {
    match (config.latitude, config.longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ConfigError::invalid(
                    "latitude",
                    format!("must be between -90 and 90 degrees (got {lat})"),
                ));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::invalid(
                    "longitude",
                    format!("must be between -180 and 180 degrees (got {lon})"),
                ));
            }
        }
        (Some(_), None) => {
            return Err(ConfigError::invalid(
                "longitude",
                "latitude is set but longitude is missing",
            ));
        }
        (None, Some(_)) => {
            return Err(ConfigError::invalid(
                "latitude",
                "longitude is set but latitude is missing",
            ));
        }
        (None, None) => {
            if config.city().trim().is_empty() {
                return Err(ConfigError::invalid("city", "must not be empty"));
            }
        }
    }

    if let Some(tz) = config.timezone.as_deref()
        && tz.parse::<chrono_tz::Tz>().is_err()
    {
        return Err(ConfigError::invalid(
            "timezone",
            format!("'{tz}' is not an IANA timezone name"),
        ));
    }

    Ok(())
}

fn validate_manual_window(config: &Config) -> Result<(), ConfigError> {
    match (config.dawn.as_deref(), config.dusk.as_deref()) {
        (None, None) => Ok(()),
        (Some(dawn), Some(dusk)) => {
            let dawn_time = parse_time(dawn).ok_or_else(|| {
                ConfigError::invalid("dawn", format!("'{dawn}' is not HH:MM:SS"))
            })?;
            let dusk_time = parse_time(dusk).ok_or_else(|| {
                ConfigError::invalid("dusk", format!("'{dusk}' is not HH:MM:SS"))
            })?;
            if dawn_time >= dusk_time {
                return Err(ConfigError::invalid(
                    "dusk",
                    format!("dusk ({dusk}) must be later than dawn ({dawn})"),
                ));
            }
            Ok(())
        }
        (Some(_), None) => Err(ConfigError::invalid(
            "dusk",
            "dawn is set but dusk is missing",
        )),
        (None, Some(_)) => Err(ConfigError::invalid(
            "dawn",
            "dusk is set but dawn is missing",
        )),
    }
}

/// Accepts `HH:MM:SS` or `HH:MM`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}
