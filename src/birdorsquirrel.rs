//! Application coordinator for the monitoring daemon.
//!
//! Acquires every resource the controller needs, in an order that reports
//! configuration problems before any hardware is touched:
//!
//! 1. settings and file logging
//! 2. credentials and publisher session
//! 3. location and daylight schedule
//! 4. single-instance lock
//! 5. motion sensor, camera and signal handler
//!
//! The `BirdOrSquirrel` struct is a small builder so the same entry point
//! serves a normal start and a `--config DIR` start:
//!
//! ```no_run
//! use birdorsquirrel::BirdOrSquirrel;
//!
//! # fn main() -> anyhow::Result<()> {
//! BirdOrSquirrel::new(false)
//!     .with_config_dir(Some("/etc/birdorsquirrel".to_string()))
//!     .run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    camera::{CameraSettings, CaptureService, RpicamStill},
    common::utils::private_path,
    config::Config,
    core::{Controller, ControllerParams, Timing},
    error::find_config_error,
    geo::{DaylightOracle, Location},
    io::{
        lock::{acquire_lock, default_lock_path},
        signals::setup_signal_handler,
    },
    logger::{Log, Logger, LoggerGuard},
    publish::{Credentials, TwitterPublisher},
    sensor::MotionSensor,
    time_source::{Clock, SystemClock},
};
use crate::{log_debug, log_error, log_info, log_warning};

/// Builder for configuring and running the daemon.
pub struct BirdOrSquirrel {
    debug_enabled: bool,
    config_dir: Option<PathBuf>,
}

impl BirdOrSquirrel {
    /// Create a new runner with defaults matching a normal start.
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            config_dir: None,
        }
    }

    /// Read settings from `dir` instead of the XDG config directory.
    pub fn with_config_dir(mut self, dir: Option<String>) -> Self {
        self.config_dir = dir.map(PathBuf::from);
        self
    }

    /// Run until a shutdown signal arrives or a step fails.
    ///
    /// Configuration errors are logged here, where the file sink is still
    /// attached, and returned unchanged so `main` can pick the exit code.
    pub fn run(self) -> Result<()> {
        let logger = Arc::new(Logger::new(self.debug_enabled));
        let log: Arc<dyn Log> = logger.clone();

        log_info!(log, "birdorsquirrel v{}", env!("CARGO_PKG_VERSION"));

        let config = match Config::load(self.config_dir.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                report_failure(&*log, &e);
                return Err(e);
            }
        };

        // Kept alive until the loop ends so every record reaches the file
        let _file_guard = start_file_logging(&logger, &*log, &config);

        let result = run_with_config(&config, Arc::clone(&log));
        if let Err(e) = &result {
            report_failure(&*log, e);
        } else {
            log_info!(log, "Shut down cleanly.");
        }
        result
    }
}

fn start_file_logging(logger: &Logger, log: &dyn Log, config: &Config) -> Option<LoggerGuard> {
    let path = config.log_file()?;
    match logger.start_file_logging(&path) {
        Ok(guard) => {
            log_debug!(log, "Logging to {}", private_path(guard.path()));
            Some(guard)
        }
        Err(e) => {
            log_warning!(log, "File logging disabled: {e:#}");
            None
        }
    }
}

fn report_failure(log: &dyn Log, error: &anyhow::Error) {
    match find_config_error(error) {
        Some(config_error) => log_error!(log, "Configuration error: {config_error}"),
        None => log_error!(log, "{error:#}"),
    }
}

fn run_with_config(config: &Config, log: Arc<dyn Log>) -> Result<()> {
    config.log_config(&*log);

    let credentials = Credentials::resolve(|key| std::env::var(key).ok(), config.twitter.as_ref())?;
    let publisher = TwitterPublisher::authenticate(credentials, Arc::clone(&log))?;

    let city = Location::from_config(config)?;
    if city.candidates > 1 {
        log_warning!(
            log,
            "{} places match '{}'; using {}. Add a country or set latitude/longitude to choose another.",
            city.candidates,
            config.city(),
            city.location.name
        );
    }
    let oracle = DaylightOracle::from_config(city.location, config)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let window = oracle.today(clock.now());
    log_info!(
        log,
        "{} ({}): {}, today {} - {}",
        oracle.location().name,
        oracle.location().timezone,
        oracle.describe(),
        window.dawn.format("%H:%M:%S"),
        window.dusk.format("%H:%M:%S")
    );

    let _lock = acquire_lock(&default_lock_path())?;

    let sensor = open_sensor(config)?;
    let camera = CaptureService::new(
        Box::new(RpicamStill::from_config(config)),
        CameraSettings::from_config(config),
        config.confirm_window(),
        Arc::clone(&log),
    );

    let signal_state =
        setup_signal_handler(Arc::clone(&log)).context("Failed to set up signal handling")?;

    let mut controller = Controller::new(ControllerParams {
        oracle,
        sensor,
        camera,
        publisher: Box::new(publisher),
        clock,
        running: signal_state.running,
        timing: Timing::from_config(config),
        policy: config.camera_policy.unwrap_or_default(),
        night_mode: config.night_mode.unwrap_or_default(),
        log,
    });

    controller.run()
}

#[cfg(feature = "rpi")]
fn open_sensor(config: &Config) -> Result<Box<dyn MotionSensor>> {
    use crate::common::constants::DEFAULT_SENSOR_PIN;

    let sensor = crate::sensor::open_gpio_sensor(
        config.sensor_pin.unwrap_or(DEFAULT_SENSOR_PIN),
        config.sensor_polarity.unwrap_or_default(),
    )?;
    Ok(Box::new(sensor))
}

#[cfg(not(feature = "rpi"))]
fn open_sensor(_config: &Config) -> Result<Box<dyn MotionSensor>> {
    anyhow::bail!("This build has no GPIO support; rebuild with the `rpi` feature")
}
