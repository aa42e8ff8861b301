//! Status command: where the feeder is, when it is light enough, and whether
//! the daemon is running.
//!
//! Everything is computed locally from the settings file and the lock file;
//! no hardware is touched, so this is safe to run next to a live daemon.

use anyhow::Result;
use chrono::{DateTime, Utc};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::utils::{format_duration, private_path};
use crate::config::Config;
use crate::geo::{DaylightOracle, DaylightWindow, Location};
use crate::io::lock::default_lock_path;

/// Snapshot printed by `birdorsquirrel status`.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub location: String,
    pub timezone: String,
    pub schedule: String,
    pub window: DaylightWindow,
    pub daylight_now: bool,
    pub until_daylight: Duration,
    pub lock_path: PathBuf,
    pub running_pid: Option<u32>,
}

impl StatusReport {
    pub fn gather(oracle: &DaylightOracle, now: DateTime<Utc>, lock_path: &Path) -> Self {
        Self {
            location: oracle.location().name.clone(),
            timezone: oracle.location().timezone.to_string(),
            schedule: oracle.describe(),
            window: oracle.today(now),
            daylight_now: oracle.is_daylight(now),
            until_daylight: oracle.duration_until_next_daylight(now),
            lock_path: lock_path.to_path_buf(),
            running_pid: running_instance(lock_path),
        }
    }

    fn print(&self) {
        println!("┏ birdorsquirrel status ━━╸");
        println!("┃");
        println!("┣ Location: {} ({})", self.location, self.timezone);
        println!("┣ Schedule: {}", self.schedule);
        println!(
            "┣ Today:    {} - {}",
            self.window.dawn.format("%H:%M:%S"),
            self.window.dusk.format("%H:%M:%S")
        );
        if self.daylight_now {
            println!("┣ Daylight: yes");
        } else {
            println!(
                "┣ Daylight: no, next window in {}",
                format_duration(self.until_daylight)
            );
        }
        match self.running_pid {
            Some(pid) => println!("┗ Daemon:   running (PID: {pid})"),
            None => println!(
                "┗ Daemon:   not running (lock {})",
                private_path(&self.lock_path)
            ),
        }
    }
}

/// PID recorded in the lock file, if that process is still alive.
pub fn running_instance(lock_path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(lock_path).ok()?;
    let pid: u32 = content.lines().next()?.trim().parse().ok()?;
    let raw = i32::try_from(pid).ok()?;
    kill(Pid::from_raw(raw), None).ok().map(|_| pid)
}

/// Handle `birdorsquirrel status`.
pub fn handle_status_command(config_dir: Option<&str>) -> Result<()> {
    let config = Config::load(config_dir.map(Path::new))?;
    let city = Location::from_config(&config)?;
    let oracle = DaylightOracle::from_config(city.location, &config)?;

    StatusReport::gather(&oracle, Utc::now(), &default_lock_path()).print();
    Ok(())
}
