//! Daylight oracle: is it light enough to take a picture, and if not, when?
//!
//! The window for a date runs from dawn to dusk in the location's timezone.
//! Both boundary instants count as dark. Nothing is cached: every query
//! recomputes the ephemeris for the relevant date, so a long-running process
//! never works from a stale day.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::time::Duration as StdDuration;
use sunrise::{Coordinates, DawnType, SolarDay, SolarEvent};

use super::Location;
use crate::config::{Config, DaylightBounds, validation::parse_time};
use crate::error::ConfigError;

/// Dawn and dusk for one local date.
#[derive(Debug, Clone, PartialEq)]
pub struct DaylightWindow {
    pub date: NaiveDate,
    pub dawn: DateTime<Tz>,
    pub dusk: DateTime<Tz>,
}

impl DaylightWindow {
    /// Strictly between dawn and dusk.
    pub fn contains(&self, instant: DateTime<Tz>) -> bool {
        instant > self.dawn && instant < self.dusk
    }
}

#[derive(Debug, Clone)]
enum Schedule {
    Solar {
        coordinates: Coordinates,
        bounds: DaylightBounds,
    },
    Manual {
        dawn: NaiveTime,
        dusk: NaiveTime,
    },
}

/// Answers daylight questions for a fixed location.
#[derive(Debug, Clone)]
pub struct DaylightOracle {
    location: Location,
    schedule: Schedule,
}

impl DaylightOracle {
    /// Ephemeris-based oracle.
    pub fn solar(location: Location, bounds: DaylightBounds) -> Result<Self, ConfigError> {
        let coordinates = Coordinates::new(location.latitude, location.longitude)
            .ok_or_else(|| {
                ConfigError::invalid(
                    "latitude",
                    format!(
                        "invalid coordinates {:.4}, {:.4}",
                        location.latitude, location.longitude
                    ),
                )
            })?;

        Ok(Self {
            location,
            schedule: Schedule::Solar {
                coordinates,
                bounds,
            },
        })
    }

    /// Fixed local-time window, same every day.
    pub fn manual(location: Location, dawn: NaiveTime, dusk: NaiveTime) -> Self {
        Self {
            location,
            schedule: Schedule::Manual { dawn, dusk },
        }
    }

    /// Manual window when `dawn`/`dusk` are configured, ephemeris otherwise.
    pub fn from_config(location: Location, config: &Config) -> Result<Self, ConfigError> {
        match (config.dawn.as_deref(), config.dusk.as_deref()) {
            (Some(dawn), Some(dusk)) => {
                let dawn = parse_time(dawn)
                    .ok_or_else(|| ConfigError::invalid("dawn", format!("'{dawn}' is not HH:MM:SS")))?;
                let dusk = parse_time(dusk)
                    .ok_or_else(|| ConfigError::invalid("dusk", format!("'{dusk}' is not HH:MM:SS")))?;
                Ok(Self::manual(location, dawn, dusk))
            }
            _ => Self::solar(location, config.daylight_bounds.unwrap_or_default()),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Short description of where the window comes from, for logs.
    pub fn describe(&self) -> String {
        match &self.schedule {
            Schedule::Solar {
                bounds: DaylightBounds::Civil,
                ..
            } => "civil dawn to civil dusk".to_string(),
            Schedule::Solar {
                bounds: DaylightBounds::Sunrise,
                ..
            } => "sunrise to sunset".to_string(),
            Schedule::Manual { dawn, dusk } => {
                format!("{} to {}", dawn.format("%H:%M:%S"), dusk.format("%H:%M:%S"))
            }
        }
    }

    /// Window for a local date in the location's timezone.
    pub fn window_for(&self, date: NaiveDate) -> DaylightWindow {
        let tz = self.location.timezone;
        let (dawn, dusk) = match &self.schedule {
            Schedule::Solar {
                coordinates,
                bounds,
            } => {
                let solar_day = SolarDay::new(*coordinates, date);
                let (start, end) = match bounds {
                    DaylightBounds::Civil => (
                        SolarEvent::Dawn(DawnType::Civil),
                        SolarEvent::Dusk(DawnType::Civil),
                    ),
                    DaylightBounds::Sunrise => (SolarEvent::Sunrise, SolarEvent::Sunset),
                };
                (
                    solar_day.event_time(start).with_timezone(&tz),
                    solar_day.event_time(end).with_timezone(&tz),
                )
            }
            Schedule::Manual { dawn, dusk } => (
                localize(tz, date.and_time(*dawn)),
                localize(tz, date.and_time(*dusk)),
            ),
        };

        DaylightWindow { date, dawn, dusk }
    }

    /// Today's window, where "today" is `now`'s date at the location.
    pub fn today(&self, now: DateTime<Utc>) -> DaylightWindow {
        let local = now.with_timezone(&self.location.timezone);
        self.window_for(local.date_naive())
    }

    /// True strictly between today's dawn and dusk.
    pub fn is_daylight(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.location.timezone);
        self.window_for(local.date_naive()).contains(local)
    }

    /// The first dawn strictly after `now`: today's if still ahead, otherwise
    /// tomorrow's (only computed in that case).
    pub fn next_dawn(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        let local = now.with_timezone(&self.location.timezone);
        let today = local.date_naive();
        let today_dawn = self.window_for(today).dawn;
        if local < today_dawn {
            return today_dawn;
        }

        let tomorrow = today.succ_opt().unwrap_or(today);
        self.window_for(tomorrow).dawn
    }

    /// Time until the next daylight window begins. Never negative.
    pub fn duration_until_next_daylight(&self, now: DateTime<Utc>) -> StdDuration {
        let delta = self.next_dawn(now).with_timezone(&Utc) - now;
        delta
            .max(Duration::zero())
            .to_std()
            .unwrap_or(StdDuration::ZERO)
    }

    pub fn seconds_until_next_daylight(&self, now: DateTime<Utc>) -> f64 {
        self.duration_until_next_daylight(now).as_secs_f64()
    }
}

/// Attach a timezone to a wall-clock time, resolving DST folds to the earlier
/// instant and DST gaps to the first valid instant after the gap.
fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}
