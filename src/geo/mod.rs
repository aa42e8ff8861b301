//! Geographic location and daylight calculations.
//!
//! ## Module Structure
//!
//! - [`daylight`]: the daylight oracle deciding whether photos may be taken
//!   right now and how long until they may be taken again
//!
//! This file holds [`Location`] and its construction from settings: explicit
//! coordinates, or a city looked up in the bundled `cities` database, with the
//! timezone derived from coordinates through `tzf-rs` when not configured.

pub mod daylight;

pub use daylight::{DaylightOracle, DaylightWindow};

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

use crate::config::Config;
use crate::error::ConfigError;


static TZ_FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// A named place with a timezone. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Tz,
}

/// Result of a city lookup, with the number of same-named candidates so the
/// caller can warn about ambiguity.
#[derive(Debug, Clone)]
pub struct CityMatch {
    pub location: Location,
    pub candidates: usize,
}

impl Location {
    /// Build a location from validated coordinates.
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timezone: Tz,
    ) -> Result<Self, ConfigError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ConfigError::invalid(
                "latitude",
                format!("must be between -90 and 90 degrees (got {latitude})"),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ConfigError::invalid(
                "longitude",
                format!("must be between -180 and 180 degrees (got {longitude})"),
            ));
        }

        Ok(Self {
            name: name.into(),
            latitude,
            longitude,
            timezone,
        })
    }

    /// Build from coordinates, deriving the timezone unless one is given.
    pub fn from_coordinates(
        latitude: f64,
        longitude: f64,
        timezone: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let tz = match timezone {
            Some(name) => parse_timezone(name)?,
            None => determine_timezone_from_coordinates(latitude, longitude),
        };
        Self::new(
            format!("{latitude:.4}°, {longitude:.4}°"),
            latitude,
            longitude,
            tz,
        )
    }

    /// Resolve the location described by the settings.
    ///
    /// Coordinates win over the city name when both are present.
    pub fn from_config(config: &Config) -> Result<CityMatch, ConfigError> {
        match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => Ok(CityMatch {
                location: Self::from_coordinates(lat, lon, config.timezone.as_deref())?,
                candidates: 1,
            }),
            _ => find_city(config.city(), config.timezone.as_deref()),
        }
    }
}

fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>().map_err(|_| {
        ConfigError::invalid("timezone", format!("'{name}' is not an IANA timezone name"))
    })
}

/// Timezone for a coordinate pair, falling back to UTC over open water.
pub fn determine_timezone_from_coordinates(latitude: f64, longitude: f64) -> Tz {
    let name = TZ_FINDER.get_tz_name(longitude, latitude);
    name.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Look up `"Name"` or `"Name, Country"` in the city database.
///
/// Matching is case-insensitive. When a country is given but matches none of
/// the same-named cities, the country is ignored rather than failing.
pub fn find_city(query: &str, timezone: Option<&str>) -> Result<CityMatch, ConfigError> {
    let (name, country) = match query.rsplit_once(',') {
        Some((name, country)) => (name.trim(), Some(country.trim())),
        None => (query.trim(), None),
    };

    let by_name: Vec<_> = cities::all()
        .iter()
        .filter(|city| city.city.eq_ignore_ascii_case(name))
        .collect();

    let by_country: Vec<_> = match country {
        Some(country) => by_name
            .iter()
            .copied()
            .filter(|city| city.country.eq_ignore_ascii_case(country))
            .collect(),
        None => Vec::new(),
    };

    let candidates = if by_country.is_empty() {
        by_name
    } else {
        by_country
    };

    let city = candidates
        .first()
        .ok_or_else(|| ConfigError::UnknownCity(query.to_string()))?;

    let tz = match timezone {
        Some(tz) => parse_timezone(tz)?,
        None => determine_timezone_from_coordinates(city.latitude, city.longitude),
    };

    Ok(CityMatch {
        location: Location::new(
            format!("{}, {}", city.city, city.country),
            city.latitude,
            city.longitude,
            tz,
        )?,
        candidates: candidates.len(),
    })
}
