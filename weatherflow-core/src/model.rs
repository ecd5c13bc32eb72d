use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Where the current state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Manual,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Live => "live",
            Source::Manual => "manual",
        }
    }

    /// Label shown next to the scene.
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Live => "Live",
            Source::Manual => "God Mode",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wind speed tagged with its unit.
///
/// The live backend reports m/s while god mode edits km/h; keeping the unit in
/// the type means a threshold can only be compared after an explicit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum WindSpeed {
    MetersPerSecond(f64),
    KilometersPerHour(f64),
}

impl WindSpeed {
    const KPH_PER_MPS: f64 = 3.6;

    pub fn as_mps(self) -> f64 {
        match self {
            WindSpeed::MetersPerSecond(v) => v,
            WindSpeed::KilometersPerHour(v) => v / Self::KPH_PER_MPS,
        }
    }

    pub fn as_kph(self) -> f64 {
        match self {
            WindSpeed::MetersPerSecond(v) => v * Self::KPH_PER_MPS,
            WindSpeed::KilometersPerHour(v) => v,
        }
    }

    /// Raw value in whatever unit the speed was recorded in.
    pub fn value(self) -> f64 {
        match self {
            WindSpeed::MetersPerSecond(v) | WindSpeed::KilometersPerHour(v) => v,
        }
    }

    pub fn unit_symbol(self) -> &'static str {
        match self {
            WindSpeed::MetersPerSecond(_) => "m/s",
            WindSpeed::KilometersPerHour(_) => "km/h",
        }
    }
}

/// Snapshot of the weather the dashboard is showing.
///
/// Never patched in place by the session: every update builds a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub weather_code: Option<i64>,
    pub temperature_c: Option<f64>,
    pub apparent_temperature_c: Option<f64>,
    pub wind: Option<WindSpeed>,
    pub humidity_pct: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub source: Source,
}

/// Body of `GET /weather`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    /// Metres per second.
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
}

impl From<CurrentWeather> for WeatherState {
    fn from(w: CurrentWeather) -> Self {
        WeatherState {
            weather_code: w.weather_code,
            temperature_c: w.temperature,
            apparent_temperature_c: w.apparent_temperature,
            wind: w.wind_speed.map(WindSpeed::MetersPerSecond),
            humidity_pct: w.humidity,
            precipitation_mm: w.precipitation,
            source: Source::Live,
        }
    }
}

/// One entry of `GET /geocode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.latitude, lon: self.longitude }
    }
}

impl fmt::Display for Place {
    /// `Springfield, Illinois • United States`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(admin1) = self.admin1.as_deref().filter(|s| !s.is_empty()) {
            write!(f, ", {admin1}")?;
        }
        if let Some(country) = self.country.as_deref().filter(|s| !s.is_empty()) {
            write!(f, " • {country}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    pub results: Option<Vec<Place>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum CoordinatesError {
    #[error("expected `lat,lon`, got '{0}'")]
    Format(String),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinatesError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinatesError::LatitudeOutOfRange(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinatesError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

impl FromStr for Coordinates {
    type Err = CoordinatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoordinatesError::Format(s.to_string()))?;

        let parse = |part: &str| {
            let part = part.trim();
            part.parse::<f64>().map_err(|_| CoordinatesError::NotANumber(part.to_string()))
        };

        Coordinates::new(parse(lat)?, parse(lon)?)
    }
}
