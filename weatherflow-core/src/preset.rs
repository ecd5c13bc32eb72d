//! Named god-mode scenarios and manual field edits.

use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::model::{Source, WeatherState, WindSpeed};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub id: &'static str,
    pub label: &'static str,
    pub wmo: i64,
    pub temp_c: f64,
    pub wind_kph: f64,
    pub precip_mm: f64,
}

pub const PRESETS: &[Preset] = &[
    Preset { id: "clear", label: "Clear • Sunny", wmo: 0, temp_c: 26.0, wind_kph: 6.0, precip_mm: 0.0 },
    Preset { id: "partly", label: "Partly Cloudy", wmo: 2, temp_c: 22.0, wind_kph: 10.0, precip_mm: 0.0 },
    Preset { id: "fog", label: "Foggy", wmo: 45, temp_c: 12.0, wind_kph: 4.0, precip_mm: 0.0 },
    Preset { id: "rain", label: "Rain", wmo: 61, temp_c: 14.0, wind_kph: 8.0, precip_mm: 3.0 },
    Preset { id: "storm", label: "Thunderstorm", wmo: 95, temp_c: 18.0, wind_kph: 22.0, precip_mm: 10.0 },
    Preset { id: "snow", label: "Snow", wmo: 71, temp_c: -2.0, wind_kph: 12.0, precip_mm: 5.0 },
    Preset { id: "wind", label: "Windy", wmo: 1, temp_c: 20.0, wind_kph: 40.0, precip_mm: 0.0 },
];

#[derive(Debug, Error, PartialEq)]
#[error("Unknown preset '{0}'. Available presets: clear, partly, fog, rain, storm, snow, wind.")]
pub struct UnknownPreset(pub String);

impl Preset {
    pub fn all() -> &'static [Preset] {
        PRESETS
    }

    pub fn find(id: &str) -> Option<&'static Preset> {
        PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(id.trim()))
    }

    pub fn by_id(id: &str) -> Result<&'static Preset, UnknownPreset> {
        Self::find(id).ok_or_else(|| UnknownPreset(id.to_string()))
    }

    /// Full replacement state for this preset.
    pub fn to_state(&self) -> WeatherState {
        WeatherState {
            weather_code: Some(self.wmo),
            temperature_c: Some(self.temp_c),
            apparent_temperature_c: None,
            wind: Some(WindSpeed::KilometersPerHour(self.wind_kph)),
            humidity_pct: None,
            precipitation_mm: Some(self.precip_mm),
            source: Source::Manual,
        }
    }

    /// Highlighted in the picker when the manual state carries this preset's code.
    pub fn is_active(&self, state: &WeatherState) -> bool {
        state.source == Source::Manual && state.weather_code == Some(self.wmo)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

/// State god mode opens with before any preset is picked.
pub fn initial_manual_state() -> WeatherState {
    WeatherState {
        weather_code: Some(2),
        temperature_c: Some(20.0),
        apparent_temperature_c: None,
        wind: Some(WindSpeed::KilometersPerHour(8.0)),
        humidity_pct: None,
        precipitation_mm: Some(0.0),
        source: Source::Manual,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManualField {
    Wmo,
    TempC,
    WindKph,
    PrecipMm,
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown field '{0}'. Supported fields: wmo, temp, wind, precip.")]
pub struct UnknownField(pub String);

impl ManualField {
    pub const fn all() -> &'static [ManualField] {
        &[ManualField::Wmo, ManualField::TempC, ManualField::WindKph, ManualField::PrecipMm]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ManualField::Wmo => "WMO Code",
            ManualField::TempC => "Temperature (°C)",
            ManualField::WindKph => "Wind (km/h)",
            ManualField::PrecipMm => "Precip (mm)",
        }
    }

    /// Current value of this field, formatted for an input prompt.
    pub fn current(&self, state: &WeatherState) -> String {
        match self {
            ManualField::Wmo => state.weather_code.unwrap_or(0).to_string(),
            ManualField::TempC => state.temperature_c.unwrap_or(0.0).to_string(),
            ManualField::WindKph => state.wind.map(WindSpeed::as_kph).unwrap_or(0.0).to_string(),
            ManualField::PrecipMm => state.precipitation_mm.unwrap_or(0.0).to_string(),
        }
    }
}

impl fmt::Display for ManualField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ManualField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wmo" | "code" => Ok(ManualField::Wmo),
            "temp" | "temp_c" | "temperature" => Ok(ManualField::TempC),
            "wind" | "wind_kph" => Ok(ManualField::WindKph),
            "precip" | "precip_mm" | "precipitation" => Ok(ManualField::PrecipMm),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

/// Apply one raw text edit. Unparseable input becomes zero; values are not
/// clamped to physical ranges.
pub fn apply_edit(state: &WeatherState, field: ManualField, raw: &str) -> WeatherState {
    let mut next = WeatherState { source: Source::Manual, ..state.clone() };

    match field {
        ManualField::Wmo => next.weather_code = Some(coerce_code(raw)),
        ManualField::TempC => next.temperature_c = Some(coerce_number(raw)),
        ManualField::WindKph => next.wind = Some(WindSpeed::KilometersPerHour(coerce_number(raw))),
        ManualField::PrecipMm => next.precipitation_mm = Some(coerce_number(raw)),
    }

    next
}

/// Reads the longest leading number, so `"12abc"` is 12 and `"3e"` is 3.
fn coerce_number(raw: &str) -> f64 {
    leading_number::<f64>(raw, |c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Integer prefix only: `"95.7"` is 95.
fn coerce_code(raw: &str) -> i64 {
    leading_number::<i64>(raw, |c| c.is_ascii_digit() || matches!(c, '+' | '-')).unwrap_or(0)
}

fn leading_number<T: FromStr>(raw: &str, allowed: impl Fn(char) -> bool) -> Option<T> {
    let raw = raw.trim_start();
    let end = raw.find(|c: char| !allowed(c)).unwrap_or(raw.len());
    let candidate = &raw[..end];

    // Candidate is ASCII, so every index is a char boundary.
    (1..=candidate.len()).rev().find_map(|len| candidate[..len].parse().ok())
}
