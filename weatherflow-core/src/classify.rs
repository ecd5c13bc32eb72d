//! WMO weather code → visual effect.
//!
//! Two band sets exist and they disagree on purpose:
//! - [`CodeTable::Live`] knows 23 codes, sends thunderstorms (95/96/99) to
//!   [`EffectKind::Rain`] and falls back to [`EffectKind::Clear`].
//! - [`CodeTable::Manual`] is coarser, has a distinct [`EffectKind::Storm`],
//!   counts snow showers (85/86) as snow and falls back to
//!   [`EffectKind::Cloudy`] for everything except code 0.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Clear,
    Cloudy,
    Fog,
    Rain,
    Snow,
    Storm,
}

impl EffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Clear => "clear",
            EffectKind::Cloudy => "cloudy",
            EffectKind::Fog => "fog",
            EffectKind::Rain => "rain",
            EffectKind::Snow => "snow",
            EffectKind::Storm => "storm",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which band set to classify with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodeTable {
    #[default]
    Live,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: Option<&'static str>,
    pub effect: EffectKind,
}

/// Classify a WMO code. Never fails: unknown or missing codes fall back to the
/// table's default effect.
pub fn classify(code: Option<i64>, table: CodeTable) -> Classification {
    match table {
        CodeTable::Live => match code.and_then(live_entry) {
            Some((label, effect)) => Classification { label: Some(label), effect },
            None => Classification { label: None, effect: EffectKind::Clear },
        },
        CodeTable::Manual => Classification {
            label: code.and_then(wmo_label),
            effect: manual_band(code),
        },
    }
}

fn live_entry(code: i64) -> Option<(&'static str, EffectKind)> {
    use EffectKind::*;

    let entry = match code {
        0 => ("Clear", Clear),
        1 => ("Mainly clear", Clear),
        2 => ("Partly cloudy", Cloudy),
        3 => ("Overcast", Cloudy),
        45 => ("Fog", Fog),
        48 => ("Depositing rime fog", Fog),
        51 => ("Light drizzle", Rain),
        53 => ("Drizzle", Rain),
        55 => ("Dense drizzle", Rain),
        61 => ("Slight rain", Rain),
        63 => ("Rain", Rain),
        65 => ("Heavy rain", Rain),
        66 => ("Freezing rain", Rain),
        67 => ("Heavy freezing rain", Rain),
        71 => ("Slight snow", Snow),
        73 => ("Snow", Snow),
        75 => ("Heavy snow", Snow),
        80 | 81 => ("Rain showers", Rain),
        82 => ("Violent rain showers", Rain),
        95 => ("Thunderstorm", Rain),
        96 | 99 => ("Thunderstorm w/ hail", Rain),
        _ => return None,
    };

    Some(entry)
}

fn wmo_label(code: i64) -> Option<&'static str> {
    match code {
        85 => Some("Snow showers"),
        86 => Some("Heavy snow showers"),
        _ => live_entry(code).map(|(label, _)| label),
    }
}

fn manual_band(code: Option<i64>) -> EffectKind {
    match code {
        Some(45 | 48) => EffectKind::Fog,
        Some(51 | 53 | 55 | 61 | 63 | 65 | 80 | 81 | 82) => EffectKind::Rain,
        Some(71 | 73 | 75 | 85 | 86) => EffectKind::Snow,
        Some(95 | 96 | 99) => EffectKind::Storm,
        Some(0) => EffectKind::Clear,
        _ => EffectKind::Cloudy,
    }
}
