//! What a renderer needs to draw one frame of the dashboard.

use serde::Serialize;

use crate::{
    classify::{CodeTable, EffectKind, classify},
    model::{Source, WeatherState, WindSpeed},
    theme::{ThemeKind, is_windy, scene_sways, select_theme},
};

pub const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Overlay {
    Fog,
    Rain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub accent: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneView {
    pub source: Source,
    pub effect: EffectKind,
    pub label: Option<&'static str>,
    pub theme: ThemeKind,
    /// Cards (live) or the whole scene (god mode) sway in the wind.
    pub wobble: bool,
    pub overlay: Option<Overlay>,
    pub cards: Vec<StatCard>,
}

impl SceneView {
    /// Live states use the full code table and the m/s wind threshold; manual
    /// states use the banded table and the km/h sway threshold.
    pub fn derive(state: &WeatherState) -> Self {
        let (table, wobble, cards) = match state.source {
            Source::Live => (CodeTable::Live, is_windy(state.wind), live_cards(state)),
            Source::Manual => (CodeTable::Manual, scene_sways(state.wind), manual_cards(state)),
        };

        let classification = classify(state.weather_code, table);

        Self {
            source: state.source,
            effect: classification.effect,
            label: classification.label,
            theme: select_theme(state.temperature_c),
            wobble,
            overlay: overlay_for(classification.effect),
            cards,
        }
    }
}

fn overlay_for(effect: EffectKind) -> Option<Overlay> {
    match effect {
        EffectKind::Fog => Some(Overlay::Fog),
        EffectKind::Rain => Some(Overlay::Rain),
        _ => None,
    }
}

fn live_cards(state: &WeatherState) -> Vec<StatCard> {
    vec![
        StatCard { label: "Temperature", value: fmt_temp(state.temperature_c), accent: "🌡️" },
        StatCard { label: "Feels like", value: fmt_temp(state.apparent_temperature_c), accent: "🥵" },
        StatCard {
            label: "Wind",
            value: fmt_unit(state.wind.map(WindSpeed::as_mps), " m/s"),
            accent: "🍃",
        },
        StatCard { label: "Humidity", value: fmt_unit(state.humidity_pct, "%"), accent: "💧" },
    ]
}

fn manual_cards(state: &WeatherState) -> Vec<StatCard> {
    vec![
        StatCard { label: "Temperature", value: fmt_temp(state.temperature_c), accent: "🌡️" },
        StatCard {
            label: "WMO",
            value: state.weather_code.map_or_else(|| PLACEHOLDER.to_string(), |c| c.to_string()),
            accent: "🛰️",
        },
        StatCard {
            label: "Wind",
            value: fmt_unit(state.wind.map(WindSpeed::as_kph), " km/h"),
            accent: "🍃",
        },
        StatCard {
            label: "Precip",
            value: state
                .precipitation_mm
                .map_or_else(|| PLACEHOLDER.to_string(), |p| format!("{p} mm")),
            accent: "🌧️",
        },
    ]
}

pub fn fmt_temp(v: Option<f64>) -> String {
    fmt_unit(v, "°C")
}

fn fmt_unit(v: Option<f64>, unit: &str) -> String {
    match v.filter(|v| v.is_finite()) {
        Some(v) => format!("{}{unit}", round_half_up(v)),
        None => PLACEHOLDER.to_string(),
    }
}

/// Halves round towards positive infinity, so -2.5 shows as -2.
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}
