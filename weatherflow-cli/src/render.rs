//! Plain-text rendering of a [`SceneView`].

use chrono::{DateTime, Local};
use weatherflow_core::{
    Preset, SceneView, ThemeKind, WeatherState,
    scene::{Overlay, StatCard},
};

const WIDTH: usize = 48;

/// Everything above the scene: title, location line, timestamp.
#[derive(Debug, Default)]
pub struct Header<'a> {
    pub title: &'a str,
    pub location: Option<String>,
    pub updated_at: Option<DateTime<Local>>,
}

pub fn dashboard(header: &Header<'_>, view: &SceneView) -> String {
    let mut lines = Vec::new();

    let stamp = header
        .updated_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    lines.push(format!("{:<w$}{stamp}", header.title, w = WIDTH - stamp.chars().count()));

    if let Some(location) = &header.location {
        lines.push(location.clone());
    }

    lines.push(rule(view.theme));
    lines.push(format!(
        "{} {}  effect: {}{}  source: {}",
        theme_mark(view.theme),
        view.theme,
        view.effect,
        view.label.map(|l| format!(" ({l})")).unwrap_or_default(),
        view.source.display_name(),
    ));

    if let Some(overlay) = view.overlay {
        lines.extend(overlay_art(overlay));
    }

    for (i, card) in view.cards.iter().enumerate() {
        lines.push(card_line(card, view.wobble && i % 2 == 1));
    }

    lines.push(rule(view.theme));
    lines.join("\n")
}

/// Preset picker with the active preset marked.
pub fn preset_list(state: &WeatherState) -> String {
    Preset::all()
        .iter()
        .map(|p| {
            let mark = if p.is_active(state) { '●' } else { '○' };
            format!(
                "{mark} {:<8} {:<16} wmo {:>2}  {:>5}°C  {:>4} km/h  {:>4} mm",
                p.id, p.label, p.wmo, p.temp_c, p.wind_kph, p.precip_mm
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn card_line(card: &StatCard, swayed: bool) -> String {
    let indent = if swayed { "   " } else { "  " };
    format!("{indent}{} {:<12} {}", card.accent, card.label, card.value)
}

fn rule(theme: ThemeKind) -> String {
    let ch = match theme {
        ThemeKind::Warm => '═',
        ThemeKind::Cold => '─',
        ThemeKind::Neutral => '┄',
    };
    std::iter::repeat_n(ch, WIDTH).collect()
}

fn theme_mark(theme: ThemeKind) -> &'static str {
    match theme {
        ThemeKind::Warm => "☀",
        ThemeKind::Cold => "❄",
        ThemeKind::Neutral => "◌",
    }
}

fn overlay_art(overlay: Overlay) -> [String; 2] {
    let (a, b) = match overlay {
        Overlay::Rain => ("╱ ", " ╱"),
        Overlay::Fog => ("░▒", "▒░"),
    };
    [a.repeat(WIDTH / 2), b.repeat(WIDTH / 2)]
}
