use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::WindSpeed;

pub const WARM_AT_C: f64 = 24.0;
pub const COLD_AT_C: f64 = 8.0;

/// Stat cards wobble above this speed.
pub const WINDY_ABOVE_MPS: f64 = 7.0;

/// The god-mode scene sways above this speed.
pub const SWAY_ABOVE_KPH: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    Warm,
    Cold,
    Neutral,
}

impl ThemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeKind::Warm => "warm",
            ThemeKind::Cold => "cold",
            ThemeKind::Neutral => "neutral",
        }
    }
}

impl fmt::Display for ThemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both thresholds are inclusive; NaN and missing temperatures are neutral.
pub fn select_theme(temp_c: Option<f64>) -> ThemeKind {
    match temp_c {
        Some(t) if t >= WARM_AT_C => ThemeKind::Warm,
        Some(t) if t <= COLD_AT_C => ThemeKind::Cold,
        _ => ThemeKind::Neutral,
    }
}

pub fn is_windy(wind: Option<WindSpeed>) -> bool {
    wind.is_some_and(|w| w.as_mps() > WINDY_ABOVE_MPS)
}

pub fn scene_sways(wind: Option<WindSpeed>) -> bool {
    wind.is_some_and(|w| w.as_kph() > SWAY_ABOVE_KPH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_boundaries() {
        assert_eq!(select_theme(Some(24.0)), ThemeKind::Warm);
        assert_eq!(select_theme(Some(23.999)), ThemeKind::Neutral);
        assert_eq!(select_theme(Some(8.0)), ThemeKind::Cold);
        assert_eq!(select_theme(Some(8.001)), ThemeKind::Neutral);
        assert_eq!(select_theme(None), ThemeKind::Neutral);
    }

    #[test]
    fn theme_extremes() {
        assert_eq!(select_theme(Some(45.0)), ThemeKind::Warm);
        assert_eq!(select_theme(Some(-30.0)), ThemeKind::Cold);
        assert_eq!(select_theme(Some(f64::NAN)), ThemeKind::Neutral);
    }

    #[test]
    fn windy_threshold_is_exclusive() {
        assert!(!is_windy(Some(WindSpeed::MetersPerSecond(7.0))));
        assert!(is_windy(Some(WindSpeed::MetersPerSecond(7.001))));
        assert!(!is_windy(None));
    }

    #[test]
    fn windy_reads_meters_per_second_only() {
        // 20 km/h is ~5.6 m/s: not windy even though the raw value exceeds 7.
        assert!(!is_windy(Some(WindSpeed::KilometersPerHour(20.0))));
        assert!(is_windy(Some(WindSpeed::KilometersPerHour(40.0))));
    }

    #[test]
    fn scene_sways_above_25_kph() {
        assert!(!scene_sways(Some(WindSpeed::KilometersPerHour(25.0))));
        assert!(scene_sways(Some(WindSpeed::KilometersPerHour(40.0))));
        assert!(scene_sways(Some(WindSpeed::MetersPerSecond(8.0))));
        assert!(!scene_sways(None));
    }
}
