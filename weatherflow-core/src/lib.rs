//! Core library for the `weatherflow` dashboard.
//!
//! This crate defines:
//! - Weather code classification and temperature theming
//! - God-mode presets and manual edits
//! - The backend client and location resolution
//! - The session state container and the scene a renderer draws
//!
//! It is used by `weatherflow-cli`, but can also back other front-ends.

pub mod classify;
pub mod config;
pub mod location;
pub mod model;
pub mod preset;
pub mod scene;
pub mod session;
pub mod source;
pub mod theme;

pub use classify::{Classification, CodeTable, EffectKind, classify};
pub use config::{Config, GeolocationMode};
pub use location::{FALLBACK, Geolocator, resolve_initial};
pub use model::{Coordinates, CurrentWeather, Place, Source, WeatherState, WindSpeed};
pub use preset::{ManualField, Preset};
pub use scene::SceneView;
pub use session::{Completion, Session};
pub use source::{BackendClient, WeatherDataSource};
pub use theme::{ThemeKind, is_windy, select_theme};
