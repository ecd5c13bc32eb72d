use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inquire::{Select, Text};
use tracing::info;
use weatherflow_core::{
    BackendClient, Completion, Config, Coordinates, GeolocationMode, ManualField, Place, Preset, SceneView,
    Session, WeatherDataSource, WeatherState,
    location::{self, geolocator_from_config},
    preset::{apply_edit, initial_manual_state},
};

use crate::render::{self, Header};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherflow", version, about = "Weather dashboard with a manual god mode")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show live weather for your location, a city, or coordinates.
    Live(LiveArgs),

    /// List places matching a city name.
    Search {
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Set the weather yourself and watch the scene react. No network calls.
    God(GodArgs),

    /// List the god-mode presets.
    Presets,

    /// Update the stored configuration.
    Configure {
        /// Backend base URL, e.g. "http://localhost:8000".
        #[arg(long)]
        backend_url: Option<String>,

        /// Home coordinates as "lat,lon"; switches geolocation to "home".
        #[arg(long, allow_hyphen_values = true)]
        home: Option<Coordinates>,

        /// Geolocation mode: ip, home or off.
        #[arg(long)]
        geolocation: Option<String>,

        /// Print the effective configuration instead of changing it.
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Args)]
pub struct LiveArgs {
    /// City to search for instead of geolocating.
    #[arg(long, conflicts_with = "at")]
    pub city: Option<String>,

    /// Explicit coordinates as "lat,lon".
    #[arg(long, allow_hyphen_values = true)]
    pub at: Option<Coordinates>,

    /// Take the first search result instead of asking.
    #[arg(long)]
    pub first: bool,

    /// Keep prompting for new cities after each update.
    #[arg(short, long)]
    pub interactive: bool,

    /// Print the weather state and scene as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GodArgs {
    /// Start from a preset (see `weatherflow presets`).
    #[arg(long)]
    pub preset: Option<String>,

    /// Field edits applied in order, e.g. `--set temp=31 --set wmo=95`.
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub edits: Vec<String>,

    /// Edit interactively.
    #[arg(short, long)]
    pub interactive: bool,

    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Live(args) => live(args).await,
            Command::Search { query, json } => search(&query, json).await,
            Command::God(args) => god(args),
            Command::Presets => {
                println!("{}", render::preset_list(&initial_manual_state()));
                Ok(())
            }
            Command::Configure { backend_url, home, geolocation, show } => {
                configure(backend_url, home, geolocation, show)
            }
        }
    }
}

async fn live(args: LiveArgs) -> Result<()> {
    let config = Config::resolve()?;
    let source = BackendClient::from_config(&config)?;
    info!(backend = source.base_url(), "live dashboard");

    let start = match (args.at, args.city.as_deref()) {
        (Some(at), _) => Some((at, None)),
        (None, Some(query)) => choose_place(&source, query, args.first)
            .await?
            .map(|p| (p.coordinates(), Some(p.to_string()))),
        (None, None) => {
            let geolocator = geolocator_from_config(&config)?;
            Some((location::resolve_initial(geolocator.as_deref()).await, None))
        }
    };

    let interactive = args.interactive;
    let next_query = || -> Result<Option<String>> {
        if !interactive {
            return Ok(None);
        }
        Ok(Some(Text::new("Search city (empty to quit):").prompt()?))
    };

    run_live(&source, start, args.first, next_query, |session, place| {
        print_live(session, place, args.json)
    })
    .await?;

    Ok(())
}

/// Drive the live dashboard: every location published on the session's
/// channel is fetched, and drawn once its weather has applied. `next_query`
/// supplies follow-up searches; `None` ends the loop.
async fn run_live(
    source: &dyn WeatherDataSource,
    start: Option<(Coordinates, Option<String>)>,
    first: bool,
    mut next_query: impl FnMut() -> Result<Option<String>>,
    mut draw: impl FnMut(&Session, Option<&str>) -> Result<()>,
) -> Result<Session> {
    let mut session = Session::new();
    let mut selections = session.locations().subscribe();

    // Name of the place waiting on the channel.
    let mut pending_name = None;

    if let Some((at, name)) = start {
        pending_name = name;
        session.locations().publish(at);
    }

    while let Some(at) = selections.take() {
        let name = pending_name.take();

        if session.refresh(source, at).await == Completion::Applied {
            draw(&session, name.as_deref())?;
        }

        let Some(query) = next_query()? else {
            break;
        };
        match choose_place(source, &query, first).await? {
            Some(place) => {
                pending_name = Some(place.to_string());
                session.locations().publish(place.coordinates());
            }
            None => break,
        }
    }

    Ok(session)
}

fn print_live(session: &Session, place_name: Option<&str>, json: bool) -> Result<()> {
    let Some(view) = session.state().map(SceneView::derive) else {
        return Ok(());
    };

    if json {
        let out = serde_json::json!({
            "coordinates": session.coordinates(),
            "state": session.state(),
            "scene": view,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let location = match (place_name, session.coordinates()) {
        (Some(name), Some(at)) => Some(format!("{name} ({at})")),
        (None, Some(at)) => Some(at.to_string()),
        (name, None) => name.map(str::to_string),
    };

    let header = Header { title: "WeatherFlow", location, updated_at: session.updated_at() };
    println!("{}", render::dashboard(&header, &view));
    Ok(())
}

async fn search(query: &str, json: bool) -> Result<()> {
    let config = Config::resolve()?;
    let source = BackendClient::from_config(&config)?;
    let places = location::search(&source, query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&places)?);
    } else if places.is_empty() {
        println!("No places match '{}'.", query.trim());
    } else {
        for place in &places {
            println!("{place} ({})", place.coordinates());
        }
    }

    Ok(())
}

/// Geocode `query` and pick a result: the only one, the first one, or the one
/// the user selects.
async fn choose_place(
    source: &dyn WeatherDataSource,
    query: &str,
    first: bool,
) -> Result<Option<Place>> {
    let mut places = location::search(source, query).await?;

    if places.is_empty() {
        if !query.trim().is_empty() {
            println!("No places match '{}'.", query.trim());
        }
        return Ok(None);
    }

    if first || places.len() == 1 {
        return Ok(Some(places.swap_remove(0)));
    }

    let choice = Select::new("Choose a location:", places).prompt()?;
    Ok(Some(choice))
}

fn god(args: GodArgs) -> Result<()> {
    let mut session = Session::new();

    let start = match &args.preset {
        Some(id) => Preset::by_id(id)?.to_state(),
        None => initial_manual_state(),
    };
    session.replace(start);

    for edit in &args.edits {
        let (field, value) = edit
            .split_once('=')
            .with_context(|| format!("Expected FIELD=VALUE, got '{edit}'"))?;
        let field: ManualField = field.parse()?;
        let next = apply_edit(current(&session)?, field, value);
        session.replace(next);
    }

    print_god(&session, args.json)?;

    if args.interactive {
        edit_interactively(&mut session, args.json)?;
    }

    Ok(())
}

fn edit_interactively(session: &mut Session, json: bool) -> Result<()> {
    const PRESET: &str = "Load preset";
    const DONE: &str = "Done";

    loop {
        let mut options = vec![PRESET.to_string()];
        options.extend(ManualField::all().iter().map(ManualField::to_string));
        options.push(DONE.to_string());

        let picked = Select::new("Change:", options).prompt()?;

        let next = if picked == PRESET {
            Select::new("Preset:", Preset::all().to_vec()).prompt()?.to_state()
        } else if let Some(field) = ManualField::all().iter().find(|f| f.to_string() == picked) {
            let state = current(session)?;
            let raw = Text::new(field.label())
                .with_default(&field.current(state))
                .prompt()?;
            apply_edit(state, *field, &raw)
        } else {
            return Ok(());
        };

        session.replace(next);
        print_god(session, json)?;
    }
}

fn current(session: &Session) -> Result<&WeatherState> {
    session.state().context("God mode has no state")
}

fn print_god(session: &Session, json: bool) -> Result<()> {
    let state = current(session)?;
    let view = SceneView::derive(state);

    if json {
        let out = serde_json::json!({ "state": state, "scene": view });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let header = Header {
        title: "WeatherFlow · God Mode",
        location: None,
        updated_at: session.updated_at(),
    };
    println!("{}", render::dashboard(&header, &view));
    println!("{}", render::preset_list(state));
    Ok(())
}

fn configure(
    backend_url: Option<String>,
    home: Option<Coordinates>,
    geolocation: Option<String>,
    show: bool,
) -> Result<()> {
    if show {
        let config = Config::resolve()?;
        println!("config file:  {}", Config::config_file_path()?.display());
        println!("backend url:  {}", config.backend_url());
        println!("timeout:      {}s", config.timeout().as_secs());
        println!("geolocation:  {}", config.geolocation);
        if let Some(home) = config.home {
            println!("home:         {home}");
        }
        return Ok(());
    }

    let mut config = Config::load()?;

    if let Some(url) = backend_url {
        config.set_backend_url(&url)?;
    }
    if let Some(home) = home {
        config.set_home(home);
    }
    if let Some(mode) = geolocation {
        config.geolocation = GeolocationMode::try_from(mode.as_str())?;
    }

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use clap::CommandFactory;
    use std::sync::Mutex;
    use weatherflow_core::CurrentWeather;

    const NYC: Coordinates = Coordinates { lat: 40.7128, lon: -74.006 };
    const OSLO: Coordinates = Coordinates { lat: 59.9139, lon: 10.7522 };

    /// Knows one city (Oslo) and reports the latitude as the temperature.
    #[derive(Debug, Default)]
    struct CityBackend {
        down: bool,
        fetched: Mutex<Vec<Coordinates>>,
    }

    #[async_trait]
    impl WeatherDataSource for CityBackend {
        async fn current_weather(&self, at: Coordinates) -> Result<CurrentWeather> {
            self.fetched.lock().unwrap().push(at);
            if self.down {
                return Err(anyhow!("backend down"));
            }
            Ok(CurrentWeather { temperature: Some(at.lat), weather_code: Some(0), ..Default::default() })
        }

        async fn geocode(&self, query: &str) -> Result<Vec<Place>> {
            if !query.trim().eq_ignore_ascii_case("oslo") {
                return Ok(Vec::new());
            }
            Ok(vec![Place {
                name: "Oslo".into(),
                admin1: None,
                country: Some("Norway".into()),
                latitude: OSLO.lat,
                longitude: OSLO.lon,
            }])
        }
    }

    fn queries(list: &[&str]) -> impl FnMut() -> Result<Option<String>> {
        let mut list: Vec<String> = list.iter().rev().map(|q| q.to_string()).collect();
        move || Ok(list.pop())
    }

    #[tokio::test]
    async fn live_fetches_start_then_searched_city_in_order() {
        let backend = CityBackend::default();
        let mut drawn = Vec::new();

        let session = run_live(&backend, Some((NYC, None)), false, queries(&["oslo"]), |s, place| {
            drawn.push((s.coordinates(), place.map(str::to_string)));
            Ok(())
        })
        .await
        .expect("loop runs");

        assert_eq!(*backend.fetched.lock().unwrap(), vec![NYC, OSLO]);
        assert_eq!(
            drawn,
            vec![(Some(NYC), None), (Some(OSLO), Some("Oslo • Norway".to_string()))]
        );
        assert_eq!(session.state().and_then(|s| s.temperature_c), Some(OSLO.lat));
    }

    #[tokio::test]
    async fn live_stops_on_unknown_city() {
        let backend = CityBackend::default();
        let mut draws = 0;

        run_live(&backend, Some((NYC, None)), false, queries(&["atlantis", "oslo"]), |_, _| {
            draws += 1;
            Ok(())
        })
        .await
        .expect("loop runs");

        assert_eq!(*backend.fetched.lock().unwrap(), vec![NYC]);
        assert_eq!(draws, 1);
    }

    #[tokio::test]
    async fn failed_fetch_draws_no_dashboard() {
        let backend = CityBackend { down: true, ..Default::default() };
        let mut draws = 0;

        let session = run_live(&backend, Some((NYC, None)), false, queries(&["oslo"]), |_, _| {
            draws += 1;
            Ok(())
        })
        .await
        .expect("failures are not fatal");

        assert_eq!(*backend.fetched.lock().unwrap(), vec![NYC, OSLO]);
        assert_eq!(draws, 0);
        assert!(session.state().is_none());
        assert!(session.last_error().unwrap().contains("backend down"));
    }

    #[tokio::test]
    async fn no_start_location_fetches_nothing() {
        let backend = CityBackend::default();

        run_live(&backend, None, false, queries(&["oslo"]), |_, _| Ok(()))
            .await
            .expect("loop runs");

        assert!(backend.fetched.lock().unwrap().is_empty());
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn live_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["weatherflow", "live", "--at", "-33.86,151.21"])
            .expect("parses");

        let Command::Live(args) = cli.command else {
            panic!("expected live command");
        };
        assert_eq!(args.at, Some(Coordinates { lat: -33.86, lon: 151.21 }));
    }

    #[test]
    fn live_rejects_city_with_coordinates() {
        let res = Cli::try_parse_from(["weatherflow", "live", "--at", "1,2", "--city", "Oslo"]);
        assert!(res.is_err());
    }

    #[test]
    fn god_collects_edits_in_order() {
        let cli = Cli::try_parse_from([
            "weatherflow", "god", "--preset", "storm", "--set", "temp=31", "--set", "wmo=0",
        ])
        .expect("parses");

        let Command::God(args) = cli.command else {
            panic!("expected god command");
        };
        assert_eq!(args.preset.as_deref(), Some("storm"));
        assert_eq!(args.edits, ["temp=31", "wmo=0"]);
    }

    #[test]
    fn god_applies_preset_then_edits() {
        let args = GodArgs {
            preset: Some("storm".into()),
            edits: vec!["temp=31".into()],
            interactive: false,
            json: true,
        };
        assert!(god(args).is_ok());
    }

    #[test]
    fn god_rejects_unknown_preset_and_field() {
        let args = GodArgs { preset: Some("hail".into()), edits: vec![], interactive: false, json: true };
        assert!(god(args).unwrap_err().to_string().contains("Unknown preset"));

        let args = GodArgs { preset: None, edits: vec!["humidity=3".into()], interactive: false, json: true };
        assert!(god(args).unwrap_err().to_string().contains("Unknown field"));

        let args = GodArgs { preset: None, edits: vec!["temp".into()], interactive: false, json: true };
        assert!(god(args).unwrap_err().to_string().contains("FIELD=VALUE"));
    }
}
