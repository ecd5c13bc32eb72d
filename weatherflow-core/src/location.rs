//! Where the live dashboard points: initial geolocation and city search.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    config::{Config, GeolocationMode},
    model::{Coordinates, Place},
    source::{WeatherDataSource, truncate_body},
};

/// New York City, used whenever the platform cannot tell us where we are.
pub const FALLBACK: Coordinates = Coordinates { lat: 40.7128, lon: -74.0060 };

const IP_LOOKUP_URL: &str = "https://ipapi.co/json/";

/// Platform capability that can report the current position.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates>;
}

/// Resolve the starting coordinates, falling back to [`FALLBACK`] when the
/// capability is missing or fails. Queried once; no retry.
pub async fn resolve_initial(geolocator: Option<&dyn Geolocator>) -> Coordinates {
    let Some(geolocator) = geolocator else {
        debug!("no geolocation capability, using fallback");
        return FALLBACK;
    };

    match geolocator.locate().await {
        Ok(at) => {
            info!(%at, "located");
            at
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "geolocation failed, using fallback");
            FALLBACK
        }
    }
}

/// Geocode a free-text city query. Blank queries return nothing without
/// touching the network.
pub async fn search(source: &dyn WeatherDataSource, query: &str) -> Result<Vec<Place>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let places = source
        .geocode(query)
        .await
        .with_context(|| format!("Failed to search for '{query}'"))?;

    debug!(query, results = places.len(), "geocoded");
    Ok(places)
}

/// Build the geolocation capability selected in the config.
pub fn geolocator_from_config(config: &Config) -> Result<Option<Box<dyn Geolocator>>> {
    let boxed: Box<dyn Geolocator> = match config.geolocation {
        GeolocationMode::Off => return Ok(None),
        GeolocationMode::Home => {
            let home = config.home.ok_or_else(|| {
                anyhow!(
                    "Geolocation mode is 'home' but no home coordinates are configured.\n\
                     Hint: run `weatherflow configure --home <lat,lon>`."
                )
            })?;
            Box::new(FixedGeolocator(home))
        }
        GeolocationMode::Ip => Box::new(IpGeolocator::new(config.timeout())?),
    };

    Ok(Some(boxed))
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates> {
        Ok(self.0)
    }
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl IpGeolocator {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { url: IP_LOOKUP_URL.to_string(), http })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("Failed to send IP geolocation request")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read IP geolocation response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "IP geolocation failed with status {}: {}",
                status,
                truncate_body(&body)
            ));
        }

        parse_ip_lookup(&body)
    }
}

fn parse_ip_lookup(body: &str) -> Result<Coordinates> {
    let parsed: IpLookupResponse =
        serde_json::from_str(body).context("Failed to parse IP geolocation JSON")?;

    match (parsed.latitude, parsed.longitude) {
        (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)?),
        _ => Err(anyhow!("IP geolocation response has no coordinates")),
    }
}
