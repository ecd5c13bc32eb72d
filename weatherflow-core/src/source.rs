use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::{
    Config,
    model::{Coordinates, CurrentWeather, GeocodeResponse, Place},
};

/// Backend serving current weather and geocoding.
#[async_trait]
pub trait WeatherDataSource: Send + Sync + Debug {
    async fn current_weather(&self, at: Coordinates) -> Result<CurrentWeather>;

    async fn geocode(&self, query: &str) -> Result<Vec<Place>>;
}

/// HTTP client for the WeatherFlow backend (`/weather`, `/geocode`).
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.backend_url(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path);
        debug!(%url, ?query, "requesting {what}");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send {what} request to {url}"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "{what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
    }
}

#[async_trait]
impl WeatherDataSource for BackendClient {
    async fn current_weather(&self, at: Coordinates) -> Result<CurrentWeather> {
        self.get_json(
            "weather",
            "weather",
            &[("lat", at.lat.to_string()), ("lon", at.lon.to_string())],
        )
        .await
    }

    async fn geocode(&self, query: &str) -> Result<Vec<Place>> {
        let parsed: GeocodeResponse =
            self.get_json("geocode", "geocode", &[("q", query.to_string())]).await?;

        Ok(parsed.results.unwrap_or_default())
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = BackendClient::with_client("http://localhost:8000/", Client::new());
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.endpoint("weather"), "http://localhost:8000/weather");
    }

    #[test]
    fn from_config_uses_configured_url() {
        let cfg = Config { backend_url: Some("https://wx.example.com".into()), ..Default::default() };
        let client = BackendClient::from_config(&cfg).expect("client builds");
        assert_eq!(client.endpoint("geocode"), "https://wx.example.com/geocode");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let short = "bad gateway";
        assert_eq!(truncate_body(short), short);

        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_millis(500))
            .expect("client builds");

        let err = client
            .current_weather(Coordinates { lat: 0.0, lon: 0.0 })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to send weather request"));
    }
}
