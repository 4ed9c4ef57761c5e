//! Open-Meteo adapter for the `WeatherSource` port.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::{Coordinates, WeatherSnapshot},
    ports::WeatherSource,
    Error, Result,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// Build the forecast request URI for `at`.
///
/// Coordinates are rendered with exactly two decimals; only the hourly
/// temperature series is requested.
pub fn forecast_url(endpoint: &str, at: Coordinates) -> String {
    format!(
        "{endpoint}?latitude={:.2}&longitude={:.2}&hourly=temperature_2m",
        at.latitude, at.longitude
    )
}

/// Shared reqwest client construction with a bounded per-request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("http client build error: {e}")))
}

#[derive(Clone, Debug)]
pub struct OpenMeteoClient {
    endpoint: String,
    http: reqwest::Client,
}

impl OpenMeteoClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            http: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch(&self, at: Coordinates) -> Result<WeatherSnapshot> {
        let url = forecast_url(&self.endpoint, at);
        tracing::debug!(%url, "fetching forecast");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("open-meteo request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Fetch(format!(
                "open-meteo returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("open-meteo body read error: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| Error::Decode(format!("open-meteo json error: {e}")))
    }
}
