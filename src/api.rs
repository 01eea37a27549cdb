// Weather client: builds the current-weather URL for a city, performs one
// blocking GET and decodes the handful of fields the UI shows. Values come
// back in whatever unit was requested; nothing is converted locally.

use crate::config::Config;
use anyhow::Context;
use log::debug;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Unit system requested from the remote API. Session-scoped, not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemperatureUnit {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl TemperatureUnit {
    /// Order matches the unit selection screen.
    pub const ALL: [TemperatureUnit; 3] = [
        TemperatureUnit::Metric,
        TemperatureUnit::Imperial,
        TemperatureUnit::Standard,
    ];

    /// Value of the `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Metric => "metric",
            TemperatureUnit::Imperial => "imperial",
            TemperatureUnit::Standard => "standard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemperatureUnit::Metric => "Celsius (Metric)",
            TemperatureUnit::Imperial => "Fahrenheit (Imperial)",
            TemperatureUnit::Standard => "Kelvin (Standard)",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Metric => "°C",
            TemperatureUnit::Imperial => "°F",
            TemperatureUnit::Standard => "K",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one successful query. Built per request and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub city: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Request,
    Network,
    Status,
    Decode,
}

/// Everything that can go wrong on the weather path. The `Display` text is
/// what the user sees, so it stays a single line.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid weather request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Network(String),
    #[error("HTTP Error {code}: {reason}")]
    Status { code: u16, reason: String },
    #[error("Failed to parse weather response: {0}")]
    Decode(String),
    #[error("Weather response is missing `{0}`")]
    MissingField(&'static str),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidRequest(_) => FetchErrorKind::Request,
            FetchError::Network(_) => FetchErrorKind::Network,
            FetchError::Status { .. } => FetchErrorKind::Status,
            FetchError::Decode(_) | FetchError::MissingField(_) => FetchErrorKind::Decode,
        }
    }
}

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// The one HTTP operation the client needs. Swapped out in tests.
pub trait Transport {
    fn get(&self, url: &Url) -> Result<RawResponse, FetchError>;
}

/// Blocking reqwest client with the library's default timeouts.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ReqwestTransport { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &Url) -> Result<RawResponse, FetchError> {
        let res = self
            .client
            .get(url.clone())
            .send()
            .map_err(network_error)?;
        let status = res.status().as_u16();
        let body = res.text().map_err(network_error)?;
        Ok(RawResponse { status, body })
    }
}

/// reqwest puts the full URL, API key included, into its messages.
fn network_error(e: reqwest::Error) -> FetchError {
    FetchError::Network(e.without_url().to_string())
}

/// Anything that can answer "what is the weather in this city". The UI only
/// depends on this, not on HTTP.
pub trait WeatherService {
    fn fetch_weather(
        &self,
        city: &str,
        unit: TemperatureUnit,
        credential: &str,
    ) -> Result<WeatherRecord, FetchError>;
}

pub struct WeatherClient<T = ReqwestTransport> {
    transport: T,
    endpoint: String,
}

impl WeatherClient<ReqwestTransport> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(WeatherClient::with_transport(
            ReqwestTransport::new()?,
            config.endpoint.clone(),
        ))
    }
}

impl<T: Transport> WeatherClient<T> {
    pub fn with_transport(transport: T, endpoint: impl Into<String>) -> Self {
        WeatherClient {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// `<endpoint>?q=<city>&appid=<credential>&units=<unit>`; the city is
    /// form-encoded by the URL layer.
    pub fn request_url(
        &self,
        city: &str,
        unit: TemperatureUnit,
        credential: &str,
    ) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.endpoint,
            &[("q", city), ("appid", credential), ("units", unit.as_str())],
        )
        .map_err(|e| FetchError::InvalidRequest(e.to_string()))
    }
}

impl<T: Transport> WeatherService for WeatherClient<T> {
    fn fetch_weather(
        &self,
        city: &str,
        unit: TemperatureUnit,
        credential: &str,
    ) -> Result<WeatherRecord, FetchError> {
        let url = self.request_url(city, unit, credential)?;
        debug!("GET {} (q={city}, units={unit})", self.endpoint);

        let res = self.transport.get(&url)?;
        if !(200..300).contains(&res.status) {
            debug!("Weather request failed with {}: {}", res.status, res.body);
            let reason = StatusCode::from_u16(res.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown");
            return Err(FetchError::Status {
                code: res.status,
                reason: reason.to_string(),
            });
        }

        decode_record(&res.body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    name: String,
    main: OwMain,
    weather: Vec<OwCondition>,
}

fn decode_record(body: &str) -> Result<WeatherRecord, FetchError> {
    let parsed: OwCurrent =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let condition = parsed
        .weather
        .first()
        .map(|w| capitalize(&w.description))
        .ok_or(FetchError::MissingField("weather[0].description"))?;

    Ok(WeatherRecord {
        city: parsed.name,
        temperature: parsed.main.temp,
        feels_like: parsed.main.feels_like,
        condition,
    })
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
