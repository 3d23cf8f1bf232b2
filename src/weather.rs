use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather service answered {0}")]
    Status(reqwest::StatusCode),
    #[error("weather response was not understood: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no current conditions for {0}")]
    NoConditions(String),
    #[error("invalid weather service url: {0}")]
    BaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity: u8,
    pub wind_kmph: f64,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct ReportWire {
    #[serde(default)]
    current_condition: Vec<ConditionWire>,
}

// wttr.in sends every number as a string.
#[derive(Debug, Deserialize)]
struct ConditionWire {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC", default)]
    feels_like_c: Option<String>,
    #[serde(default)]
    humidity: Option<String>,
    #[serde(rename = "windspeedKmph", default)]
    windspeed_kmph: Option<String>,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<ValueWire>,
}

#[derive(Debug, Deserialize)]
struct ValueWire {
    value: String,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: Url,
}

impl WeatherClient {
    pub fn new(base_url: &str) -> Result<Self, WeatherError> {
        let base_url =
            Url::parse(base_url).map_err(|e| WeatherError::BaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(WeatherError::BaseUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("task_widget/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// `{base}/{city}?format=j1`, with the city encoded as one path segment.
    pub fn report_url(&self, city: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(city);
        }
        url.query_pairs_mut().clear().append_pair("format", "j1");
        url
    }

    pub async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let resp = self.client.get(self.report_url(city)).send().await?;
        if !resp.status().is_success() {
            return Err(WeatherError::Status(resp.status()));
        }
        let body = resp.text().await?;
        parse_report(city, &body)
    }
}

pub fn parse_report(city: &str, body: &str) -> Result<WeatherReport, WeatherError> {
    let wire: ReportWire = serde_json::from_str(body)?;
    let condition = wire
        .current_condition
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::NoConditions(city.to_string()))?;
    let temperature_c = number(&condition.temp_c)
        .ok_or_else(|| WeatherError::NoConditions(city.to_string()))?;

    Ok(WeatherReport {
        city: city.to_string(),
        temperature_c,
        feels_like_c: condition
            .feels_like_c
            .as_deref()
            .and_then(number)
            .unwrap_or(temperature_c),
        humidity: condition
            .humidity
            .as_deref()
            .and_then(|h| h.trim().parse().ok())
            .unwrap_or(0),
        wind_kmph: condition
            .windspeed_kmph
            .as_deref()
            .and_then(number)
            .unwrap_or(0.0),
        description: condition
            .weather_desc
            .into_iter()
            .next()
            .map(|desc| desc.value.trim().to_string())
            .unwrap_or_default(),
    })
}

/// Trims a city name typed by the user. `None` when nothing is left.
pub fn normalize_city(raw: &str) -> Option<String> {
    let city = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if city.is_empty() { None } else { Some(city) }
}

fn number(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}
