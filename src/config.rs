use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_WEATHER_API_URL: &str = "https://wttr.in";
const DEFAULT_CITY: &str = "Madrid";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub weather_api_url: String,
    pub default_city: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let weather_api_url = lookup("WEATHER_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string());
        let default_city = lookup("WEATHER_DEFAULT_CITY")
            .map(|city| city.trim().to_string())
            .filter(|city| !city.is_empty())
            .unwrap_or_else(|| DEFAULT_CITY.to_string());

        Self {
            port,
            data_path,
            weather_api_url,
            default_city,
        }
    }
}
