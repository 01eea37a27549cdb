// Configuration: where the API key lives and which endpoint to query.
// There are no flags or environment variables; `Config::default()` is what
// the binary uses and tests build their own values.

use std::path::PathBuf;

/// File name of the persisted API key inside the home directory.
pub const CREDENTIAL_FILE: &str = ".weather_api_key";

/// Current-weather-by-city endpoint of OpenWeatherMap.
pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub credential_path: PathBuf,
    pub endpoint: String,
}

impl Config {
    /// Default location of the credential file: the user's home directory,
    /// or the current directory when no home can be determined.
    pub fn default_credential_path() -> PathBuf {
        let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.join(CREDENTIAL_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            credential_path: Self::default_credential_path(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}
