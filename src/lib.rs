// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive app.
//
// Module responsibilities:
// - `config`: default locations (credential file, weather endpoint).
// - `credential`: reads, writes and first-run prompting of the API key.
// - `api`: the weather HTTP client and its result/error types.
// - `ui`: the menu state machine, its frames and the main loop.
// - `terminal`: the crossterm surface the main loop draws on.
pub mod api;
pub mod config;
pub mod credential;
pub mod terminal;
pub mod ui;

pub use api::{FetchError, FetchErrorKind, TemperatureUnit, WeatherClient, WeatherRecord, WeatherService};
pub use config::Config;
pub use credential::{CredentialError, CredentialStore};
