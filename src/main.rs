// Entrypoint for the weather app.
// - Makes sure an API key exists before going full-screen.
// - Hands a weather client and the credential store to the UI loop.

use anyhow::Context;
use weather_tui::terminal::CrosstermTerminal;
use weather_tui::ui::{self, App};
use weather_tui::{Config, CredentialStore, WeatherClient};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::default();
    let store = CredentialStore::new(config.credential_path.clone());
    store.prompt().context("Failed to set up the API key")?;

    let client = WeatherClient::from_config(&config)?;

    // The guard restores the terminal when it goes out of scope.
    let mut terminal = CrosstermTerminal::enter()?;
    ui::run(&mut terminal, &mut App::new(), &client, &store)?;
    Ok(())
}
