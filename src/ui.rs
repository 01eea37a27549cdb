// UI layer: the menu flow as a small state machine.
//
// `App::handle` maps one input event to the next screen and, when work is
// needed, a `Command` for the runner. `App::view` turns the current screen
// into a `Frame` for a given terminal size. Neither does any I/O, so the
// whole flow can be driven from tests.
// `run` glues them to a `Terminal`, a `WeatherService` and the credential
// store.

use crate::api::{TemperatureUnit, WeatherRecord, WeatherService};
use crate::credential::{CredentialError, CredentialStore};
use anyhow::Result;
use log::{debug, info};

pub const MAIN_MENU: [&str; 4] = [
    "Check Weather",
    "Select Temperature Unit",
    "Change API Key",
    "Exit",
];

/// Longest line accepted by the city and API key prompts.
pub const MAX_INPUT: usize = 40;

const WELCOME: &str = "Welcome to the Weather App! Choose an option below:";
const NAV_HINT: &str = "(Use arrow keys to navigate and Enter to select)";
const UNIT_TITLE: &str = "Select a temperature unit:";
const PRESS_ANY_KEY: &str = "Press any key to return to the menu.";
const CREDENTIAL_UPDATED: &str = "API Key updated successfully.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Up,
    Down,
    Enter,
    /// A full line typed at a prompt.
    Line(String),
    /// Any other key.
    Other,
    Resize(u16, u16),
}

/// What the runner has to read next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Key,
    Line,
}

/// Highlight position over a fixed list of options. Clamps at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Menu {
    len: usize,
    selected: usize,
}

impl Menu {
    pub fn new(len: usize) -> Self {
        Menu { len, selected: 0 }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.selected + 1 < self.len {
            self.selected += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    MainMenu,
    CityPrompt,
    WeatherResult {
        unit: TemperatureUnit,
        outcome: Result<WeatherRecord, String>,
    },
    UnitSelect(Menu),
    CredentialPrompt,
    CredentialResult(String),
    Exited,
}

impl Screen {
    pub fn input_mode(&self) -> InputMode {
        match self {
            Screen::CityPrompt | Screen::CredentialPrompt => InputMode::Line,
            _ => InputMode::Key,
        }
    }
}

/// Work the runner performs on behalf of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchWeather { city: String, unit: TemperatureUnit },
    SetCredential(String),
}

/// Result of a `Command`, fed back through [`App::complete`].
#[derive(Debug)]
pub enum Outcome {
    Weather(Result<WeatherRecord, String>),
    Credential(Result<(), CredentialError>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct App {
    screen: Screen,
    main_menu: Menu,
    unit: TemperatureUnit,
}

impl Default for App {
    fn default() -> Self {
        App::new()
    }
}

impl App {
    pub fn new() -> Self {
        App {
            screen: Screen::MainMenu,
            main_menu: Menu::new(MAIN_MENU.len()),
            unit: TemperatureUnit::default(),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    #[cfg(test)]
    pub(crate) fn main_menu(&self) -> Menu {
        self.main_menu
    }

    pub fn input_mode(&self) -> InputMode {
        self.screen.input_mode()
    }

    pub fn is_exited(&self) -> bool {
        self.screen == Screen::Exited
    }

    /// Apply one input event. Returns a command when the new state needs
    /// the outside world (network or disk).
    pub fn handle(&mut self, event: Event) -> Option<Command> {
        if let Event::Resize(..) = event {
            // Nothing to update, the next draw re-centres.
            return None;
        }

        match &mut self.screen {
            Screen::MainMenu => match event {
                Event::Up => self.main_menu.up(),
                Event::Down => self.main_menu.down(),
                Event::Enter => {
                    self.screen = match self.main_menu.selected() {
                        0 => Screen::CityPrompt,
                        1 => Screen::UnitSelect(Menu::new(TemperatureUnit::ALL.len())),
                        2 => Screen::CredentialPrompt,
                        _ => Screen::Exited,
                    };
                    debug!("Main menu -> {:?}", self.screen);
                }
                _ => {}
            },
            Screen::UnitSelect(menu) => match event {
                Event::Up => menu.up(),
                Event::Down => menu.down(),
                Event::Enter => {
                    self.unit = TemperatureUnit::ALL[menu.selected()];
                    info!("Temperature unit set to {}", self.unit);
                    self.screen = Screen::MainMenu;
                }
                _ => {}
            },
            Screen::CityPrompt => {
                if let Event::Line(city) = event {
                    return Some(Command::FetchWeather {
                        city: city.trim().to_string(),
                        unit: self.unit,
                    });
                }
            }
            Screen::CredentialPrompt => {
                if let Event::Line(value) = event {
                    return Some(Command::SetCredential(value));
                }
            }
            Screen::WeatherResult { .. } | Screen::CredentialResult(_) => {
                self.screen = Screen::MainMenu;
            }
            Screen::Exited => {}
        }
        None
    }

    /// Move to the result screen for a finished command.
    pub fn complete(&mut self, outcome: Outcome) {
        self.screen = match outcome {
            Outcome::Weather(outcome) => Screen::WeatherResult {
                unit: self.unit,
                outcome,
            },
            Outcome::Credential(Ok(())) => Screen::CredentialResult(CREDENTIAL_UPDATED.to_string()),
            Outcome::Credential(Err(e)) => Screen::CredentialResult(e.to_string()),
        };
    }

    /// Full frame for a `width` x `height` terminal.
    pub fn view(&self, width: u16, height: u16) -> Frame {
        let mut frame = Frame::default();
        match &self.screen {
            Screen::MainMenu => {
                let (w, h) = (i32::from(width), i32::from(height));
                let base = h / 2 - MAIN_MENU.len() as i32 - 3;
                frame.push(at(base), centre(w, WELCOME), WELCOME);
                frame.push(at(base + 2), centre(w, NAV_HINT), NAV_HINT);
                frame.menu(&MAIN_MENU, self.main_menu.selected(), width, height);
            }
            Screen::UnitSelect(menu) => {
                let labels = TemperatureUnit::ALL.map(|u| u.label());
                let (w, h) = (i32::from(width), i32::from(height));
                let title_row = h / 2 - labels.len() as i32 / 2 - 2;
                frame.push(at(title_row), centre(w, UNIT_TITLE), UNIT_TITLE);
                frame.menu(&labels, menu.selected(), width, height);
            }
            Screen::CityPrompt => {
                frame.push(1, 1, "Enter the city name: ");
                frame.cursor = Some((1, 2));
            }
            Screen::CredentialPrompt => {
                frame.push(1, 1, "Enter a new API key: ");
                frame.cursor = Some((1, 2));
            }
            Screen::WeatherResult { unit, outcome } => {
                match outcome {
                    Ok(record) => {
                        let symbol = unit.symbol();
                        frame.push(1, 1, format!("City: {}", record.city));
                        frame.push(2, 1, format!("Temperature: {}{symbol}", record.temperature));
                        frame.push(3, 1, format!("Feels Like: {}{symbol}", record.feels_like));
                        frame.push(4, 1, format!("Condition: {}", record.condition));
                    }
                    Err(message) => frame.push(6, 1, format!("Error: {message}")),
                }
                frame.push(8, 1, PRESS_ANY_KEY);
            }
            Screen::CredentialResult(message) => {
                frame.push(4, 1, message.clone());
                frame.push(6, 1, PRESS_ANY_KEY);
            }
            Screen::Exited => {}
        }
        frame.clip(width, height);
        frame
    }
}

/// One positioned piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub row: u16,
    pub col: u16,
    pub text: String,
    pub highlight: bool,
}

/// Everything drawn for one screen. Always painted onto a cleared terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<Line>,
    /// Where typed input is echoed, for prompt screens.
    pub cursor: Option<(u16, u16)>,
}

impl Frame {
    fn push(&mut self, row: u16, col: u16, text: impl Into<String>) {
        self.lines.push(Line {
            row,
            col,
            text: text.into(),
            highlight: false,
        });
    }

    /// Options centred on both axes, the selected one highlighted.
    fn menu(&mut self, items: &[&str], selected: usize, width: u16, height: u16) {
        let (w, h) = (i32::from(width), i32::from(height));
        for (index, item) in items.iter().enumerate() {
            let row = h / 2 - items.len() as i32 / 2 + index as i32;
            self.lines.push(Line {
                row: at(row),
                col: centre(w, item),
                text: item.to_string(),
                highlight: index == selected,
            });
        }
    }

    /// Drop what falls below the terminal and cut what runs past its edge.
    fn clip(&mut self, width: u16, height: u16) {
        self.lines.retain(|l| l.row < height && l.col < width);
        for line in &mut self.lines {
            let room = usize::from(width - line.col);
            if line.text.chars().count() > room {
                line.text = line.text.chars().take(room).collect();
            }
        }
        if let Some((col, row)) = self.cursor {
            self.cursor = Some((col.min(width.saturating_sub(1)), row.min(height.saturating_sub(1))));
        }
    }

    /// Whether any line reads exactly `text`.
    #[cfg(test)]
    pub(crate) fn has_line(&self, text: &str) -> bool {
        self.lines.iter().any(|l| l.text == text)
    }
}

fn at(value: i32) -> u16 {
    value.clamp(0, i32::from(u16::MAX)) as u16
}

fn centre(width: i32, text: &str) -> u16 {
    at(width / 2 - text.chars().count() as i32 / 2)
}

/// The full-screen surface the runner talks to.
pub trait Terminal {
    fn size(&self) -> Result<(u16, u16)>;
    fn draw(&mut self, frame: &Frame) -> Result<()>;
    /// Block until the next key (`InputMode::Key`) or a submitted line
    /// (`InputMode::Line`).
    fn read_event(&mut self, mode: InputMode) -> Result<Event>;
}

/// Main loop: draw, read, update, until the user picks Exit.
pub fn run<T, W>(terminal: &mut T, app: &mut App, weather: &W, store: &CredentialStore) -> Result<()>
where
    T: Terminal,
    W: WeatherService,
{
    while !app.is_exited() {
        let (width, height) = terminal.size()?;
        terminal.draw(&app.view(width, height))?;

        let event = terminal.read_event(app.input_mode())?;
        if let Some(command) = app.handle(event) {
            let outcome = execute(command, weather, store);
            app.complete(outcome);
        }
    }
    info!("Exiting");
    Ok(())
}

fn execute<W: WeatherService>(command: Command, weather: &W, store: &CredentialStore) -> Outcome {
    match command {
        Command::FetchWeather { city, unit } => {
            let result = store
                .get()
                .map_err(|e| e.to_string())
                .and_then(|key| {
                    weather
                        .fetch_weather(&city, unit, &key)
                        .map_err(|e| e.to_string())
                });
            if let Err(message) = &result {
                debug!("Weather check for {city:?} failed: {message}");
            }
            Outcome::Weather(result)
        }
        Command::SetCredential(value) => Outcome::Credential(store.set(&value)),
    }
}
