// Crossterm backend for the UI: raw mode on the alternate screen, whole
// frame repainted on every draw, keys and echoed lines read one at a time.

use crate::ui::{Event, Frame, InputMode, Terminal, MAX_INPUT};
use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveLeft, MoveTo, Show};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::io::{stdout, Stdout, Write};

/// Owns the terminal for the length of the session. Dropping it restores
/// the normal screen, even when the UI loop bails out with an error.
pub struct CrosstermTerminal {
    out: Stdout,
    cursor: Option<(u16, u16)>,
}

impl CrosstermTerminal {
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut out = stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e).context("Failed to enter alternate screen");
        }
        Ok(CrosstermTerminal { out, cursor: None })
    }

    /// Blocking line read with visible echo at the frame's cursor.
    fn read_line(&mut self) -> Result<String> {
        let (col, row) = self.cursor.unwrap_or((0, 0));
        execute!(self.out, MoveTo(col, row), Show)?;

        let mut line = String::new();
        loop {
            let Some(key) = next_key()? else { continue };
            match edit_line(&mut line, &key) {
                LineStep::Submit => break,
                LineStep::Typed(c) => queue!(self.out, Print(c))?,
                LineStep::Erased => queue!(self.out, MoveLeft(1), Print(' '), MoveLeft(1))?,
                LineStep::Ignored => {}
            }
            self.out.flush()?;
        }

        execute!(self.out, Hide)?;
        Ok(line)
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = execute!(self.out, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

impl Terminal for CrosstermTerminal {
    fn size(&self) -> Result<(u16, u16)> {
        terminal::size().context("Failed to read terminal size")
    }

    fn draw(&mut self, frame: &Frame) -> Result<()> {
        queue!(self.out, Hide, Clear(ClearType::All))?;
        for line in &frame.lines {
            queue!(self.out, MoveTo(line.col, line.row))?;
            if line.highlight {
                queue!(
                    self.out,
                    SetAttribute(Attribute::Reverse),
                    Print(&line.text),
                    SetAttribute(Attribute::Reset)
                )?;
            } else {
                queue!(self.out, Print(&line.text))?;
            }
        }
        self.cursor = frame.cursor;
        self.out.flush()?;
        Ok(())
    }

    fn read_event(&mut self, mode: InputMode) -> Result<Event> {
        if mode == InputMode::Line {
            return Ok(Event::Line(self.read_line()?));
        }
        loop {
            match event::read().context("Failed to read terminal event")? {
                TermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                    return Ok(map_key(&key));
                }
                TermEvent::Resize(w, h) => return Ok(Event::Resize(w, h)),
                _ => {}
            }
        }
    }
}

/// Next key press, skipping releases; other events while typing are ignored.
fn next_key() -> Result<Option<KeyEvent>> {
    match event::read().context("Failed to read terminal event")? {
        TermEvent::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(key)),
        _ => Ok(None),
    }
}

/// What one key did to the line being typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStep {
    Typed(char),
    Erased,
    Submit,
    Ignored,
}

/// Line editing rules: Enter submits, Esc clears and submits, Backspace
/// erases, and plain characters are appended up to `MAX_INPUT`.
fn edit_line(line: &mut String, key: &KeyEvent) -> LineStep {
    match key.code {
        KeyCode::Enter => LineStep::Submit,
        KeyCode::Esc => {
            line.clear();
            LineStep::Submit
        }
        KeyCode::Backspace if line.pop().is_some() => LineStep::Erased,
        KeyCode::Char(c)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && line.chars().count() < MAX_INPUT =>
        {
            line.push(c);
            LineStep::Typed(c)
        }
        _ => LineStep::Ignored,
    }
}

fn map_key(key: &KeyEvent) -> Event {
    match key.code {
        KeyCode::Up => Event::Up,
        KeyCode::Down => Event::Down,
        KeyCode::Enter => Event::Enter,
        _ => Event::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_enter_map_to_navigation() {
        assert_eq!(map_key(&key(KeyCode::Up)), Event::Up);
        assert_eq!(map_key(&key(KeyCode::Down)), Event::Down);
        assert_eq!(map_key(&key(KeyCode::Enter)), Event::Enter);
        assert_eq!(map_key(&key(KeyCode::Char('q'))), Event::Other);
        assert_eq!(map_key(&key(KeyCode::Esc)), Event::Other);
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_keys(line: &mut String, keys: &[KeyEvent]) -> Vec<LineStep> {
        keys.iter().map(|k| edit_line(line, k)).collect()
    }

    #[test]
    fn characters_are_appended_and_echoed() {
        let mut line = String::new();
        let steps = type_keys(&mut line, &[key(KeyCode::Char('O')), key(KeyCode::Char('s'))]);
        assert_eq!(steps, [LineStep::Typed('O'), LineStep::Typed('s')]);
        assert_eq!(line, "Os");
        assert_eq!(edit_line(&mut line, &key(KeyCode::Enter)), LineStep::Submit);
        assert_eq!(line, "Os");
    }

    #[test]
    fn backspace_erases_until_empty() {
        let mut line = "ab".to_string();
        let steps = type_keys(&mut line, &[key(KeyCode::Backspace); 3]);
        assert_eq!(steps, [LineStep::Erased, LineStep::Erased, LineStep::Ignored]);
        assert!(line.is_empty());
    }

    #[test]
    fn escape_clears_and_submits() {
        let mut line = "half-typed key".to_string();
        assert_eq!(edit_line(&mut line, &key(KeyCode::Esc)), LineStep::Submit);
        assert!(line.is_empty());
    }

    #[test]
    fn control_chords_and_other_keys_are_ignored() {
        let mut line = "x".to_string();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let steps = type_keys(&mut line, &[ctrl_c, key(KeyCode::Up), key(KeyCode::Tab)]);
        assert_eq!(steps, [LineStep::Ignored; 3]);
        assert_eq!(line, "x");
    }

    #[test]
    fn shifted_characters_are_typed() {
        let mut line = String::new();
        let shifted = KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT);
        assert_eq!(edit_line(&mut line, &shifted), LineStep::Typed('P'));
        assert_eq!(line, "P");
    }

    #[test]
    fn input_stops_at_max_length() {
        let mut line = String::new();
        for _ in 0..MAX_INPUT {
            assert_eq!(edit_line(&mut line, &key(KeyCode::Char('é'))), LineStep::Typed('é'));
        }
        assert_eq!(edit_line(&mut line, &key(KeyCode::Char('z'))), LineStep::Ignored);
        assert_eq!(line.chars().count(), MAX_INPUT);
        assert!(!line.contains('z'));

        // Room again after erasing one.
        assert_eq!(edit_line(&mut line, &key(KeyCode::Backspace)), LineStep::Erased);
        assert_eq!(edit_line(&mut line, &key(KeyCode::Char('z'))), LineStep::Typed('z'));
    }
}
