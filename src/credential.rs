// Credential store: a single API key persisted verbatim in one file.
// No locking and no atomic rename; the file is simply overwritten.

use anyhow::Result;
use dialoguer::Input;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key file not found at {}. Please restart the application.", .0.display())]
    NotFound(PathBuf),
    #[error("API Key update canceled. Using existing key.")]
    Cancelled,
    #[error("Failed to access API key file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads and writes the API key file at a fixed path chosen at construction.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Whether a credential file is present on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// First-run prompt on the regular (non full-screen) terminal.
    /// Returns whether the user was asked for a key.
    pub fn prompt(&self) -> Result<bool> {
        self.prompt_with(|| {
            let key: String = Input::new()
                .with_prompt("Please enter your OpenWeatherMap API key")
                .allow_empty(true)
                .interact_text()?;
            Ok(key)
        })
    }

    /// Same as [`CredentialStore::prompt`] but with the question answered by
    /// `ask`. When a file already exists `ask` is never called.
    pub fn prompt_with<F>(&self, ask: F) -> Result<bool>
    where
        F: FnOnce() -> Result<String>,
    {
        if self.exists() {
            println!("API key file already exists. The application will use the existing key.");
            return Ok(false);
        }

        println!("Welcome to the Weather App!");
        println!("It looks like you're running this for the first time.");
        let key = ask()?;
        self.write(key.trim())?;
        println!("Your API key has been saved.");
        Ok(true)
    }

    /// Read the persisted key, trimmed of surrounding whitespace.
    pub fn get(&self) -> Result<String, CredentialError> {
        if !self.exists() {
            return Err(CredentialError::NotFound(self.path.clone()));
        }
        let data = fs::read_to_string(&self.path).map_err(|source| CredentialError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("Read API key from {}", self.path.display());
        Ok(data.trim().to_string())
    }

    /// Replace the persisted key. Blank input cancels and leaves the
    /// existing file untouched.
    pub fn set(&self, new_value: &str) -> Result<(), CredentialError> {
        let value = new_value.trim();
        if value.is_empty() {
            info!("API key change canceled, keeping {}", self.path.display());
            return Err(CredentialError::Cancelled);
        }
        self.write(value)
    }

    fn write(&self, value: &str) -> Result<(), CredentialError> {
        fs::write(&self.path, value).map_err(|source| CredentialError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!("Saved API key to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::path::Path;

    /// A path under the system temp dir, cleared on creation and removed
    /// again when dropped.
    pub(crate) struct TempFile(PathBuf);

    impl TempFile {
        pub(crate) fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "weather-tui-{}-{}",
                std::process::id(),
                name
            ));
            let _ = fs::remove_file(&path);
            TempFile(path)
        }

        pub(crate) fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    #[test]
    fn get_without_file_is_not_found() {
        let file = TempFile::new("missing");
        let store = CredentialStore::new(file.path());
        assert!(!store.exists());
        let err = store.get().unwrap_err();
        assert!(matches!(err, CredentialError::NotFound(_)));
        assert!(err.to_string().contains("API key file not found"));
    }

    #[test]
    fn set_persists_trimmed_value() {
        let file = TempFile::new("set-trimmed");
        let store = CredentialStore::new(file.path());
        store.set("  abc123 \n").expect("set should succeed");

        assert!(store.exists());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "abc123");
        assert_eq!(store.get().unwrap(), "abc123");
    }

    #[test]
    fn blank_set_is_cancelled_and_keeps_previous_key() {
        let file = TempFile::new("set-blank");
        let store = CredentialStore::new(file.path());
        store.set("original").unwrap();

        for blank in ["", "   ", "\t\n"] {
            let err = store.set(blank).unwrap_err();
            assert!(matches!(err, CredentialError::Cancelled));
            assert_eq!(err.to_string(), "API Key update canceled. Using existing key.");
        }
        assert_eq!(store.get().unwrap(), "original");
    }

    #[test]
    fn set_overwrites_existing_key() {
        let file = TempFile::new("set-overwrite");
        let store = CredentialStore::new(file.path());
        store.set("first").unwrap();
        store.set("second").unwrap();
        assert_eq!(store.get().unwrap(), "second");
    }

    #[test]
    fn get_trims_hand_edited_file() {
        let file = TempFile::new("hand-edited");
        let store = CredentialStore::new(file.path());
        fs::write(store.path(), "  key-with-newline\n").unwrap();
        assert_eq!(store.get().unwrap(), "key-with-newline");
    }

    #[test]
    fn first_run_prompts_once_then_reuses_file() {
        let file = TempFile::new("first-run");
        let path = file.path();
        let asked = Cell::new(0);

        let first = CredentialStore::new(path);
        let prompted = first
            .prompt_with(|| {
                asked.set(asked.get() + 1);
                Ok("  my-key  ".to_string())
            })
            .unwrap();
        assert!(prompted);
        assert_eq!(fs::read_to_string(path).unwrap(), "my-key");

        // Second "run": a new store over the same path.
        let second = CredentialStore::new(path);
        let prompted = second
            .prompt_with(|| {
                asked.set(asked.get() + 1);
                Ok("other".to_string())
            })
            .unwrap();
        assert!(!prompted);
        assert_eq!(asked.get(), 1);
        assert_eq!(second.get().unwrap(), "my-key");
    }

    #[test]
    fn temp_file_is_removed_on_drop() {
        let file = TempFile::new("drop-guard");
        let path = file.path().to_path_buf();
        CredentialStore::new(file.path()).set("k").unwrap();
        assert!(path.exists());

        drop(file);
        assert!(!path.exists());
    }
}
