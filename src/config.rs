//! Shell configuration.
//!
//! Values are resolved from command-line flags, then environment variables,
//! then defaults:
//! - `HBNB_FILE_PATH` - backing JSON file (default: `file.json`)

use std::path::PathBuf;

use crate::storage::DEFAULT_FILE_PATH;

pub const FILE_PATH_ENV: &str = "HBNB_FILE_PATH";
pub const DEFAULT_PROMPT: &str = "(hbnb) ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the JSON file mirroring the registry.
    pub file_path: PathBuf,
    pub prompt: String,
    /// Print the prompt before each line. Off for piped input.
    pub show_prompt: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            prompt: DEFAULT_PROMPT.to_string(),
            show_prompt: true,
        }
    }
}

impl Config {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(FILE_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            config.file_path = PathBuf::from(path);
        }
        config
    }

    /// Applies command-line overrides on top of this config.
    pub fn with_overrides(mut self, file_path: Option<PathBuf>, show_prompt: bool) -> Self {
        if let Some(path) = file_path {
            self.file_path = path;
        }
        self.show_prompt = show_prompt;
        self
    }

    /// The prompt to print, if prompting is on.
    pub fn active_prompt(&self) -> Option<&str> {
        self.show_prompt.then_some(self.prompt.as_str())
    }
}
