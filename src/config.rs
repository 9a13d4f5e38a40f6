//! Execution configuration and user settings.
//!
//! [`TapeConfig`] is the immutable value every execution is built from; each run
//! allocates its own tape from it. [`Settings`] holds the command-line defaults
//! read from `bfpy.toml`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cross_xdg::BaseDirs;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::codegen;
use crate::error::{Error, Result};
use crate::host::{Host, Replay};
use crate::machine::TapeMachine;
use crate::validate::Program;

/// Tape size used when none is given.
pub const DEFAULT_TAPE_LENGTH: usize = 30_000;

/// Immutable execution configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeConfig {
    tape_length: usize,
}

impl TapeConfig {
    /// Rejects a tape without cells.
    pub fn new(tape_length: usize) -> Result<Self> {
        if tape_length == 0 {
            return Err(Error::InvalidTapeLength(tape_length));
        }
        Ok(Self { tape_length })
    }

    pub fn tape_length(&self) -> usize {
        self.tape_length
    }

    /// Interpret `source` directly on a fresh tape.
    pub fn execute_direct(&self, source: &str, input: &str) -> Result<String> {
        let program = Program::parse(source)?;
        let mut machine = TapeMachine::new(&program, self, input);
        machine.run();
        Ok(machine.into_output())
    }

    /// Translate `source` to Python.
    pub fn compile(&self, source: &str) -> Result<String> {
        let program = Program::parse(source)?;
        Ok(codegen::generate(&program, self))
    }

    /// Translate `source` and evaluate the generated program in-process.
    pub fn execute(&self, source: &str, input: &str) -> Result<String> {
        let generated = self.compile(source)?;
        Ok(Replay::new().evaluate(&generated, input)?)
    }
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self { tape_length: DEFAULT_TAPE_LENGTH }
    }
}

/// Defaults for the command-line tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub tape_length: usize,
    pub timeout_ms: u64,
    pub max_steps: Option<u64>,
    pub python: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tape_length: DEFAULT_TAPE_LENGTH,
            timeout_ms: 2_000,
            max_steps: None,
            python: String::from("python3"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
}

impl Settings {
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Location of the settings file: `$BFPY_CONFIG`, else `<config home>/bfpy.toml`.
    pub fn path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os("BFPY_CONFIG") {
            return Some(PathBuf::from(explicit));
        }

        // On Linux: resolves to /home/<user>/.config
        // On macOS: resolves to /Users/<user>/.config
        let base_dirs = BaseDirs::new().ok()?;
        let mut path = PathBuf::from(base_dirs.config_home());
        path.push("bfpy.toml");
        Some(path)
    }

    /// Read settings from `path`; a missing file yields `Ok(None)`.
    pub fn load_from(path: &Path) -> std::result::Result<Option<Self>, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SettingsError::Read { path: path.to_path_buf(), source }),
        };
        Self::from_toml(&content)
            .map(Some)
            .map_err(|source| SettingsError::Parse { path: path.to_path_buf(), source })
    }

    /// Settings from the default location, falling back to defaults on any problem.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(Some(settings)) => {
                debug!(path = %path.display(), "loaded settings");
                settings
            }
            Ok(None) => Self::default(),
            Err(err) => {
                warn!("{err}; using defaults");
                Self::default()
            }
        }
    }
}
