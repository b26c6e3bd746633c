//! Application settings stored in `workbench.ron`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use workbench_client::{BackendSettings, PollSettings, PresenterSettings};

use crate::logging::LogDestination;

pub const DEFAULT_SETTINGS_FILE: &str = "workbench.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
    /// Pause between typed characters of a chat reply.
    pub char_delay_ms: u64,
    /// Where exports and chat transcripts are written.
    pub export_dir: PathBuf,
    pub log: LogDestination,
}

impl Default for Settings {
    fn default() -> Self {
        let poll = PollSettings::default();
        Self {
            backend_url: BackendSettings::default().base_url,
            poll_interval_ms: poll.interval.as_millis() as u64,
            poll_timeout_secs: poll.timeout.as_secs(),
            char_delay_ms: PresenterSettings::default().char_delay.as_millis() as u64,
            export_dir: PathBuf::from("exports"),
            log: LogDestination::default(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub char_delay_ms: Option<u64>,
    pub export_dir: Option<PathBuf>,
    pub log: Option<LogDestination>,
}

impl Settings {
    /// Reads `path`. A missing file yields the defaults; a file that does not
    /// parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        ron::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
            .context("serializing settings")
    }

    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(url) = &overrides.backend_url {
            self.backend_url = url.clone();
        }
        if let Some(delay) = overrides.char_delay_ms {
            self.char_delay_ms = delay;
        }
        if let Some(dir) = &overrides.export_dir {
            self.export_dir = dir.clone();
        }
        if let Some(log) = overrides.log {
            self.log = log;
        }
        self
    }

    pub fn backend(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.backend_url.clone(),
            ..BackendSettings::default()
        }
    }

    pub fn poll(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            timeout: Duration::from_secs(self.poll_timeout_secs),
        }
    }

    pub fn presenter(&self) -> PresenterSettings {
        PresenterSettings {
            char_delay: Duration::from_millis(self.char_delay_ms),
        }
    }
}
