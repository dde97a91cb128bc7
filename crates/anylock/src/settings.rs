//! Backend selection and tuning.
//!
//! Which primitive backs a [`Mutex`](crate::mutex::Mutex) is a deployment
//! decision, not application logic: it loads from TOML (or a builder), is
//! validated once, and picks the variant at construction time.
//!
//! # Example Config
//!
//! ```toml
//! backend = "file"
//! lock_dir = "/var/lock/myapp"
//! poll_interval_ms = 1
//! ```

use std::{path::PathBuf, time::Duration as StdDuration};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The closed set of mutex backends.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BackendKind {
    /// In-process native mutex.
    #[default]
    Thread,
    /// Cross-process advisory file lock.
    File,
    /// Shared counter table entry.
    Counter,
    /// System V kernel semaphore (unix only).
    Kernel,
}

/// Validated lock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Backend variant to construct.
    pub backend: BackendKind,
    /// Directory for lock files (file backend); system temp dir when unset.
    pub lock_dir: Option<PathBuf>,
    /// Poll interval for bounded waits, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            lock_dir: None,
            poll_interval_ms: 1,
        }
    }
}

impl LockSettings {
    /// Create a settings builder.
    #[must_use]
    pub fn builder() -> LockSettingsBuilder {
        LockSettingsBuilder::default()
    }

    /// Parse and validate settings from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Self = toml::from_str(raw)
            .map_err(|err| Error::invalid_settings(format!("failed to parse: {err}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::invalid_settings("poll_interval_ms must be >= 1"));
        }
        Ok(())
    }

    /// The poll interval as a std duration.
    #[must_use]
    pub const fn poll_interval(&self) -> StdDuration {
        StdDuration::from_millis(self.poll_interval_ms)
    }

    /// Configured lock directory, falling back to the system temp dir.
    #[must_use]
    pub fn lock_dir_or_default(&self) -> PathBuf {
        self.lock_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Builder with fallible construction.
#[derive(Debug, Clone, Default)]
pub struct LockSettingsBuilder {
    backend: BackendKind,
    lock_dir: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
}

impl LockSettingsBuilder {
    /// Select the backend variant.
    #[must_use]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Select the lock-file directory for the file backend.
    #[must_use]
    pub fn with_lock_dir(mut self, lock_dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(lock_dir.into());
        self
    }

    /// Override the bounded-wait poll interval.
    #[must_use]
    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = Some(poll_interval_ms);
        self
    }

    /// Build the settings, returning an error if validation fails.
    pub fn build(self) -> Result<LockSettings> {
        let settings = LockSettings {
            backend: self.backend,
            lock_dir: self.lock_dir,
            poll_interval_ms: self.poll_interval_ms.unwrap_or(1),
        };
        settings.validate()?;
        Ok(settings)
    }
}
