//! Screenplay configuration
//!
//! Loadable from TOML; every field has a default so partial files work.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it is invalid
        reason: String,
    },
}

/// Screenplay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenplayConfig {
    /// Verb used by the fallback narration ("Joe performs OpenBrowser.")
    pub fallback_verb: String,
    /// Truncate formatted narration arguments to this many characters
    pub max_argument_len: Option<usize>,
    /// Log every top-level fragment at debug level
    pub log_fragments: bool,
    /// Emit an event when an actor gains an ability
    pub emit_ability_events: bool,
}

impl ScreenplayConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With fallback verb
    #[inline]
    #[must_use]
    pub fn with_fallback_verb(mut self, verb: impl Into<String>) -> Self {
        self.fallback_verb = verb.into();
        self
    }

    /// With argument length limit
    #[inline]
    #[must_use]
    pub fn with_max_argument_len(mut self, max: usize) -> Self {
        self.max_argument_len = Some(max);
        self
    }

    /// With fragment logging
    #[inline]
    #[must_use]
    pub fn with_fragment_logging(mut self, enabled: bool) -> Self {
        self.log_fragments = enabled;
        self
    }

    /// With ability events
    #[inline]
    #[must_use]
    pub fn with_ability_events(mut self, enabled: bool) -> Self {
        self.emit_ability_events = enabled;
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ScreenplayConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback_verb.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "fallback_verb",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_argument_len == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_argument_len",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ScreenplayConfig {
    fn default() -> Self {
        Self {
            fallback_verb: "performs".to_string(),
            max_argument_len: None,
            log_fragments: false,
            emit_ability_events: true,
        }
    }
}
