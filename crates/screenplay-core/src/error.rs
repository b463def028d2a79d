//! Error types for screenplay execution
//!
//! Everything above the ability store and the performable protocol is
//! fail-fast. Formatting is the only place that recovers locally.

use crate::config::ConfigError;

/// Main screenplay error type
#[derive(Debug, thiserror::Error)]
pub enum ScreenplayError {
    /// Actor lacks a required ability
    #[error("{actor} does not have the ability to {capability}")]
    CapabilityNotGranted {
        /// Capability name
        capability: &'static str,
        /// Actor name
        actor: String,
    },

    /// Ability instance rejected at registration
    #[error("invalid ability {capability}: {reason}")]
    InvalidCapability {
        /// Capability name
        capability: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Ability granted to an actor that was already retired
    #[error("{actor} has been retired and cannot gain {capability}")]
    ActorRetired {
        /// Actor name
        actor: String,
        /// Capability name
        capability: &'static str,
    },

    /// Failure raised inside a performable body
    #[error(transparent)]
    Performable(#[from] anyhow::Error),

    /// Expectation not met
    #[error("assertion failed: {message}")]
    Assertion {
        /// What was expected and what was seen
        message: String,
    },

    /// Spotlight requested for an actor not in the cast
    #[error("no actor called {name} in the cast")]
    UnknownActor {
        /// Requested name
        name: String,
    },

    /// Execution chain canceled
    #[error("operation cancelled")]
    Canceled,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ScreenplayError {
    /// Create assertion error
    #[inline]
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// Only failures raised by performables may be transient; everything
    /// else describes a scenario that is wired wrong.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Performable(_))
    }

    /// Check if the chain was canceled
    #[inline]
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Capability named by the error, if any
    #[must_use]
    pub fn capability(&self) -> Option<&'static str> {
        match self {
            Self::CapabilityNotGranted { capability, .. }
            | Self::InvalidCapability { capability, .. }
            | Self::ActorRetired { capability, .. } => Some(*capability),
            _ => None,
        }
    }
}
