//! Formatting errors

/// Formatting registry errors
///
/// Render failures never escape [`ObjectFormatter::format`](crate::ObjectFormatter::format);
/// they only surface when calling a strategy directly.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// A strategy could not render a value
    #[error("strategy '{strategy}' failed: {message}")]
    Render {
        /// Strategy name
        strategy: String,
        /// Failure description
        message: String,
    },

    /// The process-wide formatter was already set
    #[error("a global formatter is already installed")]
    AlreadyInstalled,
}

impl FormatError {
    /// Create render error
    #[inline]
    #[must_use]
    pub fn render(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            strategy: strategy.into(),
            message: message.into(),
        }
    }
}
