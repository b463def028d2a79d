//! Formatter registry
//!
//! Strategies are registered once through [`FormatterBuilder`] and frozen into
//! an immutable [`ObjectFormatter`]. There is no mutation path afterwards, so
//! a formatter can be shared across actors and threads without locking.

use crate::error::FormatError;
use crate::strategy::{DurationStrategy, ErrorChainStrategy, FormattingStrategy, SequenceStrategy};
use crate::value::Value;
use crate::ABSENT;
use once_cell::sync::OnceCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

static GLOBAL: OnceCell<Arc<ObjectFormatter>> = OnceCell::new();

/// Builder collecting strategies in registration order
#[derive(Debug, Default)]
pub struct FormatterBuilder {
    strategies: Vec<Box<dyn FormattingStrategy>>,
}

impl FormatterBuilder {
    /// Create an empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder pre-loaded with the built-in strategies
    ///
    /// Built-ins: sequence, error chain, duration. All at priority 0.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .register(SequenceStrategy)
            .register(ErrorChainStrategy)
            .register(DurationStrategy)
    }

    /// Register a strategy
    ///
    /// Among applicable strategies of equal priority, the one registered
    /// first wins.
    #[must_use]
    pub fn register(mut self, strategy: impl FormattingStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Number of strategies registered so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if no strategy is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Freeze into a formatter
    #[must_use]
    pub fn build(self) -> ObjectFormatter {
        ObjectFormatter {
            strategies: self.strategies,
        }
    }
}

/// Immutable, ordered set of formatting strategies
#[derive(Debug)]
pub struct ObjectFormatter {
    strategies: Vec<Box<dyn FormattingStrategy>>,
}

impl ObjectFormatter {
    /// Formatter without strategies; every value uses its default rendering
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Formatter with the built-in strategies
    #[inline]
    #[must_use]
    pub fn with_defaults() -> Self {
        FormatterBuilder::with_defaults().build()
    }

    /// Install the process-wide formatter
    ///
    /// # Errors
    /// Returns [`FormatError::AlreadyInstalled`] if a global formatter was
    /// already installed or [`ObjectFormatter::global`] was already called.
    pub fn install_global(formatter: ObjectFormatter) -> Result<(), FormatError> {
        GLOBAL
            .set(Arc::new(formatter))
            .map_err(|_| FormatError::AlreadyInstalled)
    }

    /// Process-wide formatter
    ///
    /// Falls back to [`ObjectFormatter::with_defaults`] if nothing was
    /// installed before the first call.
    #[must_use]
    pub fn global() -> Arc<ObjectFormatter> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::with_defaults())))
    }

    /// Number of registered strategies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if no strategy is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Select the strategy for `value`
    ///
    /// Highest priority among applicable strategies; ties go to the earliest
    /// registration. A strategy whose `applies_to` or `priority` panics is
    /// logged and treated as not applicable.
    #[must_use]
    pub fn select(&self, value: &Value) -> Option<&dyn FormattingStrategy> {
        let mut best: Option<(i32, &dyn FormattingStrategy)> = None;
        for strategy in &self.strategies {
            let Some(priority) = applicable_priority(strategy.as_ref(), value) else {
                continue;
            };
            match best {
                Some((current, _)) if current >= priority => {}
                _ => best = Some((priority, strategy.as_ref())),
            }
        }
        best.map(|(_, strategy)| strategy)
    }

    /// Render `value` for a report
    ///
    /// Never fails. Absent values render as [`ABSENT`]. A strategy that
    /// errors or panics is logged and replaced by the default rendering.
    #[must_use]
    pub fn format(&self, value: &Value) -> String {
        if value.is_absent() {
            return ABSENT.to_string();
        }

        let Some(strategy) = self.select(value) else {
            return value.to_string();
        };

        match catch_unwind(AssertUnwindSafe(|| strategy.render(value, self))) {
            Ok(Ok(rendered)) => rendered,
            Ok(Err(err)) => {
                tracing::warn!(strategy = strategy.name(), kind = value.kind(), error = %err, "formatting strategy failed");
                value.to_string()
            }
            Err(_) => {
                tracing::warn!(strategy = strategy.name(), kind = value.kind(), "formatting strategy panicked");
                value.to_string()
            }
        }
    }

    /// Render every value in order
    #[must_use]
    pub fn format_all(&self, values: &[Value]) -> Vec<String> {
        values.iter().map(|v| self.format(v)).collect()
    }
}

/// Priority of `strategy` if it applies to `value`
fn applicable_priority(strategy: &dyn FormattingStrategy, value: &Value) -> Option<i32> {
    let checked = catch_unwind(AssertUnwindSafe(|| {
        strategy.applies_to(value).then(|| strategy.priority())
    }));
    checked.unwrap_or_else(|_| {
        tracing::warn!(strategy = strategy.name(), kind = value.kind(), "formatting strategy predicate panicked");
        None
    })
}

impl Default for ObjectFormatter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
