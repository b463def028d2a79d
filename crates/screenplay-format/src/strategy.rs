//! Formatting strategy trait and built-in strategies
//!
//! A [`FormattingStrategy`] is an (applicability, priority, render) triple.
//! The [`ObjectFormatter`](crate::ObjectFormatter) picks one per value.

use crate::error::FormatError;
use crate::registry::ObjectFormatter;
use crate::value::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

/// Rule for rendering a value into report text
///
/// Strategies must be pure: the same value renders to the same string.
pub trait FormattingStrategy: Send + Sync + fmt::Debug {
    /// Strategy name (for diagnostics)
    fn name(&self) -> &str;

    /// Selection priority, higher wins
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this strategy can render `value`
    fn applies_to(&self, value: &Value) -> bool;

    /// Render `value`
    ///
    /// `formatter` is the registry consulting this strategy, for recursive
    /// rendering of nested values.
    ///
    /// # Errors
    /// Returns [`FormatError::Render`] if the value cannot be rendered. The
    /// registry recovers by falling back to the default representation.
    fn render(&self, value: &Value, formatter: &ObjectFormatter) -> Result<String, FormatError>;
}

/// Renders sequences as a comma-joined list of formatted elements
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceStrategy;

impl FormattingStrategy for SequenceStrategy {
    fn name(&self) -> &str {
        "sequence"
    }

    fn applies_to(&self, value: &Value) -> bool {
        matches!(value, Value::Sequence(_))
    }

    fn render(&self, value: &Value, formatter: &ObjectFormatter) -> Result<String, FormatError> {
        let Value::Sequence(items) = value else {
            return Err(FormatError::render(self.name(), "not a sequence"));
        };
        Ok(items
            .iter()
            .map(|item| formatter.format(item))
            .collect::<Vec<_>>()
            .join(", "))
    }
}

/// Renders errors with their source chain
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorChainStrategy;

impl FormattingStrategy for ErrorChainStrategy {
    fn name(&self) -> &str {
        "error-chain"
    }

    fn applies_to(&self, value: &Value) -> bool {
        matches!(value, Value::Error(_))
    }

    fn render(&self, value: &Value, _formatter: &ObjectFormatter) -> Result<String, FormatError> {
        match value {
            Value::Error(chain) if !chain.is_empty() => Ok(chain.join(": ")),
            Value::Error(_) => Err(FormatError::render(self.name(), "empty error chain")),
            _ => Err(FormatError::render(self.name(), "not an error")),
        }
    }
}

/// Renders [`Duration`] objects in seconds with millisecond precision
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationStrategy;

impl FormattingStrategy for DurationStrategy {
    fn name(&self) -> &str {
        "duration"
    }

    fn applies_to(&self, value: &Value) -> bool {
        value.downcast_ref::<Duration>().is_some()
    }

    fn render(&self, value: &Value, _formatter: &ObjectFormatter) -> Result<String, FormatError> {
        value
            .downcast_ref::<Duration>()
            .map(|d| format!("{:.3}s", d.as_secs_f64()))
            .ok_or_else(|| FormatError::render(self.name(), "not a duration"))
    }
}

/// Strategy for a single concrete object type
///
/// Applies to [`Value::Object`] values wrapping a `T`.
pub struct TypedStrategy<T, F> {
    name: String,
    priority: i32,
    render: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> TypedStrategy<T, F>
where
    T: Any,
    F: Fn(&T) -> Result<String, FormatError> + Send + Sync,
{
    /// Create a strategy rendering `T` through `render`
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32, render: F) -> Self {
        Self {
            name: name.into(),
            priority,
            render,
            _marker: PhantomData,
        }
    }
}

impl<T, F> fmt::Debug for TypedStrategy<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedStrategy")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T, F> FormattingStrategy for TypedStrategy<T, F>
where
    T: Any,
    F: Fn(&T) -> Result<String, FormatError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn applies_to(&self, value: &Value) -> bool {
        value.downcast_ref::<T>().is_some()
    }

    fn render(&self, value: &Value, _formatter: &ObjectFormatter) -> Result<String, FormatError> {
        let typed = value
            .downcast_ref::<T>()
            .ok_or_else(|| FormatError::render(&self.name, "type mismatch"))?;
        (self.render)(typed)
    }
}

/// Strategy built from a predicate and a render closure
pub struct FnStrategy<P, R> {
    name: String,
    priority: i32,
    predicate: P,
    render: R,
}

impl<P, R> FnStrategy<P, R>
where
    P: Fn(&Value) -> bool + Send + Sync,
    R: Fn(&Value, &ObjectFormatter) -> Result<String, FormatError> + Send + Sync,
{
    /// Create a closure-backed strategy
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32, predicate: P, render: R) -> Self {
        Self {
            name: name.into(),
            priority,
            predicate,
            render,
        }
    }
}

impl<P, R> fmt::Debug for FnStrategy<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl<P, R> FormattingStrategy for FnStrategy<P, R>
where
    P: Fn(&Value) -> bool + Send + Sync,
    R: Fn(&Value, &ObjectFormatter) -> Result<String, FormatError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn applies_to(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    fn render(&self, value: &Value, formatter: &ObjectFormatter) -> Result<String, FormatError> {
        (self.render)(value, formatter)
    }
}
