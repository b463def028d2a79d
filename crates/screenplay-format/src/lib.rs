//! Screenplay Formatting
//!
//! Renders the heterogeneous values embedded in narrations (numbers, errors,
//! domain objects, collections) into report text.
//!
//! # Core Concepts
//!
//! - [`Value`]: argument model, with [`ObjectValue`] for arbitrary types
//! - [`FormattingStrategy`]: applicability + priority + render
//! - [`FormatterBuilder`]: start-up registration
//! - [`ObjectFormatter`]: frozen registry consulted at format time
//!
//! # Example
//!
//! ```rust
//! use screenplay_format::{FormatterBuilder, TypedStrategy, Value};
//!
//! #[derive(Debug)]
//! struct Url(String);
//!
//! let formatter = FormatterBuilder::with_defaults()
//!     .register(TypedStrategy::new("url", 0, |u: &Url| Ok(u.0.clone())))
//!     .build();
//!
//! let value = Value::object(Url("https://example.com".into()));
//! assert_eq!(formatter.format(&value), "https://example.com");
//! assert_eq!(formatter.format(&Value::sequence(["a", "b"])), "a, b");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod registry;
mod strategy;
mod value;

pub use error::FormatError;
pub use registry::{FormatterBuilder, ObjectFormatter};
pub use strategy::{
    DurationStrategy, ErrorChainStrategy, FnStrategy, FormattingStrategy, SequenceStrategy,
    TypedStrategy,
};
pub use value::{ObjectValue, Value};

/// Rendering of absent values
pub const ABSENT: &str = "<absent>";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shorten `text` to at most `max_chars` characters
///
/// Truncated output ends in `…`, which counts towards the limit.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}
