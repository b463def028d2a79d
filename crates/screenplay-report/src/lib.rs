//! Screenplay Reporting
//!
//! Turns performed steps into a narrated, serializable trace.
//!
//! # Core Concepts
//!
//! - [`Narration`]: template + ordered [`Value`](screenplay_format::Value) arguments
//! - [`FragmentRecorder`]: per-actor stack of open frames
//! - [`ReportFragment`]: immutable record of a finished step, with children
//! - [`ReportSink`]: consumer of finished fragments and [`CastEvent`]s
//! - [`ScenarioReport`]: serializable model for renderers
//!
//! # Example
//!
//! ```rust
//! use screenplay_format::ObjectFormatter;
//! use screenplay_report::{FragmentRecorder, MemorySink, Narration, Outcome, StepKind};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let recorder = FragmentRecorder::new("Joe", Arc::new(ObjectFormatter::with_defaults()), sink.clone());
//!
//! recorder
//!     .open(StepKind::Action, &Narration::new("{actor} adds {0}").with(2), None)
//!     .close(Outcome::Passed);
//!
//! assert_eq!(sink.fragments()[0].text(), "Joe adds 2");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod fragment;
mod recorder;
mod scenario;
mod sink;
pub mod template;

pub use error::ReportError;
pub use fragment::{FragmentId, Narration, Outcome, ReportFragment, StepKind};
pub use recorder::{FragmentRecorder, FrameGuard};
pub use scenario::{OutcomeSummary, ScenarioReport};
pub use sink::{CastEvent, CastEventKind, FanOutSink, MemorySink, ReportSink, TracingSink};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
