//! Report sinks and cast events
//!
//! A [`ReportSink`] receives every top-level [`ReportFragment`] once it is
//! complete, plus the cast-level [`CastEvent`] stream. Rendering (HTML, JSON
//! files) lives behind this trait and never shapes the model.

use crate::fragment::ReportFragment;
use crate::scenario::ScenarioReport;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Consumer of completed fragments and cast events
pub trait ReportSink: Send + Sync {
    /// A top-level fragment completed
    fn on_fragment(&self, fragment: &ReportFragment);

    /// Something happened at cast level
    fn on_event(&self, _event: &CastEvent) {}
}

/// Cast-level event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastEvent {
    /// When it happened
    pub at: DateTime<Utc>,
    /// What happened
    pub kind: CastEventKind,
}

impl CastEvent {
    /// Stamp an event with the current time
    #[inline]
    #[must_use]
    pub fn now(kind: CastEventKind) -> Self {
        Self { at: Utc::now(), kind }
    }
}

/// Cast event kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CastEventKind {
    /// An actor joined the cast
    ActorCreated {
        /// Actor name
        actor: String,
    },

    /// An actor was granted an ability
    AbilityGained {
        /// Actor name
        actor: String,
        /// Capability name
        ability: String,
        /// Human-readable description
        narration: String,
    },

    /// An actor took the spotlight
    ActorSpotlit {
        /// Actor name
        actor: String,
    },

    /// Nobody is in the spotlight any more
    SpotlightCleared,
}

/// Sink collecting everything in memory
///
/// Append-only; readers get snapshots.
#[derive(Debug, Default)]
pub struct MemorySink {
    fragments: Mutex<Vec<ReportFragment>>,
    events: Mutex<Vec<CastEvent>>,
}

impl MemorySink {
    /// Create empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed top-level fragments, in emission order
    #[must_use]
    pub fn fragments(&self) -> Vec<ReportFragment> {
        self.fragments.lock().clone()
    }

    /// Cast events, in emission order
    #[must_use]
    pub fn events(&self) -> Vec<CastEvent> {
        self.events.lock().clone()
    }

    /// Number of top-level fragments received
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.lock().len()
    }

    /// Check if no fragment was received
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.lock().is_empty()
    }

    /// Snapshot as a scenario report
    #[must_use]
    pub fn report(&self, scenario: impl Into<String>) -> ScenarioReport {
        ScenarioReport::new(scenario, self.fragments(), self.events())
    }
}

impl ReportSink for MemorySink {
    fn on_fragment(&self, fragment: &ReportFragment) {
        self.fragments.lock().push(fragment.clone());
    }

    fn on_event(&self, event: &CastEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Sink writing fragments and events as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn on_fragment(&self, fragment: &ReportFragment) {
        for step in fragment.walk() {
            tracing::info!(
                target: "screenplay::report",
                actor = step.actor(),
                kind = ?step.kind(),
                outcome = ?step.outcome(),
                id = %step.id(),
                "{}",
                step.text()
            );
        }
    }

    fn on_event(&self, event: &CastEvent) {
        tracing::info!(target: "screenplay::cast", event = ?event.kind, "cast event");
    }
}

/// Sink broadcasting to several sinks in order
#[derive(Default, Clone)]
pub struct FanOutSink {
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl FanOutSink {
    /// Create sink without targets
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target
    #[inline]
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl std::fmt::Debug for FanOutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl ReportSink for FanOutSink {
    fn on_fragment(&self, fragment: &ReportFragment) {
        for sink in &self.sinks {
            sink.on_fragment(fragment);
        }
    }

    fn on_event(&self, event: &CastEvent) {
        for sink in &self.sinks {
            sink.on_event(event);
        }
    }
}
