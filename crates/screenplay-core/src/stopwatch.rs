//! Stopwatch ability
//!
//! Lets an actor time parts of a scenario. The elapsed time is reported
//! as a [`Duration`] object, which the default formatter renders in seconds.

use crate::ability::Ability;
use crate::actor::Actor;
use crate::error::ScreenplayError;
use crate::performable::Performable;
use async_trait::async_trait;
use parking_lot::Mutex;
use screenplay_format::Value;
use screenplay_report::Narration;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Lap {
    started: Option<Instant>,
    accumulated: Duration,
}

/// Measures wall-clock time across start/stop cycles
#[derive(Debug, Default)]
pub struct Stopwatch {
    state: Mutex<Lap>,
}

impl Stopwatch {
    /// Create a stopped stopwatch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start measuring; no-op if already running
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.started.is_none() {
            state.started = Some(Instant::now());
        }
    }

    /// Stop measuring and return the total so far
    pub fn stop(&self) -> Duration {
        let mut state = self.state.lock();
        if let Some(started) = state.started.take() {
            state.accumulated += started.elapsed();
        }
        state.accumulated
    }

    /// Total measured time, including the running lap
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        let state = self.state.lock();
        state.accumulated + state.started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    /// Check if a lap is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().started.is_some()
    }
}

impl Ability for Stopwatch {
    const NAME: &'static str = "Stopwatch";

    fn narrate(&self, actor: &str) -> String {
        format!("{actor} can measure time")
    }

    fn release(&self) {
        let total = self.stop();
        tracing::trace!(elapsed = ?total, "stopwatch released");
    }
}

/// Task starting the actor's stopwatch
#[derive(Debug, Clone, Copy, Default)]
pub struct StartStopwatch;

#[async_trait]
impl Performable for StartStopwatch {
    type Output = ();

    async fn perform(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        actor.ability::<Stopwatch>()?.start();
        Ok(())
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(Narration::new("{actor} starts the stopwatch"))
    }
}

/// Question answering the actor's measured time
///
/// Stops the stopwatch when `stopping` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElapsedTime {
    stopping: bool,
}

impl ElapsedTime {
    /// Read without stopping
    #[must_use]
    pub fn so_far() -> Self {
        Self { stopping: false }
    }

    /// Stop, then read
    #[must_use]
    pub fn stopping() -> Self {
        Self { stopping: true }
    }
}

#[async_trait]
impl Performable for ElapsedTime {
    type Output = Duration;

    async fn perform(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<Duration, ScreenplayError> {
        let stopwatch = actor.ability::<Stopwatch>()?;
        Ok(if self.stopping {
            stopwatch.stop()
        } else {
            stopwatch.elapsed()
        })
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        let verb = if self.stopping { "stops" } else { "checks" };
        Some(Narration::new("{actor} {0} the stopwatch").with(Value::from(verb)))
    }
}
