//! Actors
//!
//! An [`Actor`] combines a name, an [`AbilityStore`] and a
//! [`FragmentRecorder`]. Its entry points (`was_able_to`, `attempts_to`,
//! `asks_for`, `should`) differ only in the report vocabulary they record.

use crate::ability::{Ability, AbilityStore};
use crate::config::ScreenplayConfig;
use crate::error::ScreenplayError;
use crate::performable::Performable;
use futures::FutureExt;
use screenplay_format::ObjectFormatter;
use screenplay_report::{
    CastEvent, CastEventKind, FragmentId, FragmentRecorder, Narration, Outcome, ReportSink,
    StepKind,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

tokio::task_local! {
    /// Frame of the step whose body is currently being polled
    static CURRENT_FRAME: FragmentId;
}

/// Named participant performing steps in a scenario
pub struct Actor {
    name: String,
    config: Arc<ScreenplayConfig>,
    abilities: AbilityStore,
    recorder: FragmentRecorder,
    cancel: CancellationToken,
}

impl Actor {
    /// Create an actor outside a cast
    ///
    /// Uses the default configuration and the process-wide formatter.
    #[must_use]
    pub fn new(name: impl Into<String>, sink: Arc<dyn ReportSink>) -> Self {
        Self::with_parts(
            name.into(),
            Arc::new(ScreenplayConfig::default()),
            ObjectFormatter::global(),
            sink,
            CancellationToken::new(),
        )
    }

    pub(crate) fn with_parts(
        name: String,
        config: Arc<ScreenplayConfig>,
        formatter: Arc<ObjectFormatter>,
        sink: Arc<dyn ReportSink>,
        cancel: CancellationToken,
    ) -> Self {
        let recorder = FragmentRecorder::new(name.clone(), formatter, sink)
            .with_max_argument_len(config.max_argument_len)
            .with_logging(config.log_fragments);
        Self {
            abilities: AbilityStore::new(name.clone()),
            name,
            config,
            recorder,
            cancel,
        }
    }

    /// Actor name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grant an ability
    ///
    /// Replaces (and releases) a previously granted ability of the same type.
    ///
    /// # Errors
    /// See [`AbilityStore::add`].
    pub fn can<A: Ability>(&self, ability: A) -> Result<Arc<A>, ScreenplayError> {
        let granted = self.abilities.add(ability)?;
        tracing::debug!(actor = %self.name, ability = A::NAME, "ability granted");

        if self.config.emit_ability_events {
            let narration = granted.narrate(&self.name);
            self.recorder.sink().on_event(&CastEvent::now(CastEventKind::AbilityGained {
                actor: self.name.clone(),
                ability: A::NAME.to_string(),
                narration,
            }));
        }
        Ok(granted)
    }

    /// Look up ability `A`
    ///
    /// # Errors
    /// Returns `ScreenplayError::CapabilityNotGranted` if `A` was never granted.
    #[inline]
    pub fn ability<A: Ability>(&self) -> Result<Arc<A>, ScreenplayError> {
        self.abilities.get::<A>()
    }

    /// Check whether ability `A` is granted
    #[inline]
    #[must_use]
    pub fn has_ability<A: Ability>(&self) -> bool {
        self.abilities.has::<A>()
    }

    /// The actor's ability store
    #[inline]
    #[must_use]
    pub fn abilities(&self) -> &AbilityStore {
        &self.abilities
    }

    /// Token canceling this actor's chain
    #[inline]
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of steps currently in progress
    #[inline]
    #[must_use]
    pub fn steps_in_progress(&self) -> usize {
        self.recorder.open_frames()
    }

    /// Perform a setup step
    ///
    /// # Errors
    /// Propagates the performable's error unchanged.
    pub async fn was_able_to<P>(&self, performable: &P) -> Result<P::Output, ScreenplayError>
    where
        P: Performable + ?Sized,
    {
        self.perform(StepKind::Setup, performable, &self.cancel).await
    }

    /// Perform an action
    ///
    /// # Errors
    /// Propagates the performable's error unchanged.
    pub async fn attempts_to<P>(&self, performable: &P) -> Result<P::Output, ScreenplayError>
    where
        P: Performable + ?Sized,
    {
        self.perform(StepKind::Action, performable, &self.cancel).await
    }

    /// Ask a question
    ///
    /// # Errors
    /// Propagates the performable's error unchanged.
    pub async fn asks_for<P>(&self, question: &P) -> Result<P::Output, ScreenplayError>
    where
        P: Performable + ?Sized,
    {
        self.perform(StepKind::Question, question, &self.cancel).await
    }

    /// Perform an assertion
    ///
    /// # Errors
    /// Propagates the performable's error unchanged.
    pub async fn should<P>(&self, performable: &P) -> Result<P::Output, ScreenplayError>
    where
        P: Performable + ?Sized,
    {
        self.perform(StepKind::Assertion, performable, &self.cancel).await
    }

    /// Perform a step with an explicit cancellation token
    ///
    /// The narration is resolved before execution starts. Its fragment is
    /// emitted however the step ends: passed, failed with the error text, or
    /// canceled. Steps performed through this actor from within the body
    /// become children of this step's fragment, including steps the body
    /// runs concurrently. A panicking body is recorded as failed and the
    /// panic is resumed.
    ///
    /// # Errors
    /// - `ScreenplayError::Canceled` if `cancel` fires first
    /// - otherwise the performable's error, unchanged
    pub async fn perform<P>(
        &self,
        kind: StepKind,
        performable: &P,
        cancel: &CancellationToken,
    ) -> Result<P::Output, ScreenplayError>
    where
        P: Performable + ?Sized,
    {
        let narration = performable.narrate(&self.name).unwrap_or_else(|| {
            Narration::fallback(&self.config.fallback_verb, &performable.name())
        });
        let parent = CURRENT_FRAME.try_with(|id| *id).ok();
        let frame = self.recorder.open(kind, &narration, parent);

        if cancel.is_cancelled() {
            frame.close(Outcome::Canceled);
            return Err(ScreenplayError::Canceled);
        }

        let body = AssertUnwindSafe(CURRENT_FRAME.scope(frame.id(), performable.perform(self, cancel)))
            .catch_unwind();
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Ok(Err(ScreenplayError::Canceled)),
            result = body => result,
        };
        let result = match result {
            Ok(result) => result,
            Err(payload) => {
                frame.close(Outcome::failed(panic_reason(payload.as_ref())));
                std::panic::resume_unwind(payload)
            }
        };

        let outcome = match &result {
            Ok(_) => Outcome::Passed,
            Err(ScreenplayError::Canceled) => Outcome::Canceled,
            Err(err) => {
                tracing::debug!(actor = %self.name, step = ?kind, error = %err, "step failed");
                Outcome::failed(err.to_string())
            }
        };
        frame.close(outcome);
        result
    }

    /// Release every ability
    ///
    /// Only the first call does anything; further grants fail.
    pub fn retire(&self) {
        tracing::debug!(actor = %self.name, "retiring actor");
        self.abilities.release_all();
    }
}

/// Failure reason for a step whose body panicked
fn panic_reason(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str));
    match message {
        Some(message) => format!("panicked: {message}"),
        None => "panicked".to_string(),
    }
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("abilities", &self.abilities)
            .field("steps_in_progress", &self.steps_in_progress())
            .finish_non_exhaustive()
    }
}
