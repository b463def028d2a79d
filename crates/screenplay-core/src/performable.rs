//! Performable protocol
//!
//! Tasks and questions share one trait: a task is a performable whose
//! `Output` is `()`, a question returns a value. Both run through the same
//! actor entry points, so narration and fragment building exist once.

use crate::actor::Actor;
use crate::error::ScreenplayError;
use async_trait::async_trait;
use screenplay_report::{Narration, StepKind};
use tokio_util::sync::CancellationToken;

/// Unit of behaviour an actor can perform
///
/// Each call to [`Performable::perform`] is a fresh execution; nothing is
/// memoized between calls. Composite performables invoke children through
/// the actor (`actor.attempts_to(&child)`), which nests their fragments.
#[async_trait]
pub trait Performable: Send + Sync {
    /// Produced value; `()` for tasks
    type Output: Send;

    /// Execute against `actor`
    ///
    /// # Errors
    /// Any error is propagated unchanged to the actor-facing caller.
    async fn perform(
        &self,
        actor: &Actor,
        cancel: &CancellationToken,
    ) -> Result<Self::Output, ScreenplayError>;

    /// Custom narration
    ///
    /// `None` selects the fallback `"<actor> performs <name>."`.
    fn narrate(&self, _actor: &str) -> Option<Narration> {
        None
    }

    /// Name used by the fallback narration
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>()).to_string()
    }
}

/// Last path segment of a type name, without generic arguments
///
/// `my_app::tasks::Login<Admin>` becomes `Login`.
#[must_use]
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Tasks performed one after another
///
/// Stops at the first failing step. Each step is reported as a child of
/// the sequence.
#[derive(Default)]
pub struct Sequence {
    description: Option<String>,
    steps: Vec<Box<dyn Performable<Output = ()>>>,
}

impl Sequence {
    /// Create empty sequence
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step
    #[inline]
    #[must_use]
    pub fn then(mut self, step: impl Performable<Output = ()> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Narrate the sequence as `"{actor} <description>"`
    #[inline]
    #[must_use]
    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if there are no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("description", &self.description)
            .field("steps", &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl Performable for Sequence {
    type Output = ();

    async fn perform(&self, actor: &Actor, cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        for step in &self.steps {
            actor.perform(StepKind::Action, step.as_ref(), cancel).await?;
        }
        Ok(())
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(match &self.description {
            Some(description) => {
                let escaped = description.replace('{', "{{").replace('}', "}}");
                Narration::new(format!("{{actor}} {escaped}"))
            }
            None => Narration::new("{actor} performs {0} steps").with(self.steps.len()),
        })
    }
}
