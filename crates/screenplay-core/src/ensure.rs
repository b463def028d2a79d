//! Assertions over question answers

use crate::actor::Actor;
use crate::error::ScreenplayError;
use crate::performable::Performable;
use async_trait::async_trait;
use screenplay_report::{Narration, StepKind};
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Ask a question and check its answer
///
/// Meant for `actor.should(&Ensure::that(...))`. The question is reported
/// as a child step; a rejected answer fails with
/// [`ScreenplayError::Assertion`].
pub struct Ensure<Q, F> {
    question: Q,
    expectation: String,
    check: F,
}

impl<Q, F> Ensure<Q, F>
where
    Q: Performable,
    Q::Output: Debug,
    F: Fn(&Q::Output) -> bool + Send + Sync,
{
    /// Expect `check` to accept the answer to `question`
    ///
    /// `expectation` completes the sentence "should see that <question> ...".
    #[must_use]
    pub fn that(question: Q, expectation: impl Into<String>, check: F) -> Self {
        Self {
            question,
            expectation: expectation.into(),
            check,
        }
    }
}

impl<Q> Ensure<Q, Box<dyn Fn(&Q::Output) -> bool + Send + Sync>>
where
    Q: Performable,
    Q::Output: Debug + PartialEq + Sync + 'static,
{
    /// Expect the answer to equal `expected`
    #[must_use]
    pub fn equals(question: Q, expected: Q::Output) -> Self {
        let expectation = format!("is {expected:?}");
        Self {
            question,
            expectation,
            check: Box::new(move |answer| *answer == expected),
        }
    }
}

#[async_trait]
impl<Q, F> Performable for Ensure<Q, F>
where
    Q: Performable,
    Q::Output: Debug,
    F: Fn(&Q::Output) -> bool + Send + Sync,
{
    type Output = Q::Output;

    async fn perform(&self, actor: &Actor, cancel: &CancellationToken) -> Result<Q::Output, ScreenplayError> {
        let answer = actor.perform(StepKind::Question, &self.question, cancel).await?;
        if (self.check)(&answer) {
            Ok(answer)
        } else {
            Err(ScreenplayError::assertion(format!(
                "expected {} {}, but it was {:?}",
                self.question.name(),
                self.expectation,
                answer
            )))
        }
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(
            Narration::new("{actor} should see that {0} {1}")
                .with(self.question.name())
                .with(self.expectation.clone()),
        )
    }
}
