//! Testing utilities for the screenplay workspace
//!
//! Shared abilities, performables and fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use screenplay_core::{Ability, Actor, Cast, Performable, ScreenplayConfig, ScreenplayError};
use screenplay_format::{ObjectFormatter, Value};
use screenplay_report::{MemorySink, Narration, StepKind};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Running total an actor can add to
#[derive(Debug, Default)]
pub struct Addition {
    total: AtomicI64,
    released: AtomicUsize,
}

impl Addition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> i64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn times_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Ability for Addition {
    const NAME: &'static str = "Addition";

    fn narrate(&self, actor: &str) -> String {
        format!("{actor} can add numbers")
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Add(pub i64);

#[async_trait]
impl Performable for Add {
    type Output = ();

    async fn perform(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        actor.ability::<Addition>()?.total.fetch_add(self.0, Ordering::SeqCst);
        Ok(())
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(Narration::new("{actor} adds {0}").with(self.0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Total;

#[async_trait]
impl Performable for Total {
    type Output = i64;

    async fn perform(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<i64, ScreenplayError> {
        Ok(actor.ability::<Addition>()?.total())
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(Narration::new("{actor} asks for the total"))
    }
}

/// Web browsing, identified by its base URL
#[derive(Debug)]
pub struct Browsing {
    pub base_url: String,
}

impl Browsing {
    pub fn at(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Ability for Browsing {
    const NAME: &'static str = "Browsing";

    fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base url is empty".to_string());
        }
        Ok(())
    }

    fn narrate(&self, actor: &str) -> String {
        format!("{actor} can browse {}", self.base_url)
    }
}

#[derive(Debug, Clone)]
pub struct OpenPage(pub String);

#[async_trait]
impl Performable for OpenPage {
    type Output = String;

    async fn perform(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<String, ScreenplayError> {
        let browsing = actor.ability::<Browsing>()?;
        Ok(format!("{}{}", browsing.base_url, self.0))
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(Narration::new("{actor} opens {0}").with(self.0.clone()))
    }
}

/// Task that always fails with `message`
#[derive(Debug, Clone)]
pub struct Fail(pub &'static str);

#[async_trait]
impl Performable for Fail {
    type Output = ();

    async fn perform(&self, _actor: &Actor, _cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        Err(anyhow::anyhow!(self.0).into())
    }
}

/// Task nesting `depth` further levels below itself
#[derive(Debug, Clone, Copy)]
pub struct Nested(pub usize);

#[async_trait]
impl Performable for Nested {
    type Output = ();

    async fn perform(&self, actor: &Actor, cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        if self.0 > 0 {
            actor.perform(StepKind::Action, &Nested(self.0 - 1), cancel).await?;
        }
        Ok(())
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(Narration::new("{actor} descends to level {0}").with(self.0))
    }
}

/// Task sleeping for a while, or until canceled
#[derive(Debug, Clone, Copy)]
pub struct Wait(pub Duration);

#[async_trait]
impl Performable for Wait {
    type Output = ();

    async fn perform(&self, _actor: &Actor, _cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(Narration::new("{actor} waits for {0}").with(Value::object(self.0)))
    }
}

/// Composite adding to the total, then waiting
#[derive(Debug, Clone, Copy)]
pub struct WorkThenWait {
    pub add: i64,
    pub wait: Duration,
}

#[async_trait]
impl Performable for WorkThenWait {
    type Output = ();

    async fn perform(&self, actor: &Actor, cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        actor.perform(StepKind::Action, &Add(self.add), cancel).await?;
        actor.perform(StepKind::Action, &Wait(self.wait), cancel).await
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(Narration::new("{actor} works, then waits"))
    }
}

/// Composite waiting on two timers at once
#[derive(Debug, Clone, Copy)]
pub struct WaitBoth(pub Duration, pub Duration);

#[async_trait]
impl Performable for WaitBoth {
    type Output = ();

    async fn perform(&self, actor: &Actor, cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        let wait_first = Wait(self.0);
        let wait_second = Wait(self.1);
        let (first, second) = tokio::join!(
            actor.perform(StepKind::Action, &wait_first, cancel),
            actor.perform(StepKind::Action, &wait_second, cancel),
        );
        first?;
        second
    }

    fn narrate(&self, _actor: &str) -> Option<Narration> {
        Some(Narration::new("{actor} waits on two timers"))
    }
}

/// Install a test-friendly tracing subscriber
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Cast reporting into a fresh memory sink
pub fn memory_cast() -> (Cast, Arc<MemorySink>) {
    memory_cast_with(ScreenplayConfig::default())
}

/// Cast with `config`, reporting into a fresh memory sink
pub fn memory_cast_with(config: ScreenplayConfig) -> (Cast, Arc<MemorySink>) {
    init_tracing();
    let sink = Arc::new(MemorySink::new());
    let cast = Cast::with_config(config, Arc::new(ObjectFormatter::with_defaults()), sink.clone())
        .expect("valid test configuration");
    (cast, sink)
}

/// Rendered text of every top-level fragment
pub fn texts(sink: &MemorySink) -> Vec<String> {
    sink.fragments().iter().map(|f| f.text().to_string()).collect()
}
