//! Cast of actors for one scenario
//!
//! The cast owns actor creation (names are unique), the spotlight, and the
//! scenario-wide cancellation token. Spotlight state is a plain field, so
//! concurrently running scenarios each have their own.

use crate::actor::Actor;
use crate::config::ScreenplayConfig;
use crate::error::ScreenplayError;
use indexmap::IndexMap;
use parking_lot::Mutex;
use screenplay_format::ObjectFormatter;
use screenplay_report::{CastEvent, CastEventKind, ReportSink};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Actors taking part in one scenario
pub struct Cast {
    config: Arc<ScreenplayConfig>,
    formatter: Arc<ObjectFormatter>,
    sink: Arc<dyn ReportSink>,
    actors: Mutex<IndexMap<String, Arc<Actor>>>,
    spotlight: Mutex<Option<Arc<Actor>>>,
    cancel: CancellationToken,
}

impl Cast {
    /// Create cast with the default configuration and global formatter
    #[must_use]
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self {
            config: Arc::new(ScreenplayConfig::default()),
            formatter: ObjectFormatter::global(),
            sink,
            actors: Mutex::new(IndexMap::new()),
            spotlight: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Create cast with explicit configuration and formatter
    ///
    /// # Errors
    /// Returns `ScreenplayError::Config` if `config` fails validation.
    pub fn with_config(
        config: ScreenplayConfig,
        formatter: Arc<ObjectFormatter>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, ScreenplayError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            formatter,
            sink,
            actors: Mutex::new(IndexMap::new()),
            spotlight: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    /// Configuration shared by every actor
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ScreenplayConfig {
        &self.config
    }

    /// Get the actor called `name`, creating it on first use
    pub fn actor_called(&self, name: &str) -> Arc<Actor> {
        let (actor, created) = {
            let mut actors = self.actors.lock();
            match actors.get(name) {
                Some(actor) => (actor.clone(), false),
                None => {
                    let actor = Arc::new(Actor::with_parts(
                        name.to_string(),
                        self.config.clone(),
                        self.formatter.clone(),
                        self.sink.clone(),
                        self.cancel.child_token(),
                    ));
                    actors.insert(name.to_string(), actor.clone());
                    (actor, true)
                }
            }
        };

        if created {
            tracing::debug!(actor = name, "actor joined the cast");
            self.sink.on_event(&CastEvent::now(CastEventKind::ActorCreated {
                actor: name.to_string(),
            }));
        }
        actor
    }

    /// Existing actor called `name`
    #[must_use]
    pub fn actor(&self, name: &str) -> Option<Arc<Actor>> {
        self.actors.lock().get(name).cloned()
    }

    /// All actors, in creation order
    #[must_use]
    pub fn actors(&self) -> Vec<Arc<Actor>> {
        self.actors.lock().values().cloned().collect()
    }

    /// Number of actors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.lock().len()
    }

    /// Check if the cast has no actors
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.lock().is_empty()
    }

    /// Put the actor called `name` in the spotlight
    ///
    /// Narration only; execution is unaffected.
    ///
    /// # Errors
    /// Returns `ScreenplayError::UnknownActor` if no such actor exists.
    pub fn spotlight(&self, name: &str) -> Result<Arc<Actor>, ScreenplayError> {
        let actor = self.actor(name).ok_or_else(|| ScreenplayError::UnknownActor {
            name: name.to_string(),
        })?;
        *self.spotlight.lock() = Some(actor.clone());
        self.sink.on_event(&CastEvent::now(CastEventKind::ActorSpotlit {
            actor: name.to_string(),
        }));
        Ok(actor)
    }

    /// Actor currently in the spotlight
    #[must_use]
    pub fn in_the_spotlight(&self) -> Option<Arc<Actor>> {
        self.spotlight.lock().clone()
    }

    /// Clear the spotlight
    ///
    /// Emits an event only if someone was in the spotlight.
    pub fn clear_spotlight(&self) {
        let previous = self.spotlight.lock().take();
        if previous.is_some() {
            self.sink.on_event(&CastEvent::now(CastEventKind::SpotlightCleared));
        }
    }

    /// Cancel every actor's chain
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Scenario-wide cancellation token
    #[inline]
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Retire every actor, in creation order
    ///
    /// Releases their abilities and clears the spotlight. Actors stay
    /// reachable by name for report inspection.
    pub fn dismiss(&self) {
        self.clear_spotlight();
        for actor in self.actors() {
            actor.retire();
        }
    }
}

impl std::fmt::Debug for Cast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cast")
            .field("actors", &self.actors.lock().keys().collect::<Vec<_>>())
            .field(
                "spotlight",
                &self.spotlight.lock().as_ref().map(|a| a.name().to_string()),
            )
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
