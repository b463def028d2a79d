//! Screenplay Core - actors, abilities and performables
//!
//! The execution side of the Screenplay pattern:
//! - Actors own abilities and perform steps
//! - Abilities are looked up by type and released when the actor retires
//! - Tasks and questions share the [`Performable`] protocol
//! - Every performed step is narrated into a report fragment
//! - A [`Cast`] scopes actors, the spotlight and cancellation to one scenario
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use screenplay_core::prelude::*;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI64, Ordering};
//!
//! struct Addition(AtomicI64);
//!
//! impl Ability for Addition {
//!     const NAME: &'static str = "Addition";
//! }
//!
//! struct Add(i64);
//!
//! #[async_trait]
//! impl Performable for Add {
//!     type Output = ();
//!
//!     async fn perform(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<(), ScreenplayError> {
//!         actor.ability::<Addition>()?.0.fetch_add(self.0, Ordering::SeqCst);
//!         Ok(())
//!     }
//!
//!     fn narrate(&self, _actor: &str) -> Option<Narration> {
//!         Some(Narration::new("{actor} adds {0}").with(self.0))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ScreenplayError> {
//! let sink = Arc::new(MemorySink::new());
//! let cast = Cast::new(sink.clone());
//! let joe = cast.actor_called("Joe");
//! joe.can(Addition(AtomicI64::new(0)))?;
//!
//! joe.attempts_to(&Add(2)).await?;
//! assert_eq!(sink.fragments()[0].text(), "Joe adds 2");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod ability;
pub mod actor;
pub mod cast;
pub mod config;
pub mod ensure;
pub mod error;
pub mod performable;
pub mod stopwatch;

pub use ability::{Ability, AbilityStore, CapabilityId};
pub use actor::Actor;
pub use cast::Cast;
pub use config::{ConfigError, ScreenplayConfig};
pub use ensure::Ensure;
pub use error::ScreenplayError;
pub use performable::{short_type_name, Performable, Sequence};
pub use stopwatch::{ElapsedTime, StartStopwatch, Stopwatch};

pub use screenplay_format::{FormatterBuilder, ObjectFormatter, Value};
pub use screenplay_report::{
    CastEvent, CastEventKind, MemorySink, Narration, Outcome, ReportFragment, ReportSink,
    ScenarioReport, StepKind,
};
pub use tokio_util::sync::CancellationToken;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing screenplay scenarios
    pub use crate::{
        Ability, Actor, Cast, CancellationToken, Ensure, MemorySink, Narration, Outcome,
        Performable, ScreenplayConfig, ScreenplayError, Sequence, StepKind, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
