//! Abilities and the per-actor ability store
//!
//! An ability is keyed by its Rust type. Each actor holds at most one
//! instance per ability type; granting a second one replaces the first and
//! releases it before [`AbilityStore::add`] returns.

use crate::error::ScreenplayError;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Capability an actor can be granted
///
/// Abilities are shared behind `Arc`, so state that changes while the actor
/// performs goes behind interior mutability.
pub trait Ability: Send + Sync + 'static {
    /// Capability name used in reports and errors
    const NAME: &'static str;

    /// Check the instance before it is granted
    ///
    /// # Errors
    /// Returns a human-readable reason if the instance is unusable.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Narration for the "actor gained an ability" event
    fn narrate(&self, actor: &str) -> String {
        format!("{actor} can use {}", Self::NAME)
    }

    /// Release held resources
    ///
    /// Called exactly once, when the ability is replaced or its actor retires.
    fn release(&self) {}
}

/// Identifier of a capability type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityId {
    type_id: TypeId,
    name: &'static str,
}

impl CapabilityId {
    /// Identifier of ability type `A`
    #[inline]
    #[must_use]
    pub fn of<A: Ability>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            name: A::NAME,
        }
    }

    /// Capability name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Object-safe view used to release abilities of any type
trait Held: Send + Sync {
    fn dispose(&self);
}

impl<A: Ability> Held for A {
    fn dispose(&self) {
        Ability::release(self);
    }
}

struct Entry {
    id: CapabilityId,
    instance: Arc<dyn Any + Send + Sync>,
    held: Arc<dyn Held>,
}

#[derive(Default)]
struct StoreState {
    entries: IndexMap<TypeId, Entry>,
    retired: bool,
}

/// Registry of one actor's abilities
///
/// Every mutation is a single synchronous critical section, so it is never
/// observed half-applied.
pub struct AbilityStore {
    owner: String,
    state: Mutex<StoreState>,
}

impl AbilityStore {
    /// Create empty store for actor `owner`
    #[inline]
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Name of the owning actor
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Grant an ability
    ///
    /// An instance of the same type already present is replaced and released
    /// before this returns.
    ///
    /// # Errors
    /// - `ScreenplayError::InvalidCapability` if the ability has an empty
    ///   name or its [`Ability::validate`] hook rejects it; nothing changes
    /// - `ScreenplayError::ActorRetired` after [`AbilityStore::release_all`]
    pub fn add<A: Ability>(&self, ability: A) -> Result<Arc<A>, ScreenplayError> {
        if A::NAME.trim().is_empty() {
            return Err(ScreenplayError::InvalidCapability {
                capability: A::NAME,
                reason: "capability name is empty".to_string(),
            });
        }
        ability
            .validate()
            .map_err(|reason| ScreenplayError::InvalidCapability {
                capability: A::NAME,
                reason,
            })?;

        let instance = Arc::new(ability);
        let entry = Entry {
            id: CapabilityId::of::<A>(),
            instance: instance.clone(),
            held: instance.clone(),
        };

        let replaced = {
            let mut state = self.state.lock();
            if state.retired {
                return Err(ScreenplayError::ActorRetired {
                    actor: self.owner.clone(),
                    capability: A::NAME,
                });
            }
            let replaced = state.entries.shift_remove(&TypeId::of::<A>());
            state.entries.insert(TypeId::of::<A>(), entry);
            replaced
        };

        if let Some(old) = replaced {
            tracing::debug!(actor = %self.owner, ability = old.id.name(), "replacing ability");
            old.held.dispose();
        }
        Ok(instance)
    }

    /// Look up ability `A`
    ///
    /// # Errors
    /// Returns `ScreenplayError::CapabilityNotGranted` naming the capability
    /// and the actor if `A` was never granted.
    pub fn get<A: Ability>(&self) -> Result<Arc<A>, ScreenplayError> {
        let instance = self
            .state
            .lock()
            .entries
            .get(&TypeId::of::<A>())
            .map(|entry| entry.instance.clone());

        instance
            .and_then(|any| any.downcast::<A>().ok())
            .ok_or_else(|| ScreenplayError::CapabilityNotGranted {
                capability: A::NAME,
                actor: self.owner.clone(),
            })
    }

    /// Check whether ability `A` is granted
    #[inline]
    #[must_use]
    pub fn has<A: Ability>(&self) -> bool {
        self.state.lock().entries.contains_key(&TypeId::of::<A>())
    }

    /// Granted capability names, in registration order
    #[must_use]
    pub fn capabilities(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .entries
            .values()
            .map(|entry| entry.id.name())
            .collect()
    }

    /// Number of granted abilities
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Check if no ability is granted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Whether [`AbilityStore::release_all`] has run
    #[inline]
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.state.lock().retired
    }

    /// Release every ability in registration order
    ///
    /// Only the first call does anything.
    pub fn release_all(&self) {
        let drained: Vec<Entry> = {
            let mut state = self.state.lock();
            if state.retired {
                return;
            }
            state.retired = true;
            state.entries.drain(..).map(|(_, entry)| entry).collect()
        };

        for entry in drained {
            tracing::debug!(actor = %self.owner, ability = entry.id.name(), "releasing ability");
            entry.held.dispose();
        }
    }
}

impl Drop for AbilityStore {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl std::fmt::Debug for AbilityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityStore")
            .field("owner", &self.owner)
            .field("capabilities", &self.capabilities())
            .field("retired", &self.is_retired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as Log;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Session {
        label: &'static str,
        releases: Arc<AtomicUsize>,
    }

    impl Session {
        fn new(label: &'static str) -> (Self, Arc<AtomicUsize>) {
            let releases = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    label,
                    releases: releases.clone(),
                },
                releases,
            )
        }
    }

    impl Ability for Session {
        const NAME: &'static str = "Session";

        fn release(&self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Broken;

    impl Ability for Broken {
        const NAME: &'static str = "Broken";

        fn validate(&self) -> Result<(), String> {
            Err("no endpoint configured".to_string())
        }
    }

    struct Nameless;

    impl Ability for Nameless {
        const NAME: &'static str = "";
    }

    struct Ordered {
        label: &'static str,
        log: Arc<Log<Vec<&'static str>>>,
    }

    impl Ability for Ordered {
        const NAME: &'static str = "Ordered";

        fn release(&self) {
            self.log.lock().push(self.label);
        }
    }

    struct AlsoOrdered(Ordered);

    impl Ability for AlsoOrdered {
        const NAME: &'static str = "AlsoOrdered";

        fn release(&self) {
            self.0.release();
        }
    }

    #[test]
    fn add_then_get_returns_same_instance() {
        let store = AbilityStore::new("Joe");
        let (session, _) = Session::new("first");

        let granted = store.add(session).unwrap();
        let fetched = store.get::<Session>().unwrap();

        assert!(Arc::ptr_eq(&granted, &fetched));
        assert!(store.has::<Session>());
    }

    #[test]
    fn replace_releases_previous_once() {
        let store = AbilityStore::new("Joe");
        let (first, first_releases) = Session::new("first");
        let (second, second_releases) = Session::new("second");

        store.add(first).unwrap();
        store.add(second).unwrap();

        assert_eq!(store.get::<Session>().unwrap().label, "second");
        assert_eq!(first_releases.load(Ordering::SeqCst), 1);
        assert_eq!(second_releases.load(Ordering::SeqCst), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_missing_is_not_granted() {
        let store = AbilityStore::new("Ann");
        let err = store.get::<Session>().unwrap_err();
        assert!(matches!(
            err,
            ScreenplayError::CapabilityNotGranted { capability: "Session", ref actor } if actor == "Ann"
        ));
        assert!(!store.has::<Session>());
    }

    #[test]
    fn invalid_ability_is_rejected_without_change() {
        let store = AbilityStore::new("Joe");
        assert!(matches!(
            store.add(Broken),
            Err(ScreenplayError::InvalidCapability { capability: "Broken", .. })
        ));
        assert!(matches!(
            store.add(Nameless),
            Err(ScreenplayError::InvalidCapability { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn release_all_in_registration_order_and_idempotent() {
        let log = Arc::new(Log::new(Vec::new()));
        let store = AbilityStore::new("Joe");
        store
            .add(Ordered {
                label: "browser",
                log: log.clone(),
            })
            .unwrap();
        store
            .add(AlsoOrdered(Ordered {
                label: "api",
                log: log.clone(),
            }))
            .unwrap();

        store.release_all();
        store.release_all();

        assert_eq!(*log.lock(), vec!["browser", "api"]);
        assert!(store.is_retired());
        assert!(store.is_empty());
    }

    #[test]
    fn add_after_retire_fails() {
        let store = AbilityStore::new("Joe");
        store.release_all();
        let (session, releases) = Session::new("late");
        assert!(matches!(store.add(session), Err(ScreenplayError::ActorRetired { .. })));
        assert_eq!(releases.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drop_releases() {
        let (session, releases) = Session::new("dropped");
        {
            let store = AbilityStore::new("Joe");
            store.add(session).unwrap();
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn capabilities_listed_in_order() {
        let store = AbilityStore::new("Joe");
        let (session, _) = Session::new("s");
        store.add(session).unwrap();
        store
            .add(Ordered {
                label: "o",
                log: Arc::new(Log::new(Vec::new())),
            })
            .unwrap();
        assert_eq!(store.capabilities(), vec!["Session", "Ordered"]);
        assert_eq!(CapabilityId::of::<Session>().name(), "Session");
    }
}
