//! Multi-instance environment registry.
//!
//! One registry per environment family owns the mapping from a
//! caller-chosen client index to an environment handle (or an absence
//! marker). Registries are plain constructor-injected objects; they are
//! never shared across families and carry no global state.
//!
//! Every slot sits behind its own mutex, so concurrent `reset`/`step`/
//! `close` calls against the same client index serialize instead of racing
//! on the handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::dynamics::TransitionEntry;
use crate::env::{Action, Environment, Info};
use crate::factory::{EnvFactory, MakeOptions};
use crate::spaces::ActionSpace;
use crate::timestep::TimeStep;
use crate::{EnvError, Result};

/// Small non-negative key chosen by the caller. Not validated against a
/// maximum; the registry grows lazily as new indices are used.
pub type ClientIndex = u32;

/// Slot map shared by the single-instance and vectorized registries:
/// client index -> handle-or-absent, with a per-index mutex.
pub(crate) struct Slots<T> {
    family: &'static str,
    map: RwLock<HashMap<ClientIndex, Arc<Mutex<Option<T>>>>>,
}

impl<T> Slots<T> {
    pub(crate) fn new(family: &'static str) -> Self {
        Self {
            family,
            map: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn family(&self) -> &'static str {
        self.family
    }

    /// Slot for an index the registry has already seen.
    fn existing(&self, cidx: ClientIndex) -> Result<Arc<Mutex<Option<T>>>> {
        self.map
            .read()
            .expect("registry slot map poisoned")
            .get(&cidx)
            .cloned()
            .ok_or(EnvError::NotFound {
                family: self.family,
                cidx,
            })
    }

    /// Slot for an index, created empty on first use.
    fn existing_or_new(&self, cidx: ClientIndex) -> Arc<Mutex<Option<T>>> {
        if let Some(slot) = self
            .map
            .read()
            .expect("registry slot map poisoned")
            .get(&cidx)
        {
            return Arc::clone(slot);
        }
        let mut map = self.map.write().expect("registry slot map poisoned");
        Arc::clone(map.entry(cidx).or_default())
    }

    /// True iff a live handle exists at the index; a never-seen index is a
    /// not-found error, distinguished from "known but absent".
    pub(crate) fn is_alive(&self, cidx: ClientIndex) -> Result<bool> {
        let slot = self.existing(cidx)?;
        let guard = slot.lock().expect("registry slot poisoned");
        Ok(guard.is_some())
    }

    /// Replace the handle at the index, closing any previous one. The new
    /// handle is built while the slot lock is held, so callers never
    /// observe partial state.
    pub(crate) fn install(
        &self,
        cidx: ClientIndex,
        build: impl FnOnce() -> Result<T>,
        close: impl FnOnce(&mut T),
    ) -> Result<()> {
        let slot = self.existing_or_new(cidx);
        let mut guard = slot.lock().expect("registry slot poisoned");
        if let Some(mut old) = guard.take() {
            close(&mut old);
        }
        // A construction failure leaves the index without a valid handle.
        *guard = Some(build()?);
        Ok(())
    }

    /// Remove and return the handle so the caller can release it.
    pub(crate) fn remove(&self, cidx: ClientIndex) -> Result<T> {
        let slot = self.existing(cidx)?;
        let mut guard = slot.lock().expect("registry slot poisoned");
        guard.take().ok_or(EnvError::NotFound {
            family: self.family,
            cidx,
        })
    }

    /// Run an operation against the live handle at the index.
    pub(crate) fn with<R>(&self, cidx: ClientIndex, op: impl FnOnce(&mut T) -> R) -> Result<R> {
        let slot = self.existing(cidx)?;
        let mut guard = slot.lock().expect("registry slot poisoned");
        match guard.as_mut() {
            Some(handle) => Ok(op(handle)),
            None => Err(EnvError::NotInitialized {
                family: self.family,
            }),
        }
    }
}

/// Result of a dynamics query: either the full per-action table for a
/// state, or the branch list for one state-action pair.
#[derive(Clone, Debug)]
pub enum DynamicsView {
    /// `row[action]` lists the branches for that action
    Row(Vec<Vec<TransitionEntry>>),
    /// Branches for a single state-action pair
    Branches(Vec<TransitionEntry>),
}

impl Serialize for DynamicsView {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            // Serialized as an object keyed by the action code, matching
            // the per-state table shape clients already consume.
            DynamicsView::Row(row) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(row.len()))?;
                for (action, branches) in row.iter().enumerate() {
                    map.serialize_entry(&action.to_string(), branches)?;
                }
                map.end()
            }
            DynamicsView::Branches(branches) => branches.serialize(serializer),
        }
    }
}

/// Registry of single-instance environments for one family.
pub struct EnvRegistry<E: Environment> {
    slots: Slots<E>,
    factory: Box<dyn EnvFactory<Env = E>>,
}

impl<E: Environment> EnvRegistry<E> {
    pub fn new(family: &'static str, factory: Box<dyn EnvFactory<Env = E>>) -> Self {
        Self {
            slots: Slots::new(family),
            factory,
        }
    }

    pub fn family(&self) -> &'static str {
        self.slots.family()
    }

    /// The family's declared action space, available without an instance.
    pub fn action_space(&self) -> ActionSpace {
        self.factory.action_space()
    }

    /// Construct a new environment at the index, closing any previous
    /// handle there first.
    pub fn make(&self, cidx: ClientIndex, version: Option<&str>, options: &MakeOptions) -> Result<()> {
        let version = version.unwrap_or_else(|| self.factory.default_version());
        self.slots.install(
            cidx,
            || self.factory.make(version, options),
            |env| env.close(),
        )?;
        debug!(family = self.family(), cidx, version, "installed environment");
        Ok(())
    }

    /// Release the handle and mark the index absent.
    pub fn close(&self, cidx: ClientIndex) -> Result<()> {
        let mut env = self.slots.remove(cidx)?;
        env.close();
        debug!(family = self.family(), cidx, "released environment");
        Ok(())
    }

    pub fn is_alive(&self, cidx: ClientIndex) -> Result<bool> {
        self.slots.is_alive(cidx)
    }

    /// Reseed and reset the environment, producing a FIRST time step.
    pub fn reset(&self, cidx: ClientIndex, seed: Option<u64>, options: &Info) -> Result<TimeStep> {
        self.slots.with(cidx, |env| {
            let (observation, info) = env.reset(seed, options);
            TimeStep::first(observation, info)
        })
    }

    /// Validate the action against the declared space, then advance the
    /// environment one transition. Out-of-space actions are rejected
    /// without mutating environment state.
    pub fn step(&self, cidx: ClientIndex, action: &Action) -> Result<TimeStep> {
        self.slots.with(cidx, |env| {
            if !env.action_space().contains(action) {
                return Err(EnvError::InvalidAction {
                    family: self.slots.family(),
                    action: action.to_string(),
                });
            }
            Ok(TimeStep::from_outcome(env.step(action)))
        })?
    }

    /// Transition-table query, for families that expose one.
    pub fn dynamics(
        &self,
        cidx: ClientIndex,
        state_id: u64,
        action_id: Option<u64>,
    ) -> Result<DynamicsView> {
        self.slots.with(cidx, |env| {
            let table = env
                .transition_table()
                .ok_or(EnvError::UnsupportedDynamics {
                    family: self.slots.family(),
                })?;
            let state = state_id as usize;
            match action_id {
                None => {
                    let row = table.state_row(state).ok_or_else(|| {
                        EnvError::InvalidInput(format!(
                            "State {state_id} is out of bounds for {} states",
                            table.num_states()
                        ))
                    })?;
                    Ok(DynamicsView::Row(row.to_vec()))
                }
                Some(action) => {
                    let branches =
                        table.branches(state, action as usize).ok_or_else(|| {
                            EnvError::InvalidInput(format!(
                                "State {state_id} or action {action} is out of bounds"
                            ))
                        })?;
                    Ok(DynamicsView::Branches(branches.to_vec()))
                }
            }
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::TransitionTable;
    use crate::env::{Observation, StepOutcome};
    use crate::spaces::DiscreteSpace;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Environment that terminates after a fixed number of steps.
    struct MockEnv {
        state: u64,
        horizon: u64,
        table: Option<TransitionTable>,
        closed: Arc<AtomicUsize>,
    }

    impl Environment for MockEnv {
        fn name(&self) -> &'static str {
            "Mock"
        }

        fn action_space(&self) -> ActionSpace {
            ActionSpace::Discrete(DiscreteSpace::new(vec!["NOOP", "ADVANCE"]))
        }

        fn reset(&mut self, _seed: Option<u64>, _options: &Info) -> (Observation, Info) {
            self.state = 0;
            (Observation::State(0), Info::new())
        }

        fn step(&mut self, _action: &Action) -> StepOutcome {
            self.state += 1;
            StepOutcome {
                observation: Observation::State(self.state),
                reward: 1.0,
                terminated: self.state >= self.horizon,
                truncated: false,
                info: Info::new(),
            }
        }

        fn transition_table(&self) -> Option<&TransitionTable> {
            self.table.as_ref()
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockFactory {
        with_table: bool,
        closed: Arc<AtomicUsize>,
    }

    impl EnvFactory for MockFactory {
        type Env = MockEnv;

        fn action_space(&self) -> ActionSpace {
            ActionSpace::Discrete(DiscreteSpace::new(vec!["NOOP", "ADVANCE"]))
        }

        fn make(&self, version: &str, options: &MakeOptions) -> Result<MockEnv> {
            if version != "v1" {
                return Err(EnvError::Construction(format!(
                    "Unknown Mock version {version}"
                )));
            }
            let mut table = None;
            if self.with_table {
                let mut t = TransitionTable::new(2, 2);
                t.push(
                    0,
                    1,
                    TransitionEntry {
                        probability: 1.0,
                        next_state: 1,
                        reward: 1.0,
                        terminal: true,
                    },
                );
                table = Some(t);
            }
            Ok(MockEnv {
                state: 0,
                horizon: options.u64_or("horizon", 3)?,
                table,
                closed: Arc::clone(&self.closed),
            })
        }
    }

    fn registry(with_table: bool) -> (EnvRegistry<MockEnv>, Arc<AtomicUsize>) {
        let closed = Arc::new(AtomicUsize::new(0));
        let factory = MockFactory {
            with_table,
            closed: Arc::clone(&closed),
        };
        (EnvRegistry::new("Mock", Box::new(factory)), closed)
    }

    #[test]
    fn test_is_alive_lifecycle() {
        let (reg, _) = registry(false);

        // never-seen index is a not-found condition, not "false"
        assert!(matches!(
            reg.is_alive(0),
            Err(EnvError::NotFound { cidx: 0, .. })
        ));

        reg.make(0, None, &MakeOptions::default()).unwrap();
        assert!(reg.is_alive(0).unwrap());

        reg.close(0).unwrap();
        assert!(!reg.is_alive(0).unwrap());
    }

    #[test]
    fn test_step_before_make_is_not_initialized() {
        let (reg, _) = registry(false);
        assert!(matches!(
            reg.step(5, &Action::Discrete(0)),
            Err(EnvError::NotFound { cidx: 5, .. })
        ));

        reg.make(5, None, &MakeOptions::default()).unwrap();
        reg.close(5).unwrap();
        assert!(matches!(
            reg.step(5, &Action::Discrete(0)),
            Err(EnvError::NotInitialized { .. })
        ));
    }

    #[test]
    fn test_close_absent_is_not_found() {
        let (reg, _) = registry(false);
        assert!(matches!(reg.close(0), Err(EnvError::NotFound { .. })));

        reg.make(0, None, &MakeOptions::default()).unwrap();
        reg.close(0).unwrap();
        // second close reports not-found, never a silent no-op
        assert!(matches!(reg.close(0), Err(EnvError::NotFound { .. })));
    }

    #[test]
    fn test_repeated_make_closes_previous_instance() {
        let (reg, closed) = registry(false);
        for _ in 0..5 {
            reg.make(0, None, &MakeOptions::default()).unwrap();
        }
        // 5 makes, 4 replacements closed: exactly one live instance
        assert_eq!(closed.load(Ordering::SeqCst), 4);
        assert!(reg.is_alive(0).unwrap());
    }

    #[test]
    fn test_construction_failure_leaves_index_without_handle() {
        let (reg, _) = registry(false);
        let err = reg.make(0, Some("v9"), &MakeOptions::default()).unwrap_err();
        assert!(matches!(err, EnvError::Construction(_)));
        assert!(!reg.is_alive(0).unwrap());
    }

    #[test]
    fn test_reset_and_step_classification() {
        let (reg, _) = registry(false);
        reg.make(0, None, &MakeOptions::default()).unwrap();

        let first = reg.reset(0, Some(42), &Info::new()).unwrap();
        assert!(first.step_type.is_first());
        assert_eq!(first.reward, Some(0.0));
        assert_eq!(first.discount, Some(1.0));

        let mid = reg.step(0, &Action::Discrete(1)).unwrap();
        assert!(mid.step_type.is_mid());
        let mid = reg.step(0, &Action::Discrete(1)).unwrap();
        assert!(mid.step_type.is_mid());
        let last = reg.step(0, &Action::Discrete(1)).unwrap();
        assert!(last.step_type.is_last());
    }

    #[test]
    fn test_invalid_action_rejected_without_mutation() {
        let (reg, _) = registry(false);
        reg.make(0, None, &MakeOptions::default()).unwrap();
        reg.reset(0, Some(42), &Info::new()).unwrap();

        let err = reg.step(0, &Action::Discrete(7)).unwrap_err();
        assert!(matches!(err, EnvError::InvalidAction { .. }));

        // a subsequent valid step behaves as if the invalid call never happened
        let step = reg.step(0, &Action::Discrete(1)).unwrap();
        assert_eq!(step.observation, Observation::State(1));
    }

    #[test]
    fn test_dynamics_unsupported_family() {
        let (reg, _) = registry(false);
        reg.make(0, None, &MakeOptions::default()).unwrap();
        assert!(matches!(
            reg.dynamics(0, 0, None),
            Err(EnvError::UnsupportedDynamics { .. })
        ));
    }

    #[test]
    fn test_dynamics_before_make_is_an_error() {
        let (reg, _) = registry(true);
        assert!(matches!(
            reg.dynamics(0, 0, Some(1)),
            Err(EnvError::NotFound { .. })
        ));
    }

    #[test]
    fn test_dynamics_views() {
        let (reg, _) = registry(true);
        reg.make(0, None, &MakeOptions::default()).unwrap();

        let pair = reg.dynamics(0, 0, Some(1)).unwrap();
        match pair {
            DynamicsView::Branches(branches) => {
                assert_eq!(branches.len(), 1);
                assert_eq!(branches[0].next_state, 1);
            }
            DynamicsView::Row(_) => panic!("expected single-pair view"),
        }

        let row = reg.dynamics(0, 0, None).unwrap();
        match row {
            DynamicsView::Row(row) => assert_eq!(row.len(), 2),
            DynamicsView::Branches(_) => panic!("expected full row"),
        }

        assert!(matches!(
            reg.dynamics(0, 99, None),
            Err(EnvError::InvalidInput(_))
        ));
    }
}
