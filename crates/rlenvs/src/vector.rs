//! Vectorized environment execution.
//!
//! Runs N independent copies of an environment one at a time in a single
//! thread, the batch size fixed at creation. Step results are assembled as
//! parallel arrays ([`TimeStepVector`]), never as an array of records.

use tracing::debug;

use crate::env::{Action, Environment, Info, Observation, StepOutcome};
use crate::factory::{EnvFactory, MakeOptions};
use crate::registry::{ClientIndex, Slots};
use crate::spaces::ActionSpace;
use crate::timestep::TimeStepVector;
use crate::{EnvError, Result};

/// The only vectorization mode offered: sequential execution in-process.
pub const VECTORIZATION_MODE: &str = "sync";

/// N independent copies of one environment stepped in lockstep.
///
/// A copy whose episode has ended is reset on the next step call and
/// reports a fresh observation with zero reward for that slot.
pub struct SyncVectorEnv<E: Environment> {
    envs: Vec<E>,
    done: Vec<bool>,
}

impl<E: Environment> SyncVectorEnv<E> {
    /// Create the batch from an environment builder.
    pub fn new(num_envs: usize, build: impl Fn() -> Result<E>) -> Result<Self> {
        if num_envs == 0 {
            return Err(EnvError::Construction(
                "num_envs must be at least 1".to_string(),
            ));
        }
        let mut envs = Vec::with_capacity(num_envs);
        for _ in 0..num_envs {
            envs.push(build()?);
        }
        Ok(Self {
            done: vec![false; num_envs],
            envs,
        })
    }

    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    pub fn action_space(&self) -> ActionSpace {
        self.envs[0].action_space()
    }

    /// Reset every copy, offsetting the seed per slot.
    pub fn reset(&mut self, seed: Option<u64>, options: &Info) -> (Vec<Observation>, Vec<Info>) {
        let mut observations = Vec::with_capacity(self.envs.len());
        let mut infos = Vec::with_capacity(self.envs.len());
        for (i, env) in self.envs.iter_mut().enumerate() {
            let env_seed = seed.map(|s| s + i as u64);
            let (obs, info) = env.reset(env_seed, options);
            observations.push(obs);
            infos.push(info);
        }
        self.done.fill(false);
        (observations, infos)
    }

    /// Step every copy with its own action. Callers guarantee
    /// `actions.len() == num_envs` and per-element space membership.
    pub fn step(&mut self, actions: &[Action]) -> Vec<StepOutcome> {
        debug_assert_eq!(actions.len(), self.envs.len());
        let mut outcomes = Vec::with_capacity(self.envs.len());
        for (i, env) in self.envs.iter_mut().enumerate() {
            if self.done[i] {
                let (obs, info) = env.reset(None, &Info::new());
                self.done[i] = false;
                outcomes.push(StepOutcome {
                    observation: obs,
                    reward: 0.0,
                    terminated: false,
                    truncated: false,
                    info,
                });
            } else {
                let outcome = env.step(&actions[i]);
                self.done[i] = outcome.done();
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    pub fn close(&mut self) {
        for env in &mut self.envs {
            env.close();
        }
    }
}

/// Registry of vectorized environments for one family. Shares the slot
/// lifecycle of [`crate::registry::EnvRegistry`], but its operations speak
/// [`TimeStepVector`].
pub struct VecEnvRegistry<E: Environment> {
    slots: Slots<SyncVectorEnv<E>>,
    factory: Box<dyn EnvFactory<Env = E>>,
}

impl<E: Environment> VecEnvRegistry<E> {
    pub fn new(family: &'static str, factory: Box<dyn EnvFactory<Env = E>>) -> Self {
        Self {
            slots: Slots::new(family),
            factory,
        }
    }

    pub fn family(&self) -> &'static str {
        self.slots.family()
    }

    pub fn action_space(&self) -> ActionSpace {
        self.factory.action_space()
    }

    /// Construct a batch of `num_envs` copies (option default 2) at the
    /// index, closing any previous batch there. Returns the batch size.
    pub fn make(
        &self,
        cidx: ClientIndex,
        version: Option<&str>,
        options: &MakeOptions,
    ) -> Result<usize> {
        let version = version.unwrap_or_else(|| self.factory.default_version());
        let num_envs = options.u64_or("num_envs", 2)? as usize;
        self.slots.install(
            cidx,
            || SyncVectorEnv::new(num_envs, || self.factory.make(version, options)),
            |batch| batch.close(),
        )?;
        debug!(family = self.family(), cidx, num_envs, "installed batch");
        Ok(num_envs)
    }

    pub fn close(&self, cidx: ClientIndex) -> Result<()> {
        let mut batch = self.slots.remove(cidx)?;
        batch.close();
        debug!(family = self.family(), cidx, "released batch");
        Ok(())
    }

    pub fn is_alive(&self, cidx: ClientIndex) -> Result<bool> {
        self.slots.is_alive(cidx)
    }

    pub fn reset(
        &self,
        cidx: ClientIndex,
        seed: Option<u64>,
        options: &Info,
    ) -> Result<TimeStepVector> {
        self.slots.with(cidx, |batch| {
            let (observations, infos) = batch.reset(seed, options);
            TimeStepVector::first(observations, infos)
        })
    }

    /// Validate the batch of actions, then step every copy.
    pub fn step(&self, cidx: ClientIndex, actions: &[Action]) -> Result<TimeStepVector> {
        self.slots.with(cidx, |batch| {
            if actions.len() != batch.num_envs() {
                return Err(EnvError::InvalidInput(format!(
                    "actions length should be {}",
                    batch.num_envs()
                )));
            }
            let space = batch.action_space();
            for action in actions {
                if !space.contains(action) {
                    return Err(EnvError::InvalidAction {
                        family: self.slots.family(),
                        action: action.to_string(),
                    });
                }
            }
            Ok(TimeStepVector::from_outcomes(batch.step(actions)))
        })?
    }
}
