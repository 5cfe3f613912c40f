//! Core environment trait definitions.

use serde::{Deserialize, Serialize};

use crate::dynamics::TransitionTable;
use crate::spaces::ActionSpace;

/// Auxiliary metadata attached to reset/step results.
///
/// Kept as a plain JSON map so families can forward whatever the underlying
/// environment reports (e.g. Taxi's `action_mask` as an integer list or the
/// toy-text `prob` field) without any library-specific container leaking
/// across the HTTP boundary.
pub type Info = serde_json::Map<String, serde_json::Value>;

/// Observation emitted by an environment.
///
/// Serializes untagged: a grid-world state id becomes a bare integer, a
/// Blackjack hand becomes an integer tuple, a physical state becomes a
/// float vector.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Observation {
    /// Single discrete state id (FrozenLake, CliffWalking, Taxi)
    State(u64),
    /// Tuple of integers (Blackjack)
    Tuple(Vec<i64>),
    /// Vector of floats (classic control, quadrotor)
    Vector(Vec<f64>),
}

impl Observation {
    /// Length of the observation (1 for a scalar state id)
    pub fn len(&self) -> usize {
        match self {
            Observation::State(_) => 1,
            Observation::Tuple(v) => v.len(),
            Observation::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Action submitted by a client.
///
/// Deserializes untagged so a JSON integer maps to [`Action::Discrete`], a
/// float to [`Action::Continuous`] and an array to [`Action::Box`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// Discrete action code
    Discrete(i64),
    /// Single continuous value (Pendulum torque)
    Continuous(f64),
    /// Continuous vector (quadrotor motor thrusts)
    Box(Vec<f64>),
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Discrete(a) => write!(f, "{a}"),
            Action::Continuous(a) => write!(f, "{a}"),
            Action::Box(v) => write!(f, "{v:?}"),
        }
    }
}

/// Raw result from a single environment step, before time-step
/// normalization.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Observation after the step
    pub observation: Observation,
    /// Reward received
    pub reward: f64,
    /// Whether the episode terminated (goal reached, failure, ...)
    pub terminated: bool,
    /// Whether the episode was truncated (time limit)
    pub truncated: bool,
    /// Additional info
    pub info: Info,
}

impl StepOutcome {
    /// Check if the episode is done (terminated or truncated)
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Core trait implemented by every served environment.
///
/// The registry drives environments exclusively through this trait; the
/// HTTP layer never sees a concrete environment type.
pub trait Environment: Send {
    /// Family name used in error messages and logs
    fn name(&self) -> &'static str;

    /// The declared action space. Actions are validated against it before
    /// [`Environment::step`] is invoked.
    fn action_space(&self) -> ActionSpace;

    /// Reseed and reset the environment to an initial state.
    ///
    /// `options` carries family-specific reset options from the request
    /// body; environments are free to ignore keys they do not understand.
    fn reset(&mut self, seed: Option<u64>, options: &Info) -> (Observation, Info);

    /// Advance the environment by one transition.
    ///
    /// Callers guarantee the action is a member of
    /// [`Environment::action_space`].
    fn step(&mut self, action: &Action) -> StepOutcome;

    /// Explicit state-action transition table, for grid-world families
    /// that expose one. Everything else keeps the default.
    fn transition_table(&self) -> Option<&TransitionTable> {
        None
    }

    /// Release any resources held by the environment.
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_serializes_untagged() {
        let state = serde_json::to_string(&Observation::State(14)).unwrap();
        assert_eq!(state, "14");

        let tuple = serde_json::to_string(&Observation::Tuple(vec![14, 10, 0])).unwrap();
        assert_eq!(tuple, "[14,10,0]");

        let vector = serde_json::to_string(&Observation::Vector(vec![0.5, -0.5])).unwrap();
        assert_eq!(vector, "[0.5,-0.5]");
    }

    #[test]
    fn test_action_deserializes_untagged() {
        let discrete: Action = serde_json::from_str("2").unwrap();
        assert_eq!(discrete, Action::Discrete(2));

        let continuous: Action = serde_json::from_str("-1.5").unwrap();
        assert_eq!(continuous, Action::Continuous(-1.5));

        let boxed: Action = serde_json::from_str("[0.1,0.2,0.3,0.4]").unwrap();
        assert_eq!(boxed, Action::Box(vec![0.1, 0.2, 0.3, 0.4]));
    }

    #[test]
    fn test_step_outcome_done() {
        let outcome = StepOutcome {
            observation: Observation::State(0),
            reward: 0.0,
            terminated: false,
            truncated: true,
            info: Info::new(),
        };
        assert!(outcome.done());
    }
}
