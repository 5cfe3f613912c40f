//! Time-step normalization.
//!
//! Converts raw environment outputs into the fixed-shape envelope every
//! HTTP response uses: a tri-state step classification plus observation,
//! reward, discount and info. The mapping is pure; identical raw inputs
//! always produce identical envelopes.

use serde::{Serialize, Serializer};

use crate::env::{Info, Observation, StepOutcome};

/// Discount factor reported on every time step. The service performs no
/// discounting of its own.
pub const FIXED_DISCOUNT: f64 = 1.0;

/// Classification of a time step within an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// The result of a reset
    First,
    /// Any step that is neither first nor last
    Mid,
    /// A step where the environment terminated or truncated
    Last,
}

impl StepKind {
    /// Classify a step result from its termination/truncation signals.
    pub fn of_step(terminated: bool, truncated: bool) -> Self {
        if terminated || truncated {
            StepKind::Last
        } else {
            StepKind::Mid
        }
    }

    /// Integer wire code (FIRST=0, MID=1, LAST=2)
    pub fn code(self) -> u8 {
        match self {
            StepKind::First => 0,
            StepKind::Mid => 1,
            StepKind::Last => 2,
        }
    }

    pub fn is_first(self) -> bool {
        self == StepKind::First
    }

    pub fn is_mid(self) -> bool {
        self == StepKind::Mid
    }

    pub fn is_last(self) -> bool {
        self == StepKind::Last
    }
}

impl Serialize for StepKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Normalized single-instance result.
#[derive(Clone, Debug, Serialize)]
pub struct TimeStep {
    pub step_type: StepKind,
    pub reward: Option<f64>,
    pub discount: Option<f64>,
    pub observation: Observation,
    pub info: Info,
}

impl TimeStep {
    /// Envelope for a reset result: FIRST with zero reward.
    pub fn first(observation: Observation, info: Info) -> Self {
        Self {
            step_type: StepKind::First,
            reward: Some(0.0),
            discount: Some(FIXED_DISCOUNT),
            observation,
            info,
        }
    }

    /// Envelope for a step result: LAST iff terminated or truncated.
    pub fn from_outcome(outcome: StepOutcome) -> Self {
        Self {
            step_type: StepKind::of_step(outcome.terminated, outcome.truncated),
            reward: Some(outcome.reward),
            discount: Some(FIXED_DISCOUNT),
            observation: outcome.observation,
            info: outcome.info,
        }
    }

    /// Whether this step closes the episode
    pub fn done(&self) -> bool {
        self.step_type.is_last()
    }
}

/// Normalized result for a batch ("vectorized") environment: parallel
/// arrays, index-aligned, all of the batch length fixed at creation.
#[derive(Clone, Debug, Serialize)]
pub struct TimeStepVector {
    pub step_types: Vec<StepKind>,
    pub rewards: Vec<f64>,
    pub discounts: Vec<f64>,
    pub observations: Vec<Observation>,
    pub infos: Vec<Info>,
}

impl TimeStepVector {
    /// Envelope for a batch reset: FIRST in every slot.
    pub fn first(observations: Vec<Observation>, infos: Vec<Info>) -> Self {
        let n = observations.len();
        Self {
            step_types: vec![StepKind::First; n],
            rewards: vec![0.0; n],
            discounts: vec![FIXED_DISCOUNT; n],
            observations,
            infos,
        }
    }

    /// Envelope for a batch step: each slot classified independently.
    pub fn from_outcomes(outcomes: Vec<StepOutcome>) -> Self {
        let n = outcomes.len();
        let mut step = Self {
            step_types: Vec::with_capacity(n),
            rewards: Vec::with_capacity(n),
            discounts: vec![FIXED_DISCOUNT; n],
            observations: Vec::with_capacity(n),
            infos: Vec::with_capacity(n),
        };
        for outcome in outcomes {
            step.step_types
                .push(StepKind::of_step(outcome.terminated, outcome.truncated));
            step.rewards.push(outcome.reward);
            step.observations.push(outcome.observation);
            step.infos.push(outcome.info);
        }
        step
    }

    /// Batch size
    pub fn len(&self) -> usize {
        self.step_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step_types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(reward: f64, terminated: bool, truncated: bool) -> StepOutcome {
        StepOutcome {
            observation: Observation::State(1),
            reward,
            terminated,
            truncated,
            info: Info::new(),
        }
    }

    #[test]
    fn test_step_kind_classification() {
        assert_eq!(StepKind::of_step(false, false), StepKind::Mid);
        assert_eq!(StepKind::of_step(true, false), StepKind::Last);
        assert_eq!(StepKind::of_step(false, true), StepKind::Last);
        assert_eq!(StepKind::of_step(true, true), StepKind::Last);
    }

    #[test]
    fn test_step_kind_wire_codes() {
        assert_eq!(serde_json::to_string(&StepKind::First).unwrap(), "0");
        assert_eq!(serde_json::to_string(&StepKind::Mid).unwrap(), "1");
        assert_eq!(serde_json::to_string(&StepKind::Last).unwrap(), "2");
    }

    #[test]
    fn test_first_timestep() {
        let step = TimeStep::first(Observation::State(0), Info::new());
        assert!(step.step_type.is_first());
        assert_eq!(step.reward, Some(0.0));
        assert_eq!(step.discount, Some(FIXED_DISCOUNT));
        assert!(!step.done());
    }

    #[test]
    fn test_step_timestep_classification() {
        let mid = TimeStep::from_outcome(outcome(1.0, false, false));
        assert!(mid.step_type.is_mid());
        assert!(!mid.done());

        let last = TimeStep::from_outcome(outcome(-1.0, true, false));
        assert!(last.step_type.is_last());
        assert!(last.done());
        assert_eq!(last.reward, Some(-1.0));
    }

    #[test]
    fn test_vector_first_lengths() {
        let step = TimeStepVector::first(
            vec![Observation::Vector(vec![0.0; 6]); 3],
            vec![Info::new(); 3],
        );
        assert_eq!(step.len(), 3);
        assert_eq!(step.rewards.len(), 3);
        assert_eq!(step.discounts.len(), 3);
        assert_eq!(step.infos.len(), 3);
        assert!(step.step_types.iter().all(|k| k.is_first()));
    }

    #[test]
    fn test_vector_step_classifies_per_slot() {
        let step = TimeStepVector::from_outcomes(vec![
            outcome(1.0, false, false),
            outcome(0.0, true, false),
            outcome(0.5, false, true),
        ]);
        assert_eq!(step.step_types[0], StepKind::Mid);
        assert_eq!(step.step_types[1], StepKind::Last);
        assert_eq!(step.step_types[2], StepKind::Last);
        assert_eq!(step.rewards, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_serialized_envelope_shape() {
        let step = TimeStep::first(Observation::State(0), Info::new());
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["step_type"], 0);
        assert_eq!(json["reward"], 0.0);
        assert_eq!(json["discount"], 1.0);
        assert_eq!(json["observation"], 0);
        assert!(json["info"].as_object().unwrap().is_empty());
    }
}
