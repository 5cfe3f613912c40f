//! Random-walk chain environment.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use rlenvs::dynamics::{TransitionEntry, TransitionTable};
use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, DiscreteSpace};
use rlenvs::{EnvError, Result};

const WEST: usize = 0;
const EAST: usize = 1;

fn action_labels() -> DiscreteSpace {
    DiscreteSpace::new(vec!["WEST", "EAST"])
}

/// GymWalk environment
///
/// A one-dimensional chain of `n_states` walkable cells with an absorbing
/// terminal cell appended on each end. The agent starts in the middle and
/// walks west or east; each move goes the intended way with probability
/// `1 - p_stay - p_backward`, stays put with `p_stay` and goes the opposite
/// way with `p_backward`. Entering the rightmost cell pays 1.0, every other
/// transition pays nothing.
///
/// Observation: single integer state id, terminals included
/// Actions: 0 = west, 1 = east
#[derive(Debug)]
pub struct GymWalk {
    table: TransitionTable,
    state: u64,
    start_state: u64,
    steps: u64,
    max_episode_steps: u64,
    rng: StdRng,
}

impl GymWalk {
    pub fn new(
        n_states: usize,
        p_stay: f64,
        p_backward: f64,
        max_episode_steps: u64,
    ) -> Result<Self> {
        if n_states < 2 {
            return Err(EnvError::Construction(
                "n_states must be at least 2".to_string(),
            ));
        }
        for (key, p) in [("p_stay", p_stay), ("p_backward", p_backward)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(EnvError::Construction(format!(
                    "Option '{key}' must be in [0, 1], got {p}"
                )));
            }
        }
        if p_stay + p_backward > 1.0 {
            return Err(EnvError::Construction(format!(
                "p_stay + p_backward must not exceed 1, got {}",
                p_stay + p_backward
            )));
        }
        let num_states = n_states + 2;
        Ok(Self {
            table: build_table(num_states, p_stay, p_backward),
            state: (num_states / 2) as u64,
            start_state: (num_states / 2) as u64,
            steps: 0,
            max_episode_steps,
            rng: StdRng::from_entropy(),
        })
    }

    /// Sample a branch of the current state-action pair.
    fn sample_branch(&mut self, action: usize) -> TransitionEntry {
        let branches = self
            .table
            .branches(self.state as usize, action)
            .expect("state within table");
        let mut draw: f64 = self.rng.gen();
        for branch in branches {
            if draw < branch.probability {
                return branch.clone();
            }
            draw -= branch.probability;
        }
        branches.last().expect("non-empty branch list").clone()
    }
}

fn build_table(num_states: usize, p_stay: f64, p_backward: f64) -> TransitionTable {
    let p_forward = 1.0 - p_stay - p_backward;
    let right = num_states - 1;
    let mut table = TransitionTable::new(num_states, 2);

    for state in 0..num_states {
        for action in [WEST, EAST] {
            let toward: i64 = if action == WEST { -1 } else { 1 };
            let moved = |direction: i64, probability: f64| {
                let next = (state as i64 + direction).clamp(0, right as i64) as usize;
                TransitionEntry {
                    probability,
                    next_state: next as u64,
                    reward: if state == right - 1 && next == right {
                        1.0
                    } else {
                        0.0
                    },
                    terminal: (state >= right - 1 && next == right)
                        || (state <= 1 && next == 0),
                }
            };
            table.push(state, action, moved(toward, p_forward));
            table.push(
                state,
                action,
                TransitionEntry {
                    probability: p_stay,
                    next_state: state as u64,
                    reward: 0.0,
                    terminal: state == 0 || state == right,
                },
            );
            table.push(state, action, moved(-toward, p_backward));
        }
    }
    table
}

impl Environment for GymWalk {
    fn name(&self) -> &'static str {
        "GymWalk"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        self.state = self.start_state;
        self.steps = 0;

        let mut info = Info::new();
        info.insert("prob".to_string(), json!(1.0));
        (Observation::State(self.state), info)
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        let code = match action {
            Action::Discrete(a) => *a as usize,
            _ => unreachable!("validated against the discrete space"),
        };
        let branch = self.sample_branch(code);
        self.state = branch.next_state;
        self.steps += 1;

        let mut info = Info::new();
        info.insert("prob".to_string(), json!(branch.probability));
        StepOutcome {
            observation: Observation::State(self.state),
            reward: branch.reward,
            terminated: branch.terminal,
            truncated: !branch.terminal && self.steps >= self.max_episode_steps,
            info,
        }
    }

    fn transition_table(&self) -> Option<&TransitionTable> {
        Some(&self.table)
    }
}

/// Constructs GymWalk instances; options: `n_states`, `p_stay`,
/// `p_backward`, `max_episode_steps`.
pub struct GymWalkFactory;

impl EnvFactory for GymWalkFactory {
    type Env = GymWalk;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<GymWalk> {
        if version != "v1" {
            return Err(EnvError::Construction(format!(
                "Environment GymWalk-{version} doesn't exist"
            )));
        }
        GymWalk::new(
            options.u64_or("n_states", 7)? as usize,
            options.f64_or("p_stay", 0.0)?,
            options.f64_or("p_backward", 0.5)?,
            options.u64_or("max_episode_steps", 500)?,
        )
    }
}
