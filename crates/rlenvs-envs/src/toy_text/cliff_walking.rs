//! CliffWalking grid world.

use serde_json::json;

use rlenvs::dynamics::{TransitionEntry, TransitionTable};
use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, DiscreteSpace};
use rlenvs::{EnvError, Result};

const NROW: usize = 4;
const NCOL: usize = 12;
const START: usize = 36;
const GOAL: usize = 47;

const UP: usize = 0;
const RIGHT: usize = 1;
const DOWN: usize = 2;
const LEFT: usize = 3;

fn action_labels() -> DiscreteSpace {
    DiscreteSpace::new(vec!["UP", "RIGHT", "DOWN", "LEFT"])
}

fn is_cliff(state: usize) -> bool {
    state > START && state < GOAL
}

/// CliffWalking environment
///
/// A 4x12 grid: the agent walks from the bottom-left corner to the
/// bottom-right corner. Stepping into the cliff along the bottom edge
/// costs -100 and teleports the agent back to the start without ending
/// the episode; every other move costs -1. Fully deterministic.
pub struct CliffWalking {
    table: TransitionTable,
    state: u64,
    steps: u64,
    max_episode_steps: u64,
}

impl CliffWalking {
    pub fn new(max_episode_steps: u64) -> Self {
        Self {
            table: build_table(),
            state: START as u64,
            steps: 0,
            max_episode_steps,
        }
    }
}

fn build_table() -> TransitionTable {
    let mut table = TransitionTable::new(NROW * NCOL, 4);
    for row in 0..NROW {
        for col in 0..NCOL {
            let state = row * NCOL + col;
            for action in 0..4 {
                let (nr, nc) = match action {
                    UP => (row.saturating_sub(1), col),
                    RIGHT => (row, (col + 1).min(NCOL - 1)),
                    DOWN => ((row + 1).min(NROW - 1), col),
                    LEFT => (row, col.saturating_sub(1)),
                    _ => unreachable!(),
                };
                let next = nr * NCOL + nc;
                let entry = if is_cliff(next) {
                    TransitionEntry {
                        probability: 1.0,
                        next_state: START as u64,
                        reward: -100.0,
                        terminal: false,
                    }
                } else {
                    TransitionEntry {
                        probability: 1.0,
                        next_state: next as u64,
                        reward: -1.0,
                        terminal: next == GOAL,
                    }
                };
                table.push(state, action, entry);
            }
        }
    }
    table
}

impl Environment for CliffWalking {
    fn name(&self) -> &'static str {
        "CliffWalking"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn reset(&mut self, _seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        // deterministic start, nothing to reseed
        self.state = START as u64;
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
        let branch = self
            .table
            .branches(self.state as usize, code)
            .expect("state in table")[0]
            .clone();
        self.state = branch.next_state;
        self.steps += 1;

        let mut info = Info::new();
        info.insert("prob".to_string(), json!(1.0));
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

/// Constructs CliffWalking instances; options: `max_episode_steps`.
pub struct CliffWalkingFactory;

impl EnvFactory for CliffWalkingFactory {
    type Env = CliffWalking;

    fn default_version(&self) -> &'static str {
        "v0"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<CliffWalking> {
        if version != "v0" {
            return Err(EnvError::Construction(format!(
                "Environment CliffWalking-{version} doesn't exist"
            )));
        }
        Ok(CliffWalking::new(options.u64_or("max_episode_steps", 500)?))
    }
}
