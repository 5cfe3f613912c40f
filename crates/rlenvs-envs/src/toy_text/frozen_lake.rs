//! FrozenLake grid world.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use rlenvs::dynamics::{TransitionEntry, TransitionTable};
use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, DiscreteSpace};
use rlenvs::{EnvError, Result};

const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];
const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF", "FFFHFFFG",
];

const LEFT: usize = 0;
const DOWN: usize = 1;
const RIGHT: usize = 2;
const UP: usize = 3;

fn action_labels() -> DiscreteSpace {
    DiscreteSpace::new(vec!["LEFT", "DOWN", "RIGHT", "UP"])
}

/// FrozenLake environment
///
/// The agent crosses a frozen grid from the start tile to the goal tile
/// without falling into a hole. With `is_slippery` the intended move is
/// taken with probability 1/3, each perpendicular move likewise.
///
/// Observation: single integer state id (row * ncol + col)
/// Actions: 0 = left, 1 = down, 2 = right, 3 = up
pub struct FrozenLake {
    table: TransitionTable,
    state: u64,
    steps: u64,
    max_episode_steps: u64,
    rng: StdRng,
}

impl FrozenLake {
    pub fn new(map_name: &str, is_slippery: bool, max_episode_steps: u64) -> Result<Self> {
        let desc: Vec<&str> = match map_name {
            "4x4" => MAP_4X4.to_vec(),
            "8x8" => MAP_8X8.to_vec(),
            other => {
                return Err(EnvError::Construction(format!(
                    "Unknown FrozenLake map '{other}'; expected '4x4' or '8x8'"
                )))
            }
        };
        Ok(Self {
            table: build_table(&desc, is_slippery),
            state: 0,
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

fn build_table(desc: &[&str], is_slippery: bool) -> TransitionTable {
    let nrow = desc.len();
    let ncol = desc[0].len();
    let cell = |row: usize, col: usize| desc[row].as_bytes()[col] as char;
    let mut table = TransitionTable::new(nrow * ncol, 4);

    let shift = |row: usize, col: usize, action: usize| match action {
        LEFT => (row, col.saturating_sub(1)),
        DOWN => ((row + 1).min(nrow - 1), col),
        RIGHT => (row, (col + 1).min(ncol - 1)),
        UP => (row.saturating_sub(1), col),
        _ => unreachable!(),
    };

    for row in 0..nrow {
        for col in 0..ncol {
            let state = row * ncol + col;
            for action in 0..4 {
                if matches!(cell(row, col), 'G' | 'H') {
                    // terminal states self-loop
                    table.push(
                        state,
                        action,
                        TransitionEntry {
                            probability: 1.0,
                            next_state: state as u64,
                            reward: 0.0,
                            terminal: true,
                        },
                    );
                    continue;
                }
                let moves: Vec<usize> = if is_slippery {
                    vec![(action + 3) % 4, action, (action + 1) % 4]
                } else {
                    vec![action]
                };
                let probability = 1.0 / moves.len() as f64;
                for actual in moves {
                    let (nr, nc) = shift(row, col, actual);
                    let next = nr * ncol + nc;
                    table.push(
                        state,
                        action,
                        TransitionEntry {
                            probability,
                            next_state: next as u64,
                            reward: if cell(nr, nc) == 'G' { 1.0 } else { 0.0 },
                            terminal: matches!(cell(nr, nc), 'G' | 'H'),
                        },
                    );
                }
            }
        }
    }
    table
}

impl Environment for FrozenLake {
    fn name(&self) -> &'static str {
        "FrozenLake"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        self.state = 0;
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

/// Constructs FrozenLake instances; options: `map_name` ("4x4"/"8x8"),
/// `is_slippery`, `max_episode_steps`.
pub struct FrozenLakeFactory;

impl EnvFactory for FrozenLakeFactory {
    type Env = FrozenLake;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<FrozenLake> {
        if version != "v1" {
            return Err(EnvError::Construction(format!(
                "Environment FrozenLake-{version} doesn't exist"
            )));
        }
        FrozenLake::new(
            options.str_or("map_name", "4x4")?,
            options.bool_or("is_slippery", true)?,
            options.u64_or("max_episode_steps", 500)?,
        )
    }
}
