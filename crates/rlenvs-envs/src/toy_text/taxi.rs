//! Taxi grid world.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use rlenvs::dynamics::{TransitionEntry, TransitionTable};
use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, DiscreteSpace};
use rlenvs::{EnvError, Result};

const MAP: [&str; 7] = [
    "+---------+",
    "|R: | : :G|",
    "| : | : : |",
    "| : : : : |",
    "| | : | : |",
    "|Y| : |B: |",
    "+---------+",
];

/// Depot coordinates: R, G, Y, B
const LOCS: [(usize, usize); 4] = [(0, 0), (0, 4), (4, 0), (4, 3)];

const NUM_STATES: usize = 500;
const IN_TAXI: usize = 4;

const SOUTH: usize = 0;
const NORTH: usize = 1;
const EAST: usize = 2;
const WEST: usize = 3;
const PICKUP: usize = 4;
const DROPOFF: usize = 5;

fn action_labels() -> DiscreteSpace {
    DiscreteSpace::new(vec!["SOUTH", "NORTH", "EAST", "WEST", "PICKUP", "DROPOFF"])
}

fn encode(row: usize, col: usize, pass: usize, dest: usize) -> usize {
    ((row * 5 + col) * 5 + pass) * 4 + dest
}

fn decode(state: usize) -> (usize, usize, usize, usize) {
    let dest = state % 4;
    let rest = state / 4;
    let pass = rest % 5;
    let rest = rest / 5;
    (rest / 5, rest % 5, pass, dest)
}

fn east_open(row: usize, col: usize) -> bool {
    MAP[1 + row].as_bytes()[2 * col + 2] == b':'
}

fn west_open(row: usize, col: usize) -> bool {
    MAP[1 + row].as_bytes()[2 * col] == b':'
}

/// Taxi environment
///
/// The taxi navigates a 5x5 grid with walls, picks the passenger up at one
/// of four depots and drops them at the destination depot. 500 states, 6
/// actions, fully deterministic transitions with an explicit table.
pub struct Taxi {
    table: TransitionTable,
    state: u64,
    steps: u64,
    max_episode_steps: u64,
    rng: StdRng,
}

impl Taxi {
    pub fn new(max_episode_steps: u64) -> Self {
        Self {
            table: build_table(),
            state: 0,
            steps: 0,
            max_episode_steps,
            rng: StdRng::from_entropy(),
        }
    }

    /// Mask of actions that have an effect in the given state, mirroring
    /// the `action_mask` key Gymnasium reports.
    fn action_mask(state: usize) -> Vec<i64> {
        let (row, col, pass, _) = decode(state);
        let at_depot = LOCS.iter().position(|&loc| loc == (row, col));
        vec![
            (row < 4) as i64,
            (row > 0) as i64,
            east_open(row, col) as i64,
            west_open(row, col) as i64,
            (pass < IN_TAXI && at_depot == Some(pass)) as i64,
            (pass == IN_TAXI && at_depot.is_some()) as i64,
        ]
    }

    fn info_for(state: usize) -> Info {
        let mut info = Info::new();
        info.insert("prob".to_string(), json!(1.0));
        info.insert("action_mask".to_string(), json!(Self::action_mask(state)));
        info
    }
}

fn build_table() -> TransitionTable {
    let mut table = TransitionTable::new(NUM_STATES, 6);
    for state in 0..NUM_STATES {
        let (row, col, pass, dest) = decode(state);
        for action in 0..6 {
            let (mut nr, mut nc, mut npass) = (row, col, pass);
            let mut reward = -1.0;
            let mut terminal = false;
            match action {
                SOUTH => nr = (row + 1).min(4),
                NORTH => nr = row.saturating_sub(1),
                EAST => {
                    if east_open(row, col) {
                        nc = col + 1;
                    }
                }
                WEST => {
                    if west_open(row, col) {
                        nc = col - 1;
                    }
                }
                PICKUP => {
                    if pass < IN_TAXI && (row, col) == LOCS[pass] {
                        npass = IN_TAXI;
                    } else {
                        reward = -10.0;
                    }
                }
                DROPOFF => {
                    if (row, col) == LOCS[dest] && pass == IN_TAXI {
                        npass = dest;
                        reward = 20.0;
                        terminal = true;
                    } else if let Some(loc) = LOCS.iter().position(|&l| l == (row, col)) {
                        if pass == IN_TAXI {
                            npass = loc;
                        } else {
                            reward = -10.0;
                        }
                    } else {
                        reward = -10.0;
                    }
                }
                _ => unreachable!(),
            }
            table.push(
                state,
                action,
                TransitionEntry {
                    probability: 1.0,
                    next_state: encode(nr, nc, npass, dest) as u64,
                    reward,
                    terminal,
                },
            );
        }
    }
    table
}

impl Environment for Taxi {
    fn name(&self) -> &'static str {
        "Taxi"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        // passenger waits at a depot different from the destination
        loop {
            let row = self.rng.gen_range(0..5);
            let col = self.rng.gen_range(0..5);
            let pass = self.rng.gen_range(0..4);
            let dest = self.rng.gen_range(0..4);
            if pass != dest {
                self.state = encode(row, col, pass, dest) as u64;
                break;
            }
        }
        self.steps = 0;
        (
            Observation::State(self.state),
            Self::info_for(self.state as usize),
        )
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

        StepOutcome {
            observation: Observation::State(self.state),
            reward: branch.reward,
            terminated: branch.terminal,
            truncated: !branch.terminal && self.steps >= self.max_episode_steps,
            info: Self::info_for(self.state as usize),
        }
    }

    fn transition_table(&self) -> Option<&TransitionTable> {
        Some(&self.table)
    }
}

/// Constructs Taxi instances; options: `max_episode_steps`.
pub struct TaxiFactory;

impl EnvFactory for TaxiFactory {
    type Env = Taxi;

    fn default_version(&self) -> &'static str {
        "v3"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<Taxi> {
        if version != "v3" {
            return Err(EnvError::Construction(format!(
                "Environment Taxi-{version} doesn't exist"
            )));
        }
        Ok(Taxi::new(options.u64_or("max_episode_steps", 500)?))
    }
}
