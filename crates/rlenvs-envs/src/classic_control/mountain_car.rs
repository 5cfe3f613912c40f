//! MountainCar hill-climbing task.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, DiscreteSpace};
use rlenvs::{EnvError, Result};

const MIN_POSITION: f64 = -1.2;
const MAX_POSITION: f64 = 0.6;
const MAX_SPEED: f64 = 0.07;
const GOAL_POSITION: f64 = 0.5;
const GOAL_VELOCITY: f64 = 0.0;
const FORCE: f64 = 0.001;
const GRAVITY: f64 = 0.0025;

fn action_labels() -> DiscreteSpace {
    DiscreteSpace::new(vec!["ACCELERATE_LEFT", "DO_NOTHING", "ACCELERATE_RIGHT"])
}

/// MountainCar environment
///
/// An underpowered car in a valley has to build momentum by swinging
/// back and forth before it can reach the flag on the right hill. Every
/// step costs -1 until the goal is reached.
///
/// Observation: [position, velocity]
/// Actions: 0 = accelerate left, 1 = coast, 2 = accelerate right
pub struct MountainCar {
    position: f64,
    velocity: f64,
    steps: u64,
    max_episode_steps: u64,
    rng: StdRng,
}

impl MountainCar {
    pub fn new(max_episode_steps: u64) -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            steps: 0,
            max_episode_steps,
            rng: StdRng::from_entropy(),
        }
    }

    fn observation(&self) -> Observation {
        Observation::Vector(vec![self.position, self.velocity])
    }
}

impl Environment for MountainCar {
    fn name(&self) -> &'static str {
        "MountainCar"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        self.position = self.rng.gen_range(-0.6..-0.4);
        self.velocity = 0.0;
        self.steps = 0;
        (self.observation(), Info::new())
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        let code = match action {
            Action::Discrete(a) => *a,
            _ => unreachable!("validated against the discrete space"),
        };
        self.velocity += (code - 1) as f64 * FORCE - (3.0 * self.position).cos() * GRAVITY;
        self.velocity = self.velocity.clamp(-MAX_SPEED, MAX_SPEED);
        self.position += self.velocity;
        self.position = self.position.clamp(MIN_POSITION, MAX_POSITION);
        if self.position <= MIN_POSITION && self.velocity < 0.0 {
            // inelastic collision with the left wall
            self.velocity = 0.0;
        }
        self.steps += 1;

        let terminated = self.position >= GOAL_POSITION && self.velocity >= GOAL_VELOCITY;
        StepOutcome {
            observation: self.observation(),
            reward: -1.0,
            terminated,
            truncated: !terminated && self.steps >= self.max_episode_steps,
            info: Info::new(),
        }
    }
}

/// Constructs MountainCar instances; options: `max_episode_steps`.
pub struct MountainCarFactory;

impl EnvFactory for MountainCarFactory {
    type Env = MountainCar;

    fn default_version(&self) -> &'static str {
        "v0"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<MountainCar> {
        if version != "v0" {
            return Err(EnvError::Construction(format!(
                "Environment MountainCar-{version} doesn't exist"
            )));
        }
        Ok(MountainCar::new(options.u64_or("max_episode_steps", 200)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_starts_in_valley() {
        let mut env = MountainCar::new(200);
        let (obs, _) = env.reset(Some(5), &Info::new());
        match obs {
            Observation::Vector(v) => {
                assert!((-0.6..-0.4).contains(&v[0]));
                assert_eq!(v[1], 0.0);
            }
            other => panic!("unexpected observation {other:?}"),
        }
    }

    #[test]
    fn test_coasting_never_escapes_the_valley() {
        let mut env = MountainCar::new(200);
        env.reset(Some(5), &Info::new());
        for _ in 0..199 {
            let out = env.step(&Action::Discrete(1));
            assert_eq!(out.reward, -1.0);
            assert!(!out.terminated);
        }
        let last = env.step(&Action::Discrete(1));
        assert!(last.truncated);
    }

    #[test]
    fn test_momentum_strategy_reaches_goal() {
        let mut env = MountainCar::new(10_000);
        env.reset(Some(5), &Info::new());
        // always push in the direction of travel
        for _ in 0..10_000 {
            let action = if env.velocity >= 0.0 { 2 } else { 0 };
            let out = env.step(&Action::Discrete(action));
            if out.terminated {
                assert!(env.position >= GOAL_POSITION);
                return;
            }
        }
        panic!("momentum strategy should reach the flag");
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut env = MountainCar::new(10_000);
        env.reset(Some(5), &Info::new());
        for _ in 0..500 {
            env.step(&Action::Discrete(2));
            assert!(env.velocity.abs() <= MAX_SPEED);
            assert!((MIN_POSITION..=MAX_POSITION).contains(&env.position));
        }
    }
}
