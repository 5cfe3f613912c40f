//! CartPole balancing task.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, DiscreteSpace};
use rlenvs::{EnvError, Result};

const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const TOTAL_MASS: f64 = MASS_CART + MASS_POLE;
const HALF_POLE_LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = MASS_POLE * HALF_POLE_LENGTH;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02;

const X_THRESHOLD: f64 = 2.4;
const THETA_THRESHOLD: f64 = 12.0 * 2.0 * std::f64::consts::PI / 360.0;

fn action_labels() -> DiscreteSpace {
    DiscreteSpace::new(vec!["PUSH_LEFT", "PUSH_RIGHT"])
}

/// CartPole environment
///
/// A pole is hinged to a cart on a frictionless track. The agent pushes
/// the cart left or right and earns +1 per step until the pole tips past
/// 12 degrees or the cart leaves the track.
///
/// Observation: [x, x_dot, theta, theta_dot]
/// Actions: 0 = push left, 1 = push right
pub struct CartPole {
    x: f64,
    x_dot: f64,
    theta: f64,
    theta_dot: f64,
    steps: u64,
    max_episode_steps: u64,
    rng: StdRng,
}

impl CartPole {
    pub fn new(max_episode_steps: u64) -> Self {
        Self {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            max_episode_steps,
            rng: StdRng::from_entropy(),
        }
    }

    fn observation(&self) -> Observation {
        Observation::Vector(vec![self.x, self.x_dot, self.theta, self.theta_dot])
    }

    fn out_of_bounds(&self) -> bool {
        self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD
    }
}

impl Environment for CartPole {
    fn name(&self) -> &'static str {
        "CartPole"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        self.steps = 0;
        (self.observation(), Info::new())
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        let force = match action {
            Action::Discrete(1) => FORCE_MAG,
            _ => -FORCE_MAG,
        };
        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp =
            (force + POLE_MASS_LENGTH * self.theta_dot.powi(2) * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (HALF_POLE_LENGTH
                * (4.0 / 3.0 - MASS_POLE * cos_theta.powi(2) / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.x += TAU * self.x_dot;
        self.x_dot += TAU * x_acc;
        self.theta += TAU * self.theta_dot;
        self.theta_dot += TAU * theta_acc;
        self.steps += 1;

        let terminated = self.out_of_bounds();
        StepOutcome {
            observation: self.observation(),
            reward: 1.0,
            terminated,
            truncated: !terminated && self.steps >= self.max_episode_steps,
            info: Info::new(),
        }
    }
}

/// Constructs CartPole instances; options: `max_episode_steps`.
pub struct CartPoleFactory;

impl EnvFactory for CartPoleFactory {
    type Env = CartPole;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<CartPole> {
        if version != "v1" {
            return Err(EnvError::Construction(format!(
                "Environment CartPole-{version} doesn't exist"
            )));
        }
        Ok(CartPole::new(options.u64_or("max_episode_steps", 500)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_stays_near_upright() {
        let mut env = CartPole::new(500);
        let (obs, _) = env.reset(Some(11), &Info::new());
        match obs {
            Observation::Vector(v) => {
                assert_eq!(v.len(), 4);
                for x in v {
                    assert!(x.abs() < 0.05);
                }
            }
            other => panic!("unexpected observation {other:?}"),
        }
    }

    #[test]
    fn test_reward_is_one_per_step() {
        let mut env = CartPole::new(500);
        env.reset(Some(11), &Info::new());
        let out = env.step(&Action::Discrete(1));
        assert_eq!(out.reward, 1.0);
        assert!(!out.terminated);
    }

    #[test]
    fn test_constant_push_tips_the_pole() {
        let mut env = CartPole::new(500);
        env.reset(Some(11), &Info::new());
        for _ in 0..500 {
            let out = env.step(&Action::Discrete(1));
            // terminal step still pays +1
            if out.terminated {
                assert_eq!(out.reward, 1.0);
                return;
            }
        }
        panic!("pushing right forever should tip the pole");
    }

    #[test]
    fn test_episode_cap_truncates() {
        let mut env = CartPole::new(2);
        env.reset(Some(11), &Info::new());
        env.step(&Action::Discrete(0));
        let out = env.step(&Action::Discrete(1));
        assert!(out.truncated);
        assert!(!out.terminated);
    }
}
