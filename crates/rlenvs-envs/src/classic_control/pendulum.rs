//! Pendulum swing-up task.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, BoxSpace};
use rlenvs::{EnvError, Result};

const MAX_SPEED: f64 = 8.0;
const MAX_TORQUE: f64 = 2.0;
const DT: f64 = 0.05;
const MASS: f64 = 1.0;
const LENGTH: f64 = 1.0;

fn torque_space() -> BoxSpace {
    BoxSpace::new(-MAX_TORQUE, MAX_TORQUE, 1)
}

fn angle_normalize(x: f64) -> f64 {
    ((x + PI).rem_euclid(2.0 * PI)) - PI
}

/// Pendulum environment
///
/// A frictionless pendulum actuated by a bounded torque. There is no
/// terminal state; the episode runs until the step cap and the reward
/// penalizes distance from upright, angular speed and control effort.
///
/// Observation: [cos theta, sin theta, theta_dot]
/// Action: torque in [-2, 2]
pub struct Pendulum {
    theta: f64,
    theta_dot: f64,
    gravity: f64,
    steps: u64,
    max_episode_steps: u64,
    rng: StdRng,
}

impl Pendulum {
    pub fn new(gravity: f64, max_episode_steps: u64) -> Self {
        Self {
            theta: 0.0,
            theta_dot: 0.0,
            gravity,
            steps: 0,
            max_episode_steps,
            rng: StdRng::from_entropy(),
        }
    }

    fn observation(&self) -> Observation {
        Observation::Vector(vec![self.theta.cos(), self.theta.sin(), self.theta_dot])
    }
}

impl Environment for Pendulum {
    fn name(&self) -> &'static str {
        "Pendulum"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Box(torque_space())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        self.theta = self.rng.gen_range(-PI..PI);
        self.theta_dot = self.rng.gen_range(-1.0..1.0);
        self.steps = 0;
        (self.observation(), Info::new())
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        let torque = match action {
            Action::Continuous(u) => *u,
            Action::Box(v) => v[0],
            Action::Discrete(a) => *a as f64,
        }
        .clamp(-MAX_TORQUE, MAX_TORQUE);

        let cost = angle_normalize(self.theta).powi(2)
            + 0.1 * self.theta_dot.powi(2)
            + 0.001 * torque.powi(2);

        self.theta_dot += (3.0 * self.gravity / (2.0 * LENGTH) * self.theta.sin()
            + 3.0 / (MASS * LENGTH.powi(2)) * torque)
            * DT;
        self.theta_dot = self.theta_dot.clamp(-MAX_SPEED, MAX_SPEED);
        self.theta += self.theta_dot * DT;
        self.steps += 1;

        StepOutcome {
            observation: self.observation(),
            reward: -cost,
            terminated: false,
            truncated: self.steps >= self.max_episode_steps,
            info: Info::new(),
        }
    }
}

/// Constructs Pendulum instances; options: `g`, `max_episode_steps`.
pub struct PendulumFactory;

impl EnvFactory for PendulumFactory {
    type Env = Pendulum;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Box(torque_space())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<Pendulum> {
        if version != "v1" {
            return Err(EnvError::Construction(format!(
                "Environment Pendulum-{version} doesn't exist"
            )));
        }
        Ok(Pendulum::new(
            options.f64_or("g", 10.0)?,
            options.u64_or("max_episode_steps", 200)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_normalize() {
        assert!((angle_normalize(0.0)).abs() < 1e-12);
        assert!((angle_normalize(2.0 * PI)).abs() < 1e-12);
        assert!((angle_normalize(3.0 * PI) - PI).abs() < 1e-12 || (angle_normalize(3.0 * PI) + PI).abs() < 1e-12);
        assert!((angle_normalize(-PI / 2.0) + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_reward_is_never_positive() {
        let mut env = Pendulum::new(10.0, 200);
        env.reset(Some(13), &Info::new());
        for _ in 0..50 {
            let out = env.step(&Action::Continuous(1.0));
            assert!(out.reward <= 0.0);
            assert!(!out.terminated);
        }
    }

    #[test]
    fn test_torque_is_clamped() {
        let mut env = Pendulum::new(10.0, 200);
        env.reset(Some(13), &Info::new());
        // identical states must evolve identically under 2.0 and an
        // over-limit 50.0 torque
        let (t, td) = (env.theta, env.theta_dot);
        let a = env.step(&Action::Continuous(50.0));
        env.theta = t;
        env.theta_dot = td;
        env.steps = 0;
        let b = env.step(&Action::Continuous(2.0));
        assert_eq!(a.observation, b.observation);
    }

    #[test]
    fn test_only_truncation_ends_episodes() {
        let mut env = Pendulum::new(10.0, 5);
        env.reset(Some(13), &Info::new());
        for i in 1..=5 {
            let out = env.step(&Action::Continuous(0.0));
            assert!(!out.terminated);
            assert_eq!(out.truncated, i == 5);
        }
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut env = Pendulum::new(10.0, 10_000);
        env.reset(Some(13), &Info::new());
        for _ in 0..500 {
            env.step(&Action::Continuous(MAX_TORQUE));
            assert!(env.theta_dot.abs() <= MAX_SPEED);
        }
    }
}
