//! Acrobot swing-up task.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, DiscreteSpace};
use rlenvs::{EnvError, Result};

const LINK_LENGTH_1: f64 = 1.0;
const LINK_MASS_1: f64 = 1.0;
const LINK_MASS_2: f64 = 1.0;
const LINK_COM_1: f64 = 0.5;
const LINK_COM_2: f64 = 0.5;
const LINK_MOI: f64 = 1.0;
const GRAVITY: f64 = 9.8;
const DT: f64 = 0.2;

const MAX_VEL_1: f64 = 4.0 * PI;
const MAX_VEL_2: f64 = 9.0 * PI;

const TORQUES: [f64; 3] = [-1.0, 0.0, 1.0];

fn action_labels() -> DiscreteSpace {
    DiscreteSpace::new(vec!["NEGATIVE_TORQUE", "ZERO_TORQUE", "POSITIVE_TORQUE"])
}

fn wrap_angle(x: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut x = x % two_pi;
    if x > PI {
        x -= two_pi;
    } else if x < -PI {
        x += two_pi;
    }
    x
}

/// Acrobot environment
///
/// A two-link pendulum actuated only at the joint between the links. The
/// agent applies -1, 0 or +1 torque and must swing the free end above the
/// bar by one link length. Reward is -1 per step, 0 on the swing-up step.
///
/// Observation: [cos t1, sin t1, cos t2, sin t2, dt1, dt2]
pub struct Acrobot {
    theta1: f64,
    theta2: f64,
    dtheta1: f64,
    dtheta2: f64,
    steps: u64,
    max_episode_steps: u64,
    rng: StdRng,
}

impl Acrobot {
    pub fn new(max_episode_steps: u64) -> Self {
        Self {
            theta1: 0.0,
            theta2: 0.0,
            dtheta1: 0.0,
            dtheta2: 0.0,
            steps: 0,
            max_episode_steps,
            rng: StdRng::from_entropy(),
        }
    }

    fn observation(&self) -> Observation {
        Observation::Vector(vec![
            self.theta1.cos(),
            self.theta1.sin(),
            self.theta2.cos(),
            self.theta2.sin(),
            self.dtheta1,
            self.dtheta2,
        ])
    }

    fn free_end_above_bar(&self) -> bool {
        -self.theta1.cos() - (self.theta2 + self.theta1).cos() > 1.0
    }
}

/// Equations of motion from Sutton's book formulation.
fn derivatives(state: [f64; 4], torque: f64) -> [f64; 4] {
    let [theta1, theta2, dtheta1, dtheta2] = state;
    let (m1, m2) = (LINK_MASS_1, LINK_MASS_2);
    let l1 = LINK_LENGTH_1;
    let (lc1, lc2) = (LINK_COM_1, LINK_COM_2);
    let (i1, i2) = (LINK_MOI, LINK_MOI);

    let d1 = m1 * lc1.powi(2)
        + m2 * (l1.powi(2) + lc2.powi(2) + 2.0 * l1 * lc2 * theta2.cos())
        + i1
        + i2;
    let d2 = m2 * (lc2.powi(2) + l1 * lc2 * theta2.cos()) + i2;
    let phi2 = m2 * lc2 * GRAVITY * (theta1 + theta2 - PI / 2.0).cos();
    let phi1 = -m2 * l1 * lc2 * dtheta2.powi(2) * theta2.sin()
        - 2.0 * m2 * l1 * lc2 * dtheta2 * dtheta1 * theta2.sin()
        + (m1 * lc1 + m2 * l1) * GRAVITY * (theta1 - PI / 2.0).cos()
        + phi2;
    let ddtheta2 = (torque + d2 / d1 * phi1
        - m2 * l1 * lc2 * dtheta1.powi(2) * theta2.sin()
        - phi2)
        / (m2 * lc2.powi(2) + i2 - d2.powi(2) / d1);
    let ddtheta1 = -(d2 * ddtheta2 + phi1) / d1;
    [dtheta1, dtheta2, ddtheta1, ddtheta2]
}

fn rk4(state: [f64; 4], torque: f64, dt: f64) -> [f64; 4] {
    let add = |a: [f64; 4], b: [f64; 4], scale: f64| {
        [
            a[0] + b[0] * scale,
            a[1] + b[1] * scale,
            a[2] + b[2] * scale,
            a[3] + b[3] * scale,
        ]
    };
    let k1 = derivatives(state, torque);
    let k2 = derivatives(add(state, k1, dt / 2.0), torque);
    let k3 = derivatives(add(state, k2, dt / 2.0), torque);
    let k4 = derivatives(add(state, k3, dt), torque);
    let mut next = state;
    for i in 0..4 {
        next[i] += dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    next
}

impl Environment for Acrobot {
    fn name(&self) -> &'static str {
        "Acrobot"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        self.theta1 = self.rng.gen_range(-0.1..0.1);
        self.theta2 = self.rng.gen_range(-0.1..0.1);
        self.dtheta1 = self.rng.gen_range(-0.1..0.1);
        self.dtheta2 = self.rng.gen_range(-0.1..0.1);
        self.steps = 0;
        (self.observation(), Info::new())
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        let torque = match action {
            Action::Discrete(a) => TORQUES[*a as usize],
            _ => unreachable!("validated against the discrete space"),
        };
        let next = rk4(
            [self.theta1, self.theta2, self.dtheta1, self.dtheta2],
            torque,
            DT,
        );
        self.theta1 = wrap_angle(next[0]);
        self.theta2 = wrap_angle(next[1]);
        self.dtheta1 = next[2].clamp(-MAX_VEL_1, MAX_VEL_1);
        self.dtheta2 = next[3].clamp(-MAX_VEL_2, MAX_VEL_2);
        self.steps += 1;

        let terminated = self.free_end_above_bar();
        StepOutcome {
            observation: self.observation(),
            reward: if terminated { 0.0 } else { -1.0 },
            terminated,
            truncated: !terminated && self.steps >= self.max_episode_steps,
            info: Info::new(),
        }
    }
}

/// Constructs Acrobot instances; options: `max_episode_steps`.
pub struct AcrobotFactory;

impl EnvFactory for AcrobotFactory {
    type Env = Acrobot;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(action_labels())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<Acrobot> {
        if version != "v1" {
            return Err(EnvError::Construction(format!(
                "Environment Acrobot-{version} doesn't exist"
            )));
        }
        Ok(Acrobot::new(options.u64_or("max_episode_steps", 500)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle_stays_in_range() {
        for x in [-10.0, -PI, -0.5, 0.0, 0.5, PI, 10.0, 100.0] {
            let w = wrap_angle(x);
            assert!((-PI..=PI).contains(&w), "{x} wrapped to {w}");
        }
        assert!((wrap_angle(2.0 * PI + 0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_observation_is_six_trig_components() {
        let mut env = Acrobot::new(500);
        let (obs, _) = env.reset(Some(9), &Info::new());
        match obs {
            Observation::Vector(v) => {
                assert_eq!(v.len(), 6);
                assert!((v[0].powi(2) + v[1].powi(2) - 1.0).abs() < 1e-12);
                assert!((v[2].powi(2) + v[3].powi(2) - 1.0).abs() < 1e-12);
            }
            other => panic!("unexpected observation {other:?}"),
        }
    }

    #[test]
    fn test_hanging_start_is_not_terminal() {
        let mut env = Acrobot::new(500);
        env.reset(Some(9), &Info::new());
        let out = env.step(&Action::Discrete(1));
        assert!(!out.terminated);
        assert_eq!(out.reward, -1.0);
    }

    #[test]
    fn test_velocities_stay_clamped() {
        let mut env = Acrobot::new(10_000);
        env.reset(Some(9), &Info::new());
        for i in 0..500 {
            env.step(&Action::Discrete((i % 3) as i64));
            assert!(env.dtheta1.abs() <= MAX_VEL_1);
            assert!(env.dtheta2.abs() <= MAX_VEL_2);
        }
    }

    #[test]
    fn test_episode_cap_truncates() {
        let mut env = Acrobot::new(3);
        env.reset(Some(9), &Info::new());
        env.step(&Action::Discrete(1));
        env.step(&Action::Discrete(1));
        let out = env.step(&Action::Discrete(1));
        assert!(out.truncated || out.terminated);
    }
}
