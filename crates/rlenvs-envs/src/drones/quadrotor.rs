//! Quadrotor hover task.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rlenvs::env::{Action, Environment, Info, Observation, StepOutcome};
use rlenvs::factory::{EnvFactory, MakeOptions};
use rlenvs::spaces::{ActionSpace, BoxSpace};
use rlenvs::{EnvError, Result};

// Crazyflie 2.0 X-configuration parameters
const MASS: f64 = 0.027;
const GRAVITY: f64 = 9.8;
const IXX: f64 = 1.4e-5;
const IYY: f64 = 1.4e-5;
const IZZ: f64 = 2.17e-5;
const KF: f64 = 3.16e-10;
const KM: f64 = 7.94e-12;
const ARM_SQRT2: f64 = 0.02808;
const MAX_RPM: f64 = 21702.75;
const DT: f64 = 0.02;

/// CCW motors react clockwise, CW motors counter-clockwise.
const MOTOR_DIRS: [f64; 4] = [-1.0, -1.0, 1.0, 1.0];

const HOVER_TARGET: [f64; 3] = [0.0, 0.0, 1.0];
const MAX_TILT: f64 = PI / 3.0;
const MAX_DISTANCE: f64 = 5.0;

fn motor_space() -> BoxSpace {
    BoxSpace::new(0.0, 1.0, 4)
}

/// QuadrotorSim environment
///
/// A rigid-body quadrotor in X configuration. Each action is four
/// normalized motor commands in [0, 1] scaled to motor RPM; thrust and
/// reaction torques follow F = KF * rpm^2 and tau = KM * rpm^2. The craft
/// starts near (0, 0, 1) and is rewarded for staying there. The episode
/// terminates on ground contact, a tilt past 60 degrees or drifting more
/// than 5 m from the target.
///
/// Observation: [x, y, z, roll, pitch, yaw, vx, vy, vz, wx, wy, wz]
pub struct QuadrotorSim {
    position: [f64; 3],
    velocity: [f64; 3],
    attitude: [f64; 3],
    omega: [f64; 3],
    steps: u64,
    max_episode_steps: u64,
    rng: StdRng,
}

impl QuadrotorSim {
    pub fn new(max_episode_steps: u64) -> Self {
        Self {
            position: HOVER_TARGET,
            velocity: [0.0; 3],
            attitude: [0.0; 3],
            omega: [0.0; 3],
            steps: 0,
            max_episode_steps,
            rng: StdRng::from_entropy(),
        }
    }

    fn observation(&self) -> Observation {
        let mut v = Vec::with_capacity(12);
        v.extend_from_slice(&self.position);
        v.extend_from_slice(&self.attitude);
        v.extend_from_slice(&self.velocity);
        v.extend_from_slice(&self.omega);
        Observation::Vector(v)
    }

    fn distance_to_target(&self) -> f64 {
        self.position
            .iter()
            .zip(HOVER_TARGET)
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    fn crashed(&self) -> bool {
        let [roll, pitch, _] = self.attitude;
        self.position[2] <= 0.0
            || roll.abs() > MAX_TILT
            || pitch.abs() > MAX_TILT
            || self.distance_to_target() > MAX_DISTANCE
    }

    /// World-frame direction of the body z axis for ZYX Euler angles.
    fn thrust_direction(&self) -> [f64; 3] {
        let [roll, pitch, yaw] = self.attitude;
        let (sr, cr) = roll.sin_cos();
        let (sp, cp) = pitch.sin_cos();
        let (sy, cy) = yaw.sin_cos();
        [
            cr * sp * cy + sr * sy,
            cr * sp * sy - sr * cy,
            cr * cp,
        ]
    }

    fn integrate(&mut self, rpms: [f64; 4]) {
        let thrusts: Vec<f64> = rpms.iter().map(|r| KF * r * r).collect();
        let total_thrust: f64 = thrusts.iter().sum();

        // X configuration: motors 2,3 on the left, 0,3 in front
        let tau_x = ARM_SQRT2 * (thrusts[2] + thrusts[3] - thrusts[0] - thrusts[1]);
        let tau_y = ARM_SQRT2 * (thrusts[1] + thrusts[2] - thrusts[0] - thrusts[3]);
        let tau_z: f64 = (0..4).map(|i| MOTOR_DIRS[i] * KM * rpms[i] * rpms[i]).sum();

        let dir = self.thrust_direction();
        let accel = [
            dir[0] * total_thrust / MASS,
            dir[1] * total_thrust / MASS,
            dir[2] * total_thrust / MASS - GRAVITY,
        ];

        let [wx, wy, wz] = self.omega;
        let alpha = [
            (tau_x - wy * wz * (IZZ - IYY)) / IXX,
            (tau_y - wx * wz * (IXX - IZZ)) / IYY,
            (tau_z - wx * wy * (IYY - IXX)) / IZZ,
        ];

        for i in 0..3 {
            self.velocity[i] += accel[i] * DT;
            self.position[i] += self.velocity[i] * DT;
            self.omega[i] += alpha[i] * DT;
            self.attitude[i] += self.omega[i] * DT;
        }
    }
}

impl Environment for QuadrotorSim {
    fn name(&self) -> &'static str {
        "QuadrotorSim"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Box(motor_space())
    }

    fn reset(&mut self, seed: Option<u64>, _options: &Info) -> (Observation, Info) {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        for i in 0..3 {
            self.position[i] = HOVER_TARGET[i] + self.rng.gen_range(-0.1..0.1);
            self.attitude[i] = self.rng.gen_range(-0.05..0.05);
            self.velocity[i] = 0.0;
            self.omega[i] = 0.0;
        }
        self.steps = 0;
        (self.observation(), Info::new())
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        let commands: [f64; 4] = match action {
            Action::Box(v) if v.len() == 4 => [v[0], v[1], v[2], v[3]],
            Action::Continuous(u) => [*u; 4],
            _ => [0.0; 4],
        };
        let mut rpms = [0.0; 4];
        for (rpm, cmd) in rpms.iter_mut().zip(commands) {
            *rpm = cmd.clamp(0.0, 1.0) * MAX_RPM;
        }
        self.integrate(rpms);
        self.steps += 1;

        let terminated = self.crashed();
        let speed: f64 = self.velocity.iter().map(|v| v * v).sum::<f64>().sqrt();
        StepOutcome {
            observation: self.observation(),
            reward: -(self.distance_to_target() + 0.1 * speed),
            terminated,
            truncated: !terminated && self.steps >= self.max_episode_steps,
            info: Info::new(),
        }
    }
}

/// Constructs QuadrotorSim instances; options: `max_episode_steps`.
pub struct QuadrotorSimFactory;

impl EnvFactory for QuadrotorSimFactory {
    type Env = QuadrotorSim;

    fn default_version(&self) -> &'static str {
        "v0"
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Box(motor_space())
    }

    fn make(&self, version: &str, options: &MakeOptions) -> Result<QuadrotorSim> {
        if version != "v0" {
            return Err(EnvError::Construction(format!(
                "Environment QuadrotorSim-{version} doesn't exist"
            )));
        }
        Ok(QuadrotorSim::new(options.u64_or("max_episode_steps", 1000)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // hover rpm / MAX_RPM, where hover rpm = sqrt(m * g / (4 * KF))
    fn hover_command() -> f64 {
        (MASS * GRAVITY / (4.0 * KF)).sqrt() / MAX_RPM
    }

    #[test]
    fn test_observation_has_twelve_components() {
        let mut env = QuadrotorSim::new(1000);
        let (obs, _) = env.reset(Some(1), &Info::new());
        match obs {
            Observation::Vector(v) => assert_eq!(v.len(), 12),
            other => panic!("unexpected observation {other:?}"),
        }
    }

    #[test]
    fn test_hover_command_keeps_altitude() {
        let mut env = QuadrotorSim::new(1000);
        env.reset(Some(1), &Info::new());
        let cmd = hover_command();
        for _ in 0..50 {
            let out = env.step(&Action::Box(vec![cmd; 4]));
            assert!(!out.terminated, "crashed at z = {}", env.position[2]);
        }
        assert!((env.position[2] - HOVER_TARGET[2]).abs() < 0.5);
    }

    #[test]
    fn test_zero_thrust_hits_the_ground() {
        let mut env = QuadrotorSim::new(10_000);
        env.reset(Some(1), &Info::new());
        for _ in 0..10_000 {
            let out = env.step(&Action::Box(vec![0.0; 4]));
            if out.terminated {
                assert!(env.position[2] <= 0.0);
                return;
            }
        }
        panic!("free fall should reach the ground");
    }

    #[test]
    fn test_asymmetric_thrust_rolls_until_crash() {
        let mut env = QuadrotorSim::new(10_000);
        env.reset(Some(1), &Info::new());
        let cmd = hover_command();
        // left motors stronger than right
        let action = Action::Box(vec![cmd * 0.9, cmd * 0.9, cmd * 1.1, cmd * 1.1]);
        for _ in 0..10_000 {
            let out = env.step(&action);
            if out.terminated {
                return;
            }
        }
        panic!("asymmetric thrust should terminate the episode");
    }

    #[test]
    fn test_reward_penalizes_distance() {
        let mut env = QuadrotorSim::new(1000);
        env.reset(Some(1), &Info::new());
        let out = env.step(&Action::Box(vec![hover_command(); 4]));
        assert!(out.reward <= 0.0);
        assert!(out.reward >= -1.0, "near the target the cost is small");
    }

    #[test]
    fn test_episode_cap_truncates() {
        let mut env = QuadrotorSim::new(3);
        env.reset(Some(1), &Info::new());
        let cmd = hover_command();
        env.step(&Action::Box(vec![cmd; 4]));
        env.step(&Action::Box(vec![cmd; 4]));
        let out = env.step(&Action::Box(vec![cmd; 4]));
        assert!(out.truncated);
    }
}
