//! Drone-simulation environments.

mod quadrotor;

pub use quadrotor::{QuadrotorSim, QuadrotorSimFactory};
