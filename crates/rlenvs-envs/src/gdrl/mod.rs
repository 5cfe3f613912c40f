//! Environments from the "Grokking Deep Reinforcement Learning" catalogue.

mod gym_walk;

pub use gym_walk::{GymWalk, GymWalkFactory};
