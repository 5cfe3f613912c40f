//! Native environment catalogue for the rlenvs service.
//!
//! Every environment here implements [`rlenvs::env::Environment`] and ships
//! a factory so the HTTP layer can construct instances through the
//! [`rlenvs::factory::EnvFactory`] seam. Dynamics follow the Gymnasium
//! reference environments; the toy-text family and the gdrl random walk
//! additionally expose their explicit transition tables.

pub mod classic_control;
pub mod drones;
pub mod gdrl;
pub mod toy_text;

pub use classic_control::{
    Acrobot, AcrobotFactory, CartPole, CartPoleFactory, MountainCar, MountainCarFactory,
    Pendulum, PendulumFactory,
};
pub use drones::{QuadrotorSim, QuadrotorSimFactory};
pub use gdrl::{GymWalk, GymWalkFactory};
pub use toy_text::{
    Blackjack, BlackjackFactory, CliffWalking, CliffWalkingFactory, FrozenLake,
    FrozenLakeFactory, Taxi, TaxiFactory,
};
