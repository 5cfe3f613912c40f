//! Classic-control environments: low-dimensional continuous-state physics
//! problems with either discrete or continuous actions.

mod acrobot;
mod cart_pole;
mod mountain_car;
mod pendulum;

pub use acrobot::{Acrobot, AcrobotFactory};
pub use cart_pole::{CartPole, CartPoleFactory};
pub use mountain_car::{MountainCar, MountainCarFactory};
pub use pendulum::{Pendulum, PendulumFactory};
