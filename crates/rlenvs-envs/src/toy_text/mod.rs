//! Toy-text environments: small discrete grid worlds and card games.
//!
//! FrozenLake, CliffWalking and Taxi carry explicit transition tables and
//! therefore support the `dynamics` query; Blackjack does not.

mod blackjack;
mod cliff_walking;
mod frozen_lake;
mod taxi;

pub use blackjack::{Blackjack, BlackjackFactory};
pub use cliff_walking::{CliffWalking, CliffWalkingFactory};
pub use frozen_lake::{FrozenLake, FrozenLakeFactory};
pub use taxi::{Taxi, TaxiFactory};
