//! # rlenvs
//!
//! Core library for serving reinforcement-learning environments over HTTP.
//!
//! ## Overview
//!
//! rlenvs provides:
//! - The [`env::Environment`] trait that every served environment implements
//! - Observation and action space definitions in [`spaces`]
//! - The FIRST/MID/LAST time-step envelope in [`timestep`]
//! - The multi-instance [`registry::EnvRegistry`] that owns environment
//!   handles keyed by a caller-chosen client index
//! - The [`factory::EnvFactory`] seam that decouples the registry from any
//!   concrete environment backend
//!
//! The HTTP layer lives in the `rlenvs-server` crate; concrete environments
//! live in `rlenvs-envs`. This crate never depends on either.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rlenvs::registry::EnvRegistry;
//! use rlenvs_envs::toy_text::FrozenLakeFactory;
//!
//! let registry = EnvRegistry::new("FrozenLake", Box::new(FrozenLakeFactory));
//! registry.make(0, Some("v1"), &Default::default())?;
//! let first = registry.reset(0, Some(42), &Default::default())?;
//! ```

pub mod dynamics;
pub mod env;
pub mod factory;
pub mod registry;
pub mod spaces;
pub mod timestep;
pub mod vector;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dynamics::{TransitionEntry, TransitionTable};
    pub use crate::env::{Action, Environment, Info, Observation, StepOutcome};
    pub use crate::factory::{EnvFactory, MakeOptions};
    pub use crate::registry::EnvRegistry;
    pub use crate::spaces::{ActionSpace, BoxSpace, DiscreteSpace, Space};
    pub use crate::timestep::{StepKind, TimeStep, TimeStepVector};
    pub use crate::vector::{SyncVectorEnv, VecEnvRegistry};
    pub use crate::{EnvError, Result};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// The client index has never been seen by the registry.
    #[error("Environment {cidx} has not been created")]
    NotFound { family: &'static str, cidx: u32 },

    /// The client index is known but holds no live handle.
    #[error("Environment {family} is not initialized. Have you called make()?")]
    NotInitialized { family: &'static str },

    /// An action outside the declared action space was rejected before
    /// touching the environment.
    #[error("Action {action} not in the action space of {family}")]
    InvalidAction { family: &'static str, action: String },

    /// Malformed request input, e.g. a state index outside the table or a
    /// batch of actions with the wrong length.
    #[error("{0}")]
    InvalidInput(String),

    /// The family does not expose an explicit transition table.
    #[error("Environment {family} does not expose dynamics")]
    UnsupportedDynamics { family: &'static str },

    /// The backend rejected the requested (family, version, options)
    /// combination. The message is surfaced to the client verbatim.
    #[error("{0}")]
    Construction(String),
}

pub type Result<T> = core::result::Result<T, EnvError>;
