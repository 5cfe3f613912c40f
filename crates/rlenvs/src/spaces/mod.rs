//! Action space types.
//!
//! Provides Gymnasium-compatible space definitions used both for validating
//! incoming actions and for the per-family `action-space` discovery route.

mod r#box;
mod discrete;

pub use discrete::DiscreteSpace;
pub use r#box::BoxSpace;

use rand::Rng;
use serde_json::{json, Value};

use crate::env::Action;

/// Trait for action spaces
pub trait Space: Clone + Send + Sync {
    /// The type of samples from this space
    type Sample;

    /// Sample a random element from this space
    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample;

    /// Check if a value is contained in this space
    fn contains(&self, value: &Self::Sample) -> bool;
}

/// Enum for dynamic space types
#[derive(Clone, Debug)]
pub enum ActionSpace {
    Discrete(DiscreteSpace),
    Box(BoxSpace),
}

impl ActionSpace {
    /// Check whether a wire-level action is a member of this space.
    pub fn contains(&self, action: &Action) -> bool {
        match (self, action) {
            (ActionSpace::Discrete(s), Action::Discrete(a)) => {
                *a >= 0 && s.contains(&(*a as usize))
            }
            (ActionSpace::Box(s), Action::Continuous(a)) => s.dims() == 1 && s.contains(&vec![*a]),
            (ActionSpace::Box(s), Action::Box(v)) => s.contains(v),
            // An integer action is acceptable for a one-dimensional box.
            (ActionSpace::Box(s), Action::Discrete(a)) => {
                s.dims() == 1 && s.contains(&vec![*a as f64])
            }
            _ => false,
        }
    }

    /// JSON description served by the `action-space` route: a code-to-label
    /// map for discrete spaces, bounds and shape for continuous ones.
    pub fn describe(&self) -> Value {
        match self {
            ActionSpace::Discrete(s) => {
                let mut map = serde_json::Map::new();
                for (code, label) in s.labels().iter().enumerate() {
                    map.insert(code.to_string(), Value::String(label.to_string()));
                }
                Value::Object(map)
            }
            ActionSpace::Box(s) => json!({
                "low": s.low(),
                "high": s.high(),
                "shape": [s.dims()],
            }),
        }
    }
}
