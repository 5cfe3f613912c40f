//! Discrete action space

use super::Space;
use rand::Rng;

/// Discrete space with n possible action codes: {0, 1, ..., n-1}, each
/// carrying a human-readable label for the `action-space` route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscreteSpace {
    labels: Vec<String>,
}

impl DiscreteSpace {
    /// Create a new discrete space from the code labels
    pub fn new<S: Into<String>>(labels: Vec<S>) -> Self {
        assert!(!labels.is_empty(), "Discrete space must have at least 1 action");
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of possible action codes
    pub fn n(&self) -> usize {
        self.labels.len()
    }

    /// Labels indexed by action code
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Space for DiscreteSpace {
    type Sample = usize;

    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample {
        rng.gen_range(0..self.labels.len())
    }

    fn contains(&self, value: &Self::Sample) -> bool {
        *value < self.labels.len()
    }
}
