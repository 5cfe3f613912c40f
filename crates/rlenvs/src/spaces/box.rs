//! Continuous (box) action space

use super::Space;
use rand::Rng;

/// Continuous space with uniform bounds over a fixed number of dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSpace {
    low: f64,
    high: f64,
    dims: usize,
}

impl BoxSpace {
    /// Create a box space with the same bounds on every dimension
    pub fn new(low: f64, high: f64, dims: usize) -> Self {
        assert!(low < high, "Box space requires low < high");
        assert!(dims > 0, "Box space must have at least 1 dimension");
        Self { low, high, dims }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn dims(&self) -> usize {
        self.dims
    }
}

impl Space for BoxSpace {
    type Sample = Vec<f64>;

    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample {
        (0..self.dims)
            .map(|_| rng.gen_range(self.low..=self.high))
            .collect()
    }

    fn contains(&self, value: &Self::Sample) -> bool {
        value.len() == self.dims
            && value
                .iter()
                .all(|v| v.is_finite() && *v >= self.low && *v <= self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_box_sample_in_bounds() {
        let space = BoxSpace::new(-2.0, 2.0, 4);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let sample = space.sample(&mut rng);
            assert_eq!(sample.len(), 4);
            assert!(space.contains(&sample));
        }
    }

    #[test]
    fn test_box_contains() {
        let space = BoxSpace::new(0.0, 1.0, 2);
        assert!(space.contains(&vec![0.0, 1.0]));
        assert!(!space.contains(&vec![0.0, 1.1]));
        assert!(!space.contains(&vec![0.5]));
        assert!(!space.contains(&vec![f64::NAN, 0.5]));
    }
}
