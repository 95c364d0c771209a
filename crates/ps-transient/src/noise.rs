//! Uniform sensor noise added to system outputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{SimError, SimResult};

/// Bounded uniform perturbation emulating sensor jitter.
#[derive(Debug, Clone)]
pub struct Noise {
    random_error: f64,
    rng: StdRng,
}

impl Noise {
    /// Noise in `[-random_error, random_error]`, seeded from the OS.
    pub fn new(random_error: f64) -> SimResult<Self> {
        Self::validate(random_error)?;
        Ok(Self {
            random_error,
            rng: StdRng::from_entropy(),
        })
    }

    /// Reproducible noise for tests and recorded runs.
    pub fn seeded(random_error: f64, seed: u64) -> SimResult<Self> {
        Self::validate(random_error)?;
        Ok(Self {
            random_error,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn validate(random_error: f64) -> SimResult<()> {
        if !random_error.is_finite() || random_error < 0.0 {
            return Err(SimError::config(format!(
                "random_error must be a non-negative number, got {random_error}"
            )));
        }
        Ok(())
    }

    pub fn random_error(&self) -> f64 {
        self.random_error
    }

    pub fn sample(&mut self) -> f64 {
        if self.random_error == 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-self.random_error..=self.random_error)
    }

    pub fn apply(&mut self, value: f64) -> f64 {
        value + self.sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_band() {
        let mut noise = Noise::seeded(0.5, 7).unwrap();
        for _ in 0..1_000 {
            let v = noise.apply(10.0);
            assert!((9.5..=10.5).contains(&v));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Noise::seeded(1.0, 42).unwrap();
        let mut b = Noise::seeded(1.0, 42).unwrap();
        for _ in 0..10 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn zero_error_is_exact() {
        let mut noise = Noise::new(0.0).unwrap();
        assert_eq!(noise.apply(3.25), 3.25);
    }

    #[test]
    fn negative_error_rejected() {
        assert!(Noise::new(-0.1).is_err());
    }
}
