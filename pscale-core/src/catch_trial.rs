use rand::Rng;

/// Randomly attenuates a computed intensity on a fraction of trials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatchTrial {
    pub probability: f64,
}

impl CatchTrial {
    pub fn new(probability: f64) -> Self {
        Self { probability }
    }

    /// With `probability`, scales `s` by a uniform factor in `[0, 1)`.
    /// Catch trials never hard-zero the intensity.
    pub fn apply<R: Rng + ?Sized>(&self, s: f64, rng: &mut R) -> f64 {
        if rng.random::<f64>() < self.probability {
            let factor = rng.random::<f64>();
            tracing::debug!(s, factor, "catch trial");
            s * factor
        } else {
            s
        }
    }
}

impl Default for CatchTrial {
    fn default() -> Self {
        Self { probability: 0.1 }
    }
}
