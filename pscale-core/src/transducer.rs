use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-task power-law transducer mapping a vertical position to an intensity.
///
/// Positions at or above `lambda_px` (measured from the bottom of the
/// drawable) map to `p^beta * max_val`, where `p` is the normalized height
/// above the threshold. Everything below the threshold collapses to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transducer {
    pub lambda_px: f64,
    pub beta: f64,
    pub max_val: f64,
}

impl Transducer {
    pub fn new(lambda_px: f64, beta: f64, max_val: f64) -> Self {
        Self {
            lambda_px,
            beta,
            max_val,
        }
    }

    /// Draws each parameter uniformly from its `[lo, hi)` range.
    pub fn draw<R: Rng + ?Sized>(
        lambda_px: (f64, f64),
        beta: (f64, f64),
        max_val: (f64, f64),
        rng: &mut R,
    ) -> Self {
        Self {
            lambda_px: uniform(lambda_px, rng),
            beta: uniform(beta, rng),
            max_val: uniform(max_val, rng),
        }
    }

    /// `y` is in local coordinates with the origin at the top of a drawable
    /// `height_px` tall.
    pub fn intensity(&self, y: f64, height_px: f64) -> f64 {
        if !y.is_finite() || !height_px.is_finite() || height_px <= self.lambda_px {
            tracing::warn!(
                y,
                height_px,
                lambda_px = self.lambda_px,
                "degenerate geometry, intensity forced to 0"
            );
            return 0.0;
        }

        let y_coord = height_px - y;
        if y_coord < self.lambda_px {
            return 0.0;
        }

        let p = ((y_coord - self.lambda_px) / (height_px - self.lambda_px)).clamp(0.0, 1.0);
        p.powf(self.beta) * self.max_val
    }
}

fn uniform<R: Rng + ?Sized>((lo, hi): (f64, f64), rng: &mut R) -> f64 {
    lo + rng.random::<f64>() * (hi - lo)
}
