use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Onset/offset ramp shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RampShape {
    #[default]
    Linear,
    RaisedCosine,
}

impl RampShape {
    pub fn ramp(self, length: usize) -> Vec<f32> {
        match self {
            RampShape::Linear => linear_ramp(length),
            RampShape::RaisedCosine => raised_cosine_ramp(length),
        }
    }
}

/// `length` evenly spaced values from 0 to 1 inclusive.
///
/// A single-sample ramp is `[0.0]`.
pub fn linear_ramp(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![0.0; length];
    }
    let step = 1.0 / (length - 1) as f64;
    (0..length).map(|i| (i as f64 * step) as f32).collect()
}

/// Half a cosine period rising from 0 to 1 inclusive.
pub fn raised_cosine_ramp(length: usize) -> Vec<f32> {
    linear_ramp(length)
        .into_iter()
        .map(|x| (0.5 - 0.5 * (PI * x as f64).cos()) as f32)
        .collect()
}

/// Builds an amplitude envelope spanning `signal_len` samples: a rising ramp
/// of `ramp_len` samples, unity in the middle and the mirrored ramp at the
/// end.
pub fn create_envelope<F>(ramp_len: usize, signal_len: usize, ramp: F) -> Result<Vec<f32>>
where
    F: Fn(usize) -> Vec<f32>,
{
    ensure!(
        signal_len >= ramp_len * 2,
        "length of ramps ({ramp_len} samples each) exceeds length of signal ({signal_len} samples)"
    );

    let start = ramp(ramp_len);
    ensure!(
        start.len() == ramp_len,
        "ramp function returned {} samples, expected {ramp_len}",
        start.len()
    );

    let mut envelope = Vec::with_capacity(signal_len);
    envelope.extend_from_slice(&start);
    envelope.resize(signal_len - ramp_len, 1.0);
    envelope.extend(start.iter().rev());
    Ok(envelope)
}
