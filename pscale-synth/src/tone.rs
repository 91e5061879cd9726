use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineParams {
    pub freq_hz: f64,
    pub duration_samples: usize,
    /// Between 0 and 1
    pub amplitude: f32,
    pub sample_rate: u32,
    /// Radians
    pub phase: f64,
}

impl SineParams {
    pub fn new(freq_hz: f64, duration_samples: usize, amplitude: f32, sample_rate: u32) -> Self {
        Self {
            freq_hz,
            duration_samples,
            amplitude,
            sample_rate,
            phase: 0.0,
        }
    }
}

/// Sample `i` is `sin(2π·(i/fs)·f + φ)·a`.
pub fn generate_sine(params: &SineParams) -> Vec<f32> {
    let fs = params.sample_rate as f64;
    let amplitude = params.amplitude as f64;
    (0..params.duration_samples)
        .map(|i| {
            let t = i as f64 / fs;
            ((2.0 * PI * t * params.freq_hz + params.phase).sin() * amplitude) as f32
        })
        .collect()
}
