use anyhow::{Result, ensure};

use crate::envelope::{RampShape, create_envelope};
use crate::ops::{append, multiply_cyclic};
use crate::tone::{SineParams, generate_sine};

/// Timing and pitch of the reference/test tone pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    pub stim_length_ms: f64,
    pub ramp_length_ms: f64,
    pub ref_freq_hz: f64,
    pub amplitude: f32,
    pub ramp: RampShape,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            stim_length_ms: 200.0,
            ramp_length_ms: 10.0,
            ref_freq_hz: 400.0,
            amplitude: 0.5,
            ramp: RampShape::Linear,
        }
    }
}

/// Builds the per-trial playback buffer at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct StimulusSynth {
    params: SynthParams,
    sample_rate: u32,
    stim_samples: usize,
    ramp_samples: usize,
}

impl StimulusSynth {
    pub fn new(params: SynthParams, sample_rate: u32) -> Self {
        Self {
            params,
            sample_rate,
            stim_samples: ms_to_samples(params.stim_length_ms, sample_rate),
            ramp_samples: ms_to_samples(params.ramp_length_ms, sample_rate),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn stim_samples(&self) -> usize {
        self.stim_samples
    }

    pub fn ramp_samples(&self) -> usize {
        self.ramp_samples
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.stim_samples >= self.ramp_samples * 2,
            "stimulus of {} samples cannot hold two ramps of {} samples",
            self.stim_samples,
            self.ramp_samples
        );
        Ok(())
    }

    /// Reference tone followed by a tone `delta_hz` above it, both enveloped.
    pub fn two_tone(&self, delta_hz: f64) -> Result<Vec<f32>> {
        let ramp = self.params.ramp;
        let envelope = create_envelope(self.ramp_samples, self.stim_samples, |n| ramp.ramp(n))?;

        let reference = generate_sine(&SineParams::new(
            self.params.ref_freq_hz,
            self.stim_samples,
            self.params.amplitude,
            self.sample_rate,
        ));
        let test = generate_sine(&SineParams::new(
            self.params.ref_freq_hz + delta_hz,
            self.stim_samples,
            self.params.amplitude,
            self.sample_rate,
        ));

        let reference = multiply_cyclic(&reference, &envelope);
        let test = multiply_cyclic(&test, &envelope);
        Ok(append(&reference, &test))
    }
}

fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    (sample_rate as f64 * (ms / 1000.0)).round().max(0.0) as usize
}
