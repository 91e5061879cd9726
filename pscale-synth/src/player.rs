use anyhow::{Context, Result};
use pscale_core::StimulusSink;

use crate::output::AudioOutput;
use crate::stimulus::{StimulusSynth, SynthParams};

/// Turns stimulus intensities into two-tone buffers and hands them to an
/// audio output.
pub struct StimulusPlayer<O: AudioOutput> {
    synth: StimulusSynth,
    output: O,
    played: usize,
}

impl<O: AudioOutput> StimulusPlayer<O> {
    /// Fails when the ramps do not fit the stimulus once both are rounded
    /// to samples at the output's rate.
    pub fn new(params: SynthParams, output: O) -> Result<Self> {
        let synth = StimulusSynth::new(params, output.sample_rate());
        synth
            .validate()
            .with_context(|| format!("at {} Hz", synth.sample_rate()))?;
        tracing::debug!(
            sample_rate = synth.sample_rate(),
            stim_samples = synth.stim_samples(),
            ramp_samples = synth.ramp_samples(),
            "stimulus player ready"
        );
        Ok(Self {
            synth,
            output,
            played: 0,
        })
    }

    pub fn played(&self) -> usize {
        self.played
    }
}

impl<O: AudioOutput> StimulusSink for StimulusPlayer<O> {
    fn dispatch(&mut self, intensity: f64) -> Result<()> {
        let buffer = self
            .synth
            .two_tone(intensity)
            .context("stimulus generation aborted")?;
        self.output.play(buffer)?;
        self.played += 1;
        tracing::debug!(intensity, played = self.played, "stimulus dispatched");
        Ok(())
    }
}
