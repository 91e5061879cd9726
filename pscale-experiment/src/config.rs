use anyhow::{Context, Result, ensure};
use pscale_core::{CatchTrial, Transducer};
use pscale_synth::{RampShape, SynthParams};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Run-wide settings, fixed at process start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub stim_length_ms: u64,
    pub ramp_length_ms: u64,
    pub ref_freq_hz: f64,
    pub tone_amplitude: f32,
    pub ramp_shape: RampShape,
    pub p_catch_trial: f64,
    pub lambda_px_range: (f64, f64),
    pub beta_range: (f64, f64),
    pub max_val_range: (f64, f64),
    pub criterion_initial_y_px: f64,
    pub criterion_grab_tolerance_px: f64,
    pub tasks_per_session: usize,
    pub output_dir: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            stim_length_ms: 200,
            ramp_length_ms: 10,
            ref_freq_hz: 400.0,
            tone_amplitude: 0.5,
            ramp_shape: RampShape::Linear,
            p_catch_trial: 0.1,
            lambda_px_range: (50.0, 200.0),
            beta_range: (0.75, 1.5),
            max_val_range: (8.0, 12.0),
            criterion_initial_y_px: 100.0,
            criterion_grab_tolerance_px: 5.0,
            tasks_per_session: 5,
            output_dir: ".".to_string(),
        }
    }
}

impl ExperimentConfig {
    /// Delay between the click and the response box: twice the stimulus.
    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.stim_length_ms * 2)
    }

    pub fn synth_params(&self) -> SynthParams {
        SynthParams {
            stim_length_ms: self.stim_length_ms as f64,
            ramp_length_ms: self.ramp_length_ms as f64,
            ref_freq_hz: self.ref_freq_hz,
            amplitude: self.tone_amplitude,
            ramp: self.ramp_shape,
        }
    }

    pub fn catch_trial(&self) -> CatchTrial {
        CatchTrial::new(self.p_catch_trial)
    }

    pub fn draw_transducer<R: Rng + ?Sized>(&self, rng: &mut R) -> Transducer {
        Transducer::draw(self.lambda_px_range, self.beta_range, self.max_val_range, rng)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.stim_length_ms >= self.ramp_length_ms * 2,
            "stim_length_ms ({}) must be at least twice ramp_length_ms ({})",
            self.stim_length_ms,
            self.ramp_length_ms
        );
        // The sample-level check needs the device rate; `StimulusPlayer::new` makes it.
        ensure!(
            (0.0..=1.0).contains(&self.p_catch_trial),
            "p_catch_trial ({}) must lie in [0, 1]",
            self.p_catch_trial
        );
        ensure!(
            (0.0..=1.0).contains(&self.tone_amplitude),
            "tone_amplitude ({}) must lie in [0, 1]",
            self.tone_amplitude
        );
        for (name, (lo, hi)) in [
            ("lambda_px_range", self.lambda_px_range),
            ("beta_range", self.beta_range),
            ("max_val_range", self.max_val_range),
        ] {
            ensure!(
                lo.is_finite() && hi.is_finite() && lo <= hi,
                "{name} must be an ordered pair of finite numbers, got [{lo}, {hi}]"
            );
        }
        ensure!(self.lambda_px_range.0 >= 0.0, "lambda_px_range must be non-negative");
        ensure!(self.beta_range.0 > 0.0, "beta_range must be positive");
        ensure!(self.tasks_per_session > 0, "tasks_per_session must be at least 1");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let cfg: Self =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    /// Reads `path`, falling back to defaults when it cannot be parsed. A
    /// missing file is created holding the defaults commented out.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            return match Self::load(path_obj) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("{err:#}. Using defaults.");
                    Self::default()
                }
            };
        }

        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                let mut commented = String::new();
                for line in text.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || (trimmed.starts_with('[') && !trimmed.contains('=')) {
                        commented.push_str(line);
                    } else {
                        commented.push_str("# ");
                        commented.push_str(line);
                    }
                    commented.push('\n');
                }
                if let Err(err) = fs::write(path_obj, commented) {
                    tracing::warn!("Failed to write default config to {path}: {err}");
                }
            }
            Err(err) => tracing::warn!("Failed to serialize default config: {err}"),
        }
        default_cfg
    }
}
