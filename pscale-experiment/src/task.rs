use anyhow::{Result, anyhow};
use pscale_core::{Response, Transducer, TrialRecord};
use rand::Rng;

use crate::config::ExperimentConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PendingTrial {
    stimulus: Option<f64>,
    criterion: Option<f64>,
}

/// One block of trials sharing a single set of transducer parameters.
///
/// Trials are appended only when they close, so every closed trial has its
/// stimulus, response and criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    params: Transducer,
    trials: Vec<TrialRecord>,
    pending: PendingTrial,
}

impl Task {
    pub fn new(params: Transducer) -> Self {
        Self {
            params,
            trials: Vec::new(),
            pending: PendingTrial::default(),
        }
    }

    /// Draws fresh parameters from the configured ranges.
    pub fn draw<R: Rng + ?Sized>(config: &ExperimentConfig, rng: &mut R) -> Self {
        let params = config.draw_transducer(rng);
        tracing::info!(
            lambda_px = params.lambda_px,
            beta = params.beta,
            max_val = params.max_val,
            "task parameters drawn"
        );
        Self::new(params)
    }

    pub fn params(&self) -> &Transducer {
        &self.params
    }

    /// Index of the trial currently being filled in.
    pub fn current_index(&self) -> usize {
        self.trials.len()
    }

    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    pub fn pending_stimulus(&self) -> Option<f64> {
        self.pending.stimulus
    }

    pub fn pending_criterion(&self) -> Option<f64> {
        self.pending.criterion
    }

    pub fn record_stimulus(&mut self, stimulus: f64) {
        self.pending.stimulus = Some(stimulus);
    }

    /// Overwrites the current trial's criterion; the last write before the
    /// trial closes is the one kept.
    pub fn record_criterion(&mut self, criterion: f64) {
        self.pending.criterion = Some(criterion);
    }

    pub fn close_trial(&mut self, response: Response) -> Result<TrialRecord> {
        let index = self.current_index();
        let stimulus = self
            .pending
            .stimulus
            .ok_or_else(|| anyhow!("trial {index} has no stimulus"))?;
        let criterion = self
            .pending
            .criterion
            .ok_or_else(|| anyhow!("trial {index} has no criterion"))?;
        let record = TrialRecord {
            stimulus,
            response,
            criterion,
        };
        self.trials.push(record);
        self.pending = PendingTrial::default();
        Ok(record)
    }

    /// Freezes the task. A trial still in progress is dropped.
    pub fn finish(self) -> CompletedTask {
        if self.pending.stimulus.is_some() {
            tracing::warn!(trial = self.trials.len(), "unfinished trial discarded");
        }
        CompletedTask {
            params: self.params,
            trials: self.trials,
        }
    }
}

/// A finished task. Read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTask {
    params: Transducer,
    trials: Vec<TrialRecord>,
}

impl CompletedTask {
    pub fn params(&self) -> &Transducer {
        &self.params
    }

    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

/// Completed tasks filled with random values, for exercising the exporter.
pub fn sham_tasks<R: Rng + ?Sized>(
    config: &ExperimentConfig,
    tasks: usize,
    trials: usize,
    rng: &mut R,
) -> Vec<CompletedTask> {
    (0..tasks)
        .map(|_| {
            let mut task = Task::new(config.draw_transducer(rng));
            for _ in 0..trials {
                task.record_stimulus(rng.random::<f64>() * 10.0);
                task.record_criterion(rng.random::<f64>() * 10.0);
                let response = if rng.random::<bool>() {
                    Response::Yes
                } else {
                    Response::No
                };
                // stimulus and criterion were just recorded
                let _ = task.close_trial(response);
            }
            task.finish()
        })
        .collect()
}
