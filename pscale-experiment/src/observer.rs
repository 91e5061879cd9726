use anyhow::{Result, ensure};
use pscale_core::{InteractionState, Response, StimulusSink};
use pscale_timing::Timer;
use rand::Rng;

use crate::state::{TrialInput, TrialStateMachine};

/// Scripted participant for headless runs.
///
/// Clicks uniformly over the drawable, occasionally drags the criterion
/// line first, waits out the response delay on the machine's own timer and
/// answers "yes" when the noisy stimulus exceeds its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedObserver {
    pub threshold: f64,
    pub noise: f64,
    pub p_adjust_criterion: f64,
}

impl Default for SimulatedObserver {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            noise: 1.0,
            p_adjust_criterion: 0.2,
        }
    }
}

impl SimulatedObserver {
    pub fn decide<G: Rng + ?Sized>(&self, stimulus: f64, rng: &mut G) -> Response {
        let heard = stimulus + self.noise * (2.0 * rng.random::<f64>() - 1.0);
        if heard > self.threshold {
            Response::Yes
        } else {
            Response::No
        }
    }

    /// Runs `trials` complete trials on the machine's current task.
    pub fn run_trials<T, R, S, G>(
        &self,
        machine: &mut TrialStateMachine<T, R, S>,
        trials: usize,
        rng: &mut G,
    ) -> Result<()>
    where
        T: Timer<Timestamp = u64>,
        R: Rng,
        S: StimulusSink,
        G: Rng + ?Sized,
    {
        ensure!(machine.task().is_some(), "no task is running");
        let height = machine.viewport.height;
        let width = machine.viewport.width;

        for _ in 0..trials {
            if rng.random::<f64>() < self.p_adjust_criterion {
                let from = machine.criterion.position();
                let to = rng.random::<f64>() * height;
                machine.handle_input(TrialInput::PointerMove { x: 0.0, y: from });
                machine.handle_input(TrialInput::PointerDown { x: 0.0, y: from });
                machine.handle_input(TrialInput::PointerMove { x: 0.0, y: to });
                machine.handle_input(TrialInput::PointerUp { x: 0.0, y: to });
            }

            let x = rng.random::<f64>() * width;
            let y = rng.random::<f64>() * height;
            machine.handle_input(TrialInput::PointerDown { x, y });
            machine.handle_input(TrialInput::PointerUp { x, y });
            ensure!(
                machine.current_state() == InteractionState::PlayingStimulus,
                "click at ({x:.1}, {y:.1}) did not start a trial"
            );

            if let Some(wait) = machine.time_until_due() {
                machine.timer.sleep(wait);
            }
            for input in machine.update() {
                machine.handle_input(input);
            }
            ensure!(machine.is_awaiting_response(), "response window did not open");

            let stimulus = machine.last_stimulus().unwrap_or(0.0);
            let response = self.decide(stimulus, rng);
            machine.handle_input(TrialInput::ResponseChosen(response));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn decisions_follow_the_threshold_without_noise() {
        let obs = SimulatedObserver {
            threshold: 2.0,
            noise: 0.0,
            p_adjust_criterion: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(obs.decide(2.5, &mut rng), Response::Yes);
        assert_eq!(obs.decide(2.0, &mut rng), Response::No);
        assert_eq!(obs.decide(0.0, &mut rng), Response::No);
    }
}
