use anyhow::Result;
use pscale_core::{NullSink, SessionPhase, StimulusSink, Viewport};
use pscale_experiment::{ExperimentConfig, Session, SimulatedObserver};
use pscale_synth::StimulusPlayer;
use pscale_timing::ManualTimer;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

use crate::audio;
use crate::cli::Args;

const PRACTICE_TRIALS: usize = 5;
const SCREEN: Viewport = Viewport {
    width: 1280.0,
    height: 800.0,
};

/// Runs a whole session headless on a manual clock and writes its data file.
pub fn run(
    config: ExperimentConfig,
    args: &Args,
    rng: StdRng,
    mut observer_rng: StdRng,
) -> Result<PathBuf> {
    let sink: Box<dyn StimulusSink> = match args.wav_dir.as_deref() {
        Some(dir) => Box::new(StimulusPlayer::new(
            config.synth_params(),
            audio::build_output(true, Some(dir))?,
        )?),
        None => Box::new(NullSink),
    };

    let mut session = Session::new(config, SCREEN, ManualTimer::new(), rng, sink);
    let observer = SimulatedObserver::default();
    tracing::info!(
        tasks = session.config.tasks_per_session,
        trials = args.trials_per_task,
        "simulating session"
    );

    loop {
        match session.phase {
            SessionPhase::Welcome | SessionPhase::Intermission => {
                session.advance_phase();
            }
            SessionPhase::Practice => {
                observer.run_trials(&mut session.machine, PRACTICE_TRIALS, &mut observer_rng)?;
                session.advance_phase();
            }
            SessionPhase::Experiment => {
                observer.run_trials(&mut session.machine, args.trials_per_task, &mut observer_rng)?;
                session.next_task();
            }
            SessionPhase::Goodbye => break,
        }
    }

    let dir = Path::new(&session.config.output_dir).to_path_buf();
    let path = session.write_data(&dir)?;
    tracing::info!(path = %path.display(), "simulated session saved");
    Ok(path)
}
