mod app;
mod audio;
mod cli;
mod render;
mod simulate;

use anyhow::Result;
use clap::Parser;
use pscale_core::StimulusSink;
use pscale_experiment::ExperimentConfig;
use pscale_synth::StimulusPlayer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

pub use app::App;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = ExperimentConfig::load_or_default(&args.config);
    config.validate()?;

    let (rng, observer_rng) = match args.seed {
        Some(seed) => (
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (StdRng::from_os_rng(), StdRng::from_os_rng()),
    };

    if args.simulate {
        simulate::run(config, &args, rng, observer_rng)?;
        return Ok(());
    }

    let output = audio::build_output(args.no_audio, args.wav_dir.as_deref())?;
    let player = StimulusPlayer::new(config.synth_params(), output)?;
    let sink: Box<dyn StimulusSink> = Box::new(player);
    let app = App::new(config, rng, sink);
    app.run()?;

    Ok(())
}
