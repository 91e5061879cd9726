use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, default_value = "pscale.toml")]
    pub config: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Run a full session headless with a simulated observer
    #[arg(long, default_value_t = false)]
    pub simulate: bool,

    /// Trials per task when simulating
    #[arg(long, default_value_t = 20)]
    pub trials_per_task: usize,

    /// Seed for task parameters and catch trials
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write every stimulus to a numbered WAV file in this directory
    #[arg(long)]
    pub wav_dir: Option<String>,

    /// Do not open an audio device
    #[arg(long, default_value_t = false)]
    pub no_audio: bool,
}
