//! Two-tone stimulus synthesis: envelopes, sine tones and buffer assembly.

pub mod envelope;
pub mod ops;
pub mod output;
pub mod player;
pub mod stimulus;
pub mod tone;
pub mod wav;

pub use envelope::{RampShape, create_envelope, linear_ramp, raised_cosine_ramp};
pub use ops::{append, multiply_cyclic, sum_cyclic};
pub use output::{AudioOutput, Fanout, NullOutput, RecordingOutput};
pub use player::StimulusPlayer;
pub use stimulus::{StimulusSynth, SynthParams};
pub use tone::{SineParams, generate_sine};
pub use wav::WavDump;
