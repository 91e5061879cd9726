use anyhow::Result;

/// Receives the intensity of each presented stimulus.
///
/// This is the only coupling between trial logic and audio output. The
/// intensity is finite and non-negative.
pub trait StimulusSink {
    fn dispatch(&mut self, intensity: f64) -> Result<()>;
}

/// Sink that discards every stimulus
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StimulusSink for NullSink {
    fn dispatch(&mut self, _intensity: f64) -> Result<()> {
        Ok(())
    }
}

impl<S: StimulusSink + ?Sized> StimulusSink for Box<S> {
    fn dispatch(&mut self, intensity: f64) -> Result<()> {
        (**self).dispatch(intensity)
    }
}
