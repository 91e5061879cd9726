use anyhow::Result;
use std::sync::{Arc, Mutex};

/// Destination for finished playback buffers.
///
/// `play` must not block until playback completes.
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;
    fn play(&mut self, samples: Vec<f32>) -> Result<()>;
}

impl<O: AudioOutput + ?Sized> AudioOutput for Box<O> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }
    fn play(&mut self, samples: Vec<f32>) -> Result<()> {
        (**self).play(samples)
    }
}

/// Drops every buffer
#[derive(Debug, Clone, Copy)]
pub struct NullOutput {
    pub sample_rate: u32,
}

impl AudioOutput for NullOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    fn play(&mut self, _samples: Vec<f32>) -> Result<()> {
        Ok(())
    }
}

/// Keeps every buffer it is asked to play. Clones share the recording.
#[derive(Debug, Clone)]
pub struct RecordingOutput {
    sample_rate: u32,
    played: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl RecordingOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            played: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn buffers(&self) -> Vec<Vec<f32>> {
        self.played.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.played.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl AudioOutput for RecordingOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    fn play(&mut self, samples: Vec<f32>) -> Result<()> {
        self.played
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(samples);
        Ok(())
    }
}

/// Sends each buffer to several outputs sharing the first output's rate.
pub struct Fanout {
    outputs: Vec<Box<dyn AudioOutput>>,
}

impl Fanout {
    pub fn new(first: Box<dyn AudioOutput>) -> Self {
        Self {
            outputs: vec![first],
        }
    }

    pub fn with(mut self, output: Box<dyn AudioOutput>) -> Self {
        self.outputs.push(output);
        self
    }
}

impl AudioOutput for Fanout {
    fn sample_rate(&self) -> u32 {
        self.outputs.first().map_or(0, |o| o.sample_rate())
    }
    fn play(&mut self, samples: Vec<f32>) -> Result<()> {
        let Some((last, rest)) = self.outputs.split_last_mut() else {
            return Ok(());
        };
        for output in rest {
            output.play(samples.clone())?;
        }
        last.play(samples)
    }
}
