use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use pscale_synth::{AudioOutput, Fanout, NullOutput, WavDump};
use ringbuf::traits::*;
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Rate used when no device is opened.
pub const FALLBACK_SAMPLE_RATE: u32 = 48_000;

/// Mono playback on the default output device.
///
/// Buffers are queued on a ring buffer drained by the device callback, so
/// `play` returns immediately. The same sample is written to every channel.
pub struct CpalOutput {
    stream: Option<cpal::Stream>,
    producer: HeapProd<f32>,
    sample_rate: u32,
}

impl CpalOutput {
    /// Opens the default device with room for `queue_secs` of queued audio.
    pub fn new(queue_secs: f32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no output device"))?;

        let supported = device.default_output_config()?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;

        let config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let capacity = ((sample_rate as f32 * queue_secs) as usize).max(1);
        let rb = HeapRb::<f32>::new(capacity);
        let (producer, mut consumer): (HeapProd<f32>, HeapCons<f32>) = rb.split();

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let s = consumer.try_pop().unwrap_or(0.0);
                    frame.fill(s);
                }
            },
            |err| tracing::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let name = device.name().unwrap_or_default();
        tracing::info!(
            device = %name,
            sample_rate,
            channels,
            "audio output opened"
        );

        Ok(Self {
            stream: Some(stream),
            producer,
            sample_rate,
        })
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&mut self, samples: Vec<f32>) -> Result<()> {
        let written = self.producer.push_slice(&samples);
        if written < samples.len() {
            tracing::warn!(
                dropped = samples.len() - written,
                "audio queue full, stimulus truncated"
            );
        }
        Ok(())
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("audio stream stopped");
        }
    }
}

/// Builds the output chain: the audio device (or silence), plus a WAV dump
/// when `wav_dir` is set.
pub fn build_output(no_audio: bool, wav_dir: Option<&str>) -> Result<Box<dyn AudioOutput>> {
    let device: Box<dyn AudioOutput> = if no_audio {
        Box::new(NullOutput {
            sample_rate: FALLBACK_SAMPLE_RATE,
        })
    } else {
        match CpalOutput::new(2.0) {
            Ok(out) => Box::new(out),
            Err(err) => {
                tracing::warn!("audio device unavailable, continuing without sound: {err:#}");
                Box::new(NullOutput {
                    sample_rate: FALLBACK_SAMPLE_RATE,
                })
            }
        }
    };

    let Some(dir) = wav_dir else {
        return Ok(device);
    };
    let dump = WavDump::new(dir, device.sample_rate())?;
    tracing::info!(dir, "writing stimuli as WAV");
    Ok(Box::new(Fanout::new(device).with(Box::new(dump))))
}
