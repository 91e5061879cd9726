use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::AudioOutput;

/// Writes each buffer to `dir/stim_NNNN.wav` as 16-bit mono.
pub struct WavDump {
    dir: PathBuf,
    sample_rate: u32,
    next_index: usize,
}

impl WavDump {
    pub fn new(dir: impl AsRef<Path>, sample_rate: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(Self {
            dir,
            sample_rate,
            next_index: 0,
        })
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("stim_{index:04}.wav"))
    }
}

impl AudioOutput for WavDump {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&mut self, samples: Vec<f32>) -> Result<()> {
        let path = self.path_for(self.next_index);
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer =
            WavWriter::create(&path, spec).with_context(|| format!("creating {}", path.display()))?;
        for &s in &samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(v)?;
        }
        writer.finalize()?;
        tracing::debug!(path = %path.display(), samples = samples.len(), "stimulus written");
        self.next_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "pscale_wav_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn buffers_land_in_numbered_files() {
        let dir = unique_dir("numbered");
        let mut dump = WavDump::new(&dir, 8_000).unwrap();
        dump.play(vec![0.0, 0.5, -0.5, 1.0]).unwrap();
        dump.play(vec![0.25; 10]).unwrap();

        let mut reader = hound::WavReader::open(dir.join("stim_0000.wav")).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16_383, -16_383, i16::MAX]);

        let second = hound::WavReader::open(dir.join("stim_0001.wav")).unwrap();
        assert_eq!(second.len(), 10);

        let _ = fs::remove_dir_all(&dir);
    }
}
