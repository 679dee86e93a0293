//! Stereo WAV file I/O.

use std::path::Path;

use anyhow::Context;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Deinterleaved stereo audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoSamples {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoSamples {
    pub fn with_len(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
        }
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    /// Append `count` samples of silence to both channels.
    pub fn pad(&mut self, count: usize) {
        self.left.resize(self.left.len() + count, 0.0);
        self.right.resize(self.right.len() + count, 0.0);
    }
}

/// Read a WAV file as stereo.
///
/// Mono files are duplicated to both channels; files with more than two
/// channels keep the first two. Integer samples are scaled to `[-1, 1)`.
pub fn read_wav_stereo(path: &Path) -> anyhow::Result<(StereoSamples, u32)> {
    let reader = WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("decoding {}", path.display()))?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<_, _>>()
                .with_context(|| format!("decoding {}", path.display()))?
        }
    };

    let frames = interleaved.len() / channels;
    let mut samples = StereoSamples {
        left: Vec::with_capacity(frames),
        right: Vec::with_capacity(frames),
    };
    for frame in interleaved.chunks_exact(channels) {
        samples.left.push(frame[0]);
        samples.right.push(frame.get(1).copied().unwrap_or(frame[0]));
    }
    Ok((samples, spec.sample_rate))
}

/// Write 32-bit float stereo WAV.
pub fn write_wav_stereo(path: &Path, samples: &StereoSamples, sample_rate: u32) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    for (&l, &r) in samples.left.iter().zip(&samples.right) {
        writer.write_sample(l)?;
        writer.write_sample(r)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stereo_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("st.wav");
        let samples = StereoSamples {
            left: (0..100).map(|i| i as f32 / 100.0).collect(),
            right: (0..100).map(|i| -(i as f32) / 100.0).collect(),
        };
        write_wav_stereo(&path, &samples, 48000).unwrap();
        let (loaded, sample_rate) = read_wav_stereo(&path).unwrap();
        assert_eq!(sample_rate, 48000);
        assert_eq!(loaded, samples);
    }

    #[test]
    fn mono_int_file_is_duplicated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for v in [0i16, 16384, -16384] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let (loaded, _) = read_wav_stereo(&path).unwrap();
        assert_eq!(loaded.left, [0.0, 0.5, -0.5]);
        assert_eq!(loaded.left, loaded.right);
    }

    #[test]
    fn pad_extends_both_channels() {
        let mut s = StereoSamples::with_len(3);
        s.pad(5);
        assert_eq!(s.frames(), 8);
        assert_eq!(s.right.len(), 8);
    }
}
