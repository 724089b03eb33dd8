//! WAV output through hound.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use serde::Deserialize;

use crate::audio::decode::AudioData;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavFormat {
    /// 16-bit integer, samples clamped to [-1, 1]
    #[default]
    Pcm16,
    Float32,
}

impl WavFormat {
    fn spec(self, sample_rate: u32) -> WavSpec {
        let (bits_per_sample, sample_format) = match self {
            WavFormat::Pcm16 => (16, SampleFormat::Int),
            WavFormat::Float32 => (32, SampleFormat::Float),
        };
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

/// Writes `audio` as a mono WAV file.
pub fn write_wav(path: &Path, audio: &AudioData, format: WavFormat) -> Result<()> {
    let wav_err = |source| Error::Wav {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WavWriter::create(path, format.spec(audio.sample_rate)).map_err(wav_err)?;
    match format {
        WavFormat::Pcm16 => {
            for &sample in &audio.samples {
                writer.write_sample(to_pcm16(sample)).map_err(wav_err)?;
            }
        }
        WavFormat::Float32 => {
            for &sample in &audio.samples {
                writer.write_sample(sample).map_err(wav_err)?;
            }
        }
    }
    writer.finalize().map_err(wav_err)?;

    log::debug!(
        "Wrote {} samples ({:?}) to {}",
        audio.samples.len(),
        format,
        path.display()
    );
    Ok(())
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
