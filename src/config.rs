use serde::Deserialize;
use std::path::Path;

use crate::correction::{scale, CorrectionSettings};
use crate::encode::{EncodeSettings, WavFormat};
use crate::error::{Error, Result};
use crate::note::note_to_hz;
use crate::pipeline::Settings;
use crate::pitch::PitchSettings;
use crate::shift::ShifterSettings;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pitch: PitchConfig,
    #[serde(default)]
    pub correction: CorrectionConfig,
    #[serde(default)]
    pub shifter: ShifterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// A frequency given either in Hz or as a note name (`"C2"`, `"F#4"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Frequency {
    Hz(f32),
    Note(String),
}

impl Frequency {
    pub fn to_hz(&self) -> Result<f32> {
        match self {
            Frequency::Hz(hz) => Ok(*hz),
            Frequency::Note(name) => note_to_hz(name),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PitchConfig {
    #[serde(default = "default_fmin")]
    pub fmin: Frequency,
    #[serde(default = "default_fmax")]
    pub fmax: Frequency,
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
}

#[derive(Debug, Deserialize)]
pub struct CorrectionConfig {
    #[serde(default = "default_strength")]
    pub strength: f32,
    #[serde(default = "default_scale")]
    pub scale: String,
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

#[derive(Debug, Deserialize)]
pub struct ShifterConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub wav_format: WavFormat,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            fmin: default_fmin(),
            fmax: default_fmax(),
            frame_length: default_frame_length(),
            hop_length: default_hop_length(),
        }
    }
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            strength: default_strength(),
            scale: default_scale(),
            smoothing_window: default_smoothing_window(),
        }
    }
}

impl Default for ShifterConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
        }
    }
}

pub fn default_strength() -> f32 { 1.0 }
fn default_fmin() -> Frequency { Frequency::Note("C2".into()) }
fn default_fmax() -> Frequency { Frequency::Note("C7".into()) }
fn default_frame_length() -> usize { 2048 }
fn default_hop_length() -> usize { 512 }
fn default_scale() -> String { scale::DEFAULT_SCALE.into() }
fn default_smoothing_window() -> usize { 11 }
fn default_fft_size() -> usize { 2048 }

impl Config {
    /// Resolves note names and builds validated run settings.
    pub fn settings(&self) -> Result<(Settings, EncodeSettings)> {
        let settings = Settings {
            pitch: PitchSettings {
                fmin: self.pitch.fmin.to_hz()?,
                fmax: self.pitch.fmax.to_hz()?,
                frame_length: self.pitch.frame_length,
                hop_length: self.pitch.hop_length,
            },
            correction: CorrectionSettings {
                strength: self.correction.strength,
                scale: self.correction.scale.clone(),
                smoothing_window: self.correction.smoothing_window,
            },
            shifter: ShifterSettings {
                fft_size: self.shifter.fft_size,
            },
        };
        settings.validate()?;
        let encode = EncodeSettings {
            wav_format: self.output.wav_format,
        };
        Ok((settings, encode))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}
