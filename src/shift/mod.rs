//! Duration-preserving pitch shifting.
//!
//! The signal is time-stretched by the pitch factor with a phase vocoder and
//! read back at the same factor, which restores the original length and moves
//! every partial by that factor.

mod resample;
mod vocoder;

use crate::error::{Error, Result};
use resample::resample_cubic;
use vocoder::PhaseVocoder;

/// Shifts smaller than this are treated as no shift at all.
const IDENTITY_SEMITONES: f32 = 1e-6;
const MIN_RATIO: f64 = 0.25;
const MAX_RATIO: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ShifterSettings {
    /// Phase vocoder frame size (power of two); the analysis hop is a quarter of it
    pub fft_size: usize,
}

impl Default for ShifterSettings {
    fn default() -> Self {
        Self { fft_size: 2048 }
    }
}

impl ShifterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.fft_size < 256 || !self.fft_size.is_power_of_two() {
            return Err(Error::Config(format!(
                "fft_size must be a power of two >= 256, got {}",
                self.fft_size
            )));
        }
        Ok(())
    }

    fn hop_analysis(&self) -> usize {
        self.fft_size / 4
    }
}

/// Shifts `samples` by `semitones` (fractional, either sign) keeping length and rate.
pub fn pitch_shift(
    samples: &[f32],
    sample_rate: u32,
    semitones: f32,
    settings: &ShifterSettings,
) -> Result<Vec<f32>> {
    settings.validate()?;
    if sample_rate == 0 {
        return Err(Error::Shift("sample rate must be positive".into()));
    }
    if !semitones.is_finite() {
        return Err(Error::Shift(format!("shift must be finite, got {}", semitones)));
    }
    if semitones.abs() < IDENTITY_SEMITONES {
        log::debug!("Shift of {} semitones is an identity", semitones);
        return Ok(samples.to_vec());
    }

    let factor = 2.0_f64.powf(semitones as f64 / 12.0);
    let hop_analysis = settings.hop_analysis();
    let hop_synthesis = (hop_analysis as f64 * factor).round() as usize;
    let ratio = hop_synthesis as f64 / hop_analysis as f64;
    if !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
        return Err(Error::Shift(format!(
            "{:.2} semitones is outside the supported range of ±24",
            semitones
        )));
    }

    log::debug!(
        "Pitch factor {:.5} realized as {}/{} ({:+.2} cents off) over {:.1}s",
        factor,
        hop_synthesis,
        hop_analysis,
        1200.0 * (ratio / factor).log2(),
        samples.len() as f32 / sample_rate as f32
    );

    let vocoder = PhaseVocoder::new(settings.fft_size, hop_analysis, hop_synthesis);
    let stretched = vocoder.process(samples);
    let offset = (settings.fft_size / 2) as f64;
    let output = resample_cubic(&stretched, offset, vocoder.ratio(), samples.len());

    if output.iter().any(|s| !s.is_finite()) {
        return Err(Error::Shift("resynthesis produced non-finite samples".into()));
    }
    Ok(output)
}
