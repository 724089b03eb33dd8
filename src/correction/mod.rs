//! Target quantization, shift smoothing and aggregation.

pub mod aggregate;
pub mod scale;
pub mod shift;

use crate::error::{Error, Result};
use crate::pitch::PitchTrack;
use scale::Quantizer;

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionSettings {
    /// 0 = no correction, 1 = full, >1 over-corrects, <0 inverts
    pub strength: f32,
    pub scale: String,
    /// Median filter length in frames (odd)
    pub smoothing_window: usize,
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Self {
            strength: 1.0,
            scale: scale::DEFAULT_SCALE.to_string(),
            smoothing_window: 11,
        }
    }
}

impl CorrectionSettings {
    pub fn validate(&self) -> Result<()> {
        if self.smoothing_window == 0 || self.smoothing_window % 2 == 0 {
            return Err(Error::Config(format!(
                "smoothing_window must be odd and positive, got {}",
                self.smoothing_window
            )));
        }
        Ok(())
    }
}

/// Every per-frame series of the correction stages, aligned to the pitch track.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionPlan {
    pub midi: Vec<Option<f32>>,
    pub targets: Vec<Option<f32>>,
    pub raw_shifts: Vec<f32>,
    pub smoothed_shifts: Vec<f32>,
    /// Semitones to apply to the whole buffer; `None` when nothing was voiced
    pub applied_shift: Option<f32>,
}

impl CorrectionPlan {
    /// Bundles the per-frame series and aggregates the smoothed shifts over `voiced`.
    pub fn from_series(
        midi: Vec<Option<f32>>,
        targets: Vec<Option<f32>>,
        raw_shifts: Vec<f32>,
        smoothed_shifts: Vec<f32>,
        voiced: &[bool],
    ) -> Self {
        let applied_shift = aggregate::applied_shift(&smoothed_shifts, voiced);
        Self {
            midi,
            targets,
            raw_shifts,
            smoothed_shifts,
            applied_shift,
        }
    }
}

pub fn quantize(track: &PitchTrack, quantizer: &dyn Quantizer) -> (Vec<Option<f32>>, Vec<Option<f32>>) {
    let midi = track.midi();
    let targets = quantizer.quantize(&midi);
    (midi, targets)
}

pub fn smooth(
    midi: &[Option<f32>],
    targets: &[Option<f32>],
    settings: &CorrectionSettings,
) -> (Vec<f32>, Vec<f32>) {
    let raw = shift::raw_shifts(targets, midi, settings.strength);
    let smoothed = shift::median_filter(&raw, settings.smoothing_window);
    (raw, smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::midi_to_hz;
    use scale::Chromatic;

    fn track(f0: Vec<Option<f32>>) -> PitchTrack {
        let voiced = f0.iter().map(Option::is_some).collect();
        let voiced_prob = f0.iter().map(|f| if f.is_some() { 0.9 } else { 0.0 }).collect();
        PitchTrack {
            f0,
            voiced,
            voiced_prob,
            sample_rate: 22050,
            hop_length: 512,
            frame_length: 2048,
        }
    }

    fn plan(track: &PitchTrack, settings: &CorrectionSettings) -> CorrectionPlan {
        let (midi, targets) = quantize(track, &Chromatic);
        let (raw, smoothed) = smooth(&midi, &targets, settings);
        CorrectionPlan::from_series(midi, targets, raw, smoothed, &track.voiced)
    }

    #[test]
    fn even_window_is_rejected() {
        for smoothing_window in [0, 10] {
            let settings = CorrectionSettings {
                smoothing_window,
                ..Default::default()
            };
            assert!(matches!(settings.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn steady_detuned_note_corrects_by_its_detune() {
        let f0 = vec![Some(midi_to_hz(69.39)); 30];
        let plan = plan(&track(f0), &CorrectionSettings::default());
        assert!(plan.targets.iter().all(|t| *t == Some(69.0)));
        let applied = plan.applied_shift.unwrap();
        assert!((applied + 0.39).abs() < 1e-3, "applied {}", applied);
    }

    #[test]
    fn unvoiced_track_has_no_applied_shift() {
        let plan = plan(&track(vec![None; 20]), &CorrectionSettings::default());
        assert_eq!(plan.applied_shift, None);
        assert!(plan.targets.iter().all(Option::is_none));
        assert!(plan.smoothed_shifts.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn zero_strength_applies_zero() {
        let settings = CorrectionSettings {
            strength: 0.0,
            ..Default::default()
        };
        let f0 = vec![Some(450.0); 25];
        let plan = plan(&track(f0), &settings);
        assert!(plan.raw_shifts.iter().all(|&s| s == 0.0));
        assert_eq!(plan.applied_shift, Some(0.0));
    }

    #[test]
    fn series_stay_aligned() {
        let mut f0 = vec![None; 5];
        f0.extend(vec![Some(300.0); 10]);
        let n = f0.len();
        let plan = plan(&track(f0), &CorrectionSettings::default());
        assert_eq!(plan.midi.len(), n);
        assert_eq!(plan.targets.len(), n);
        assert_eq!(plan.raw_shifts.len(), n);
        assert_eq!(plan.smoothed_shifts.len(), n);
    }
}
