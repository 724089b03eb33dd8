//! One correction run: estimate, quantize, smooth, aggregate, shift.

use std::fmt;

use crate::audio::decode::AudioData;
use crate::correction::{self, scale, CorrectionPlan, CorrectionSettings};
use crate::error::{Error, Result};
use crate::pitch::{self, PitchSettings, PitchTrack};
use crate::shift::{self, ShifterSettings};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub pitch: PitchSettings,
    pub correction: CorrectionSettings,
    pub shifter: ShifterSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.pitch.validate()?;
        self.correction.validate()?;
        self.shifter.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Estimating,
    Quantizing,
    Smoothing,
    Aggregating,
    Shifting,
}

impl Stage {
    pub const COUNT: usize = 5;
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Estimating => "estimating pitch",
            Stage::Quantizing => "quantizing targets",
            Stage::Smoothing => "smoothing shifts",
            Stage::Aggregating => "aggregating shift",
            Stage::Shifting => "shifting pitch",
        };
        f.write_str(name)
    }
}

/// Corrected audio plus everything computed on the way.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub audio: AudioData,
    pub track: PitchTrack,
    pub plan: CorrectionPlan,
}

impl Outcome {
    /// `false` when the input had no voiced frames and was passed through.
    pub fn corrected(&self) -> bool {
        self.plan.applied_shift.is_some()
    }
}

/// Corrects `audio` toward the nearest allowed pitch.
///
/// `on_stage` is called as each stage starts. Input without voiced frames is
/// returned unchanged.
pub fn run<F>(audio: &AudioData, settings: &Settings, mut on_stage: F) -> Result<Outcome>
where
    F: FnMut(Stage),
{
    settings.validate()?;
    if audio.samples.is_empty() {
        return Err(Error::EmptyInput);
    }

    on_stage(Stage::Estimating);
    let track = pitch::estimate(&audio.samples, audio.sample_rate, &settings.pitch)?;
    log::info!(
        "Tracked {} frames, {} voiced",
        track.len(),
        track.voiced_count()
    );

    on_stage(Stage::Quantizing);
    let quantizer = scale::from_name(&settings.correction.scale);
    let (midi, targets) = correction::quantize(&track, quantizer.as_ref());

    on_stage(Stage::Smoothing);
    let (raw_shifts, smoothed_shifts) = correction::smooth(&midi, &targets, &settings.correction);

    on_stage(Stage::Aggregating);
    let plan = CorrectionPlan::from_series(midi, targets, raw_shifts, smoothed_shifts, &track.voiced);

    on_stage(Stage::Shifting);
    let samples = match plan.applied_shift {
        Some(semitones) => {
            log::info!("Applied shift: {:.2} semitones", semitones);
            shift::pitch_shift(&audio.samples, audio.sample_rate, semitones, &settings.shifter)?
        }
        None => {
            log::info!("No voiced frames detected, passing audio through unchanged");
            audio.samples.clone()
        }
    };

    Ok(Outcome {
        audio: AudioData {
            samples,
            sample_rate: audio.sample_rate,
        },
        track,
        plan,
    })
}
