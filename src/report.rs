//! JSON diagnostics for a correction run.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pipeline::{Outcome, Settings};

#[derive(Debug, Serialize)]
pub struct CorrectionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sample_rate: u32,
    pub hop_length: usize,
    pub frame_length: usize,
    pub strength: f32,
    pub scale: String,
    /// `null` when no frame was voiced and the audio passed through
    pub applied_shift: Option<f32>,
    pub voiced_frames: usize,
    pub frames: Vec<FrameReport>,
}

#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub time: f32,
    pub f0_hz: Option<f32>,
    pub voiced: bool,
    pub voiced_prob: f32,
    pub midi: Option<f32>,
    pub target: Option<f32>,
    pub raw_shift: f32,
    pub smoothed_shift: f32,
}

impl CorrectionReport {
    pub fn new(input: &Path, output: &Path, settings: &Settings, outcome: &Outcome) -> Self {
        let track = &outcome.track;
        let plan = &outcome.plan;
        let frames = track
            .times()
            .into_iter()
            .enumerate()
            .map(|(k, time)| FrameReport {
                time,
                f0_hz: track.f0[k],
                voiced: track.voiced[k],
                voiced_prob: track.voiced_prob[k],
                midi: plan.midi[k],
                target: plan.targets[k],
                raw_shift: plan.raw_shifts[k],
                smoothed_shift: plan.smoothed_shifts[k],
            })
            .collect();

        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            sample_rate: track.sample_rate,
            hop_length: track.hop_length,
            frame_length: track.frame_length,
            strength: settings.correction.strength,
            scale: settings.correction.scale.clone(),
            applied_shift: plan.applied_shift,
            voiced_frames: track.voiced_count(),
            frames,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let output_err = |reason: String| Error::Output {
            path: path.to_path_buf(),
            reason,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| output_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| output_err(e.to_string()))?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}
