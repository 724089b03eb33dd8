//! Probabilistic YIN pitch tracking.
//!
//! Each frame is reduced to a set of candidate frequencies with probabilities
//! (threshold distribution over YIN troughs), then a Viterbi pass over pitch
//! bins × voicing picks one continuous track and decides voicing per frame.

mod candidates;
mod hmm;
mod viterbi;
mod yin;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::note::{hz_to_midi, midi_to_hz};
use candidates::{Candidate, CandidateConfig};
use hmm::{Observation, PitchBins, Transition};
use viterbi::ViterbiTracker;
use yin::YinPlan;

#[derive(Debug, Clone, PartialEq)]
pub struct PitchSettings {
    /// Lowest trackable frequency (Hz)
    pub fmin: f32,
    /// Highest trackable frequency (Hz)
    pub fmax: f32,
    /// Analysis window in samples
    pub frame_length: usize,
    /// Samples between consecutive frames
    pub hop_length: usize,
}

impl Default for PitchSettings {
    fn default() -> Self {
        Self {
            fmin: midi_to_hz(36.0), // C2
            fmax: midi_to_hz(96.0), // C7
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

impl PitchSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.fmin.is_finite() && self.fmin > 0.0) {
            return Err(Error::Config(format!("fmin must be positive, got {}", self.fmin)));
        }
        if !(self.fmax.is_finite() && self.fmax > self.fmin) {
            return Err(Error::Config(format!(
                "fmax ({}) must be above fmin ({})",
                self.fmax, self.fmin
            )));
        }
        if self.frame_length < 4 || self.hop_length == 0 {
            return Err(Error::Config(format!(
                "frame_length ({}) and hop_length ({}) are too small",
                self.frame_length, self.hop_length
            )));
        }
        if self.hop_length > self.frame_length {
            return Err(Error::Config(format!(
                "hop_length ({}) exceeds frame_length ({})",
                self.hop_length, self.frame_length
            )));
        }
        Ok(())
    }

    /// Lag search range in samples for `sample_rate`.
    fn lag_range(&self, sample_rate: u32, plan: &YinPlan) -> Result<(usize, usize)> {
        let sr = sample_rate as f32;
        let min_tau = ((sr / self.fmax).floor() as usize).max(1);
        let wanted_max = (sr / self.fmin).ceil() as usize;
        let max_tau = wanted_max.min(plan.max_lag().saturating_sub(1));
        if max_tau < wanted_max {
            log::warn!(
                "frame_length {} cannot reach fmin {:.1}Hz at {}Hz; lowest trackable pitch is {:.1}Hz",
                self.frame_length,
                self.fmin,
                sample_rate,
                sr / max_tau.max(1) as f32
            );
        }
        if max_tau <= min_tau {
            return Err(Error::Config(format!(
                "empty lag range [{}, {}] for fmin {} / fmax {} at {}Hz",
                min_tau, max_tau, self.fmin, self.fmax, sample_rate
            )));
        }
        Ok((min_tau, max_tau))
    }
}

/// Per-frame pitch estimates, all series aligned to the same frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchTrack {
    /// Estimated f0 in Hz, `None` for unvoiced frames
    pub f0: Vec<Option<f32>>,
    pub voiced: Vec<bool>,
    /// Probability mass the frame gave to pitched candidates
    pub voiced_prob: Vec<f32>,
    pub sample_rate: u32,
    pub hop_length: usize,
    pub frame_length: usize,
}

impl PitchTrack {
    pub fn len(&self) -> usize {
        self.f0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f0.is_empty()
    }

    pub fn voiced_count(&self) -> usize {
        self.voiced.iter().filter(|&&v| v).count()
    }

    /// Frame centre times in seconds.
    pub fn times(&self) -> Vec<f32> {
        (0..self.len())
            .map(|k| (k * self.hop_length) as f32 / self.sample_rate as f32)
            .collect()
    }

    /// Fractional MIDI pitch per frame.
    pub fn midi(&self) -> Vec<Option<f32>> {
        self.f0.iter().map(|f| f.and_then(hz_to_midi)).collect()
    }
}

/// Number of centred frames covering `len` samples.
pub fn frame_count(len: usize, hop_length: usize) -> usize {
    1 + len / hop_length
}

/// Tracks f0 and voicing over a mono buffer.
pub fn estimate(samples: &[f32], sample_rate: u32, settings: &PitchSettings) -> Result<PitchTrack> {
    settings.validate()?;
    if sample_rate == 0 {
        return Err(Error::Config("sample rate must be positive".into()));
    }

    let frame_length = settings.frame_length;
    let hop = settings.hop_length;
    let plan = YinPlan::new(frame_length);
    let (min_tau, max_tau) = settings.lag_range(sample_rate, &plan)?;
    let config = CandidateConfig::new(sample_rate, min_tau, max_tau);

    let pad = frame_length / 2;
    let mut padded = vec![0.0_f32; samples.len() + frame_length];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let num_frames = frame_count(samples.len(), hop);
    log::debug!(
        "Pitch tracking {} frames (frame={}, hop={}, lag {}..{})",
        num_frames,
        frame_length,
        hop,
        min_tau,
        max_tau
    );

    let frame_candidates: Vec<Vec<Candidate>> = (0..num_frames)
        .into_par_iter()
        .map(|k| {
            let start = k * hop;
            config.frame_candidates(&padded[start..start + frame_length], &plan)
        })
        .collect();

    let bins = PitchBins::new(settings.fmin, settings.fmax);
    let mut tracker = ViterbiTracker::new(bins.len(), Transition::new(hop, sample_rate));
    let mut voiced_prob = Vec::with_capacity(num_frames);
    for candidates in &frame_candidates {
        let obs = Observation::from_candidates(candidates, &bins);
        voiced_prob.push(obs.voiced_prob);
        tracker.push(&obs);
    }

    let f0: Vec<Option<f32>> = tracker
        .best_path()
        .into_iter()
        .zip(frame_candidates.iter())
        .map(|(state, candidates)| {
            state
                .voiced
                .then(|| refine_frequency(state.bin, candidates, &bins))
        })
        .collect();
    let voiced: Vec<bool> = f0.iter().map(Option::is_some).collect();

    let track = PitchTrack {
        f0,
        voiced,
        voiced_prob,
        sample_rate,
        hop_length: hop,
        frame_length,
    };
    log::debug!("Voiced frames: {}/{}", track.voiced_count(), track.len());
    Ok(track)
}

/// Sub-bin frequency for a decoded bin: the strongest candidate that landed in it.
fn refine_frequency(bin: usize, candidates: &[Candidate], bins: &PitchBins) -> f32 {
    candidates
        .iter()
        .filter(|c| bins.bin_for(c.frequency_hz) == bin)
        .max_by(|a, b| a.probability.total_cmp(&b.probability))
        .map_or_else(|| bins.freq(bin), |c| c.frequency_hz)
}
