use super::candidates::Candidate;

pub const BINS_PER_SEMITONE: usize = 10;
/// Fastest pitch glide the tracker follows, in octaves per second.
const MAX_TRANSITION_RATE: f32 = 35.92;
const SWITCH_PROB: f32 = 0.01;

/// Log-spaced pitch grid from fmin to fmax at 10-cent resolution.
#[derive(Debug, Clone)]
pub struct PitchBins {
    fmin: f32,
    freqs: Vec<f32>,
}

impl PitchBins {
    pub fn new(fmin: f32, fmax: f32) -> Self {
        let steps_per_octave = (12 * BINS_PER_SEMITONE) as f32;
        // Tolerance keeps whole-octave ranges from losing their top bin to rounding.
        let count = (steps_per_octave * (fmax / fmin).log2() + 1e-3).floor() as usize + 1;
        let freqs = (0..count)
            .map(|i| fmin * 2.0_f32.powf(i as f32 / steps_per_octave))
            .collect();
        Self { fmin, freqs }
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn freq(&self, bin: usize) -> f32 {
        self.freqs[bin]
    }

    /// Nearest bin for a frequency, clamped to the grid.
    pub fn bin_for(&self, freq_hz: f32) -> usize {
        let steps_per_octave = (12 * BINS_PER_SEMITONE) as f32;
        let position = (steps_per_octave * (freq_hz / self.fmin).log2()).round();
        if position.is_nan() || position <= 0.0 {
            0
        } else {
            (position as usize).min(self.freqs.len() - 1)
        }
    }
}

/// Per-frame emission model: candidate mass per pitch bin plus the voicing probability.
#[derive(Debug, Clone)]
pub struct Observation {
    pub p_star: Vec<f32>,
    pub voiced_prob: f32,
}

impl Observation {
    pub fn from_candidates(candidates: &[Candidate], bins: &PitchBins) -> Self {
        let mut p_star = vec![0.0_f32; bins.len()];
        for candidate in candidates {
            p_star[bins.bin_for(candidate.frequency_hz)] += candidate.probability;
        }
        let voiced_prob = p_star.iter().sum::<f32>().clamp(0.0, 1.0);
        Self {
            p_star,
            voiced_prob,
        }
    }

    pub fn log_voiced(&self, bin: usize) -> f32 {
        safe_log(self.p_star[bin])
    }

    /// Unvoiced mass is spread evenly across the unvoiced states.
    pub fn log_unvoiced(&self) -> f32 {
        safe_log((1.0 - self.voiced_prob) / self.p_star.len() as f32)
    }
}

/// Triangular pitch transition combined with a sticky voicing transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub half_width: usize,
    log_pitch: Vec<f32>,
    pub log_stay: f32,
    pub log_switch: f32,
}

impl Transition {
    pub fn new(hop_length: usize, sample_rate: u32) -> Self {
        let max_semitones_per_frame =
            (MAX_TRANSITION_RATE * 12.0 * hop_length as f32 / sample_rate as f32).round() as usize;
        let half_width = max_semitones_per_frame * BINS_PER_SEMITONE / 2;
        Self::with_half_width(half_width)
    }

    pub fn with_half_width(half_width: usize) -> Self {
        let max_delta = half_width as i64;
        let weights: Vec<f32> = (-max_delta..=max_delta)
            .map(|delta| (max_delta + 1 - delta.abs()) as f32)
            .collect();
        let sum: f32 = weights.iter().sum();
        let log_pitch = weights.iter().map(|w| (w / sum).ln()).collect();
        Self {
            half_width,
            log_pitch,
            log_stay: (1.0 - SWITCH_PROB).ln(),
            log_switch: SWITCH_PROB.ln(),
        }
    }

    /// Log probability of moving `delta` bins, `None` outside the window.
    pub fn log_pitch(&self, delta: i64) -> Option<f32> {
        let idx = delta + self.half_width as i64;
        if idx < 0 {
            return None;
        }
        self.log_pitch.get(idx as usize).copied()
    }
}

pub fn safe_log(prob: f32) -> f32 {
    const FLOOR: f32 = 1e-12;
    prob.max(FLOOR).ln()
}
