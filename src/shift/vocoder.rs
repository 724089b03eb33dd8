//! Phase vocoder time stretching with identity phase locking.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

const TWO_PI: f32 = 2.0 * PI;

/// Stretches a mono signal in time by `hop_synthesis / hop_analysis` without changing pitch.
pub struct PhaseVocoder {
    fft_size: usize,
    hop_analysis: usize,
    hop_synthesis: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// Expected phase advance per bin over one analysis hop.
    expected_phase_advance: Vec<f32>,
}

impl PhaseVocoder {
    pub fn new(fft_size: usize, hop_analysis: usize, hop_synthesis: usize) -> Self {
        let num_bins = fft_size / 2 + 1;
        let expected_phase_advance = (0..num_bins)
            .map(|bin| TWO_PI * bin as f32 * hop_analysis as f32 / fft_size as f32)
            .collect();
        let mut planner = FftPlanner::new();
        Self {
            fft_size,
            hop_analysis,
            hop_synthesis,
            window: hann_window(fft_size),
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
            expected_phase_advance,
        }
    }

    /// Realized time-stretch ratio.
    pub fn ratio(&self) -> f64 {
        self.hop_synthesis as f64 / self.hop_analysis as f64
    }

    /// Stretches `input`.
    ///
    /// The input is padded by half a frame in front, so original sample `t`
    /// lands at output position `fft_size / 2 + t · ratio`.
    pub fn process(&self, input: &[f32]) -> Vec<f32> {
        let n = self.fft_size;
        let num_bins = n / 2 + 1;
        let pad = n / 2;

        let mut padded = vec![0.0_f32; pad + input.len() + n];
        padded[pad..pad + input.len()].copy_from_slice(input);

        let num_frames = (padded.len() - n) / self.hop_analysis + 1;
        let output_len = (num_frames - 1) * self.hop_synthesis + n;
        let mut output = vec![0.0_f32; output_len];
        let mut window_sum = vec![0.0_f32; output_len];

        let mut buffer = vec![Complex::new(0.0_f32, 0.0); n];
        let mut magnitudes = vec![0.0_f32; num_bins];
        let mut analysis_phase = vec![0.0_f32; num_bins];
        let mut prev_phase = vec![0.0_f32; num_bins];
        let mut synthesis_phase = vec![0.0_f32; num_bins];
        let mut peaks = Vec::with_capacity(num_bins / 4);

        let hop_ratio = self.hop_synthesis as f32 / self.hop_analysis as f32;
        let norm = 1.0 / n as f32;

        for frame_idx in 0..num_frames {
            let analysis_pos = frame_idx * self.hop_analysis;
            let synthesis_pos = frame_idx * self.hop_synthesis;

            let frame = &padded[analysis_pos..analysis_pos + n];
            for (slot, (&sample, &win)) in buffer.iter_mut().zip(frame.iter().zip(self.window.iter())) {
                *slot = Complex::new(sample * win, 0.0);
            }
            self.forward.process(&mut buffer);

            for bin in 0..num_bins {
                magnitudes[bin] = buffer[bin].norm();
                analysis_phase[bin] = buffer[bin].arg();
            }

            if frame_idx == 0 {
                synthesis_phase.copy_from_slice(&analysis_phase);
            } else {
                for bin in 0..num_bins {
                    let expected = self.expected_phase_advance[bin];
                    let deviation = wrap_phase(analysis_phase[bin] - prev_phase[bin] - expected);
                    // Kept wrapped so f32 precision does not decay over long inputs.
                    synthesis_phase[bin] =
                        wrap_phase(synthesis_phase[bin] + (expected + deviation) * hop_ratio);
                }
                identity_phase_lock(&magnitudes, &analysis_phase, &mut synthesis_phase, &mut peaks);
            }
            prev_phase.copy_from_slice(&analysis_phase);

            for bin in 0..num_bins {
                buffer[bin] = Complex::from_polar(magnitudes[bin], synthesis_phase[bin]);
            }
            for bin in 1..num_bins - 1 {
                buffer[n - bin] = buffer[bin].conj();
            }
            self.inverse.process(&mut buffer);

            for (i, (out, ws)) in output[synthesis_pos..synthesis_pos + n]
                .iter_mut()
                .zip(window_sum[synthesis_pos..synthesis_pos + n].iter_mut())
                .enumerate()
            {
                *out += buffer[i].re * norm * self.window[i];
                *ws += self.window[i] * self.window[i];
            }
        }

        normalize_output(&mut output, &window_sum);
        output
    }
}

/// Divides out the summed synthesis window, clamped so sparse-overlap
/// regions are not amplified.
fn normalize_output(output: &mut [f32], window_sum: &[f32]) {
    let max_window_sum = window_sum.iter().cloned().fold(0.0f32, f32::max);
    let min_window_sum = (max_window_sum * 0.1).max(1e-6);
    for (sample, &ws) in output.iter_mut().zip(window_sum.iter()) {
        *sample /= ws.max(min_window_sum);
    }
}

/// Locks every non-peak bin to its nearest spectral peak, keeping the
/// analysis phase offset between the two (Laroche & Dolson).
fn identity_phase_lock(
    magnitudes: &[f32],
    analysis_phase: &[f32],
    synthesis_phase: &mut [f32],
    peaks: &mut Vec<usize>,
) {
    let num_bins = magnitudes.len();
    if num_bins < 3 {
        return;
    }

    peaks.clear();
    for bin in 1..num_bins - 1 {
        if magnitudes[bin] > magnitudes[bin - 1] && magnitudes[bin] > magnitudes[bin + 1] {
            peaks.push(bin);
        }
    }
    if peaks.is_empty() {
        return;
    }

    let mut peak_idx = 0;
    for bin in 0..num_bins {
        while peak_idx + 1 < peaks.len()
            && peaks[peak_idx + 1].abs_diff(bin) < peaks[peak_idx].abs_diff(bin)
        {
            peak_idx += 1;
        }
        let nearest = peaks[peak_idx];
        if bin != nearest {
            synthesis_phase[bin] =
                wrap_phase(synthesis_phase[nearest] + (analysis_phase[bin] - analysis_phase[nearest]));
        }
    }
}

/// Wraps a phase value to [-PI, PI).
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let p = phase + PI;
    p - (p / TWO_PI).floor() * TWO_PI - PI
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (TWO_PI * i as f32 / size as f32).cos()))
        .collect()
}
