use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// FFT plans for the YIN difference function of one frame size.
///
/// The plans are immutable and shared across worker threads.
pub struct YinPlan {
    frame_length: usize,
    win_length: usize,
    fft_len: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl YinPlan {
    pub fn new(frame_length: usize) -> Self {
        let fft_len = frame_length.next_power_of_two();
        let mut planner = FftPlanner::new();
        Self {
            frame_length,
            win_length: frame_length / 2,
            fft_len,
            forward: planner.plan_fft_forward(fft_len),
            inverse: planner.plan_fft_inverse(fft_len),
        }
    }

    /// Largest lag the difference function can be evaluated at.
    pub fn max_lag(&self) -> usize {
        self.frame_length - self.win_length
    }

    /// YIN difference function d(τ) for τ in [0, max_tau].
    ///
    /// d(τ) = Σ_{j<W} (x_j − x_{j+τ})² with a fixed window W, expanded as
    /// Σ x_j² + Σ x_{j+τ}² − 2·r(τ) where r is an FFT cross-correlation
    /// between the first W samples and the whole frame.
    pub fn difference(&self, frame: &[f32], max_tau: usize) -> Vec<f32> {
        debug_assert_eq!(frame.len(), self.frame_length);
        let max_tau = max_tau.min(self.max_lag());
        let w = self.win_length;

        let zero = Complex { re: 0.0_f32, im: 0.0_f32 };
        let mut head = vec![zero; self.fft_len];
        let mut whole = vec![zero; self.fft_len];
        for (idx, &sample) in frame.iter().enumerate() {
            whole[idx].re = sample;
            if idx < w {
                head[idx].re = sample;
            }
        }

        self.forward.process(&mut head);
        self.forward.process(&mut whole);
        for (h, x) in head.iter_mut().zip(whole.iter()) {
            *h = h.conj() * x;
        }
        self.inverse.process(&mut head);

        let scale = 1.0 / self.fft_len as f32;
        let mut prefix_sq = vec![0.0_f32; frame.len() + 1];
        for (idx, &sample) in frame.iter().enumerate() {
            prefix_sq[idx + 1] = prefix_sq[idx] + sample * sample;
        }
        let head_energy = prefix_sq[w];

        (0..=max_tau)
            .map(|tau| {
                let tail_energy = prefix_sq[tau + w] - prefix_sq[tau];
                let cross = head[tau].re * scale;
                (head_energy + tail_energy - 2.0 * cross).max(0.0)
            })
            .collect()
    }
}

/// Cumulative mean normalized difference d'(τ) = d(τ)·τ / Σ_{j=1..τ} d(j), d'(0) = 1.
pub fn cumulative_mean_normalized_difference(diff: &[f32]) -> Vec<f32> {
    let mut cmnd = vec![1.0; diff.len()];
    let mut running_sum = 0.0;
    for tau in 1..diff.len() {
        running_sum += diff[tau];
        if running_sum > 0.0 {
            cmnd[tau] = diff[tau] * tau as f32 / running_sum;
        }
    }
    cmnd
}

/// Local minima of `cmnd` in [min_tau, max_tau].
///
/// The lower boundary counts when it is below its right neighbour; the upper
/// boundary never does.
pub fn troughs(cmnd: &[f32], min_tau: usize, max_tau: usize) -> Vec<usize> {
    let max_tau = max_tau.min(cmnd.len().saturating_sub(1));
    let mut minima = Vec::new();
    if min_tau >= max_tau {
        return minima;
    }
    if cmnd[min_tau] < cmnd[min_tau + 1] {
        minima.push(min_tau);
    }
    for tau in (min_tau + 1)..max_tau {
        if cmnd[tau] < cmnd[tau - 1] && cmnd[tau] <= cmnd[tau + 1] {
            minima.push(tau);
        }
    }
    minima
}

/// Parabolic refinement of a minimum at `tau`. Offsets larger than one lag are discarded.
pub fn parabolic_interpolation(cmnd: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= cmnd.len() {
        return tau as f32;
    }
    let y1 = cmnd[tau - 1];
    let y2 = cmnd[tau];
    let y3 = cmnd[tau + 1];
    let denom = y1 - 2.0 * y2 + y3;
    if denom.abs() < 1e-12 {
        return tau as f32;
    }
    let delta = 0.5 * (y1 - y3) / denom;
    if delta.abs() > 1.0 {
        tau as f32
    } else {
        tau as f32 + delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn difference_matches_direct_sum() {
        let frame = sine(300.0, 8000.0, 256);
        let plan = YinPlan::new(256);
        let diff = plan.difference(&frame, 100);
        for tau in [1usize, 7, 26, 80, 100] {
            let direct: f32 = (0..128).map(|j| (frame[j] - frame[j + tau]).powi(2)).sum();
            assert!(
                (diff[tau] - direct).abs() < 1e-2,
                "tau {}: fft {} vs direct {}",
                tau,
                diff[tau],
                direct
            );
        }
        assert!(diff[0].abs() < 1e-3);
    }

    #[test]
    fn lags_stop_at_half_the_frame() {
        let plan = YinPlan::new(2048);
        assert_eq!(plan.max_lag(), 1024);
        let diff = plan.difference(&sine(220.0, 22050.0, 2048), 5000);
        assert_eq!(diff.len(), 1025);
    }

    #[test]
    fn cmnd_constant_signal() {
        let frame = vec![1.0_f32; 64];
        let plan = YinPlan::new(64);
        let diff = plan.difference(&frame, 32);
        let cmnd = cumulative_mean_normalized_difference(&diff);
        assert!(cmnd.iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn sine_trough_sits_at_its_period() {
        // 441 Hz at 22050 Hz has a period of exactly 50 samples.
        let frame = sine(441.0, 22050.0, 2048);
        let plan = YinPlan::new(2048);
        let diff = plan.difference(&frame, 400);
        let cmnd = cumulative_mean_normalized_difference(&diff);
        let minima = troughs(&cmnd, 30, 400);
        assert_eq!(minima.first().copied(), Some(50));
        assert!(cmnd[50] < 0.05);
        let refined = parabolic_interpolation(&cmnd, 50);
        assert!((refined - 50.0).abs() < 0.1);
    }

    #[test]
    fn parabolic_interpolation_minimum() {
        let mut cmnd = vec![0.0_f32; 10];
        for (i, value) in cmnd.iter_mut().enumerate() {
            let x = i as f32 - 5.2;
            *value = x * x;
        }
        let refined = parabolic_interpolation(&cmnd, 5);
        assert!((refined - 5.2).abs() < 0.2);
    }

    #[test]
    fn troughs_respect_range() {
        let cmnd = vec![1.0, 0.5, 0.8, 0.2, 0.9, 0.1, 0.7];
        assert_eq!(troughs(&cmnd, 1, 6), vec![1, 3, 5]);
        assert_eq!(troughs(&cmnd, 2, 4), vec![3]);
        assert!(troughs(&cmnd, 4, 4).is_empty());
    }
}
