use super::yin::{cumulative_mean_normalized_difference, parabolic_interpolation, troughs, YinPlan};

const NUM_THRESHOLDS: usize = 100;
/// Beta(2, 18) prior over YIN thresholds, mean 0.1.
const BETA_ALPHA: f32 = 2.0;
const BETA_BETA: f32 = 18.0;
const BOLTZMANN_PARAMETER: f32 = 2.0;
/// Prior mass handed to the global minimum when no trough falls below a threshold.
const NO_TROUGH_PROB: f32 = 0.01;
/// Frames with less energy than this are treated as digital silence.
const SILENCE_ENERGY: f32 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub frequency_hz: f32,
    pub probability: f32,
}

/// Per-frame candidate extraction settings, shared read-only by all frames.
#[derive(Debug, Clone)]
pub struct CandidateConfig {
    pub sample_rate: u32,
    pub min_tau: usize,
    pub max_tau: usize,
    thresholds: Vec<f32>,
    threshold_weights: Vec<f32>,
}

impl CandidateConfig {
    pub fn new(sample_rate: u32, min_tau: usize, max_tau: usize) -> Self {
        let thresholds: Vec<f32> = (1..=NUM_THRESHOLDS)
            .map(|i| i as f32 / NUM_THRESHOLDS as f32)
            .collect();
        let threshold_weights = beta_prior_distribution(NUM_THRESHOLDS, BETA_ALPHA, BETA_BETA);
        Self {
            sample_rate,
            min_tau,
            max_tau,
            thresholds,
            threshold_weights,
        }
    }

    /// Candidate frequencies of one frame with their probabilities.
    ///
    /// Every threshold votes for the troughs below it, the earliest lag getting
    /// the most weight. A threshold no trough gets under hands a fraction of its
    /// weight to the deepest trough instead.
    pub fn frame_candidates(&self, frame: &[f32], plan: &YinPlan) -> Vec<Candidate> {
        let energy: f32 = frame.iter().map(|s| s * s).sum();
        if energy < SILENCE_ENERGY {
            return Vec::new();
        }

        let diff = plan.difference(frame, self.max_tau);
        let cmnd = cumulative_mean_normalized_difference(&diff);
        let minima = troughs(&cmnd, self.min_tau, self.max_tau);
        if minima.is_empty() {
            return Vec::new();
        }

        let mut probs = vec![0.0_f32; minima.len()];
        let mut below = Vec::with_capacity(minima.len());
        for (threshold, weight) in self.thresholds.iter().zip(self.threshold_weights.iter()) {
            below.clear();
            below.extend((0..minima.len()).filter(|&i| cmnd[minima[i]] < *threshold));
            let n = below.len();
            for (rank, &i) in below.iter().enumerate() {
                probs[i] += boltzmann_pmf(rank, n, BOLTZMANN_PARAMETER) * weight;
            }
        }

        let global_min = (0..minima.len())
            .min_by(|&a, &b| cmnd[minima[a]].total_cmp(&cmnd[minima[b]]))
            .unwrap_or(0);
        let deepest = cmnd[minima[global_min]];
        let unreached: f32 = self
            .thresholds
            .iter()
            .zip(self.threshold_weights.iter())
            .filter(|(threshold, _)| deepest >= **threshold)
            .map(|(_, weight)| weight)
            .sum();
        probs[global_min] += NO_TROUGH_PROB * unreached;

        minima
            .iter()
            .zip(probs)
            .filter(|(_, prob)| *prob > 0.0)
            .map(|(&tau, probability)| {
                let period = parabolic_interpolation(&cmnd, tau).max(1.0);
                Candidate {
                    frequency_hz: self.sample_rate as f32 / period,
                    probability,
                }
            })
            .collect()
    }
}

/// Discrete Beta(alpha, beta) weights over thresholds, sampled at bin midpoints.
fn beta_prior_distribution(count: usize, alpha: f32, beta: f32) -> Vec<f32> {
    let mut weights: Vec<f32> = (0..count)
        .map(|i| {
            let s = (i as f32 + 0.5) / count as f32;
            s.powf(alpha - 1.0) * (1.0 - s).powf(beta - 1.0)
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    }
    weights
}

/// Truncated geometric (Boltzmann) distribution over `n` ranks.
fn boltzmann_pmf(rank: usize, n: usize, lambda: f32) -> f32 {
    if n == 0 || rank >= n {
        return 0.0;
    }
    let norm = (1.0 - (-lambda).exp()) / (1.0 - (-lambda * n as f32).exp());
    norm * (-lambda * rank as f32).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn beta_prior_is_normalized_and_front_loaded() {
        let weights = beta_prior_distribution(100, 2.0, 18.0);
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        let mean: f32 = weights
            .iter()
            .enumerate()
            .map(|(i, w)| (i as f32 + 0.5) / 100.0 * w)
            .sum();
        assert!((mean - 0.1).abs() < 0.01);
    }

    #[test]
    fn boltzmann_sums_to_one_and_decays() {
        let total: f32 = (0..5).map(|k| boltzmann_pmf(k, 5, 2.0)).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(boltzmann_pmf(0, 5, 2.0) > boltzmann_pmf(1, 5, 2.0));
        assert_eq!(boltzmann_pmf(5, 5, 2.0), 0.0);
    }

    #[test]
    fn sine_yields_a_confident_candidate_at_its_frequency() {
        let sample_rate = 22050;
        let frame = sine(440.0, sample_rate, 2048);
        let plan = YinPlan::new(2048);
        let cfg = CandidateConfig::new(sample_rate, 10, 337);
        let candidates = cfg.frame_candidates(&frame, &plan);

        let best = candidates
            .iter()
            .max_by(|a, b| a.probability.total_cmp(&b.probability))
            .unwrap();
        assert!((best.frequency_hz - 440.0).abs() < 2.0, "{:?}", best);
        let total: f32 = candidates.iter().map(|c| c.probability).sum();
        assert!(total > 0.9 && total <= 1.0 + 1e-4, "total {}", total);
    }

    #[test]
    fn silence_yields_no_candidates() {
        let plan = YinPlan::new(1024);
        let cfg = CandidateConfig::new(22050, 10, 337);
        assert!(cfg.frame_candidates(&vec![0.0; 1024], &plan).is_empty());
    }
}
