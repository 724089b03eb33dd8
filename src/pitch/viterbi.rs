use super::hmm::{Observation, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HmmState {
    pub bin: usize,
    pub voiced: bool,
}

/// Frame-by-frame Viterbi decoder over (pitch bin × voicing) states.
pub struct ViterbiTracker {
    num_bins: usize,
    transition: Transition,
    backpointers: Vec<Vec<u32>>,
    prev_scores: Vec<f32>,
    frames: usize,
}

impl ViterbiTracker {
    pub fn new(num_bins: usize, transition: Transition) -> Self {
        Self {
            num_bins,
            transition,
            backpointers: Vec::new(),
            prev_scores: vec![f32::NEG_INFINITY; num_bins * 2],
            frames: 0,
        }
    }

    pub fn push(&mut self, obs: &Observation) {
        let n = self.num_bins;
        let unvoiced_log = obs.log_unvoiced();

        if self.frames == 0 {
            // Decoding starts from a uniform distribution over unvoiced states.
            let log_init = (1.0 / n as f32).ln();
            for bin in 0..n {
                self.prev_scores[state_index(n, bin, true)] = f32::NEG_INFINITY;
                self.prev_scores[state_index(n, bin, false)] = log_init + unvoiced_log;
            }
            self.backpointers.push(Vec::new());
            self.frames += 1;
            return;
        }

        // Best way into each voicing class from each source bin, before the pitch move.
        let mut carry_score = [vec![f32::NEG_INFINITY; n], vec![f32::NEG_INFINITY; n]];
        let mut carry_state = [vec![0u32; n], vec![0u32; n]];
        for bin in 0..n {
            for (slot, &next_voiced) in [false, true].iter().enumerate() {
                let same = state_index(n, bin, next_voiced);
                let other = state_index(n, bin, !next_voiced);
                let stay = self.prev_scores[same] + self.transition.log_stay;
                let switch = self.prev_scores[other] + self.transition.log_switch;
                if stay >= switch {
                    carry_score[slot][bin] = stay;
                    carry_state[slot][bin] = same as u32;
                } else {
                    carry_score[slot][bin] = switch;
                    carry_state[slot][bin] = other as u32;
                }
            }
        }

        let half = self.transition.half_width;
        let mut curr = vec![f32::NEG_INFINITY; n * 2];
        let mut back = vec![0u32; n * 2];
        for next_bin in 0..n {
            let lo = next_bin.saturating_sub(half);
            let hi = (next_bin + half).min(n - 1);
            for (slot, &next_voiced) in [false, true].iter().enumerate() {
                let mut best_score = f32::NEG_INFINITY;
                let mut best_state = carry_state[slot][next_bin];
                for prev_bin in lo..=hi {
                    let delta = next_bin as i64 - prev_bin as i64;
                    let Some(pitch_log) = self.transition.log_pitch(delta) else {
                        continue;
                    };
                    let score = carry_score[slot][prev_bin] + pitch_log;
                    if score > best_score {
                        best_score = score;
                        best_state = carry_state[slot][prev_bin];
                    }
                }
                let obs_log = if next_voiced {
                    obs.log_voiced(next_bin)
                } else {
                    unvoiced_log
                };
                let idx = state_index(n, next_bin, next_voiced);
                curr[idx] = best_score + obs_log;
                back[idx] = best_state;
            }
        }

        self.prev_scores = curr;
        self.backpointers.push(back);
        self.frames += 1;
    }

    /// Most likely state sequence for every frame pushed so far.
    pub fn best_path(&self) -> Vec<HmmState> {
        if self.frames == 0 {
            return Vec::new();
        }
        let best_final = self
            .prev_scores
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (idx, &score)| {
                if score > best.1 {
                    (idx, score)
                } else {
                    best
                }
            })
            .0;

        let mut path = vec![best_final; self.frames];
        for t in (1..self.frames).rev() {
            path[t - 1] = self.backpointers[t][path[t]] as usize;
        }

        path.into_iter()
            .map(|idx| state_from_index(self.num_bins, idx))
            .collect()
    }
}

fn state_index(num_bins: usize, bin: usize, voiced: bool) -> usize {
    if voiced {
        bin
    } else {
        num_bins + bin
    }
}

fn state_from_index(num_bins: usize, idx: usize) -> HmmState {
    if idx < num_bins {
        HmmState { bin: idx, voiced: true }
    } else {
        HmmState {
            bin: idx - num_bins,
            voiced: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(num_bins: usize, peaks: &[(usize, f32)]) -> Observation {
        let mut p_star = vec![0.0; num_bins];
        for &(bin, prob) in peaks {
            p_star[bin] = prob;
        }
        let voiced_prob = p_star.iter().sum::<f32>().min(1.0);
        Observation {
            p_star,
            voiced_prob,
        }
    }

    #[test]
    fn empty_tracker_has_no_path() {
        let tracker = ViterbiTracker::new(10, Transition::with_half_width(2));
        assert!(tracker.best_path().is_empty());
    }

    #[test]
    fn follows_a_steady_voiced_pitch() {
        let mut tracker = ViterbiTracker::new(20, Transition::with_half_width(3));
        for _ in 0..8 {
            tracker.push(&observation(20, &[(7, 0.9)]));
        }
        let path = tracker.best_path();
        assert_eq!(path.len(), 8);
        assert!(path[1..].iter().all(|s| s.voiced && s.bin == 7), "{:?}", path);
    }

    #[test]
    fn silence_decodes_as_unvoiced() {
        let mut tracker = ViterbiTracker::new(20, Transition::with_half_width(3));
        for _ in 0..6 {
            tracker.push(&observation(20, &[]));
        }
        assert!(tracker.best_path().iter().all(|s| !s.voiced));
    }

    #[test]
    fn isolated_octave_jump_is_smoothed_over() {
        let mut tracker = ViterbiTracker::new(40, Transition::with_half_width(3));
        for t in 0..9 {
            if t == 4 {
                // Mostly the true pitch, with an out-of-reach rival peak.
                tracker.push(&observation(40, &[(10, 0.3), (30, 0.6)]));
            } else {
                tracker.push(&observation(40, &[(10, 0.9)]));
            }
        }
        let path = tracker.best_path();
        assert!(path[4].voiced);
        assert_eq!(path[4].bin, 10);
    }
}
