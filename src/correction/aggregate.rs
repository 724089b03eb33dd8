/// Median of `smoothed` over voiced frames, or `None` when nothing is voiced.
///
/// Even counts take the mean of the two middle values.
pub fn applied_shift(smoothed: &[f32], voiced: &[bool]) -> Option<f32> {
    let mut values: Vec<f32> = smoothed
        .iter()
        .zip(voiced.iter())
        .filter(|&(_, &v)| v)
        .map(|(&s, _)| s)
        .collect();
    median(&mut values)
}

fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_voiced_frames_means_no_shift() {
        assert_eq!(applied_shift(&[0.4, -0.2], &[false, false]), None);
        assert_eq!(applied_shift(&[], &[]), None);
    }

    #[test]
    fn only_voiced_frames_count() {
        let smoothed = [9.0, -0.3, -0.4, 9.0, -0.5];
        let voiced = [false, true, true, false, true];
        assert_eq!(applied_shift(&smoothed, &voiced), Some(-0.4));
    }

    #[test]
    fn even_count_averages_middle_pair() {
        assert_eq!(applied_shift(&[1.0, 2.0, 3.0, 10.0], &[true; 4]), Some(2.5));
    }

    #[test]
    fn order_does_not_matter() {
        let smoothed = [0.1, -0.7, 0.3, 12.0, -0.2, 0.0, 0.25];
        let voiced = [true; 7];
        let forward = applied_shift(&smoothed, &voiced);

        let mut reversed = smoothed;
        reversed.reverse();
        assert_eq!(applied_shift(&reversed, &voiced), forward);

        let rotated: Vec<f32> = smoothed.iter().cycle().skip(3).take(7).copied().collect();
        assert_eq!(applied_shift(&rotated, &voiced), forward);
        assert_eq!(forward, Some(0.1));
    }

    #[test]
    fn robust_to_octave_outliers() {
        let smoothed = [-0.4, -0.4, -0.4, 12.0, -12.0, -0.4];
        assert_eq!(applied_shift(&smoothed, &[true; 6]), Some(-0.4));
    }
}
