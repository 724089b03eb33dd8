/// Per-frame correction `(target − estimate) × strength`; zero where unvoiced.
pub fn raw_shifts(targets: &[Option<f32>], midi: &[Option<f32>], strength: f32) -> Vec<f32> {
    debug_assert_eq!(targets.len(), midi.len());
    targets
        .iter()
        .zip(midi.iter())
        .map(|(target, estimate)| match (target, estimate) {
            (Some(t), Some(e)) => (t - e) * strength,
            _ => 0.0,
        })
        .collect()
}

/// Sliding median over an odd window, zero-padded past both ends.
///
/// Runs over the whole series, so the zeros of unvoiced frames bound each
/// voiced segment.
pub fn median_filter(series: &[f32], window: usize) -> Vec<f32> {
    debug_assert!(window % 2 == 1, "median window must be odd");
    let half = window / 2;
    let n = series.len();
    let mut neighborhood = Vec::with_capacity(window);

    (0..n)
        .map(|i| {
            neighborhood.clear();
            for offset in 0..window {
                let idx = (i + offset).checked_sub(half).filter(|&idx| idx < n);
                neighborhood.push(idx.map_or(0.0, |idx| series[idx]));
            }
            neighborhood.sort_by(|a, b| a.total_cmp(b));
            neighborhood[half]
        })
        .collect()
}
