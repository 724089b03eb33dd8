//! Fractional-position reading with 4-point Hermite interpolation.

/// Reads `output_len` samples from `input` at positions `offset + i · step`.
///
/// Positions past either end read as silence.
pub fn resample_cubic(input: &[f32], offset: f64, step: f64, output_len: usize) -> Vec<f32> {
    (0..output_len)
        .map(|i| sample_cubic(input, offset + i as f64 * step))
        .collect()
}

fn sample_cubic(input: &[f32], pos: f64) -> f32 {
    let idx = pos.floor();
    let frac = (pos - idx) as f32;
    let idx = idx as i64;
    let at = |i: i64| -> f32 {
        if i < 0 || i >= input.len() as i64 {
            0.0
        } else {
            input[i as usize]
        }
    };

    let s0 = at(idx - 1);
    let s1 = at(idx);
    let s2 = at(idx + 1);
    let s3 = at(idx + 2);

    let c0 = s1;
    let c1 = 0.5 * (s2 - s0);
    let c2 = s0 - 2.5 * s1 + 2.0 * s2 - 0.5 * s3;
    let c3 = 0.5 * (s3 - s0) + 1.5 * (s1 - s2);

    ((c3 * frac + c2) * frac + c1) * frac + c0
}
