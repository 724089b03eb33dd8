//! Conversions between Hz, fractional MIDI note numbers, and note names.

use crate::error::{Error, Result};

/// Fractional MIDI pitch for a frequency, `None` unless `freq_hz` is positive.
pub fn hz_to_midi(freq_hz: f32) -> Option<f32> {
    if freq_hz > 0.0 && freq_hz.is_finite() {
        Some(69.0 + 12.0 * (freq_hz / 440.0).log2())
    } else {
        None
    }
}

pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * 2.0_f32.powf((midi - 69.0) / 12.0)
}

/// Parses names like `C2`, `F#4`, `Bb3` or `A-1` into a MIDI note number.
pub fn note_to_midi(name: &str) -> Result<i32> {
    let invalid = || Error::Config(format!("invalid note name '{}'", name));
    let mut chars = name.trim().chars().peekable();

    let pitch_class = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(invalid()),
    };

    let accidental = match chars.peek() {
        Some('#') | Some('♯') => {
            chars.next();
            1
        }
        Some('b') | Some('♭') => {
            chars.next();
            -1
        }
        _ => 0,
    };

    let octave: i32 = chars.collect::<String>().parse().map_err(|_| invalid())?;
    Ok(12 * (octave + 1) + pitch_class + accidental)
}

pub fn note_to_hz(name: &str) -> Result<f32> {
    note_to_midi(name).map(|midi| midi_to_hz(midi as f32))
}
