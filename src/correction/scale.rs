use std::fmt;

/// Snaps an unconstrained pitch (fractional MIDI semitones) to an allowed pitch.
pub trait Quantizer: fmt::Debug + Send + Sync {
    fn nearest(&self, semitone: f32) -> f32;

    fn name(&self) -> &str;

    /// Targets for a pitch series; unvoiced frames stay unvoiced.
    fn quantize(&self, midi: &[Option<f32>]) -> Vec<Option<f32>> {
        midi.iter().map(|m| m.map(|v| self.nearest(v))).collect()
    }
}

/// Every semitone of the 12-tone equal tempered scale is allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chromatic;

impl Quantizer for Chromatic {
    fn nearest(&self, semitone: f32) -> f32 {
        semitone.round()
    }

    fn name(&self) -> &str {
        "chromatic"
    }
}

pub const DEFAULT_SCALE: &str = "chromatic";

/// Resolves a scale by name. Unknown names fall back to chromatic.
pub fn from_name(name: &str) -> Box<dyn Quantizer> {
    if !name.trim().eq_ignore_ascii_case(DEFAULT_SCALE) {
        log::warn!("Unknown scale '{}', falling back to chromatic", name);
    }
    Box::new(Chromatic)
}
