//! Automatic pitch correction for monophonic vocal recordings.
//!
//! [`pipeline::run`] tracks f0 with probabilistic YIN, snaps voiced frames to
//! the nearest semitone, median-smooths the correction and applies its median
//! to the whole buffer with a duration-preserving pitch shift.

pub mod audio;
pub mod config;
pub mod correction;
pub mod encode;
pub mod error;
pub mod note;
pub mod pipeline;
pub mod pitch;
pub mod report;
pub mod shift;

pub use audio::decode::{decode_audio, AudioData};
pub use encode::{encode_audio, EncodeSettings};
pub use error::{Error, Result};
pub use pipeline::{run, Outcome, Settings, Stage};
