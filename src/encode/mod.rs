//! Writes corrected audio. WAV is written natively; every other extension is
//! handed to ffmpeg.

pub mod ffmpeg;
pub mod wav;

use std::path::Path;

use crate::audio::decode::AudioData;
use crate::error::Result;
use ffmpeg::FfmpegEncoder;
pub use wav::WavFormat;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeSettings {
    pub wav_format: WavFormat,
}

pub fn encode_audio(path: &Path, audio: &AudioData, settings: &EncodeSettings) -> Result<()> {
    if is_wav(path) {
        return wav::write_wav(path, audio, settings.wav_format);
    }

    let mut encoder = FfmpegEncoder::new(path, audio.sample_rate)?;
    encoder.write_samples(&audio.samples)?;
    encoder.finish()
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_detection_ignores_case() {
        assert!(is_wav(Path::new("take.wav")));
        assert!(is_wav(Path::new("dir/TAKE.WAV")));
        assert!(!is_wav(Path::new("take.mp3")));
        assert!(!is_wav(Path::new("wav")));
    }

    #[test]
    fn writes_wav_without_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let audio = AudioData {
            samples: vec![0.25; 256],
            sample_rate: 8000,
        };
        encode_audio(&path, &audio, &EncodeSettings::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn ffmpeg_failures_are_output_errors() {
        let dir = tempfile::tempdir().unwrap();
        let audio = AudioData {
            samples: vec![0.1; 1_000_000],
            sample_rate: 22050,
        };
        // Fails at spawn without ffmpeg, or at the unknown container with it;
        // the buffer is larger than a pipe so an early exit breaks the write.
        for name in ["out.notaformat", "no_such_dir/out.mp3"] {
            let path = dir.path().join(name);
            match encode_audio(&path, &audio, &EncodeSettings::default()) {
                Err(crate::error::Error::Output { path: failed, reason }) => {
                    assert_eq!(failed, path);
                    assert!(reason.contains("ffmpeg"), "{}", reason);
                }
                other => panic!("expected an output error for {}, got {:?}", name, other),
            }
            assert!(!path.exists());
        }
    }
}
