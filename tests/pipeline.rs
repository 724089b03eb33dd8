use autotune::correction::scale::from_name;
use autotune::encode::WavFormat;
use autotune::note::hz_to_midi;
use autotune::pitch::{estimate, PitchSettings};
use autotune::{decode_audio, encode_audio, run, AudioData, EncodeSettings, Settings};

const SR: u32 = 22050;

fn tone(freq: f32, secs: f32) -> AudioData {
    let len = (SR as f32 * secs) as usize;
    AudioData {
        samples: (0..len)
            .map(|i| 0.4 * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect(),
        sample_rate: SR,
    }
}

fn median(mut values: Vec<f32>) -> f32 {
    assert!(!values.is_empty());
    values.sort_by(|a, b| a.total_cmp(b));
    values[values.len() / 2]
}

fn median_f0(audio: &AudioData) -> f32 {
    let track = estimate(&audio.samples, audio.sample_rate, &PitchSettings::default()).unwrap();
    median(track.f0.into_iter().flatten().collect())
}

#[test]
fn a4_is_already_in_tune() {
    let audio = tone(440.0, 1.0);
    let outcome = run(&audio, &Settings::default(), |_| {}).unwrap();

    let voiced_midi: Vec<f32> = outcome.plan.midi.iter().flatten().copied().collect();
    assert!((median(voiced_midi) - 69.0).abs() < 0.1);
    assert!(outcome.plan.targets.iter().flatten().all(|&t| t == 69.0));
    assert!(outcome.plan.applied_shift.unwrap().abs() < 0.05);
}

#[test]
fn detuned_tone_is_corrected_to_440() {
    let audio = tone(450.0, 1.5);
    let outcome = run(&audio, &Settings::default(), |_| {}).unwrap();

    let expected = 69.0 - hz_to_midi(450.0).unwrap();
    let applied = outcome.plan.applied_shift.unwrap();
    assert!((applied - expected).abs() < 0.05, "applied {}", applied);

    assert_eq!(outcome.audio.samples.len(), audio.samples.len());
    assert_eq!(outcome.audio.sample_rate, audio.sample_rate);
    let f0 = median_f0(&outcome.audio);
    assert!((f0 - 440.0).abs() < 2.0, "f0 {}", f0);
}

#[test]
fn half_strength_goes_half_way() {
    let audio = tone(450.0, 1.0);
    let mut settings = Settings::default();
    settings.correction.strength = 0.5;
    let outcome = run(&audio, &settings, |_| {}).unwrap();
    let expected = 0.5 * (69.0 - hz_to_midi(450.0).unwrap());
    assert!((outcome.plan.applied_shift.unwrap() - expected).abs() < 0.03);
}

#[test]
fn silence_round_trips_unchanged() {
    let audio = AudioData {
        samples: vec![0.0; SR as usize / 2],
        sample_rate: SR,
    };
    let outcome = run(&audio, &Settings::default(), |_| {}).unwrap();
    assert!(outcome.track.voiced.iter().all(|&v| !v));
    assert_eq!(outcome.plan.applied_shift, None);
    assert_eq!(outcome.audio, audio);
}

#[test]
fn unknown_scale_falls_back_to_chromatic() {
    let quantizer = from_name("lydian-dominant");
    assert_eq!(quantizer.name(), "chromatic");
    assert_eq!(quantizer.nearest(60.4), 60.0);
}

#[test]
fn wav_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("take.wav");
    let output = dir.path().join("tuned.wav");

    let float = EncodeSettings {
        wav_format: WavFormat::Float32,
    };
    encode_audio(&input, &tone(450.0, 1.0), &float).unwrap();

    let audio = decode_audio(&input).unwrap();
    assert_eq!(audio.sample_rate, SR);
    let outcome = run(&audio, &Settings::default(), |_| {}).unwrap();
    encode_audio(&output, &outcome.audio, &EncodeSettings::default()).unwrap();

    let corrected = decode_audio(&output).unwrap();
    assert_eq!(corrected.sample_rate, SR);
    assert_eq!(corrected.samples.len(), audio.samples.len());
    let f0 = median_f0(&corrected);
    assert!((f0 - 440.0).abs() < 2.0, "f0 {}", f0);
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(decode_audio(&dir.path().join("nope.wav")).is_err());
}
