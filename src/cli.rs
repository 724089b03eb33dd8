use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "autotune",
    about = "Snap a monophonic vocal take to the nearest semitone",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output audio file; .wav is written directly, anything else goes through ffmpeg
    #[arg(short, long)]
    pub output: PathBuf,

    /// Correction strength (0 = none, 1 = full, negative inverts)
    #[arg(short, long, default_value_t = 1.0)]
    pub strength: f32,

    /// TOML config file (defaults to ./autotune.toml or the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a per-frame JSON report of the correction
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_negative_strength() {
        let cli = Cli::try_parse_from(["autotune", "-i", "in.wav", "-o", "out.wav", "-s", "-0.5"]).unwrap();
        assert_eq!(cli.strength, -0.5);
        assert_eq!(cli.input, PathBuf::from("in.wav"));
        assert!(cli.report.is_none());
    }

    #[test]
    fn strength_defaults_to_full() {
        let cli = Cli::try_parse_from(["autotune", "--input", "a.flac", "--output", "b.mp3"]).unwrap();
        assert_eq!(cli.strength, 1.0);
    }

    #[test]
    fn input_and_output_are_required() {
        assert!(Cli::try_parse_from(["autotune", "-i", "in.wav"]).is_err());
    }
}
