mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use autotune::config::{self, Config};
use autotune::report::CorrectionReport;
use autotune::{decode_audio, encode_audio, pipeline, Stage};
use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let cfg = resolve_config(cli.config.as_deref())?;

    let (mut settings, encode_settings) = cfg.settings().context("Invalid configuration")?;
    // Merge: CLI strength wins unless left at its default
    if cli.strength != config::default_strength() {
        settings.correction.strength = cli.strength;
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("autotune - vocal pitch correction");
    log::info!("Input: {}", cli.input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!(
        "Strength: {}, scale: {}",
        settings.correction.strength,
        settings.correction.scale
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio = decode_audio(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    // 2. Correct
    let pb = ProgressBar::new(Stage::COUNT as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );
    let mut started = 0;
    let outcome = pipeline::run(&audio, &settings, |stage| {
        pb.set_position(started);
        pb.set_message(stage.to_string());
        started += 1;
    })
    .context("Pitch correction failed")?;
    pb.set_position(Stage::COUNT as u64);
    pb.finish_with_message(if outcome.corrected() {
        "correction complete"
    } else {
        "no vocals detected, passed through"
    });

    // 3. Write output
    log::info!("Writing output...");
    encode_audio(&cli.output, &outcome.audio, &encode_settings)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if let Some(ref report_path) = cli.report {
        CorrectionReport::new(&cli.input, &cli.output, &settings, &outcome)
            .write(report_path)
            .context("Failed to write report")?;
    }

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}

/// Loads `--config` strictly; an auto-discovered file that fails to load only warns.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        let cfg = config::load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        return Ok(cfg);
    }

    let Some(path) = discover_config() else {
        return Ok(Config::default());
    };
    match config::load_config(&path) {
        Ok(cfg) => {
            log::info!("Loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(err) => {
            log::warn!("Failed to load config from {}: {}", path.display(), err);
            Ok(Config::default())
        }
    }
}

/// ./autotune.toml, then ~/.config/autotune, then the platform config dir.
fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("autotune.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("autotune").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("autotune").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
