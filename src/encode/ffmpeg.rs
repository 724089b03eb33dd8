use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::error::{Error, Result};

/// Streams raw mono `f32le` PCM into an ffmpeg process that picks the codec
/// from the output extension.
pub struct FfmpegEncoder {
    child: Child,
    output_path: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(output_path: &Path, sample_rate: u32) -> Result<Self> {
        let output = output_path.to_str().ok_or_else(|| Error::Output {
            path: output_path.to_path_buf(),
            reason: "path is not valid UTF-8".into(),
        })?;

        let sample_rate = sample_rate.to_string();
        let args = [
            "-y",
            "-hide_banner",
            "-loglevel", "error",
            "-f", "f32le",
            "-ar", sample_rate.as_str(),
            "-ac", "1",
            "-i", "pipe:0",
            output,
        ];

        let child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Output {
                path: output_path.to_path_buf(),
                reason: format!("failed to spawn ffmpeg ({}). Is ffmpeg installed?", e),
            })?;

        log::info!("FFmpeg encoder started: {}Hz mono -> {}", sample_rate, output);

        Ok(Self {
            child,
            output_path: output_path.to_path_buf(),
        })
    }

    pub fn write_samples(&mut self, samples: &[f32]) -> Result<()> {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let written = match self.child.stdin.as_mut() {
            Some(stdin) => stdin.write_all(&bytes),
            None => return Err(self.error("ffmpeg stdin not available".into())),
        };
        written.map_err(|e| self.abort(&e.to_string()))
    }

    /// Reaps a process that stopped reading and reports why it stopped.
    fn abort(&mut self, write_error: &str) -> Error {
        drop(self.child.stdin.take());

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let status = match self.child.wait() {
            Ok(status) => status.to_string(),
            Err(e) => format!("unknown status ({})", e),
        };

        self.error(format!(
            "ffmpeg stopped accepting samples ({}), {}:\n{}",
            write_error,
            status,
            stderr.trim()
        ))
    }

    pub fn finish(mut self) -> Result<()> {
        // EOF
        drop(self.child.stdin.take());

        let output = self
            .child
            .wait_with_output()
            .map_err(|e| Error::Output {
                path: self.output_path.clone(),
                reason: format!("failed to wait for ffmpeg: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Output {
                path: self.output_path,
                reason: format!("ffmpeg exited with {}:\n{}", output.status, stderr.trim()),
            });
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }

    fn error(&self, reason: String) -> Error {
        Error::Output {
            path: self.output_path.clone(),
            reason,
        }
    }
}
