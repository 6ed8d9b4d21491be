//! Size-constrained re-encoding for the transcription API's upload limit.
//!
//! Oversized inputs are re-encoded to MP3 at a bitrate computed so the
//! output lands just under the limit for the clip's duration. The encoding
//! itself is delegated to ffmpeg.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Upload limit enforced by the transcription API.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Compression target in kilobytes: 24.9 MiB, leaving margin under the limit.
pub const TARGET_SIZE_KB: f64 = 24.9 * 1024.0;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("audio duration must be greater than zero")]
    ZeroDuration,
    #[error("ffmpeg not found on PATH; install ffmpeg to compress oversized audio")]
    FfmpegMissing,
    #[error("I/O failure while re-encoding: {0}")]
    Io(#[from] std::io::Error),
    #[error("ffmpeg exited with {status}: {stderr}")]
    Encode {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Bitrate in kbps that encodes roughly `target_size_kb` kilobytes over
/// `duration_seconds`. The constant 1.048576 (1024² / 10⁶) bridges the
/// kibibyte size basis and the codec's decimal-kilobit rate basis.
pub fn calculate_bitrate(duration_seconds: f64, target_size_kb: f64) -> Result<u32, CompressError> {
    if duration_seconds <= 0.0 {
        return Err(CompressError::ZeroDuration);
    }
    let bitrate = (target_size_kb * 8.0) / (1.048576 * duration_seconds);
    Ok(bitrate as u32)
}

/// Re-encodes audio through an external ffmpeg binary.
pub struct Compressor {
    ffmpeg: PathBuf,
}

impl Compressor {
    /// Locate ffmpeg on PATH.
    pub fn discover() -> Result<Self, CompressError> {
        find_ffmpeg()
            .map(|ffmpeg| Self { ffmpeg })
            .ok_or(CompressError::FfmpegMissing)
    }

    /// Use a specific ffmpeg binary.
    pub fn with_path(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }

    /// Re-encode `input` to MP3 at `bitrate_kbps` into a fresh temporary
    /// file. The returned handle deletes the file when dropped, so the
    /// artifact cannot outlive the request that created it.
    pub async fn compress_to_mp3(
        &self,
        input: &Path,
        bitrate_kbps: u32,
    ) -> Result<NamedTempFile, CompressError> {
        let output = tempfile::Builder::new()
            .prefix("whisper-relay-")
            .suffix(".mp3")
            .tempfile()?;

        debug!(
            "Re-encoding {} at {} kbps via {}",
            input.display(),
            bitrate_kbps,
            self.ffmpeg.display()
        );

        let result = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-b:a")
            .arg(format!("{}k", bitrate_kbps))
            .arg("-f")
            .arg("mp3")
            .arg(output.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !result.status.success() {
            return Err(CompressError::Encode {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        let compressed_bytes = std::fs::metadata(output.path()).map(|m| m.len()).unwrap_or(0);
        info!(
            "Compression complete: {:.2} MB",
            compressed_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(output)
    }
}

fn find_ffmpeg() -> Option<PathBuf> {
    let exe = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(exe))
            .find(|candidate| candidate.is_file())
    })
}
