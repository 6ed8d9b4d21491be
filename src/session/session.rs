use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

use super::result::TranscriptResult;
use crate::audio::{
    self, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioSource,
};
use crate::compress::{calculate_bitrate, Compressor, MAX_UPLOAD_BYTES, TARGET_SIZE_KB};
use crate::config::Config;
use crate::transcribe::TranscriptionClient;

/// Drives one user-triggered action through the whole pipeline: accept
/// input, gate on size, compress if needed, transcribe, produce the result.
/// Each invocation is independent and re-triggerable.
pub struct TranscriptionSession {
    config: Config,
    client: TranscriptionClient,
}

impl TranscriptionSession {
    pub fn new(config: Config, client: TranscriptionClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Upload variant: validate the format, apply the size gate, transcribe.
    pub async fn transcribe_file(
        &self,
        path: &Path,
        languages: &[String],
    ) -> Result<TranscriptResult> {
        if !audio::is_valid_audio_format(path) {
            anyhow::bail!(
                "unsupported audio format: {} (expected one of: {})",
                path.display(),
                audio::format::VALID_EXTENSIONS.join(", ")
            );
        }

        let size = std::fs::metadata(path)
            .with_context(|| format!("failed to stat input file: {}", path.display()))?
            .len();
        info!("Input file size: {:.2} MB", size as f64 / (1024.0 * 1024.0));

        if size > MAX_UPLOAD_BYTES {
            info!("File size exceeds the 25 MB upload limit, compressing");

            let input = path.to_path_buf();
            let decoded = tokio::task::spawn_blocking(move || AudioFile::open(input))
                .await
                .context("audio decode task panicked")??;

            let bitrate = calculate_bitrate(decoded.duration_seconds, TARGET_SIZE_KB)?;
            info!(
                "Target bitrate: {} kbps over {:.1}s",
                bitrate, decoded.duration_seconds
            );

            let compressor = Compressor::discover()?;
            let compressed = compressor.compress_to_mp3(path, bitrate).await?;

            // The temp file is dropped, and deleted, when this returns,
            // success or failure
            self.run(compressed.path(), languages).await
        } else {
            info!("File size is within the upload limit, no compression needed");
            self.run(path, languages).await
        }
    }

    /// Recording variant: fixed-duration microphone capture, then the same
    /// size gate and transcription path as an upload.
    pub async fn transcribe_recording(
        &self,
        duration_secs: u64,
        languages: &[String],
    ) -> Result<TranscriptResult> {
        let clip = self.record_clip(duration_secs).await?;
        self.transcribe_file(clip.path(), languages).await
    }

    /// Capture from the default microphone for a fixed number of seconds
    /// and write the clip to a temporary WAV file.
    async fn record_clip(&self, duration_secs: u64) -> Result<NamedTempFile> {
        if duration_secs == 0 {
            anyhow::bail!("recording duration must be greater than zero");
        }

        let backend_config = AudioBackendConfig {
            target_sample_rate: self.config.audio.sample_rate,
            target_channels: self.config.audio.channels,
            buffer_duration_ms: 100,
        };
        let target_rate = backend_config.target_sample_rate;

        let mut backend = AudioBackendFactory::create(AudioSource::Microphone, backend_config)
            .context("failed to create audio backend")?;
        let mut audio_rx = backend
            .start()
            .await
            .context("failed to start audio capture")?;

        info!("Recording for {}s...", duration_secs);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(duration_secs);
        let mut samples: Vec<i16> = Vec::new();
        let mut native_rate = target_rate;

        loop {
            let frame = tokio::select! {
                frame = audio_rx.recv() => frame,
                _ = tokio::time::sleep_until(deadline) => break,
            };
            match frame {
                Some(frame) => {
                    native_rate = frame.sample_rate;
                    samples.extend_from_slice(&frame.samples);
                }
                None => break,
            }
        }

        backend.stop().await.context("failed to stop audio capture")?;

        if samples.is_empty() {
            anyhow::bail!("no audio captured from the input device");
        }

        let samples = Self::resample_linear(&samples, native_rate, target_rate);
        info!(
            "Recorded {:.1}s of audio",
            samples.len() as f64 / target_rate as f64
        );

        let clip = tempfile::Builder::new()
            .prefix("whisper-relay-rec-")
            .suffix(".wav")
            .tempfile()
            .context("failed to create temporary WAV file")?;
        audio::write_wav(clip.path(), &samples, target_rate, 1)?;

        Ok(clip)
    }

    async fn run(&self, path: &Path, languages: &[String]) -> Result<TranscriptResult> {
        info!("Transcribing audio using Groq API...");

        let result = if languages.len() > 1 {
            let multi = self.client.transcribe_multi(path, languages).await?;
            let text = multi
                .per_language
                .iter()
                .map(|(language, text)| format!("[{}]\n{}", language, text))
                .collect::<Vec<_>>()
                .join("\n\n");
            TranscriptResult {
                id: Uuid::new_v4(),
                text,
                elapsed_seconds: multi.elapsed_seconds,
                per_language: Some(multi.per_language),
                created_at: Utc::now(),
            }
        } else {
            let single = self
                .client
                .transcribe_file(path, languages.first().map(String::as_str))
                .await?;
            TranscriptResult {
                id: Uuid::new_v4(),
                text: single.text,
                elapsed_seconds: single.elapsed_seconds,
                per_language: None,
                created_at: Utc::now(),
            }
        };

        info!(
            "Transcription complete! Time taken: {:.2} seconds",
            result.elapsed_seconds
        );

        Ok(result)
    }

    /// Linear-interpolation resample of mono samples.
    fn resample_linear(samples: &[i16], from: u32, to: u32) -> Vec<i16> {
        if from == to {
            return samples.to_vec();
        }

        let ratio = from as f64 / to as f64;
        let target_len = (samples.len() as f64 / ratio) as usize;
        let mut result = Vec::with_capacity(target_len);

        for i in 0..target_len {
            let pos = i as f64 * ratio;
            let index = pos as usize;

            if index + 1 < samples.len() {
                let fract = pos - index as f64;
                let s1 = samples[index] as f64;
                let s2 = samples[index + 1] as f64;
                result.push((s1 + (s2 - s1) * fract) as i16);
            } else if index < samples.len() {
                result.push(samples[index]);
            }
        }

        result
    }
}
