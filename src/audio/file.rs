use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::mpsc;
use tracing::info;

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

/// A fully decoded audio file: interleaved i16 PCM plus the metadata the
/// size gate needs (duration above all).
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    /// Decode any container/codec symphonia supports (MP3, MP4/M4A, WAV,
    /// WebM, OGG) into interleaved i16 PCM.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let src = File::open(path)
            .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
        let mss = MediaSourceStream::new(Box::new(src), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Unrecognized or unsupported audio container")?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| anyhow!("No decodable audio track found"))?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| anyhow!("Audio track does not declare a sample rate"))?;
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(1);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create audio decoder")?;

        let mut samples: Vec<i16> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<i16>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e).context("Failed to read audio packet"),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    if sample_buf.is_none() {
                        sample_buf =
                            Some(SampleBuffer::new(decoded.capacity() as u64, *decoded.spec()));
                    }
                    if let Some(buf) = sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                }
                // Skip over corrupt packets, keep whatever decodes
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(e).context("Failed to decode audio packet"),
            }
        }

        let duration_seconds =
            samples.len() as f64 / (sample_rate as f64 * channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            sample_rate,
            channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate,
            channels,
            samples,
        })
    }

    /// Interleaved samples mixed down to a single channel.
    pub fn mono_samples(&self) -> Vec<i16> {
        mix_to_mono(&self.samples, self.channels)
    }
}

/// Write 16-bit PCM samples as a WAV file.
pub fn write_wav(
    path: impl AsRef<Path>,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .context("Failed to write sample to WAV")?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;

    Ok(())
}

fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Plays a decoded audio file back as capture frames, standing in for a
/// live microphone in tests and batch processing.
pub struct FileBackend {
    path: PathBuf,
    config: AudioBackendConfig,
    capturing: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl FileBackend {
    pub fn new(path: PathBuf, config: AudioBackendConfig) -> Self {
        Self {
            path,
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            anyhow::bail!("file playback already running");
        }

        let path = self.path.clone();
        let audio = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .context("audio decode task panicked")??;

        let sample_rate = audio.sample_rate;
        let samples = audio.mono_samples();
        let frame_len = ((sample_rate as u64 * self.config.buffer_duration_ms) / 1000).max(1) as usize;

        self.capturing.store(true, Ordering::SeqCst);
        let capturing = Arc::clone(&self.capturing);
        let (frame_tx, frame_rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            let mut timestamp_ms = 0u64;
            for chunk in samples.chunks(frame_len) {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }
                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate,
                    channels: 1,
                    timestamp_ms,
                };
                timestamp_ms += (chunk.len() as u64 * 1000) / sample_rate as u64;
                if frame_tx.send(frame).await.is_err() {
                    break;
                }
            }
            capturing.store(false, Ordering::SeqCst);
        });
        self.task = Some(task);

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "file-playback"
    }
}
