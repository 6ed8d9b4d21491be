//! Microphone capture backend built on cpal.
//!
//! cpal streams are not `Send`, so the stream lives on a dedicated worker
//! thread that pumps mono i16 frames into an async channel.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

/// Shared buffer the stream callback appends mono samples to
type SampleBuffer = Arc<Mutex<Vec<i16>>>;

pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    capturing: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self {
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            anyhow::bail!("microphone capture already running");
        }

        let (frame_tx, frame_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

        self.capturing.store(true, Ordering::SeqCst);
        let capturing = Arc::clone(&self.capturing);
        let buffer_ms = self.config.buffer_duration_ms;

        let worker = thread::spawn(move || {
            run_capture(buffer_ms, frame_tx, Arc::clone(&capturing), ready_tx);
            capturing.store(false, Ordering::SeqCst);
        });

        // Wait for the stream to come up (or fail) before reporting success
        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(worker);
                Ok(frame_rx)
            }
            Ok(Err(e)) => {
                self.capturing.store(false, Ordering::SeqCst);
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                self.capturing.store(false, Ordering::SeqCst);
                let _ = worker.join();
                Err(anyhow!("capture thread exited before initializing"))
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            tokio::task::spawn_blocking(move || worker.join())
                .await?
                .map_err(|_| anyhow!("capture thread panicked"))?;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}

fn run_capture(
    buffer_ms: u64,
    frame_tx: mpsc::Sender<AudioFrame>,
    capturing: Arc<AtomicBool>,
    ready_tx: std::sync::mpsc::Sender<Result<()>>,
) {
    let host = cpal::default_host();
    let device = match host.default_input_device() {
        Some(device) => device,
        None => {
            let _ = ready_tx.send(Err(anyhow!("no input device available")));
            return;
        }
    };

    info!("Using input device: {}", device.name().unwrap_or_default());

    let supported = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(anyhow!("failed to get input config: {}", e)));
            return;
        }
    };

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels();
    info!(
        "Capture format: {:?} at {} Hz, {} channels",
        supported.sample_format(),
        sample_rate,
        channels
    );

    let buffer: SampleBuffer = Arc::new(Mutex::new(Vec::new()));
    let stream_config = supported.config();

    let stream = match supported.sample_format() {
        SampleFormat::I16 => build_stream_i16(&device, &stream_config, Arc::clone(&buffer), channels),
        SampleFormat::F32 => build_stream_f32(&device, &stream_config, Arc::clone(&buffer), channels),
        format => Err(anyhow!("unsupported sample format: {:?}", format)),
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(anyhow!("failed to start input stream: {}", e)));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    let frame_len = ((sample_rate as u64 * buffer_ms) / 1000).max(1) as usize;
    let started = Instant::now();

    'capture: while capturing.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(10));

        loop {
            let samples = {
                let mut guard = match buffer.lock() {
                    Ok(guard) => guard,
                    Err(_) => break 'capture,
                };
                if guard.len() < frame_len {
                    break;
                }
                guard.drain(..frame_len).collect::<Vec<i16>>()
            };

            let frame = AudioFrame {
                samples,
                sample_rate,
                channels: 1,
                timestamp_ms: started.elapsed().as_millis() as u64,
            };
            if frame_tx.blocking_send(frame).is_err() {
                // Receiver is gone, nothing left to capture for
                break 'capture;
            }
        }
    }

    drop(stream);

    // Flush whatever is left in the buffer as a final short frame
    if let Ok(mut guard) = buffer.lock() {
        let samples = std::mem::take(&mut *guard);
        if !samples.is_empty() {
            let _ = frame_tx.blocking_send(AudioFrame {
                samples,
                sample_rate,
                channels: 1,
                timestamp_ms: started.elapsed().as_millis() as u64,
            });
        }
    };
}

fn build_stream_i16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffer: SampleBuffer,
    channels: u16,
) -> Result<cpal::Stream> {
    let err_fn = |err| error!("input stream error: {}", err);
    let channels = channels.max(1) as usize;

    let stream = device.build_input_stream(
        config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            if let Ok(mut guard) = buffer.lock() {
                // Mix down to mono
                for frame in data.chunks_exact(channels) {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    guard.push((sum / channels as i32) as i16);
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn build_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffer: SampleBuffer,
    channels: u16,
) -> Result<cpal::Stream> {
    let err_fn = |err| error!("input stream error: {}", err);
    let channels = channels.max(1) as usize;

    let stream = device.build_input_stream(
        config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if let Ok(mut guard) = buffer.lock() {
                // Mix down to mono and convert to i16
                for frame in data.chunks_exact(channels) {
                    let avg = frame.iter().sum::<f32>() / channels as f32;
                    guard.push((avg * 32767.0).clamp(-32768.0, 32767.0) as i16);
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
