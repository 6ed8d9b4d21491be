use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::audio::format::mime_for_path;
use crate::config::TranscriptionConfig;

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("failed to read audio payload: {0}")]
    Io(#[from] std::io::Error),
    #[error("transcription request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API request failed ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to parse API response: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Result of a single transcription request.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub language: Option<String>,
    /// Wall-clock seconds spent on the API call
    pub elapsed_seconds: f64,
}

/// Results of the multi-language variant: one transcript per language code.
#[derive(Debug, Clone)]
pub struct MultiLanguageTranscript {
    pub per_language: BTreeMap<String, String>,
    pub elapsed_seconds: f64,
}

pub struct TranscriptionClient {
    http: reqwest::Client,
    api_key: String,
    config: TranscriptionConfig,
}

impl TranscriptionClient {
    /// The key is a plain constructor argument so tests can run against mock
    /// credentials; there is no process-global state. The client carries no
    /// timeout: large uploads take as long as the API needs.
    pub fn new(api_key: String, config: TranscriptionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            config,
        }
    }

    /// Post one file to the transcription endpoint as a multipart form
    /// (`file`, `model`, `response_format`, optional `language`).
    pub async fn transcribe_file(
        &self,
        path: &Path,
        language: Option<&str>,
    ) -> Result<Transcription, TranscriptionError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();
        let mime = mime_for_path(path);

        info!(
            "Sending {} ({} bytes) to {}",
            file_name,
            bytes.len(),
            self.config.api_url
        );
        let started = Instant::now();

        let audio_part = Part::bytes(bytes).file_name(file_name).mime_str(mime)?;

        let mut form = Form::new()
            .part("file", audio_part)
            .text("model", self.config.model.clone())
            .text("response_format", self.config.response_format.clone());
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let elapsed_seconds = started.elapsed().as_secs_f64();
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TranscriptionError::Api { status, body });
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|e| TranscriptionError::Parse(format!("{}: {}", e, body)))?;

        debug!("Transcription request finished in {:.2}s", elapsed_seconds);

        Ok(Transcription {
            text: parsed.text,
            language: parsed.language,
            elapsed_seconds,
        })
    }

    /// One request per requested language, issued sequentially. The first
    /// failure aborts the whole operation; there are no partial results.
    pub async fn transcribe_multi(
        &self,
        path: &Path,
        languages: &[String],
    ) -> Result<MultiLanguageTranscript, TranscriptionError> {
        let started = Instant::now();
        let mut per_language = BTreeMap::new();

        for language in languages {
            info!("Transcribing as '{}'", language);
            let transcription = self.transcribe_file(path, Some(language)).await?;
            per_language.insert(language.clone(), transcription.text);
        }

        Ok(MultiLanguageTranscript {
            per_language,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }
}
