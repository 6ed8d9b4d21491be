use super::state::AppState;
use crate::audio;
use crate::export;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    /// Capture length in seconds (default: configured record duration)
    pub duration_secs: Option<u64>,

    /// Language codes; more than one produces a transcript per language
    pub languages: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    /// Path the transcript is written to
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /transcriptions
/// Multipart upload: `file` (required) plus an optional `languages` field
/// holding comma-separated language codes.
pub async fn transcribe_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut languages: Vec<String> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("malformed multipart body: {}", e),
                    }),
                )
                    .into_response();
            }
        };

        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.mp3").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ErrorResponse {
                                error: format!("failed to read upload: {}", e),
                            }),
                        )
                            .into_response();
                    }
                }
            }
            Some("languages") => {
                if let Ok(value) = field.text().await {
                    languages = value
                        .split(',')
                        .map(|code| code.trim().to_string())
                        .filter(|code| !code.is_empty())
                        .collect();
                }
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = upload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing 'file' field".to_string(),
            }),
        )
            .into_response();
    };

    if !audio::is_valid_audio_format(&file_name) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("unsupported audio format: {}", file_name),
            }),
        )
            .into_response();
    }

    info!("Received upload: {} ({} bytes)", file_name, bytes.len());

    // Spool to a temp file carrying the original extension so the format
    // gate and the re-encoder see it
    let suffix = Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let spool = tempfile::Builder::new()
        .prefix("whisper-relay-upload-")
        .suffix(&suffix)
        .tempfile()
        .and_then(|mut temp| temp.write_all(&bytes).map(|_| temp));

    let temp = match spool {
        Ok(temp) => temp,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to spool upload: {}", e),
                }),
            )
                .into_response();
        }
    };

    match state.session.transcribe_file(temp.path(), &languages).await {
        Ok(result) => {
            let mut latest = state.latest.write().await;
            *latest = Some(result.clone());
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            error!("Transcription failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Transcription failed: {:#}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /recordings
/// Capture from the default microphone for a fixed duration, then run the
/// same pipeline as an upload.
pub async fn transcribe_recording(
    State(state): State<AppState>,
    Json(req): Json<RecordRequest>,
) -> impl IntoResponse {
    let duration = req
        .duration_secs
        .unwrap_or(state.session.config().audio.record_duration_secs);
    let languages = req.languages.unwrap_or_default();

    info!("Recording {}s from the default input device", duration);

    match state
        .session
        .transcribe_recording(duration, &languages)
        .await
    {
        Ok(result) => {
            let mut latest = state.latest.write().await;
            *latest = Some(result.clone());
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            error!("Recording failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Recording failed: {:#}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /transcriptions/latest
/// Most recent result for this session
pub async fn latest_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let latest = state.latest.read().await;

    match latest.as_ref() {
        Some(result) => (StatusCode::OK, Json(result.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no transcript yet".to_string(),
            }),
        )
            .into_response(),
    }
}

/// POST /transcriptions/export
/// Write the latest transcript to a user-named file
pub async fn export_transcript(
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> impl IntoResponse {
    let text = {
        let latest = state.latest.read().await;
        match latest.as_ref() {
            Some(result) => result.text.clone(),
            None => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse {
                        error: "no transcript to export".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    };

    match export::save_transcript(&text, &req.filename) {
        Ok(()) => (
            StatusCode::OK,
            Json(ExportResponse {
                filename: req.filename.clone(),
                message: format!("Transcript saved to {}", req.filename),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Export failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to save transcript: {:#}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
