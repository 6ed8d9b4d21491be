// Tests for the transcription client against a canned local endpoint.

mod common;

use anyhow::Result;
use whisper_relay::config::TranscriptionConfig;
use whisper_relay::transcribe::{TranscriptionClient, TranscriptionError};

fn client_for(addr: std::net::SocketAddr) -> TranscriptionClient {
    let config = TranscriptionConfig {
        api_url: format!("http://{}/openai/v1/audio/transcriptions", addr),
        ..Default::default()
    };
    TranscriptionClient::new("test-key".to_string(), config)
}

#[tokio::test]
async fn test_transcribe_success_returns_text_and_elapsed() -> Result<()> {
    let addr = common::spawn_stub_server(vec![(
        200,
        "OK",
        r#"{"text": "hello from the other side", "language": "en"}"#.to_string(),
    )])
    .await;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.wav");
    common::write_test_wav(&path, 16000, 0.2);

    let client = client_for(addr);
    let transcription = client.transcribe_file(&path, None).await?;

    assert_eq!(transcription.text, "hello from the other side");
    assert_eq!(transcription.language.as_deref(), Some("en"));
    assert!(transcription.elapsed_seconds >= 0.0);

    Ok(())
}

#[tokio::test]
async fn test_api_error_carries_response_body() -> Result<()> {
    let body = r#"{"error": {"message": "Invalid API Key"}}"#;
    let addr = common::spawn_stub_server(vec![(401, "Unauthorized", body.to_string())]).await;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.wav");
    common::write_test_wav(&path, 16000, 0.2);

    let client = client_for(addr);
    let result = client.transcribe_file(&path, None).await;

    match result {
        Err(TranscriptionError::Api { status, body }) => {
            assert_eq!(status.as_u16(), 401);
            assert!(
                body.contains("Invalid API Key"),
                "error should carry the response body, got: {}",
                body
            );
        }
        other => panic!("expected Api error, got: {:?}", other.map(|t| t.text)),
    }

    Ok(())
}

#[tokio::test]
async fn test_api_error_display_includes_body() -> Result<()> {
    let addr = common::spawn_stub_server(vec![(
        429,
        "Too Many Requests",
        r#"{"error": {"message": "rate limit exceeded"}}"#.to_string(),
    )])
    .await;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.wav");
    common::write_test_wav(&path, 16000, 0.2);

    let client = client_for(addr);
    let err = client
        .transcribe_file(&path, None)
        .await
        .expect_err("non-200 status should fail");

    let message = err.to_string();
    assert!(message.contains("429"), "display should name the status: {}", message);
    assert!(
        message.contains("rate limit exceeded"),
        "display should carry the body: {}",
        message
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_file_fails_before_any_request() -> Result<()> {
    // No scripted responses: a request would hang the stub, so an Io error
    // here proves nothing was sent
    let addr = common::spawn_stub_server(vec![]).await;

    let client = client_for(addr);
    let result = client
        .transcribe_file(std::path::Path::new("/nonexistent/clip.wav"), None)
        .await;

    assert!(matches!(result, Err(TranscriptionError::Io(_))));

    Ok(())
}

#[tokio::test]
async fn test_multi_language_collects_each_transcript() -> Result<()> {
    let addr = common::spawn_stub_server(vec![
        (200, "OK", r#"{"text": "hello"}"#.to_string()),
        (200, "OK", r#"{"text": "bonjour"}"#.to_string()),
    ])
    .await;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.wav");
    common::write_test_wav(&path, 16000, 0.2);

    let client = client_for(addr);
    let languages = vec!["en".to_string(), "fr".to_string()];
    let multi = client.transcribe_multi(&path, &languages).await?;

    assert_eq!(multi.per_language.len(), 2);
    assert_eq!(multi.per_language.get("en").map(String::as_str), Some("hello"));
    assert_eq!(multi.per_language.get("fr").map(String::as_str), Some("bonjour"));

    Ok(())
}

#[tokio::test]
async fn test_multi_language_fails_fast_on_first_error() -> Result<()> {
    // First language succeeds, second gets a 500: the whole operation must
    // fail with no partial result
    let addr = common::spawn_stub_server(vec![
        (200, "OK", r#"{"text": "hello"}"#.to_string()),
        (500, "Internal Server Error", r#"{"error": {"message": "upstream down"}}"#.to_string()),
    ])
    .await;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.wav");
    common::write_test_wav(&path, 16000, 0.2);

    let client = client_for(addr);
    let languages = vec!["en".to_string(), "fr".to_string()];
    let result = client.transcribe_multi(&path, &languages).await;

    match result {
        Err(TranscriptionError::Api { status, body }) => {
            assert_eq!(status.as_u16(), 500);
            assert!(body.contains("upstream down"));
        }
        Ok(_) => panic!("multi-language transcription should fail fast"),
        Err(other) => panic!("expected Api error, got: {}", other),
    }

    Ok(())
}
