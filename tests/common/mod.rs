// Shared helpers for integration tests. Not every test binary uses every
// helper.
#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Spawn a canned-response HTTP server: each incoming connection consumes
/// the next scripted `(status, reason, body)` response. The pack carries no
/// mock-HTTP crate, so this stands in for the transcription endpoint.
pub async fn spawn_stub_server(responses: Vec<(u16, &'static str, String)>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub server");
    let addr = listener.local_addr().expect("stub server has no local addr");

    tokio::spawn(async move {
        for (status, reason, body) in responses {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };

            read_request(&mut stream).await;

            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    addr
}

/// Drain one HTTP request (headers + Content-Length body) so the client
/// finishes uploading before we answer.
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) => return,
            Ok(n) => n,
            Err(_) => return,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > (1 << 20) {
            return;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body_read = buf.len() - header_end;
    while body_read < content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body_read += n,
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Write a 16-bit mono WAV of `duration_secs` seconds of a quiet ramp at
/// `sample_rate`, returning nothing; the caller owns the path.
pub fn write_test_wav(path: &std::path::Path, sample_rate: u32, duration_secs: f64) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("failed to create test WAV");
    let total = (sample_rate as f64 * duration_secs) as usize;
    for i in 0..total {
        writer
            .write_sample(((i % 128) as i16) - 64)
            .expect("failed to write test sample");
    }
    writer.finalize().expect("failed to finalize test WAV");
}
