use std::path::Path;

/// Upload formats the transcription API accepts.
pub const VALID_EXTENSIONS: [&str; 7] = ["mp3", "mp4", "mpeg", "mpga", "m4a", "wav", "webm"];

/// Accepts exactly the upload formats the API supports, case-insensitively.
/// Paths without an extension are rejected.
pub fn is_valid_audio_format(path: impl AsRef<Path>) -> bool {
    match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            VALID_EXTENSIONS.iter().any(|valid| *valid == ext)
        }
        None => false,
    }
}

/// MIME type sent with the multipart upload, chosen by extension.
pub fn mime_for_path(path: impl AsRef<Path>) -> &'static str {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp4") | Some("m4a") => "audio/mp4",
        Some("webm") => "audio/webm",
        _ => "audio/mpeg",
    }
}
