//! Transcript export actions: local file and clipboard.
//!
//! Failures here are non-fatal notices at the front-end; the stored
//! transcript is never touched.

use anyhow::{Context, Result};
use std::path::Path;

/// Write the transcript as plain text to a user-named path.
pub fn save_transcript(text: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, text)
        .with_context(|| format!("failed to save transcript to {}", path.display()))?;
    Ok(())
}

/// Copy the transcript to the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        arboard::Clipboard::new().context("failed to open system clipboard")?;
    clipboard
        .set_text(text.to_string())
        .context("failed to copy transcript to clipboard")?;
    Ok(())
}
