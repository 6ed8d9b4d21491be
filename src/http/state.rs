use crate::session::{TranscriptResult, TranscriptionSession};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Pipeline driver shared by all handlers
    pub session: Arc<TranscriptionSession>,

    /// Most recent successful result. Overwritten per run; a failed run
    /// leaves it untouched.
    pub latest: Arc<RwLock<Option<TranscriptResult>>>,
}

impl AppState {
    pub fn new(session: TranscriptionSession) -> Self {
        Self {
            session: Arc::new(session),
            latest: Arc::new(RwLock::new(None)),
        }
    }
}
