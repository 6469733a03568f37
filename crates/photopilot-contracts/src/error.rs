use thiserror::Error;

/// Every failure a chat turn can surface. None of these are fatal: the
/// session turns each one into a status line in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistError {
    #[error("No API key set. Use /key <value> or set GEMINI_API_KEY.")]
    CredentialMissing,
    #[error("Network request failed: {0}")]
    TransportFailure(String),
    #[error("Unexpected response from the model service: {0}")]
    EnvelopeMalformed(String),
    #[error("Model service error: {0}")]
    UpstreamError(String),
    #[error("No photo selected.")]
    NoSelection,
    #[error("Develop settings do not apply to {0}.")]
    UnsupportedMedia(String),
    #[error("Nothing to undo.")]
    NothingToUndo,
    #[error("Editor rejected the change: {0}")]
    HostFailure(String),
    #[error("Timed out waiting for the thumbnail after {0} ms.")]
    ThumbnailTimeout(u64),
    #[error("A request is already in flight.")]
    Busy,
}

impl AssistError {
    /// Stable snake_case code used in event payloads.
    pub fn code(&self) -> &'static str {
        match self {
            AssistError::CredentialMissing => "credential_missing",
            AssistError::TransportFailure(_) => "transport_failure",
            AssistError::EnvelopeMalformed(_) => "envelope_malformed",
            AssistError::UpstreamError(_) => "upstream_error",
            AssistError::NoSelection => "no_selection",
            AssistError::UnsupportedMedia(_) => "unsupported_media",
            AssistError::NothingToUndo => "nothing_to_undo",
            AssistError::HostFailure(_) => "host_failure",
            AssistError::ThumbnailTimeout(_) => "thumbnail_timeout",
            AssistError::Busy => "busy",
        }
    }
}

impl From<anyhow::Error> for AssistError {
    fn from(err: anyhow::Error) -> Self {
        AssistError::HostFailure(format!("{err:#}"))
    }
}
